use std::fmt;

/// One logical call against the glossary service.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operation {
    ListTerms,
    SearchTerms { query: String, limit: u32 },
    GetTerm { term_id: String },
    GetTermRelations { term_id: String },
    GetGraph,
}

impl Operation {
    /// Lookups of one entity by id. Absence is a valid answer for these.
    pub fn is_single_entity_lookup(&self) -> bool {
        matches!(
            self,
            Operation::GetTerm { .. } | Operation::GetTermRelations { .. }
        )
    }

    pub fn method_name(&self) -> &'static str {
        match self {
            Operation::ListTerms => "ListTerms",
            Operation::SearchTerms { .. } => "SearchTerms",
            Operation::GetTerm { .. } => "GetTerm",
            Operation::GetTermRelations { .. } => "GetTermRelations",
            Operation::GetGraph => "GetGraph",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::SearchTerms { query, limit } => {
                write!(f, "SearchTerms(query={query:?}, limit={limit})")
            }
            Operation::GetTerm { term_id } => write!(f, "GetTerm({term_id})"),
            Operation::GetTermRelations { term_id } => write!(f, "GetTermRelations({term_id})"),
            other => f.write_str(other.method_name()),
        }
    }
}
