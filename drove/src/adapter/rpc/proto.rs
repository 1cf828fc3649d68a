//! Messages of `glossary.GlossaryService`, declared by hand.

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Term {
    #[prost(string, tag = "1")]
    pub term: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub definition: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub category: ::prost::alloc::string::String,
    #[prost(string, tag = "4")]
    pub source: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Relation {
    #[prost(string, tag = "1")]
    pub source: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub target: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub relation_type: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListTermsRequest {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListTermsResponse {
    #[prost(message, repeated, tag = "1")]
    pub terms: ::prost::alloc::vec::Vec<Term>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SearchTermsRequest {
    #[prost(string, tag = "1")]
    pub query: ::prost::alloc::string::String,
    #[prost(int32, tag = "2")]
    pub limit: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SearchTermsResponse {
    #[prost(message, repeated, tag = "1")]
    pub terms: ::prost::alloc::vec::Vec<Term>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetTermRequest {
    #[prost(string, tag = "1")]
    pub term_id: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetTermRelationsRequest {
    #[prost(string, tag = "1")]
    pub term_id: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetTermRelationsResponse {
    #[prost(message, repeated, tag = "1")]
    pub relations: ::prost::alloc::vec::Vec<Relation>,
}

pub(crate) const LIST_TERMS: &str = "/glossary.GlossaryService/ListTerms";
pub(crate) const SEARCH_TERMS: &str = "/glossary.GlossaryService/SearchTerms";
pub(crate) const GET_TERM: &str = "/glossary.GlossaryService/GetTerm";
pub(crate) const GET_TERM_RELATIONS: &str = "/glossary.GlossaryService/GetTermRelations";
