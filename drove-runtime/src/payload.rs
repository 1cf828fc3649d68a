//! Synthetic request parameters: search queries, limits, fallback ids and term names.
use drove_core::{choose, RandomSource};

/// Ids looked up over REST before a session has seen any.
pub const REST_FALLBACK_IDS: &[&str] = &["FastAPI", "Python", "Docker", "SQLite", "REST API", "ORM"];

/// Ids looked up over gRPC before a session has seen any.
pub const RPC_FALLBACK_IDS: &[&str] = &["grpc", "protobuf", "http2", "rpc"];

pub const RPC_STRESS_IDS: &[&str] = &["grpc", "protobuf", "http2", "rpc", "api", "rest"];

/// Queries of the REST-like gRPC profile. The empty query matches everything.
pub const RPC_QUERIES: &[&str] = &["gRPC", "Protocol", "HTTP", "API", "RPC", ""];

pub const RPC_HEAVY_QUERIES: &[&str] = &["gRPC", "Protocol", "HTTP", "API", "RPC"];

pub const GENERATED_QUERIES: &[&str] = &[
    "test",
    "load",
    "API",
    "data",
    "system",
    "process",
    "management",
    "development",
];

pub const SEARCH_LIMITS: &[u32] = &[5, 10, 20, 50];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    /// A realistic query, a doubled random letter, or the naming prefix.
    SearchQuery,
    SearchLimit,
    /// `<prefix>_Term_<5 digits>`
    TermName,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Text(String),
    Limit(u32),
}

impl Payload {
    pub fn into_text(self) -> String {
        match self {
            Payload::Text(text) => text,
            Payload::Limit(limit) => limit.to_string(),
        }
    }

    pub fn as_limit(&self) -> Option<u32> {
        match self {
            Payload::Limit(limit) => Some(*limit),
            Payload::Text(_) => None,
        }
    }
}

/// Pure generator of request parameters, parameterized only by the naming prefix.
#[derive(Debug, Clone)]
pub struct PayloadGenerator {
    prefix: String,
}

impl PayloadGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn generate<R>(&self, kind: PayloadKind, rng: &mut R) -> Payload
    where
        R: RandomSource + ?Sized,
    {
        match kind {
            PayloadKind::SearchQuery => Payload::Text(self.search_query(rng)),
            PayloadKind::SearchLimit => Payload::Limit(search_limit(rng)),
            PayloadKind::TermName => Payload::Text(self.term_name(rng)),
        }
    }

    fn search_query<R>(&self, rng: &mut R) -> String
    where
        R: RandomSource + ?Sized,
    {
        // fixed queries, then one slot each for a doubled letter and the prefix
        let slots = GENERATED_QUERIES.len() as u64 + 2;
        match rng.draw(slots) as usize {
            idx if idx < GENERATED_QUERIES.len() => GENERATED_QUERIES[idx].to_string(),
            idx if idx == GENERATED_QUERIES.len() => {
                let letter = char::from(b'a' + rng.draw(26) as u8);
                format!("{letter}{letter}")
            }
            _ => self.prefix.clone(),
        }
    }

    fn term_name<R>(&self, rng: &mut R) -> String
    where
        R: RandomSource + ?Sized,
    {
        format!("{}_Term_{}", self.prefix, 10_000 + rng.draw(90_000))
    }
}

fn search_limit<R>(rng: &mut R) -> u32
where
    R: RandomSource + ?Sized,
{
    choose(rng, SEARCH_LIMITS).copied().unwrap_or(10)
}

/// Pick one query from a fixed pool.
pub fn query_from<R>(rng: &mut R, pool: &[&str]) -> String
where
    R: RandomSource + ?Sized,
{
    choose(rng, pool).map(|q| q.to_string()).unwrap_or_default()
}

/// Identifier derived from a term name the way the glossary service derives it.
pub fn term_id(name: &str) -> String {
    name.to_lowercase()
        .replace(' ', "_")
        .replace(['(', ')'], "")
}
