//! A small glossary service to load test against.
//!
//! Serves `GET /terms`, `GET /terms/:id` and `GET /graph` from a fixed glossary, with
//! knobs for added latency, forced error statuses and a malformed graph body.
pub use axum::http::StatusCode;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use rand_distr::{Distribution, Normal};
use serde::Serialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Term {
    pub term: String,
    pub definition: String,
    pub category: String,
    pub source: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Relation {
    pub source: String,
    pub target: String,
    pub relation: String,
}

/// How the service misbehaves.
#[derive(Debug, Clone, Default)]
pub struct MockOptions {
    /// Added to every response.
    pub latency: Duration,
    /// Standard deviation of normally distributed noise on top of `latency`.
    pub jitter: Option<Duration>,
    /// Answer every request with this status and an empty body.
    pub status: Option<StatusCode>,
    pub malformed_graph: bool,
}

impl MockOptions {
    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn jitter(mut self, jitter: Duration) -> Self {
        self.jitter = Some(jitter);
        self
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    pub fn malformed_graph(mut self) -> Self {
        self.malformed_graph = true;
        self
    }

    fn delay(&self) -> Duration {
        let Some(jitter) = self.jitter else {
            return self.latency;
        };
        match Normal::new(self.latency.as_secs_f64(), jitter.as_secs_f64()) {
            Ok(normal) => {
                let secs: f64 = normal.sample(&mut rand::thread_rng());
                Duration::from_secs_f64(secs.max(0.))
            }
            Err(err) => {
                warn!("Invalid jitter {jitter:?}: {err}");
                self.latency
            }
        }
    }
}

struct MockState {
    options: MockOptions,
    terms: Vec<Term>,
    relations: Vec<Relation>,
}

pub fn glossary() -> Vec<Term> {
    [
        ("FastAPI", "A Python web framework for building APIs.", "Tools"),
        ("Python", "A general purpose programming language.", "Tools"),
        ("Docker", "A container runtime and image format.", "Tools"),
        ("SQLite", "An embedded relational database.", "Tools"),
        ("REST API", "An HTTP interface over resources.", "API"),
        ("ORM", "A mapping between objects and relational tables.", "Architecture"),
        ("gRPC", "A remote procedure call framework over HTTP/2.", "API"),
        ("Protocol Buffers", "A binary serialization format.", "Performance"),
    ]
    .into_iter()
    .map(|(term, definition, category)| Term {
        term: term.to_string(),
        definition: definition.to_string(),
        category: category.to_string(),
        source: "Internal Documentation".to_string(),
    })
    .collect()
}

pub fn relations() -> Vec<Relation> {
    [
        ("FastAPI", "Python", "depends_on"),
        ("FastAPI", "REST API", "uses"),
        ("ORM", "SQLite", "uses"),
        ("gRPC", "Protocol Buffers", "uses"),
        ("gRPC", "REST API", "alternative_to"),
        ("Docker", "Python", "related_to"),
    ]
    .into_iter()
    .map(|(source, target, relation)| Relation {
        source: source.to_string(),
        target: target.to_string(),
        relation: relation.to_string(),
    })
    .collect()
}

pub fn router(options: MockOptions) -> Router {
    let state = Arc::new(MockState {
        options,
        terms: glossary(),
        relations: relations(),
    });

    Router::new()
        .route("/terms", get(list_terms))
        .route("/terms/:id", get(get_term))
        .route("/graph", get(get_graph))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve on `addr` until the process exits.
pub async fn run(addr: SocketAddr, options: MockOptions) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Mock glossary listening on {}", listener.local_addr()?);
    axum::serve(listener, router(options)).await?;
    Ok(())
}

/// Serve on an ephemeral local port in the background and return its address.
pub async fn spawn(options: MockOptions) -> anyhow::Result<SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = router(options);
    tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, app).await {
            error!("Mock glossary stopped: {err}");
        }
    });
    Ok(addr)
}

async fn misbehave(state: &MockState) -> Option<Response> {
    let delay = state.options.delay();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    state.options.status.map(|status| status.into_response())
}

async fn list_terms(State(state): State<Arc<MockState>>) -> Response {
    if let Some(response) = misbehave(&state).await {
        return response;
    }
    Json(&state.terms).into_response()
}

async fn get_term(State(state): State<Arc<MockState>>, Path(id): Path<String>) -> Response {
    if let Some(response) = misbehave(&state).await {
        return response;
    }
    let wanted = normalize(&id);
    match state.terms.iter().find(|t| normalize(&t.term) == wanted) {
        Some(term) => Json(term).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "detail": format!("Term '{id}' not found") })),
        )
            .into_response(),
    }
}

async fn get_graph(State(state): State<Arc<MockState>>) -> Response {
    if let Some(response) = misbehave(&state).await {
        return response;
    }
    if state.options.malformed_graph {
        return Json(json!({ "nodes": "unavailable" })).into_response();
    }

    let nodes: Vec<_> = state
        .terms
        .iter()
        .map(|t| json!({ "id": normalize(&t.term), "label": t.term, "category": t.category }))
        .collect();
    let edges: Vec<_> = state
        .relations
        .iter()
        .map(|r| {
            json!({
                "source": normalize(&r.source),
                "target": normalize(&r.target),
                "relation": r.relation,
            })
        })
        .collect();
    Json(json!({ "nodes": nodes, "edges": edges })).into_response()
}

fn normalize(id: &str) -> String {
    id.to_lowercase().replace(' ', "_")
}
