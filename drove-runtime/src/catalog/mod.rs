//! The glossary service's user archetypes, expressed as data.
//!
//! Archetypes are generic over the adapter: the REST set only issues operations the REST
//! adapter offers and the RPC set only those the gRPC adapter offers.
use crate::error::RuntimeError;
use crate::payload::PayloadGenerator;
use drove::{ActionContext, Archetype, ArchetypeError, ProtocolAdapter};
use drove_core::{ErrorClass, Operation, Outcome, SeedError, SessionState, ThinkTime};
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

mod rest;
mod rpc;

pub const REST_ARCHETYPES: &[&str] = &["browser", "light", "heavy", "stress"];
pub const RPC_ARCHETYPES: &[&str] = &["rest-like", "light", "heavy", "stress"];

/// Think time of the `light` archetypes.
pub const LIGHT_THINK: (Duration, Duration) = (Duration::from_millis(500), Duration::from_secs(2));
pub const HEAVY_THINK: (Duration, Duration) = (Duration::from_secs(2), Duration::from_secs(5));
pub const STRESS_THINK: (Duration, Duration) =
    (Duration::from_millis(100), Duration::from_millis(500));

/// Per-call limit of the gRPC `stress` archetype, tighter than the adapter's.
pub const STRESS_CALL_TIMEOUT: Duration = Duration::from_secs(5);

/// Most calls any single action makes.
pub const MAX_ACTION_CALLS: u32 = 3;

#[derive(Debug, Clone)]
pub struct Catalog {
    think_time: ThinkTime,
    payloads: PayloadGenerator,
    action_limit: Option<Duration>,
}

impl Catalog {
    /// `think_time` applies to the default archetype of each protocol; the others carry
    /// their own.
    pub fn new(think_time: ThinkTime, payloads: PayloadGenerator) -> Self {
        Self {
            think_time,
            payloads,
            action_limit: None,
        }
    }

    /// Bound every action that chains several calls, taken as a whole.
    pub fn action_limit(mut self, limit: Duration) -> Self {
        self.action_limit = Some(limit);
        self
    }

    pub fn rest<A: ProtocolAdapter>(&self) -> Result<Vec<Archetype<A>>, ArchetypeError> {
        Ok(vec![
            rest::browser(self.think_time, self.action_limit)?,
            rest::light()?,
            rest::heavy(self.action_limit)?,
            rest::stress()?,
        ])
    }

    pub fn rpc<A: ProtocolAdapter>(&self) -> Result<Vec<Archetype<A>>, ArchetypeError> {
        Ok(vec![
            rpc::rest_like(self.think_time, self.action_limit)?,
            rpc::light()?,
            rpc::heavy(self.action_limit)?,
            rpc::stress(self.payloads.clone())?,
        ])
    }
}

/// `name[:weight]` as given on the command line. The weight defaults to 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchetypeChoice {
    pub name: String,
    pub weight: u32,
}

impl FromStr for ArchetypeChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, weight) = match s.split_once(':') {
            Some((name, weight)) => {
                let weight = weight
                    .parse::<u32>()
                    .map_err(|err| format!("invalid weight `{weight}`: {err}"))?;
                (name, weight)
            }
            None => (s, 1),
        };

        if name.is_empty() {
            return Err("archetype name is empty".to_string());
        }
        if weight == 0 {
            return Err(format!("weight of `{name}` must be greater than zero"));
        }

        Ok(Self {
            name: name.to_string(),
            weight,
        })
    }
}

impl fmt::Display for ArchetypeChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.weight)
    }
}

/// Pair the chosen archetypes with their weights. No choices means every archetype,
/// equally weighted.
pub fn select_mix<A>(
    archetypes: Vec<Archetype<A>>,
    choices: &[ArchetypeChoice],
) -> Result<Vec<(Arc<Archetype<A>>, u32)>, RuntimeError> {
    if choices.is_empty() {
        return Ok(archetypes.into_iter().map(|a| (Arc::new(a), 1)).collect());
    }

    let available: Vec<String> = archetypes.iter().map(|a| a.name().to_string()).collect();
    let mut archetypes: Vec<Option<Arc<Archetype<A>>>> =
        archetypes.into_iter().map(|a| Some(Arc::new(a))).collect();

    let mut mix = Vec::with_capacity(choices.len());
    for choice in choices {
        let idx = available
            .iter()
            .position(|name| *name == choice.name)
            .ok_or_else(|| RuntimeError::UnknownArchetype {
                name: choice.name.clone(),
                available: available.join(", "),
            })?;
        let archetype = archetypes[idx]
            .take()
            .ok_or_else(|| RuntimeError::DuplicateArchetype(choice.name.clone()))?;
        mix.push((archetype, choice.weight));
    }
    Ok(mix)
}

pub(crate) fn tagged(operation: &str, archetype: &str) -> String {
    format!("{operation} [{archetype}]")
}

pub(crate) async fn seed_from_list<A: ProtocolAdapter>(
    adapter: &A,
) -> Result<SessionState, SeedError> {
    let outcome = adapter.call(Operation::ListTerms).await;
    match SeedError::from_outcome(&outcome) {
        Some(err) => Err(err),
        None => Ok(SessionState::with_ids(outcome.into_entity_ids())),
    }
}

pub(crate) async fn invoke<A: ProtocolAdapter>(
    adapter: &A,
    operation: Operation,
    limit: Option<Duration>,
) -> Outcome {
    let method = operation.method_name();
    within(limit, method, adapter.call(operation)).await
}

/// Bound a whole action, however many calls it makes.
pub(crate) async fn within<F>(limit: Option<Duration>, label: &str, action: F) -> Outcome
where
    F: Future<Output = Outcome>,
{
    let Some(limit) = limit else {
        return action.await;
    };

    match tokio::time::timeout(limit, action).await {
        Ok(outcome) => outcome,
        Err(_) => Outcome::failure(
            ErrorClass::Timeout,
            format!(
                "{label} gave no response within {}",
                humantime::format_duration(limit)
            ),
        ),
    }
}

pub(crate) async fn list_terms<A: ProtocolAdapter>(
    ctx: ActionContext<'_, A>,
    limit: Option<Duration>,
) -> Outcome {
    let outcome = invoke(ctx.adapter, Operation::ListTerms, limit).await;
    ctx.session.refresh_from(&outcome);
    outcome
}

pub(crate) async fn get_graph<A: ProtocolAdapter>(ctx: ActionContext<'_, A>) -> Outcome {
    ctx.adapter.call(Operation::GetGraph).await
}

/// Look up a known term, or one of `fallback` while nothing is known.
pub(crate) async fn get_term<A: ProtocolAdapter>(
    ctx: ActionContext<'_, A>,
    fallback: &'static [&'static str],
    limit: Option<Duration>,
) -> Outcome {
    let Some(term_id) = ctx.session.pick(&mut *ctx.rng, fallback) else {
        return no_term();
    };
    invoke(ctx.adapter, Operation::GetTerm { term_id }, limit).await
}

/// Look up one of `ids`, ignoring what the session knows.
pub(crate) async fn get_fixed_term<A: ProtocolAdapter>(
    ctx: ActionContext<'_, A>,
    ids: &'static [&'static str],
    limit: Option<Duration>,
) -> Outcome {
    let Some(term_id) = drove_core::choose(&mut *ctx.rng, ids) else {
        return no_term();
    };
    let operation = Operation::GetTerm {
        term_id: term_id.to_string(),
    };
    invoke(ctx.adapter, operation, limit).await
}

/// List terms, then follow up with `next` if the listing succeeded.
pub(crate) async fn list_then<A: ProtocolAdapter>(
    ctx: ActionContext<'_, A>,
    next: FollowUp,
    limit: Option<Duration>,
) -> Outcome {
    let label = match next {
        FollowUp::Graph => "ListTerms + GetGraph",
        FollowUp::KnownTerm => "ListTerms + GetTerm",
    };
    within(limit, label, async move {
        let listed = ctx.adapter.call(Operation::ListTerms).await;
        ctx.session.refresh_from(&listed);
        if !listed.is_success() {
            return listed;
        }

        let operation = match next {
            FollowUp::Graph => Operation::GetGraph,
            FollowUp::KnownTerm => match ctx.session.pick(&mut *ctx.rng, &[]) {
                Some(term_id) => Operation::GetTerm { term_id },
                None => return listed,
            },
        };
        listed.then(ctx.adapter.call(operation).await)
    })
    .await
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FollowUp {
    Graph,
    KnownTerm,
}

fn no_term() -> Outcome {
    Outcome::failure(ErrorClass::ProtocolError, "no term id to look up")
}
