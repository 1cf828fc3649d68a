//! Archetypes: named, weighted action sets with a think-time distribution.
use crate::adapter::ProtocolAdapter;
use crate::error::ArchetypeError;
use crate::select::WeightedTable;
use drove_core::{Outcome, RandomSource, SeedError, SessionState, ThinkTime};
use futures_util::future::BoxFuture;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Everything an action gets to work with for one execution.
pub struct ActionContext<'a, A> {
    pub adapter: &'a A,
    pub session: &'a mut SessionState,
    pub rng: &'a mut (dyn RandomSource + Send),
}

pub type ExecuteFn<A> =
    Arc<dyn for<'a> Fn(ActionContext<'a, A>) -> BoxFuture<'a, Outcome> + Send + Sync>;

pub type StartFn<A> =
    Arc<dyn for<'a> Fn(&'a A) -> BoxFuture<'a, Result<SessionState, SeedError>> + Send + Sync>;

/// One named, weighted unit of request work.
pub struct Action<A> {
    name: String,
    weight: u32,
    execute: ExecuteFn<A>,
}

impl<A> Action<A> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn weight(&self) -> u32 {
        self.weight
    }

    pub fn execute<'a>(&self, ctx: ActionContext<'a, A>) -> BoxFuture<'a, Outcome> {
        (self.execute)(ctx)
    }
}

impl<A> Clone for Action<A> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            weight: self.weight,
            execute: self.execute.clone(),
        }
    }
}

impl<A> fmt::Debug for Action<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("name", &self.name)
            .field("weight", &self.weight)
            .finish_non_exhaustive()
    }
}

/// A behavioral profile shared read-only by every virtual user assigned to it.
pub struct Archetype<A> {
    name: String,
    actions: WeightedTable<Action<A>>,
    think_time: ThinkTime,
    on_start: Option<StartFn<A>>,
}

impl<A: ProtocolAdapter> Archetype<A> {
    pub fn builder(name: impl Into<String>) -> ArchetypeBuilder<A> {
        ArchetypeBuilder {
            name: name.into(),
            actions: vec![],
            think_time: (ThinkTime::default().min(), ThinkTime::default().max()),
            on_start: None,
        }
    }
}

impl<A> Archetype<A> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn think_time(&self) -> ThinkTime {
        self.think_time
    }

    /// Actions in definition order.
    pub fn actions(&self) -> &[Action<A>] {
        self.actions.items()
    }

    pub fn total_weight(&self) -> u64 {
        self.actions.total_weight()
    }

    pub fn select<R>(&self, rng: &mut R) -> &Action<A>
    where
        R: RandomSource + ?Sized,
    {
        self.actions.pick(rng)
    }

    pub fn has_on_start(&self) -> bool {
        self.on_start.is_some()
    }

    /// Run the session seed. Archetypes without one start from an empty session.
    pub async fn seed(&self, adapter: &A) -> Result<SessionState, SeedError> {
        match &self.on_start {
            Some(on_start) => on_start(adapter).await,
            None => Ok(SessionState::new()),
        }
    }
}

impl<A> fmt::Debug for Archetype<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Archetype")
            .field("name", &self.name)
            .field("actions", &self.actions.items())
            .field("think_time", &self.think_time)
            .field("on_start", &self.on_start.is_some())
            .finish()
    }
}

pub struct ArchetypeBuilder<A> {
    name: String,
    actions: Vec<(Action<A>, u32)>,
    think_time: (Duration, Duration),
    on_start: Option<StartFn<A>>,
}

impl<A: ProtocolAdapter> ArchetypeBuilder<A> {
    pub fn think_time(mut self, min: Duration, max: Duration) -> Self {
        self.think_time = (min, max);
        self
    }

    pub fn think(self, think_time: ThinkTime) -> Self {
        self.think_time(think_time.min(), think_time.max())
    }

    pub fn on_start<F>(mut self, f: F) -> Self
    where
        F: for<'a> Fn(&'a A) -> BoxFuture<'a, Result<SessionState, SeedError>>
            + Send
            + Sync
            + 'static,
    {
        self.on_start = Some(Arc::new(f));
        self
    }

    pub fn action<F>(mut self, name: impl Into<String>, weight: u32, f: F) -> Self
    where
        F: for<'a> Fn(ActionContext<'a, A>) -> BoxFuture<'a, Outcome> + Send + Sync + 'static,
    {
        let action = Action {
            name: name.into(),
            weight,
            execute: Arc::new(f),
        };
        self.actions.push((action, weight));
        self
    }

    pub fn build(self) -> Result<Archetype<A>, ArchetypeError> {
        if self.actions.is_empty() {
            return Err(ArchetypeError::NoActions(self.name));
        }

        let mut seen = HashSet::new();
        for (action, _) in &self.actions {
            if !seen.insert(action.name.as_str()) {
                return Err(ArchetypeError::DuplicateAction {
                    archetype: self.name.clone(),
                    action: action.name.clone(),
                });
            }
        }

        let (min, max) = self.think_time;
        let think_time =
            ThinkTime::new(min, max).map_err(|err| ArchetypeError::InvalidThinkTime {
                archetype: self.name.clone(),
                reason: err.to_string(),
            })?;

        let actions = WeightedTable::new(self.actions, |action| action.name.clone())?;

        Ok(Archetype {
            name: self.name,
            actions,
            think_time,
            on_start: self.on_start,
        })
    }
}
