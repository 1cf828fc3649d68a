use crate::outcome::Outcome;
use crate::random::{choose, RandomSource};

/// Per-virtual-user memory.
///
/// Owned by exactly one scheduler loop; list actions refresh it so that later lookups
/// target identifiers the service actually returned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    known_entity_ids: Vec<String>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ids(ids: Vec<String>) -> Self {
        Self {
            known_entity_ids: ids,
        }
    }

    pub fn known_ids(&self) -> &[String] {
        &self.known_entity_ids
    }

    pub fn is_empty(&self) -> bool {
        self.known_entity_ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.known_entity_ids.len()
    }

    pub fn replace_ids(&mut self, ids: Vec<String>) {
        self.known_entity_ids = ids;
    }

    /// Replace the cache with the ids a successful list response carried.
    ///
    /// Failed outcomes and responses without ids leave the cache as it was.
    pub fn refresh_from(&mut self, outcome: &Outcome) {
        if outcome.is_success() && !outcome.entity_ids().is_empty() {
            self.known_entity_ids = outcome.entity_ids().to_vec();
        }
    }

    /// A random known id, or a random entry of `fallback` when nothing is known yet.
    pub fn pick<R>(&self, rng: &mut R, fallback: &[&str]) -> Option<String>
    where
        R: RandomSource + ?Sized,
    {
        if let Some(id) = choose(rng, &self.known_entity_ids) {
            return Some(id.clone());
        }
        choose(rng, fallback).map(|id| id.to_string())
    }

    /// Up to `n` distinct known ids, in random order.
    pub fn sample<R>(&self, rng: &mut R, n: usize) -> Vec<String>
    where
        R: RandomSource + ?Sized,
    {
        let mut pool: Vec<&String> = self.known_entity_ids.iter().collect();
        let mut picked = Vec::with_capacity(n.min(pool.len()));
        while picked.len() < n && !pool.is_empty() {
            let idx = rng.draw(pool.len() as u64) as usize;
            picked.push(pool.swap_remove(idx).clone());
        }
        picked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::ErrorClass;
    use crate::random::FixedDraw;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn ids(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn refresh_only_from_successful_listings() {
        let mut session = SessionState::with_ids(ids(&["grpc"]));

        session.refresh_from(&Outcome::failure(ErrorClass::Unavailable, "down"));
        assert_eq!(session.known_ids(), ids(&["grpc"]));

        session.refresh_from(&Outcome::success(1));
        assert_eq!(session.known_ids(), ids(&["grpc"]));

        session.refresh_from(&Outcome::success(2).with_entity_ids(ids(&["http2", "rpc"])));
        assert_eq!(session.known_ids(), ids(&["http2", "rpc"]));
    }

    #[test]
    fn pick_prefers_known_ids() {
        let empty = SessionState::new();
        assert_eq!(
            empty.pick(&mut FixedDraw::Highest, &["grpc", "protobuf"]),
            Some("protobuf".to_string())
        );
        assert_eq!(empty.pick(&mut FixedDraw::Lowest, &[]), None);

        let known = SessionState::with_ids(ids(&["API", "ORM"]));
        assert_eq!(
            known.pick(&mut FixedDraw::Lowest, &["grpc"]),
            Some("API".to_string())
        );
    }

    #[test]
    fn sample_is_distinct_and_bounded() {
        let session = SessionState::with_ids(ids(&["a", "b", "c", "d", "e"]));
        let mut rng = SmallRng::seed_from_u64(3);

        let picked = session.sample(&mut rng, 3);
        assert_eq!(picked.len(), 3);
        assert_eq!(picked.iter().collect::<HashSet<_>>().len(), 3);

        assert_eq!(session.sample(&mut rng, 10).len(), 5);
        assert!(SessionState::new().sample(&mut rng, 3).is_empty());
    }
}
