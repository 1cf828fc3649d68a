use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Coarse classification of a failed action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorClass {
    NotFound,
    Unavailable,
    Timeout,
    ProtocolError,
    Unknown,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorClass::NotFound => "NotFound",
            ErrorClass::Unavailable => "Unavailable",
            ErrorClass::Timeout => "Timeout",
            ErrorClass::ProtocolError => "ProtocolError",
            ErrorClass::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// Normalized result of one action execution.
///
/// The fields are private so that an error class exists exactly when the outcome is a
/// failure. Use [`Outcome::success`], [`Outcome::absent`] or [`Outcome::failure`].
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    success: bool,
    latency: Duration,
    result_size: u64,
    error_class: Option<ErrorClass>,
    detail: Option<String>,
    entity_ids: Vec<String>,
}

impl Outcome {
    pub fn success(result_size: u64) -> Self {
        Self {
            success: true,
            latency: Duration::ZERO,
            result_size,
            error_class: None,
            detail: None,
            entity_ids: vec![],
        }
    }

    /// A lookup for an entity the target does not have. Counted as a success.
    pub fn absent() -> Self {
        Self::success(0)
    }

    pub fn failure(class: ErrorClass, detail: impl Into<String>) -> Self {
        Self {
            success: false,
            latency: Duration::ZERO,
            result_size: 0,
            error_class: Some(class),
            detail: Some(detail.into()),
            entity_ids: vec![],
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Attach identifiers observed in a list response. Ignored on failures.
    pub fn with_entity_ids(mut self, ids: Vec<String>) -> Self {
        if self.success {
            self.entity_ids = ids;
        }
        self
    }

    /// Combine with the outcome of a follow-up call made by the same action.
    ///
    /// The first failure wins. Otherwise result sizes add up and the most recent
    /// non-empty id list is kept.
    pub fn then(self, next: Outcome) -> Outcome {
        if !self.success {
            return self;
        }
        if !next.success {
            let latency = self.latency + next.latency;
            return next.with_latency(latency);
        }

        let entity_ids = if next.entity_ids.is_empty() {
            self.entity_ids
        } else {
            next.entity_ids
        };

        Outcome {
            success: true,
            latency: self.latency + next.latency,
            result_size: self.result_size + next.result_size,
            error_class: None,
            detail: None,
            entity_ids,
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }

    pub fn result_size(&self) -> u64 {
        self.result_size
    }

    pub fn error_class(&self) -> Option<ErrorClass> {
        self.error_class
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    pub fn entity_ids(&self) -> &[String] {
        &self.entity_ids
    }

    pub fn into_entity_ids(self) -> Vec<String> {
        self.entity_ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_class_only_on_failure() {
        let ok = Outcome::success(3);
        assert!(ok.is_success());
        assert_eq!(ok.error_class(), None);
        assert_eq!(ok.detail(), None);

        let absent = Outcome::absent();
        assert!(absent.is_success());
        assert_eq!(absent.result_size(), 0);
        assert_eq!(absent.error_class(), None);

        let failed = Outcome::failure(ErrorClass::Timeout, "deadline");
        assert!(!failed.is_success());
        assert_eq!(failed.error_class(), Some(ErrorClass::Timeout));
        assert_eq!(failed.result_size(), 0);
    }

    #[test]
    fn failures_drop_entity_ids() {
        let failed = Outcome::failure(ErrorClass::Unavailable, "refused")
            .with_entity_ids(vec!["grpc".to_string()]);
        assert!(failed.entity_ids().is_empty());
    }

    #[test]
    fn then_keeps_first_failure() {
        let first = Outcome::failure(ErrorClass::Unavailable, "refused");
        let combined = first.clone().then(Outcome::success(10));
        assert_eq!(combined, first);
    }

    #[test]
    fn failing_follow_up_carries_summed_latency() {
        let follow_up =
            Outcome::failure(ErrorClass::Timeout, "slow").with_latency(Duration::from_millis(7));
        let combined = Outcome::success(4)
            .with_latency(Duration::from_millis(5))
            .then(follow_up);

        assert!(!combined.is_success());
        assert_eq!(combined.error_class(), Some(ErrorClass::Timeout));
        assert_eq!(combined.detail(), Some("slow"));
        assert_eq!(combined.result_size(), 0);
        assert_eq!(combined.latency(), Duration::from_millis(12));
    }

    #[test]
    fn then_sums_sizes_and_keeps_latest_ids() {
        let listing = Outcome::success(2).with_entity_ids(vec!["a".into(), "b".into()]);
        let lookup = Outcome::success(1);
        let combined = listing.then(lookup);

        assert!(combined.is_success());
        assert_eq!(combined.result_size(), 3);
        assert_eq!(combined.entity_ids(), ["a".to_string(), "b".to_string()]);
    }
}
