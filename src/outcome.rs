//! Per-source outcomes.
//!
//! Every adapter call yields exactly one [`SourceResult`]. Multi-entity
//! sources (accounts, properties, sites) nest one outcome per entity in an
//! [`EntityOutcomes`] map so partial success is representable.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error_handling::{FailureKind, SourceError};

/// Outcome of one adapter invocation.
///
/// Serialized with a `status` tag:
///
/// ```json
/// {"status": "success", "data": {...}}
/// {"status": "empty", "reason": "no accounts"}
/// {"status": "failure", "kind": "upstream_http", "message": "...", "http_status": 403}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceResult<T> {
    Success {
        data: T,
    },
    Empty {
        reason: String,
    },
    Failure {
        kind: FailureKind,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        http_status: Option<u16>,
    },
}

/// Outcomes keyed by entity (account id, property id, site URL).
///
/// A `BTreeMap` so the serialized order does not depend on which request
/// finished first.
pub type EntityOutcomes<T> = BTreeMap<String, SourceResult<T>>;

impl<T> SourceResult<T> {
    pub fn success(data: T) -> Self {
        SourceResult::Success { data }
    }

    pub fn empty(reason: impl Into<String>) -> Self {
        SourceResult::Empty {
            reason: reason.into(),
        }
    }

    /// A failure with no upstream error behind it (panic, broken invariant).
    pub fn internal(message: impl Into<String>) -> Self {
        SourceResult::Failure {
            kind: FailureKind::Internal,
            message: message.into(),
            http_status: None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SourceResult::Success { .. })
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, SourceResult::Empty { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, SourceResult::Failure { .. })
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            SourceResult::Success { data } => Some(data),
            _ => None,
        }
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            SourceResult::Failure { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> SourceResult<U> {
        match self {
            SourceResult::Success { data } => SourceResult::Success { data: f(data) },
            SourceResult::Empty { reason } => SourceResult::Empty { reason },
            SourceResult::Failure {
                kind,
                message,
                http_status,
            } => SourceResult::Failure {
                kind,
                message,
                http_status,
            },
        }
    }
}

impl<T> From<SourceError> for SourceResult<T> {
    fn from(error: SourceError) -> Self {
        SourceResult::Failure {
            kind: error.kind(),
            http_status: error.http_status(),
            message: error.to_string(),
        }
    }
}

impl<T> From<Result<T, SourceError>> for SourceResult<T> {
    fn from(result: Result<T, SourceError>) -> Self {
        match result {
            Ok(data) => SourceResult::success(data),
            Err(error) => error.into(),
        }
    }
}

/// Counts of outcomes in a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OutcomeTally {
    pub succeeded: usize,
    pub empty: usize,
    pub failed: usize,
}

impl OutcomeTally {
    pub fn record<T>(&mut self, outcome: &SourceResult<T>) {
        match outcome {
            SourceResult::Success { .. } => self.succeeded += 1,
            SourceResult::Empty { .. } => self.empty += 1,
            SourceResult::Failure { .. } => self.failed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.empty + self.failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serialize_success() {
        let outcome = SourceResult::success(vec![1, 2]);
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({"status": "success", "data": [1, 2]})
        );
    }

    #[test]
    fn test_serialize_empty() {
        let outcome: SourceResult<()> = SourceResult::empty("no accounts");
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({"status": "empty", "reason": "no accounts"})
        );
    }

    #[test]
    fn test_serialize_failure_from_source_error() {
        let outcome: SourceResult<()> = SourceError::Upstream {
            status: 403,
            message: "forbidden".into(),
        }
        .into();
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({
                "status": "failure",
                "kind": "upstream_http",
                "message": "HTTP 403: forbidden",
                "http_status": 403
            })
        );
    }

    #[test]
    fn test_transport_failure_omits_http_status() {
        let outcome: SourceResult<()> = SourceError::Transport("reset".into()).into();
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["kind"], "transport");
        assert!(value.get("http_status").is_none());
    }

    #[test]
    fn test_from_result_and_map() {
        let ok: SourceResult<u32> = Ok::<_, SourceError>(2).into();
        assert_eq!(ok.clone().map(|n| n * 10).data(), Some(&20));
        let failed: SourceResult<u32> =
            Err(SourceError::Timeout(std::time::Duration::from_secs(1))).into();
        assert_eq!(failed.map(|n| n * 10).failure_kind(), Some(FailureKind::Timeout));
    }

    #[test]
    fn test_tally() {
        let mut tally = OutcomeTally::default();
        tally.record(&SourceResult::success(()));
        tally.record(&SourceResult::<()>::empty("none"));
        tally.record(&SourceResult::<()>::internal("panic"));
        tally.record(&SourceResult::success(()));
        assert_eq!(
            tally,
            OutcomeTally {
                succeeded: 2,
                empty: 1,
                failed: 1
            }
        );
        assert_eq!(tally.total(), 4);
    }
}
