//! Benchmark result model
//!
//! The exported JSON keeps the historical key names: `ansible` for the
//! baseline backend and `ftl2` for the candidate engine.

use serde::{Deserialize, Serialize, Serializer};
use std::time::Duration;

/// What one backend did for one operation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BackendOutcome {
    /// Wall-clock seconds
    #[serde(serialize_with = "round3")]
    pub time: f64,
    pub success: bool,
}

impl BackendOutcome {
    pub fn ok(elapsed: Duration) -> Self {
        Self {
            time: elapsed.as_secs_f64(),
            success: true,
        }
    }

    pub fn failed(elapsed: Duration) -> Self {
        Self {
            time: elapsed.as_secs_f64(),
            success: false,
        }
    }

    /// Failure that never started
    pub fn not_run() -> Self {
        Self {
            time: 0.0,
            success: false,
        }
    }

    pub fn status(&self) -> &'static str {
        if self.success { "ok" } else { "FAIL" }
    }
}

/// Result of one operation across both backends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    pub name: String,
    pub description: String,
    pub hosts: usize,
    #[serde(rename = "ansible", default, skip_serializing_if = "Option::is_none")]
    pub baseline: Option<BackendOutcome>,
    #[serde(rename = "ftl2", default, skip_serializing_if = "Option::is_none")]
    pub candidate: Option<BackendOutcome>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "round2_opt"
    )]
    pub speedup: Option<f64>,
}

impl BenchmarkResult {
    pub fn new(name: impl Into<String>, description: impl Into<String>, hosts: usize) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            hosts,
            baseline: None,
            candidate: None,
            speedup: None,
        }
    }

    /// Set `speedup` from the two outcomes
    ///
    /// Only defined when both backends ran and succeeded; a zero candidate
    /// time leaves it unset.
    pub fn compute_speedup(&mut self) {
        self.speedup = match (self.baseline, self.candidate) {
            (Some(base), Some(cand)) if base.success && cand.success && cand.time > 0.0 => {
                Some(base.time / cand.time)
            }
            _ => None,
        };
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

fn round3<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round_to(*value, 3))
}

fn round2_opt<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) => serializer.serialize_some(&round_to(*v, 2)),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speedup_requires_both_successes() {
        let mut result = BenchmarkResult::new("gather_facts", "facts", 3);
        result.baseline = Some(BackendOutcome::ok(Duration::from_secs(2)));
        result.candidate = Some(BackendOutcome::ok(Duration::from_millis(500)));
        result.compute_speedup();
        assert_eq!(result.speedup, Some(4.0));

        result.candidate = Some(BackendOutcome::failed(Duration::from_millis(500)));
        result.compute_speedup();
        assert_eq!(result.speedup, None);

        result.candidate = None;
        result.compute_speedup();
        assert_eq!(result.speedup, None);
    }

    #[test]
    fn test_zero_candidate_time_has_no_speedup() {
        let mut result = BenchmarkResult::new("gather_facts", "facts", 1);
        result.baseline = Some(BackendOutcome::ok(Duration::from_secs(1)));
        result.candidate = Some(BackendOutcome::ok(Duration::ZERO));
        result.compute_speedup();
        assert_eq!(result.speedup, None);
    }

    #[test]
    fn test_json_shape() {
        let mut result = BenchmarkResult::new("file_operations", "files", 5);
        result.baseline = Some(BackendOutcome {
            time: 3.14159,
            success: true,
        });
        result.candidate = Some(BackendOutcome {
            time: 1.0004,
            success: true,
        });
        result.compute_speedup();

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["ansible"]["time"], 3.142);
        assert_eq!(json["ftl2"]["time"], 1.0);
        assert_eq!(json["speedup"], 3.14);
        assert_eq!(json["hosts"], 5);
    }

    #[test]
    fn test_suppressed_backend_is_omitted() {
        let mut result = BenchmarkResult::new("install_package", "pkg", 2);
        result.candidate = Some(BackendOutcome::ok(Duration::from_secs(1)));
        result.compute_speedup();

        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("ansible").is_none());
        assert!(json.get("speedup").is_none());
        assert_eq!(json["ftl2"]["success"], true);
    }
}
