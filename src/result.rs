//! Execution result types.
//!
//! The service reports samples with the leftmost character belonging to
//! qubit 0. Results here follow the OpenQASM 3 convention instead: the
//! rightmost bit corresponds to the lowest-indexed qubit, so bitstrings are
//! reversed when a [`JobResult`] is assembled. For example, a service sample
//! `"10"` (qubit 0 measured `1`) becomes `"01"`.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::configuration::BackendConfiguration;
use crate::job::{CompositeJobId, JobPayload};
use crate::status::JobStatus;

/// Measurement counts from circuit execution.
///
/// Maps bitstrings (rightmost bit = lowest qubit index) to occurrence counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    counts: FxHashMap<String, u64>,
}

impl Counts {
    /// Create empty counts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build counts from a service sample histogram, reversing each bitstring.
    pub fn from_service_samples(samples: &FxHashMap<String, u64>) -> Self {
        samples
            .iter()
            .map(|(bits, &count)| (bits.chars().rev().collect::<String>(), count))
            .collect()
    }

    /// Insert a count for a bitstring, accumulating duplicates.
    pub fn insert(&mut self, bitstring: impl Into<String>, count: u64) {
        *self.counts.entry(bitstring.into()).or_default() += count;
    }

    /// Get the count for a bitstring.
    pub fn get(&self, bitstring: &str) -> u64 {
        self.counts.get(bitstring).copied().unwrap_or(0)
    }

    /// Iterate over (bitstring, count) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &u64)> {
        self.counts.iter()
    }

    /// Get the total number of shots.
    pub fn total_shots(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Get the most frequent bitstring.
    pub fn most_frequent(&self) -> Option<(&String, &u64)> {
        self.counts.iter().max_by_key(|&(_, count)| count)
    }

    /// Get probabilities for each bitstring.
    #[allow(clippy::cast_precision_loss)]
    pub fn probabilities(&self) -> FxHashMap<String, f64> {
        let total = self.total_shots() as f64;
        if total == 0.0 {
            return FxHashMap::default();
        }
        self.counts
            .iter()
            .map(|(k, &v)| (k.clone(), v as f64 / total))
            .collect()
    }

    /// Get the number of unique bitstrings.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Check if counts are empty.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl FromIterator<(String, u64)> for Counts {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        let mut counts = Self::new();
        for (key, value) in iter {
            counts.insert(key, value);
        }
        counts
    }
}

/// Result of one circuit (one sub-job).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentResult {
    /// Whether the sub-job finished as `Done`.
    pub success: bool,
    /// Final sub-job status.
    pub status: JobStatus,
    /// Shots requested.
    pub shots: u32,
    /// Measurement counts.
    pub counts: Counts,
}

impl ExperimentResult {
    /// Build from a sub-job payload.
    pub fn from_payload(payload: &JobPayload) -> Self {
        Self {
            success: payload.status.is_success(),
            status: payload.status.clone(),
            shots: payload.shots,
            counts: payload
                .samples
                .as_ref()
                .map(Counts::from_service_samples)
                .unwrap_or_default(),
        }
    }
}

/// Results of a composite job, one experiment per sub-job in id order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobResult {
    /// Target the job ran on.
    pub backend_name: String,
    /// Backend version.
    pub backend_version: String,
    /// Comma-joined composite id.
    pub job_id: String,
    /// Whether every experiment succeeded.
    pub success: bool,
    /// Per-circuit results.
    pub results: Vec<ExperimentResult>,
}

impl JobResult {
    /// Assemble results from the final sub-job payloads.
    pub fn from_payloads(
        configuration: &BackendConfiguration,
        job_id: &CompositeJobId,
        payloads: &[JobPayload],
    ) -> Self {
        let results: Vec<ExperimentResult> =
            payloads.iter().map(ExperimentResult::from_payload).collect();
        Self {
            backend_name: configuration.backend_name.clone(),
            backend_version: configuration.backend_version.clone(),
            job_id: job_id.to_string(),
            success: !results.is_empty() && results.iter().all(|r| r.success),
            results,
        }
    }

    /// Counts of the `index`-th circuit.
    pub fn get_counts(&self, index: usize) -> Option<&Counts> {
        self.results.get(index).map(|r| &r.counts)
    }

    /// Counts of every circuit, in submission order.
    pub fn all_counts(&self) -> Vec<&Counts> {
        self.results.iter().map(|r| &r.counts).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(status: &str, samples: &[(&str, u64)]) -> JobPayload {
        JobPayload {
            samples: Some(samples.iter().map(|&(k, v)| (k.to_string(), v)).collect()),
            shots: 100,
            ..JobPayload::with_status(status.into())
        }
    }

    #[test]
    fn test_counts_basic() {
        let mut counts = Counts::new();
        counts.insert("00", 500);
        counts.insert("11", 400);
        counts.insert("11", 100);

        assert_eq!(counts.get("00"), 500);
        assert_eq!(counts.get("11"), 500);
        assert_eq!(counts.get("01"), 0);
        assert_eq!(counts.total_shots(), 1000);
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn test_counts_probabilities() {
        let counts: Counts = [("00".to_string(), 300), ("11".to_string(), 700)]
            .into_iter()
            .collect();
        let probs = counts.probabilities();
        assert!((probs["00"] - 0.3).abs() < 1e-10);
        assert!((probs["11"] - 0.7).abs() < 1e-10);
        assert!(Counts::new().probabilities().is_empty());

        let (most, count) = counts.most_frequent().unwrap();
        assert_eq!(most, "11");
        assert_eq!(*count, 700);
    }

    #[test]
    fn test_service_samples_are_reversed() {
        let samples: FxHashMap<String, u64> =
            [("10".to_string(), 100), ("110".to_string(), 5)].into_iter().collect();
        let counts = Counts::from_service_samples(&samples);
        assert_eq!(counts.get("01"), 100);
        assert_eq!(counts.get("011"), 5);
        assert_eq!(counts.get("10"), 0);
    }

    #[test]
    fn test_job_result_preserves_order() {
        let config = BackendConfiguration::for_target("ss_example_qpu");
        let job_id: CompositeJobId = "123abc,456def".parse().unwrap();
        let payloads = [payload("Done", &[("10", 100)]), payload("Done", &[("00", 100)])];

        let result = JobResult::from_payloads(&config, &job_id, &payloads);
        assert!(result.success);
        assert_eq!(result.job_id, "123abc,456def");
        assert_eq!(result.backend_name, "ss_example_qpu");
        assert_eq!(result.results.len(), 2);
        assert_eq!(result.get_counts(0).unwrap().get("01"), 100);
        assert_eq!(result.get_counts(1).unwrap().get("00"), 100);
        assert!(result.get_counts(2).is_none());
        assert_eq!(result.all_counts().len(), 2);
    }

    #[test]
    fn test_experiment_without_samples() {
        let experiment = ExperimentResult::from_payload(&JobPayload::with_status(JobStatus::Error));
        assert!(!experiment.success);
        assert!(experiment.counts.is_empty());
    }
}
