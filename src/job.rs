//! Composite jobs and status aggregation.
//!
//! One submission of N circuits creates N server-side jobs. The client
//! addresses them through a single [`CompositeJobId`], the comma-joined list
//! of sub-job ids, and a [`SuperstaqJob`] tracks all of them:
//!
//! ```text
//!   run() ──→ "id1,id2,id3" ──→ refresh() ──→ wait_until_terminal() ──→ result()
//!                                 │
//!                                 └─ get_job(id) for every non-terminal sub-job
//! ```
//!
//! **Invariants:**
//! - A composite id is non-empty and its sub-job ids are unique.
//! - A sub-job observed in a terminal status is never queried again.
//! - The overall status is recomputed on every refresh with
//!   [`JobStatus::merge`]; it is never carried over from older data.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::backend::SuperstaqBackend;
use crate::client::JobClient;
use crate::error::{SuperstaqError, SuperstaqResult};
use crate::result::JobResult;
use crate::status::JobStatus;

/// Default interval between status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Ordered, non-empty list of unique sub-job ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompositeJobId(Vec<String>);

impl CompositeJobId {
    /// Build from the ids returned by a submission.
    pub fn from_job_ids<I, S>(ids: I) -> SuperstaqResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids: Vec<String> = ids.into_iter().map(Into::into).collect();
        if ids.is_empty() {
            return Err(SuperstaqError::InvalidJobId(
                "a job id needs at least one sub-job".into(),
            ));
        }

        let mut seen = FxHashSet::default();
        for id in &ids {
            if id.is_empty() || id.contains(',') {
                return Err(SuperstaqError::InvalidJobId(format!(
                    "sub-job id {id:?} must be non-empty and contain no commas"
                )));
            }
            if !seen.insert(id.as_str()) {
                return Err(SuperstaqError::InvalidJobId(format!(
                    "sub-job id {id} appears more than once"
                )));
            }
        }

        Ok(Self(ids))
    }

    /// Sub-job ids in submission order.
    pub fn sub_job_ids(&self) -> &[String] {
        &self.0
    }

    /// Number of sub-jobs.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromStr for CompositeJobId {
    type Err = SuperstaqError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_job_ids(s.split(','))
    }
}

impl fmt::Display for CompositeJobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(","))
    }
}

/// Last-known state of one sub-job, as returned by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPayload {
    /// Status label.
    pub status: JobStatus,
    /// Shots requested.
    #[serde(default)]
    pub shots: u32,
    /// Bitstring histogram; leftmost character is qubit 0.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub samples: Option<FxHashMap<String, u64>>,
    /// Every other field the service returned.
    #[serde(flatten)]
    pub data: serde_json::Map<String, serde_json::Value>,
}

impl JobPayload {
    /// Payload carrying only a status.
    pub fn with_status(status: JobStatus) -> Self {
        Self {
            status,
            shots: 0,
            samples: None,
            data: serde_json::Map::new(),
        }
    }
}

/// Handle on a submitted batch of circuits.
///
/// Owns the per-sub-job status map exclusively; all polling goes through
/// `&mut self`. Create one job per composite id; to poll several batches
/// concurrently, drive several jobs from separate tasks.
pub struct SuperstaqJob<C> {
    backend: SuperstaqBackend<C>,
    job_id: CompositeJobId,
    job_info: FxHashMap<String, JobPayload>,
    overall_status: JobStatus,
}

impl<C: JobClient> SuperstaqJob<C> {
    /// Track an existing composite job.
    pub fn new(backend: SuperstaqBackend<C>, job_id: CompositeJobId) -> Self {
        Self {
            backend,
            job_id,
            job_info: FxHashMap::default(),
            overall_status: JobStatus::Submitted,
        }
    }

    /// Track a job given its comma-joined id string.
    pub fn from_id_str(backend: SuperstaqBackend<C>, job_id: &str) -> SuperstaqResult<Self> {
        Ok(Self::new(backend, job_id.parse()?))
    }

    /// The composite id.
    pub fn job_id(&self) -> &CompositeJobId {
        &self.job_id
    }

    /// The backend the job was submitted through.
    pub fn backend(&self) -> &SuperstaqBackend<C> {
        &self.backend
    }

    /// Overall status computed by the last refresh.
    pub fn overall_status(&self) -> &JobStatus {
        &self.overall_status
    }

    /// Query every non-terminal sub-job and recompute the overall status.
    ///
    /// Client errors are returned as-is; nothing is retried here.
    pub async fn refresh(&mut self) -> SuperstaqResult<()> {
        let client = self.backend.client();
        for id in self.job_id.sub_job_ids() {
            if self.job_info.get(id).is_some_and(|p| p.status.is_terminal()) {
                continue;
            }
            debug!("Querying sub-job {}", id);
            let payload = client.get_job(id).await?;
            self.job_info.insert(id.clone(), payload);
        }

        let merged = JobStatus::merge(
            self.job_id
                .sub_job_ids()
                .iter()
                .filter_map(|id| self.job_info.get(id))
                .map(|p| &p.status),
        );
        if merged != self.overall_status {
            info!("Job {} is now {}", self.job_id, merged);
        }
        self.overall_status = merged;
        Ok(())
    }

    /// Overall status, refreshed first unless already terminal.
    pub async fn status(&mut self) -> SuperstaqResult<JobStatus> {
        if !self.overall_status.is_terminal() {
            self.refresh().await?;
        }
        Ok(self.overall_status.clone())
    }

    /// Poll until the overall status is terminal.
    ///
    /// `timeout` bounds the cumulative time spent sleeping between polls,
    /// not wall-clock time. Returns the final sub-job payloads in composite
    /// id order. A terminal `Error` or `Canceled` is returned normally; use
    /// [`check_if_stopped`](Self::check_if_stopped) to turn it into an error.
    pub async fn wait_until_terminal(
        &mut self,
        timeout: Duration,
        poll_interval: Duration,
    ) -> SuperstaqResult<Vec<JobPayload>> {
        let mut slept = Duration::ZERO;
        loop {
            self.refresh().await?;
            if self.overall_status.is_terminal() {
                return Ok(self.raw_sub_job_statuses().into_iter().cloned().collect());
            }
            if slept >= timeout {
                warn!(
                    "Job {} still {} after {:?}",
                    self.job_id, self.overall_status, timeout
                );
                return Err(SuperstaqError::Timeout {
                    job_id: self.job_id.to_string(),
                    last_status: self.overall_status.clone(),
                });
            }
            let nap = poll_interval.min(timeout - slept);
            sleep(nap).await;
            slept += nap;
        }
    }

    /// Fail if the job ended as `Error` or `Canceled`.
    pub fn check_if_stopped(&self) -> SuperstaqResult<()> {
        if !self.overall_status.is_unsuccessful() {
            return Ok(());
        }
        let payload = self
            .raw_sub_job_statuses()
            .into_iter()
            .find(|p| p.status == self.overall_status)
            .cloned()
            .map(Box::new);
        Err(SuperstaqError::UnsuccessfulJob {
            job_id: self.job_id.to_string(),
            status: self.overall_status.clone(),
            payload,
        })
    }

    /// Stored sub-job payloads in composite id order.
    ///
    /// Sub-jobs that have never been fetched are skipped.
    pub fn raw_sub_job_statuses(&self) -> Vec<&JobPayload> {
        self.job_id
            .sub_job_ids()
            .iter()
            .filter_map(|id| self.job_info.get(id))
            .collect()
    }

    /// Wait for the job and assemble its results.
    ///
    /// `timeout` defaults to the client's maximum retry duration.
    pub async fn result(
        &mut self,
        timeout: Option<Duration>,
        poll_interval: Duration,
    ) -> SuperstaqResult<JobResult> {
        let timeout = timeout.unwrap_or_else(|| self.backend.client().max_retry_duration());
        let payloads = self.wait_until_terminal(timeout, poll_interval).await?;
        self.check_if_stopped()?;
        Ok(JobResult::from_payloads(
            self.backend.configuration(),
            &self.job_id,
            &payloads,
        ))
    }

    /// Jobs cannot be resubmitted; submit through the backend instead.
    pub fn submit(&self) -> SuperstaqResult<()> {
        Err(SuperstaqError::NotImplemented(
            "Submit through SuperstaqBackend, not through SuperstaqJob".into(),
        ))
    }
}

impl<C> PartialEq for SuperstaqJob<C> {
    fn eq(&self, other: &Self) -> bool {
        self.job_id == other.job_id && self.backend.configuration() == other.backend.configuration()
    }
}

impl<C> fmt::Debug for SuperstaqJob<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SuperstaqJob")
            .field("job_id", &self.job_id.to_string())
            .field("backend", &self.backend.name())
            .field("overall_status", &self.overall_status)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ClientConfig, CreateJobRequest, CreateJobResponse};
    use crate::compile::{CompileEndpoint, CompileRequest};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    fn mock_response(status: &str) -> JobPayload {
        serde_json::from_value(serde_json::json!({
            "status": status,
            "samples": {"10": 100},
            "shots": 100,
        }))
        .unwrap()
    }

    /// Replays scripted payloads per sub-job; the last one repeats.
    #[derive(Default)]
    struct ScriptedClient {
        scripts: Mutex<FxHashMap<String, VecDeque<JobPayload>>>,
        fallback: Mutex<Option<JobPayload>>,
        calls: Mutex<FxHashMap<String, usize>>,
    }

    impl ScriptedClient {
        fn always(status: &str) -> Self {
            let client = Self::default();
            *client.fallback.lock().unwrap() = Some(mock_response(status));
            client
        }

        fn script(self, id: &str, statuses: &[&str]) -> Self {
            self.scripts
                .lock()
                .unwrap()
                .insert(id.into(), statuses.iter().map(|s| mock_response(s)).collect());
            self
        }

        fn set_fallback(&self, status: &str) {
            *self.fallback.lock().unwrap() = Some(mock_response(status));
        }

        fn calls(&self, id: &str) -> usize {
            self.calls.lock().unwrap().get(id).copied().unwrap_or(0)
        }
    }

    #[async_trait]
    impl JobClient for ScriptedClient {
        async fn get_job(&self, job_id: &str) -> SuperstaqResult<JobPayload> {
            *self.calls.lock().unwrap().entry(job_id.into()).or_default() += 1;
            let mut scripts = self.scripts.lock().unwrap();
            if let Some(queue) = scripts.get_mut(job_id) {
                if queue.len() > 1 {
                    return Ok(queue.pop_front().unwrap());
                }
                if let Some(last) = queue.front() {
                    return Ok(last.clone());
                }
            }
            self.fallback
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| SuperstaqError::NotFound(job_id.into()))
        }

        async fn create_job(&self, _: &CreateJobRequest) -> SuperstaqResult<CreateJobResponse> {
            unreachable!("not used by job tests")
        }

        async fn compile(
            &self,
            _: CompileEndpoint,
            _: &CompileRequest,
        ) -> SuperstaqResult<serde_json::Value> {
            unreachable!("not used by job tests")
        }

        async fn target_info(&self, _: &str) -> SuperstaqResult<serde_json::Value> {
            unreachable!("not used by job tests")
        }
    }

    fn job(client: &Arc<ScriptedClient>, id: &str) -> SuperstaqJob<ScriptedClient> {
        let backend = SuperstaqBackend::new(Arc::clone(client), "ss_example_qpu").unwrap();
        SuperstaqJob::from_id_str(backend, id).unwrap()
    }

    #[test]
    fn test_composite_id_parse() {
        let id: CompositeJobId = "123abc,456def".parse().unwrap();
        assert_eq!(id.sub_job_ids(), ["123abc", "456def"]);
        assert_eq!(id.len(), 2);
        assert_eq!(id.to_string(), "123abc,456def");

        let single: CompositeJobId = "123abc".parse().unwrap();
        assert_eq!(single.len(), 1);
    }

    #[test]
    fn test_composite_id_rejects_malformed() {
        for bad in ["", "a,,b", "a,", "a,b,a"] {
            let err = bad.parse::<CompositeJobId>().unwrap_err();
            assert!(matches!(err, SuperstaqError::InvalidJobId(_)), "{bad:?}");
        }
        assert!(CompositeJobId::from_job_ids(Vec::<String>::new()).is_err());
    }

    #[test]
    fn test_payload_keeps_extra_fields() {
        let payload: JobPayload = serde_json::from_value(serde_json::json!({
            "status": "Error",
            "shots": 10,
            "status_message": "device offline",
        }))
        .unwrap();
        assert_eq!(payload.status, JobStatus::Error);
        assert!(payload.samples.is_none());
        assert_eq!(payload.data["status_message"], "device offline");
    }

    #[tokio::test]
    async fn test_wait_for_results() {
        let client = Arc::new(ScriptedClient::always("Done"));

        let mut single = job(&client, "123abc");
        let payloads = single
            .wait_until_terminal(ClientConfig::DEFAULT_MAX_RETRY, DEFAULT_POLL_INTERVAL)
            .await
            .unwrap();
        assert_eq!(payloads, vec![mock_response("Done")]);

        let mut batch = job(&client, "123abc,456def");
        let payloads = batch
            .wait_until_terminal(ClientConfig::DEFAULT_MAX_RETRY, DEFAULT_POLL_INTERVAL)
            .await
            .unwrap();
        assert_eq!(payloads, vec![mock_response("Done"), mock_response("Done")]);
        assert_eq!(batch.overall_status(), &JobStatus::Done);
    }

    #[tokio::test]
    async fn test_wait_polls_until_done() {
        let client =
            Arc::new(ScriptedClient::default().script("123abc", &["Queued", "Queued", "Done"]));
        let mut job = job(&client, "123abc");

        let payloads = job
            .wait_until_terminal(ClientConfig::DEFAULT_MAX_RETRY, Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(payloads, vec![mock_response("Done")]);
        assert_eq!(client.calls("123abc"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout() {
        let client = Arc::new(ScriptedClient::always("Running"));
        let mut job = job(&client, "123abc");

        let err = job
            .wait_until_terminal(Duration::from_secs(10), Duration::from_secs(3))
            .await
            .unwrap_err();
        match err {
            SuperstaqError::Timeout {
                job_id,
                last_status,
            } => {
                assert_eq!(job_id, "123abc");
                assert_eq!(last_status, JobStatus::Running);
            }
            other => panic!("unexpected error: {other}"),
        }
        // Sleeps of 3 + 3 + 3 + 1 seconds, with a refresh before each and one after.
        assert_eq!(client.calls("123abc"), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_timeout_refreshes_once() {
        let client = Arc::new(ScriptedClient::always("Queued"));
        let mut job = job(&client, "a,b");
        let err = job
            .wait_until_terminal(Duration::ZERO, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, SuperstaqError::Timeout { .. }));
        assert_eq!(client.calls("a"), 1);
        assert_eq!(client.calls("b"), 1);
    }

    #[tokio::test]
    async fn test_refresh_job() {
        let client = Arc::new(ScriptedClient::always("Queued"));
        let mut job = job(&client, "123abc,456abc,789abc");

        job.refresh().await.unwrap();
        assert_eq!(job.overall_status(), &JobStatus::Queued);

        client.set_fallback("Running");
        job.refresh().await.unwrap();
        assert_eq!(job.overall_status(), &JobStatus::Running);

        client.set_fallback("Done");
        job.refresh().await.unwrap();
        assert_eq!(job.overall_status(), &JobStatus::Done);

        for status in ["Error", "Canceled"] {
            let client = Arc::new(ScriptedClient::always(status));
            let mut job = self::job(&client, "321cba");
            job.refresh().await.unwrap();
            assert_eq!(job.overall_status().as_str(), status);
        }
    }

    #[tokio::test]
    async fn test_refresh_skips_terminal_sub_jobs() {
        let client = Arc::new(
            ScriptedClient::default()
                .script("a", &["Done"])
                .script("b", &["Queued", "Running", "Done"])
                .script("c", &["Canceled"]),
        );
        let mut job = job(&client, "a,b,c");

        job.refresh().await.unwrap();
        assert_eq!(job.overall_status(), &JobStatus::Canceled);
        job.refresh().await.unwrap();
        job.refresh().await.unwrap();

        assert_eq!(client.calls("a"), 1);
        assert_eq!(client.calls("b"), 3);
        assert_eq!(client.calls("c"), 1);
        assert_eq!(job.overall_status(), &JobStatus::Canceled);
    }

    #[tokio::test]
    async fn test_status_does_not_refresh_terminal_job() {
        let client = Arc::new(ScriptedClient::always("Done"));
        let mut job = job(&client, "123done");

        assert_eq!(job.status().await.unwrap(), JobStatus::Done);
        assert_eq!(job.status().await.unwrap(), JobStatus::Done);
        assert_eq!(client.calls("123done"), 1);
    }

    #[tokio::test]
    async fn test_refresh_propagates_client_errors() {
        let client = Arc::new(ScriptedClient::default());
        let mut job = job(&client, "missing");

        let err = job.refresh().await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(job.overall_status(), &JobStatus::Submitted);
        assert!(job.raw_sub_job_statuses().is_empty());
    }

    #[tokio::test]
    async fn test_check_if_stopped() {
        for status in ["Canceled", "Error"] {
            let client = Arc::new(ScriptedClient::always(status));
            let mut job = job(&client, "123abc");
            job.refresh().await.unwrap();

            let err = job.check_if_stopped().unwrap_err();
            assert!(err.to_string().contains(status));
            match err {
                SuperstaqError::UnsuccessfulJob { payload, .. } => {
                    assert_eq!(payload.unwrap().status.as_str(), status);
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        let client = Arc::new(ScriptedClient::always("Done"));
        let mut job = job(&client, "123abc");
        job.refresh().await.unwrap();
        assert!(job.check_if_stopped().is_ok());
    }

    #[tokio::test]
    async fn test_result_rejects_failed_job() {
        let client = Arc::new(
            ScriptedClient::default()
                .script("a", &["Done"])
                .script("b", &["Error"]),
        );
        let mut job = job(&client, "a,b");
        let err = job.result(None, Duration::ZERO).await.unwrap_err();
        assert!(matches!(
            err,
            SuperstaqError::UnsuccessfulJob {
                status: JobStatus::Error,
                ..
            }
        ));
    }

    #[test]
    fn test_submit() {
        let client = Arc::new(ScriptedClient::default());
        let job = job(&client, "12345");
        let err = job.submit().unwrap_err();
        assert!(matches!(err, SuperstaqError::NotImplemented(_)));
        assert!(err.to_string().contains("Submit through SuperstaqBackend"));
    }

    #[test]
    fn test_eq() {
        let client = Arc::new(ScriptedClient::default());
        let a = job(&client, "12345");
        assert_eq!(a, job(&client, "12345"));
        assert_ne!(a, job(&client, "123456"));

        let other_backend = SuperstaqBackend::new(Arc::clone(&client), "ibmq_qasm_simulator")
            .unwrap();
        assert_ne!(a, SuperstaqJob::from_id_str(other_backend, "12345").unwrap());
    }
}
