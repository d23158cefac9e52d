//! Superstaq client: submit circuits, track composite jobs, read results.
//!
//! This crate talks to the Superstaq compilation and execution service on
//! behalf of a circuit framework (Qiskit or Cirq). Circuits travel as opaque
//! serialized payloads; the crate owns everything around them: target
//! validation, compile dispatch, job submission, status polling and result
//! assembly.
//!
//! # Overview
//!
//! - [`SuperstaqClient`] implements [`JobClient`] over HTTP
//! - [`SuperstaqBackend`] validates a [`Target`], compiles and submits
//! - [`SuperstaqJob`] tracks a [`CompositeJobId`] and merges sub-job
//!   [`JobStatus`]es into one overall status
//! - [`JobResult`] / [`Counts`] hold measurement results
//! - [`SuperstaqError`] covers transport, job-level, input and config errors
//!
//! # Composite jobs
//!
//! Submitting N circuits creates N server-side jobs whose ids come back
//! joined by commas. The job handle polls each sub-job and reports the worst
//! status among them:
//!
//! ```text
//!   Error > Canceled > Submitted/unknown > Queued > Running > Done
//! ```
//!
//! # Lifecycle
//!
//! ```ignore
//! use std::sync::Arc;
//! use superstaq_client::{ClientConfig, SerializedCircuits, SuperstaqBackend, SuperstaqClient};
//!
//! let client = Arc::new(SuperstaqClient::new(ClientConfig::from_env()?)?);
//! let backend = SuperstaqBackend::new(client, "ibmq_qasm_simulator")?;
//!
//! let mut job = backend.run(&SerializedCircuits::qiskit(payload), 100).await?;
//! let result = job.result(None, superstaq_client::DEFAULT_POLL_INTERVAL).await?;
//! println!("{:?}", result.get_counts(0));
//! ```

pub mod backend;
pub mod circuit;
pub mod client;
pub mod compile;
pub mod configuration;
pub mod error;
pub mod job;
pub mod result;
pub mod status;
pub mod target;

pub use backend::SuperstaqBackend;
pub use circuit::{CircuitFormat, SerializedCircuits};
pub use client::{ClientConfig, CreateJobRequest, CreateJobResponse, JobClient, SuperstaqClient};
pub use compile::{
    AqtCompileOptions, CompileEndpoint, CompileOptions, CompileRequest, CompilerOutput,
    EntanglingGate, QscoutCompileOptions,
};
pub use configuration::{BackendConfiguration, RunOptions};
pub use error::{SuperstaqError, SuperstaqResult};
pub use job::{CompositeJobId, DEFAULT_POLL_INTERVAL, JobPayload, SuperstaqJob};
pub use result::{Counts, ExperimentResult, JobResult};
pub use status::JobStatus;
pub use target::{DeviceType, Target, TargetFamily};
