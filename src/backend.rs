//! Superstaq backends: submission, compilation and target information.
//!
//! A [`SuperstaqBackend`] pairs a validated [`Target`] with a shared client.
//! Its lifecycle mirrors the service:
//!
//! ```text
//!   new(target) ──→ compile() ──→ run() ──→ SuperstaqJob ──→ result()
//!   (validates)     (per family)   (POST /jobs)
//! ```
//!
//! ## Compile dispatch
//!
//! | Family | Prefix | Endpoint | Extra output |
//! |--------|--------|----------|--------------|
//! | `Aqt` | `aqt_` | `/aqt_compile` | pulse lists, ECA count |
//! | `Ibmq` | `ibmq_` | `/compile` | qubit mappings, pulses |
//! | `Qscout` | `sandia_` | `/qscout_compile` | Jaqal programs |
//! | `Cq` | `cq_` | `/compile` | none |
//! | `Generic` | other | `/compile` | qubit mappings |

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::info;

use crate::circuit::SerializedCircuits;
use crate::client::{CreateJobRequest, JobClient};
use crate::compile::{
    AqtCompileOptions, CompileOptions, CompileRequest, CompilerOutput, QscoutCompileOptions,
};
use crate::configuration::{BackendConfiguration, RunOptions};
use crate::error::{SuperstaqError, SuperstaqResult};
use crate::job::{CompositeJobId, SuperstaqJob};
use crate::target::{DeviceType, Target, TargetFamily};

/// A Superstaq target reachable through a client.
pub struct SuperstaqBackend<C> {
    client: Arc<C>,
    target: Target,
    configuration: BackendConfiguration,
    default_options: RunOptions,
}

impl<C> Clone for SuperstaqBackend<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            target: self.target.clone(),
            configuration: self.configuration.clone(),
            default_options: self.default_options.clone(),
        }
    }
}

impl<C> PartialEq for SuperstaqBackend<C> {
    fn eq(&self, other: &Self) -> bool {
        self.configuration == other.configuration
    }
}

impl<C> std::fmt::Debug for SuperstaqBackend<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuperstaqBackend")
            .field("target", &self.target.name())
            .field("default_options", &self.default_options)
            .finish_non_exhaustive()
    }
}

impl<C> SuperstaqBackend<C> {
    /// Target name.
    pub fn name(&self) -> &str {
        self.target.name()
    }

    /// Validated target.
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Static backend description.
    pub fn configuration(&self) -> &BackendConfiguration {
        &self.configuration
    }

    /// Defaults applied by [`run`](Self::run).
    pub fn default_options(&self) -> &RunOptions {
        &self.default_options
    }

    /// Shared client.
    pub fn client(&self) -> &Arc<C> {
        &self.client
    }
}

impl<C: JobClient> SuperstaqBackend<C> {
    /// Create a backend for `target`, validating the name.
    pub fn new(client: Arc<C>, target: &str) -> SuperstaqResult<Self> {
        let target = Target::parse(target)?;
        let configuration = BackendConfiguration::for_target(target.name())
            .with_simulator(target.device_type() == DeviceType::Simulator);
        Ok(Self {
            client,
            target,
            configuration,
            default_options: RunOptions::default(),
        })
    }

    /// Replace the submission defaults.
    pub fn with_default_options(mut self, options: RunOptions) -> Self {
        self.default_options = options;
        self
    }

    /// Replace the static description.
    pub fn with_configuration(mut self, configuration: BackendConfiguration) -> Self {
        self.configuration = configuration;
        self
    }

    /// Submit circuits with `shots` and the backend's default method and options.
    pub async fn run(
        &self,
        circuits: &SerializedCircuits,
        shots: u32,
    ) -> SuperstaqResult<SuperstaqJob<C>> {
        let options = RunOptions {
            shots,
            ..self.default_options.clone()
        };
        self.run_with_options(circuits, &options).await
    }

    /// Submit circuits with explicit options.
    ///
    /// The service creates one job per circuit; the returned job addresses
    /// all of them through one composite id.
    pub async fn run_with_options(
        &self,
        circuits: &SerializedCircuits,
        options: &RunOptions,
    ) -> SuperstaqResult<SuperstaqJob<C>> {
        if circuits.is_empty() {
            return Err(SuperstaqError::InvalidInput("no circuits to run".into()));
        }
        if options.shots == 0 {
            return Err(SuperstaqError::InvalidInput(
                "shots must be a positive integer".into(),
            ));
        }

        let request = CreateJobRequest {
            circuits: circuits.clone(),
            repetitions: options.shots,
            target: self.name().to_string(),
            method: options.method.clone(),
            options: if options.options.is_empty() {
                None
            } else {
                Some(serde_json::to_string(&options.options)?)
            },
        };

        let response = self.client.create_job(&request).await?;
        let job_id = CompositeJobId::from_job_ids(response.job_ids)?;
        info!(
            "Submitted {} job(s) to {}: {}",
            job_id.len(),
            self.name(),
            job_id
        );
        Ok(SuperstaqJob::new(self.clone(), job_id))
    }

    /// Compile with the family's default options plus `extra`.
    pub async fn compile(
        &self,
        circuits: &SerializedCircuits,
        extra: Map<String, Value>,
    ) -> SuperstaqResult<CompilerOutput> {
        let options = match CompileOptions::default_for(self.target.family()) {
            CompileOptions::Aqt(aqt) => CompileOptions::Aqt(AqtCompileOptions { extra, ..aqt }),
            CompileOptions::Qscout(qscout) => {
                CompileOptions::Qscout(QscoutCompileOptions { extra, ..qscout })
            }
            CompileOptions::Plain(_) => CompileOptions::Plain(extra),
        };
        self.compile_with_options(circuits, options).await
    }

    /// Compile with explicit family options.
    pub async fn compile_with_options(
        &self,
        circuits: &SerializedCircuits,
        options: CompileOptions,
    ) -> SuperstaqResult<CompilerOutput> {
        let family = self.target.family();
        options.check_family(family)?;

        let request = CompileRequest::new(circuits.clone(), self.name(), &options.to_map())?;
        let response = self.client.compile(family.endpoint(), &request).await?;
        CompilerOutput::from_response(family, circuits.format, &options, response)
    }

    /// Compile for the Advanced Quantum Testbed.
    pub async fn aqt_compile(
        &self,
        circuits: &SerializedCircuits,
        options: AqtCompileOptions,
    ) -> SuperstaqResult<CompilerOutput> {
        self.target.require_family(TargetFamily::Aqt)?;
        self.compile_with_options(circuits, CompileOptions::Aqt(options))
            .await
    }

    /// Compile for IBM Quantum devices.
    pub async fn ibmq_compile(
        &self,
        circuits: &SerializedCircuits,
        options: Map<String, Value>,
    ) -> SuperstaqResult<CompilerOutput> {
        self.target.require_family(TargetFamily::Ibmq)?;
        self.compile_with_options(circuits, CompileOptions::Plain(options))
            .await
    }

    /// Compile for the QSCOUT trapped-ion testbed.
    pub async fn qscout_compile(
        &self,
        circuits: &SerializedCircuits,
        options: QscoutCompileOptions,
    ) -> SuperstaqResult<CompilerOutput> {
        self.target.require_family(TargetFamily::Qscout)?;
        self.compile_with_options(circuits, CompileOptions::Qscout(options))
            .await
    }

    /// Compile for CQ devices.
    pub async fn cq_compile(
        &self,
        circuits: &SerializedCircuits,
        options: Map<String, Value>,
    ) -> SuperstaqResult<CompilerOutput> {
        self.target.require_family(TargetFamily::Cq)?;
        self.compile_with_options(circuits, CompileOptions::Plain(options))
            .await
    }

    /// Target information reported by the service.
    pub async fn target_info(&self) -> SuperstaqResult<Map<String, Value>> {
        let mut response = self.client.target_info(self.name()).await?;
        match response.get_mut("target_info").map(Value::take) {
            Some(Value::Object(info)) => Ok(info),
            _ => Err(SuperstaqError::InvalidInput(format!(
                "target info for {} is missing from the response",
                self.name()
            ))),
        }
    }
}
