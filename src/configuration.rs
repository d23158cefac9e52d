//! Backend descriptors and run defaults.
//!
//! [`BackendConfiguration`] is the static description a backend is created
//! with; the service does not report hardware details up front, so most
//! fields start out unknown. [`RunOptions`] holds the defaults applied to
//! every submission from one backend.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::client::API_VERSION;

/// Static description of a Superstaq backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfiguration {
    /// Target name.
    pub backend_name: String,
    /// Backend version string.
    pub backend_version: String,
    /// Number of qubits, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_qubits: Option<u32>,
    /// Basis gates, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basis_gates: Option<Vec<String>>,
    /// Gate descriptions.
    #[serde(default)]
    pub gates: Vec<Value>,
    /// Whether the backend runs locally.
    pub local: bool,
    /// Whether the backend is a simulator.
    pub simulator: bool,
    /// Whether classically conditioned gates are supported.
    pub conditional: bool,
    /// Whether pulse-level programs are accepted.
    pub open_pulse: bool,
    /// Whether per-shot memory is returned.
    pub memory: bool,
    /// Maximum shots per job, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_shots: Option<u32>,
    /// Qubit coupling map, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coupling_map: Option<Vec<(u32, u32)>>,
}

impl BackendConfiguration {
    /// Configuration for `target` with every hardware field unknown.
    pub fn for_target(target: impl Into<String>) -> Self {
        Self {
            backend_name: target.into(),
            backend_version: API_VERSION.to_string(),
            n_qubits: None,
            basis_gates: None,
            gates: Vec::new(),
            local: false,
            simulator: false,
            conditional: false,
            open_pulse: false,
            memory: false,
            max_shots: None,
            coupling_map: None,
        }
    }

    /// Mark the backend as a simulator.
    pub fn with_simulator(mut self, simulator: bool) -> Self {
        self.simulator = simulator;
        self
    }

    /// Set the qubit count.
    pub fn with_num_qubits(mut self, n_qubits: u32) -> Self {
        self.n_qubits = Some(n_qubits);
        self
    }
}

/// Defaults applied to each submission.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    /// Shots per circuit.
    pub shots: u32,
    /// Execution method (`dry-run`, `statevector`, ...).
    pub method: Option<String>,
    /// Further options, sent JSON-encoded.
    pub options: Map<String, Value>,
}

impl RunOptions {
    /// Default shot count.
    pub const DEFAULT_SHOTS: u32 = 1000;

    /// Defaults with a different shot count.
    pub fn with_shots(shots: u32) -> Self {
        Self {
            shots,
            ..Self::default()
        }
    }

    /// Set the execution method.
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Add a pass-through option.
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            shots: Self::DEFAULT_SHOTS,
            method: None,
            options: Map::new(),
        }
    }
}
