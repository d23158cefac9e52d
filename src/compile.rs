//! Compile requests and compiler output.
//!
//! Every family posts the same request shape (circuits, target, JSON-encoded
//! options) but to its own endpoint, with its own options, and gets back its
//! own extras: IBMQ returns qubit mappings and pulse schedules, AQT returns
//! pulse lists, QSCOUT returns Jaqal programs.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::circuit::{CircuitFormat, SerializedCircuits};
use crate::error::{SuperstaqError, SuperstaqResult};
use crate::target::TargetFamily;

/// Service endpoint a compile request is posted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompileEndpoint {
    /// `POST /compile`
    Compile,
    /// `POST /aqt_compile`
    AqtCompile,
    /// `POST /qscout_compile`
    QscoutCompile,
}

impl CompileEndpoint {
    /// Path relative to the versioned base URL.
    pub fn path(self) -> &'static str {
        match self {
            CompileEndpoint::Compile => "/compile",
            CompileEndpoint::AqtCompile => "/aqt_compile",
            CompileEndpoint::QscoutCompile => "/qscout_compile",
        }
    }
}

/// Body of a compile request.
#[derive(Debug, Clone, Serialize)]
pub struct CompileRequest {
    /// Circuits to compile.
    #[serde(flatten)]
    pub circuits: SerializedCircuits,
    /// Target name.
    pub target: String,
    /// JSON-encoded option object.
    pub options: String,
}

impl CompileRequest {
    /// Build a request, encoding `options` as a JSON string.
    pub fn new(
        circuits: SerializedCircuits,
        target: impl Into<String>,
        options: &Map<String, Value>,
    ) -> SuperstaqResult<Self> {
        Ok(Self {
            circuits,
            target: target.into(),
            options: serde_json::to_string(options)?,
        })
    }
}

/// Options for AQT compilation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AqtCompileOptions {
    /// Number of logically equivalent random circuits to generate per input
    /// circuit (Equivalent Circuit Averaging).
    pub num_equivalent_circuits: Option<u32>,
    /// Seed for approximate synthesis and ECA.
    pub random_seed: Option<u64>,
    /// Tolerance for approximate gate synthesis.
    pub atol: Option<f64>,
    /// Calibration name to gate definition overrides; `null` disables a
    /// calibration.
    pub gate_defs: Option<Map<String, Value>>,
    /// Any further options, passed through.
    pub extra: Map<String, Value>,
}

impl AqtCompileOptions {
    fn to_map(&self) -> Map<String, Value> {
        let mut options = self.extra.clone();
        if let Some(n) = self.num_equivalent_circuits {
            options.insert("num_eca_circuits".into(), n.into());
        }
        if let Some(seed) = self.random_seed {
            options.insert("random_seed".into(), seed.into());
        }
        if let Some(atol) = self.atol {
            options.insert("atol".into(), atol.into());
        }
        if let Some(gate_defs) = &self.gate_defs {
            options.insert("gate_defs".into(), Value::Object(gate_defs.clone()));
        }
        options
    }
}

/// Entangling basis for QSCOUT compilation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntanglingGate {
    /// Mølmer–Sørensen XX interaction.
    #[default]
    Xx,
    /// ZZ interaction.
    Zz,
}

impl EntanglingGate {
    /// Label sent to the service.
    pub fn as_str(self) -> &'static str {
        match self {
            EntanglingGate::Xx => "xx",
            EntanglingGate::Zz => "zz",
        }
    }
}

impl std::str::FromStr for EntanglingGate {
    type Err = SuperstaqError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "xx" => Ok(EntanglingGate::Xx),
            "zz" => Ok(EntanglingGate::Zz),
            _ => Err(SuperstaqError::InvalidInput(
                "base_entangling_gate must be either 'xx' or 'zz'".into(),
            )),
        }
    }
}

/// Options for QSCOUT compilation.
#[derive(Debug, Clone, PartialEq)]
pub struct QscoutCompileOptions {
    /// Use mirror swapping to reduce two-qubit gate overhead.
    pub mirror_swaps: bool,
    /// Base entangling gate.
    pub base_entangling_gate: EntanglingGate,
    /// Any further options, passed through.
    pub extra: Map<String, Value>,
}

impl Default for QscoutCompileOptions {
    fn default() -> Self {
        Self {
            mirror_swaps: true,
            base_entangling_gate: EntanglingGate::Xx,
            extra: Map::new(),
        }
    }
}

impl QscoutCompileOptions {
    fn to_map(&self) -> Map<String, Value> {
        let mut options = self.extra.clone();
        options.insert("mirror_swaps".into(), self.mirror_swaps.into());
        options.insert(
            "base_entangling_gate".into(),
            self.base_entangling_gate.as_str().into(),
        );
        options
    }
}

/// Family-specific compile options.
#[derive(Debug, Clone, PartialEq)]
pub enum CompileOptions {
    /// AQT options.
    Aqt(AqtCompileOptions),
    /// QSCOUT options.
    Qscout(QscoutCompileOptions),
    /// Pass-through options for IBMQ, CQ and generic targets.
    Plain(Map<String, Value>),
}

impl CompileOptions {
    /// Default options for `family`.
    pub fn default_for(family: TargetFamily) -> Self {
        match family {
            TargetFamily::Aqt => CompileOptions::Aqt(AqtCompileOptions::default()),
            TargetFamily::Qscout => CompileOptions::Qscout(QscoutCompileOptions::default()),
            TargetFamily::Ibmq | TargetFamily::Cq | TargetFamily::Generic => {
                CompileOptions::Plain(Map::new())
            }
        }
    }

    /// Options as the JSON object sent to the service.
    pub fn to_map(&self) -> Map<String, Value> {
        match self {
            CompileOptions::Aqt(options) => options.to_map(),
            CompileOptions::Qscout(options) => options.to_map(),
            CompileOptions::Plain(options) => options.clone(),
        }
    }

    /// Check the options are usable for `family`.
    pub fn check_family(&self, family: TargetFamily) -> SuperstaqResult<()> {
        let matches = match self {
            CompileOptions::Aqt(_) => family == TargetFamily::Aqt,
            CompileOptions::Qscout(_) => family == TargetFamily::Qscout,
            CompileOptions::Plain(_) => true,
        };
        if matches {
            Ok(())
        } else {
            Err(SuperstaqError::InvalidInput(format!(
                "compile options do not apply to {} targets",
                family.display_name()
            )))
        }
    }

    fn num_equivalent_circuits(&self) -> Option<u32> {
        match self {
            CompileOptions::Aqt(options) => options.num_equivalent_circuits,
            _ => None,
        }
    }
}

/// Result of compiling a circuit batch.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompilerOutput {
    /// Compiled circuits, serialized by the service in the request's format.
    pub circuits: Option<SerializedCircuits>,
    /// Final logical-to-physical qubit mapping per circuit (IBMQ, generic).
    pub final_logical_to_physicals: Vec<FxHashMap<usize, usize>>,
    /// Serialized pulse schedules (IBMQ).
    pub pulse_sequences: Option<String>,
    /// Pulse lists per circuit (AQT).
    pub pulse_lists: Option<Value>,
    /// Serialized sequencer state (AQT).
    pub sequencer_state: Option<String>,
    /// Jaqal programs, one per circuit (QSCOUT).
    pub jaqal_programs: Vec<String>,
    /// Number of equivalent circuits generated per input circuit (AQT ECA).
    pub num_equivalent_circuits: Option<u32>,
}

impl CompilerOutput {
    /// Read a compile response according to the target family.
    pub fn from_response(
        family: TargetFamily,
        format: CircuitFormat,
        options: &CompileOptions,
        response: Value,
    ) -> SuperstaqResult<Self> {
        let Value::Object(body) = response else {
            return Err(SuperstaqError::InvalidInput(
                "compile response is not a JSON object".into(),
            ));
        };

        let mut output = CompilerOutput {
            circuits: SerializedCircuits::from_response(format, &body),
            ..Self::default()
        };

        match family {
            TargetFamily::Aqt => {
                output.pulse_lists = body.get("pulse_lists_jp").cloned();
                output.sequencer_state = string_field(&body, "state_jp");
                output.num_equivalent_circuits = options.num_equivalent_circuits();
            }
            TargetFamily::Ibmq => {
                output.final_logical_to_physicals = logical_to_physicals(&body)?;
                output.pulse_sequences = string_field(&body, "pulses");
            }
            TargetFamily::Qscout => {
                output.jaqal_programs = match body.get("jaqal_programs") {
                    Some(programs) => serde_json::from_value(programs.clone())?,
                    None => Vec::new(),
                };
            }
            TargetFamily::Cq | TargetFamily::Generic => {
                output.final_logical_to_physicals = logical_to_physicals(&body)?;
            }
        }

        Ok(output)
    }
}

fn string_field(body: &Map<String, Value>, key: &str) -> Option<String> {
    body.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Mappings arrive as a JSON-encoded string of `[logical, physical]` pair
/// lists, one list per circuit.
fn logical_to_physicals(body: &Map<String, Value>) -> SuperstaqResult<Vec<FxHashMap<usize, usize>>> {
    let Some(raw) = body.get("final_logical_to_physicals") else {
        return Ok(Vec::new());
    };
    let pairs: Vec<Vec<(usize, usize)>> = match raw {
        Value::String(encoded) => serde_json::from_str(encoded)?,
        other => serde_json::from_value(other.clone())?,
    };
    Ok(pairs
        .into_iter()
        .map(|mapping| mapping.into_iter().collect())
        .collect())
}
