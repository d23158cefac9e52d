//! Target name validation and compile-family dispatch.
//!
//! Target names have the form `<provider>_<device>_<type>`, e.g.
//! `ibmq_qasm_simulator` or `aqt_keysight_qpu`. The provider prefix selects
//! the [`TargetFamily`], which decides how compile requests are shaped and
//! how their responses are read.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::compile::CompileEndpoint;
use crate::error::{SuperstaqError, SuperstaqResult};

/// Provider prefixes the service accepts.
pub const PROVIDERS: [&str; 12] = [
    "aqt", "aws", "cq", "hqs", "ibmq", "ionq", "oxford", "quera", "rigetti", "sandia", "ss",
    "toshiba",
];

/// Whether a target is hardware or a simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    /// Physical device.
    Qpu,
    /// Simulator.
    Simulator,
}

/// Compile family selected by the provider prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetFamily {
    /// Advanced Quantum Testbed (`aqt_`).
    Aqt,
    /// IBM Quantum (`ibmq_`).
    Ibmq,
    /// QSCOUT trapped-ion testbed (`sandia_`).
    Qscout,
    /// ColdQuanta (`cq_`).
    Cq,
    /// Any other provider.
    Generic,
}

impl TargetFamily {
    fn from_provider(provider: &str) -> Self {
        match provider {
            "aqt" => TargetFamily::Aqt,
            "ibmq" => TargetFamily::Ibmq,
            "sandia" => TargetFamily::Qscout,
            "cq" => TargetFamily::Cq,
            _ => TargetFamily::Generic,
        }
    }

    /// Endpoint compile requests for this family go to.
    pub fn endpoint(self) -> CompileEndpoint {
        match self {
            TargetFamily::Aqt => CompileEndpoint::AqtCompile,
            TargetFamily::Qscout => CompileEndpoint::QscoutCompile,
            TargetFamily::Ibmq | TargetFamily::Cq | TargetFamily::Generic => {
                CompileEndpoint::Compile
            }
        }
    }

    /// Human-readable family name used in error messages.
    pub fn display_name(self) -> &'static str {
        match self {
            TargetFamily::Aqt => "AQT",
            TargetFamily::Ibmq => "IBMQ",
            TargetFamily::Qscout => "Sandia",
            TargetFamily::Cq => "CQ",
            TargetFamily::Generic => "Superstaq",
        }
    }
}

/// A validated target name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target {
    name: String,
    provider_len: usize,
    device_type: DeviceType,
    family: TargetFamily,
}

impl Target {
    /// Validate `name` and classify it.
    pub fn parse(name: &str) -> SuperstaqResult<Self> {
        let invalid_format = || {
            SuperstaqError::InvalidTarget(format!(
                "{name} does not have a valid string format. Valid target strings should be \
                 in the form: <provider>_<device>_<type>, e.g. ibmq_lagos_qpu."
            ))
        };

        let (provider, rest) = name.split_once('_').ok_or_else(invalid_format)?;
        let (device, kind) = rest.rsplit_once('_').ok_or_else(invalid_format)?;
        let well_formed = |s: &str| {
            !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || "-._".contains(c))
        };
        if !well_formed(provider) || provider.contains('.') || !well_formed(device) {
            return Err(invalid_format());
        }

        if !PROVIDERS.contains(&provider) {
            return Err(SuperstaqError::InvalidTarget(format!(
                "{name} does not have a valid target prefix. Valid prefixes are: {}.",
                PROVIDERS.join(", ")
            )));
        }

        let device_type = match kind {
            "qpu" => DeviceType::Qpu,
            "simulator" => DeviceType::Simulator,
            _ => {
                return Err(SuperstaqError::InvalidTarget(format!(
                    "{name} does not have a valid target device type. Valid device types \
                     are: qpu, simulator."
                )));
            }
        };

        Ok(Self {
            name: name.to_string(),
            provider_len: provider.len(),
            device_type,
            family: TargetFamily::from_provider(provider),
        })
    }

    /// Full target name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Provider prefix (`ibmq`, `aqt`, ...).
    pub fn provider(&self) -> &str {
        &self.name[..self.provider_len]
    }

    /// Hardware or simulator.
    pub fn device_type(&self) -> DeviceType {
        self.device_type
    }

    /// Compile family.
    pub fn family(&self) -> TargetFamily {
        self.family
    }

    /// Fail unless this target belongs to `family`.
    pub fn require_family(&self, family: TargetFamily) -> SuperstaqResult<()> {
        if self.family == family {
            Ok(())
        } else {
            Err(SuperstaqError::InvalidTarget(format!(
                "{} is not a valid {} target.",
                self.name,
                family.display_name()
            )))
        }
    }
}

impl FromStr for Target {
    type Err = SuperstaqError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_targets() {
        let target = Target::parse("ibmq_qasm_simulator").unwrap();
        assert_eq!(target.provider(), "ibmq");
        assert_eq!(target.device_type(), DeviceType::Simulator);
        assert_eq!(target.family(), TargetFamily::Ibmq);

        let target: Target = "sandia_qscout_qpu".parse().unwrap();
        assert_eq!(target.family(), TargetFamily::Qscout);
        assert_eq!(target.family().endpoint(), CompileEndpoint::QscoutCompile);

        let target = Target::parse("aws_sv1_simulator").unwrap();
        assert_eq!(target.family(), TargetFamily::Generic);

        // Device names may themselves contain underscores.
        let target = Target::parse("ss_example_big_qpu").unwrap();
        assert_eq!(target.provider(), "ss");
        assert_eq!(target.device_type(), DeviceType::Qpu);
    }

    #[test]
    fn test_parse_rejects_bad_format() {
        for name in ["", "ibmq", "ibmq_qpu", "ibmq__qpu", "_lagos_qpu", "ibmq_la gos_qpu"] {
            let err = Target::parse(name).unwrap_err();
            assert!(
                err.to_string().contains("valid string format"),
                "{name}: {err}"
            );
        }
    }

    #[test]
    fn test_parse_rejects_unknown_provider_and_type() {
        let err = Target::parse("foo_bar_qpu").unwrap_err();
        assert!(err.to_string().contains("valid target prefix"));

        let err = Target::parse("ibmq_lagos_emulator").unwrap_err();
        assert!(err.to_string().contains("valid target device type"));
    }

    #[test]
    fn test_require_family() {
        let target = Target::parse("cq_hilbert_qpu").unwrap();
        assert!(target.require_family(TargetFamily::Cq).is_ok());

        let err = target.require_family(TargetFamily::Aqt).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid target: cq_hilbert_qpu is not a valid AQT target."
        );
    }
}
