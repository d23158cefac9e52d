//! Opaque serialized circuit batches.
//!
//! Circuits are produced and consumed by the user's circuit framework; this
//! crate only carries the serialized text and remembers which framework it
//! came from, since the service keys the payload by framework.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Circuit framework that produced a serialized payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CircuitFormat {
    /// Qiskit `QuantumCircuit` serialization.
    Qiskit,
    /// Cirq JSON serialization.
    Cirq,
}

impl CircuitFormat {
    /// JSON key the service expects for this framework's circuits.
    pub fn request_key(self) -> &'static str {
        match self {
            CircuitFormat::Qiskit => "qiskit_circuits",
            CircuitFormat::Cirq => "cirq_circuits",
        }
    }
}

/// One or more circuits serialized into a single payload string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedCircuits {
    /// Framework that produced `payload`.
    pub format: CircuitFormat,
    /// Serialized circuit batch, passed through untouched.
    pub payload: String,
}

impl SerializedCircuits {
    /// Wrap a Qiskit-serialized payload.
    pub fn qiskit(payload: impl Into<String>) -> Self {
        Self {
            format: CircuitFormat::Qiskit,
            payload: payload.into(),
        }
    }

    /// Wrap a Cirq-serialized payload.
    pub fn cirq(payload: impl Into<String>) -> Self {
        Self {
            format: CircuitFormat::Cirq,
            payload: payload.into(),
        }
    }

    /// Check if there is nothing to send.
    pub fn is_empty(&self) -> bool {
        self.payload.trim().is_empty()
    }

    /// Pick the circuits of `format` out of a service response object.
    pub fn from_response(
        format: CircuitFormat,
        response: &serde_json::Map<String, serde_json::Value>,
    ) -> Option<Self> {
        response
            .get(format.request_key())
            .and_then(serde_json::Value::as_str)
            .map(|payload| Self {
                format,
                payload: payload.to_string(),
            })
    }
}

// Serialized as `{"<framework>_circuits": payload}` so it can be flattened
// into request bodies.
impl Serialize for SerializedCircuits {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.format.request_key(), &self.payload)?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serialize_keys_by_framework() {
        let qiskit = serde_json::to_value(SerializedCircuits::qiskit("abc")).unwrap();
        assert_eq!(qiskit, json!({"qiskit_circuits": "abc"}));

        let cirq = serde_json::to_value(SerializedCircuits::cirq("[]")).unwrap();
        assert_eq!(cirq, json!({"cirq_circuits": "[]"}));
    }

    #[test]
    fn test_from_response() {
        let response = json!({"cirq_circuits": "xyz", "other": 1});
        let map = response.as_object().unwrap();
        assert_eq!(
            SerializedCircuits::from_response(CircuitFormat::Cirq, map),
            Some(SerializedCircuits::cirq("xyz"))
        );
        assert_eq!(SerializedCircuits::from_response(CircuitFormat::Qiskit, map), None);
    }

    #[test]
    fn test_is_empty() {
        assert!(SerializedCircuits::qiskit("  ").is_empty());
        assert!(!SerializedCircuits::qiskit("x").is_empty());
    }
}
