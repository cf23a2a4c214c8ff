//! Helpers for testing adapter implementations and code built on them.

pub mod conformance;
pub mod mock;

pub use conformance::{
    ensure_conformant, verify_adapter_protocol, verify_adapter_runtime,
    verify_adapter_signature, verify_backend_runtime, verify_positions_value,
    verify_signature_manifest, AdapterSignature, ParameterSignature, ProtocolConformanceError,
    RuntimeProbe,
};
pub use mock::{create_test_adapter, MockEphemerisAdapter, RecordedCall};
