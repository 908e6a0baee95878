//! # llama-runtime
//!
//! Runtime backend selection and execution support for the llama command
//! server. Decides which compute device a model lands on and at what numeric
//! precision, and provides telemetry hooks (TTFT, tok/s) for generation runs.

pub mod backend;
pub mod telemetry;

pub use backend::{Backend, BackendError, BackendSelector, Precision};
pub use telemetry::{
    InferenceMetrics, InferenceTimer, RecordingTelemetry, TelemetryHook, TracingTelemetry,
};
