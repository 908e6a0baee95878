//! Backend selection and precision planning.
//!
//! Provides:
//! - [`Backend`] enum gated by cargo features (`cuda`, `metal`; CPU is always present)
//! - [`Precision`]: the numeric type weights are loaded in
//! - [`BackendSelector`]: tries backends in preference order at load time

use std::fmt;

/// Compute backend for inference.
///
/// Accelerator variants are compile-time gated by the `cuda` and `metal`
/// cargo features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    Cpu,
    #[cfg(feature = "cuda")]
    Cuda,
    #[cfg(feature = "metal")]
    Metal,
}

impl Backend {
    /// All backends enabled at compile time, accelerators first.
    pub fn compiled() -> &'static [Backend] {
        &[
            #[cfg(feature = "cuda")]
            Backend::Cuda,
            #[cfg(feature = "metal")]
            Backend::Metal,
            Backend::Cpu,
        ]
    }

    pub fn is_accelerator(&self) -> bool {
        !matches!(self, Backend::Cpu)
    }

    /// Weight precision used on this backend.
    ///
    /// Accelerators run in half precision; CPU kernels stay in f32 because
    /// half-precision matmuls on CPU are slower than f32, not faster.
    pub fn precision(&self) -> Precision {
        if self.is_accelerator() {
            Precision::F16
        } else {
            Precision::F32
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Cpu => write!(f, "cpu"),
            #[cfg(feature = "cuda")]
            Backend::Cuda => write!(f, "cuda"),
            #[cfg(feature = "metal")]
            Backend::Metal => write!(f, "metal"),
        }
    }
}

/// Numeric precision for model weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Precision {
    F32,
    F16,
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Precision::F32 => write!(f, "f32"),
            Precision::F16 => write!(f, "f16"),
        }
    }
}

/// Errors from backend selection.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("no usable backend: {}", failures.iter().map(|(b, e)| format!("{b}: {e}")).collect::<Vec<_>>().join("; "))]
    NoUsableBackend { failures: Vec<(Backend, String)> },
}

/// Picks the inference backend at load time.
///
/// Use [`BackendSelector::auto`] to prefer accelerators and fall back to CPU,
/// or [`BackendSelector::cpu_only`] to pin the model to the CPU.
#[derive(Debug, Clone)]
pub struct BackendSelector {
    candidates: Vec<Backend>,
}

impl BackendSelector {
    /// All compiled backends, accelerators first.
    pub fn auto() -> Self {
        Self {
            candidates: Backend::compiled().to_vec(),
        }
    }

    pub fn cpu_only() -> Self {
        Self {
            candidates: vec![Backend::Cpu],
        }
    }

    /// Backends in the order they will be tried.
    pub fn candidates(&self) -> &[Backend] {
        &self.candidates
    }

    /// Try `open` on each candidate until one succeeds.
    ///
    /// `open` returns the backend-specific device handle, or a reason the
    /// backend is unusable on this host.
    pub fn select<T, F>(&self, mut open: F) -> Result<(Backend, T), BackendError>
    where
        F: FnMut(Backend) -> Result<T, String>,
    {
        let mut failures = Vec::new();
        for &backend in &self.candidates {
            match open(backend) {
                Ok(handle) => {
                    tracing::info!(%backend, precision = %backend.precision(), "selected compute backend");
                    return Ok((backend, handle));
                }
                Err(reason) => {
                    tracing::warn!(%backend, %reason, "backend unavailable, trying next");
                    failures.push((backend, reason));
                }
            }
        }
        Err(BackendError::NoUsableBackend { failures })
    }
}
