use thiserror::Error;

/// Error taxonomy for container, entropy-codec, and geometry failures.
///
/// The DCT, quantization, and bit-buffer layers never return this type: their
/// preconditions (view length == N, valid strides) are upheld by the image
/// pipeline before those layers are ever called.
#[derive(Debug, Error)]
pub enum OwlVisionError {
  #[error("invalid container format: {0}")]
  InvalidFormat(String),

  #[error("corrupt MaxFOG payload: {0}")]
  CorruptPayload(String),

  #[error("unsupported geometry: {0}")]
  UnsupportedGeometry(String),

  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),

  #[error("allocation error: {0}")]
  AllocationError(String),
}

pub type Result<T> = std::result::Result<T, OwlVisionError>;
