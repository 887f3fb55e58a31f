use thiserror::Error;

/// Errors from the record codec: purely a function of the bytes
/// handed to it, never the platform seam.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    #[error("record is {actual} bytes, expected {expected}")]
    BadLength { expected: usize, actual: usize },
    #[error("crc mismatch: stored {expected:#010x}, computed {computed:#010x}")]
    CrcMismatch { expected: u32, computed: u32 },
}

/// Errors from loading or writing back one volume's record. Every
/// variant here is a per-candidate recoverable failure: the orchestrator
/// skips the volume (on load) or flags `errored` (on write-back), it never
/// aborts the whole selection because of one of these.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadError {
    #[error("failed to open config file")]
    Open,
    #[error("failed to read config file")]
    Read,
    #[error("record is {actual} bytes, expected {expected}")]
    BadLength { expected: usize, actual: usize },
    #[error("failed to compute crc")]
    CrcComputation,
    #[error("crc mismatch: stored {expected:#010x}, computed {computed:#010x}")]
    CrcMismatch { expected: u32, computed: u32 },
    #[error("failed to write config file")]
    Write,
    #[error("short write: wrote {actual} of {expected} bytes")]
    ShortWrite { expected: usize, actual: usize },
    #[error("failed to close config file")]
    Close,
}

impl From<CodecError> for LoadError {
    fn from(e: CodecError) -> Self {
        match e {
            CodecError::BadLength { expected, actual } => LoadError::BadLength { expected, actual },
            CodecError::CrcMismatch { expected, computed } => {
                LoadError::CrcMismatch { expected, computed }
            }
        }
    }
}
