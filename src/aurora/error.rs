use thiserror::Error;

/// Failures of a single protocol exchange.
///
/// Callers decide policy by matching on the kind: transport and timeout
/// errors mean the cycle can be retried later, `ChecksumMismatch` means the
/// response must be discarded, and `UnknownTransmissionState` is the
/// recoverable "device answered with a code we have no table entry for"
/// condition that in practice shows up around dawn and dusk.
#[derive(Debug, Error)]
pub enum AuroraError {
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    #[error("transport is not connected")]
    NotConnected,

    #[error("reading timeout")]
    ReadTimeout,

    #[error("no response after {attempts} tries")]
    NoResponse { attempts: u32 },

    #[error("response has a wrong CRC")]
    ChecksumMismatch,

    #[error("malformed response frame ({len} bytes)")]
    MalformedFrame { len: usize },

    #[error("unknown transmission state {code}")]
    UnknownTransmissionState { code: u8 },

    #[error("{description} (transmission state {code})")]
    Failure { code: u8, description: &'static str },

    #[error("response field is not printable ASCII")]
    InvalidAscii,

    #[error("system info index {0} is not supported")]
    UnsupportedIndex(u8),
}

impl AuroraError {
    /// True for failures where backing off and polling again later is the
    /// sensible reaction, as opposed to hard I/O or framing errors.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AuroraError::ReadTimeout
                | AuroraError::NoResponse { .. }
                | AuroraError::UnknownTransmissionState { .. }
        )
    }
}
