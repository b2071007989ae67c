use thiserror::Error;

/// Failures talking to the Nomad API.
///
/// Payloads are plain strings so the error is `Clone` and can be handed to
/// handlers and replayed by test fakes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NomadError {
    #[error("request to {path} failed: {reason}")]
    Transport { path: String, reason: String },

    #[error("{path} returned {status}: {body}")]
    Status {
        path: String,
        status: u16,
        body: String,
    },

    #[error("failed to decode {path}: {reason}")]
    Decode { path: String, reason: String },

    #[error("event stream error: {0}")]
    Stream(String),

    #[error("{0}")]
    Other(String),
}

impl NomadError {
    pub fn transport<E: ToString>(path: &str, err: E) -> Self {
        NomadError::Transport {
            path: path.to_string(),
            reason: err.to_string(),
        }
    }

    pub fn decode<E: ToString>(path: &str, err: E) -> Self {
        NomadError::Decode {
            path: path.to_string(),
            reason: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },
}
