use thiserror::Error;

use crate::host::HostError;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Host(#[from] HostError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// The host error carried by this failure, if it came from a host handle.
    pub fn as_host_error(&self) -> Option<&HostError> {
        match self {
            BridgeError::Host(err) => Some(err),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
