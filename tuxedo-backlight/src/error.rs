//! Backlight error types

use thiserror::Error;
use tuxedo_transport::TransportError;

/// Errors from backlight operations
#[derive(Error, Debug)]
pub enum BacklightError {
    /// Transport layer error
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Invalid parameter value
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}
