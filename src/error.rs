//! Error types for rendering and request handling.
//!
//! Hour data never produces an error. The only failures are resource failures
//! while rendering ([`RenderError`]) and client input problems caught at the
//! adapter boundary before the renderer runs ([`RequestError`]).

use std::convert::Infallible;
use std::io;
use thiserror::Error;

/// Resource failures while producing an image.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Pixel buffer could not be allocated
    #[error("canvas allocation failed: {0}")]
    Canvas(String),

    /// Text could not be laid out or drawn
    #[error("text rendering failed: {0}")]
    Text(String),

    /// PNG encoding failed
    #[error("image encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    /// Writing the encoded image failed
    #[error("output IO: {0}")]
    Io(#[from] io::Error),
}

impl From<Infallible> for RenderError {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}

/// Problems with an incoming request, detected before rendering.
#[derive(Error, Debug)]
pub enum RequestError {
    /// The mandatory `T_Date` field is absent
    #[error("T_Date is required in grid_data")]
    MissingDate,

    /// The payload could not be interpreted
    #[error("invalid request: {0}")]
    Invalid(String),

    /// Rendering failed after the request was accepted
    #[error("Error generating grid image: {0}")]
    Render(#[from] RenderError),
}

impl RequestError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }

    /// True when the caller sent bad input, false for internal failures.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, RequestError::Render(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_date_message() {
        assert_eq!(
            RequestError::MissingDate.to_string(),
            "T_Date is required in grid_data"
        );
        assert!(RequestError::MissingDate.is_client_error());
    }

    #[test]
    fn test_render_errors_are_internal() {
        let err = RequestError::from(RenderError::Canvas("0x0".into()));
        assert!(!err.is_client_error());
        assert!(err.to_string().contains("canvas allocation failed"));
    }

    #[test]
    fn test_io_error_preserves_source() {
        let err = RenderError::from(io::Error::other("disk full"));
        assert!(err.to_string().contains("disk full"));
    }
}
