//! Error types for the session
//!
//! Every variant is recoverable: the command that produced it leaves the
//! session unchanged.

use filterer_io::IoError;
use filterer_task::TaskError;
use filterer_transform::TransformError;
use thiserror::Error;

/// Errors reported to the user by session commands
#[derive(Debug, Error)]
pub enum SessionError {
    /// Apply was requested before any image was opened
    #[error("Open an image first.")]
    NoImage,

    /// Save was requested before any output exists
    #[error("Apply a filter before saving.")]
    NoOutput,

    /// Iteration count outside the accepted range
    #[error("iterations must be between {min} and {max}, got {value}")]
    InvalidIterations { value: u32, min: u32, max: u32 },

    /// Zoom factor outside the accepted range
    #[error("zoom must be between {min} and {max}, got {value}")]
    InvalidZoom { value: f64, min: f64, max: f64 },

    /// A pane rendering at the requested zoom would be too large
    #[error("rendering would be {width}x{height}, more than {max} pixels")]
    RenderTooLarge { width: u64, height: u64, max: u64 },

    /// Reading or writing an image failed
    #[error("{0}")]
    Io(#[from] IoError),

    /// Scaling an image failed
    #[error("{0}")]
    Transform(#[from] TransformError),

    /// A background task could not be started
    #[error("{0}")]
    Task(#[from] TaskError),
}

impl SessionError {
    /// Short heading for the notice shown to the user.
    pub fn title(&self) -> &'static str {
        match self {
            Self::NoImage => "No image opened",
            Self::NoOutput => "No output generated",
            Self::InvalidIterations { .. } => "Invalid iteration count",
            Self::InvalidZoom { .. } | Self::RenderTooLarge { .. } => "Invalid zoom",
            Self::Io(_) => "Image I/O failed",
            Self::Transform(_) => "Scaling failed",
            Self::Task(_) => "Background task failed",
        }
    }
}

/// Result type for session commands
pub type SessionResult<T> = Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_wording() {
        assert_eq!(SessionError::NoImage.title(), "No image opened");
        assert_eq!(SessionError::NoImage.to_string(), "Open an image first.");
        assert_eq!(SessionError::NoOutput.title(), "No output generated");
        assert_eq!(SessionError::NoOutput.to_string(), "Apply a filter before saving.");
    }
}
