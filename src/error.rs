//! Error types shared by every stage of the render pipeline.

use std::time::Duration;

/// Result alias used throughout the crate.
pub type EmblemResult<T> = Result<T, EmblemError>;

/// Everything that can go wrong while building or rendering an emblem.
///
/// None of these are transient, so callers should surface them instead of
/// retrying.
#[derive(thiserror::Error, Debug)]
pub enum EmblemError {
    /// An image or glyph source is unreachable or cannot be decoded.
    #[error("failed to load asset '{path}': {reason}")]
    AssetLoad { path: String, reason: String },

    /// An asset load did not settle before its deadline.
    #[error("asset '{path}' did not load within {timeout:?}")]
    AssetTimeout { path: String, timeout: Duration },

    /// A color string is not a 7-character `#RRGGBB` value.
    #[error("invalid color '{0}': expected #RRGGBB")]
    InvalidColor(String),

    /// A layer scale is not a positive finite number.
    #[error("invalid scale {0}: must be positive and finite")]
    InvalidScale(f64),

    /// A layer offset is NaN or infinite.
    #[error("invalid position ({x}, {y}): must be finite")]
    InvalidPosition { x: f64, y: f64 },

    /// A layer rotation is NaN or infinite.
    #[error("invalid rotation {0}: must be finite")]
    InvalidRotation(f64),

    /// The orientation name is not in the profile table.
    #[error("unknown orientation '{0}'")]
    UnknownOrientation(String),

    /// The platform could not allocate a drawing surface of this size.
    #[error("cannot allocate a {width}x{height} drawing surface")]
    CanvasUnavailable { width: u32, height: u32 },

    /// Pixels written to a surface do not match its size.
    #[error("pixel buffer is {actual_width}x{actual_height} but the surface is {width}x{height}")]
    PixelSizeMismatch {
        width: u32,
        height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    /// A draw request could not be decoded.
    #[error("malformed draw request: {0}")]
    Request(String),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl EmblemError {
    pub fn asset_load(path: impl Into<String>, reason: impl ToString) -> Self {
        Self::AssetLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn request(msg: impl Into<String>) -> Self {
        Self::Request(msg.into())
    }

    /// The HTTP status a render endpoint should answer with for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::InvalidColor(_)
            | Self::InvalidScale(_)
            | Self::InvalidPosition { .. }
            | Self::InvalidRotation(_)
            | Self::UnknownOrientation(_)
            | Self::Request(_)
            | Self::Serde(_) => 400,
            Self::AssetLoad { .. } => 404,
            Self::AssetTimeout { .. } => 504,
            Self::CanvasUnavailable { .. }
            | Self::PixelSizeMismatch { .. }
            | Self::Image(_)
            | Self::Io(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_offending_input() {
        assert!(
            EmblemError::InvalidColor("#12".into())
                .to_string()
                .contains("'#12'")
        );
        assert!(
            EmblemError::asset_load("/a.png", "not found")
                .to_string()
                .contains("/a.png")
        );
        assert!(
            EmblemError::UnknownOrientation("TABLET".into())
                .to_string()
                .contains("TABLET")
        );
    }

    #[test]
    fn caller_errors_map_to_client_statuses() {
        assert_eq!(EmblemError::InvalidColor("x".into()).http_status(), 400);
        assert_eq!(EmblemError::InvalidScale(0.0).http_status(), 400);
        assert_eq!(EmblemError::InvalidRotation(f64::INFINITY).http_status(), 400);
        assert_eq!(
            EmblemError::InvalidPosition {
                x: f64::NAN,
                y: 0.0
            }
            .http_status(),
            400
        );
        assert_eq!(EmblemError::request("bad").http_status(), 400);
        assert_eq!(EmblemError::asset_load("p", "gone").http_status(), 404);
        assert_eq!(
            EmblemError::AssetTimeout {
                path: "p".into(),
                timeout: Duration::from_secs(1)
            }
            .http_status(),
            504
        );
        assert_eq!(
            EmblemError::CanvasUnavailable {
                width: 0,
                height: 0
            }
            .http_status(),
            500
        );
    }
}
