//! Simulation-specific error types.
//!
//! Loaders propagate errors through these types instead of panicking. Their
//! callers log the failure and fall back to defaults, so bad data degrades
//! one template or one file and never the whole simulation.
//!
//! ## Usage
//!
//! ```rust
//! use accretion_arena::error::{SimError, SimResult};
//!
//! fn first_image(template: &str, images: &[String]) -> SimResult<String> {
//!     images.first().cloned().ok_or(SimError::MissingImage {
//!         template: template.to_string(),
//!     })
//! }
//! # assert!(first_image("laser", &[]).is_err());
//! ```

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Top-level error enum for the arena simulation.
#[derive(Debug, Error)]
pub enum SimError {
    /// A particle descriptor declared no `IMAGE` line; the template is unusable.
    #[error("particle template '{template}' declares no IMAGE")]
    MissingImage {
        /// Name of the rejected template.
        template: String,
    },

    /// A particle descriptor references an image the image service cannot resolve.
    #[error("particle template '{template}' references unknown image '{image}'")]
    ImageNotFound {
        /// Name of the rejected template.
        template: String,
        /// The unresolved image reference.
        image: String,
    },

    /// A spawn or lookup named a template that was never registered.
    #[error("unknown particle template '{0}'")]
    UnknownTemplate(String),

    /// A data file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// File that failed.
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A TOML data file could not be parsed.
    #[error("failed to parse {}: {source}", path.display())]
    Toml {
        /// File that failed.
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl SimError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn toml(path: impl Into<PathBuf>, source: toml::de::Error) -> Self {
        Self::Toml {
            path: path.into(),
            source,
        }
    }
}

/// Convenience alias: a `Result` using `SimError` as the error type.
pub type SimResult<T> = Result<T, SimError>;

/// Read a whole data file, attaching the path to any I/O failure.
pub(crate) fn read_data_file(path: &std::path::Path) -> SimResult<String> {
    std::fs::read_to_string(path).map_err(|e| SimError::io(path, e))
}
