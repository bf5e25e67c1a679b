#![allow(non_shorthand_field_patterns)]
#![doc = "Error handling primitives shared across the toolchain-matrix crate."]
// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! The derive emitted by [`masterror::Error`] expands pattern matches that
//! trigger the `non_shorthand_field_patterns` lint. The lint is disabled for
//! the module to keep the generated implementations warning-free.

use std::path::{Path, PathBuf};

/// Unified error type returned by the release pipeline and CLI.
///
/// Every variant is fatal for the run: nothing in the crate recovers from an
/// error, it is propagated to `main` which reports it and exits non-zero.
#[derive(Debug, masterror::Error)]
pub enum Error {
    /// A required environment variable or configuration value is missing or
    /// invalid.
    #[error("invalid configuration: {message}")]
    Configuration {
        /// Human readable description of the problem.
        message: String
    },
    /// Wraps I/O errors that occur while reading the configuration document.
    #[error("failed to read configuration from {path:?}: {source}")]
    ConfigIo {
        /// Location of the configuration file.
        path:   PathBuf,
        /// Underlying I/O error.
        source: std::io::Error
    },
    /// Wraps YAML decoding errors.
    #[error("failed to parse configuration: {source}")]
    Parse {
        /// Source decoding error from serde_yaml.
        source: serde_yaml::Error
    },
    /// The release API rejected a request or returned an undecodable body.
    #[error("release request for {repository} failed: {message}")]
    Transport {
        /// Repository the request targeted, in `owner/name` form.
        repository: String,
        /// Description of the failure reported by the HTTP client.
        message:    String
    },
    /// A release carried a publication timestamp that is not RFC 3339.
    #[error("release {tag} has malformed publication timestamp {value:?}")]
    Timestamp {
        /// Tag of the offending release.
        tag:   String,
        /// Raw timestamp value returned by the API.
        value: String
    },
    /// Wraps serialization errors when encoding the build matrix.
    #[error("failed to serialize build matrix: {source}")]
    Serialize {
        /// Underlying serialization error.
        source: serde_json::Error
    },
    /// Wraps I/O errors raised while writing the matrix or a downloaded asset.
    #[error("failed to write output at {path:?}: {source}")]
    Output {
        /// Location of the file being written.
        path:   PathBuf,
        /// Underlying I/O error reported by the operating system.
        source: std::io::Error
    },
    /// Returned when inputs violate invariants.
    #[error("validation failed: {message}")]
    Validation {
        /// Human readable message describing the validation problem.
        message: String
    }
}

impl Error {
    /// Constructs a configuration error from the provided message.
    pub fn configuration<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::Configuration {
            message: message.into()
        }
    }

    /// Constructs a validation error from the provided message.
    pub fn validation<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::Validation {
            message: message.into()
        }
    }

    /// Constructs a transport error for the given repository.
    ///
    /// # Parameters
    ///
    /// * `repository` - Repository the failed request targeted.
    /// * `message` - Description of the failure.
    pub fn transport<R, M>(repository: R, message: M) -> Self
    where
        R: Into<String>,
        M: Into<String>
    {
        Self::Transport {
            repository: repository.into(),
            message:    message.into()
        }
    }

    /// Formats the error for diagnostics without the variant name.
    ///
    /// The returned string matches the [`std::fmt::Display`] implementation.
    pub fn to_display_string(&self) -> String {
        format!("{self}")
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(source: serde_yaml::Error) -> Self {
        Self::Parse {
            source
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(source: serde_json::Error) -> Self {
        Self::Serialize {
            source
        }
    }
}

/// Creates an [`Error::ConfigIo`] variant capturing the failing path and
/// source.
pub fn config_io_error(path: &Path, source: std::io::Error) -> Error {
    Error::ConfigIo {
        path: path.to_path_buf(),
        source
    }
}

/// Creates an [`Error::Output`] variant capturing the failing path and source.
///
/// # Parameters
///
/// * `path` - Location of the file that could not be written.
/// * `source` - I/O error reported by the operating system.
pub fn output_error(path: &Path, source: std::io::Error) -> Error {
    Error::Output {
        path: path.to_path_buf(),
        source
    }
}
