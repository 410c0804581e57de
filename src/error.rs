//! Error taxonomy for tile transformations
//!
//! Every bulk operation validates its preconditions before touching a
//! destination, so an `Err` always means nothing was written.

use std::path::PathBuf;

/// Result alias used across the crate
pub type TransformResult<T> = Result<T, TransformError>;

#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error(
        "runtime attribute mismatch: destination has {dst_real} real / {dst_int} int columns, \
         source has {src_real} real / {src_int} int columns"
    )]
    RuntimeAttributeMismatch {
        dst_real: usize,
        dst_int: usize,
        src_real: usize,
        src_int: usize,
    },

    #[error("source range {start}..{end} exceeds the {available} particles in the source tile")]
    SourceRange {
        start: usize,
        end: usize,
        available: usize,
    },

    #[error("destination range {start}..{end} exceeds the {available} particles in the destination tile")]
    DestinationRange {
        start: usize,
        end: usize,
        available: usize,
    },

    #[error("index range starting at {start} with length {len} overflows usize")]
    RangeOverflow { start: usize, len: usize },

    #[error("mask has {len} entries but {required} are required")]
    MaskLength { len: usize, required: usize },

    #[error("index list has {len} entries but {required} are required")]
    IndexListLength { len: usize, required: usize },

    #[error("index {index} at position {position} is out of range for {available} particles")]
    IndexOutOfRange {
        index: i128,
        position: usize,
        available: usize,
    },

    #[error("invalid configuration: {field}: {reason}")]
    InvalidConfig { field: String, reason: String },

    #[error("failed to read configuration {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("thread pool construction failed: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Create a source range error for `start..start + len`
pub fn source_range(start: usize, len: usize, available: usize) -> TransformError {
    TransformError::SourceRange {
        start,
        end: start.saturating_add(len),
        available,
    }
}

/// Create a destination range error for `start..start + len`
pub fn destination_range(start: usize, len: usize, available: usize) -> TransformError {
    TransformError::DestinationRange {
        start,
        end: start.saturating_add(len),
        available,
    }
}

/// Create an invalid configuration error
pub fn invalid_config(field: &str, reason: impl std::fmt::Display) -> TransformError {
    TransformError::InvalidConfig {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_mismatched_quantities() {
        let err = TransformError::RuntimeAttributeMismatch {
            dst_real: 2,
            dst_int: 1,
            src_real: 3,
            src_int: 1,
        };
        let msg = err.to_string();
        assert!(msg.contains("2 real"));
        assert!(msg.contains("3 real"));

        let err = destination_range(4, 6, 8);
        assert_eq!(err.to_string(), "destination range 4..10 exceeds the 8 particles in the destination tile");
    }

    #[test]
    fn test_range_helpers_saturate() {
        match source_range(usize::MAX, 2, 10) {
            TransformError::SourceRange { end, .. } => assert_eq!(end, usize::MAX),
            other => panic!("unexpected error: {other}"),
        }
    }
}
