//! Error types for the resolution layer.
//!
//! A resolution miss is not an error: resolvers return `None`. These errors
//! cover setting up resolvers and reading resource contents.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while creating resolvers or reading resources.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// The root of a directory resolver is missing or not a directory.
    #[error("resolver root {path:?} is invalid")]
    RootInvalid {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading an on-disk resource failed.
    #[error("cannot read resource {name:?} from {path:?}")]
    Read {
        name: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;

    #[test]
    fn read_error_display() {
        let e = ResourceError::Read {
            name: "styles/main.css".to_string(),
            path: PathBuf::from("/blocks/site/public/styles/main.css"),
            source: std::io::Error::other("gone"),
        };
        let display = format!("{}", e);
        assert!(display.contains("styles/main.css"));
        assert!(!display.contains("gone"));
        assert_eq!(StdError::source(&e).unwrap().to_string(), "gone");
    }

    #[test]
    fn root_invalid_display() {
        let e = ResourceError::RootInvalid {
            path: PathBuf::from("/nowhere"),
            source: std::io::Error::other("not a directory"),
        };
        assert!(format!("{}", e).contains("/nowhere"));
    }
}
