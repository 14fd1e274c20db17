// ⚠️ Load Errors - Everything that can go wrong talking to the dataset host
//
// None of these reach a caller of `Msm::fetch` or `Msm::lookup_combination`:
// the soft-failure boundaries log them and degrade to `None` / empty tables.

use thiserror::Error;

/// Failure while fetching or decoding a remote resource
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// Connection refused, DNS failure, timeout, body read error...
    #[error("transport error fetching {url}: {message}")]
    Transport { url: String, message: String },

    /// Remote answered with a non-success status
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// Body was not the JSON we expected
    #[error("failed to decode {url}: {message}")]
    Decode { url: String, message: String },
}

impl LoadError {
    pub fn transport(url: &str, err: impl std::fmt::Display) -> Self {
        LoadError::Transport {
            url: url.to_string(),
            message: err.to_string(),
        }
    }

    pub fn decode(url: &str, err: impl std::fmt::Display) -> Self {
        LoadError::Decode {
            url: url.to_string(),
            message: err.to_string(),
        }
    }

    /// The record simply does not exist (as opposed to a broken host)
    pub fn is_not_found(&self) -> bool {
        matches!(self, LoadError::Status { status: 404, .. })
    }

    pub fn url(&self) -> &str {
        match self {
            LoadError::Transport { url, .. }
            | LoadError::Status { url, .. }
            | LoadError::Decode { url, .. } => url,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
