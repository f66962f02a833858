use thiserror::Error;

/// Everything that can go wrong while answering a weather lookup.
///
/// None of these are recovered inside the core; they travel up to the caller
/// unchanged and the caller decides how to present them.
#[derive(Debug, Error)]
pub enum WeatherError {
    /// Rejected before any I/O: out-of-range coordinate or empty place name.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Geocoding found no match for the place name.
    #[error("no coordinates found for '{0}'")]
    NotFound(String),

    /// The provider could not be reached or answered with a non-success status.
    #[error("{provider} is unavailable: {reason}")]
    UpstreamUnavailable {
        provider: &'static str,
        reason: String,
    },

    /// The provider answered but the payload did not have the expected shape.
    #[error("{provider} returned a malformed response: {reason}")]
    MalformedResponse {
        provider: &'static str,
        reason: String,
    },

    /// Reading from or writing to the observation store failed.
    #[error("observation store error: {0}")]
    Store(String),
}

/// Coarse outcome class used by front ends to pick a response code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    Upstream,
    Internal,
}

impl WeatherError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WeatherError::InvalidInput(_) => ErrorKind::InvalidInput,
            WeatherError::NotFound(_) => ErrorKind::NotFound,
            WeatherError::UpstreamUnavailable { .. } | WeatherError::MalformedResponse { .. } => {
                ErrorKind::Upstream
            }
            WeatherError::Store(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn unavailable(provider: &'static str, reason: impl ToString) -> Self {
        WeatherError::UpstreamUnavailable {
            provider,
            reason: reason.to_string(),
        }
    }

    pub(crate) fn malformed(provider: &'static str, reason: impl ToString) -> Self {
        WeatherError::MalformedResponse {
            provider,
            reason: reason.to_string(),
        }
    }
}

impl From<rusqlite::Error> for WeatherError {
    fn from(err: rusqlite::Error) -> Self {
        WeatherError::Store(err.to_string())
    }
}

impl From<tokio::task::JoinError> for WeatherError {
    fn from(err: tokio::task::JoinError) -> Self {
        WeatherError::Store(format!("store task failed: {err}"))
    }
}

pub type Result<T, E = WeatherError> = std::result::Result<T, E>;
