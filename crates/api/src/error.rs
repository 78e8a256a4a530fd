// crates/api/src/error.rs
use thiserror::Error;

/// Errors from the backend job-queue API.
///
/// Every variant is transient from the orchestrator's point of view: the
/// last known task slot is preserved and retry is an explicit re-trigger.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("backend returned {status} for {url}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("could not decode response from {url}: {message}")]
    Decode { url: String, message: String },
}

impl ApiError {
    pub fn transport(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Transport {
            url: url.into(),
            source,
        }
    }

    pub fn decode(url: impl Into<String>, message: impl ToString) -> Self {
        Self::Decode {
            url: url.into(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_display() {
        let err = ApiError::Status {
            url: "http://localhost/api/jobs/j1".into(),
            status: 502,
            body: "bad gateway".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("502"));
        assert!(msg.contains("/api/jobs/j1"));
    }

    #[test]
    fn test_decode_error_display() {
        let err = ApiError::decode("http://localhost/api/jobs", "missing field `id`");
        assert!(err.to_string().contains("missing field `id`"));
    }
}
