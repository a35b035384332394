//! Client error types.

use thiserror::Error;

use chronos_cluster::{ClusterError, TransportError};

/// Errors that can occur while talking to the scheduler.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("cluster error: {0}")]
    Cluster(#[from] ClusterError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The scheduler answered with a non-2xx status.
    #[error("{}", status_message(.status, .body))]
    Status { status: u16, body: String },

    #[error("invalid response from chronos: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("invalid job: {0}")]
    InvalidJob(String),

    #[error("job does not exist: {0}")]
    JobNotFound(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

fn status_message(status: &u16, body: &str) -> String {
    if body.is_empty() {
        format!("API call returns status {status}")
    } else {
        body.to_string()
    }
}

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_prefers_body() {
        let err = ClientError::Status {
            status: 400,
            body: "job name missing".into(),
        };
        assert_eq!(err.to_string(), "job name missing");
    }

    #[test]
    fn status_error_without_body_reports_code() {
        let err = ClientError::Status {
            status: 503,
            body: String::new(),
        };
        assert_eq!(err.to_string(), "API call returns status 503");
    }
}
