//! Inspection of data collector responses.
//!
//! The collector answers `{"error": <code>, "data": {"datacollector_batch": {"error": <code>}}}`.
//! A delivered bin stays delivered whatever the body says; the outcome is
//! only logged.

use serde::Deserialize;
use serde_json::Value;
use splyt_config_and_utils::SplytError;
use tracing::error;

/// What a collector response body reported.
#[derive(Debug, Clone, PartialEq)]
pub enum CollectorResponse {
    /// Both the envelope and the batch context report success.
    Accepted,
    /// The top-level envelope carries an error code.
    EnvelopeError { code: i64, error: SplytError },
    /// The batch context carries an error code.
    BatchError { code: i64, error: SplytError },
    /// The body did not have the expected shape.
    Malformed(String),
}

#[derive(Deserialize)]
struct Envelope {
    error: Option<i64>,
    data: Option<Value>,
}

impl CollectorResponse {
    /// Classify a response body.
    pub fn parse(body: &str) -> Self {
        let envelope: Envelope = match serde_json::from_str(body) {
            Ok(envelope) => envelope,
            Err(e) => return Self::Malformed(format!("unparseable body: {e}")),
        };

        let Some(code) = envelope.error else {
            return Self::Malformed("error missing".to_string());
        };
        if let Err(error) = SplytError::from_code(code) {
            return Self::EnvelopeError { code, error };
        }

        let Some(data) = envelope.data else {
            return Self::Malformed("data missing".to_string());
        };
        let Some(context) = data.get("datacollector_batch") else {
            return Self::Malformed("context missing".to_string());
        };
        let Some(code) = context.get("error").and_then(Value::as_i64) else {
            return Self::Malformed("context error missing".to_string());
        };

        match SplytError::from_code(code) {
            Ok(()) => Self::Accepted,
            Err(error) => Self::BatchError { code, error },
        }
    }

    /// Log anything other than [`CollectorResponse::Accepted`].
    pub fn log(&self) {
        match self {
            Self::Accepted => {}
            Self::EnvelopeError { code, error } => {
                error!(code, error = %error, "Top-level error returned from data collector");
            }
            Self::BatchError { code, error } => {
                error!(code, error = %error, "datacollector_batch error returned from data collector");
            }
            Self::Malformed(reason) => {
                error!(reason = %reason, "Unexpected response returned from data collector");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepted() {
        let body = r#"{"error":0,"data":{"datacollector_batch":{"error":0}}}"#;
        assert_eq!(CollectorResponse::parse(body), CollectorResponse::Accepted);
    }

    #[test]
    fn test_envelope_error() {
        let body = r#"{"error":-3,"data":null}"#;
        assert_eq!(
            CollectorResponse::parse(body),
            CollectorResponse::EnvelopeError {
                code: -3,
                error: SplytError::InvalidArgs
            }
        );
    }

    #[test]
    fn test_batch_error_with_unknown_code() {
        let body = r#"{"error":0,"data":{"datacollector_batch":{"error":-42}}}"#;
        assert_eq!(
            CollectorResponse::parse(body),
            CollectorResponse::BatchError {
                code: -42,
                error: SplytError::Unknown
            }
        );
    }

    #[test]
    fn test_malformed_shapes() {
        for body in [
            "",
            "not json",
            r#"{"data":{}}"#,
            r#"{"error":0}"#,
            r#"{"error":0,"data":{}}"#,
            r#"{"error":0,"data":{"datacollector_batch":{}}}"#,
        ] {
            assert!(
                matches!(CollectorResponse::parse(body), CollectorResponse::Malformed(_)),
                "body {body:?} should be malformed"
            );
        }
    }
}
