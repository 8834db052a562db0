/* src/error.rs */

use thiserror::Error;

/// Result type alias for operations that may fail with `GeoError`.
pub type Result<T> = std::result::Result<T, GeoError>;

/// Errors that can occur while resolving or storing a location.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeoError {
    /// The geolocation service could not be reached.
    #[error("Geolocation request failed: {0}")]
    Network(String),

    /// The service answered with a status other than `success`.
    #[error("IP lookup failed with status `{status}`{}", status_suffix(.message))]
    Status {
        status: String,
        message: Option<String>,
    },

    /// The response body could not be decoded.
    #[error("Invalid geolocation response: {0}")]
    InvalidResponse(String),

    /// A successful response lacked a required field.
    #[error("Geolocation response is missing `{0}`")]
    MissingField(&'static str),

    /// The blocking lookup task panicked or was cancelled.
    #[error("Lookup task failed: {0}")]
    Task(String),

    /// A state key was requested with a different type than it holds.
    #[error("State `{0}` holds a value of a different type")]
    StateType(String),

    /// A client payload could not be decoded.
    #[error("Invalid state payload: {0}")]
    InvalidPayload(String),

    /// A state value could not be serialized into the client payload.
    #[error("Failed to serialize state `{key}`: {message}")]
    StateSerialization { key: String, message: String },
}

fn status_suffix(message: &Option<String>) -> String {
    match message {
        Some(message) => format!(": {message}"),
        None => String::new(),
    }
}
