use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Invalid {kind} id: {value}")]
    InvalidId { kind: &'static str, value: String },

    #[error("Invalid ChandaNo: {0:?}")]
    InvalidChandaNo(String),

    #[error("Unknown organization level: {0}")]
    UnknownLevel(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
