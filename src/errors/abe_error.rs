use thiserror::Error;

use crate::errors::parse_error::ParseError;
use crate::errors::symmetric_encryption_error::SymmetricEncryptionError;

#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Error)]
#[error("Encryption error: {message}")]
pub struct AbeError {
    pub message: String,
}

impl AbeError {
    pub fn new(message: &str) -> AbeError {
        AbeError {
            message: message.to_string(),
        }
    }
}

impl From<SymmetricEncryptionError> for AbeError {
    fn from(value: SymmetricEncryptionError) -> Self {
        AbeError::new(&format!("Symmetric encryption error: {}", value))
    }
}

impl From<ParseError> for AbeError {
    fn from(value: ParseError) -> Self {
        AbeError::new(&format!("Parse error: {}", value))
    }
}

impl From<serde_json::Error> for AbeError {
    fn from(value: serde_json::Error) -> Self {
        AbeError::new(&format!("Malformed key material: {}", value))
    }
}
