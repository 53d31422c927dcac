use thiserror::Error;

#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Error)]
#[error("SymmetricEncryptionError: {message}")]
pub struct SymmetricEncryptionError {
    pub message: String,
}

impl SymmetricEncryptionError {
    pub fn new(message: &str) -> SymmetricEncryptionError {
        SymmetricEncryptionError {
            message: message.to_string(),
        }
    }
}
