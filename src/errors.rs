//! Error types.
//!
//! The scheme-level errors ([`AbeError`], [`ParseError`], [`SymmetricEncryptionError`]) carry a
//! message only. [`Error`] is the protocol-level error returned by the authority, the consumer and
//! the security collaborators; [`Error::kind`] sorts it into one of the classes a caller has to
//! treat differently.
pub mod abe_error;
pub mod parse_error;
pub mod symmetric_encryption_error;

use thiserror::Error;

pub use abe_error::AbeError;
pub use parse_error::ParseError;
pub use symmetric_encryption_error::SymmetricEncryptionError;

use crate::algo::AbeType;
use crate::fetch::FetchKind;
use crate::name::Name;
use crate::packet::NackReason;
use crate::security::validator::ValidationError;

/// Coarse classification of an [`Error`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ErrorKind {
    /// The identity has no registered policy, or its certificate is unknown.
    Policy,
    /// The network declined the request or never answered it.
    Transport,
    /// A fetched object failed signature or trust-schema validation.
    Trust,
    /// Decryption failed or produced inconsistent output.
    Crypto,
    /// A reply or payload does not have the expected shape: bad segmentation, undecodable
    /// payloads, requests for segments that do not exist.
    Protocol,
    /// The caller used the API out of order or with bad local state.
    Usage,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("No policy registered for identity {0}")]
    PolicyNotFound(Name),
    #[error("Identity {0} is unknown, no certificate has been registered for it")]
    UnknownIdentity(Name),
    #[error("Nack for {name} {kind} fetch with reason {reason}")]
    Nack {
        name: Name,
        kind: FetchKind,
        reason: NackReason,
    },
    #[error("Timeout for {name} {kind} fetch")]
    Timeout { name: Name, kind: FetchKind },
    #[error("{subject} cannot be authenticated: {source}")]
    Validation {
        subject: &'static str,
        #[source]
        source: ValidationError,
    },
    #[error(transparent)]
    Abe(#[from] AbeError),
    #[error("Declared plaintext size {declared} does not match decrypted size {actual}")]
    PlainTextSizeMismatch { declared: u64, actual: usize },
    #[error("Authority serves {actual} parameters but {expected} was expected")]
    AbeTypeMismatch { expected: AbeType, actual: AbeType },
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("Malformed {what}: {reason}")]
    Malformed { what: &'static str, reason: String },
    #[error("Public params or private decryption key doesn't exist")]
    NotReady,
    #[error("No private key for {0} in the key chain")]
    UnknownKey(Name),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::PolicyNotFound(_) | Error::UnknownIdentity(_) | Error::Parse(_) => {
                ErrorKind::Policy
            }
            Error::Nack { .. } | Error::Timeout { .. } => ErrorKind::Transport,
            Error::Validation { .. } | Error::AbeTypeMismatch { .. } => ErrorKind::Trust,
            Error::Abe(_) | Error::PlainTextSizeMismatch { .. } | Error::Json(_) => {
                ErrorKind::Crypto
            }
            Error::Malformed { .. } => ErrorKind::Protocol,
            Error::NotReady | Error::UnknownKey(_) | Error::Config(_) | Error::Io(_) => {
                ErrorKind::Usage
            }
        }
    }

    /// Only an exhausted timeout budget may succeed if the whole operation is tried again later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }

    pub(crate) fn malformed(what: &'static str, reason: impl Into<String>) -> Error {
        Error::Malformed {
            what,
            reason: reason.into(),
        }
    }
}

impl From<SymmetricEncryptionError> for Error {
    fn from(value: SymmetricEncryptionError) -> Self {
        Error::Abe(value.into())
    }
}

pub type Result<V, E = Error> = std::result::Result<V, E>;
