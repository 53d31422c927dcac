//! Certificates, key storage, the identity registry and trust-schema validation.
pub mod certificate;
pub mod keychain;
pub mod trust_config;
pub mod validator;

pub use certificate::Certificate;
pub use keychain::KeyChain;
pub use trust_config::TrustConfig;
pub use validator::{AcceptAllValidator, TrustSchemaValidator, ValidationError, Validator};
