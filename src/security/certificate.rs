use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use rabe_bn::G1;

use crate::name::Name;
use crate::packet::Data;
use crate::security::validator::ValidationError;

/// Public half of an identity's key: a signing key for authentication and a group element for
/// envelope encryption.
#[derive(Clone, Debug, PartialEq)]
pub struct Certificate {
    key_name: Name,
    signing_key: VerifyingKey,
    encryption_key: G1,
}

impl Certificate {
    pub fn new(key_name: Name, signing_key: VerifyingKey, encryption_key: G1) -> Certificate {
        Certificate {
            key_name,
            signing_key,
            encryption_key,
        }
    }

    /// `<identity>/KEY/<key-id>`
    pub fn key_name(&self) -> &Name {
        &self.key_name
    }

    pub fn identity(&self) -> Name {
        self.key_name
            .key_identity()
            .unwrap_or_else(|| self.key_name.clone())
    }

    pub fn signing_key(&self) -> &VerifyingKey {
        &self.signing_key
    }

    pub fn encryption_key(&self) -> G1 {
        self.encryption_key
    }

    /// Checks that `data` was signed by this certificate's key.
    pub fn verify(&self, data: &Data) -> Result<(), ValidationError> {
        let signature = data
            .signature
            .as_ref()
            .ok_or_else(|| ValidationError::Unsigned(data.name.clone()))?;
        if signature.key_locator != self.key_name {
            return Err(ValidationError::UnknownSigner(signature.key_locator.clone()));
        }
        let signed = data
            .signed_portion(&signature.key_locator)
            .map_err(|_| ValidationError::BadSignature(data.name.clone()))?;
        let signature = Signature::from_slice(&signature.value)
            .map_err(|_| ValidationError::BadSignature(data.name.clone()))?;
        self.signing_key
            .verify(&signed, &signature)
            .map_err(|_| ValidationError::BadSignature(data.name.clone()))
    }
}
