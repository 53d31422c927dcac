use std::collections::HashMap;

use ed25519_dalek::{Signer, SigningKey};
use rabe_bn::{pairing, Fr, Group, G1, G2};
use rand::Rng;
use tracing::debug;

use crate::aes::{decrypt_symmetric, encrypt_symmetric};
use crate::api::api_models::{EnvelopePayload, Payload};
use crate::errors::{Error, Result};
use crate::name::{Name, KEY_COMPONENT};
use crate::packet::{Data, SignatureInfo};
use crate::security::certificate::Certificate;

struct KeyPair {
    signing_key: SigningKey,
    envelope_secret: Fr,
    certificate: Certificate,
}

/// Private key storage for one participant.
///
/// Holds, per key name, an ed25519 signing key and the secret scalar behind the certificate's
/// envelope-encryption key.
#[derive(Default)]
pub struct KeyChain {
    keys: HashMap<Name, KeyPair>,
}

impl KeyChain {
    pub fn new() -> KeyChain {
        KeyChain::default()
    }

    /// Generates a fresh key for `identity` and returns its certificate.
    pub fn create_identity(&mut self, identity: &Name) -> Certificate {
        let mut rng = rand::thread_rng();
        let key_id: u64 = rng.gen();
        let key_name = identity
            .clone()
            .append(KEY_COMPONENT)
            .append(format!("{:016x}", key_id));

        let signing_key = SigningKey::generate(&mut rng);
        let envelope_secret: Fr = rng.gen();
        let certificate = Certificate::new(
            key_name.clone(),
            signing_key.verifying_key(),
            G1::one() * envelope_secret,
        );
        debug!("Created key {}", key_name);

        self.keys.insert(
            key_name,
            KeyPair {
                signing_key,
                envelope_secret,
                certificate: certificate.clone(),
            },
        );
        certificate
    }

    pub fn certificate(&self, key_name: &Name) -> Option<&Certificate> {
        self.keys.get(key_name).map(|pair| &pair.certificate)
    }

    fn key_pair(&self, key_name: &Name) -> Result<&KeyPair> {
        self.keys
            .get(key_name)
            .ok_or_else(|| Error::UnknownKey(key_name.clone()))
    }

    pub fn sign(&self, data: &mut Data, key_name: &Name) -> Result<()> {
        let pair = self.key_pair(key_name)?;
        let signature = pair.signing_key.sign(&data.signed_portion(key_name)?);
        data.signature = Some(SignatureInfo {
            key_locator: key_name.clone(),
            value: signature.to_bytes().to_vec(),
        });
        Ok(())
    }

    /// Encrypts `plaintext` so that only the holder of `recipient`'s key can read it.
    ///
    /// ElGamal in G1: shared = e(pk^r, g2), sent as g1^r next to the AES-GCM payload. Recovering
    /// pk^r from g1^r takes the secret scalar behind pk.
    pub fn envelope_encrypt(plaintext: &[u8], recipient: &Certificate) -> Result<Vec<u8>> {
        let r: Fr = rand::thread_rng().gen();
        let shared = pairing(recipient.encryption_key() * r, G2::one());
        EnvelopePayload {
            ephemeral: G1::one() * r,
            payload: encrypt_symmetric(shared, plaintext)?,
        }
        .encode()
    }

    pub fn envelope_decrypt(&self, envelope: &[u8], key_name: &Name) -> Result<Vec<u8>> {
        let pair = self.key_pair(key_name)?;
        let envelope = EnvelopePayload::decode(envelope)?;
        let shared = pairing(envelope.ephemeral * pair.envelope_secret, G2::one());
        Ok(decrypt_symmetric(shared, &envelope.payload)?)
    }
}
