//! Byte-level attribute-based encryption engine.
//!
//! Wraps the group-level schemes in [`crate::crypto`]: key material travels as serialized blobs,
//! and content is protected by AES-256-GCM under a key derived from a random `Gt` element. That
//! element, encrypted under the attribute-based scheme, becomes the [`ContentKey`].
use rabe_bn::{Gt, G1, G2, Group};
use rand::Rng;
use tracing::debug;

use crate::aes::{decrypt_symmetric, encrypt_symmetric};
use crate::algo::{AbeType, AttributeSet, CipherText, ContentKey, MasterKey, Policy, PrivateKey, PublicParams};
use crate::crypto::{self, cp, kp};
use crate::errors::AbeError;
use crate::models::{
    AbeCpCipherText, AbeCpSecretKey, AbeKpCipherText, AbeKpSecretKey, AbeMasterKey, AbePublicKey,
};
use crate::parser::AccessTreeParser;

pub fn setup(attributes: &[String]) -> Result<(PublicParams, MasterKey), AbeError> {
    if attributes.is_empty() {
        return Err(AbeError::new("Attribute universe is empty"));
    }
    let rng = &mut rand::thread_rng();
    let (public_key, master_key) = crypto::setup(attributes, G1::one(), G2::one(), rng);
    Ok((
        PublicParams {
            pub_params: serde_json::to_vec(&public_key)?,
        },
        MasterKey {
            master_key: serde_json::to_vec(&master_key)?,
        },
    ))
}

fn public_key(public_params: &PublicParams) -> Result<AbePublicKey, AbeError> {
    if public_params.is_empty() {
        return Err(AbeError::new("Public params doesn't exist"));
    }
    Ok(serde_json::from_slice(&public_params.pub_params)?)
}

fn master_key(master_key: &MasterKey) -> Result<AbeMasterKey, AbeError> {
    Ok(serde_json::from_slice(&master_key.master_key)?)
}

fn content_key_bytes(cipher_text: &CipherText) -> Result<&[u8], AbeError> {
    cipher_text
        .content_key
        .as_ref()
        .map(|ck| ck.enc_aes_key.as_slice())
        .ok_or(AbeError::new("Ciphertext carries no content key"))
}

fn seal(secret: Gt, content_key: Vec<u8>, plaintext: &[u8]) -> Result<CipherText, AbeError> {
    Ok(CipherText {
        content: encrypt_symmetric(secret, plaintext)?,
        plain_text_size: plaintext.len() as u64,
        content_key: Some(ContentKey {
            enc_aes_key: content_key,
        }),
    })
}

pub fn cp_keygen(
    public_params: &PublicParams,
    master: &MasterKey,
    attributes: &AttributeSet,
) -> Result<PrivateKey, AbeError> {
    let attributes = attributes.iter().cloned().collect::<Vec<String>>();
    let key = cp::keygen(
        &attributes,
        &public_key(public_params)?,
        &master_key(master)?,
        &mut rand::thread_rng(),
    )?;
    Ok(PrivateKey::from_bytes(serde_json::to_vec(&key)?))
}

pub fn kp_keygen(
    public_params: &PublicParams,
    master: &MasterKey,
    policy: &Policy,
) -> Result<PrivateKey, AbeError> {
    let tree = AccessTreeParser::new(policy.as_str()).parse()?;
    let key = kp::keygen(
        &tree,
        &public_key(public_params)?,
        &master_key(master)?,
        &mut rand::thread_rng(),
    )?;
    Ok(PrivateKey::from_bytes(serde_json::to_vec(&key)?))
}

/// Encrypts `plaintext` so that only keys whose attributes satisfy `policy` can read it.
pub fn cp_encrypt(
    public_params: &PublicParams,
    policy: &Policy,
    plaintext: &[u8],
) -> Result<CipherText, AbeError> {
    let rng = &mut rand::thread_rng();
    let tree = AccessTreeParser::new(policy.as_str()).parse()?;
    let secret: Gt = rng.gen();
    let abe_cipher_text = cp::encrypt(&secret, &public_key(public_params)?, &tree, rng)?;
    seal(secret, serde_json::to_vec(&abe_cipher_text)?, plaintext)
}

/// Encrypts `plaintext` labelled with `attributes`; keys whose policy accepts the labels can read it.
pub fn kp_encrypt(
    public_params: &PublicParams,
    attributes: &AttributeSet,
    plaintext: &[u8],
) -> Result<CipherText, AbeError> {
    let rng = &mut rand::thread_rng();
    let attributes = attributes.iter().cloned().collect::<Vec<String>>();
    let secret: Gt = rng.gen();
    let abe_cipher_text = kp::encrypt(&secret, &public_key(public_params)?, &attributes, rng)?;
    seal(secret, serde_json::to_vec(&abe_cipher_text)?, plaintext)
}

pub fn cp_decrypt(
    public_params: &PublicParams,
    private_key: &PrivateKey,
    cipher_text: &CipherText,
) -> Result<Vec<u8>, AbeError> {
    public_key(public_params)?;
    let key: AbeCpSecretKey = serde_json::from_slice(private_key.as_bytes())?;
    let abe_cipher_text: AbeCpCipherText = serde_json::from_slice(content_key_bytes(cipher_text)?)?;
    let secret = cp::decrypt(&abe_cipher_text, &key)?;
    debug!("Recovered content key, decrypting {} bytes", cipher_text.content.len());
    Ok(decrypt_symmetric(secret, &cipher_text.content)?)
}

pub fn kp_decrypt(
    public_params: &PublicParams,
    private_key: &PrivateKey,
    cipher_text: &CipherText,
) -> Result<Vec<u8>, AbeError> {
    public_key(public_params)?;
    let key: AbeKpSecretKey = serde_json::from_slice(private_key.as_bytes())?;
    let abe_cipher_text: AbeKpCipherText = serde_json::from_slice(content_key_bytes(cipher_text)?)?;
    let secret = kp::decrypt(&abe_cipher_text, &key)?;
    debug!("Recovered content key, decrypting {} bytes", cipher_text.content.len());
    Ok(decrypt_symmetric(secret, &cipher_text.content)?)
}

pub fn decrypt(
    abe_type: AbeType,
    public_params: &PublicParams,
    private_key: &PrivateKey,
    cipher_text: &CipherText,
) -> Result<Vec<u8>, AbeError> {
    match abe_type {
        AbeType::CpAbe => cp_decrypt(public_params, private_key, cipher_text),
        AbeType::KpAbe => kp_decrypt(public_params, private_key, cipher_text),
    }
}
