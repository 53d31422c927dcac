use aes_gcm::aead::{Aead, NewAead};
use aes_gcm::{Aes256Gcm, Key, Nonce};

use rand::thread_rng;
use rand::Rng;
use std::convert::TryInto;

use crate::errors::SymmetricEncryptionError;

const NONCE_SIZE: usize = 12;

// https://github.com/Fraunhofer-AISEC/rabe/blob/e4dff4a9975222a7fe69a027fe397e29379b53af/src/utils/aes/mod.rs
pub fn encrypt_symmetric<G: Into<Vec<u8>>>(
    msg: G,
    plaintext: &[u8],
) -> Result<Vec<u8>, SymmetricEncryptionError> {
    let mut rng = thread_rng();
    // 256bit key hashed/derived from msg G
    let kdf = kdf(msg);
    let key = Key::from_slice(kdf.as_slice());
    let cipher = Aes256Gcm::new(key);
    // 96bit random noise
    let nonce_vec: Vec<u8> = (0..NONCE_SIZE).map(|_| rng.gen()).collect();
    let nonce = Nonce::from_slice(nonce_vec.as_ref());
    match cipher.encrypt(nonce, plaintext) {
        Ok(mut ct) => {
            ct.splice(0..0, nonce.iter().cloned()); // [nonce|ciphertext]
            Ok(ct)
        }
        Err(e) => Err(SymmetricEncryptionError::new(&format!("{:?}", e))),
    }
}

/// Key Encapsulation Mechanism (AES-256 Decryption Function)
pub fn decrypt_symmetric<G: Into<Vec<u8>>>(
    msg: G,
    nonce_ct: &[u8],
) -> Result<Vec<u8>, SymmetricEncryptionError> {
    if nonce_ct.len() < NONCE_SIZE {
        return Err(SymmetricEncryptionError::new(
            "Ciphertext is shorter than its nonce",
        ));
    }
    let (nonce_bytes, ciphertext) = nonce_ct.split_at(NONCE_SIZE);
    let nonce_vec: [u8; NONCE_SIZE] = nonce_bytes
        .try_into()
        .map_err(|_| SymmetricEncryptionError::new("Error extracting nonce from ciphertext"))?;
    // 256bit key hashed/derived from msg G
    let kdf = kdf(msg);
    let key = Key::from_slice(kdf.as_slice());
    let cipher = Aes256Gcm::new(key);
    let nonce = Nonce::from_slice(nonce_vec.as_ref());
    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|e| SymmetricEncryptionError::new(&format!("decryption error: {:?}", e)))
}

/// Key derivation function - turns anything implementing the `Into<Vec<u8>` trait into a key for AES-256
fn kdf<T: Into<Vec<u8>>>(data: T) -> Vec<u8> {
    use sha3::{Digest, Sha3_256};
    let mut hasher = Sha3_256::new();
    hasher.update(data.into());
    hasher.finalize().to_vec()
}
