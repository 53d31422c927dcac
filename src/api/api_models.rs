use rabe_bn::G1;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::algo::{AbeType, CipherText, ContentKey, PublicParams};
use crate::api::Base64Standard;
use crate::errors::{Error, Result};
use crate::name::Name;

/// JSON encoding shared by all payloads.
pub trait Payload: Serialize + DeserializeOwned {
    const WHAT: &'static str;

    fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| Error::malformed(Self::WHAT, e.to_string()))
    }
}

/// Content of `<authority>/PUBPARAMS`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PublicParamsPayload {
    pub abe_type: AbeType,
    #[serde(with = "Base64Standard")]
    pub pub_params: Vec<u8>,
}

impl Payload for PublicParamsPayload {
    const WHAT: &'static str = "public params";
}

impl PublicParamsPayload {
    pub fn public_params(&self) -> PublicParams {
        PublicParams {
            pub_params: self.pub_params.clone(),
        }
    }
}

/// Content of an encrypted application object.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct EncryptedContentPayload {
    #[serde(rename = "EncryptedContent", with = "Base64Standard")]
    pub encrypted_content: Vec<u8>,
    #[serde(rename = "PlainTextSize")]
    pub plain_text_size: u64,
    #[serde(rename = "ContentKeyName")]
    pub content_key_name: Name,
}

impl Payload for EncryptedContentPayload {
    const WHAT: &'static str = "encrypted content";
}

impl EncryptedContentPayload {
    pub fn new(cipher_text: &CipherText, content_key_name: Name) -> EncryptedContentPayload {
        EncryptedContentPayload {
            encrypted_content: cipher_text.content.clone(),
            plain_text_size: cipher_text.plain_text_size,
            content_key_name,
        }
    }
}

/// Content of a content-key object.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ContentKeyPayload {
    #[serde(rename = "EncryptedAesKey", with = "Base64Standard")]
    pub encrypted_aes_key: Vec<u8>,
}

impl Payload for ContentKeyPayload {
    const WHAT: &'static str = "content key";
}

impl From<&ContentKey> for ContentKeyPayload {
    fn from(content_key: &ContentKey) -> Self {
        ContentKeyPayload {
            encrypted_aes_key: content_key.enc_aes_key.clone(),
        }
    }
}

/// A payload encrypted for one recipient certificate.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EnvelopePayload {
    pub ephemeral: G1,
    #[serde(with = "Base64Standard")]
    pub payload: Vec<u8>,
}

impl Payload for EnvelopePayload {
    const WHAT: &'static str = "envelope";
}
