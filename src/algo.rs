//! Opaque key material and ciphertext containers exchanged between the authority, producers and
//! consumers.
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Which attribute-based scheme a deployment uses.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum AbeType {
    #[serde(rename = "CP-ABE")]
    CpAbe,
    #[serde(rename = "KP-ABE")]
    KpAbe,
}

impl Display for AbeType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AbeType::CpAbe => write!(f, "CP-ABE"),
            AbeType::KpAbe => write!(f, "KP-ABE"),
        }
    }
}

/// Attributes granted to one identity under the ciphertext-policy scheme.
pub type AttributeSet = BTreeSet<String>;

/// Access formula granted to one identity under the key-policy scheme, e.g. `(A&B)|C`.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct Policy(String);

impl Policy {
    pub fn new(formula: impl Into<String>) -> Policy {
        Policy(formula.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Policy {
    fn from(formula: &str) -> Self {
        Policy::new(formula)
    }
}

impl Display for Policy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PublicParams {
    pub pub_params: Vec<u8>,
}

impl PublicParams {
    pub fn is_empty(&self) -> bool {
        self.pub_params.is_empty()
    }
}

#[derive(Clone, Default, Eq, PartialEq)]
pub struct MasterKey {
    pub master_key: Vec<u8>,
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterKey")
            .field("len", &self.master_key.len())
            .finish()
    }
}

#[derive(Clone, Default, Eq, PartialEq)]
pub struct PrivateKey {
    pub prv: Vec<u8>,
}

impl PrivateKey {
    pub fn from_bytes(prv: Vec<u8>) -> PrivateKey {
        PrivateKey { prv }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.prv
    }

    pub fn is_empty(&self) -> bool {
        self.prv.is_empty()
    }
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateKey")
            .field("len", &self.prv.len())
            .finish()
    }
}

/// A symmetric content key protected by the attribute-based scheme.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ContentKey {
    pub enc_aes_key: Vec<u8>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CipherText {
    pub content: Vec<u8>,
    /// Declared by the producer.
    pub plain_text_size: u64,
    pub content_key: Option<ContentKey>,
}
