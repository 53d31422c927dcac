//! Request, response and negative-acknowledgment packets.
use std::fmt::{Display, Formatter};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::api::Base64Standard;
use crate::errors::Result;
use crate::name::Name;

pub const DEFAULT_LIFETIME: Duration = Duration::from_millis(4000);

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Request {
    pub name: Name,
    /// Cached responses must not satisfy the request.
    pub must_be_fresh: bool,
    /// Any response whose name starts with `name` satisfies the request.
    pub can_be_prefix: bool,
    pub lifetime: Duration,
}

impl Request {
    pub fn new(name: Name) -> Request {
        Request {
            name,
            must_be_fresh: false,
            can_be_prefix: false,
            lifetime: DEFAULT_LIFETIME,
        }
    }

    pub fn with_must_be_fresh(mut self, must_be_fresh: bool) -> Request {
        self.must_be_fresh = must_be_fresh;
        self
    }

    pub fn with_can_be_prefix(mut self, can_be_prefix: bool) -> Request {
        self.can_be_prefix = can_be_prefix;
        self
    }

    pub fn with_lifetime(mut self, lifetime: Duration) -> Request {
        self.lifetime = lifetime;
        self
    }

    pub fn matches(&self, data: &Data) -> bool {
        if self.can_be_prefix {
            self.name.is_prefix_of(&data.name)
        } else {
            self.name == data.name
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SignatureInfo {
    pub key_locator: Name,
    #[serde(with = "Base64Standard")]
    pub value: Vec<u8>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Data {
    pub name: Name,
    #[serde(with = "Base64Standard")]
    pub content: Vec<u8>,
    /// Index of the last segment when the object is segmented.
    pub final_block: Option<u64>,
    pub signature: Option<SignatureInfo>,
}

impl Data {
    pub fn new(name: Name, content: Vec<u8>) -> Data {
        Data {
            name,
            content,
            final_block: None,
            signature: None,
        }
    }

    pub fn with_final_block(mut self, final_block: u64) -> Data {
        self.final_block = Some(final_block);
        self
    }

    pub fn key_locator(&self) -> Option<&Name> {
        self.signature.as_ref().map(|s| &s.key_locator)
    }

    /// Bytes covered by the signature: everything except the signature value itself.
    pub fn signed_portion(&self, key_locator: &Name) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&(
            &self.name,
            &self.content,
            &self.final_block,
            key_locator,
        ))?)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum NackReason {
    Congestion,
    Duplicate,
    NoRoute,
    /// The responder declined to answer.
    Refused(String),
}

impl Display for NackReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            NackReason::Congestion => write!(f, "Congestion"),
            NackReason::Duplicate => write!(f, "Duplicate"),
            NackReason::NoRoute => write!(f, "NoRoute"),
            NackReason::Refused(reason) => write!(f, "Refused ({})", reason),
        }
    }
}

/// What came back for one expressed request.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Data(Data),
    Nack(NackReason),
    Timeout,
}
