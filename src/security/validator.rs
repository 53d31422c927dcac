use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::name::Name;
use crate::packet::Data;
use crate::security::certificate::Certificate;
use crate::security::trust_config::TrustConfig;

#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum ValidationError {
    #[error("{0} carries no signature")]
    Unsigned(Name),
    #[error("signing key {0} is not trusted")]
    UnknownSigner(Name),
    #[error("signature on {0} does not verify")]
    BadSignature(Name),
    #[error("{signer} is not authorized to sign {data}")]
    PolicyViolation { data: Name, signer: Name },
}

/// Decides asynchronously whether a fetched object may be trusted.
#[async_trait(?Send)]
pub trait Validator {
    async fn validate(&self, data: &Data) -> Result<(), ValidationError>;
}

/// Allows data under `data_prefix` to be signed by any identity under `signer_prefix`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TrustRule {
    pub data_prefix: Name,
    pub signer_prefix: Name,
}

/// Checks signatures against a set of trust anchors and a simple hierarchical trust schema.
///
/// A signer is always authorized for names under its own identity; further rules widen that.
#[derive(Clone, Debug, Default)]
pub struct TrustSchemaValidator {
    anchors: TrustConfig,
    rules: Vec<TrustRule>,
}

impl TrustSchemaValidator {
    pub fn new(anchors: TrustConfig) -> TrustSchemaValidator {
        TrustSchemaValidator {
            anchors,
            rules: Vec::new(),
        }
    }

    pub fn with_rule(mut self, data_prefix: Name, signer_prefix: Name) -> TrustSchemaValidator {
        self.rules.push(TrustRule {
            data_prefix,
            signer_prefix,
        });
        self
    }

    pub fn add_anchor(&mut self, certificate: Certificate) {
        self.anchors.add_or_update_certificate(certificate);
    }

    pub fn anchors(&self) -> &TrustConfig {
        &self.anchors
    }

    fn is_authorized(&self, data_name: &Name, signer: &Name) -> bool {
        signer.is_prefix_of(data_name)
            || self.rules.iter().any(|rule| {
                rule.data_prefix.is_prefix_of(data_name) && rule.signer_prefix.is_prefix_of(signer)
            })
    }
}

#[async_trait(?Send)]
impl Validator for TrustSchemaValidator {
    async fn validate(&self, data: &Data) -> Result<(), ValidationError> {
        let key_locator = data
            .key_locator()
            .ok_or_else(|| ValidationError::Unsigned(data.name.clone()))?;
        let certificate = self
            .anchors
            .find_by_key_name(key_locator)
            .ok_or_else(|| ValidationError::UnknownSigner(key_locator.clone()))?;
        certificate.verify(data)?;

        let signer = certificate.identity();
        if !self.is_authorized(&data.name, &signer) {
            return Err(ValidationError::PolicyViolation {
                data: data.name.clone(),
                signer,
            });
        }
        debug!("{} conforms to trust schema", data.name);
        Ok(())
    }
}

/// Accepts everything. Only for tests and local experiments.
#[derive(Clone, Copy, Debug, Default)]
pub struct AcceptAllValidator;

#[async_trait(?Send)]
impl Validator for AcceptAllValidator {
    async fn validate(&self, _data: &Data) -> Result<(), ValidationError> {
        Ok(())
    }
}
