use std::collections::HashMap;

use crate::name::Name;
use crate::security::certificate::Certificate;

/// Known certificates, one per identity.
#[derive(Clone, Debug, Default)]
pub struct TrustConfig {
    known_identities: HashMap<Name, Certificate>,
}

impl TrustConfig {
    pub fn new() -> TrustConfig {
        TrustConfig::default()
    }

    /// Inserts the certificate, replacing any earlier one for the same identity.
    pub fn add_or_update_certificate(&mut self, certificate: Certificate) {
        self.known_identities
            .insert(certificate.identity(), certificate);
    }

    pub fn find_certificate(&self, identity: &Name) -> Option<&Certificate> {
        self.known_identities.get(identity)
    }

    pub fn find_by_key_name(&self, key_name: &Name) -> Option<&Certificate> {
        key_name
            .key_identity()
            .and_then(|identity| self.known_identities.get(&identity))
            .filter(|certificate| certificate.key_name() == key_name)
    }

    pub fn len(&self) -> usize {
        self.known_identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known_identities.is_empty()
    }
}
