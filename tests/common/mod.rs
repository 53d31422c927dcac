#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use ndn_abe::abe_support;
use ndn_abe::algo::{AttributeSet, CipherText, Policy, PublicParams};
use ndn_abe::api::api_models::{ContentKeyPayload, EncryptedContentPayload, Payload};
use ndn_abe::attribute_authority::{CpAttributeAuthority, KpAttributeAuthority};
use ndn_abe::config::{AuthorityConfig, FetchConfig};
use ndn_abe::consumer::Consumer;
use ndn_abe::face::InMemoryFace;
use ndn_abe::name::Name;
use ndn_abe::packet::Data;
use ndn_abe::security::{Certificate, KeyChain, TrustSchemaValidator, Validator};

pub const UNIVERSE: [&str; 4] = ["doctor", "nurse", "cardiology", "admin"];
pub const CONTENT: &str = "/producer/content";
pub const CONTENT_KEY: &str = "/producer/CK/1";

pub fn attributes(names: &[&str]) -> AttributeSet {
    names.iter().map(|a| a.to_string()).collect()
}

/// One simulated network with an authority, a producer and a consumer identity.
pub struct Deployment {
    pub face: InMemoryFace,
    pub aa_cert: Certificate,
    pub public_params: PublicParams,
    pub producer_keychain: KeyChain,
    pub producer_cert: Certificate,
    pub consumer_cert: Certificate,
    consumer_keychain: Option<KeyChain>,
}

fn identities() -> (KeyChain, Certificate, KeyChain, Certificate, KeyChain, Certificate) {
    let mut aa_keychain = KeyChain::new();
    let aa_cert = aa_keychain.create_identity(&Name::from("/aa"));
    let mut consumer_keychain = KeyChain::new();
    let consumer_cert = consumer_keychain.create_identity(&Name::from("/org/alice"));
    let mut producer_keychain = KeyChain::new();
    let producer_cert = producer_keychain.create_identity(&Name::from("/producer"));
    (
        aa_keychain,
        aa_cert,
        consumer_keychain,
        consumer_cert,
        producer_keychain,
        producer_cert,
    )
}

pub fn config(max_segment_size: usize) -> AuthorityConfig {
    let mut config = AuthorityConfig::new(UNIVERSE);
    config.max_segment_size = max_segment_size;
    config
}

/// CP deployment; the consumer is not registered with the authority yet.
pub fn cp_deployment(config: &AuthorityConfig) -> (Deployment, Rc<RefCell<CpAttributeAuthority>>) {
    let face = InMemoryFace::new();
    let (aa_keychain, aa_cert, consumer_keychain, consumer_cert, producer_keychain, producer_cert) =
        identities();
    let authority = CpAttributeAuthority::new(aa_cert.clone(), aa_keychain, config).unwrap();
    let public_params = authority.public_params().clone();
    let authority = authority.register_on(&face);
    (
        Deployment {
            face,
            aa_cert,
            public_params,
            producer_keychain,
            producer_cert,
            consumer_cert,
            consumer_keychain: Some(consumer_keychain),
        },
        authority,
    )
}

pub fn kp_deployment(config: &AuthorityConfig) -> (Deployment, Rc<RefCell<KpAttributeAuthority>>) {
    let face = InMemoryFace::new();
    let (aa_keychain, aa_cert, consumer_keychain, consumer_cert, producer_keychain, producer_cert) =
        identities();
    let authority = KpAttributeAuthority::new(aa_cert.clone(), aa_keychain, config).unwrap();
    let public_params = authority.public_params().clone();
    let authority = authority.register_on(&face);
    (
        Deployment {
            face,
            aa_cert,
            public_params,
            producer_keychain,
            producer_cert,
            consumer_cert,
            consumer_keychain: Some(consumer_keychain),
        },
        authority,
    )
}

impl Deployment {
    /// Trusts the authority and the producer.
    pub fn validator(&self) -> TrustSchemaValidator {
        let mut validator = TrustSchemaValidator::default();
        validator.add_anchor(self.aa_cert.clone());
        validator.add_anchor(self.producer_cert.clone());
        validator
    }

    pub fn consumer(&mut self) -> Consumer<InMemoryFace, TrustSchemaValidator> {
        let validator = self.validator();
        self.consumer_with_validator(validator)
    }

    pub fn consumer_with_validator<V: Validator>(&mut self, validator: V) -> Consumer<InMemoryFace, V> {
        let keychain = self
            .consumer_keychain
            .take()
            .expect("consumer already built");
        Consumer::new(
            self.face.clone(),
            keychain,
            validator,
            self.consumer_cert.clone(),
            self.aa_cert.clone(),
            FetchConfig::default(),
        )
        .unwrap()
    }

    pub fn cp_encrypt(&self, policy: &str, message: &[u8]) -> CipherText {
        abe_support::cp_encrypt(&self.public_params, &Policy::from(policy), message).unwrap()
    }

    pub fn kp_encrypt(&self, labels: &[&str], message: &[u8]) -> CipherText {
        abe_support::kp_encrypt(&self.public_params, &attributes(labels), message).unwrap()
    }

    pub fn publish_signed(&self, name: &str, content: Vec<u8>) {
        let mut data = Data::new(Name::from(name), content);
        self.producer_keychain
            .sign(&mut data, self.producer_cert.key_name())
            .unwrap();
        self.face.publish(data);
    }

    pub fn publish_content(&self, name: &str, ck_name: &str, cipher_text: &CipherText) {
        let payload = EncryptedContentPayload::new(cipher_text, Name::from(ck_name));
        self.publish_signed(name, payload.encode().unwrap());
    }

    pub fn publish_content_key(&self, ck_name: &str, cipher_text: &CipherText) {
        let payload = ContentKeyPayload::from(cipher_text.content_key.as_ref().unwrap());
        self.publish_signed(ck_name, payload.encode().unwrap());
    }

    /// Publishes the content object and its content key under the default names.
    pub fn publish(&self, cipher_text: &CipherText) {
        self.publish_content(CONTENT, CONTENT_KEY, cipher_text);
        self.publish_content_key(CONTENT_KEY, cipher_text);
    }

    pub fn sent_names(&self) -> Vec<String> {
        self.face
            .sent_requests()
            .iter()
            .map(|r| r.name.to_string())
            .collect()
    }
}
