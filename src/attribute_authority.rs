//! The attribute authority.
//!
//! Serves two request types under its identity prefix:
//!
//! * `<prefix>/PUBPARAMS`: the scheme's public parameters, signed.
//! * `<prefix>/DKEY/<key name>[/seg=<n>]`: the private key of the identity owning `<key name>`,
//!   derived from that identity's registered policy, envelope-encrypted for its certificate and
//!   delivered as signed segments of at most `max_segment_size` bytes.
//!
//! Policy registration and certificate registration are separate steps. An identity may be given a
//! policy before its certificate is known; the missing certificate is only reported when a key is
//! requested for it.
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::Debug;
use std::marker::PhantomData;
use std::rc::Rc;

use tracing::{debug, info, warn};

use crate::abe_support;
use crate::algo::{AbeType, AttributeSet, MasterKey, Policy, PrivateKey, PublicParams};
use crate::api::api_models::{Payload, PublicParamsPayload};
use crate::config::AuthorityConfig;
use crate::errors::{AbeError, Error, Result};
use crate::face::{Face, RequestHandler};
use crate::name::Name;
use crate::packet::{Data, Request};
use crate::security::{Certificate, KeyChain, TrustConfig};

pub const PUBLIC_PARAMS: &str = "PUBPARAMS";
pub const DECRYPT_KEY: &str = "DKEY";

/// What an authority stores per identity and how it turns that into a private key.
pub trait PolicyModel {
    type Token: Clone + Debug + PartialEq;

    const ABE_TYPE: AbeType;

    fn keygen(
        public_params: &PublicParams,
        master_key: &MasterKey,
        token: &Self::Token,
    ) -> Result<PrivateKey, AbeError>;
}

/// Ciphertext-policy: identities hold attribute sets.
#[derive(Debug)]
pub struct CpPolicy;

impl PolicyModel for CpPolicy {
    type Token = AttributeSet;

    const ABE_TYPE: AbeType = AbeType::CpAbe;

    fn keygen(
        public_params: &PublicParams,
        master_key: &MasterKey,
        attributes: &AttributeSet,
    ) -> Result<PrivateKey, AbeError> {
        abe_support::cp_keygen(public_params, master_key, attributes)
    }
}

/// Key-policy: identities hold access formulas.
#[derive(Debug)]
pub struct KpPolicy;

impl PolicyModel for KpPolicy {
    type Token = Policy;

    const ABE_TYPE: AbeType = AbeType::KpAbe;

    fn keygen(
        public_params: &PublicParams,
        master_key: &MasterKey,
        policy: &Policy,
    ) -> Result<PrivateKey, AbeError> {
        abe_support::kp_keygen(public_params, master_key, policy)
    }
}

pub type CpAttributeAuthority = AttributeAuthority<CpPolicy>;
pub type KpAttributeAuthority = AttributeAuthority<KpPolicy>;

pub struct AttributeAuthority<M: PolicyModel> {
    cert: Certificate,
    keychain: KeyChain,
    trust_config: TrustConfig,
    max_segment_size: usize,
    segment_map: HashMap<Name, Vec<Data>>,
    public_params: PublicParams,
    master_key: MasterKey,
    tokens: HashMap<Name, M::Token>,
    _model: PhantomData<M>,
}

impl<M: PolicyModel> AttributeAuthority<M> {
    /// Runs the scheme setup over `config.attributes`. `keychain` must hold the private key of
    /// `cert`, every response is signed with it.
    pub fn new(
        cert: Certificate,
        keychain: KeyChain,
        config: &AuthorityConfig,
    ) -> Result<AttributeAuthority<M>> {
        config.validate()?;
        if keychain.certificate(cert.key_name()).is_none() {
            return Err(Error::UnknownKey(cert.key_name().clone()));
        }
        let (public_params, master_key) = abe_support::setup(&config.attributes)?;
        info!(
            "{} authority {} ready with {} attributes",
            M::ABE_TYPE,
            cert.identity(),
            config.attributes.len()
        );

        Ok(AttributeAuthority {
            cert,
            keychain,
            trust_config: TrustConfig::new(),
            max_segment_size: config.max_segment_size,
            segment_map: HashMap::new(),
            public_params,
            master_key,
            tokens: HashMap::new(),
            _model: PhantomData,
        })
    }

    /// Registers the authority's prefix on `face` and returns the shared handle the face serves
    /// requests through.
    pub fn register_on<F: Face + ?Sized>(self, face: &F) -> Rc<RefCell<Self>>
    where
        M: 'static,
    {
        let prefix = self.prefix();
        let authority = Rc::new(RefCell::new(self));
        face.register_prefix(prefix, authority.clone());
        authority
    }

    pub fn prefix(&self) -> Name {
        self.cert.identity()
    }

    pub fn abe_type(&self) -> AbeType {
        M::ABE_TYPE
    }

    pub fn public_params(&self) -> &PublicParams {
        &self.public_params
    }

    pub fn certificate(&self) -> &Certificate {
        &self.cert
    }

    pub fn trust_config(&self) -> &TrustConfig {
        &self.trust_config
    }

    /// Segments prepared for `object_name`, if a key was issued under it.
    pub fn cached_segments(&self, object_name: &Name) -> Option<&[Data]> {
        self.segment_map.get(object_name).map(Vec::as_slice)
    }

    pub fn policy(&self, identity: &Name) -> Option<&M::Token> {
        self.tokens.get(identity)
    }

    /// Derives a fresh private key from the identity's current policy.
    pub fn get_private_key(&self, identity: &Name) -> Result<PrivateKey> {
        let token = self
            .tokens
            .get(identity)
            .ok_or_else(|| Error::PolicyNotFound(identity.clone()))?;
        Ok(M::keygen(&self.public_params, &self.master_key, token)?)
    }

    fn insert_policy(&mut self, certificate: Certificate, token: M::Token) {
        let identity = certificate.identity();
        self.trust_config.add_or_update_certificate(certificate);
        self.insert_policy_for_identity(identity, token);
    }

    fn insert_policy_for_identity(&mut self, identity: Name, token: M::Token) {
        info!("Registered policy {:?} for {}", token, identity);
        self.tokens.insert(identity, token);
    }

    pub fn on_public_params_request(&self, request: &Request) -> Result<Data> {
        debug!("Serving public params for {}", request.name);
        let payload = PublicParamsPayload {
            abe_type: M::ABE_TYPE,
            pub_params: self.public_params.pub_params.clone(),
        };
        let mut data = Data::new(
            self.prefix().append(PUBLIC_PARAMS),
            payload.encode()?,
        );
        self.keychain.sign(&mut data, self.cert.key_name())?;
        Ok(data)
    }

    /// Answers `<prefix>/DKEY/<key name>[/seg=<n>]`.
    ///
    /// A request without a segment number always issues a fresh key and replaces the cached
    /// segments, so that a changed policy takes effect. A numbered request is served from the
    /// cache when possible.
    pub fn on_decryption_key_request(&mut self, request: &Request) -> Result<Data> {
        let object_name = request.name.without_segment();
        let key_name = object_name.sub_name(self.prefix().len() + 1);
        let identity = key_name
            .key_identity()
            .ok_or_else(|| Error::malformed("key name", format!("{} names no key", key_name)))?;
        let requested = request.name.segment();
        info!("Decryption key request for {} ({:?})", identity, requested);

        if let (Some(number), Some(segments)) = (requested, self.segment_map.get(&object_name)) {
            return select_segment(segments, number, &object_name);
        }

        let segments = self.generate_decryption_key_segments(&object_name, &identity)?;
        let reply = select_segment(&segments, requested.unwrap_or(0), &object_name);
        self.segment_map.insert(object_name, segments);
        reply
    }

    fn generate_decryption_key_segments(
        &self,
        object_name: &Name,
        identity: &Name,
    ) -> Result<Vec<Data>> {
        let private_key = self.get_private_key(identity)?;
        let certificate = self
            .trust_config
            .find_certificate(identity)
            .ok_or_else(|| Error::UnknownIdentity(identity.clone()))?;
        let envelope = KeyChain::envelope_encrypt(private_key.as_bytes(), certificate)?;

        let chunks: Vec<&[u8]> = envelope.chunks(self.max_segment_size).collect();
        let final_block = chunks.len() as u64 - 1;
        let mut segments = Vec::with_capacity(chunks.len());
        for (number, chunk) in chunks.into_iter().enumerate() {
            let mut segment = Data::new(
                object_name.clone().append_segment(number as u64),
                chunk.to_vec(),
            )
            .with_final_block(final_block);
            self.keychain.sign(&mut segment, self.cert.key_name())?;
            segments.push(segment);
        }
        debug!(
            "Prepared {} segments ({} bytes) for {}",
            segments.len(),
            envelope.len(),
            object_name
        );
        Ok(segments)
    }
}

fn select_segment(segments: &[Data], number: u64, object_name: &Name) -> Result<Data> {
    usize::try_from(number)
        .ok()
        .and_then(|index| segments.get(index))
        .cloned()
        .ok_or_else(|| {
            Error::malformed(
                "segment request",
                format!("{} has no segment {}", object_name, number),
            )
        })
}

impl AttributeAuthority<CpPolicy> {
    /// Trusts `certificate` and grants its identity `attributes`, replacing any earlier grant.
    pub fn add_new_policy<I, S>(&mut self, certificate: Certificate, attributes: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let attributes = attributes.into_iter().map(Into::into).collect();
        self.insert_policy(certificate, attributes);
    }

    /// Like [`Self::add_new_policy`] for an identity whose certificate is registered separately.
    pub fn add_new_policy_for_identity<I, S>(&mut self, identity: &Name, attributes: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let attributes = attributes.into_iter().map(Into::into).collect();
        self.insert_policy_for_identity(identity.clone(), attributes);
    }
}

impl AttributeAuthority<KpPolicy> {
    pub fn add_new_policy(&mut self, certificate: Certificate, policy: impl Into<Policy>) {
        self.insert_policy(certificate, policy.into());
    }

    pub fn add_new_policy_for_identity(&mut self, identity: &Name, policy: impl Into<Policy>) {
        self.insert_policy_for_identity(identity.clone(), policy.into());
    }
}

impl<M: PolicyModel> AttributeAuthority<M> {
    /// Makes `certificate` known without touching any policy.
    pub fn add_certificate(&mut self, certificate: Certificate) {
        self.trust_config.add_or_update_certificate(certificate);
    }
}

impl<M: PolicyModel> RequestHandler for AttributeAuthority<M> {
    fn on_request(&mut self, request: &Request) -> Result<Option<Data>> {
        let prefix = self.prefix();
        let reply = if request.name == prefix.clone().append(PUBLIC_PARAMS) {
            self.on_public_params_request(request)
        } else if prefix.append(DECRYPT_KEY).is_prefix_of(&request.name) {
            self.on_decryption_key_request(request)
        } else {
            debug!("Ignoring {}", request.name);
            return Ok(None);
        };

        match reply {
            Ok(data) => Ok(Some(data)),
            Err(e) => {
                warn!("Cannot answer {}: {}", request.name, e);
                Err(e)
            }
        }
    }
}
