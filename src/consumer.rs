//! The consumer side: public parameters, the consumer's own decryption key, and the
//! fetch-validate-decrypt pipeline for protected content.
//!
//! Every step is an `async fn` on a single-threaded runtime. Suspension happens only while waiting
//! on the face or on the validator; the consumer's state is touched between those points only.
use tracing::{debug, error, info};

use crate::abe_support;
use crate::algo::{AbeType, CipherText, ContentKey, PrivateKey, PublicParams};
use crate::api::api_models::{ContentKeyPayload, EncryptedContentPayload, Payload, PublicParamsPayload};
use crate::attribute_authority::{DECRYPT_KEY, PUBLIC_PARAMS};
use crate::config::FetchConfig;
use crate::errors::{Error, Result};
use crate::face::Face;
use crate::fetch::{fetch_segmented, fetch_with_retry, FetchKind};
use crate::name::Name;
use crate::packet::{Data, Request};
use crate::security::{Certificate, KeyChain, TrustConfig, Validator};

#[derive(Debug)]
enum ParamsState {
    Pending,
    Ready {
        abe_type: AbeType,
        public_params: PublicParams,
    },
}

pub struct Consumer<F: Face, V: Validator> {
    cert: Certificate,
    face: F,
    keychain: KeyChain,
    validator: V,
    config: FetchConfig,
    attr_authority_prefix: Name,
    trust_config: TrustConfig,
    params: ParamsState,
    expected_abe_type: Option<AbeType>,
    key_cache: Option<PrivateKey>,
}

impl<F: Face, V: Validator> Consumer<F, V> {
    /// `keychain` must hold the private key behind `identity_cert`. The authority is addressed by
    /// the identity of `authority_cert`, which is also the only signer trusted for its public
    /// parameters.
    ///
    /// Construction sends nothing. The one-shot public-parameter fetch is only recorded as pending:
    /// [`Self::public_params`] is `None` until [`Self::fetch_public_params`] or
    /// [`Self::obtain_decryption_key`] has been awaited, and a successful fetch is never repeated.
    pub fn new(
        face: F,
        keychain: KeyChain,
        validator: V,
        identity_cert: Certificate,
        authority_cert: Certificate,
        config: FetchConfig,
    ) -> Result<Consumer<F, V>> {
        config.validate()?;
        if keychain.certificate(identity_cert.key_name()).is_none() {
            return Err(Error::UnknownKey(identity_cert.key_name().clone()));
        }
        let attr_authority_prefix = authority_cert.identity();
        let mut trust_config = TrustConfig::new();
        trust_config.add_or_update_certificate(authority_cert);

        Ok(Consumer {
            cert: identity_cert,
            face,
            keychain,
            validator,
            config,
            attr_authority_prefix,
            trust_config,
            params: ParamsState::Pending,
            expected_abe_type: None,
            key_cache: None,
        })
    }

    /// Rejects public parameters of any other scheme.
    pub fn expect_abe_type(mut self, abe_type: AbeType) -> Consumer<F, V> {
        self.expected_abe_type = Some(abe_type);
        self
    }

    pub fn certificate(&self) -> &Certificate {
        &self.cert
    }

    pub fn authority_prefix(&self) -> &Name {
        &self.attr_authority_prefix
    }

    pub fn face(&self) -> &F {
        &self.face
    }

    pub fn public_params(&self) -> Option<&PublicParams> {
        match &self.params {
            ParamsState::Ready { public_params, .. } => Some(public_params),
            ParamsState::Pending => None,
        }
    }

    pub fn abe_type(&self) -> Option<AbeType> {
        match &self.params {
            ParamsState::Ready { abe_type, .. } => Some(*abe_type),
            ParamsState::Pending => None,
        }
    }

    pub fn has_decryption_key(&self) -> bool {
        self.key_cache.as_ref().map_or(false, |key| !key.is_empty())
    }

    fn fresh_request(&self, name: Name) -> Request {
        Request::new(name)
            .with_must_be_fresh(true)
            .with_can_be_prefix(true)
            .with_lifetime(self.config.request_lifetime())
    }

    /// Fetches `<authority>/PUBPARAMS` unless it has already been fetched successfully.
    pub async fn fetch_public_params(&mut self) -> Result<()> {
        if let ParamsState::Ready { .. } = self.params {
            return Ok(());
        }

        let request = self.fresh_request(self.attr_authority_prefix.clone().append(PUBLIC_PARAMS));
        info!("Fetching public params {}", request.name);
        let data = fetch_with_retry(
            &self.face,
            &request,
            FetchKind::PublicParams,
            self.config.max_attempts,
        )
        .await?;

        let authority = self
            .trust_config
            .find_certificate(&self.attr_authority_prefix)
            .ok_or_else(|| Error::UnknownIdentity(self.attr_authority_prefix.clone()))?;
        authority
            .verify(&data)
            .map_err(|source| Error::Validation {
                subject: "Public params",
                source,
            })?;

        let payload = PublicParamsPayload::decode(&data.content)?;
        if let Some(expected) = self.expected_abe_type {
            if expected != payload.abe_type {
                return Err(Error::AbeTypeMismatch {
                    expected,
                    actual: payload.abe_type,
                });
            }
        }
        if payload.pub_params.is_empty() {
            return Err(Error::malformed("public params", "empty parameters"));
        }

        info!(
            "Received {} public params ({} bytes)",
            payload.abe_type,
            payload.pub_params.len()
        );
        self.params = ParamsState::Ready {
            abe_type: payload.abe_type,
            public_params: payload.public_params(),
        };
        Ok(())
    }

    /// Fetches this consumer's private key from the authority and caches it, replacing any key
    /// cached earlier. Nothing is cached unless every segment validates and the envelope opens.
    pub async fn obtain_decryption_key(&mut self) -> Result<()> {
        self.fetch_public_params().await?;

        let identity = self.cert.identity();
        let request = self.fresh_request(
            self.attr_authority_prefix
                .clone()
                .append(DECRYPT_KEY)
                .append_name(self.cert.key_name()),
        );
        info!("{} Fetch private key", identity);

        let envelope = fetch_segmented(
            &self.face,
            &self.validator,
            &request,
            FetchKind::DecryptionKey,
            self.config.max_attempts,
        )
        .await
        .map_err(|e| {
            error!("Error occurs in segment fetching: {}", e);
            e
        })?;
        debug!(
            "Segment fetching completed with total fetched size of {}",
            envelope.len()
        );

        let key_bytes = self
            .keychain
            .envelope_decrypt(&envelope, self.cert.key_name())?;
        self.key_cache = Some(PrivateKey::from_bytes(key_bytes));
        info!("{} private key cached", identity);
        Ok(())
    }

    fn decryption_material(&self) -> Option<(AbeType, &PublicParams, &PrivateKey)> {
        let (abe_type, public_params) = match &self.params {
            ParamsState::Ready {
                abe_type,
                public_params,
            } if !public_params.is_empty() => (*abe_type, public_params),
            _ => {
                info!("Public parameters doesn't exist");
                return None;
            }
        };
        match &self.key_cache {
            Some(key) if !key.is_empty() => Some((abe_type, public_params, key)),
            _ => {
                info!("Private decryption key doesn't exist");
                None
            }
        }
    }

    /// True once both the public parameters and a private key are held.
    pub fn ready_for_decryption(&self) -> bool {
        self.decryption_material().is_some()
    }

    /// Fetches and decrypts the object named `data_name`.
    ///
    /// Content may be fetched long after it was published, so the request accepts cached
    /// responses and any name under `data_name`.
    pub async fn consume(&self, data_name: &Name) -> Result<Vec<u8>> {
        let request = Request::new(data_name.clone())
            .with_can_be_prefix(true)
            .with_lifetime(self.config.request_lifetime());
        self.consume_request(request).await
    }

    /// Like [`Self::consume`] with a caller-built request.
    ///
    /// Fails with [`Error::NotReady`] before touching the network when the parameters or the
    /// private key are missing.
    pub async fn consume_request(&self, request: Request) -> Result<Vec<u8>> {
        if !self.ready_for_decryption() {
            return Err(Error::NotReady);
        }

        info!("{} Ask for data {}", self.cert.identity(), request.name);
        let data = fetch_with_retry(
            &self.face,
            &request,
            FetchKind::Data,
            self.config.max_attempts,
        )
        .await?;
        self.validate(&data, "Encrypted data").await?;
        info!("Encrypted data conforms to trust schema");

        self.decrypt_content(&data).await
    }

    async fn validate(&self, data: &Data, subject: &'static str) -> Result<()> {
        self.validator
            .validate(data)
            .await
            .map_err(|source| {
                error!("{} cannot be authenticated: {}", subject, source);
                Error::Validation { subject, source }
            })
    }

    async fn decrypt_content(&self, data: &Data) -> Result<Vec<u8>> {
        info!("{} Get content data {}", self.cert.identity(), data.name);
        let payload = EncryptedContentPayload::decode(&data.content)?;
        info!(
            "Encrypted Content size is {}",
            payload.encrypted_content.len()
        );
        let cipher_text = CipherText {
            content: payload.encrypted_content,
            plain_text_size: payload.plain_text_size,
            content_key: None,
        };

        let ck_name = payload.content_key_name;
        info!("CK Name is {}", ck_name);
        let ck_request = Request::new(ck_name)
            .with_can_be_prefix(true)
            .with_lifetime(self.config.request_lifetime());
        let ck_data = fetch_with_retry(
            &self.face,
            &ck_request,
            FetchKind::ContentKey,
            self.config.max_attempts,
        )
        .await?;
        self.validate(&ck_data, "Fetched content key").await?;
        info!("Content key conforms to trust schema");

        self.on_content_key_data(&ck_data, cipher_text)
    }

    fn on_content_key_data(&self, data: &Data, mut cipher_text: CipherText) -> Result<Vec<u8>> {
        info!("{} Get CKEY data {}", self.cert.identity(), data.name);
        let payload = ContentKeyPayload::decode(&data.content)?;
        cipher_text.content_key = Some(ContentKey {
            enc_aes_key: payload.encrypted_aes_key,
        });
        debug!("Content size : {}", cipher_text.content.len());
        debug!("Plaintext size : {}", cipher_text.plain_text_size);

        let (abe_type, public_params, private_key) =
            self.decryption_material().ok_or(Error::NotReady)?;
        let result = abe_support::decrypt(abe_type, public_params, private_key, &cipher_text)
            .map_err(|e| {
                error!("Decryption of {} failed: {}", data.name, e);
                e
            })?;

        if result.len() as u64 != cipher_text.plain_text_size {
            return Err(Error::PlainTextSizeMismatch {
                declared: cipher_text.plain_text_size,
                actual: result.len(),
            });
        }
        info!("Result length : {}", result.len());
        Ok(result)
    }
}
