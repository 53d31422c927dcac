mod common;

use ndn_abe::api::api_models::{EncryptedContentPayload, Payload};
use ndn_abe::errors::{Error, ErrorKind};
use ndn_abe::face::Fault;
use ndn_abe::fetch::FetchKind;
use ndn_abe::name::Name;
use ndn_abe::packet::{Data, NackReason, Request};
use ndn_abe::security::{KeyChain, TrustSchemaValidator};

use common::{config, cp_deployment, kp_deployment, CONTENT, CONTENT_KEY};

const MESSAGE: &[u8] = b"Hello World!";

#[tokio::test]
async fn test_cp_end_to_end() {
    let (mut deployment, authority) = cp_deployment(&config(1500));
    authority
        .borrow_mut()
        .add_new_policy(deployment.consumer_cert.clone(), ["doctor", "cardiology"]);
    deployment.publish(&deployment.cp_encrypt("doctor&(cardiology|admin)", MESSAGE));

    let mut consumer = deployment.consumer();
    consumer.obtain_decryption_key().await.unwrap();
    assert!(consumer.ready_for_decryption());

    let plaintext = consumer.consume(&Name::from(CONTENT)).await.unwrap();
    assert_eq!(plaintext, MESSAGE);

    let names = deployment.sent_names();
    assert_eq!(names[0], "/aa/PUBPARAMS");
    assert!(names[1].starts_with("/aa/DKEY/org/alice/KEY/"));
    assert_eq!(&names[names.len() - 2..], &[CONTENT, CONTENT_KEY]);
}

#[tokio::test]
async fn test_kp_end_to_end() {
    let (mut deployment, authority) = kp_deployment(&config(1500));
    authority
        .borrow_mut()
        .add_new_policy(deployment.consumer_cert.clone(), "nurse|(doctor&admin)");
    deployment.publish(&deployment.kp_encrypt(&["doctor", "admin"], MESSAGE));

    let mut consumer = deployment.consumer();
    consumer.obtain_decryption_key().await.unwrap();
    assert_eq!(consumer.abe_type(), Some(ndn_abe::algo::AbeType::KpAbe));

    let plaintext = consumer.consume(&Name::from(CONTENT)).await.unwrap();
    assert_eq!(plaintext, MESSAGE);
}

#[tokio::test]
async fn test_key_delivered_in_many_segments() {
    let (mut deployment, authority) = cp_deployment(&config(100));
    authority
        .borrow_mut()
        .add_new_policy(deployment.consumer_cert.clone(), ["doctor"]);
    deployment.publish(&deployment.cp_encrypt("doctor", MESSAGE));

    let mut consumer = deployment.consumer();
    consumer.obtain_decryption_key().await.unwrap();

    let key_requests: Vec<String> = deployment
        .sent_names()
        .into_iter()
        .filter(|n| n.starts_with("/aa/DKEY"))
        .collect();
    assert!(key_requests.len() > 2);
    for (number, name) in key_requests.iter().enumerate().skip(1) {
        assert!(name.ends_with(&format!("/seg={}", number)));
    }

    assert_eq!(consumer.consume(&Name::from(CONTENT)).await.unwrap(), MESSAGE);
}

#[tokio::test]
async fn test_consume_before_ready_has_no_network_activity() {
    let (mut deployment, authority) = cp_deployment(&config(1500));
    authority
        .borrow_mut()
        .add_new_policy(deployment.consumer_cert.clone(), ["doctor"]);
    deployment.publish(&deployment.cp_encrypt("doctor", MESSAGE));

    let mut consumer = deployment.consumer();
    let error = consumer.consume(&Name::from(CONTENT)).await.unwrap_err();
    assert!(matches!(error, Error::NotReady));
    assert!(deployment.face.sent_requests().is_empty());

    consumer.fetch_public_params().await.unwrap();
    deployment.face.clear_sent_requests();
    let error = consumer.consume(&Name::from(CONTENT)).await.unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Usage);
    assert!(deployment.face.sent_requests().is_empty());
}

#[tokio::test]
async fn test_forged_content_never_reaches_decryption() {
    let (mut deployment, authority) = cp_deployment(&config(1500));
    authority
        .borrow_mut()
        .add_new_policy(deployment.consumer_cert.clone(), ["doctor"]);
    let cipher_text = deployment.cp_encrypt("doctor", MESSAGE);
    deployment.publish_content_key(CONTENT_KEY, &cipher_text);

    let mut impostor = KeyChain::new();
    let impostor_cert = impostor.create_identity(&Name::from("/producer"));
    let payload = EncryptedContentPayload::new(&cipher_text, Name::from(CONTENT_KEY));
    let mut forged = Data::new(Name::from(CONTENT), payload.encode().unwrap());
    impostor.sign(&mut forged, impostor_cert.key_name()).unwrap();
    deployment.face.publish(forged);

    let mut consumer = deployment.consumer();
    consumer.obtain_decryption_key().await.unwrap();
    deployment.face.clear_sent_requests();

    let error = consumer.consume(&Name::from(CONTENT)).await.unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Trust);
    assert!(error
        .to_string()
        .starts_with("Encrypted data cannot be authenticated"));
    // the content key is never asked for
    assert_eq!(deployment.sent_names(), vec![CONTENT]);
}

#[tokio::test]
async fn test_unsigned_content_key_is_rejected() {
    let (mut deployment, authority) = cp_deployment(&config(1500));
    authority
        .borrow_mut()
        .add_new_policy(deployment.consumer_cert.clone(), ["doctor"]);
    let cipher_text = deployment.cp_encrypt("doctor", MESSAGE);
    deployment.publish_content(CONTENT, CONTENT_KEY, &cipher_text);
    deployment.face.publish(Data::new(Name::from(CONTENT_KEY), b"{}".to_vec()));

    let mut consumer = deployment.consumer();
    consumer.obtain_decryption_key().await.unwrap();

    let error = consumer.consume(&Name::from(CONTENT)).await.unwrap_err();
    assert!(matches!(
        error,
        Error::Validation {
            subject: "Fetched content key",
            ..
        }
    ));
}

#[tokio::test]
async fn test_content_fetch_retries_timeouts() {
    let (mut deployment, authority) = cp_deployment(&config(1500));
    authority
        .borrow_mut()
        .add_new_policy(deployment.consumer_cert.clone(), ["doctor"]);
    deployment.publish(&deployment.cp_encrypt("doctor", MESSAGE));

    let mut consumer = deployment.consumer();
    consumer.obtain_decryption_key().await.unwrap();

    deployment.face.clear_sent_requests();
    deployment.face.inject(Fault::Timeout);
    deployment.face.inject(Fault::Timeout);
    assert_eq!(consumer.consume(&Name::from(CONTENT)).await.unwrap(), MESSAGE);
    assert_eq!(
        deployment.sent_names(),
        vec![CONTENT, CONTENT, CONTENT, CONTENT_KEY]
    );

    deployment.face.clear_sent_requests();
    for _ in 0..3 {
        deployment.face.inject(Fault::Timeout);
    }
    let error = consumer.consume(&Name::from(CONTENT)).await.unwrap_err();
    assert_eq!(error.to_string(), "Timeout for /producer/content data fetch");
    assert!(error.is_retryable());
    assert_eq!(deployment.face.sent_requests().len(), 3);
}

#[tokio::test]
async fn test_nack_is_reported_immediately() {
    let (mut deployment, authority) = cp_deployment(&config(1500));
    authority
        .borrow_mut()
        .add_new_policy(deployment.consumer_cert.clone(), ["doctor"]);
    deployment.publish(&deployment.cp_encrypt("doctor", MESSAGE));

    let mut consumer = deployment.consumer();
    consumer.obtain_decryption_key().await.unwrap();

    deployment.face.clear_sent_requests();
    deployment.face.inject(Fault::Nack(NackReason::Congestion));
    let error = consumer.consume(&Name::from(CONTENT)).await.unwrap_err();
    assert_eq!(
        error.to_string(),
        "Nack for /producer/content data fetch with reason Congestion"
    );
    assert_eq!(deployment.face.sent_requests().len(), 1);
}

#[tokio::test]
async fn test_missing_content_key() {
    let (mut deployment, authority) = cp_deployment(&config(1500));
    authority
        .borrow_mut()
        .add_new_policy(deployment.consumer_cert.clone(), ["doctor"]);
    let cipher_text = deployment.cp_encrypt("doctor", MESSAGE);
    deployment.publish_content(CONTENT, CONTENT_KEY, &cipher_text);

    let mut consumer = deployment.consumer();
    consumer.obtain_decryption_key().await.unwrap();

    match consumer.consume(&Name::from(CONTENT)).await {
        Err(Error::Nack { name, kind, reason }) => {
            assert_eq!(name, Name::from(CONTENT_KEY));
            assert_eq!(kind, FetchKind::ContentKey);
            assert_eq!(reason, NackReason::NoRoute);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn test_unsatisfied_policy_is_a_crypto_error() {
    let (mut deployment, authority) = cp_deployment(&config(1500));
    authority
        .borrow_mut()
        .add_new_policy(deployment.consumer_cert.clone(), ["nurse"]);
    deployment.publish(&deployment.cp_encrypt("doctor&cardiology", MESSAGE));

    let mut consumer = deployment.consumer();
    consumer.obtain_decryption_key().await.unwrap();
    deployment.face.clear_sent_requests();

    let error = consumer.consume(&Name::from(CONTENT)).await.unwrap_err();
    assert!(matches!(error, Error::Abe(_)));
    assert_eq!(error.kind(), ErrorKind::Crypto);
    assert_eq!(deployment.sent_names(), vec![CONTENT, CONTENT_KEY]);
}

#[tokio::test]
async fn test_declared_size_is_checked() {
    let (mut deployment, authority) = cp_deployment(&config(1500));
    authority
        .borrow_mut()
        .add_new_policy(deployment.consumer_cert.clone(), ["doctor"]);
    let mut cipher_text = deployment.cp_encrypt("doctor", MESSAGE);
    cipher_text.plain_text_size += 1;
    deployment.publish(&cipher_text);

    let mut consumer = deployment.consumer();
    consumer.obtain_decryption_key().await.unwrap();

    let error = consumer.consume(&Name::from(CONTENT)).await.unwrap_err();
    assert!(matches!(
        error,
        Error::PlainTextSizeMismatch {
            declared: 13,
            actual: 12
        }
    ));
}

#[tokio::test]
async fn test_key_request_without_policy_is_refused() {
    let (mut deployment, authority) = cp_deployment(&config(1500));
    authority
        .borrow_mut()
        .add_certificate(deployment.consumer_cert.clone());

    let mut consumer = deployment.consumer();
    let error = consumer.obtain_decryption_key().await.unwrap_err();
    match &error {
        Error::Nack {
            kind: FetchKind::DecryptionKey,
            reason: NackReason::Refused(message),
            ..
        } => assert!(message.starts_with("No policy registered for identity /org/alice")),
        other => panic!("unexpected {:?}", other),
    }
    assert!(!consumer.has_decryption_key());

    let object = key_object_name(&deployment);
    assert!(authority.borrow().cached_segments(&object).is_none());
}

fn key_object_name(deployment: &common::Deployment) -> Name {
    Name::from("/aa/DKEY").append_name(deployment.consumer_cert.key_name())
}

#[tokio::test]
async fn test_two_phase_registration() {
    let (mut deployment, authority) = cp_deployment(&config(1500));
    let identity = deployment.consumer_cert.identity();
    authority
        .borrow_mut()
        .add_new_policy_for_identity(&identity, ["doctor"]);
    deployment.publish(&deployment.cp_encrypt("doctor", MESSAGE));

    let mut consumer = deployment.consumer();
    let error = consumer.obtain_decryption_key().await.unwrap_err();
    assert!(matches!(
        error,
        Error::Nack {
            reason: NackReason::Refused(ref message),
            ..
        } if message.contains("unknown")
    ));

    authority
        .borrow_mut()
        .add_certificate(deployment.consumer_cert.clone());
    consumer.obtain_decryption_key().await.unwrap();
    assert_eq!(consumer.consume(&Name::from(CONTENT)).await.unwrap(), MESSAGE);
}

#[tokio::test]
async fn test_policy_update_replaces_key() {
    let (mut deployment, authority) = cp_deployment(&config(1500));
    authority
        .borrow_mut()
        .add_new_policy(deployment.consumer_cert.clone(), ["doctor"]);
    deployment.publish_content("/producer/doctors", "/producer/CK/doctors", &{
        let cipher_text = deployment.cp_encrypt("doctor", b"for doctors");
        deployment.publish_content_key("/producer/CK/doctors", &cipher_text);
        cipher_text
    });
    deployment.publish_content("/producer/nurses", "/producer/CK/nurses", &{
        let cipher_text = deployment.cp_encrypt("nurse", b"for nurses");
        deployment.publish_content_key("/producer/CK/nurses", &cipher_text);
        cipher_text
    });

    let mut consumer = deployment.consumer();
    consumer.obtain_decryption_key().await.unwrap();
    assert_eq!(
        consumer.consume(&Name::from("/producer/doctors")).await.unwrap(),
        b"for doctors"
    );
    assert!(consumer.consume(&Name::from("/producer/nurses")).await.is_err());

    authority
        .borrow_mut()
        .add_new_policy(deployment.consumer_cert.clone(), ["nurse"]);
    consumer.obtain_decryption_key().await.unwrap();
    assert_eq!(
        consumer.consume(&Name::from("/producer/nurses")).await.unwrap(),
        b"for nurses"
    );
    assert!(consumer.consume(&Name::from("/producer/doctors")).await.is_err());
}

#[tokio::test]
async fn test_untrusted_key_segments_leave_no_key() {
    let (mut deployment, authority) = cp_deployment(&config(1500));
    authority
        .borrow_mut()
        .add_new_policy(deployment.consumer_cert.clone(), ["doctor"]);

    // trusts only the producer, not the authority
    let mut validator = TrustSchemaValidator::default();
    validator.add_anchor(deployment.producer_cert.clone());
    let mut consumer = deployment.consumer_with_validator(validator);

    let error = consumer.obtain_decryption_key().await.unwrap_err();
    assert!(matches!(
        error,
        Error::Validation {
            subject: "Decryption key segment",
            ..
        }
    ));
    assert!(consumer.public_params().is_some());
    assert!(!consumer.has_decryption_key());
    assert!(!consumer.ready_for_decryption());
}

#[tokio::test]
async fn test_consume_request_honours_exact_name() {
    let (mut deployment, authority) = cp_deployment(&config(1500));
    authority
        .borrow_mut()
        .add_new_policy(deployment.consumer_cert.clone(), ["doctor"]);
    deployment.publish(&deployment.cp_encrypt("doctor", MESSAGE));

    let mut consumer = deployment.consumer();
    consumer.obtain_decryption_key().await.unwrap();

    let exact = Request::new(Name::from("/producer"));
    assert!(matches!(
        consumer.consume_request(exact).await,
        Err(Error::Nack {
            reason: NackReason::NoRoute,
            ..
        })
    ));
    let prefix = Request::new(Name::from(CONTENT)).with_can_be_prefix(true);
    assert_eq!(consumer.consume_request(prefix).await.unwrap(), MESSAGE);
}
