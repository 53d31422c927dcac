use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use ndn_abe::abe_support;
use ndn_abe::algo::{AttributeSet, CipherText, Policy, PublicParams};
use ndn_abe::api::api_models::{ContentKeyPayload, EncryptedContentPayload, Payload};
use ndn_abe::attribute_authority::{CpAttributeAuthority, KpAttributeAuthority};
use ndn_abe::config::{AuthorityConfig, FetchConfig};
use ndn_abe::consumer::Consumer;
use ndn_abe::face::InMemoryFace;
use ndn_abe::name::Name;
use ndn_abe::packet::Data;
use ndn_abe::security::{Certificate, KeyChain, TrustSchemaValidator};
use ndn_abe::Result;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Scheme {
    Cp,
    Kp,
}

/// Runs an attribute authority, a producer and a consumer on one simulated network and has the
/// consumer fetch and decrypt one protected object.
#[derive(Parser, Debug)]
#[command(name = "ndn-abe", version, about, long_about = None)]
struct Cli {
    #[arg(short, long, value_enum, default_value = "cp")]
    scheme: Scheme,

    /// JSON authority config; the flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Attribute universe
    #[arg(short, long, value_delimiter = ',', default_value = "doctor,nurse,cardiology,admin")]
    attributes: Vec<String>,

    /// Consumer grant: attribute list for cp, access formula for kp
    #[arg(short, long, default_value = "doctor,cardiology")]
    grant: String,

    /// Content label: access formula for cp, attribute list for kp
    #[arg(short, long, default_value = "doctor&cardiology")]
    label: String,

    #[arg(short, long, default_value = "Hello World!")]
    message: String,

    #[arg(long)]
    max_segment_size: Option<usize>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log: String,
}

fn attribute_list(list: &str) -> AttributeSet {
    list.split(',')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(String::from)
        .collect()
}

fn authority_config(cli: &Cli) -> Result<AuthorityConfig> {
    let mut config = match &cli.config {
        Some(path) => AuthorityConfig::from_json_file(path)?,
        None => AuthorityConfig::default(),
    };
    if config.attributes.is_empty() {
        config.attributes = cli.attributes.clone();
    }
    if let Some(max_segment_size) = cli.max_segment_size {
        config.max_segment_size = max_segment_size;
    }
    config.validate()?;
    Ok(config)
}

/// Publishes `message` under `/producer/content` and its content key under `/producer/CK/1`.
fn publish(
    face: &InMemoryFace,
    keychain: &KeyChain,
    producer: &Certificate,
    cipher_text: &CipherText,
) -> Result<Name> {
    let content_name = producer.identity().append("content");
    let ck_name = producer.identity().append("CK").append("1");

    let content_key = cipher_text
        .content_key
        .as_ref()
        .map(ContentKeyPayload::from)
        .unwrap_or(ContentKeyPayload {
            encrypted_aes_key: Vec::new(),
        });
    let mut ck_data = Data::new(ck_name.clone(), content_key.encode()?);
    keychain.sign(&mut ck_data, producer.key_name())?;

    let payload = EncryptedContentPayload::new(cipher_text, ck_name);
    let mut content = Data::new(content_name.clone(), payload.encode()?);
    keychain.sign(&mut content, producer.key_name())?;

    face.publish(ck_data);
    face.publish(content);
    Ok(content_name)
}

fn encrypt(cli: &Cli, public_params: &PublicParams) -> Result<CipherText> {
    let message = cli.message.as_bytes();
    Ok(match cli.scheme {
        Scheme::Cp => abe_support::cp_encrypt(public_params, &Policy::new(cli.label.as_str()), message)?,
        Scheme::Kp => abe_support::kp_encrypt(public_params, &attribute_list(&cli.label), message)?,
    })
}

async fn run(cli: Cli) -> Result<Vec<u8>> {
    let config = authority_config(&cli)?;
    let face = InMemoryFace::new();

    let mut aa_keychain = KeyChain::new();
    let aa_cert = aa_keychain.create_identity(&Name::from("/aa"));
    let mut consumer_keychain = KeyChain::new();
    let consumer_cert = consumer_keychain.create_identity(&Name::from("/org/alice"));
    let mut producer_keychain = KeyChain::new();
    let producer_cert = producer_keychain.create_identity(&Name::from("/producer"));

    let public_params = match cli.scheme {
        Scheme::Cp => {
            let mut authority = CpAttributeAuthority::new(aa_cert.clone(), aa_keychain, &config)?;
            authority.add_new_policy(consumer_cert.clone(), attribute_list(&cli.grant));
            let public_params = authority.public_params().clone();
            authority.register_on(&face);
            public_params
        }
        Scheme::Kp => {
            let mut authority = KpAttributeAuthority::new(aa_cert.clone(), aa_keychain, &config)?;
            authority.add_new_policy(consumer_cert.clone(), Policy::new(cli.grant.as_str()));
            let public_params = authority.public_params().clone();
            authority.register_on(&face);
            public_params
        }
    };

    let cipher_text = encrypt(&cli, &public_params)?;
    let content_name = publish(&face, &producer_keychain, &producer_cert, &cipher_text)?;
    info!("Published {} ({} bytes)", content_name, cipher_text.content.len());

    let mut validator = TrustSchemaValidator::default();
    validator.add_anchor(aa_cert.clone());
    validator.add_anchor(producer_cert);

    let mut consumer = Consumer::new(
        face,
        consumer_keychain,
        validator,
        consumer_cert,
        aa_cert,
        FetchConfig::default(),
    )?;
    consumer.obtain_decryption_key().await?;
    consumer.consume(&content_name).await
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log.as_str()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run(cli).await {
        Ok(plaintext) => {
            println!("{}", String::from_utf8_lossy(&plaintext));
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{} ({:?})", e, e.kind());
            ExitCode::FAILURE
        }
    }
}
