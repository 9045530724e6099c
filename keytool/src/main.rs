mod config;

use anyhow::{Context, Result};
use bitcoin::hashes::{sha256, Hash};
use clap::{Parser, Subcommand};
use rand::rngs::OsRng;
use recoverable_ecdsa::{
    multisig_address, reconstruct_public_key, verify_multisig, Address, Curve, MultiSigKey,
    PrivateKey, PublicKey, Signature,
};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "ecdsa-keytool")]
#[command(about = "Recoverable ECDSA and Merkle multisig key tool", long_about = None)]
struct Cli {
    /// Config file (falls back to $KEYTOOL_CONFIG, then keytool.toml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a single key and its addresses
    Keygen,

    /// Generate one key per partner and the group's multisig address
    MultisigGroup,

    /// Sign the SHA-256 of a message
    Sign {
        /// Private key hex
        #[arg(short, long)]
        key: String,

        #[arg(short, long)]
        message: String,

        /// Partner order to stamp on the signature
        #[arg(short, long)]
        order: Option<u8>,
    },

    /// Reconstruct the signer's public key from a signature
    Recover {
        /// Signature JSON: {"r": hex, "s": hex, "v": 0|1, "o": n}
        #[arg(short, long)]
        signature: String,

        #[arg(short, long)]
        message: String,
    },

    /// Verify a full set of partner signatures against a multisig address
    VerifyMultisig {
        #[arg(short, long)]
        address: String,

        #[arg(short, long)]
        message: String,

        /// JSON array of signatures
        #[arg(short, long)]
        signatures: String,
    },
}

#[derive(Serialize)]
struct KeyReport {
    private_key: String,
    public_key: String,
    address: Address,
    uncompressed_address: Address,
}

impl KeyReport {
    fn new(key: &PrivateKey) -> Self {
        let public = key.public_key();
        KeyReport {
            private_key: hex::encode(key.to_bytes()),
            public_key: hex::encode(public.to_compressed_bytes()),
            address: public.address(true),
            uncompressed_address: public.address(false),
        }
    }
}

#[derive(Serialize)]
struct PartnerReport {
    order: u8,
    #[serde(flatten)]
    key: KeyReport,
}

#[derive(Serialize)]
struct GroupReport {
    curve: String,
    partners: u8,
    address: Address,
    keys: Vec<PartnerReport>,
}

#[derive(Serialize)]
struct RecoverReport {
    public_key: String,
    address: Address,
    uncompressed_address: Address,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "recoverable_ecdsa=info,ecdsa_keytool=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(|| {
        std::env::var("KEYTOOL_CONFIG").unwrap_or_else(|_| "keytool.toml".to_string())
    });
    tracing::debug!("Loading configuration from: {}", config_path);

    let config = config::ConfigFile::load(&config_path)?;
    config.validate()?;
    let curve = config.curve();
    tracing::info!("Curve: {}", curve.id());

    match cli.command {
        Commands::Keygen => {
            let key = PrivateKey::generate(curve, &mut OsRng)?;
            print_json(&KeyReport::new(&key))?;
        }
        Commands::MultisigGroup => {
            let partners = config.partners();
            let keys = (0..partners)
                .map(|order| MultiSigKey::generate(curve, order, partners, &mut OsRng))
                .collect::<recoverable_ecdsa::Result<Vec<_>>>()?;

            let pubkeys: Vec<PublicKey> = keys.iter().map(MultiSigKey::public_key).collect();
            let address = multisig_address(&pubkeys)?;
            tracing::info!("Generated {}-partner group {}", partners, address);

            print_json(&GroupReport {
                curve: curve.id().to_string(),
                partners,
                address,
                keys: keys
                    .iter()
                    .map(|k| PartnerReport {
                        order: k.order(),
                        key: KeyReport::new(k.private_key()),
                    })
                    .collect(),
            })?;
        }
        Commands::Sign {
            key,
            message,
            order,
        } => {
            let key = parse_private_key(curve, &key)?;
            let hash = message_hash(&message);
            let sig = match order {
                Some(order) => {
                    MultiSigKey::new(key, order, config.partners())?.sign(&hash, &mut OsRng)?
                }
                None => key.sign(&hash, &mut OsRng)?,
            };
            print_json(&sig)?;
        }
        Commands::Recover { signature, message } => {
            let sig: Signature =
                serde_json::from_str(&signature).context("Invalid signature JSON")?;
            let key = reconstruct_public_key(&sig, &message_hash(&message), curve)?;
            print_json(&RecoverReport {
                public_key: hex::encode(key.to_compressed_bytes()),
                address: key.address(true),
                uncompressed_address: key.address(false),
            })?;
        }
        Commands::VerifyMultisig {
            address,
            message,
            signatures,
        } => {
            let address: Address = address.parse().context("Invalid address")?;
            let sigs: Vec<Signature> =
                serde_json::from_str(&signatures).context("Invalid signatures JSON")?;

            let valid = verify_multisig(&sigs, &message_hash(&message), &address, curve);
            if valid {
                tracing::info!("Multisig valid for {}", address);
            } else {
                tracing::warn!("Multisig rejected for {}", address);
            }
            println!("{}", valid);
            if !valid {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn parse_private_key(curve: &'static Curve, key_hex: &str) -> Result<PrivateKey> {
    let bytes = hex::decode(key_hex).context("Invalid private key hex")?;
    Ok(PrivateKey::from_bytes(curve, &bytes)?)
}

fn message_hash(message: &str) -> [u8; 32] {
    sha256::Hash::hash(message.as_bytes()).to_byte_array()
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
