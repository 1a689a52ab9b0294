//! JoinAccept MIC calculator/verifier.
//!
//! Thin caller around the library core: parses hex strings into byte
//! buffers, prints the MIC (or a verify verdict) as lowercase hex.
//! Defaults can come from a TOML file; flags override it.
//!
//! Usage:
//!   join-mic --lorawan-version 1.0.x --nwk-key <32 hex> \
//!            --payload <24-34 hex> --dev-nonce 0000 [--mic <8 hex>]

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use serde::Deserialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use lora_join_mic::{
    join_accept_mic, verify_join_accept_mic, DevNonce, JoinRequestContext, Mic, ProtocolVersion,
};

#[derive(Parser)]
#[command(name = "join-mic")]
#[command(about = "Compute or verify a LoRaWAN JoinAccept MIC")]
#[command(version)]
struct Cli {
    /// Path to a TOML file with default field values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// LoRaWAN version tag ("1.0.x" or "1.1")
    #[arg(long, value_name = "TAG")]
    lorawan_version: Option<String>,

    /// Root NwkKey/AppKey (32 hex chars)
    #[arg(long, value_name = "HEX")]
    nwk_key: Option<String>,

    /// Decrypted JoinAccept field block, MHDR and MIC stripped (12-17 bytes)
    #[arg(long, value_name = "HEX")]
    payload: Option<String>,

    /// DevNonce, little-endian byte order (4 hex chars)
    #[arg(long, value_name = "HEX")]
    dev_nonce: Option<String>,

    /// JoinEUI, little-endian (16 hex chars; required for 1.1)
    #[arg(long, value_name = "HEX")]
    join_eui: Option<String>,

    /// DevEUI, little-endian (16 hex chars; required for 1.1)
    #[arg(long, value_name = "HEX")]
    dev_eui: Option<String>,

    /// Candidate MIC to verify (8 hex chars); omit to print the computed MIC
    #[arg(long, value_name = "HEX")]
    mic: Option<String>,
}

/// Defaults file, mirroring the flags. Keys live here only for lab use;
/// production callers keep them in their own key store.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    lorawan_version: Option<String>,
    nwk_key: Option<String>,
    payload: Option<String>,
    dev_nonce: Option<String>,
    join_eui: Option<String>,
    dev_eui: Option<String>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Deserialize)]
struct LoggingConfig {
    level: String,
}

impl FileConfig {
    fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {:?}", path))?;
        toml::from_str(&content).context("failed to parse config file")
    }
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let file = match &cli.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };

    let level = file
        .logging
        .as_ref()
        .map(|l| l.level.clone())
        .unwrap_or_else(|| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();

    let version_tag = cli
        .lorawan_version
        .or(file.lorawan_version)
        .context("missing --lorawan-version (or lorawan_version in config)")?;
    let version = ProtocolVersion::from_tag(&version_tag)?;

    let nwk_key = hex_field("nwk-key", cli.nwk_key.or(file.nwk_key))?;
    let payload = hex_field("payload", cli.payload.or(file.payload))?;
    let dev_nonce: [u8; 2] = hex_array("dev-nonce", cli.dev_nonce.or(file.dev_nonce))?;

    // Context is optional at the CLI; the core enforces it for 1.1
    let join_eui = cli.join_eui.or(file.join_eui);
    let dev_eui = cli.dev_eui.or(file.dev_eui);
    let context = match (join_eui, dev_eui) {
        (Some(j), Some(d)) => Some(JoinRequestContext {
            join_eui: hex_array("join-eui", Some(j))?,
            dev_eui: hex_array("dev-eui", Some(d))?,
        }),
        (None, None) => None,
        _ => anyhow::bail!("--join-eui and --dev-eui must be given together"),
    };

    debug!(
        "computing JoinAccept MIC: version={} payload={} bytes",
        version,
        payload.len()
    );

    match cli.mic {
        Some(candidate) => {
            let candidate = Mic(hex_array("mic", Some(candidate))?);
            let valid = verify_join_accept_mic(
                version,
                &nwk_key,
                &payload,
                DevNonce(dev_nonce),
                context.as_ref(),
                &candidate,
            )?;
            if valid {
                println!("valid");
                Ok(ExitCode::SUCCESS)
            } else {
                println!("invalid");
                Ok(ExitCode::FAILURE)
            }
        }
        None => {
            let mic = join_accept_mic(
                version,
                &nwk_key,
                &payload,
                DevNonce(dev_nonce),
                context.as_ref(),
            )?;
            println!("{mic}");
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn hex_field(name: &str, value: Option<String>) -> anyhow::Result<Vec<u8>> {
    let value = value.with_context(|| format!("missing --{name} (or {name} in config)"))?;
    hex::decode(value.trim()).with_context(|| format!("--{name} is not valid hex"))
}

fn hex_array<const N: usize>(name: &str, value: Option<String>) -> anyhow::Result<[u8; N]> {
    let bytes = hex_field(name, value)?;
    bytes
        .as_slice()
        .try_into()
        .with_context(|| format!("--{name} must be {N} bytes, got {}", bytes.len()))
}
