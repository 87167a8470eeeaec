//! Developer CLI for inspecting and editing encrypted preference files.
//!
//! ```text
//! securepref --device-id 8af3c2e1d4b5a697 set volume 7 --type int
//! securepref --device-id 8af3c2e1d4b5a697 get volume --type int
//! securepref --device-id 8af3c2e1d4b5a697 set recent a.txt b.txt --type 'string[]'
//! securepref raw
//! ```
//!
//! Logging goes to stderr and is controlled by `RUST_LOG` (default `warn`).

use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use eyre::{bail, eyre, Result, WrapErr};
use securepref_core::marshal::Marshaller;
use securepref_core::{
    BackingStore, FileBackingStore, PrefValue, Preferences, PrefsConfig, StaticIdentity,
    TypeDescriptor,
};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "securepref", version, about = "Inspect and edit encrypted preference files")]
struct Cli {
    /// Preference file. Defaults to `<name>.json` where `name` comes from the config.
    #[arg(long, env = "SECUREPREF_STORE")]
    store: Option<PathBuf>,

    /// Device identifier the encryption key is derived from.
    #[arg(long, env = "SECUREPREF_DEVICE_ID")]
    device_id: Option<String>,

    /// Keep key names in plaintext.
    #[arg(long, env = "SECUREPREF_PLAIN_KEYS")]
    plain_keys: bool,

    /// JSON file with store options (`name`, `encrypt_keys`).
    #[arg(long, env = "SECUREPREF_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the value stored under a key
    Get {
        key: String,
        /// bool, int, long, float, double, string, json, or any of these with `[]`
        #[arg(long = "type", default_value = "string")]
        ty: String,
    },

    /// Store a value. Array types take one argument per element.
    Set {
        key: String,
        values: Vec<String>,
        #[arg(long = "type", default_value = "string")]
        ty: String,
    },

    /// Remove a key
    Remove { key: String },

    /// Print whether a key is set
    Contains { key: String },

    /// List the keys that decrypt with this device id
    Keys,

    /// Remove every entry
    Clear,

    /// Dump the encrypted entries as stored
    Raw,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_config(cli: &Cli) -> Result<PrefsConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .wrap_err_with(|| format!("reading config file {}", path.display()))?;
            PrefsConfig::from_json(&json)?
        }
        None => PrefsConfig::default(),
    };
    if cli.plain_keys {
        config.encrypt_keys = false;
    }
    Ok(config)
}

/// Builds the value for `set` from its command-line arguments.
fn parse_value(descriptor: &TypeDescriptor, key: &str, values: &[String]) -> Result<PrefValue> {
    if let TypeDescriptor::Array(inner) = descriptor {
        return values
            .iter()
            .map(|value| parse_value(inner, key, std::slice::from_ref(value)))
            .collect::<Result<Vec<_>>>()
            .map(PrefValue::Array);
    }
    let [value] = values else {
        bail!("type {descriptor} takes exactly one value, got {}", values.len());
    };
    Marshaller::default()
        .decode(value, descriptor, key)?
        .ok_or_else(|| eyre!("an empty value is not a valid {descriptor}"))
}

fn run(cli: Cli, out: &mut impl Write) -> Result<()> {
    let config = load_config(&cli)?;
    let path = cli
        .store
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("{}.json", config.name)));
    let backing = Arc::new(
        FileBackingStore::open(&path)
            .wrap_err_with(|| format!("opening preference file {}", path.display()))?,
    );

    let decrypting = || -> Result<Preferences> {
        let device_id = cli
            .device_id
            .clone()
            .ok_or_else(|| eyre!("--device-id (or SECUREPREF_DEVICE_ID) is required"))?;
        let identity = StaticIdentity::hardware(device_id);
        Ok(Preferences::for_device(backing.clone(), &identity, &config)?)
    };

    match &cli.command {
        Command::Get { key, ty } => {
            let descriptor = TypeDescriptor::parse(ty);
            match decrypting()?.get_value(key, &descriptor)? {
                Some(value) => writeln!(out, "{value}")?,
                None => bail!("'{key}' is not set"),
            }
        }
        Command::Set { key, values, ty } => {
            let descriptor = TypeDescriptor::parse(ty);
            descriptor.ensure_supported(key)?;
            let value = parse_value(&descriptor, key, values)?;
            decrypting()?.set_value(key, &value)?;
            tracing::info!(key = %key, "stored preference");
        }
        Command::Remove { key } => decrypting()?.remove(key)?,
        Command::Contains { key } => writeln!(out, "{}", decrypting()?.contains(key)?)?,
        Command::Keys => {
            let mut keys = decrypting()?.keys()?;
            keys.sort();
            for key in keys {
                writeln!(out, "{key}")?;
            }
        }
        Command::Clear => decrypting()?.clear()?,
        Command::Raw => {
            let entries = backing
                .keys()?
                .into_iter()
                .map(|key| {
                    let value = backing.get_string(&key)?.unwrap_or_default();
                    Ok((key, value))
                })
                .collect::<Result<BTreeMap<_, _>>>()?;
            writeln!(out, "{}", serde_json::to_string_pretty(&entries)?)?;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    run(cli, &mut std::io::stdout().lock())
}
