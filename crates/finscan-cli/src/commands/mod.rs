//! CLI subcommands.

pub mod batch;
pub mod classify;
pub mod config;
pub mod process;

use std::path::{Path, PathBuf};

use serde::ser::{Serialize, Serializer};
use serde_json::ser::PrettyFormatter;
use tracing::debug;

use finscan_core::FinscanConfig;

/// Load the configuration named on the command line, else the default config
/// file when it exists, else built-in defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<FinscanConfig> {
    if let Some(path) = config_path {
        return Ok(FinscanConfig::from_file(Path::new(path))?);
    }

    let default_path = config::default_config_path();
    if default_path.exists() {
        debug!("Using config file {}", default_path.display());
        Ok(FinscanConfig::from_file(&default_path)?)
    } else {
        Ok(FinscanConfig::default())
    }
}

/// Serialize to pretty JSON with `indent` spaces.
pub fn to_json<T: Serialize + ?Sized>(value: &T, indent: usize) -> anyhow::Result<String> {
    let indent = vec![b' '; indent];
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(&indent);
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    Ok(String::from_utf8(buf)?)
}

/// A JSON object that keeps insertion order.
pub struct OrderedMap<K, V>(pub Vec<(K, V)>);

impl<K: Serialize, V: Serialize> Serialize for OrderedMap<K, V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(k, v)| (k, v)))
    }
}

/// File name `<stem><suffix>` for an output derived from `input`.
pub fn output_name(input: &Path, suffix: &str) -> PathBuf {
    let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or("document");
    PathBuf::from(format!("{}{}", stem, suffix))
}
