use serde::Deserialize;
use std::{fs, path::PathBuf};

use crate::{sources::SheetOptions, transform::HeaderRegion};

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub http_bind_addr: String,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotBackend {
    File,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotConfig {
    #[serde(default = "default_backend")]
    pub backend: SnapshotBackend,
    #[serde(default = "default_snapshot_path")]
    pub path: PathBuf,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IngestConfig {
    /// Sheet name; first sheet when unset.
    pub sheet: Option<String>,
    /// Index of the upper header row; the row below completes the header.
    #[serde(default)]
    pub header_row: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub snapshot: SnapshotConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    pub metrics: Option<MetricsConfig>,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_max_upload_bytes() -> usize {
    20 * 1024 * 1024
}

fn default_backend() -> SnapshotBackend {
    SnapshotBackend::File
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from("data.json")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_bind_addr: default_bind_addr(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: default_snapshot_path(),
        }
    }
}

impl IngestConfig {
    pub fn sheet_options(&self) -> SheetOptions {
        SheetOptions {
            sheet: self.sheet.clone(),
            header: HeaderRegion::starting_at(self.header_row),
        }
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        let mut cfg = match env::var("MRG_CONFIG") {
            Ok(path) => Self::from_toml(&fs::read_to_string(&path)?)?,
            Err(_) => match fs::read_to_string("mrg-config.toml") {
                Ok(contents) => Self::from_toml(&contents)?,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
                Err(e) => return Err(e.into()),
            },
        };

        if let Ok(port) = env::var("PORT") {
            cfg.server.apply_port(&port)?;
        }

        Ok(cfg)
    }

    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(contents)?)
    }
}

impl ServerConfig {
    /// Replaces the port of `http_bind_addr`, keeping its host.
    pub fn apply_port(&mut self, port: &str) -> anyhow::Result<()> {
        let port: u16 = port
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid PORT '{port}': {e}"))?;
        let host = self
            .http_bind_addr
            .rsplit_once(':')
            .map(|(host, _)| host)
            .unwrap_or("0.0.0.0");
        self.http_bind_addr = format!("{host}:{port}");
        Ok(())
    }
}
