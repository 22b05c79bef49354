use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::error::LoaderError;
use crate::sequence::DEFAULT_CHUNK_SIZE;
use crate::store::FsStore;

pub const DEFAULT_CONFIG_FILE: &str = "gbloader.json";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub store: Option<StoreEntry>,
    #[serde(default)]
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum StoreEntry {
    Shorthand(Utf8PathBuf),
    Detailed(StoreEntryObject),
}

#[derive(Debug, Deserialize, Serialize)]
pub struct StoreEntryObject {
    #[serde(default)]
    pub root: Option<Utf8PathBuf>,
    #[serde(default)]
    pub chunk_size: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSettings {
    pub root: Option<Utf8PathBuf>,
    pub chunk_size: usize,
}

impl StoreSettings {
    /// Opens the configured store, falling back to the per-user default location.
    pub fn open(&self) -> Result<FsStore, LoaderError> {
        let root = match &self.root {
            Some(root) => root.clone(),
            None => FsStore::default_root()?,
        };
        Ok(FsStore::new_with_root(root, self.chunk_size))
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub store: StoreSettings,
    pub files: Vec<PathBuf>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            schema_version: 1,
            store: StoreSettings {
                root: None,
                chunk_size: DEFAULT_CHUNK_SIZE,
            },
            files: Vec::new(),
        }
    }
}

impl ResolvedConfig {
    /// Applies command line values on top of the file values.
    pub fn with_overrides(
        mut self,
        store_root: Option<Utf8PathBuf>,
        files: Vec<PathBuf>,
    ) -> Self {
        if store_root.is_some() {
            self.store.root = store_root;
        }
        self.files.extend(files);
        self
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, LoaderError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Err(LoaderError::MissingConfig);
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| LoaderError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| LoaderError::ConfigParse(err.to_string()))?;

        Ok(Self::resolve_config(config))
    }

    /// Like [`ConfigLoader::resolve`], but a missing default config file yields defaults.
    pub fn resolve_or_default(path: Option<&str>) -> Result<ResolvedConfig, LoaderError> {
        match Self::resolve(path) {
            Err(LoaderError::MissingConfig) => Ok(ResolvedConfig::default()),
            other => other,
        }
    }

    pub fn resolve_config(config: Config) -> ResolvedConfig {
        let store = match config.store {
            None => StoreSettings {
                root: None,
                chunk_size: DEFAULT_CHUNK_SIZE,
            },
            Some(StoreEntry::Shorthand(root)) => StoreSettings {
                root: Some(root),
                chunk_size: DEFAULT_CHUNK_SIZE,
            },
            Some(StoreEntry::Detailed(obj)) => StoreSettings {
                root: obj.root,
                chunk_size: obj.chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE),
            },
        };

        ResolvedConfig {
            schema_version: config.schema_version.unwrap_or(1),
            store,
            files: config.files,
        }
    }
}
