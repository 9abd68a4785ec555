//! Configuration for the Jarbas service
//!
//! Defaults are overridden first by an optional TOML file and then by
//! environment variables. The Google API key is the only required value.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Error, Result};

/// Environment variable holding the Google API key
pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RagConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Gemini API configuration
    #[serde(default)]
    pub gemini: GeminiConfig,
    /// Persistent collection configuration
    #[serde(default)]
    pub vector_db: VectorDbConfig,
    /// Retrieval configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum upload size in bytes (default: 100MB)
    pub max_upload_size: usize,
    /// Directory for temporary uploads
    pub upload_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            enable_cors: true,
            max_upload_size: 100 * 1024 * 1024, // 100MB
            upload_dir: PathBuf::from("temp_uploads"),
        }
    }
}

/// Gemini API configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// API key (normally taken from `GOOGLE_API_KEY`)
    pub api_key: String,
    /// API base URL
    pub base_url: String,
    /// Embedding model, with the `models/` prefix
    pub embedding_model: String,
    /// Generation model name
    pub generation_model: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            embedding_model: "models/text-embedding-004".to_string(),
            generation_model: "gemini-1.5-flash".to_string(),
        }
    }
}

// Keeps the key out of logs.
impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("embedding_model", &self.embedding_model)
            .field("generation_model", &self.generation_model)
            .finish()
    }
}

/// Persistent collection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorDbConfig {
    /// Directory holding the on-disk store
    pub storage_path: PathBuf,
    /// Collection (table) name
    pub collection: String,
    /// Embedding width; must match the embedding model
    pub dimensions: usize,
}

impl Default for VectorDbConfig {
    fn default() -> Self {
        Self {
            storage_path: PathBuf::from("db"),
            collection: "jarbas_memory".to_string(),
            dimensions: 768, // text-embedding-004
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of chunks used as context
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 3 }
    }
}

impl RagConfig {
    /// Load configuration for the server process.
    ///
    /// Reads `.env` if present, then the optional TOML file, then the
    /// environment. Fails when no API key can be found.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        if let Ok(path) = dotenv::dotenv() {
            tracing::debug!("Loaded environment from {}", path.display());
        }

        let mut config = match config_path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        toml::from_str(&content)
            .map_err(|e| Error::config(format!("Invalid config {}: {}", path.display(), e)))
    }

    /// Apply overrides from a variable lookup (the process environment in production)
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(API_KEY_ENV) {
            self.gemini.api_key = key;
        }
        if let Some(host) = lookup("JARBAS_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("JARBAS_PORT") {
            self.server.port = parse_var("JARBAS_PORT", &port)?;
        }
        if let Some(size) = lookup("JARBAS_MAX_UPLOAD_BYTES") {
            self.server.max_upload_size = parse_var("JARBAS_MAX_UPLOAD_BYTES", &size)?;
        }
        if let Some(cors) = lookup("JARBAS_ENABLE_CORS") {
            self.server.enable_cors = parse_var("JARBAS_ENABLE_CORS", &cors)?;
        }
        if let Some(dir) = lookup("JARBAS_UPLOAD_DIR") {
            self.server.upload_dir = PathBuf::from(dir);
        }
        if let Some(path) = lookup("JARBAS_DB_PATH") {
            self.vector_db.storage_path = PathBuf::from(path);
        }
        if let Some(name) = lookup("JARBAS_COLLECTION") {
            self.vector_db.collection = name;
        }
        if let Some(dims) = lookup("JARBAS_EMBEDDING_DIMENSIONS") {
            self.vector_db.dimensions = parse_var("JARBAS_EMBEDDING_DIMENSIONS", &dims)?;
        }
        if let Some(url) = lookup("JARBAS_GEMINI_BASE_URL") {
            self.gemini.base_url = url;
        }
        if let Some(model) = lookup("JARBAS_EMBEDDING_MODEL") {
            self.gemini.embedding_model = model;
        }
        if let Some(model) = lookup("JARBAS_GENERATION_MODEL") {
            self.gemini.generation_model = model;
        }
        if let Some(top_k) = lookup("JARBAS_TOP_K") {
            self.retrieval.top_k = parse_var("JARBAS_TOP_K", &top_k)?;
        }
        Ok(())
    }

    /// Check required values
    pub fn validate(&self) -> Result<()> {
        if self.gemini.api_key.trim().is_empty() {
            return Err(Error::config(format!(
                "Google API key not found. Set {} in the environment or in a .env file",
                API_KEY_ENV
            )));
        }
        if self.retrieval.top_k == 0 {
            return Err(Error::config("retrieval.top_k must be at least 1"));
        }
        if self.vector_db.collection.trim().is_empty() {
            return Err(Error::config("vector_db.collection must not be empty"));
        }
        if self.vector_db.dimensions == 0 {
            return Err(Error::config("vector_db.dimensions must be at least 1"));
        }
        Ok(())
    }
}

fn parse_var<T: FromStr>(name: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| Error::config(format!("Invalid value for {}: '{}' ({})", name, value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_api_key_is_fatal() {
        let mut config = RagConfig::default();
        config.apply_env(lookup_from(&[])).unwrap();

        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains(API_KEY_ENV));
    }

    #[test]
    fn test_blank_api_key_is_fatal() {
        let mut config = RagConfig::default();
        config.apply_env(lookup_from(&[(API_KEY_ENV, "   ")])).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = RagConfig::default();
        config
            .apply_env(lookup_from(&[
                (API_KEY_ENV, "secret"),
                ("JARBAS_PORT", "9100"),
                ("JARBAS_DB_PATH", "/tmp/jarbas-db"),
                ("JARBAS_TOP_K", "5"),
                ("JARBAS_EMBEDDING_DIMENSIONS", "256"),
            ]))
            .unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(config.gemini.api_key, "secret");
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.vector_db.storage_path, PathBuf::from("/tmp/jarbas-db"));
        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.vector_db.dimensions, 256);
        assert_eq!(config.vector_db.collection, "jarbas_memory");
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        let mut config = RagConfig::default();
        config
            .apply_env(lookup_from(&[(API_KEY_ENV, "secret"), ("JARBAS_EMBEDDING_DIMENSIONS", "0")]))
            .unwrap();
        assert!(config.validate().unwrap_err().to_string().contains("dimensions"));
    }

    #[test]
    fn test_invalid_port_rejected() {
        let mut config = RagConfig::default();
        let err = config
            .apply_env(lookup_from(&[("JARBAS_PORT", "eighty")]))
            .unwrap_err();
        assert!(err.to_string().contains("JARBAS_PORT"));
    }

    #[test]
    fn test_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jarbas.toml");
        std::fs::write(
            &path,
            r#"
[server]
host = "127.0.0.1"
port = 8081
enable_cors = false
max_upload_size = 1024
upload_dir = "uploads"

[vector_db]
storage_path = "data"
collection = "notes"
"#,
        )
        .unwrap();

        let config = RagConfig::from_file(&path).unwrap();
        assert_eq!(config.server.port, 8081);
        assert!(!config.server.enable_cors);
        assert_eq!(config.vector_db.collection, "notes");
        assert_eq!(config.vector_db.dimensions, 768);
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.gemini.generation_model, "gemini-1.5-flash");
    }

    #[test]
    fn test_debug_redacts_key() {
        let mut config = RagConfig::default();
        config.gemini.api_key = "super-secret".to_string();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-secret"));
    }
}
