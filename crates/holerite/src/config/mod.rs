//! Configuration.
//!
//! Config files are discovered with `prefer` and parsed with serde by
//! extension. Every section falls back to its `Default`, and the defaults
//! read environment overrides, so a missing file still honors
//! `HOLERITE_*` variables.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ConfigError;
use crate::extract::FieldRegistry;

/// Default S3 key prefix for staged documents.
pub const DEFAULT_S3_PREFIX: &str = "holerite-uploads";

const MIB: u64 = 1024 * 1024;

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.trim().is_empty())
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    let raw = env_var(name)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring invalid {}={}", name, raw);
            None
        }
    }
}

fn env_flag(name: &str) -> Option<bool> {
    env_var(name).map(|v| {
        let v = v.trim();
        v == "1" || v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("yes")
    })
}

/// Text acquisition thresholds and local tool settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionConfig {
    /// Minimum non-whitespace chars for the native text layer to be accepted.
    pub min_native_chars: usize,
    /// Minimum non-whitespace chars for local OCR output to be accepted.
    pub min_ocr_chars: usize,
    /// Minimum distinct coverage keywords for any tier to be accepted.
    pub min_keyword_hits: usize,
    /// Domain markers counted for coverage, matched without accents or case.
    pub coverage_keywords: Vec<String>,
    /// Run every available tier and merge all candidates.
    pub cross_validate: bool,
    /// Tesseract language list.
    pub ocr_language: String,
    /// Rasterization resolution for OCR.
    pub ocr_dpi: u32,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            min_native_chars: 100,
            min_ocr_chars: 100,
            min_keyword_hits: 3,
            coverage_keywords: ["CNPJ", "LIQUIDO", "VENCIMENTOS", "DESCONTOS", "SALARIO", "CPF"]
                .into_iter()
                .map(String::from)
                .collect(),
            cross_validate: false,
            ocr_language: env_var("HOLERITE_OCR_LANG").unwrap_or_else(|| "por+eng".to_string()),
            ocr_dpi: env_parse("HOLERITE_OCR_DPI").unwrap_or(300),
        }
    }
}

/// Cloud document-analysis policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudConfig {
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Bucket for staging documents above `sync_limit_bytes`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
    pub prefix: String,
    /// Documents larger than this never leave the machine.
    pub max_document_bytes: u64,
    /// Documents up to this size are analyzed synchronously.
    pub sync_limit_bytes: u64,
    pub poll_interval_secs: u64,
    pub poll_max_attempts: u32,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            enabled: env_flag("HOLERITE_CLOUD").unwrap_or(false),
            region: env_var("AWS_REGION"),
            bucket: env_var("HOLERITE_S3_BUCKET"),
            prefix: env_var("HOLERITE_S3_PREFIX").unwrap_or_else(|| DEFAULT_S3_PREFIX.to_string()),
            max_document_bytes: 50 * MIB,
            sync_limit_bytes: 5 * MIB,
            poll_interval_secs: 5,
            poll_max_attempts: 24,
        }
    }
}

impl CloudConfig {
    /// Whether a document of `size` bytes may be sent to the cloud tier.
    pub fn allows(&self, size: u64) -> bool {
        self.enabled && size <= self.max_document_bytes
    }

    /// Whether a document of `size` bytes needs the staged asynchronous path.
    pub fn needs_staging(&self, size: u64) -> bool {
        size > self.sync_limit_bytes
    }
}

/// Field rule additions and text cleanup settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Extra label regexes per field name, matched against accent-folded
    /// uppercase lines.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra_labels: BTreeMap<String, Vec<String>>,
    /// Phrases printed once per voucher copy; a second occurrence marks a
    /// duplicated copy.
    pub voucher_anchors: Vec<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            extra_labels: BTreeMap::new(),
            voucher_anchors: vec!["DECLARO TER RECEBIDO".to_string()],
        }
    }
}

impl ExtractionConfig {
    /// Build the field registry: built-in rules plus configured labels.
    pub fn registry(&self) -> FieldRegistry {
        FieldRegistry::with_label_patterns(
            self.extra_labels
                .iter()
                .map(|(field, labels)| (field.as_str(), labels.as_slice())),
        )
    }
}

/// Batch execution settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub workers: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            workers: env_parse("HOLERITE_WORKERS").filter(|w| *w > 0).unwrap_or(4),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub acquisition: AcquisitionConfig,
    #[serde(default)]
    pub cloud: CloudConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Discover and load the config file, falling back to defaults.
    pub async fn load() -> Self {
        match prefer::load("holerite").await {
            Ok(pref_config) => match pref_config.source_path() {
                Some(path) => match Self::load_from_path(path).await {
                    Ok(config) => config,
                    Err(e) => {
                        warn!("Ignoring config {}: {}", path.display(), e);
                        Self::default()
                    }
                },
                None => Self::default(),
            },
            Err(_) => {
                debug!("No config file found, using defaults");
                Self::default()
            }
        }
    }

    /// Load an explicit config file. The format follows the extension:
    /// TOML, YAML, otherwise JSON.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = tokio::fs::read_to_string(path).await?;
        let mut config = Self::parse(&contents, path)?;
        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    fn parse(contents: &str, path: &Path) -> Result<Self, ConfigError> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        Ok(match ext {
            "toml" => toml::from_str(contents)?,
            "yaml" | "yml" => serde_yaml::from_str(contents)?,
            _ => serde_json::from_str(contents)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(name: &str, contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn test_defaults() {
        let config = AcquisitionConfig::default();
        assert_eq!(config.min_keyword_hits, 3);
        assert!(config.coverage_keywords.contains(&"CNPJ".to_string()));
        assert!(!config.cross_validate);

        let cloud = CloudConfig::default();
        assert_eq!(cloud.sync_limit_bytes, 5 * MIB);
        assert_eq!(cloud.poll_max_attempts, 24);
    }

    #[test]
    fn test_cloud_size_policy() {
        let cloud = CloudConfig {
            enabled: true,
            max_document_bytes: 10,
            sync_limit_bytes: 4,
            ..CloudConfig::default()
        };
        assert!(cloud.allows(10));
        assert!(!cloud.allows(11));
        assert!(!cloud.needs_staging(4));
        assert!(cloud.needs_staging(5));

        let disabled = CloudConfig {
            enabled: false,
            ..cloud
        };
        assert!(!disabled.allows(1));
    }

    #[tokio::test]
    async fn test_load_toml() {
        let (_dir, path) = write_config(
            "holerite.toml",
            r#"
[acquisition]
min_keyword_hits = 2
cross_validate = true

[extraction.extra_labels]
matricula = ['\bCRACHA\b']

[batch]
workers = 8
"#,
        );
        let config = Config::load_from_path(&path).await.unwrap();
        assert_eq!(config.acquisition.min_keyword_hits, 2);
        assert!(config.acquisition.cross_validate);
        assert_eq!(config.acquisition.min_native_chars, 100);
        assert_eq!(config.batch.workers, 8);
        assert_eq!(config.extraction.extra_labels["matricula"], vec![r"\bCRACHA\b"]);
        assert_eq!(config.extraction.voucher_anchors, vec!["DECLARO TER RECEBIDO"]);
        assert_eq!(config.source_path.as_deref(), Some(path.as_path()));
    }

    #[tokio::test]
    async fn test_load_yaml_and_json() {
        let (_dir, path) = write_config("holerite.yaml", "cloud:\n  enabled: true\n  poll_max_attempts: 3\n");
        let config = Config::load_from_path(&path).await.unwrap();
        assert!(config.cloud.enabled);
        assert_eq!(config.cloud.poll_max_attempts, 3);

        let (_dir, path) = write_config("holerite.json", r#"{"acquisition": {"min_ocr_chars": 40}}"#);
        let config = Config::load_from_path(&path).await.unwrap();
        assert_eq!(config.acquisition.min_ocr_chars, 40);
    }

    #[tokio::test]
    async fn test_load_errors() {
        let (_dir, path) = write_config("holerite.toml", "acquisition = [");
        assert!(matches!(
            Config::load_from_path(&path).await,
            Err(ConfigError::Toml(_))
        ));
        assert!(matches!(
            Config::load_from_path(Path::new("/nonexistent/holerite.json")).await,
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_registry_includes_extra_labels() {
        let mut extraction = ExtractionConfig::default();
        let base = extraction.registry().len();
        extraction
            .extra_labels
            .insert("cargo".to_string(), vec![r"\bOCUPACAO\b".to_string(), "(".to_string()]);
        // The invalid pattern is skipped; the valid one is added.
        assert_eq!(extraction.registry().len(), base + 1);
    }
}
