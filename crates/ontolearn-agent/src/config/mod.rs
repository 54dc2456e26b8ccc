//! Configuration loading for Ontolearn.
//! Reads the file given by `--config`, else the path in ONTOLEARN_CONFIG,
//! else ./ontolearn.toml if present, else built-in defaults.
//! `.toml`, `.yaml`/`.yml` and `.json` files are accepted.

use std::path::{Path, PathBuf};

use ontolearn_common::{OntologyError, Result};
use ontolearn_corpus::{NormalisePolicy, StoreOptions};
use serde::{Deserialize, Serialize};

pub const CONFIG_ENV: &str = "ONTOLEARN_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "ontolearn.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusConfig {
    /// Directory of per-paper extraction files.
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,
    #[serde(default = "default_extension")]
    pub extension: String,
    #[serde(default)]
    pub normalise: NormalisePolicy,
    /// Warn when more than this fraction of papers is skipped.
    #[serde(default = "default_alert_skip_ratio")]
    pub alert_skip_ratio: f64,
}

fn default_results_dir()      -> PathBuf { PathBuf::from("data/results_fulltext") }
fn default_extension()        -> String  { "json".to_string() }
fn default_alert_skip_ratio() -> f64     { 0.10 }

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            results_dir: default_results_dir(),
            extension: default_extension(),
            normalise: NormalisePolicy::default(),
            alert_skip_ratio: default_alert_skip_ratio(),
        }
    }
}

impl CorpusConfig {
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            extension: self.extension.clone(),
            normalise: self.normalise,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_index_file")]
    pub index_file: String,
    #[serde(default = "default_concepts_file")]
    pub concepts_file: String,
}

fn default_output_dir()    -> PathBuf { PathBuf::from("data/aggregate") }
fn default_index_file()    -> String  { "corpus_index.json".to_string() }
fn default_concepts_file() -> String  { "concepts.jsonl".to_string() }

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            index_file: default_index_file(),
            concepts_file: default_concepts_file(),
        }
    }
}

impl OutputConfig {
    pub fn index_path(&self) -> PathBuf {
        self.dir.join(&self.index_file)
    }

    pub fn concepts_path(&self) -> PathBuf {
        self.dir.join(&self.concepts_file)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchConfig {
    #[serde(default)]
    pub overwrite: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive; RUST_LOG wins when set.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String { "ontolearn=info,warn".to_string() }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { filter: default_log_filter() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Yaml,
    Json,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml")          => Ok(ConfigFormat::Toml),
            Some("yaml" | "yml")  => Ok(ConfigFormat::Yaml),
            Some("json")          => Ok(ConfigFormat::Json),
            _ => Err(OntologyError::Config(format!(
                "unsupported config format: {} (expected .toml, .yaml, .yml or .json)",
                path.display()
            ))),
        }
    }
}


impl Config {
    /// Load configuration. Returns the file it came from, if any.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        let env = std::env::var(CONFIG_ENV).ok();
        match resolve_config_path(explicit, env.as_deref(), Path::new(DEFAULT_CONFIG_FILE))? {
            Some(path) => Ok((Self::from_path(&path)?, Some(path))),
            None => Ok((Self::default(), None)),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let format = ConfigFormat::from_path(path)?;
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content, format)
    }

    pub fn parse(content: &str, format: ConfigFormat) -> Result<Self> {
        let config: Config = match format {
            ConfigFormat::Toml => toml::from_str(content)?,
            ConfigFormat::Yaml => serde_yaml::from_str(content)?,
            ConfigFormat::Json => serde_json::from_str(content)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.corpus.extension.trim().is_empty() || self.corpus.extension.starts_with('.') {
            return Err(OntologyError::Config(format!(
                "corpus.extension must be a bare extension like \"json\", got {:?}",
                self.corpus.extension
            )));
        }
        if !(0.0..=1.0).contains(&self.corpus.alert_skip_ratio) {
            return Err(OntologyError::Config(format!(
                "corpus.alert_skip_ratio must be within [0, 1], got {}",
                self.corpus.alert_skip_ratio
            )));
        }
        if self.output.index_file == self.output.concepts_file {
            return Err(OntologyError::Config(
                "output.index_file and output.concepts_file must differ".to_string(),
            ));
        }
        Ok(())
    }
}

/// Pick the config file: explicit flag, then env var, then the default file
/// if it exists. Explicit and env paths must exist.
pub fn resolve_config_path(
    explicit: Option<&Path>,
    env: Option<&str>,
    default_file: &Path,
) -> Result<Option<PathBuf>> {
    let chosen = explicit
        .map(Path::to_path_buf)
        .or_else(|| env.filter(|v| !v.is_empty()).map(PathBuf::from));

    match chosen {
        Some(path) if path.is_file() => Ok(Some(path)),
        Some(path) => Err(OntologyError::Config(format!(
            "config file not found: {}",
            path.display()
        ))),
        None if default_file.is_file() => Ok(Some(default_file.to_path_buf())),
        None => Ok(None),
    }
}
