use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::app_dirs::AppDirs;
use crate::error::{AppError, ConfigError};
use crate::keymap::KeyBinding;
use crate::language::SupportedLanguage;
use crate::mode::{Mode, Refill};
use crate::session::SessionConfig;
use crate::theme::{Theme, ThemeConfig};
use crate::word_source::{FixedWords, RandomWords, SentenceWords, WordSource};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ModeKind {
    Words,
    Time,
}

/// Where target words come from.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum WordPolicy {
    Random,
    Sentences,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub mode: ModeKind,
    pub number_of_words: usize,
    pub number_of_secs: u64,
    pub supported_language: SupportedLanguage,
    pub policy: WordPolicy,
    pub seed: Option<u64>,
    pub restart_key: String,
    pub low_water_mark: usize,
    pub batch_size: usize,
    /// 0 means "terminal width minus a margin"
    pub max_line_width: u16,
    pub theme: ThemeConfig,
    /// Custom text to type instead of generated words; command line only
    #[serde(skip)]
    pub prompt: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: ModeKind::Words,
            number_of_words: 25,
            number_of_secs: 30,
            supported_language: SupportedLanguage::English,
            policy: WordPolicy::Random,
            seed: None,
            restart_key: "ctrl+r".to_string(),
            low_water_mark: 10,
            batch_size: 30,
            max_line_width: 80,
            theme: ThemeConfig::default(),
            prompt: None,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.mode {
            ModeKind::Words if self.prompt.is_none() && self.number_of_words == 0 => {
                return Err(ConfigError::ZeroLimit {
                    field: "number_of_words",
                });
            }
            ModeKind::Time if self.number_of_secs == 0 => {
                return Err(ConfigError::ZeroLimit {
                    field: "number_of_secs",
                });
            }
            _ => {}
        }
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroLimit {
                field: "batch_size",
            });
        }
        self.restart_binding()?;
        self.theme()?;
        Ok(())
    }

    pub fn theme(&self) -> Result<Theme, ConfigError> {
        Theme::from_config(&self.theme)
    }

    pub fn restart_binding(&self) -> Result<KeyBinding, ConfigError> {
        let binding: KeyBinding = self.restart_key.parse()?;
        if binding.is_reserved() {
            return Err(ConfigError::ReservedKey(self.restart_key.clone()));
        }
        Ok(binding)
    }

    pub fn prompt_word_count(&self) -> Option<usize> {
        self.prompt
            .as_deref()
            .map(|p| p.split_whitespace().count())
            .filter(|&n| n > 0)
    }

    pub fn mode(&self) -> Mode {
        match self.mode {
            ModeKind::Words => {
                Mode::WordCount(self.prompt_word_count().unwrap_or(self.number_of_words))
            }
            ModeKind::Time => Mode::TimeLimit(Duration::from_secs(self.number_of_secs)),
        }
    }

    pub fn refill(&self) -> Refill {
        Refill {
            low_water_mark: self.low_water_mark,
            batch_size: self.batch_size,
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            mode: self.mode(),
            refill: self.refill(),
        }
    }

    /// A prompt wins over the configured policy.
    pub fn build_source(&self) -> Result<Box<dyn WordSource>, AppError> {
        if let Some(fixed) = self.prompt.as_deref().and_then(FixedWords::from_text) {
            return Ok(Box::new(fixed));
        }
        let source: Box<dyn WordSource> = match self.policy {
            WordPolicy::Random => {
                Box::new(RandomWords::new(self.supported_language.load()?, self.seed))
            }
            WordPolicy::Sentences => Box::new(SentenceWords::new(self.seed)),
        };
        Ok(source)
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("wordrush.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lenient load that writes the defaults out when no file exists yet, so
    /// there is something to edit after the first run.
    pub fn load_or_init(&self) -> Config {
        if self.path.exists() {
            return self.load();
        }
        let cfg = Config::default();
        match self.save(&cfg) {
            Ok(()) => tracing::info!(path = %self.path.display(), "wrote default config"),
            Err(err) => tracing::warn!(%err, "could not write default config"),
        }
        cfg
    }

    /// Strict variant of [`ConfigStore::load`] for explicitly named files.
    pub fn try_load(&self) -> Result<Config, ConfigError> {
        let bytes = fs::read(&self.path).map_err(|source| ConfigError::Read {
            path: self.path.clone(),
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|source| ConfigError::Parse {
            path: self.path.clone(),
            source,
        })
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if !self.path.exists() {
            return Config::default();
        }
        match self.try_load() {
            Ok(cfg) => cfg,
            Err(err) => {
                tracing::warn!(%err, "falling back to default config");
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).map_err(std::io::Error::other)?;
        fs::write(&self.path, data)
    }
}
