use clap::ValueEnum;
use include_dir::{include_dir, Dir};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

static LANG_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/lang");

/// Word lists bundled into the binary.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, ValueEnum, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum SupportedLanguage {
    #[strum(to_string = "english")]
    English,
    #[strum(to_string = "english_extended")]
    EnglishExtended,
}

impl SupportedLanguage {
    pub fn load(&self) -> Result<Language, AppError> {
        Language::from_bundle(&self.to_string())
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct Language {
    pub name: String,
    pub size: u32,
    pub words: Vec<String>,
}

impl Language {
    pub fn from_bundle(name: &str) -> Result<Self, AppError> {
        let file = LANG_DIR
            .get_file(format!("{name}.json"))
            .ok_or_else(|| AppError::MissingCorpus(name.to_string()))?;
        let contents = file
            .contents_utf8()
            .ok_or_else(|| AppError::MissingCorpus(name.to_string()))?;
        Self::from_json(name, contents)
    }

    pub fn from_json(name: &str, json: &str) -> Result<Self, AppError> {
        let mut lang: Language = serde_json::from_str(json).map_err(|source| AppError::Corpus {
            name: name.to_string(),
            source,
        })?;

        lang.words
            .retain(|w| !w.is_empty() && !w.chars().any(char::is_whitespace));
        if lang.words.is_empty() {
            return Err(AppError::EmptyCorpus(name.to_string()));
        }
        Ok(lang)
    }
}
