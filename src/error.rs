use std::io;
use std::path::PathBuf;

/// Problems with user configuration, reported once at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} must be greater than zero")]
    ZeroLimit { field: &'static str },
    #[error("unknown key binding `{0}`")]
    KeyBinding(String),
    #[error("`{0}` is needed for typing and cannot be the restart key")]
    ReservedKey(String),
    #[error("invalid color `{value}` for {field}")]
    Color { field: &'static str, value: String },
    #[error("could not read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("word list `{0}` is not bundled")]
    MissingCorpus(String),
    #[error("word list `{name}` is malformed: {source}")]
    Corpus {
        name: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("word list `{0}` has no usable words")]
    EmptyCorpus(String),
}
