use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "wordrush").map(|pd| pd.config_dir().join("config.json"))
    }

    /// Where log files go; follows `$HOME/.local/state` when HOME is set.
    pub fn log_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join("wordrush"),
            )
        } else {
            ProjectDirs::from("", "", "wordrush").map(|pd| pd.data_local_dir().join("logs"))
        }
    }
}
