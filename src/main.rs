use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    sync::mpsc,
    time::{Duration, Instant},
};

use wordrush::{
    app::{App, Flow},
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore, ModeKind, WordPolicy},
    error::AppError,
    language::SupportedLanguage,
    logging::init_tracing,
    runtime::{
        spawn_terminal_reader, spawn_ticker, AppEventSource, ChannelEventSource, FixedTicker,
        Runner,
    },
    ui::AppView,
    word_source::WordFeeder,
    TICK_RATE_MS,
};

const POLL_MS: u64 = 250;

/// word-based typing test for the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A word-based typing test with live per-character feedback, word-count and timed modes, and a results chart. Settings come from the config file and can be overridden here."
)]
pub struct Cli {
    /// number of words to use in test
    #[clap(short = 'w', long = "words")]
    number_of_words: Option<usize>,

    /// number of seconds to run test (switches to timed mode)
    #[clap(short = 's', long = "secs", conflicts_with = "number_of_words")]
    number_of_secs: Option<u64>,

    /// custom prompt to use
    #[clap(short = 'p', long)]
    prompt: Option<String>,

    /// language to pull words from
    #[clap(short = 'l', long = "language", value_enum)]
    supported_language: Option<SupportedLanguage>,

    /// how target words are picked
    #[clap(long, value_enum)]
    policy: Option<WordPolicy>,

    /// seed for a reproducible word order
    #[clap(long)]
    seed: Option<u64>,

    /// config file to read instead of the default location
    #[clap(long)]
    config: Option<PathBuf>,
}

impl Cli {
    fn load_config(&self) -> Result<Config, AppError> {
        let base = match &self.config {
            Some(path) => FileConfigStore::with_path(path).try_load()?,
            None => {
                let store = FileConfigStore::new();
                tracing::debug!(path = %store.path().display(), "loading config");
                store.load_or_init()
            }
        };
        Ok(self.apply(base))
    }

    /// Command line flags win over the config file.
    fn apply(&self, mut config: Config) -> Config {
        if let Some(n) = self.number_of_words {
            config.mode = ModeKind::Words;
            config.number_of_words = n;
        }
        if let Some(secs) = self.number_of_secs {
            config.mode = ModeKind::Time;
            config.number_of_secs = secs;
        }
        if let Some(lang) = self.supported_language {
            config.supported_language = lang;
        }
        if let Some(policy) = self.policy {
            config.policy = policy;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if self.prompt.is_some() {
            config.prompt = self.prompt.clone();
        }
        config
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let _log_guard = init_tracing(AppDirs::log_dir().as_deref());

    let config = cli.load_config()?;
    config.validate()?;
    tracing::info!(mode = ?config.mode, policy = ?config.policy, "starting");

    let (tx, rx) = mpsc::channel();
    let feeder = WordFeeder::spawn(config.build_source()?, tx.clone())?;
    let mut app = App::new(config, feeder)?;
    spawn_terminal_reader(tx.clone())?;
    spawn_ticker(FixedTicker::new(Duration::from_millis(TICK_RATE_MS)), tx)?;
    let runner = Runner::new(
        ChannelEventSource::new(rx),
        Duration::from_millis(POLL_MS),
    );

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = &result {
        tracing::error!(%err, "event loop failed");
    }
    result
}

fn start_tui<B: Backend, E: AppEventSource>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E>,
) -> Result<(), Box<dyn Error>> {
    loop {
        terminal.draw(|f| f.render_widget(AppView::new(app, Instant::now()), f.area()))?;

        let Some(event) = runner.step() else {
            break;
        };
        if app.handle(event, Instant::now()) == Flow::Quit {
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;
    use tempfile::tempdir;
    use wordrush::mode::Mode;

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["wordrush"]);

        assert_eq!(cli.number_of_words, None);
        assert_eq!(cli.number_of_secs, None);
        assert_eq!(cli.prompt, None);
        assert_eq!(cli.supported_language, None);
        assert_eq!(cli.apply(Config::default()), Config::default());
    }

    #[test]
    fn test_cli_number_of_words() {
        let cli = Cli::parse_from(["wordrush", "-w", "25"]);
        assert_eq!(cli.number_of_words, Some(25));

        let cli = Cli::parse_from(["wordrush", "--words", "50"]);
        assert_eq!(cli.apply(Config::default()).mode(), Mode::WordCount(50));
    }

    #[test]
    fn test_cli_number_of_secs_switches_to_timed_mode() {
        let cli = Cli::parse_from(["wordrush", "--secs", "60"]);
        assert_eq!(
            cli.apply(Config::default()).mode(),
            Mode::TimeLimit(Duration::from_secs(60))
        );
    }

    #[test]
    fn test_cli_words_and_secs_conflict() {
        assert!(Cli::try_parse_from(["wordrush", "-w", "5", "-s", "5"]).is_err());
    }

    #[test]
    fn test_cli_custom_prompt() {
        let cli = Cli::parse_from(["wordrush", "-p", "hello world"]);
        let cfg = cli.apply(Config::default());
        assert_eq!(cfg.prompt, Some("hello world".to_string()));
        assert_eq!(cfg.mode(), Mode::WordCount(2));
    }

    #[test]
    fn test_cli_language_policy_seed() {
        let cli = Cli::parse_from([
            "wordrush",
            "--language",
            "english-extended",
            "--policy",
            "sentences",
            "--seed",
            "7",
        ]);
        let cfg = cli.apply(Config::default());
        assert_eq!(cfg.supported_language, SupportedLanguage::EnglishExtended);
        assert_eq!(cfg.policy, WordPolicy::Sentences);
        assert_eq!(cfg.seed, Some(7));
    }

    #[test]
    fn test_cli_overrides_config_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "mode": "time", "number_of_secs": 15, "seed": 3 }"#).unwrap();

        let path_arg = path.to_string_lossy().to_string();
        let cli = Cli::parse_from(["wordrush", "--config", &path_arg]);
        let cfg = cli.load_config().unwrap();
        assert_eq!(cfg.mode(), Mode::TimeLimit(Duration::from_secs(15)));
        assert_eq!(cfg.seed, Some(3));

        let cli = Cli::parse_from(["wordrush", "--config", &path_arg, "-w", "10"]);
        let cfg = cli.load_config().unwrap();
        assert_eq!(cfg.mode(), Mode::WordCount(10));
        assert_eq!(cfg.seed, Some(3));
    }

    #[test]
    fn test_cli_missing_config_file_is_an_error() {
        let cli = Cli::parse_from(["wordrush", "--config", "/definitely/not/here.json"]);
        assert!(cli.load_config().is_err());
    }
}
