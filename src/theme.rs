use std::str::FromStr;

use ratatui::style::{Color, Modifier, Style};
use serde::{Deserialize, Serialize};

use crate::diff::{CharClass, ClassifiedChar};
use crate::error::ConfigError;

/// Colors as written in the config file, e.g. `"green"` or `"#e2b714"`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ThemeConfig {
    pub correct: String,
    pub error: String,
    pub extra: String,
    pub untyped: String,
    pub background: String,
    /// Show the expected character instead of the typed one on substitutions
    pub error_shows_expected: bool,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            correct: "green".to_string(),
            error: "red".to_string(),
            extra: "#7e2a33".to_string(),
            untyped: "darkgray".to_string(),
            background: "reset".to_string(),
            error_shows_expected: false,
        }
    }
}

/// Resolved styles, passed to rendering explicitly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Theme {
    pub correct: Style,
    pub error: Style,
    pub extra: Style,
    pub untyped: Style,
    pub background: Color,
    pub error_shows_expected: bool,
}

fn parse_color(field: &'static str, value: &str) -> Result<Color, ConfigError> {
    Color::from_str(value).map_err(|_| ConfigError::Color {
        field,
        value: value.to_string(),
    })
}

impl Theme {
    pub fn from_config(cfg: &ThemeConfig) -> Result<Self, ConfigError> {
        let background = parse_color("background", &cfg.background)?;
        let base = Style::default()
            .bg(background)
            .add_modifier(Modifier::BOLD);

        Ok(Self {
            correct: base.fg(parse_color("correct", &cfg.correct)?),
            error: base.fg(parse_color("error", &cfg.error)?),
            extra: base.fg(parse_color("extra", &cfg.extra)?),
            untyped: base
                .fg(parse_color("untyped", &cfg.untyped)?)
                .add_modifier(Modifier::DIM),
            background,
            error_shows_expected: cfg.error_shows_expected,
        })
    }

    pub fn base(&self) -> Style {
        Style::default().bg(self.background)
    }

    pub fn style_for(&self, class: CharClass) -> Style {
        match class {
            CharClass::Correct => self.correct,
            CharClass::Substitution => self.error,
            CharClass::Extra => self.extra,
            CharClass::Untyped => self.untyped,
        }
    }

    /// Character to draw for a classified span.
    pub fn glyph(&self, span: &ClassifiedChar) -> char {
        match (span.class, span.expected) {
            (CharClass::Substitution, Some(expected)) if self.error_shows_expected => expected,
            _ => span.ch,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        // the built-in colors always parse
        Self::from_config(&ThemeConfig::default()).unwrap_or(Self {
            correct: Style::default().fg(Color::Green),
            error: Style::default().fg(Color::Red),
            extra: Style::default().fg(Color::LightRed),
            untyped: Style::default().fg(Color::DarkGray),
            background: Color::Reset,
            error_shows_expected: false,
        })
    }
}
