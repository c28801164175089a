pub mod charting;

use std::time::Instant;

use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Axis, Block, Chart, Dataset, Gauge, GraphType, Paragraph, Widget},
};
use unicode_width::UnicodeWidthChar;

use crate::{
    app::{App, AppState},
    diff::{self, CharClass},
    mode::Mode,
    session::Session,
    stats::Stats,
    theme::Theme,
};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;
/// Rows of words shown at once while typing
const VISIBLE_LINES: usize = 3;

/// Renders the app as of `now`; elapsed time and progress depend on it.
pub struct AppView<'a> {
    app: &'a App,
    now: Instant,
}

impl<'a> AppView<'a> {
    pub fn new(app: &'a App, now: Instant) -> Self {
        Self { app, now }
    }
}

impl Widget for AppView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Block::default()
            .style(self.app.theme().base())
            .render(area, buf);

        let stats = self.app.stats(self.now);
        match self.app.state() {
            AppState::Typing => render_typing(self.app, &stats, area, buf),
            AppState::Results => render_results(self.app, &stats, area, buf),
        }
    }
}

/// Width available for one row of words. A configured width of 0 means the
/// terminal width minus the margins.
pub fn line_width(area_width: u16, max_line_width: u16) -> u16 {
    let available = area_width.saturating_sub(HORIZONTAL_MARGIN * 2);
    let width = if max_line_width == 0 {
        available
    } else {
        max_line_width.min(available)
    };
    width.max(1)
}

/// One word slot, ready to be placed on a row.
#[derive(Debug, Clone)]
struct WordCell {
    spans: Vec<Span<'static>>,
    width: usize,
}

fn char_span(c: char, style: Style) -> (Span<'static>, usize) {
    (
        Span::styled(c.to_string(), style),
        UnicodeWidthChar::width(c).unwrap_or(0),
    )
}

fn word_cell(session: &Session, idx: usize, theme: &Theme) -> WordCell {
    let target = session.target_word(idx);
    let cursor = session.cursor();

    if idx > cursor.word {
        let width = target
            .chars()
            .map(|c| UnicodeWidthChar::width(c).unwrap_or(0))
            .sum();
        return WordCell {
            spans: vec![Span::styled(target.to_string(), theme.untyped)],
            width,
        };
    }

    let typed = session
        .typed_words()
        .get(idx)
        .map(String::as_str)
        .unwrap_or_default();
    // finished words that differ from their target stay marked
    let mismatch = idx < cursor.word && diff::is_word_mismatch(target, typed);

    let mut spans = Vec::new();
    let mut width = 0;
    for (pos, classified) in diff::classify_word(target, typed).iter().enumerate() {
        let mut style = theme.style_for(classified.class);
        if mismatch {
            style = style.add_modifier(Modifier::UNDERLINED);
        }
        if idx == cursor.word && pos == cursor.char && classified.class == CharClass::Untyped {
            style = style.add_modifier(Modifier::UNDERLINED | Modifier::REVERSED);
        }
        let (span, w) = char_span(theme.glyph(classified), style);
        spans.push(span);
        width += w;
    }

    WordCell { spans, width }
}

/// Greedy wrap of word cells into rows no wider than `max_width`. Returns the
/// rows and the index of the row holding the cursor.
fn layout_words(
    session: &Session,
    theme: &Theme,
    max_width: usize,
) -> (Vec<Line<'static>>, usize) {
    let cursor_word = session.cursor().word;
    let mut rows: Vec<Vec<WordCell>> = vec![Vec::new()];
    let mut row_width = 0;
    let mut cursor_row = 0;

    for idx in 0..session.target_words().len().max(cursor_word + 1) {
        let cell = word_cell(session, idx, theme);
        let needed = if row_width == 0 {
            cell.width
        } else {
            row_width + 1 + cell.width
        };
        if row_width > 0 && needed > max_width {
            rows.push(Vec::new());
            row_width = cell.width;
        } else {
            row_width = needed;
        }
        if idx == cursor_word {
            cursor_row = rows.len() - 1;
        }
        if let Some(row) = rows.last_mut() {
            row.push(cell);
        }
    }

    let lines = rows
        .into_iter()
        .map(|row| {
            let spans = row
                .into_iter()
                .map(|cell| cell.spans)
                .intersperse(vec![Span::raw(" ")])
                .flatten()
                .collect::<Vec<_>>();
            Line::from(spans)
        })
        .collect();
    (lines, cursor_row)
}

fn stats_lines(stats: &Stats) -> Vec<Line<'static>> {
    vec![
        Line::from(format!("Total Characters: {}", stats.total_chars)),
        Line::from(format!("Total Words: {}", stats.total_words)),
        Line::from(format!("WPM: {:.2}", stats.wpm)),
    ]
}

fn header_text(session: &Session, stats: &Stats) -> String {
    match session.mode() {
        Mode::TimeLimit(limit) => {
            let left = limit.saturating_sub(stats.elapsed);
            format!("{:.0}", left.as_secs_f64().ceil())
        }
        Mode::WordCount(n) => format!("{}/{}", session.cursor().word.min(n), n),
    }
}

fn render_typing(app: &App, stats: &Stats, area: Rect, buf: &mut Buffer) {
    let session = app.session();
    let theme = app.theme();
    let dim_bold_style = Style::default()
        .add_modifier(Modifier::BOLD)
        .add_modifier(Modifier::DIM);

    let width = line_width(area.width, app.config().max_line_width);
    let (lines, cursor_row) = layout_words(session, theme, width as usize);
    let first = cursor_row.saturating_sub(1);
    let visible: Vec<Line> = lines.into_iter().skip(first).take(VISIBLE_LINES).collect();

    let stats_height = if app.show_stats { 3 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(stats_height),
            Constraint::Length(1),
            Constraint::Length(visible.len() as u16),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Fill(1),
        ])
        .split(area);

    let text_area = centered(chunks[3], width);

    if app.show_stats {
        Paragraph::new(stats_lines(stats))
            .style(dim_bold_style)
            .alignment(Alignment::Left)
            .render(centered(chunks[1], width.max(24)), buf);
    }

    Paragraph::new(Span::styled(header_text(session, stats), dim_bold_style))
        .alignment(Alignment::Left)
        .render(centered(chunks[2], width), buf);

    Paragraph::new(visible).render(text_area, buf);

    Gauge::default()
        .gauge_style(theme.correct.remove_modifier(Modifier::BOLD))
        .ratio(stats.progress.clamp(0.0, 1.0))
        .label("")
        .render(centered(chunks[5], width), buf);
}

fn centered(area: Rect, width: u16) -> Rect {
    let width = width.min(area.width);
    Rect {
        x: area.x + (area.width - width) / 2,
        width,
        ..area
    }
}

fn render_results(app: &App, stats: &Stats, area: Rect, buf: &mut Buffer) {
    let session = app.session();
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);
    let magenta_style = Style::default().fg(Color::Magenta);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(1),    // chart
            Constraint::Length(1), // headline numbers
            Constraint::Length(1), // totals
            Constraint::Length(1), // padding
            Constraint::Length(1), // legend
        ])
        .split(area);

    let fallback_secs = session
        .mode()
        .time_limit()
        .map(|d| d.as_secs_f64())
        .unwrap_or_else(|| stats.elapsed_secs());
    let (overall_duration, highest_wpm) =
        charting::compute_chart_params(session.trace(), fallback_secs);

    let tuples = session.trace().as_tuples();
    let datasets = vec![Dataset::default()
        .marker(ratatui::symbols::Marker::Braille)
        .style(magenta_style)
        .graph_type(GraphType::Line)
        .data(&tuples)];

    Chart::new(datasets)
        .x_axis(
            Axis::default()
                .title("seconds")
                .bounds([0.0, overall_duration])
                .labels(vec![
                    Span::styled("0", bold_style),
                    Span::styled(charting::format_label(overall_duration), bold_style),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("wpm")
                .bounds([0.0, highest_wpm])
                .labels(vec![
                    Span::styled("0", bold_style),
                    Span::styled(charting::format_label(highest_wpm), bold_style),
                ]),
        )
        .render(chunks[0], buf);

    let consistency = stats
        .consistency
        .map(|sd| format!("{sd:.2}"))
        .unwrap_or_else(|| "-".to_string());
    Paragraph::new(Span::styled(
        format!(
            "{}   {}% acc   {} errors   {} sd",
            stats.wpm_label(),
            stats.accuracy,
            stats.total_errors,
            consistency
        ),
        bold_style,
    ))
    .alignment(Alignment::Center)
    .render(chunks[1], buf);

    Paragraph::new(Span::styled(
        format!(
            "Total Characters: {}   Total Words: {}   {:.1}s",
            stats.total_chars,
            stats.total_words,
            stats.elapsed_secs()
        ),
        Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
    .render(chunks[2], buf);

    Paragraph::new(Span::styled(
        format!("({}) restart / (esc) quit", app.config().restart_key),
        italic_style,
    ))
    .render(chunks[4], buf);
}
