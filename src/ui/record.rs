//! Terminal user interface for the audio capture screen.
//!
//! Shows the live countdown, an RMS level strip so the user can see the
//! microphone is alive, and the decorative word backdrop. Input handling
//! follows the toggle contract: one key both starts and stops the session.

use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    prelude::*,
    widgets::{Paragraph, Sparkline},
};
use std::io::{stdout, Stdout};
use std::time::{Duration, Instant};

use crate::words::WordField;

/// Reference level in dBFS mapped to 100% on the meter.
const REFERENCE_LEVEL_DB: f32 = -20.0;

/// Spoken prompt shown while recording.
const RECORDING_PROMPT: &str = "Say: \"A quick brown fox jumps over a lazy dog.\"";

/// User input command during the capture screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordCommand {
    /// Keep looping (no key pressed)
    Continue,
    /// Start or stop the session (Space)
    Toggle,
    /// Leave the screen (Escape, 'q', Ctrl+C)
    Cancel,
}

/// Terminal UI for the capture screen.
pub struct RecordTui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    word_field: WordField,
    volume_history: Vec<u64>,
    last_sample_time: Instant,
    sample_interval: Duration,
    terminal_width: usize,
    sample_rate: u32,
    status_line: String,
}

impl RecordTui {
    /// Creates the capture screen and enters alternate screen mode.
    ///
    /// # Errors
    /// - If terminal cannot be initialized
    /// - If raw mode cannot be enabled
    pub fn new(sample_rate: u32, word_field: WordField) -> anyhow::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = stdout();
        execute!(stdout, crossterm::terminal::EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        let size = terminal.size()?;
        let terminal_width = size.width as usize;

        Ok(RecordTui {
            terminal,
            word_field,
            volume_history: vec![0u64; terminal_width],
            last_sample_time: Instant::now(),
            sample_interval: Duration::from_millis(50),
            terminal_width,
            sample_rate,
            status_line: String::new(),
        })
    }

    /// Sets the transient status message in the footer.
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_line = message.into();
    }

    /// Processes user input and returns the appropriate command.
    ///
    /// # Errors
    /// - If event polling fails
    pub fn handle_input(&mut self) -> anyhow::Result<RecordCommand> {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                return Ok(match key.code {
                    KeyCode::Char(' ') => {
                        tracing::debug!("Space pressed: toggling capture session");
                        RecordCommand::Toggle
                    }
                    KeyCode::Char('q') | KeyCode::Esc => {
                        tracing::debug!("Escape or 'q' pressed: leaving capture screen");
                        RecordCommand::Cancel
                    }
                    KeyCode::Char('c')
                        if key
                            .modifiers
                            .contains(crossterm::event::KeyModifiers::CONTROL) =>
                    {
                        RecordCommand::Cancel
                    }
                    _ => RecordCommand::Continue,
                });
            }
        }
        Ok(RecordCommand::Continue)
    }

    /// Renders one frame of the capture screen.
    ///
    /// # Errors
    /// - If terminal rendering fails
    pub fn render(
        &mut self,
        recording: bool,
        remaining_secs: u32,
        samples: &[i16],
    ) -> anyhow::Result<()> {
        let current_volume = self.calculate_volume(samples, recording);

        if recording && self.last_sample_time.elapsed() >= self.sample_interval {
            self.volume_history.push(current_volume as u64);
            if self.volume_history.len() > self.terminal_width {
                self.volume_history.remove(0);
            }
            self.last_sample_time = Instant::now();
        }

        let size = self.terminal.size()?;
        let current_width = size.width as usize;
        if current_width != self.terminal_width {
            self.terminal_width = current_width;
            while self.volume_history.len() > self.terminal_width {
                self.volume_history.remove(0);
            }
            while self.volume_history.len() < self.terminal_width {
                self.volume_history.insert(0, 0);
            }
        }

        self.terminal.draw(|frame| {
            let area = frame.area();

            let footer_height = 1;
            let meter_height = area.height / 4;
            let content_area = Rect {
                x: area.x,
                y: area.y,
                width: area.width,
                height: area
                    .height
                    .saturating_sub(footer_height)
                    .saturating_sub(meter_height),
            };

            // Decorative word backdrop behind everything else
            for word in self.word_field.words() {
                let x = area.x + (word.left * content_area.width.saturating_sub(1) as f32) as u16;
                let y = area.y + (word.top * content_area.height.saturating_sub(1) as f32) as u16;
                let style = if word.font_px >= 28.0 {
                    Style::default().fg(Color::Rgb(90, 90, 110))
                } else {
                    Style::default().fg(Color::Rgb(55, 55, 70))
                };
                let max_len = content_area.width.saturating_sub(x) as usize;
                if max_len > 0 && y < content_area.y + content_area.height {
                    let text: String = word.text.chars().take(max_len).collect();
                    frame.buffer_mut().set_string(x, y, text, style);
                }
            }

            // Centered session state
            let (headline, headline_style) = if recording {
                let plural = if remaining_secs == 1 { "" } else { "s" };
                (
                    format!("● Recording... ({remaining_secs} second{plural} remaining)"),
                    Style::default().fg(Color::Red).bold(),
                )
            } else {
                (
                    "Press Space to record your story prompt".to_string(),
                    Style::default().fg(Color::Rgb(206, 224, 220)),
                )
            };

            let mut lines = vec![Line::from(Span::styled(headline, headline_style))];
            if recording {
                lines.push(Line::from(Span::styled(
                    RECORDING_PROMPT,
                    Style::default().fg(Color::Rgb(185, 207, 212)).italic(),
                )));
            }

            let center = Paragraph::new(lines).alignment(Alignment::Center);
            let center_area = Rect {
                x: content_area.x,
                y: content_area.y + content_area.height / 2,
                width: content_area.width,
                height: 2.min(content_area.height),
            };
            frame.render_widget(center, center_area);

            // Level meter strip
            let meter_area = Rect {
                x: area.x,
                y: content_area.y + content_area.height,
                width: area.width,
                height: meter_height,
            };
            let meter = Sparkline::default()
                .data(&self.volume_history)
                .max(100)
                .style(
                    Style::default()
                        .bg(Color::Rgb(0, 0, 0))
                        .fg(Color::Rgb(206, 224, 220)),
                );
            frame.render_widget(meter, meter_area);

            // Footer: keys and transient status
            let footer_area = Rect {
                x: area.x,
                y: area.y + area.height.saturating_sub(footer_height),
                width: area.width,
                height: footer_height,
            };
            let keys = if recording {
                "space stop · q quit"
            } else {
                "space record · q quit"
            };
            let footer_text = if self.status_line.is_empty() {
                keys.to_string()
            } else {
                format!("{} · {}", self.status_line, keys)
            };
            let footer = Paragraph::new(footer_text).style(
                Style::default()
                    .fg(Color::Rgb(185, 207, 212))
                    .bg(Color::Rgb(0, 0, 0)),
            );
            frame.render_widget(footer, footer_area);
        })?;

        Ok(())
    }

    /// Converts recent RMS sample energy to a 0-100% meter value.
    fn calculate_volume(&mut self, samples: &[i16], recording: bool) -> u8 {
        if !recording || samples.is_empty() {
            return 0;
        }

        let last_samples_count =
            std::cmp::min(self.sample_rate / 20, samples.len() as u32) as usize;
        let recent_samples = &samples[samples.len() - last_samples_count..];

        let sum_of_squares: i64 = recent_samples.iter().map(|&x| (x as i64).pow(2)).sum();
        let mean_square = sum_of_squares / recent_samples.len() as i64;
        let rms = (mean_square as f32).sqrt();

        let db_fs = if rms > 0.0 {
            20.0 * (rms / 32767.0).log10()
        } else {
            -160.0
        };

        let min_db = REFERENCE_LEVEL_DB - 40.0;
        ((db_fs - min_db) / 40.0 * 100.0).clamp(0.0, 100.0) as u8
    }

    /// Cleans up terminal state and exits alternate screen mode.
    ///
    /// # Errors
    /// - If terminal mode cannot be disabled
    pub fn cleanup(&mut self) -> anyhow::Result<()> {
        disable_raw_mode()?;
        execute!(
            self.terminal.backend_mut(),
            crossterm::terminal::LeaveAlternateScreen
        )?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}
