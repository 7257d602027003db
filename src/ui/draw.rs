//! Terminal user interface for the drawing surface.
//!
//! Captures mouse input over a bordered sketch area, resolves cell positions
//! to canvas-relative coordinates and forwards them to the sketch pad as
//! pointer events. Mouse capture is enabled for the whole screen so drags
//! never fall through to terminal selection or scrolling.

use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, MouseButton,
        MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    prelude::*,
    symbols::Marker,
    widgets::{
        canvas::{Canvas, Points},
        Block, Paragraph,
    },
};
use std::io::{stdout, Stdout};
use std::time::Duration;

use crate::canvas::{Point, SketchPad};

/// User input command during the drawing screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawCommand {
    /// Keep looping
    Continue,
    /// Erase the surface ('c')
    Clear,
    /// Save the PNG to the download path ('s')
    Save,
    /// Export base64 and leave (Enter)
    Export,
    /// Leave without exporting (Escape, 'q', Ctrl+C)
    Cancel,
}

/// Terminal UI for the drawing screen.
pub struct DrawTui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    surface_width: u32,
    surface_height: u32,
    /// Inner sketch area from the last rendered frame, for mouse mapping
    sketch_area: Rect,
    status_line: String,
}

impl DrawTui {
    /// Creates the drawing screen, entering alternate screen mode and
    /// enabling mouse capture.
    ///
    /// # Errors
    /// - If terminal cannot be initialized
    /// - If raw mode or mouse capture cannot be enabled
    pub fn new(surface_width: u32, surface_height: u32) -> anyhow::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = stdout();
        execute!(
            stdout,
            crossterm::terminal::EnterAlternateScreen,
            EnableMouseCapture
        )?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(DrawTui {
            terminal,
            surface_width,
            surface_height,
            sketch_area: Rect::default(),
            status_line: String::new(),
        })
    }

    /// Sets the transient status message in the footer.
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_line = message.into();
    }

    /// Processes user input, forwarding mouse events to the sketch pad.
    ///
    /// # Errors
    /// - If event polling fails
    pub fn handle_input(&mut self, pad: &mut SketchPad) -> anyhow::Result<DrawCommand> {
        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key) => {
                    return Ok(match key.code {
                        KeyCode::Char('c')
                            if key
                                .modifiers
                                .contains(crossterm::event::KeyModifiers::CONTROL) =>
                        {
                            DrawCommand::Cancel
                        }
                        KeyCode::Char('c') => {
                            tracing::debug!("'c' pressed: clearing surface");
                            DrawCommand::Clear
                        }
                        KeyCode::Char('s') => {
                            tracing::debug!("'s' pressed: saving drawing");
                            DrawCommand::Save
                        }
                        KeyCode::Enter => {
                            tracing::debug!("Enter pressed: exporting drawing");
                            DrawCommand::Export
                        }
                        KeyCode::Char('q') | KeyCode::Esc => DrawCommand::Cancel,
                        _ => DrawCommand::Continue,
                    });
                }
                Event::Mouse(mouse) => {
                    self.handle_mouse(pad, mouse);
                }
                _ => {}
            }
        }
        Ok(DrawCommand::Continue)
    }

    /// Routes a mouse event into the pointer state machine.
    fn handle_mouse(&mut self, pad: &mut SketchPad, mouse: MouseEvent) {
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(point) = self.to_canvas_point(mouse.column, mouse.row) {
                    pad.pointer_down(point);
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                match self.to_canvas_point(mouse.column, mouse.row) {
                    Some(point) => pad.pointer_move(point),
                    // Dragging off the sketch area closes the path
                    None => pad.pointer_leave(),
                }
            }
            MouseEventKind::Up(MouseButton::Left) => {
                pad.pointer_up();
            }
            _ => {}
        }
    }

    /// Maps a terminal cell onto a canvas-relative coordinate. Returns
    /// `None` outside the sketch area.
    fn to_canvas_point(&self, column: u16, row: u16) -> Option<Point> {
        let area = self.sketch_area;
        if area.width == 0
            || area.height == 0
            || column < area.x
            || column >= area.x + area.width
            || row < area.y
            || row >= area.y + area.height
        {
            return None;
        }

        let x = (column - area.x) as f32 + 0.5;
        let y = (row - area.y) as f32 + 0.5;
        Some(Point::new(
            x / area.width as f32 * self.surface_width as f32,
            y / area.height as f32 * self.surface_height as f32,
        ))
    }

    /// Renders one frame: the sketch preview and the footer.
    ///
    /// # Errors
    /// - If terminal rendering fails
    pub fn render(&mut self, pad: &SketchPad) -> anyhow::Result<()> {
        // Collect painted pixel coordinates for the braille preview
        let mut points: Vec<(f64, f64)> = Vec::new();
        if let Some(surface) = pad.surface() {
            for y in 0..surface.height() {
                for x in 0..surface.width() {
                    if surface.alpha_at(x, y) > 0 {
                        // Canvas widget y-axis grows upward
                        points.push((x as f64, (surface.height() - 1 - y) as f64));
                    }
                }
            }
        }

        let surface_width = self.surface_width as f64;
        let surface_height = self.surface_height as f64;

        self.terminal.draw(|frame| {
            let area = frame.area();

            let footer_height = 1;
            let content_area = Rect {
                x: area.x,
                y: area.y,
                width: area.width,
                height: area.height.saturating_sub(footer_height),
            };

            let block = Block::bordered()
                .title(" sketch ")
                .style(Style::default().fg(Color::Rgb(185, 207, 212)));
            self.sketch_area = block.inner(content_area);

            let preview = Canvas::default()
                .block(block)
                .marker(Marker::Braille)
                .x_bounds([0.0, surface_width])
                .y_bounds([0.0, surface_height])
                .paint(|ctx| {
                    ctx.draw(&Points {
                        coords: &points,
                        color: Color::White,
                    });
                });
            frame.render_widget(preview, content_area);

            let footer_area = Rect {
                x: area.x,
                y: area.y + area.height.saturating_sub(footer_height),
                width: area.width,
                height: footer_height,
            };
            let keys = "drag to draw · c clear · s save png · enter export · q quit";
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

    /// Cleans up terminal state, disabling mouse capture and leaving
    /// alternate screen mode.
    ///
    /// # Errors
    /// - If terminal mode cannot be disabled
    pub fn cleanup(&mut self) -> anyhow::Result<()> {
        disable_raw_mode()?;
        execute!(
            self.terminal.backend_mut(),
            DisableMouseCapture,
            crossterm::terminal::LeaveAlternateScreen
        )?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}
