//! Console rendering: a crossterm-backed [`Executor`] for the `vns` binary.
//!
//! Text goes straight to the writer.  `[l]` key waits switch the terminal
//! into raw mode only for the duration of the wait; Esc or Ctrl-C abort the
//! script with an [`Interrupt`].

use std::io::{self, Write};
use std::thread;
use std::time::Duration;

use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    queue,
    style::{Attribute, Color, ContentStyle, Print, ResetColor, SetStyle},
    terminal::{self, ClearType},
};

use crate::config::Config;
use crate::script::{Executor, Font, Interrupt, Rgb};

// ── Font → crossterm style ────────────────────────────────────────────────────

/// Apply the fields `font` sets on top of `base`.
///
/// A reset font returns the default style.  Fields a console cannot show
/// (size, face, ruby, shadow, edge) are ignored.
pub fn font_style(base: ContentStyle, font: &Font) -> ContentStyle {
    if font.is_reset() {
        return ContentStyle::new();
    }
    let mut style = base;
    if let Some(c) = font.color {
        style.foreground_color = Some(rgb_color(c));
    }
    match font.bold {
        Some(true) => style.attributes.set(Attribute::Bold),
        Some(false) => style.attributes.unset(Attribute::Bold),
        None => {}
    }
    style
}

fn rgb_color(c: Rgb) -> Color {
    Color::Rgb { r: c.r, g: c.g, b: c.b }
}

// ── Settings ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsoleSettings {
    pub indent_width: usize,
    /// Percent applied to wait times; `0` skips them.
    pub wait_scale: u32,
    pub auto_advance: bool,
    pub color: bool,
}

impl ConsoleSettings {
    /// Settings from `config`; `is_tty` decides colour when the config
    /// leaves it unset.
    pub fn from_config(config: &Config, is_tty: bool) -> Self {
        ConsoleSettings {
            indent_width: config.indent_width,
            wait_scale: config.wait_scale,
            auto_advance: config.auto_advance,
            color: config.color.unwrap_or(is_tty),
        }
    }
}

// ── ConsoleExecutor ───────────────────────────────────────────────────────────

pub struct ConsoleExecutor<W: Write> {
    out: W,
    settings: ConsoleSettings,
    style: ContentStyle,
}

impl<W: Write> ConsoleExecutor<W> {
    pub fn new(out: W, settings: ConsoleSettings) -> Self {
        ConsoleExecutor {
            out,
            settings,
            style: ContentStyle::new(),
        }
    }

    pub fn settings(&self) -> &ConsoleSettings {
        &self.settings
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    /// Scaled wait duration, or `None` when nothing should be waited.
    fn scaled_wait(&self, millis: i32) -> Option<Duration> {
        if millis <= 0 || self.settings.wait_scale == 0 {
            return None;
        }
        let ms = millis as u64 * u64::from(self.settings.wait_scale) / 100;
        (ms > 0).then(|| Duration::from_millis(ms))
    }
}

fn io_interrupt(e: io::Error) -> Interrupt {
    Interrupt::new(format!("console: {e}"))
}

/// Block until a key is pressed.  Esc and Ctrl-C are reported as an error.
fn read_key() -> io::Result<bool> {
    terminal::enable_raw_mode()?;
    let _guard = RawModeGuard;
    loop {
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            let ctrl_c = key.code == KeyCode::Char('c')
                && key.modifiers.contains(KeyModifiers::CONTROL);
            return Ok(!(ctrl_c || key.code == KeyCode::Esc));
        }
    }
}

impl<W: Write> Executor for ConsoleExecutor<W> {
    fn print_text(&mut self, text: &str) -> Result<(), Interrupt> {
        let written = if self.settings.color && self.style != ContentStyle::new() {
            queue!(self.out, SetStyle(self.style), Print(text), ResetColor)
        } else {
            queue!(self.out, Print(text))
        };
        written.map_err(io_interrupt)
    }

    fn start_new_line(&mut self) -> Result<(), Interrupt> {
        writeln!(self.out).map_err(io_interrupt)
    }

    fn wait_any_key(&mut self) -> Result<(), Interrupt> {
        self.out.flush().map_err(io_interrupt)?;
        if self.settings.auto_advance {
            return Ok(());
        }
        match read_key() {
            Ok(true) => Ok(()),
            Ok(false) => Err(Interrupt::new("aborted by user")),
            Err(e) => Err(io_interrupt(e)),
        }
    }

    fn start_new_page(&mut self) -> Result<(), Interrupt> {
        queue!(self.out, terminal::Clear(ClearType::All), cursor::MoveTo(0, 0))
            .map_err(io_interrupt)
    }

    fn wait_time(&mut self, millis: i32) -> Result<(), Interrupt> {
        self.out.flush().map_err(io_interrupt)?;
        if let Some(d) = self.scaled_wait(millis) {
            log::trace!("sleeping {d:?}");
            thread::sleep(d);
        }
        Ok(())
    }

    fn indent(&mut self, count: u32) -> Result<(), Interrupt> {
        let width = count as usize * self.settings.indent_width;
        write!(self.out, "{:width$}", "").map_err(io_interrupt)
    }

    fn set_font(&mut self, font: &Font) -> Result<(), Interrupt> {
        self.style = font_style(self.style, font);
        Ok(())
    }
}

// ── RawModeGuard ──────────────────────────────────────────────────────────────

/// RAII guard that disables raw mode on drop.
struct RawModeGuard;

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
