//! Status display adapter with a text fallback.
//!
//! The pixel-pushing backend (SSD1306 or anything else that can draw a few
//! text lines) is an external collaborator behind [`DisplayBackend`]; the
//! adapter only decides between delegating and falling back, and shields
//! callers from backend failures.

use tracing::{info, warn};

use crate::errors::DisplayError;

/// Maximum lines a frame can carry; a 128x64 panel fits four at the fixed
/// line spacing.
pub const MAX_LINES: usize = 4;

/// An ordered set of up to [`MAX_LINES`] short text lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayFrame {
    lines: Vec<String>,
}

impl DisplayFrame {
    /// Builds a frame, keeping only the first [`MAX_LINES`] entries.
    pub fn new(lines: impl IntoIterator<Item = String>) -> Self {
        Self {
            lines: lines.into_iter().take(MAX_LINES).collect(),
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

/// Clears and redraws the panel with the given lines at a fixed vertical
/// spacing. Implementations own address setup, fonts and flushing.
pub trait DisplayBackend: Send {
    fn render(&mut self, lines: &[String]) -> Result<(), DisplayError>;
}

/// Renders frames to a backend when one is attached, or to the log as a
/// textual fallback when none is.
pub struct StatusDisplay {
    backend: Option<Box<dyn DisplayBackend>>,
}

impl StatusDisplay {
    pub fn new(backend: Option<Box<dyn DisplayBackend>>) -> Self {
        Self { backend }
    }

    /// Adapter with no physical panel; frames go to the text fallback.
    pub fn headless() -> Self {
        Self { backend: None }
    }

    pub fn has_backend(&self) -> bool {
        self.backend.is_some()
    }

    /// Renders a frame. A backend failure is logged and swallowed; this
    /// never returns an error and never panics, so a flaky panel cannot
    /// take the application down with it.
    pub fn render(&mut self, frame: &DisplayFrame) {
        match self.backend.as_mut() {
            Some(backend) => {
                if let Err(e) = backend.render(frame.lines()) {
                    warn!("[display] render failed: {}", e);
                }
            }
            None => {
                for line in frame.lines() {
                    info!("[display] {}", line);
                }
            }
        }
    }
}
