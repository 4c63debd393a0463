//! Exception capture and rendering
//!
//! Rust has no ambient "currently handled exception" the way the original
//! implementation's host language does, so capture is triggered explicitly:
//! callers pass the error value being logged (see [`crate::logger::Logger::exception`]
//! and [`crate::catcher::Catcher`]) instead of the library inspecting
//! interpreter state. The traceback chain is still rebuilt from a live stack
//! snapshot exactly as spec §4.4 describes, using `backtrace::Backtrace`.

use std::fmt;

/// One frame in a captured traceback. At most one frame per [`CapturedException`]
/// carries `is_caught_point`.
#[derive(Debug, Clone)]
pub struct TracebackFrame {
    pub function: String,
    pub file: String,
    pub line: u32,
    pub is_caught_point: bool,
}

/// A captured exception: the error's reported type/message plus the
/// traceback chain reconstructed at the point it was logged.
#[derive(Debug, Clone)]
pub struct CapturedException {
    pub type_name: String,
    pub message: String,
    pub frames: Vec<TracebackFrame>,
}

/// Frames whose resolved source file lives under this crate's own `src/`
/// directory are internal and must not appear in a rendered traceback.
fn is_internal_frame(file: &str) -> bool {
    let manifest_src = concat!(env!("CARGO_MANIFEST_DIR"), "/src");
    file.starts_with(manifest_src)
}

impl CapturedException {
    /// Captures the current call stack as a traceback chain.
    ///
    /// `caught_point_depth` selects which surviving (non-internal) frame is
    /// marked as the caught point: `0` for a direct `exception()` call (the
    /// frame that called into the logger is the caught point), `1` for a
    /// catcher-mediated emission, whose wrapper sits one frame further out
    /// between the user's function and the logger (spec §4.4 point 4, §4.5).
    pub fn capture(
        type_name: impl Into<String>,
        message: impl Into<String>,
        caught_point_depth: usize,
    ) -> Self {
        let backtrace = backtrace::Backtrace::new();
        let mut frames = Vec::new();

        for frame in backtrace.frames() {
            for symbol in frame.symbols() {
                let file = symbol
                    .filename()
                    .map(|p| p.to_string_lossy().into_owned())
                    .unwrap_or_default();
                if !file.is_empty() && is_internal_frame(&file) {
                    continue;
                }
                let function = symbol
                    .name()
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "<unknown>".to_string());
                let line = symbol.lineno().unwrap_or(0);
                frames.push(TracebackFrame {
                    function,
                    file,
                    line,
                    is_caught_point: false,
                });
            }
        }

        if let Some(marked) = frames.get_mut(caught_point_depth.min(frames.len().saturating_sub(1)))
        {
            marked.is_caught_point = true;
        }

        CapturedException {
            type_name: type_name.into(),
            message: message.into(),
            frames,
        }
    }

    /// Number of frames marked as the caught point; must be exactly one
    /// whenever the chain is non-empty (spec §3 invariants).
    pub fn caught_point_count(&self) -> usize {
        self.frames.iter().filter(|f| f.is_caught_point).count()
    }

    /// Renders via the plain stack formatter, visibly distinguishing the
    /// caught-point frame per spec §4.4: the banner becomes "Traceback (most
    /// recent call last, catch point marked):" and the caught frame's line is
    /// prefixed with `"> "`.
    pub fn render_plain(&self) -> String {
        let mut out = String::new();
        out.push_str("Traceback (most recent call last, catch point marked):\n");
        for frame in &self.frames {
            let prefix = if frame.is_caught_point { "> " } else { "  " };
            out.push_str(&format!(
                "{prefix}File \"{}\", line {}, in {}\n",
                frame.file, frame.line, frame.function
            ));
        }
        out.push_str(&format!("{}: {}", self.type_name, self.message));
        out
    }

    /// Renders via the pretty exception formatter. Treated as an opaque
    /// collaborator with a stable signature per spec §1/§9: this is a
    /// reasonable stand-in implementation, not a faithful port of any
    /// specific renderer.
    pub fn render_pretty(&self) -> String {
        let mut out = String::new();
        out.push_str("Traceback (most recent call last, catch point marked):\n");
        for frame in &self.frames {
            let marker = if frame.is_caught_point { "> " } else { "  " };
            out.push_str(&format!(
                "{marker}┌─ {}:{} in {}\n",
                frame.file, frame.line, frame.function
            ));
        }
        out.push_str(&format!("└─ {}: {}", self.type_name, self.message));
        out
    }

    pub fn render(&self, pretty: bool) -> String {
        if pretty {
            self.render_pretty()
        } else {
            self.render_plain()
        }
    }
}

impl fmt::Display for CapturedException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render_plain())
    }
}
