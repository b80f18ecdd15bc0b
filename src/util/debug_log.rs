//! Indent-aware setup trace.
//!
//! Collects messages with a ".." prefix per indent level and forwards them
//! to [`log::info!`] on demand (or immediately with auto-print on).

use std::fmt::Display;

use glam::{Vec3, Vec4};

/// A value [`DebugLog::log_value`] knows how to render.
pub trait LogValue {
    /// Text appended after the message.
    fn render(&self) -> String;
}

impl LogValue for bool {
    fn render(&self) -> String {
        let text = if *self { "TRUE" } else { "FALSE" };
        text.to_owned()
    }
}

macro_rules! impl_display_value {
    ($($ty:ty),*) => {$(
        impl LogValue for $ty {
            fn render(&self) -> String {
                self.to_string()
            }
        }
    )*};
}

impl_display_value!(i16, i32, u32, usize, f32, f64);

impl LogValue for &str {
    fn render(&self) -> String {
        (*self).to_owned()
    }
}

impl LogValue for Vec3 {
    fn render(&self) -> String {
        format!("({}, {}, {})", self.x, self.y, self.z)
    }
}

impl LogValue for Vec4 {
    fn render(&self) -> String {
        format!("({}, {}, {}, {})", self.x, self.y, self.z, self.w)
    }
}

/// Buffered, indented log lines.
#[derive(Debug, Clone, Default)]
pub struct DebugLog {
    entries: Vec<String>,
    indent: usize,
    auto_print: bool,
}

impl DebugLog {
    /// Empty log.
    #[must_use]
    pub fn new(auto_print: bool) -> Self {
        Self {
            entries: Vec::new(),
            indent: 0,
            auto_print,
        }
    }

    /// Append `msg` at the current indent.
    pub fn log(&mut self, msg: impl Display) {
        self.entries.push(format!("{}{msg}", "..".repeat(self.indent)));
        if self.auto_print {
            self.print_last();
        }
    }

    /// Append `msg` followed by a rendered value.
    pub fn log_value(&mut self, msg: impl Display, value: impl LogValue) {
        self.log(format!("{msg}{}", value.render()));
    }

    /// Increase the indent by one level.
    pub fn indent(&mut self) {
        self.indent += 1;
    }

    /// Decrease the indent by one level, never below zero.
    pub fn outdent(&mut self) {
        self.indent = self.indent.saturating_sub(1);
    }

    /// Current indent level.
    #[must_use]
    pub fn indent_level(&self) -> usize {
        self.indent
    }

    /// Emit every entry.
    pub fn print(&self) {
        for entry in &self.entries {
            log::info!("{entry}");
        }
    }

    /// Emit the most recent entry.
    pub fn print_last(&self) {
        if let Some(entry) = self.entries.last() {
            log::info!("{entry}");
        }
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Print each entry as it is logged.
    pub fn set_auto_print(&mut self, auto_print: bool) {
        self.auto_print = auto_print;
    }

    /// Entries in log order.
    #[must_use]
    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indentation_and_values() {
        let mut log = DebugLog::new(false);
        log.log("File Info:");
        log.indent();
        log.log_value("min value: ", -1117_i16);
        log.log_value("flipped: ", true);
        log.indent();
        log.log_value("eye: ", Vec3::new(2.5, 0.5, 2.5));
        log.outdent();
        log.outdent();
        log.outdent();
        log.log_value("done: ", false);

        assert_eq!(
            log.entries(),
            &[
                "File Info:",
                "..min value: -1117",
                "..flipped: TRUE",
                "....eye: (2.5, 0.5, 2.5)",
                "done: FALSE",
            ]
        );
        assert_eq!(log.indent_level(), 0);
    }

    #[test]
    fn clear_keeps_indent() {
        let mut log = DebugLog::default();
        log.indent();
        log.log("a");
        log.clear();
        assert!(log.entries().is_empty());
        log.log_value("color: ", Vec4::new(1.0, 0.75, 0.75, 1.0));
        assert_eq!(log.entries(), &["..color: (1, 0.75, 0.75, 1)"]);
    }
}
