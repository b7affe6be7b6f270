//! Terminal progress sink.

use phasewatch_progress::{ProgressSink, SinkError, SinkHandle};
use std::collections::HashMap;
use std::io::Write;
use std::sync::Mutex;

const BAR_WIDTH: usize = 30;

#[derive(Debug)]
struct Row {
    description: String,
    total: f64,
    last_percent: Option<u32>,
}

/// Prints a bar line to stderr whenever a row's whole percentage changes.
#[derive(Debug, Default)]
pub struct ConsoleSink {
    rows: Mutex<HashMap<SinkHandle, Row>>,
}

impl ConsoleSink {
    /// Create a sink with no rows.
    pub fn new() -> Self {
        Self::default()
    }
}

fn render(description: &str, percent: u32) -> String {
    let filled = (percent as usize * BAR_WIDTH / 100).min(BAR_WIDTH);
    format!(
        "{:<32} [{}{}] {:>3}%",
        description,
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        percent
    )
}

impl ProgressSink for ConsoleSink {
    fn register(&self, handle: SinkHandle, description: &str, total: f64) -> Result<(), SinkError> {
        let mut rows = self.rows.lock().map_err(|_| SinkError::Poisoned)?;
        rows.insert(
            handle,
            Row {
                description: description.to_string(),
                total,
                last_percent: None,
            },
        );
        Ok(())
    }

    fn start(&self, handle: SinkHandle) -> Result<(), SinkError> {
        self.update(handle, 0.0)
    }

    fn update(&self, handle: SinkHandle, completed: f64) -> Result<(), SinkError> {
        let mut rows = self.rows.lock().map_err(|_| SinkError::Poisoned)?;
        let row = rows.get_mut(&handle).ok_or(SinkError::UnknownHandle(handle))?;
        let percent = if row.total > 0.0 {
            (completed / row.total * 100.0).clamp(0.0, 100.0) as u32
        } else {
            0
        };
        if row.last_percent == Some(percent) {
            return Ok(());
        }
        row.last_percent = Some(percent);
        writeln!(std::io::stderr(), "{}", render(&row.description, percent))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_bar() {
        let line = render("Build", 50);
        assert!(line.starts_with("Build"));
        assert!(line.ends_with(" 50%"));
        assert_eq!(line.matches('#').count(), 15);
    }

    #[test]
    fn test_unknown_handle() {
        let sink = ConsoleSink::new();
        assert!(matches!(
            sink.update(SinkHandle(3), 10.0),
            Err(SinkError::UnknownHandle(SinkHandle(3)))
        ));
    }

    #[test]
    fn test_repeated_percent_is_deduplicated() {
        let sink = ConsoleSink::new();
        sink.register(SinkHandle(0), "Build", 100.0).unwrap();
        sink.update(SinkHandle(0), 10.2).unwrap();
        sink.update(SinkHandle(0), 10.7).unwrap();
        let rows = sink.rows.lock().unwrap();
        assert_eq!(rows[&SinkHandle(0)].last_percent, Some(10));
    }
}
