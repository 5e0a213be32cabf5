//! The bounded output log shown in the history pane.

use std::collections::VecDeque;

/// Output lines of the session, oldest first.
#[derive(Debug, Clone)]
pub struct HistoryLog {
    lines: VecDeque<String>,
    limit: usize,
    timestamps: bool,
}

impl HistoryLog {
    #[must_use]
    pub fn new(limit: usize, timestamps: bool) -> Self {
        Self {
            lines: VecDeque::new(),
            limit: limit.max(1),
            timestamps,
        }
    }

    /// Append `text`, one entry per line. With `with_time` (and timestamps
    /// enabled) the first line gets an `HH:MM:SS ` prefix.
    pub fn log(&mut self, text: &str, with_time: bool) {
        let prefix = (with_time && self.timestamps)
            .then(|| chrono::Local::now().format("%H:%M:%S ").to_string());
        for (i, line) in text.lines().enumerate() {
            tracing::info!(target: "gview::history", "{line}");
            let entry = match (&prefix, i) {
                (Some(p), 0) => format!("{p}{line}"),
                _ => line.to_string(),
            };
            self.lines.push_back(entry);
        }
        if text.is_empty() {
            self.lines.push_back(String::new());
        }
        while self.lines.len() > self.limit {
            self.lines.pop_front();
        }
    }

    pub fn lines(&self) -> impl DoubleEndedIterator<Item = &str> + ExactSizeIterator {
        self.lines.iter().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.lines.back().map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

impl Default for HistoryLog {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_HISTORY_LIMIT, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiline_split() {
        let mut log = HistoryLog::new(10, false);
        log.log("a\nb\nc", false);
        assert_eq!(log.lines().collect::<Vec<_>>(), ["a", "b", "c"]);
    }

    #[test]
    fn test_limit_drops_oldest() {
        let mut log = HistoryLog::new(3, false);
        for i in 0..5 {
            log.log(&i.to_string(), false);
        }
        assert_eq!(log.lines().collect::<Vec<_>>(), ["2", "3", "4"]);
    }

    #[test]
    fn test_timestamp_prefix() {
        let mut log = HistoryLog::new(10, true);
        log.log("ZVIEW> (radial plot)\nmore", true);
        let first = log.lines().next().unwrap();
        assert_eq!(first.len(), "HH:MM:SS ".len() + "ZVIEW> (radial plot)".len());
        assert!(first.ends_with(" ZVIEW> (radial plot)"));
        assert_eq!(log.last(), Some("more"));

        let mut plain = HistoryLog::new(10, false);
        plain.log("x", true);
        assert_eq!(plain.last(), Some("x"));
    }

    #[test]
    fn test_empty_text_logs_blank_line() {
        let mut log = HistoryLog::default();
        log.log("", false);
        assert_eq!(log.len(), 1);
    }
}
