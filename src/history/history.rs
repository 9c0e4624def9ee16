use rustyline::{Cmd, ConditionalEventHandler, Event, EventContext, Movement, RepeatCount};
use std::fmt;
use std::sync::{Arc, Mutex};

/// Lines entered during the session, plus the position the up/down keys
/// have navigated to. The cursor sits one past the newest entry when the
/// user is not browsing.
#[derive(Debug, Default)]
pub struct History {
    items: Vec<String>,
    cursor: usize,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_history_item(&mut self, line: &str) {
        self.items.push(line.to_string());
        self.cursor = self.items.len();
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    /// Steps back to the previous entry. Returns `None` when already at the
    /// oldest entry, leaving the cursor where it is.
    pub fn older(&mut self) -> Option<&str> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        self.items.get(self.cursor).map(String::as_str)
    }

    /// Steps forward to the next entry. Returns `None` once past the newest
    /// entry, in which case the input line should be cleared.
    pub fn newer(&mut self) -> Option<&str> {
        if self.cursor + 1 < self.items.len() {
            self.cursor += 1;
            self.items.get(self.cursor).map(String::as_str)
        } else {
            self.cursor = self.items.len();
            None
        }
    }
}

impl fmt::Display for History {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, item) in self.items.iter().enumerate() {
            writeln!(f, "{:>5}  {}", i + 1, item)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Older,
    Newer,
}

/// Up/down key binding that replaces the editor line from a shared [`History`].
pub struct HistoryKeyHandler {
    history: Arc<Mutex<History>>,
    direction: Direction,
}

impl HistoryKeyHandler {
    pub fn new(history: Arc<Mutex<History>>, direction: Direction) -> Self {
        Self { history, direction }
    }

    fn replacement(&self) -> Option<String> {
        let mut history = self.history.lock().ok()?;
        match self.direction {
            Direction::Older => history.older().map(str::to_string),
            Direction::Newer => Some(history.newer().unwrap_or_default().to_string()),
        }
    }
}

impl ConditionalEventHandler for HistoryKeyHandler {
    fn handle(&self, _evt: &Event, _n: RepeatCount, _positive: bool, _ctx: &EventContext) -> Option<Cmd> {
        match self.replacement() {
            Some(line) => Some(Cmd::Replace(Movement::WholeBuffer, Some(line))),
            None => Some(Cmd::Noop),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(lines: &[&str]) -> History {
        let mut history = History::new();
        for line in lines {
            history.add_history_item(line);
        }
        history
    }

    #[test]
    fn test_older_walks_back_and_stops() {
        let mut history = history(&["ls", "pwd"]);
        assert_eq!(history.older(), Some("pwd"));
        assert_eq!(history.older(), Some("ls"));
        assert_eq!(history.older(), None);
        assert_eq!(history.newer(), Some("pwd"));
    }

    #[test]
    fn test_newer_past_end_clears() {
        let mut history = history(&["ls", "pwd"]);
        history.older();
        assert_eq!(history.newer(), None);
        assert_eq!(history.older(), Some("pwd"));
    }

    #[test]
    fn test_empty_history() {
        let mut history = History::new();
        assert_eq!(history.older(), None);
        assert_eq!(history.newer(), None);
    }

    #[test]
    fn test_adding_resets_cursor() {
        let mut history = history(&["a", "b", "c"]);
        history.older();
        history.older();
        history.add_history_item("d");
        assert_eq!(history.older(), Some("d"));
        assert_eq!(history.items(), ["a", "b", "c", "d"]);
    }

    #[test]
    fn test_display_numbers_entries() {
        let history = history(&["ls", "echo hi"]);
        assert_eq!(history.to_string(), "    1  ls\n    2  echo hi\n");
    }

    #[test]
    fn test_key_handler_replacement() {
        let shared = Arc::new(Mutex::new(history(&["ls"])));
        let up = HistoryKeyHandler::new(shared.clone(), Direction::Older);
        let down = HistoryKeyHandler::new(shared, Direction::Newer);

        assert_eq!(up.replacement(), Some("ls".to_string()));
        assert_eq!(up.replacement(), None);
        assert_eq!(down.replacement(), Some(String::new()));
    }
}
