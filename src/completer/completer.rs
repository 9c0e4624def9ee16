use rustyline::{
    Helper, completion::{Completer, Pair}, highlight::Highlighter, hint::Hinter, validate::Validator
};
use std::fs;
use std::path::PathBuf;

use crate::commands::builtin_commands;
use crate::finder::ExecutablesFinder;
use crate::parser::split_words;

/// Tab completion for files (relative to `base`) and, failing that, for
/// executables on `PATH`.
pub struct ShellCompleter {
    base: PathBuf,
    finder: ExecutablesFinder,
}

impl ShellCompleter {
    pub fn new() -> Self {
        Self::with_roots(PathBuf::from("."), ExecutablesFinder::new())
    }

    pub fn with_roots(base: PathBuf, finder: ExecutablesFinder) -> Self {
        Self { base, finder }
    }

    /// Where the word under completion starts, and what to replace it with.
    fn candidates(&self, text: &str) -> (usize, Vec<String>) {
        if text.trim().is_empty() {
            return (0, Vec::new());
        }

        let word_start = last_word_start(text);
        let raw = &text[word_start..];
        if raw.is_empty() {
            return (word_start, Vec::new());
        }
        let word = unquote(raw);

        let mut matches = self.file_candidates(&word);
        if matches.is_empty() && !word.contains('/') {
            matches = self.finder.find_executables_starting_with(&word);
        }

        let opening_quote = raw.chars().next().filter(|c| matches!(*c, '"' | '\''));
        match (opening_quote, matches.as_mut_slice()) {
            (Some(quote), [only]) => *only = format!("{quote}{only}{quote}"),
            (Some(quote), all) => {
                for candidate in all {
                    *candidate = format!("{quote}{candidate}");
                }
            }
            (None, [only]) if only.contains(' ') => *only = format!("\"{only}\""),
            (None, _) => {}
        }

        (word_start, matches)
    }

    fn file_candidates(&self, word: &str) -> Vec<String> {
        let (dir, prefix) = match word.rfind('/') {
            Some(i) => (&word[..=i], &word[i + 1..]),
            None => ("", word),
        };

        let Ok(entries) = fs::read_dir(self.base.join(dir)) else {
            return Vec::new();
        };

        let mut matches: Vec<String> = entries
            .flatten()
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name.starts_with(prefix))
            .filter(|name| prefix.starts_with('.') || !name.starts_with('.'))
            .map(|name| format!("{dir}{name}"))
            .collect();
        matches.sort();
        matches
    }
}

impl Default for ShellCompleter {
    fn default() -> Self {
        Self::new()
    }
}

/// Byte offset where the last word of `text` starts. Whitespace inside quotes
/// or escaped with a backslash does not end a word.
fn last_word_start(text: &str) -> usize {
    let mut start = 0;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match quote {
            Some(q) if c == q => quote = None,
            Some('"') if c == '\\' => escaped = true,
            Some(_) => {}
            None if c == '\\' => escaped = true,
            None if c == '\'' || c == '"' => quote = Some(c),
            None if c.is_whitespace() => start = i + c.len_utf8(),
            None => {}
        }
    }

    start
}

fn unquote(raw: &str) -> String {
    match split_words(raw) {
        Ok(words) => words.into_iter().next().unwrap_or_default(),
        Err(_) => raw.trim_start_matches(['"', '\'']).to_string(),
    }
}

impl Completer for ShellCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Self::Candidate>)> {
        let (word_start, matches) = self.candidates(&line[..pos]);

        let pairs = matches
            .into_iter()
            .map(|candidate| Pair {
                display: candidate.clone(),
                replacement: candidate,
            })
            .collect();

        Ok((word_start, pairs))
    }
}

impl Hinter for ShellCompleter {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &rustyline::Context<'_>) -> Option<Self::Hint> {
        if pos < line.len() {
            return None;
        }

        let word_start = line[..pos].rfind(' ').map(|i| i + 1).unwrap_or(0);
        let word = &line[word_start..pos];

        if word.is_empty() || word_start != 0 {
            return None;
        }

        builtin_commands()
            .into_iter()
            .find(|cmd| cmd.starts_with(word) && cmd.len() > word.len())
            .map(|cmd| cmd[word.len()..].to_string())
    }
}

impl Highlighter for ShellCompleter {}
impl Validator for ShellCompleter {}
impl Helper for ShellCompleter {}
