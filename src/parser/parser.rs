use thiserror::Error;

const INPUT_MARKER: char = '<';
const OUTPUT_MARKER: char = '>';
const PIPE_MARKER: char = '|';

/// One parsed command line: the pipe stages plus the optional redirection
/// files at the pipeline's boundaries.
///
/// Stages are kept as raw text. Each one is split into words by the executor
/// right before it is launched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineDescription {
    stages: Vec<String>,
    input_path: Option<String>,
    output_path: Option<String>,
}

impl PipelineDescription {
    pub fn stages(&self) -> &[String] {
        &self.stages
    }

    /// File the first stage reads from instead of the inherited stdin.
    pub fn input_path(&self) -> Option<&str> {
        self.input_path.as_deref()
    }

    /// File the last stage writes to instead of the captured stdout.
    pub fn output_path(&self) -> Option<&str> {
        self.output_path.as_deref()
    }
}

/// Parses a raw line into a [`PipelineDescription`], or `None` for a blank line.
///
/// The redirection markers are found with plain substring splits: the line is
/// split on the first `<`, then the command part on the first `>`, then on `|`.
/// Markers inside quotes are not special-cased.
pub fn parse(raw: &str) -> Option<PipelineDescription> {
    if raw.trim().is_empty() {
        return None;
    }

    let (rest, input_path) = split_marker(raw, INPUT_MARKER);
    let (rest, output_path) = split_marker(rest, OUTPUT_MARKER);

    let stages = rest
        .split(PIPE_MARKER)
        .map(|stage| stage.trim().to_string())
        .collect();

    Some(PipelineDescription {
        stages,
        input_path,
        output_path,
    })
}

fn split_marker(text: &str, marker: char) -> (&str, Option<String>) {
    match text.split_once(marker) {
        Some((command, path)) => (command, Some(path.trim().to_string())),
        None => (text, None),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenizeError {
    #[error("unterminated {0} quote")]
    UnterminatedQuote(QuoteKind),
    #[error("no character to escape after trailing backslash")]
    DanglingEscape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum QuoteKind {
    #[strum(serialize = "single")]
    Single,
    #[strum(serialize = "double")]
    Double,
}

enum PromptQuote {
    Unquoted,
    SingleQuoted,
    DoubleQuoted,
}

/// Splits one stage into words the way a POSIX shell would, honouring single
/// quotes, double quotes and backslash escapes. An empty quoted string still
/// produces a word.
pub fn split_words(text: &str) -> Result<Vec<String>, TokenizeError> {
    let mut words: Vec<String> = Vec::new();
    let mut buffer = String::new();
    let mut in_word = false;
    let mut quote = PromptQuote::Unquoted;

    let push = |buffer: &mut String, in_word: &mut bool, words: &mut Vec<String>| {
        if *in_word {
            words.push(std::mem::take(buffer));
        }
        *in_word = false;
    };

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match quote {
            PromptQuote::Unquoted => match c {
                c if c.is_whitespace() => push(&mut buffer, &mut in_word, &mut words),
                '\'' => {
                    quote = PromptQuote::SingleQuoted;
                    in_word = true;
                }
                '"' => {
                    quote = PromptQuote::DoubleQuoted;
                    in_word = true;
                }
                '\\' => {
                    let next_char = chars.next().ok_or(TokenizeError::DanglingEscape)?;
                    buffer.push(next_char);
                    in_word = true;
                }
                _ => {
                    buffer.push(c);
                    in_word = true;
                }
            },
            PromptQuote::SingleQuoted => match c {
                '\'' => quote = PromptQuote::Unquoted,
                _ => buffer.push(c),
            },
            PromptQuote::DoubleQuoted => match c {
                '"' => quote = PromptQuote::Unquoted,
                '\\' => match chars.peek() {
                    Some(&next_ch) if matches!(next_ch, '\\' | '"' | '$' | '`' | '\n') => {
                        chars.next();
                        if next_ch != '\n' {
                            buffer.push(next_ch);
                        }
                    }
                    _ => buffer.push(c),
                },
                _ => buffer.push(c),
            },
        }
    }

    match quote {
        PromptQuote::Unquoted => {}
        PromptQuote::SingleQuoted => return Err(TokenizeError::UnterminatedQuote(QuoteKind::Single)),
        PromptQuote::DoubleQuoted => return Err(TokenizeError::UnterminatedQuote(QuoteKind::Double)),
    }
    push(&mut buffer, &mut in_word, &mut words);

    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_line_has_no_pipeline() {
        assert_eq!(parse(""), None);
        assert_eq!(parse("   \t "), None);
    }

    #[test]
    fn test_pipe_with_output_redirect() {
        let description = parse("cat a.txt | grep foo > out.txt").unwrap();
        assert_eq!(description.stages(), ["cat a.txt", "grep foo"]);
        assert_eq!(description.input_path(), None);
        assert_eq!(description.output_path(), Some("out.txt"));
    }

    #[test]
    fn test_input_redirect() {
        let description = parse("sort < in.txt").unwrap();
        assert_eq!(description.stages(), ["sort"]);
        assert_eq!(description.input_path(), Some("in.txt"));
        assert_eq!(description.output_path(), None);
    }

    #[test]
    fn test_output_before_input() {
        let description = parse("sort > out.txt < in.txt").unwrap();
        assert_eq!(description.stages(), ["sort"]);
        assert_eq!(description.input_path(), Some("in.txt"));
        assert_eq!(description.output_path(), Some("out.txt"));
    }

    #[test]
    fn test_input_before_output_keeps_remainder() {
        // the `>` lands in the input path because `<` is split first
        let description = parse("sort < in.txt > out.txt").unwrap();
        assert_eq!(description.stages(), ["sort"]);
        assert_eq!(description.input_path(), Some("in.txt > out.txt"));
        assert_eq!(description.output_path(), None);
    }

    #[test]
    fn test_empty_redirect_path_is_set() {
        let description = parse("ls >").unwrap();
        assert_eq!(description.output_path(), Some(""));
    }

    #[test]
    fn test_lone_pipe() {
        let description = parse("|").unwrap();
        assert_eq!(description.stages(), ["", ""]);
    }

    #[test]
    fn test_markers_inside_quotes_are_not_special() {
        let description = parse("echo 'a > b'").unwrap();
        assert_eq!(description.stages(), ["echo 'a"]);
        assert_eq!(description.output_path(), Some("b'"));
    }

    #[test]
    fn test_non_blank_line_has_a_stage() {
        for line in ["ls", "| ls", "< x", "a|b|c"] {
            assert!(!parse(line).unwrap().stages().is_empty());
        }
    }

    #[test]
    fn test_simple_words() {
        assert_eq!(split_words("echo hello").unwrap(), vec!["echo", "hello"]);
    }

    #[test]
    fn test_single_quotes() {
        assert_eq!(
            split_words("echo 'hello world'").unwrap(),
            vec!["echo", "hello world"]
        );
    }

    #[test]
    fn test_multiple_spaces() {
        assert_eq!(split_words("echo   hello").unwrap(), vec!["echo", "hello"]);
    }

    #[test]
    fn test_empty() {
        assert_eq!(split_words("").unwrap(), Vec::<String>::new());
        assert_eq!(split_words("   ").unwrap(), Vec::<String>::new());
    }

    #[test]
    fn test_empty_quotes_make_a_word() {
        assert_eq!(split_words("echo ''").unwrap(), vec!["echo", ""]);
    }

    #[test]
    fn test_adjacent_quotes_join() {
        assert_eq!(
            split_words("echo 'hello     script' 'shell''world' example''test").unwrap(),
            vec!["echo", "hello     script", "shellworld", "exampletest"]
        );
    }

    #[test]
    fn test_double_quotes() {
        assert_eq!(
            split_words("echo \"hello\" \"world\"").unwrap(),
            vec!["echo", "hello", "world"]
        );
        assert_eq!(
            split_words("echo \"shell's test\"").unwrap(),
            vec!["echo", "shell's test"]
        );
    }

    #[test]
    fn test_double_quote_escapes() {
        assert_eq!(
            split_words(r#"echo "say \"hi\"" "a\b""#).unwrap(),
            vec!["echo", "say \"hi\"", "a\\b"]
        );
    }

    #[test]
    fn test_backslash_outside_quotes() {
        assert_eq!(
            split_words("cat my\\ file.txt").unwrap(),
            vec!["cat", "my file.txt"]
        );
        assert_eq!(
            split_words("echo hello\\\\world").unwrap(),
            vec!["echo", "hello\\world"]
        );
    }

    #[test]
    fn test_quoted_path_with_spaces() {
        assert_eq!(
            split_words("cat \"my documents/notes.txt\"").unwrap(),
            vec!["cat", "my documents/notes.txt"]
        );
    }

    #[test]
    fn test_unterminated_quotes() {
        assert_eq!(
            split_words("echo 'oops"),
            Err(TokenizeError::UnterminatedQuote(QuoteKind::Single))
        );
        assert_eq!(
            split_words("echo \"oops"),
            Err(TokenizeError::UnterminatedQuote(QuoteKind::Double))
        );
    }

    #[test]
    fn test_dangling_escape() {
        assert_eq!(split_words("echo \\"), Err(TokenizeError::DanglingEscape));
    }
}
