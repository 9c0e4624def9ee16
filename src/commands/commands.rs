use strum::IntoEnumIterator;
use strum_macros::{EnumIter, EnumString};

use crate::parser::{PipelineDescription, parse};

/// Words the front end handles itself instead of handing to the executor.
#[derive(Debug, EnumString, EnumIter, PartialEq)]
pub enum CommandKind {
    #[strum(serialize = "exit")]
    Exit,
    #[strum(serialize = "history")]
    History,
}

#[derive(Debug, PartialEq)]
pub enum Command {
    Exit,
    History,
    Pipeline(PipelineDescription),
}

pub fn builtin_commands() -> Vec<String> {
    CommandKind::iter()
        .map(|k| format!("{:?}", k).to_lowercase())
        .collect()
}

/// A built-in only matches when it is the whole line; anything else is a
/// pipeline. Blank lines give `None`.
pub fn parse_command(line: &str) -> Option<Command> {
    match line.trim().parse::<CommandKind>() {
        Ok(CommandKind::Exit) => Some(Command::Exit),
        Ok(CommandKind::History) => Some(Command::History),
        Err(_) => parse(line).map(Command::Pipeline),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins() {
        assert_eq!(parse_command("exit"), Some(Command::Exit));
        assert_eq!(parse_command("  history "), Some(Command::History));
    }

    #[test]
    fn test_builtin_with_pipe_is_a_pipeline() {
        let Some(Command::Pipeline(description)) = parse_command("history | grep ls") else {
            panic!("expected a pipeline");
        };
        assert_eq!(description.stages(), ["history", "grep ls"]);
    }

    #[test]
    fn test_blank() {
        assert_eq!(parse_command("   "), None);
    }

    #[test]
    fn test_builtin_names() {
        assert_eq!(builtin_commands(), vec!["exit", "history"]);
    }
}
