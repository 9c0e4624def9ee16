#[macro_use]
extern crate tracing;

pub mod commands {
    mod commands;
    pub use commands::*;
}

pub mod completer {
    mod completer;
    pub use completer::*;
}

pub mod config {
    mod config;
    pub use config::*;
}

pub mod executor {
    mod executor;
    pub use executor::*;
}

pub mod finder {
    mod finder;
    pub use finder::*;
}

pub mod history {
    mod history;
    pub use history::*;
}

pub mod output {
    mod output;
    pub use output::*;
}

pub mod parser {
    mod parser;
    pub use parser::*;
}

pub mod worker {
    mod worker;
    pub use worker::*;
}

pub use executor::{Executor, PipelineError};
pub use parser::{PipelineDescription, parse};
pub use worker::submit;

/// Parses and runs one line, returning its output or diagnostic. Blank lines
/// run nothing and return an empty string.
pub fn interpret(line: &str, capture: bool) -> String {
    match parse(line) {
        Some(description) => Executor::new().run(&description, capture),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpret_blank() {
        assert_eq!(interpret("   ", true), "");
    }

    #[test]
    fn test_interpret_pipeline() {
        assert_eq!(interpret("echo pipe shell | tr ' ' -", true), "pipe-shell");
    }
}
