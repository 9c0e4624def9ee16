use anyhow::{Result, anyhow};
use pipeshell::{
    commands::{Command, parse_command},
    completer::ShellCompleter,
    config::{Config, LOG_FILE_NAME},
    history::{Direction, History, HistoryKeyHandler},
    output::{PrinterOutput, SharedOutput, StdOutput},
    submit,
};
use rustyline::{
    Editor, EventHandler, KeyCode, KeyEvent, Modifiers, error::ReadlineError, history::DefaultHistory,
};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, prelude::*};

fn init_tracing(config: &Config) -> WorkerGuard {
    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(&config.log_dir, LOG_FILE_NAME));

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(false))
        .with(EnvFilter::new(&config.log_filter))
        .init();

    guard
}

fn bind_history_keys(rl: &mut Editor<ShellCompleter, DefaultHistory>, history: &Arc<Mutex<History>>) {
    for (key, direction) in [(KeyCode::Up, Direction::Older), (KeyCode::Down, Direction::Newer)] {
        rl.bind_sequence(
            KeyEvent(key, Modifiers::NONE),
            EventHandler::Conditional(Box::new(HistoryKeyHandler::new(history.clone(), direction))),
        );
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env();
    let _guard = init_tracing(&config);

    let mut rl: Editor<ShellCompleter, DefaultHistory> = Editor::new()?;
    rl.set_helper(Some(ShellCompleter::new()));

    let history = Arc::new(Mutex::new(History::new()));
    bind_history_keys(&mut rl, &history);

    let output: SharedOutput = match rl.create_external_printer() {
        Ok(printer) => Arc::new(Mutex::new(PrinterOutput::new(printer))),
        Err(err) => {
            debug!(error = %err, "no external printer, printing to stdout");
            Arc::new(Mutex::new(StdOutput::new()))
        }
    };

    println!("Welcome to pipeshell!");
    println!("Type a command and press Enter. `exit` or Ctrl-D quits.\n");

    loop {
        let line = match rl.readline(&config.prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        history
            .lock()
            .map_err(|_| anyhow!("history lock poisoned"))?
            .add_history_item(line);

        match parse_command(line) {
            Some(Command::Exit) => break,
            Some(Command::History) => {
                let listing = history
                    .lock()
                    .map_err(|_| anyhow!("history lock poisoned"))?
                    .to_string();
                output
                    .lock()
                    .map_err(|_| anyhow!("output lock poisoned"))?
                    .print(listing.trim_end());
            }
            Some(Command::Pipeline(description)) => {
                info!(%line, "submitting");
                submit(description, output.clone());
            }
            None => {}
        }
    }

    Ok(())
}
