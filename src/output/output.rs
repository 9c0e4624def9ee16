use rustyline::ExternalPrinter;
use std::sync::{Arc, Mutex};

/// Receives the text of finished pipelines. Each call prints one result
/// followed by a newline.
pub trait Output {
    fn print(&mut self, text: &str);
}

/// An [`Output`] shared between the front end and worker threads.
pub type SharedOutput = Arc<Mutex<dyn Output + Send>>;

pub struct StdOutput;

impl StdOutput {
    pub fn new() -> Self {
        Self
    }
}

impl Output for StdOutput {
    fn print(&mut self, text: &str) {
        println!("{}", text);
    }
}

/// Prints above the prompt of a running editor without garbling the line
/// being typed.
pub struct PrinterOutput<P: ExternalPrinter> {
    printer: P,
}

impl<P: ExternalPrinter> PrinterOutput<P> {
    pub fn new(printer: P) -> Self {
        Self { printer }
    }
}

impl<P: ExternalPrinter> Output for PrinterOutput<P> {
    fn print(&mut self, text: &str) {
        if let Err(err) = self.printer.print(format!("{text}\n")) {
            warn!(error = %err, "external printer failed, falling back to stdout");
            println!("{}", text);
        }
    }
}

/// Collects everything printed, for callers that display results later.
#[derive(Debug, Default)]
pub struct BufferOutput {
    text: String,
}

impl BufferOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl Output for BufferOutput {
    fn print(&mut self, text: &str) {
        self.text.push_str(text);
        self.text.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_appends_newline() {
        let mut buffer = BufferOutput::new();
        buffer.print("one");
        buffer.print("two");
        assert_eq!(buffer.text(), "one\ntwo\n");
    }
}
