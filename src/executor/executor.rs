use os_pipe::{PipeReader, pipe};
use std::fs::File;
use std::io::{self, ErrorKind, Read};
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use thiserror::Error;

use crate::parser::{PipelineDescription, TokenizeError, split_words};

/// Every non-empty stage runs as `sh -c <stage>`, so variables, `~` and globs
/// are expanded by the shell rather than here.
const STAGE_SHELL: &str = "sh";

/// Every way a pipeline run can be cut short. The `Display` text is what the
/// user sees in place of the pipeline's output.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Input file not found: {path}")]
    InputNotFound { path: String },
    #[error("Cannot read input file {path}: {source}")]
    InputUnreadable {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("Cannot open output file {path}: {source}")]
    OutputUnwritable {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("Error parsing command `{stage}`: {source}")]
    Tokenize {
        stage: String,
        #[source]
        source: TokenizeError,
    },
    #[error("Error creating pipe: {0}")]
    Pipe(#[source] io::Error),
    #[error("Error running command: {program}: {}", launch_reason(.source))]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },
}

fn launch_reason(err: &io::Error) -> String {
    match err.kind() {
        ErrorKind::NotFound => "command not found".to_string(),
        ErrorKind::PermissionDenied => "permission denied".to_string(),
        _ => err.to_string(),
    }
}

impl PipelineError {
    fn input(path: &str, source: io::Error) -> Self {
        match source.kind() {
            ErrorKind::NotFound => Self::InputNotFound {
                path: path.to_string(),
            },
            _ => Self::InputUnreadable {
                path: path.to_string(),
                source,
            },
        }
    }
}

fn open_input(path: &str) -> Result<File, PipelineError> {
    let file = File::open(path).map_err(|source| PipelineError::input(path, source))?;
    // Opening a directory succeeds on Unix; reading it would not.
    match file.metadata() {
        Ok(metadata) if metadata.is_dir() => Err(PipelineError::input(
            path,
            io::Error::from(ErrorKind::IsADirectory),
        )),
        Ok(_) => Ok(file),
        Err(source) => Err(PipelineError::input(path, source)),
    }
}

/// Starts a fully configured stage process.
pub trait Launcher {
    fn launch(&self, command: &mut Command) -> io::Result<Child>;
}

pub struct SystemLauncher;

impl Launcher for SystemLauncher {
    fn launch(&self, command: &mut Command) -> io::Result<Child> {
        command.spawn()
    }
}

impl<L: Launcher + ?Sized> Launcher for &L {
    fn launch(&self, command: &mut Command) -> io::Result<Child> {
        (**self).launch(command)
    }
}

pub struct Executor<L: Launcher = SystemLauncher> {
    launcher: L,
}

impl Executor {
    pub fn new() -> Self {
        Self {
            launcher: SystemLauncher,
        }
    }
}

impl Default for Executor {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: Launcher> Executor<L> {
    pub fn with_launcher(launcher: L) -> Self {
        Self { launcher }
    }

    /// Runs the pipeline and returns its combined output, or the diagnostic
    /// of whatever stopped it.
    pub fn run(&self, description: &PipelineDescription, capture: bool) -> String {
        self.try_run(description, capture).unwrap_or_else(|err| {
            warn!(error = %err, "pipeline aborted");
            err.to_string()
        })
    }

    /// Launches one `sh -c` process per non-empty stage, wiring each stage's
    /// stdout to the next launched stage's stdin, then waits for all of them in
    /// launch order. Stage text is split into words only to skip empty stages
    /// and to reject unbalanced quotes.
    ///
    /// The result holds the captured stdout of the last launched stage (when
    /// `capture` is set and its output is not redirected to a file) followed by
    /// the stderr of every stage, trimmed. Exit statuses are ignored.
    ///
    /// On error, stages that were already launched keep running and are reaped
    /// in the background.
    pub fn try_run(
        &self,
        description: &PipelineDescription,
        capture: bool,
    ) -> Result<String, PipelineError> {
        let stages = description.stages();
        let last = stages.len().saturating_sub(1);

        let mut running = RunningPipeline::default();
        let mut upstream: Option<PipeReader> = None;

        for (i, stage) in stages.iter().enumerate() {
            let words = split_words(stage).map_err(|source| PipelineError::Tokenize {
                stage: stage.clone(),
                source,
            })?;
            let Some(program) = words.first() else {
                trace!(index = i, "skipping empty stage");
                continue;
            };

            let mut command = Command::new(STAGE_SHELL);
            command.arg("-c").arg(stage).stderr(Stdio::piped());

            match (i, description.input_path()) {
                (0, Some(path)) => {
                    command.stdin(open_input(path)?);
                }
                _ => {
                    if let Some(reader) = upstream.take() {
                        command.stdin(reader);
                    }
                }
            }

            let mut stdout = None;
            match description.output_path() {
                Some(path) if i == last => {
                    let file = File::create(path).map_err(|source| {
                        PipelineError::OutputUnwritable {
                            path: path.to_string(),
                            source,
                        }
                    })?;
                    command.stdout(file);
                }
                _ if i < last || capture => {
                    let (reader, writer) = pipe().map_err(PipelineError::Pipe)?;
                    command.stdout(writer);
                    stdout = Some(reader);
                }
                _ => {}
            }

            debug!(index = i, %stage, "launching stage");
            let child = self
                .launcher
                .launch(&mut command)
                .map_err(|source| PipelineError::Launch {
                    program: program.clone(),
                    source,
                })?;
            // Closes our copies of the pipe ends now owned by the child.
            drop(command);

            running.push(program.clone(), child);
            upstream = stdout;
        }

        // Nothing downstream took the last launched stage's stdout.
        if let Some(reader) = upstream {
            running.attach_stdout(reader);
        }

        Ok(running.wait(capture))
    }
}

struct RunningStage {
    program: String,
    child: Child,
    stdout: Option<JoinHandle<Vec<u8>>>,
    stderr: Option<JoinHandle<Vec<u8>>>,
}

/// The processes of one run. Stages still held when this is dropped are left
/// running and reaped on their own threads.
#[derive(Default)]
struct RunningPipeline {
    stages: Vec<RunningStage>,
}

impl RunningPipeline {
    fn push(&mut self, program: String, mut child: Child) {
        let stderr = child.stderr.take().map(drain);
        self.stages.push(RunningStage {
            program,
            child,
            stdout: None,
            stderr,
        });
    }

    fn attach_stdout(&mut self, reader: PipeReader) {
        if let Some(stage) = self.stages.last_mut() {
            stage.stdout = Some(drain(reader));
        }
    }

    fn wait(mut self, capture: bool) -> String {
        let mut output = String::new();

        for mut stage in std::mem::take(&mut self.stages) {
            match stage.child.wait() {
                Ok(status) => debug!(program = %stage.program, %status, "stage finished"),
                Err(err) => warn!(program = %stage.program, error = %err, "failed to wait for stage"),
            }

            if let Some(stdout) = stage.stdout {
                let bytes = collect(stdout);
                if capture {
                    output.push_str(&String::from_utf8_lossy(&bytes));
                }
            }

            if let Some(stderr) = stage.stderr {
                let bytes = collect(stderr);
                if !bytes.is_empty() {
                    output.push_str(&String::from_utf8_lossy(&bytes));
                }
            }
        }

        output.trim().to_string()
    }
}

impl Drop for RunningPipeline {
    fn drop(&mut self) {
        for stage in self.stages.drain(..) {
            let RunningStage {
                program, mut child, ..
            } = stage;
            debug!(%program, "leaving launched stage to finish on its own");
            thread::spawn(move || {
                child.wait().ok();
            });
        }
    }
}

/// Reads a stream to its end on a separate thread so the writer never blocks
/// on a full pipe while stages are waited on one at a time.
fn drain<R: Read + Send + 'static>(mut reader: R) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buffer = Vec::new();
        if let Err(err) = reader.read_to_end(&mut buffer) {
            trace!(error = %err, "stream closed with error");
        }
        buffer
    })
}

fn collect(handle: JoinHandle<Vec<u8>>) -> Vec<u8> {
    handle.join().unwrap_or_default()
}
