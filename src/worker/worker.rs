use std::thread::{self, JoinHandle};

use crate::executor::Executor;
use crate::output::SharedOutput;
use crate::parser::PipelineDescription;

/// Runs the pipeline on its own thread with output captured and hands a
/// non-empty result to `output`.
///
/// There is no way to cancel the thread; a stage that never exits keeps it
/// alive. Results of concurrent submissions reach `output` in completion
/// order.
pub fn submit(description: PipelineDescription, output: SharedOutput) -> JoinHandle<()> {
    thread::spawn(move || {
        debug!(stages = description.stages().len(), "running submitted pipeline");
        let result = Executor::new().run(&description, true);
        if result.is_empty() {
            return;
        }

        match output.lock() {
            Ok(mut output) => output.print(&result),
            Err(_) => warn!("output is poisoned, dropping pipeline result"),
        }
    })
}
