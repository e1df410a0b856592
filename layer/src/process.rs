//! Process-level side effects
//!
//! Listing mode and selector parse failures end the host process. The filter
//! only reports them; the layer boundary routes them through this trait so a
//! host or a test can observe them instead.

use std::sync::{Mutex, PoisonError};

pub trait ProcessControl: Send + Sync {
    /// Write one line of user-facing diagnostic text
    fn diagnostic(&self, line: &str);

    /// Terminate the process. Implementations used in tests may return.
    fn exit(&self, code: i32);
}

/// Writes to stderr and really exits
#[derive(Debug, Clone, Copy, Default)]
pub struct StdProcess;

impl ProcessControl for StdProcess {
    fn diagnostic(&self, line: &str) {
        eprintln!("{}", line);
    }

    fn exit(&self, code: i32) {
        std::process::exit(code);
    }
}

/// Records diagnostics and exit requests without acting on them
#[derive(Debug, Default)]
pub struct RecordingProcess {
    lines: Mutex<Vec<String>>,
    exit_code: Mutex<Option<i32>>,
}

impl RecordingProcess {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Exit code of the first exit request, if any
    pub fn exit_code(&self) -> Option<i32> {
        *self.exit_code.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ProcessControl for RecordingProcess {
    fn diagnostic(&self, line: &str) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.to_string());
    }

    fn exit(&self, code: i32) {
        self.exit_code
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_or_insert(code);
    }
}

impl<P: ProcessControl + ?Sized> ProcessControl for std::sync::Arc<P> {
    fn diagnostic(&self, line: &str) {
        (**self).diagnostic(line)
    }

    fn exit(&self, code: i32) {
        (**self).exit(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_process() {
        let process = RecordingProcess::new();
        process.diagnostic("selectable devices:");
        process.exit(0);
        process.exit(1);

        assert_eq!(process.lines(), vec!["selectable devices:"]);
        assert_eq!(process.exit_code(), Some(0));
    }
}
