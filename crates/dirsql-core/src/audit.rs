//! Statement audit log.
//!
//! Every DDL statement handed to a session is recorded verbatim, one statement
//! per line, whether or not the session accepts it.

use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Trait for statement log backends.
pub trait StatementLog: Send + Sync {
    /// Record one rendered statement.
    fn record(&self, statement: &str) -> io::Result<()>;

    /// Flush any buffered lines.
    fn flush(&self) -> io::Result<()>;
}

/// Append-only log file.
#[derive(Debug)]
pub struct FileStatementLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileStatementLog {
    /// Open `path` for appending, creating it if needed.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StatementLog for FileStatementLog {
    fn record(&self, statement: &str) -> io::Result<()> {
        let mut file = self.file.lock();
        writeln!(file, "{}", statement.trim_end())
    }

    fn flush(&self) -> io::Result<()> {
        self.file.lock().sync_data()
    }
}

/// In-memory log for tests and dry runs.
///
/// Clones share the same buffer.
#[derive(Debug, Default, Clone)]
pub struct MemoryStatementLog {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemoryStatementLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded statements.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    /// Number of recorded statements.
    pub fn len(&self) -> usize {
        self.lines.lock().len()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.lines.lock().is_empty()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.lines.lock().clear();
    }
}

impl StatementLog for MemoryStatementLog {
    fn record(&self, statement: &str) -> io::Result<()> {
        self.lines.lock().push(statement.trim_end().to_string());
        Ok(())
    }

    fn flush(&self) -> io::Result<()> {
        Ok(())
    }
}

/// Log that discards every statement.
#[derive(Debug, Default)]
pub struct NullStatementLog;

impl StatementLog for NullStatementLog {
    fn record(&self, _statement: &str) -> io::Result<()> {
        Ok(())
    }

    fn flush(&self) -> io::Result<()> {
        Ok(())
    }
}
