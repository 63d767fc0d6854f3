//! Logging infrastructure.
//!
//! One process-wide logger, built from a log directory and a file-name
//! prefix: an INFO-and-above stdout layer plus a capture-everything file
//! layer writing to `{prefix}{timestamp}.log`, rotated at 10 MiB with 5
//! numbered backups. Timestamps carry millisecond precision.
//!
//! Handlers are attached exactly once per process. Repeated acquisitions
//! return the handle created by the first one, regardless of arguments.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use chrono::Local;
use serde::ser::{Serialize, Serializer};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::fmt::writer::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

use crate::value::LOGGER_PLACEHOLDER;

/// Rotation threshold for the active log file.
pub const MAX_LOG_FILE_BYTES: u64 = 10 * 1024 * 1024;

/// Number of rotated backups kept next to the active log file.
pub const LOG_BACKUP_COUNT: usize = 5;

/// Timestamp format for log lines (millisecond precision).
const LINE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Timestamp format baked into the log file name.
const FILE_TIMESTAMP_FORMAT: &str = "%Y_%m_%d_%H%M%S";

/// Cheap, cloneable reference to the process logger.
///
/// The handle is a data-model citizen: the loader stores it in the config
/// mapping under `"logger"`, where it serializes as the `<Logger>`
/// placeholder rather than as data.
#[derive(Clone)]
pub struct LoggerHandle {
    inner: Arc<LoggerShared>,
}

struct LoggerShared {
    log_dir: PathBuf,
    log_file: PathBuf,
}

impl LoggerHandle {
    fn new(log_dir: PathBuf, log_file: PathBuf) -> Self {
        Self {
            inner: Arc::new(LoggerShared { log_dir, log_file }),
        }
    }

    /// Directory the active log file lives in.
    pub fn log_dir(&self) -> &Path {
        &self.inner.log_dir
    }

    /// Path of the active log file.
    pub fn log_file(&self) -> &Path {
        &self.inner.log_file
    }
}

impl std::fmt::Debug for LoggerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(LOGGER_PLACEHOLDER)
    }
}

impl PartialEq for LoggerHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Serialize for LoggerHandle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(LOGGER_PLACEHOLDER)
    }
}

/// Process-wide logger registry with an attach-once guard.
pub struct LoggerRegistry {
    handle: OnceLock<LoggerHandle>,
}

static GLOBAL_REGISTRY: LoggerRegistry = LoggerRegistry {
    handle: OnceLock::new(),
};

impl LoggerRegistry {
    /// The process-wide registry.
    pub fn global() -> &'static Self {
        &GLOBAL_REGISTRY
    }

    /// Acquire the process logger, creating it on first use.
    ///
    /// The first call creates `log_dir` if needed, opens
    /// `{prefix}{timestamp}.log` inside it, and installs the global
    /// subscriber. Later calls return the existing handle unchanged.
    pub fn acquire(&self, log_dir: &Path, prefix: &str) -> io::Result<LoggerHandle> {
        if let Some(handle) = self.handle.get() {
            return Ok(handle.clone());
        }

        fs::create_dir_all(log_dir)?;
        let stamp = Local::now().format(FILE_TIMESTAMP_FORMAT);
        let log_file = log_dir.join(format!("{prefix}{stamp}.log"));
        let writer = RotatingFileWriter::new(&log_file, MAX_LOG_FILE_BYTES, LOG_BACKUP_COUNT)?;

        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_target(false)
            .with_timer(ChronoLocal::new(LINE_TIMESTAMP_FORMAT.to_string()))
            .with_filter(LevelFilter::TRACE);

        let stdout_filter = EnvFilter::builder()
            .with_default_directive(LevelFilter::INFO.into())
            .from_env_lossy();
        let stdout_layer = tracing_subscriber::fmt::layer()
            .with_writer(io::stdout)
            .with_target(false)
            .with_timer(ChronoLocal::new(LINE_TIMESTAMP_FORMAT.to_string()))
            .with_filter(stdout_filter);

        // A subscriber may already be installed (tests, embedding process);
        // the attach-once contract makes that a no-op rather than an error.
        let _ = tracing_subscriber::registry()
            .with(file_layer)
            .with(stdout_layer)
            .try_init();

        let handle = LoggerHandle::new(log_dir.to_path_buf(), log_file);
        Ok(self.handle.get_or_init(|| handle).clone())
    }
}

/// Append-only writer that rotates at a byte threshold.
///
/// Backups follow the `file.log.1` .. `file.log.N` scheme: on rotation each
/// existing backup shifts up one slot, the oldest falls off, and the active
/// file restarts empty.
#[derive(Clone)]
pub struct RotatingFileWriter {
    inner: Arc<Mutex<RotatingInner>>,
}

struct RotatingInner {
    path: PathBuf,
    max_bytes: u64,
    backup_count: usize,
    file: File,
    written: u64,
}

impl RotatingFileWriter {
    /// Open (or create) the active log file in append mode.
    pub fn new(path: &Path, max_bytes: u64, backup_count: usize) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let written = file.metadata()?.len();
        Ok(Self {
            inner: Arc::new(Mutex::new(RotatingInner {
                path: path.to_path_buf(),
                max_bytes,
                backup_count,
                file,
                written,
            })),
        })
    }
}

impl RotatingInner {
    fn rotate(&mut self) -> io::Result<()> {
        for index in (1..self.backup_count).rev() {
            let from = backup_path(&self.path, index);
            if from.exists() {
                fs::rename(&from, backup_path(&self.path, index + 1))?;
            }
        }
        if self.backup_count > 0 {
            fs::rename(&self.path, backup_path(&self.path, 1))?;
        }
        self.file = File::create(&self.path)?;
        self.written = 0;
        Ok(())
    }
}

fn backup_path(path: &Path, index: usize) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(format!(".{index}"));
    PathBuf::from(name)
}

impl Write for RotatingFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| io::Error::other("log writer mutex poisoned"))?;
        if inner.written > 0 && inner.written + buf.len() as u64 > inner.max_bytes {
            inner.rotate()?;
        }
        let n = inner.file.write(buf)?;
        inner.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| io::Error::other("log writer mutex poisoned"))?;
        inner.file.flush()
    }
}

impl<'a> MakeWriter<'a> for RotatingFileWriter {
    type Writer = RotatingFileWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
