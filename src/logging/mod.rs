//! Logging infrastructure - structured tracing for handle and runtime events
//!
//! Design: Uses `tracing` for structured, contextual logging with:
//! - Configurable level, overridable through `RUST_LOG`
//! - Zero-cost when disabled
//! - Span-based performance tracking
//! - Console or file output, compact or JSON

use once_cell::sync::OnceCell;
use parking_lot::{const_mutex, Mutex};
use std::io;
use std::path::Path;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    registry::Registry,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

use crate::dispatch::CallingConvention;

/// Global logging state
static LOGGER_INITIALIZED: OnceCell<()> = OnceCell::new();

/// Flush guard for the non-blocking writer; dropped by `shutdown`
static WRITER_GUARD: Mutex<Option<WorkerGuard>> = const_mutex(None);

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Default log level
    pub level: Level,
    /// Enable file logging
    pub file_output: bool,
    /// Log file path (if file_output enabled)
    pub log_path: Option<String>,
    /// Enable JSON format (vs human-readable)
    pub json_format: bool,
    /// Show span events (enter/exit)
    pub show_spans: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            file_output: false,
            log_path: None,
            json_format: false,
            show_spans: false,
        }
    }
}

/// Parse a level name; unknown names fall back to INFO
pub fn parse_level(name: &str) -> Level {
    match name.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

impl LogConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        // PYHANDLE_LOG_LEVEL: trace, debug, info, warn, error
        if let Ok(level_str) = std::env::var("PYHANDLE_LOG_LEVEL") {
            config.level = parse_level(&level_str);
        }

        // PYHANDLE_LOG_FILE: path to log file
        if let Ok(path) = std::env::var("PYHANDLE_LOG_FILE") {
            config.file_output = true;
            config.log_path = Some(path);
        }

        config.json_format = std::env::var("PYHANDLE_LOG_JSON").is_ok();
        config.show_spans = std::env::var("PYHANDLE_LOG_SPANS").is_ok();

        config
    }

    /// Minimal logging
    pub fn performance() -> Self {
        Self {
            level: Level::ERROR,
            ..Self::default()
        }
    }

    /// Verbose logging to `pyhandle.log`
    pub fn debug() -> Self {
        Self {
            level: Level::TRACE,
            file_output: true,
            log_path: Some("pyhandle.log".to_string()),
            json_format: false,
            show_spans: true,
        }
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("pyhandle={}", self.level.as_str().to_lowercase()))
        })
    }

    fn span_events(&self) -> FmtSpan {
        if self.show_spans {
            FmtSpan::ENTER | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        }
    }
}

/// Initialize logging with configuration from the environment
pub fn init() {
    init_with_config(LogConfig::from_env());
}

/// Initialize logging with custom configuration; later calls are no-ops
pub fn init_with_config(config: LogConfig) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let (writer, guard) = match (&config.log_path, config.file_output) {
            (Some(path), true) => {
                let path = Path::new(path);
                let directory = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
                let file = path.file_name().map(|f| f.to_os_string()).unwrap_or_else(|| "pyhandle.log".into());
                tracing_appender::non_blocking(tracing_appender::rolling::never(directory, file))
            }
            _ => tracing_appender::non_blocking(io::stderr()),
        };

        let base = fmt::layer()
            .with_writer(writer)
            .with_span_events(config.span_events())
            .with_target(true)
            .with_thread_ids(cfg!(debug_assertions))
            .with_line_number(cfg!(debug_assertions));

        let layer: Box<dyn Layer<Registry> + Send + Sync> = if config.json_format {
            base.json().with_filter(config.filter()).boxed()
        } else {
            base.compact().with_filter(config.filter()).boxed()
        };

        // Another subscriber may already be installed (e.g. by the host)
        if tracing_subscriber::registry().with(layer).try_init().is_ok() {
            *WRITER_GUARD.lock() = Some(guard);
        }
    });
}

/// Check if logging is initialized
pub fn is_initialized() -> bool {
    LOGGER_INITIALIZED.get().is_some()
}

/// Flush and stop the background writer
pub fn shutdown() {
    WRITER_GUARD.lock().take();
}

// ============================================================================
// Handle-layer logging functions
// ============================================================================

/// Log interpreter memory allocation
#[inline]
pub fn log_allocation(size: usize, ptr: *const u8) {
    use tracing::trace;
    trace!(
        event = "allocation",
        size_bytes = size,
        address = ?ptr,
        "Interpreter memory allocated"
    );
}

/// Log interpreter memory release
#[inline]
pub fn log_deallocation(ptr: *const u8) {
    use tracing::trace;
    trace!(
        event = "deallocation",
        address = ?ptr,
        "Interpreter memory released"
    );
}

/// Log a call into the interpreter
pub fn log_ffi_call(fn_name: &str, arg_count: usize) {
    use tracing::debug;
    debug!(
        event = "ffi_call",
        function = fn_name,
        args = arg_count,
        "Calling interpreter object"
    );
}

/// Log a successful return from the interpreter
pub fn log_ffi_return(fn_name: &str) {
    use tracing::trace;
    trace!(
        event = "ffi_return",
        function = fn_name,
        "Interpreter call returned"
    );
}

/// Log an error crossing the native boundary
pub fn log_ffi_error(fn_name: &str, error: &str) {
    use tracing::warn;
    warn!(
        event = "ffi_error",
        function = fn_name,
        error = error,
        "Native function raised"
    );
}

/// Log entry into a host function from the interpreter
pub fn log_native_entry(fn_name: &str, convention: CallingConvention) {
    use tracing::trace;
    trace!(
        event = "native_entry",
        function = fn_name,
        convention = ?convention,
        "Native function invoked"
    );
}

/// Log a module import (may execute arbitrary module code)
pub fn log_module_import(module: &str) {
    use tracing::info;
    info!(
        event = "module_import",
        module = module,
        "Importing module"
    );
}

/// Log top-level source execution
pub fn log_execute(source_len: usize) {
    use tracing::debug;
    debug!(
        event = "execute",
        source_bytes = source_len,
        "Executing source in __main__"
    );
}

/// Log interpreter start-up
pub fn log_runtime_init(signal_handlers: bool) {
    use tracing::info;
    info!(
        event = "runtime_init",
        signal_handlers = signal_handlers,
        "Interpreter initializing"
    );
}

/// Log interpreter shutdown
pub fn log_runtime_shutdown() {
    use tracing::info;
    info!(
        event = "runtime_shutdown",
        "Interpreter finalizing"
    );
}

/// Performance tracking utilities
pub mod perf {
    use std::time::Instant;
    use tracing::debug;

    /// Track operation duration (returns guard that logs on drop)
    #[must_use]
    pub fn track(operation: &'static str) -> PerformanceGuard {
        PerformanceGuard {
            operation,
            start: Instant::now(),
        }
    }

    pub struct PerformanceGuard {
        operation: &'static str,
        start: Instant,
    }

    impl Drop for PerformanceGuard {
        fn drop(&mut self) {
            let elapsed = self.start.elapsed();
            debug!(
                operation = self.operation,
                duration_us = elapsed.as_micros() as u64,
                "operation completed"
            );
        }
    }
}
