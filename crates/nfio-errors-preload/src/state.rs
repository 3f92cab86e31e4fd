use nfio_config::{log_nfio_info, log_nfio_warn, logging, Config};
use nfio_errors::{ErrorTable, InterposeError, Interposer, StackWriter};
use std::cell::Cell;
use std::fmt::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

use crate::reals::DlsymResolver;
use crate::sink::write_all;

pub(crate) type PreloadInterposer = Interposer<DlsymResolver>;

// ============================================================================
// Interposer instances
// ============================================================================

/// Serves every call until the load-time constructor has read the config,
/// so no entry point ever waits on initialization.
static BUILTIN: PreloadInterposer = Interposer::builtin(DlsymResolver);
static CONFIGURED: OnceLock<PreloadInterposer> = OnceLock::new();
/// Set by the first init() caller; later callers return immediately.
static INIT_STARTED: AtomicBool = AtomicBool::new(false);

#[inline]
pub(crate) fn interposer() -> &'static PreloadInterposer {
    CONFIGURED.get().unwrap_or(&BUILTIN)
}

/// Load configuration and publish the configured interposer. Runs once,
/// from the `.init_array` constructor.
pub(crate) fn init() {
    if INIT_STARTED.swap(true, Ordering::SeqCst) {
        return;
    }
    // Anything config loading reports through libc runs as a nested call
    let _guard = ReentryGuard::enter();

    let (config, load_error) = match Config::load() {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };

    if let Some(file) = &config.logging.file {
        logging::init_file_logging(config.logging.level, file);
    }
    if let Some(e) = load_error {
        log_nfio_warn!(
            "configuration unreadable, using defaults",
            error = tracing::field::display(&e)
        );
    }

    let table = config.error_table().unwrap_or_else(|e| {
        log_nfio_warn!(
            "message table override rejected, using builtin table",
            error = tracing::field::display(&e)
        );
        ErrorTable::builtin()
    });

    let resolver = DlsymResolver;
    for missing in resolver.warm() {
        log_nfio_warn!("no next definition", symbol = missing.name());
    }

    let policy = config.range_policy();
    let interposer = Interposer::new(table, policy, resolver);
    let interposer = interposer.with_echo_calls(config.report.echo_calls);
    let table_len = interposer.table().len();
    if CONFIGURED.set(interposer).is_ok() {
        log_nfio_info!(
            "interposer ready",
            threshold = policy.threshold,
            mode = tracing::field::debug(policy.mode),
            table_len = table_len,
            echo_calls = config.report.echo_calls
        );
    }
}

// ============================================================================
// Recursion guard
// ============================================================================

thread_local! {
    static DEPTH: Cell<u32> = const { Cell::new(0) };
}

/// Tracks entry-point nesting on the current thread.
///
/// A nested call (a log writer failing and formatting an `io::Error`, which
/// calls `strerror_r`) runs with logging disabled so it cannot recurse.
pub(crate) struct ReentryGuard {
    nested: bool,
    counted: bool,
}

impl ReentryGuard {
    pub(crate) fn enter() -> Self {
        // TLS already torn down: treat as nested
        match DEPTH.try_with(|d| {
            let depth = d.get();
            d.set(depth + 1);
            depth
        }) {
            Ok(depth) => Self {
                nested: depth > 0,
                counted: true,
            },
            Err(_) => Self {
                nested: true,
                counted: false,
            },
        }
    }

    pub(crate) fn nested(&self) -> bool {
        self.nested
    }
}

impl Drop for ReentryGuard {
    fn drop(&mut self) {
        if self.counted {
            let _ = DEPTH.try_with(|d| d.set(d.get().saturating_sub(1)));
        }
    }
}

/// Run an entry point against the current interposer. A missing next
/// definition is fatal.
#[inline]
pub(crate) fn with_entry<T, F>(f: F) -> T
where
    F: FnOnce(&'static PreloadInterposer) -> Result<T, InterposeError>,
{
    let guard = ReentryGuard::enter();
    let result = if guard.nested() {
        let quiet = tracing::subscriber::NoSubscriber::default();
        tracing::subscriber::with_default(quiet, || f(interposer()))
    } else {
        f(interposer())
    };
    result.unwrap_or_else(|err| fatal(err))
}

/// The next definition is missing: calling anything would jump to null.
fn fatal(err: InterposeError) -> ! {
    let mut buf = [0u8; 256];
    let n = {
        let mut w = StackWriter::new(&mut buf[..255]);
        let _ = write!(w, "nfio-errors: fatal: {}", err);
        w.len()
    };
    buf[n] = b'\n';
    write_all(libc::STDERR_FILENO, &buf[..=n]);
    unsafe { libc::abort() }
}
