//! The public logger facade: producer entry points, the lifecycle state
//! machine, and the process-wide default instance.
//!
//! Producers are lock-free: they read the config snapshot and the channel
//! identity through `arc_swap` guards and enqueue with a non-blocking send.
//! All mutation (`apply_config`, `start`, `stop`, `shutdown`) serializes on
//! one lifecycle mutex and synchronizes with the processor through the
//! channel-swap protocol: install new channel, drop the old sender, await
//! the processor's exit, then touch file state.

use std::sync::atomic::Ordering;
use std::sync::{Arc, OnceLock};
use std::thread;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use crossbeam_channel::{Receiver, Sender, bounded};
use parking_lot::Mutex;

use crate::core::config::Config;
use crate::core::errors::{Result, SpoolError};
use crate::files::FileSink;
use crate::pipeline::channel::{SwapChannel, record_channel};
use crate::pipeline::processor::{self, FlushRequest};
use crate::pipeline::state::{LoggerStats, SharedState};
use crate::record::{Level, Record, RecordFlags, Value, trace};

/// How long lifecycle calls wait for the old processor to drain and exit.
const PROCESSOR_EXIT_WAIT: Duration = Duration::from_secs(5);

/// Send-side patience for handing a flush request to the processor.
const FLUSH_ENQUEUE_TIMEOUT: Duration = Duration::from_millis(10);

/// Handle to one logger instance. Cheap to clone; all clones share the
/// same pipeline.
#[derive(Clone)]
pub struct Logger {
    inner: Arc<Inner>,
}

struct Inner {
    state: Arc<SharedState>,
    config: Arc<ArcSwap<Config>>,
    channel: Arc<SwapChannel>,
    lifecycle: Mutex<Lifecycle>,
}

/// State owned by lifecycle calls: the sink while no processor runs, the
/// receiver for the next processor, and handles to the current one.
#[derive(Default)]
struct Lifecycle {
    sink: Option<FileSink>,
    pending_rx: Option<Receiver<Record>>,
    handle: Option<thread::JoinHandle<Option<FileSink>>>,
    flush_tx: Option<Sender<FlushRequest>>,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger {
    /// Fresh instance in the Created state: not configured, not started,
    /// every producer call a silent no-op.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Arc::new(SharedState::new()),
                config: Arc::new(ArcSwap::from_pointee(Config::default())),
                channel: Arc::new(SwapChannel::new()),
                lifecycle: Mutex::new(Lifecycle::default()),
            }),
        }
    }

    /// Convenience: `new` + `apply_config`.
    pub fn with_config(cfg: Config) -> Result<Self> {
        let logger = Self::new();
        logger.apply_config(cfg)?;
        Ok(logger)
    }

    // ──────────────────── lifecycle ────────────────────

    /// Validate and install a configuration. The only reconfiguration
    /// entry point; valid in the Configured, Running, and Stopped states.
    ///
    /// On any failure the previous configuration and state are preserved.
    /// While running, changes to channel- or file-shaping fields swap the
    /// channel and restart the processor; all other fields take effect on
    /// the processor's next config snapshot.
    pub fn apply_config(&self, cfg: Config) -> Result<()> {
        cfg.validate()?;
        let state = &self.inner.state;
        let mut lc = self.inner.lifecycle.lock();

        if state.shutdown_called.load(Ordering::Relaxed) {
            return Err(SpoolError::NotInitialized);
        }

        let was_initialized = state.initialized.load(Ordering::Relaxed);
        let old = was_initialized.then(|| self.inner.config.load_full());
        let identity_changed = old.as_ref().is_none_or(|o| o.file_identity_changed(&cfg));
        let restart_needed = old.as_ref().is_none_or(|o| o.requires_restart(&cfg));

        // Open the new sink before committing anything so an open failure
        // rolls back cleanly.
        let pre_sink = if identity_changed && cfg.output.enable_file {
            Some(FileSink::open(&cfg.output)?)
        } else {
            None
        };

        let cfg = Arc::new(cfg);
        let running = state.started.load(Ordering::Relaxed);

        if running && restart_needed {
            self.restart_processor(&mut lc, &cfg, identity_changed, pre_sink)?;
        } else if running {
            self.inner.config.store(Arc::clone(&cfg));
        } else {
            self.inner.config.store(Arc::clone(&cfg));
            if identity_changed {
                if let Some(mut old_sink) = lc.sink.take() {
                    old_sink.close();
                }
                lc.sink = pre_sink;
            }
            // Install the channel the next processor will consume.
            let (tx, rx) = record_channel(cfg.limits.buffer_size);
            self.inner.channel.install(tx);
            lc.pending_rx = Some(rx);
        }

        state
            .initialized
            .store(true, Ordering::Relaxed);
        Ok(())
    }

    /// Spawn the processor. No-op when already running.
    pub fn start(&self) -> Result<()> {
        let state = &self.inner.state;
        let mut lc = self.inner.lifecycle.lock();

        if state.shutdown_called.load(Ordering::Relaxed)
            || !state.initialized.load(Ordering::Relaxed)
        {
            return Err(SpoolError::NotInitialized);
        }
        if state.started.load(Ordering::Relaxed) {
            return Ok(());
        }

        let cfg = self.inner.config.load_full();
        if cfg.output.enable_file && lc.sink.is_none() {
            lc.sink = Some(FileSink::open(&cfg.output)?);
        }

        let rx = match lc.pending_rx.take() {
            Some(rx) => rx,
            None => {
                let (tx, rx) = record_channel(cfg.limits.buffer_size);
                self.inner.channel.install(tx);
                rx
            }
        };
        let (flush_tx, flush_rx) = bounded::<FlushRequest>(1);

        let handle = processor::spawn(
            rx,
            flush_rx,
            lc.sink.take(),
            Arc::clone(&self.inner.state),
            Arc::clone(&self.inner.config),
            Arc::clone(&self.inner.channel),
        )?;

        lc.handle = Some(handle);
        lc.flush_tx = Some(flush_tx);
        state
            .started
            .store(true, Ordering::Relaxed);
        state.mark_started();
        Ok(())
    }

    /// Close the channel, await the processor, keep configuration and file
    /// handle for a later restart. No-op when already stopped.
    pub fn stop(&self) -> Result<()> {
        let mut lc = self.inner.lifecycle.lock();
        self.stop_locked(&mut lc, PROCESSOR_EXIT_WAIT)
    }

    /// Await confirmation that everything sent before this call is written
    /// and synced.
    pub fn flush(&self, timeout: Duration) -> Result<()> {
        let state = &self.inner.state;
        if !state.initialized.load(Ordering::Relaxed) {
            return Err(SpoolError::NotInitialized);
        }
        if !state.started.load(Ordering::Relaxed) {
            return Err(SpoolError::NotStarted);
        }

        let flush_tx = self
            .inner
            .lifecycle
            .lock()
            .flush_tx
            .clone()
            .ok_or(SpoolError::NotStarted)?;

        let (reply_tx, reply_rx) = bounded::<()>(1);
        flush_tx
            .send_timeout(FlushRequest { reply: reply_tx }, FLUSH_ENQUEUE_TIMEOUT)
            .map_err(|_| SpoolError::ProcessorBusy)?;
        reply_rx
            .recv_timeout(timeout)
            .map_err(|_| SpoolError::FlushTimeout)
    }

    /// Terminal: stop, sync and close the file, and refuse further
    /// lifecycle calls. Producer calls become silent no-ops.
    pub fn shutdown(&self, timeout: Duration) -> Result<()> {
        let state = &self.inner.state;
        let mut lc = self.inner.lifecycle.lock();

        if state.shutdown_called.load(Ordering::Relaxed) {
            return Ok(());
        }

        let mut result = self.stop_locked(&mut lc, timeout);

        if let Some(mut sink) = lc.sink.take() {
            if let Err(e) = sink.sync()
                && result.is_ok()
            {
                result = Err(e);
            }
            sink.close();
        }

        self.inner.channel.close();
        state
            .shutdown_called
            .store(true, Ordering::Relaxed);
        state
            .initialized
            .store(false, Ordering::Relaxed);
        result
    }

    /// Counter snapshot; never blocks.
    #[must_use]
    pub fn stats(&self) -> LoggerStats {
        self.inner.state.snapshot()
    }

    /// Effective configuration snapshot.
    #[must_use]
    pub fn config(&self) -> Arc<Config> {
        self.inner.config.load_full()
    }

    // ──────────────────── producer API ────────────────────

    /// Log at Debug severity.
    pub fn debug<I, V>(&self, args: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.leveled(Level::Debug, None, args);
    }

    /// Log at Info severity.
    pub fn info<I, V>(&self, args: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.leveled(Level::Info, None, args);
    }

    /// Log at Warn severity.
    pub fn warn<I, V>(&self, args: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.leveled(Level::Warn, None, args);
    }

    /// Log at Error severity.
    pub fn error<I, V>(&self, args: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.leveled(Level::Error, None, args);
    }

    /// Debug with an explicit caller-trace depth (capped at 10).
    pub fn debug_trace<I, V>(&self, depth: u8, args: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.leveled(Level::Debug, Some(depth), args);
    }

    /// Info with an explicit caller-trace depth (capped at 10).
    pub fn info_trace<I, V>(&self, depth: u8, args: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.leveled(Level::Info, Some(depth), args);
    }

    /// Warn with an explicit caller-trace depth (capped at 10).
    pub fn warn_trace<I, V>(&self, depth: u8, args: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.leveled(Level::Warn, Some(depth), args);
    }

    /// Error with an explicit caller-trace depth (capped at 10).
    pub fn error_trace<I, V>(&self, depth: u8, args: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.leveled(Level::Error, Some(depth), args);
    }

    /// Timestamp-only entry: no level label, not subject to the level
    /// filter.
    pub fn log<I, V>(&self, args: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.unleveled(RecordFlags::SHOW_TIMESTAMP, args);
    }

    /// Bare entry: no metadata at all, newline-terminated.
    pub fn message<I, V>(&self, args: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.unleveled(RecordFlags::empty(), args);
    }

    /// Raw entry: no metadata, no trailing newline.
    pub fn write<I, V>(&self, args: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.unleveled(RecordFlags::RAW, args);
    }

    // ──────────────────── internals ────────────────────

    fn leveled<I, V>(&self, level: Level, depth_override: Option<u8>, args: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let state = &self.inner.state;
        if !state.initialized.load(Ordering::Relaxed) {
            return;
        }
        let cfg = self.inner.config.load();
        if !state.started.load(Ordering::Relaxed) {
            processor::diag(&cfg, "record discarded, logger not started");
            return;
        }
        if level < cfg.behavior.level {
            return;
        }

        let depth = depth_override.unwrap_or(cfg.behavior.trace_depth).min(10);
        let captured = trace::capture(depth);

        let record = Record::new(
            cfg.format.record_flags(),
            level,
            args.into_iter().map(Into::into).collect(),
        )
        .with_trace(captured);

        if self.inner.channel.try_send(record).is_err() {
            state.count_drop();
        }
    }

    fn unleveled<I, V>(&self, flags: RecordFlags, args: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let state = &self.inner.state;
        if !state.initialized.load(Ordering::Relaxed) {
            return;
        }
        if !state.started.load(Ordering::Relaxed) {
            processor::diag(&self.inner.config.load(), "record discarded, logger not started");
            return;
        }

        let record = Record::new(flags, Level::Info, args.into_iter().map(Into::into).collect());
        if self.inner.channel.try_send(record).is_err() {
            state.count_drop();
        }
    }

    /// Swap protocol while running: install new channel, retire the old
    /// processor, hand the (possibly replaced) sink to a fresh one.
    fn restart_processor(
        &self,
        lc: &mut Lifecycle,
        cfg: &Arc<Config>,
        identity_changed: bool,
        pre_sink: Option<FileSink>,
    ) -> Result<()> {
        let state = &self.inner.state;

        let (tx, rx) = record_channel(cfg.limits.buffer_size);
        self.inner.config.store(Arc::clone(cfg));
        self.inner.channel.install(tx);
        lc.flush_tx = None;

        // The old processor drains what it can and exits on disconnect.
        let recovered = match self.wait_for_exit(lc, PROCESSOR_EXIT_WAIT) {
            Ok(recovered) => recovered,
            Err(e) => {
                // Leave a consistent Stopped state rather than two
                // processors racing for the sink.
                state
                    .started
                    .store(false, Ordering::Relaxed);
                return Err(e);
            }
        };

        let sink = if identity_changed {
            if let Some(mut old_sink) = recovered {
                old_sink.close();
            }
            pre_sink
        } else if cfg.output.enable_file {
            match recovered {
                Some(sink) => Some(sink),
                None => Some(FileSink::open(&cfg.output)?),
            }
        } else {
            if let Some(mut old_sink) = recovered {
                old_sink.close();
            }
            None
        };

        let (flush_tx, flush_rx) = bounded::<FlushRequest>(1);
        let handle = processor::spawn(
            rx,
            flush_rx,
            sink,
            Arc::clone(&self.inner.state),
            Arc::clone(&self.inner.config),
            Arc::clone(&self.inner.channel),
        )?;
        lc.handle = Some(handle);
        lc.flush_tx = Some(flush_tx);
        Ok(())
    }

    fn stop_locked(&self, lc: &mut Lifecycle, timeout: Duration) -> Result<()> {
        let state = &self.inner.state;
        if !state.started.load(Ordering::Relaxed) {
            return Ok(());
        }

        state
            .started
            .store(false, Ordering::Relaxed);
        self.inner.channel.close();
        lc.flush_tx = None;
        lc.pending_rx = None;

        let recovered = self.wait_for_exit(lc, timeout)?;
        lc.sink = recovered;
        Ok(())
    }

    /// Wait for the running processor to exit and recover its sink.
    fn wait_for_exit(&self, lc: &mut Lifecycle, timeout: Duration) -> Result<Option<FileSink>> {
        let Some(handle) = lc.handle.take() else {
            return Ok(None);
        };
        let state = &self.inner.state;
        let deadline = Instant::now() + timeout;

        while !state.processor_exited.load(Ordering::Acquire) {
            if handle.is_finished() {
                break;
            }
            if Instant::now() >= deadline {
                lc.handle = Some(handle);
                return Err(SpoolError::ShutdownTimeout);
            }
            thread::sleep(Duration::from_millis(1));
        }

        // The exit flag is set; join returns promptly. A panicked
        // processor loses its sink, which is reopened on demand.
        Ok(handle.join().unwrap_or(None))
    }
}

// ──────────────────── process-wide default ────────────────────

static DEFAULT: OnceLock<Logger> = OnceLock::new();

/// The lazily created process-wide logger. Configure it once at startup
/// with [`Logger::apply_config`]; everything else can take explicit
/// handles.
#[must_use]
pub fn default_logger() -> &'static Logger {
    DEFAULT.get_or_init(Logger::new)
}

// ──────────────────── tests ────────────────────
