//! Verbosity-gated logging for tree generation.
//!
//! Messages go through the `log` facade; the host application picks the
//! backend (`env_logger` in tests and benches). [`Verbosity`] filters on top
//! of the backend level so a generator can be silenced on its own.

use std::time::Instant;

/// How much a generator reports while it runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Verbosity {
    /// No output.
    #[default]
    Silent,
    /// Rejected splits and other recoverable oddities.
    Warning,
    /// One line per generation call.
    Info,
    /// Every routing, resolution and split decision.
    Debug,
}

/// Logger owned by a single generation call.
#[derive(Debug, Clone)]
pub struct TrainingLogger {
    verbosity: Verbosity,
    started: Option<Instant>,
}

impl TrainingLogger {
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            started: None,
        }
    }

    #[inline]
    pub fn enabled(&self, level: Verbosity) -> bool {
        level != Verbosity::Silent && self.verbosity >= level
    }

    pub fn start_generation(&mut self, n_samples: usize, incremental: bool) {
        self.started = Some(Instant::now());
        let mode = if incremental { "incremental" } else { "initial" };
        self.info(format_args!("{} generation over {} samples", mode, n_samples));
    }

    pub fn finish_generation(&mut self, n_nodes: usize, n_leaves: usize) {
        let elapsed = self.started.take().map(|t| t.elapsed());
        match elapsed {
            Some(elapsed) => self.info(format_args!(
                "generation finished in {:.2?}: {} nodes, {} leaves",
                elapsed, n_nodes, n_leaves
            )),
            None => self.info(format_args!(
                "generation finished: {} nodes, {} leaves",
                n_nodes, n_leaves
            )),
        }
    }

    pub fn warn(&self, args: std::fmt::Arguments<'_>) {
        if self.enabled(Verbosity::Warning) {
            log::warn!("{}", args);
        }
    }

    pub fn info(&self, args: std::fmt::Arguments<'_>) {
        if self.enabled(Verbosity::Info) {
            log::info!("{}", args);
        }
    }

    pub fn debug(&self, args: std::fmt::Arguments<'_>) {
        if self.enabled(Verbosity::Debug) {
            log::debug!("{}", args);
        }
    }
}
