//! Simulation Driver
//!
//! Runs one circuit generation at a time on a background task and swaps in
//! a freshly compiled generation after edits.
//!
//! # Rebuild handoff
//!
//! Edits only flag a rebuild ([`SimulationDriver::request_rebuild`]). The
//! foreground loop calls [`SimulationDriver::poll`] once per frame; when the
//! debounce window has passed without further edits the driver:
//!
//! 1. signals cancellation to the running task,
//! 2. blocks until that task has exited (it checks the signal at the top of
//!    every tick and during the inter-tick sleep, so the wait is bounded),
//! 3. creates a new cancellation channel,
//! 4. spawns a task that compiles the field snapshot and ticks it until
//!    cancelled.
//!
//! Two tasks never share a circuit generation, and a circuit is only ever
//! touched by the task that built it.
//!
//! # Failures
//!
//! A build or script failure ends the generation. The task stores nothing
//! shared; its [`SimError`] comes back through the join handle and is kept
//! for [`SimulationDriver::take_failure`]. The next rebuild starts over.
//!
//! The driver owns its Tokio runtime and blocks on it during handoff, so it
//! must not be used from inside another runtime's async context.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::runtime::Runtime;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::circuit::LiveStates;
use crate::config::{BuildOptions, SimConfig};
use crate::error::{SimError, SimResult};
use crate::field::Field;

/// How a generation ended.
#[derive(Debug)]
enum Outcome {
    Cancelled,
    Failed(SimError),
}

/// The running generation.
struct Generation {
    id: u64,
    cancel: watch::Sender<bool>,
    toggles: mpsc::UnboundedSender<usize>,
    handle: JoinHandle<Outcome>,
}

/// Background simulation with debounced rebuilds.
pub struct SimulationDriver {
    runtime: Runtime,
    config: SimConfig,
    tick_delay: Arc<AtomicU64>,
    live: LiveStates,
    dirty_since: Option<Instant>,
    current: Option<Generation>,
    generations: u64,
    failure: Option<SimError>,
}

impl SimulationDriver {
    /// Create a stopped driver with its own runtime.
    pub fn new(config: SimConfig) -> SimResult<Self> {
        let config = config.clamped();
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("gridsim-sim")
            .enable_time()
            .build()?;

        Ok(Self {
            runtime,
            config,
            tick_delay: Arc::new(AtomicU64::new(config.tick_delay_ms)),
            live: LiveStates::new(),
            dirty_since: None,
            current: None,
            generations: 0,
            failure: None,
        })
    }

    /// Get the current configuration.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Flag the grid as edited. Restarts the debounce window.
    pub fn request_rebuild(&mut self) {
        self.dirty_since = Some(Instant::now());
    }

    /// Check whether a rebuild is waiting for its debounce window.
    pub fn rebuild_pending(&self) -> bool {
        self.dirty_since.is_some()
    }

    /// Call once per frame. Rebuilds from `field` when a requested rebuild
    /// has been quiet for the debounce window; returns whether it did.
    pub fn poll(&mut self, field: &Field) -> bool {
        self.reap();
        match self.dirty_since {
            Some(since) if since.elapsed() >= self.config.rebuild_debounce() => {
                self.rebuild_now(field);
                true
            }
            _ => false,
        }
    }

    /// Stop the current generation and start a new one from `field`.
    pub fn rebuild_now(&mut self, field: &Field) {
        self.dirty_since = None;
        self.stop();

        let (cancel, cancel_rx) = watch::channel(false);
        let (toggles, toggle_rx) = mpsc::unbounded_channel();
        self.generations += 1;
        let id = self.generations;

        let task = run_generation(
            id,
            field.clone(),
            self.config.build_options(),
            Arc::clone(&self.tick_delay),
            self.live.clone(),
            cancel_rx,
            toggle_rx,
        );
        let handle = self.runtime.spawn(task);
        info!(generation = id, field = field.name(), "simulation started");

        self.current = Some(Generation {
            id,
            cancel,
            toggles,
            handle,
        });
    }

    /// Forward a toggle event to the running generation.
    /// Returns false when nothing is running.
    pub fn toggle(&self, index: usize) -> bool {
        self.current
            .as_ref()
            .is_some_and(|g| g.toggles.send(index).is_ok())
    }

    /// The renderer's view of the latest published states.
    pub fn live_states(&self) -> LiveStates {
        self.live.clone()
    }

    /// Check whether a generation is currently running.
    pub fn is_running(&self) -> bool {
        self.current.as_ref().is_some_and(|g| !g.handle.is_finished())
    }

    /// The error that ended the last generation, if any.
    pub fn take_failure(&mut self) -> Option<SimError> {
        self.reap();
        self.failure.take()
    }

    /// Takes effect on the next tick of the running generation.
    pub fn set_tick_delay(&mut self, ms: u64) {
        self.config.set_tick_delay_ms(ms);
        self.tick_delay.store(self.config.tick_delay_ms, Ordering::Relaxed);
    }

    /// Clock periods are fixed at build time, so this requests a rebuild.
    pub fn set_clock_period(&mut self, ms: u64) {
        self.config.set_clock_period_ms(ms);
        self.request_rebuild();
    }

    /// Cancel the running generation and wait for it to exit.
    pub fn stop(&mut self) {
        let Some(generation) = self.current.take() else {
            return;
        };
        debug!(generation = generation.id, "cancelling simulation");
        // the task may already be gone, in which case there is nobody to tell
        let _ = generation.cancel.send(true);
        self.join(generation);
    }

    /// Collect a generation that ended on its own.
    fn reap(&mut self) {
        if self.current.as_ref().is_some_and(|g| g.handle.is_finished()) {
            if let Some(generation) = self.current.take() {
                self.join(generation);
            }
        }
    }

    fn join(&mut self, generation: Generation) {
        match self.runtime.block_on(generation.handle) {
            Ok(Outcome::Cancelled) => {
                debug!(generation = generation.id, "simulation stopped");
            }
            Ok(Outcome::Failed(e)) => {
                warn!(generation = generation.id, error = %e, "simulation failed");
                self.failure = Some(e);
            }
            Err(e) => {
                error!(generation = generation.id, error = %e, "simulation task panicked");
            }
        }
    }
}

impl Drop for SimulationDriver {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_generation(
    id: u64,
    field: Field,
    options: BuildOptions,
    tick_delay: Arc<AtomicU64>,
    live: LiveStates,
    mut cancel: watch::Receiver<bool>,
    mut toggles: mpsc::UnboundedReceiver<usize>,
) -> Outcome {
    let build = match field.build_objects(&options) {
        Ok(build) => build,
        Err(e) => {
            error!(generation = id, error = %e, "build failed");
            return Outcome::Failed(e.into());
        }
    };
    for issue in &build.issues {
        warn!(generation = id, x = issue.pos.x, y = issue.pos.y, reason = %issue.reason, "build issue");
    }

    let mut circuit = build.circuit;
    live.clear();

    loop {
        if *cancel.borrow() {
            return Outcome::Cancelled;
        }

        let mut events = Vec::new();
        while let Ok(index) = toggles.try_recv() {
            events.push(index);
        }
        circuit.handle_toggle_input(events);

        if let Err(e) = circuit.update() {
            error!(generation = id, tick = circuit.ticks(), error = %e, "tick failed");
            return Outcome::Failed(e);
        }
        circuit.publish(&live);

        let delay = Duration::from_millis(tick_delay.load(Ordering::Relaxed));
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            changed = cancel.changed() => {
                if changed.is_err() {
                    return Outcome::Cancelled;
                }
            }
        }
    }
}
