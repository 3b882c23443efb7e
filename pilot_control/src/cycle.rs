//! Fixed-tick cycle: ingest → tick → publish.
//!
//! ## RT Setup Sequence
//! 1. `mlockall(MCL_CURRENT | MCL_FUTURE)`: lock all pages.
//! 2. Prefault stack pages.
//! 3. `sched_setaffinity`: pin to one CPU core.
//! 4. `sched_setscheduler(SCHED_FIFO, prio)`.
//!
//! All four are no-ops without the `rt` feature.
//!
//! ## Pacing
//! - [`Pacing::FreeRun`]: next tick as soon as the previous one is
//!   published (replay, tests).
//! - [`Pacing::Realtime`]: absolute-time `clock_nanosleep` on
//!   `CLOCK_MONOTONIC` with the `rt` feature, where an overrun aborts the
//!   loop; `std::thread::sleep` otherwise, where overruns are only counted.
//!
//! The loop ends when the source is exhausted or the running flag is
//! cleared.

pub mod tick;

pub use tick::{ControlsCore, TickReport};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tracing::{info, warn};

use crate::config::{ConfigRefresher, ReloadResult};
use crate::ingest::{IngestError, TickSource};
use crate::publish::{ActuatorSink, PublishError};

// ─── Cycle Statistics ───────────────────────────────────────────────

/// O(1) per-tick timing statistics.
#[derive(Debug, Clone)]
pub struct CycleStats {
    /// Total ticks executed.
    pub cycle_count: u64,
    /// Last tick duration [ns].
    pub last_cycle_ns: i64,
    pub min_cycle_ns: i64,
    pub max_cycle_ns: i64,
    pub sum_cycle_ns: i64,
    pub sum_sq_cycle_ns: i128,
    /// Ticks that exceeded the period.
    pub overruns: u64,
    /// Maximum wake-up latency [ns].
    pub max_latency_ns: i64,
}

impl CycleStats {
    pub const fn new() -> Self {
        Self {
            cycle_count: 0,
            last_cycle_ns: 0,
            min_cycle_ns: i64::MAX,
            max_cycle_ns: 0,
            sum_cycle_ns: 0,
            sum_sq_cycle_ns: 0,
            overruns: 0,
            max_latency_ns: 0,
        }
    }

    /// Record one tick. No allocation.
    #[inline]
    pub fn record(&mut self, duration_ns: i64, latency_ns: i64) {
        self.cycle_count += 1;
        self.last_cycle_ns = duration_ns;
        self.min_cycle_ns = self.min_cycle_ns.min(duration_ns);
        self.max_cycle_ns = self.max_cycle_ns.max(duration_ns);
        self.sum_cycle_ns += duration_ns;
        self.sum_sq_cycle_ns += (duration_ns as i128) * (duration_ns as i128);
        self.max_latency_ns = self.max_latency_ns.max(latency_ns);
    }

    /// Average tick time [ns], 0 before the first tick.
    #[inline]
    pub fn avg_cycle_ns(&self) -> i64 {
        if self.cycle_count == 0 {
            0
        } else {
            self.sum_cycle_ns / self.cycle_count as i64
        }
    }

    /// Standard deviation of the tick time [ns].
    pub fn stddev_cycle_ns(&self) -> f64 {
        if self.cycle_count == 0 {
            return 0.0;
        }
        let n = self.cycle_count as f64;
        let mean = self.sum_cycle_ns as f64 / n;
        let var = self.sum_sq_cycle_ns as f64 / n - mean * mean;
        var.max(0.0).sqrt()
    }
}

impl Default for CycleStats {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Errors ─────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum CycleError {
    #[error("RT setup failed: {0}")]
    RtSetup(String),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error("tick overrun: {actual_ns} ns > {budget_ns} ns budget")]
    CycleOverrun { actual_ns: i64, budget_ns: i64 },
}

// ─── RT Setup ───────────────────────────────────────────────────────

#[cfg(feature = "rt")]
fn rt_mlockall() -> Result<(), CycleError> {
    use nix::sys::mman::{MlockallFlags, mlockall};
    mlockall(MlockallFlags::MCL_CURRENT | MlockallFlags::MCL_FUTURE)
        .map_err(|e| CycleError::RtSetup(format!("mlockall failed: {e}")))
}

#[cfg(not(feature = "rt"))]
fn rt_mlockall() -> Result<(), CycleError> {
    Ok(())
}

/// Touch 512 KiB of stack so the tick never faults a stack page in.
#[cfg(feature = "rt")]
fn prefault_stack() {
    let mut buf = [0u8; 512 * 1024];
    for byte in buf.iter_mut() {
        // SAFETY: `byte` is a valid, exclusive reference into `buf`.
        unsafe { core::ptr::write_volatile(byte, 0xA5) };
    }
    core::hint::black_box(&buf);
}

#[cfg(not(feature = "rt"))]
fn prefault_stack() {}

#[cfg(feature = "rt")]
fn rt_set_affinity(cpu: usize) -> Result<(), CycleError> {
    use nix::sched::{CpuSet, sched_setaffinity};
    use nix::unistd::Pid;

    let mut cpuset = CpuSet::new();
    cpuset
        .set(cpu)
        .map_err(|e| CycleError::RtSetup(format!("CpuSet::set({cpu}) failed: {e}")))?;
    sched_setaffinity(Pid::from_raw(0), &cpuset)
        .map_err(|e| CycleError::RtSetup(format!("sched_setaffinity failed: {e}")))
}

#[cfg(not(feature = "rt"))]
fn rt_set_affinity(_cpu: usize) -> Result<(), CycleError> {
    Ok(())
}

#[cfg(feature = "rt")]
fn rt_set_scheduler(priority: i32) -> Result<(), CycleError> {
    let param = libc::sched_param {
        sched_priority: priority,
    };
    // SAFETY: `param` outlives the call; pid 0 is the calling thread.
    let ret = unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) };
    if ret != 0 {
        let err = std::io::Error::last_os_error();
        return Err(CycleError::RtSetup(format!(
            "sched_setscheduler(SCHED_FIFO, {priority}) failed: {err}"
        )));
    }
    Ok(())
}

#[cfg(not(feature = "rt"))]
fn rt_set_scheduler(_priority: i32) -> Result<(), CycleError> {
    Ok(())
}

/// Full RT setup. Call once before entering the loop.
pub fn rt_setup(cpu_core: usize, rt_priority: i32) -> Result<(), CycleError> {
    rt_mlockall()?;
    prefault_stack();
    rt_set_affinity(cpu_core)?;
    rt_set_scheduler(rt_priority)?;
    info!(cpu_core, rt_priority, rt = cfg!(feature = "rt"), "RT setup complete");
    Ok(())
}

// ─── Cycle Runner ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pacing {
    #[default]
    FreeRun,
    Realtime,
}

/// Drives a [`ControlsCore`] from a source into a sink.
pub struct CycleRunner<S, K> {
    core: ControlsCore,
    source: S,
    sink: K,
    refresher: Option<ConfigRefresher>,
    running: Arc<AtomicBool>,
    pacing: Pacing,
    stats: CycleStats,
    cycle_time_ns: i64,
    last_report: Option<TickReport>,
}

impl<S: TickSource, K: ActuatorSink> CycleRunner<S, K> {
    pub fn new(core: ControlsCore, source: S, sink: K) -> Self {
        let cycle_time_ns = core.config().config().timing.tick_period_us as i64 * 1_000;
        Self {
            core,
            source,
            sink,
            refresher: None,
            running: Arc::new(AtomicBool::new(true)),
            pacing: Pacing::FreeRun,
            stats: CycleStats::new(),
            cycle_time_ns,
            last_report: None,
        }
    }

    pub fn with_refresher(mut self, refresher: ConfigRefresher) -> Self {
        self.refresher = Some(refresher);
        self
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    /// Flag that stops the loop after the current tick when cleared.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn core(&self) -> &ControlsCore {
        &self.core
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    pub fn last_report(&self) -> Option<&TickReport> {
        self.last_report.as_ref()
    }

    /// Run until the source ends or the running flag is cleared.
    pub fn run(&mut self) -> Result<(), CycleError> {
        let result = match self.pacing {
            Pacing::FreeRun => self.run_free_loop(),
            #[cfg(feature = "rt")]
            Pacing::Realtime => self.run_rt_loop(),
            #[cfg(not(feature = "rt"))]
            Pacing::Realtime => self.run_sim_loop(),
        };
        self.sink.flush()?;
        info!(
            ticks = self.stats.cycle_count,
            avg_ns = self.stats.avg_cycle_ns(),
            max_ns = self.stats.max_cycle_ns,
            overruns = self.stats.overruns,
            "cycle loop stopped"
        );
        result
    }

    /// One ingest → tick → publish pass. `false` once the source is done.
    fn step(&mut self) -> Result<bool, CycleError> {
        let Some(inputs) = self.source.next_tick()? else {
            return Ok(false);
        };
        self.poll_refresher();
        let report = self.core.tick(&inputs);
        self.sink.publish(report.tick, report.command)?;
        self.last_report = Some(report);
        Ok(true)
    }

    fn poll_refresher(&mut self) {
        let Some(refresher) = self.refresher.as_mut() else {
            return;
        };
        if let Some(ReloadResult::Staged(snapshot)) = refresher.poll(self.core.latest_config()) {
            if let Err(e) = self.core.stage_config(snapshot) {
                warn!(error = %e, "staged configuration rejected");
            }
        }
    }

    #[inline]
    fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    fn run_free_loop(&mut self) -> Result<(), CycleError> {
        use std::time::Instant;

        while self.is_running() {
            let start = Instant::now();
            if !self.step()? {
                break;
            }
            self.stats.record(start.elapsed().as_nanos() as i64, 0);
        }
        Ok(())
    }

    #[cfg(feature = "rt")]
    fn run_rt_loop(&mut self) -> Result<(), CycleError> {
        use nix::time::{ClockId, ClockNanosleepFlags, clock_gettime, clock_nanosleep};

        let clock = ClockId::CLOCK_MONOTONIC;
        let now = || {
            clock_gettime(clock).map_err(|e| CycleError::RtSetup(format!("clock_gettime: {e}")))
        };
        let mut next_wake = now()?;

        while self.is_running() {
            next_wake = timespec_add_ns(next_wake, self.cycle_time_ns);

            let start = now()?;
            if !self.step()? {
                break;
            }
            let end = now()?;
            let duration_ns = timespec_diff_ns(&end, &start);
            self.stats.record(duration_ns, 0);

            if duration_ns > self.cycle_time_ns {
                self.stats.overruns += 1;
                return Err(CycleError::CycleOverrun {
                    actual_ns: duration_ns,
                    budget_ns: self.cycle_time_ns,
                });
            }

            let _ = clock_nanosleep(clock, ClockNanosleepFlags::TIMER_ABSTIME, &next_wake);
            let woke = now()?;
            self.stats.max_latency_ns = self
                .stats
                .max_latency_ns
                .max(timespec_diff_ns(&woke, &next_wake).abs());
        }
        Ok(())
    }

    #[cfg(not(feature = "rt"))]
    fn run_sim_loop(&mut self) -> Result<(), CycleError> {
        use std::time::{Duration, Instant};

        let period = Duration::from_nanos(self.cycle_time_ns as u64);
        while self.is_running() {
            let start = Instant::now();
            if !self.step()? {
                break;
            }
            let elapsed = start.elapsed();
            let duration_ns = elapsed.as_nanos() as i64;
            self.stats.record(duration_ns, 0);
            if duration_ns > self.cycle_time_ns {
                self.stats.overruns += 1;
            }
            if let Some(remaining) = period.checked_sub(elapsed) {
                std::thread::sleep(remaining);
            }
        }
        Ok(())
    }
}

// ─── Time Helpers ───────────────────────────────────────────────────

#[cfg(feature = "rt")]
fn timespec_add_ns(ts: nix::sys::time::TimeSpec, ns: i64) -> nix::sys::time::TimeSpec {
    use nix::sys::time::TimeSpec;
    let total = ts.tv_nsec() + ns;
    let secs = ts.tv_sec() + total.div_euclid(1_000_000_000);
    let nanos = total.rem_euclid(1_000_000_000);
    TimeSpec::new(secs, nanos)
}

/// `a - b` [ns].
#[cfg(feature = "rt")]
fn timespec_diff_ns(a: &nix::sys::time::TimeSpec, b: &nix::sys::time::TimeSpec) -> i64 {
    (a.tv_sec() - b.tv_sec()) * 1_000_000_000 + (a.tv_nsec() - b.tv_nsec())
}

// ─── Tests ──────────────────────────────────────────────────────────
