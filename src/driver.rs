// Driver Loop - Fixed-timestep accumulator and a tokio tick source
// Turns variable wall-clock frame deltas into whole physics ticks of a fixed dt

use log::{debug, info};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::constants::DEFAULT_MAX_TICKS_PER_FRAME;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedTimestep {
    /// Physics step (s)
    pub fixed_dt: f64,
    /// Unconsumed wall time (s)
    pub accumulator: f64,
    /// Tick cap per frame; the backlog beyond it is dropped
    pub max_ticks_per_frame: usize,
    pub paused: bool,
}

impl FixedTimestep {
    pub fn new(fixed_dt: f64) -> Self {
        Self {
            fixed_dt,
            accumulator: 0.0,
            max_ticks_per_frame: DEFAULT_MAX_TICKS_PER_FRAME,
            paused: false,
        }
    }

    pub fn with_max_ticks(mut self, max_ticks_per_frame: usize) -> Self {
        self.max_ticks_per_frame = max_ticks_per_frame;
        self
    }

    /// Number of fixed ticks to run for a frame that took `frame_delta` seconds.
    ///
    /// Paused frames neither tick nor accumulate.
    pub fn advance(&mut self, frame_delta: f64) -> usize {
        if self.paused || self.fixed_dt <= 0.0 || !frame_delta.is_finite() || frame_delta <= 0.0 {
            return 0;
        }

        self.accumulator += frame_delta;
        let mut ticks = 0;
        while self.accumulator >= self.fixed_dt && ticks < self.max_ticks_per_frame {
            self.accumulator -= self.fixed_dt;
            ticks += 1;
        }

        if ticks == self.max_ticks_per_frame && self.accumulator >= self.fixed_dt {
            // spiral of death guard
            debug!("dropping {:.3}s of physics backlog", self.accumulator);
            self.accumulator = 0.0;
        }
        ticks
    }

    /// Fraction of a tick left in the accumulator, for render interpolation
    pub fn alpha(&self) -> f64 {
        if self.fixed_dt > 0.0 {
            self.accumulator / self.fixed_dt
        } else {
            0.0
        }
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }
}

/// Spawn a frame loop that feeds `fixed_dt` ticks into the returned channel.
///
/// The loop measures real frame time at `frame_interval` and stops when the
/// receiver is dropped.
pub fn spawn_tick_source(mut timestep: FixedTimestep, frame_interval: Duration) -> (mpsc::Receiver<f64>, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(timestep.max_ticks_per_frame.max(1) * 4);

    let handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval(frame_interval);
        let mut last = Instant::now();
        info!("tick source started (dt = {}s)", timestep.fixed_dt);

        loop {
            interval.tick().await;
            let now = Instant::now();
            let frame_delta = now.duration_since(last).as_secs_f64();
            last = now;

            for _ in 0..timestep.advance(frame_delta) {
                if tx.send(timestep.fixed_dt).await.is_err() {
                    info!("tick source stopped");
                    return;
                }
            }
        }
    });

    (rx, handle)
}
