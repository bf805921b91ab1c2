//! Fixed period frame pacing

use std::time::{Duration, Instant};

/// Result of one paced cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pace {
    /// The cycle finished early and the remainder was slept
    OnTime {
        /// Time spent working
        elapsed: Duration,
    },
    /// The cycle ran past the period; the next one starts immediately
    Overrun {
        /// Time spent working
        elapsed: Duration,
    },
}

/// Sleeps out the remainder of a fixed frame period
#[derive(Debug, Clone)]
pub struct FramePacer {
    period: Duration,
    cycle_start: Instant,
    overruns: u64,
}

impl FramePacer {
    /// Create a pacer for `fps` cycles per second (at least 1)
    pub fn new(fps: u32) -> Self {
        Self::with_period(Duration::from_secs_f64(1.0 / f64::from(fps.max(1))))
    }

    /// Create a pacer with an explicit period
    pub fn with_period(period: Duration) -> Self {
        Self {
            period,
            cycle_start: Instant::now(),
            overruns: 0,
        }
    }

    /// Target period
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Overruns seen so far
    pub fn overruns(&self) -> u64 {
        self.overruns
    }

    /// Mark the start of a cycle
    pub fn begin(&mut self) {
        self.cycle_start = Instant::now();
    }

    /// Measure the cycle without sleeping
    pub fn measure(&mut self) -> Pace {
        let elapsed = self.cycle_start.elapsed();
        if elapsed > self.period {
            self.overruns += 1;
            Pace::Overrun { elapsed }
        } else {
            Pace::OnTime { elapsed }
        }
    }

    /// End the cycle, sleeping for whatever is left of the period
    pub fn finish(&mut self) -> Pace {
        let pace = self.measure();
        if let Pace::OnTime { elapsed } = pace {
            std::thread::sleep(self.period - elapsed);
        }
        pace
    }
}
