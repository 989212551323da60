//! Backend update rate measurement
//!
//! Counts full-state samples over a sliding start point. A silence longer
//! than one second restarts the window so a paused device does not drag
//! the average down.

use chrono::{DateTime, Duration, Local};

const RESET_GAP_MS: i64 = 1_000;
/// Samples needed before a rate is reported
const MIN_SAMPLES: u64 = 10;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UpdateRate {
    pub per_second: f64,
    pub count: u64,
    pub window: Duration,
}

#[derive(Clone, Debug, Default)]
pub struct RateMeter {
    count: u64,
    started: Option<DateTime<Local>>,
    last: Option<DateTime<Local>>,
}

impl RateMeter {
    pub fn record(&mut self, now: DateTime<Local>) {
        match self.last {
            Some(last)
                if now - last <= Duration::milliseconds(RESET_GAP_MS) && self.count > 0 => {}
            _ => {
                self.started = Some(now);
                self.count = 0;
            }
        }
        self.last = Some(now);
        self.count += 1;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn rate(&self) -> Option<UpdateRate> {
        if self.count <= MIN_SAMPLES {
            return None;
        }
        let (started, last) = (self.started?, self.last?);
        let window = last - started;
        let secs = window.num_microseconds()? as f64 / 1_000_000.0;
        if secs <= 0.0 {
            return None;
        }
        Some(UpdateRate {
            per_second: self.count as f64 / secs,
            count: self.count,
            window,
        })
    }
}
