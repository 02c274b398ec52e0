use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Sliding-window limiter shared by every generation request.
///
/// Keeps the instants of admitted requests inside the trailing `window`.
/// Entries are pruned lazily on each check, there is no background sweep.
pub struct SlidingWindowLimiter {
    ceiling: usize,
    window: Duration,
    timestamps: Mutex<VecDeque<Instant>>,
}

impl SlidingWindowLimiter {
    pub fn new(ceiling: usize, window: Duration) -> Self {
        Self {
            ceiling,
            window,
            timestamps: Mutex::new(VecDeque::with_capacity(ceiling)),
        }
    }

    /// Returns true when the request is admitted, false when throttled.
    pub fn admit(&self) -> bool {
        self.admit_at(Instant::now())
    }

    pub fn admit_at(&self, now: Instant) -> bool {
        let mut window = self.timestamps.lock().unwrap_or_else(|e| e.into_inner());

        // expired entries sit at the front
        while let Some(oldest) = window.front() {
            if now.saturating_duration_since(*oldest) >= self.window {
                window.pop_front();
            } else {
                break;
            }
        }

        if window.len() >= self.ceiling {
            return false;
        }
        window.push_back(now);
        true
    }

    pub fn len(&self) -> usize {
        self.timestamps.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}
