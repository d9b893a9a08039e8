use std::collections::VecDeque;
use std::time::Duration;

use dunes_stream::AdvanceReport;

/// One simulated tick: how long it took and how much terrain it churned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickSample {
    pub duration: Duration,
    pub created: usize,
    pub evicted: usize,
}

/// Rolling window over the most recent ticks.
#[derive(Debug)]
pub struct TickTimer {
    samples: VecDeque<TickSample>,
    capacity: usize,
}

impl TickTimer {
    /// Remembers the last `capacity` ticks. Zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn record(&mut self, duration: Duration, report: &AdvanceReport) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(TickSample {
            duration,
            created: report.created.len(),
            evicted: report.evicted.len(),
        });
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn latest(&self) -> Option<&TickSample> {
        self.samples.back()
    }

    pub fn average(&self) -> Duration {
        if self.samples.is_empty() {
            return Duration::ZERO;
        }
        self.samples.iter().map(|s| s.duration).sum::<Duration>() / self.samples.len() as u32
    }

    pub fn max(&self) -> Duration {
        self.samples
            .iter()
            .map(|s| s.duration)
            .max()
            .unwrap_or(Duration::ZERO)
    }

    /// Slowest tick that built or evicted terrain, if any did.
    pub fn slowest_streaming(&self) -> Option<&TickSample> {
        self.samples
            .iter()
            .filter(|s| s.created + s.evicted > 0)
            .max_by_key(|s| s.duration)
    }

    /// Chunks created and evicted across the window.
    pub fn churn(&self) -> (usize, usize) {
        self.samples
            .iter()
            .fold((0, 0), |(c, e), s| (c + s.created, e + s.evicted))
    }
}
