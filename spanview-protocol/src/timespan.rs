use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::span::Timestamp;

/// Rejected attempt to build a window whose start is after its end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("timespan start {start} is after end {end}")]
pub struct InvalidTimespan {
    pub start: Timestamp,
    pub end: Timestamp,
}

/// Ordered `(start, end)` window. `start <= end` holds for every value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawTimespan", into = "RawTimespan")]
pub struct Timespan {
    start: Timestamp,
    end: Timestamp,
}

impl Timespan {
    /// Builds a window, refusing out-of-order bounds instead of swapping them.
    pub fn new(start: Timestamp, end: Timestamp) -> Result<Self, InvalidTimespan> {
        if start > end {
            return Err(InvalidTimespan { start, end });
        }
        Ok(Self { start, end })
    }

    /// Window of `duration` that ends at `end`. Negative durations collapse to an instant.
    pub fn ending_at(end: Timestamp, duration: Duration) -> Self {
        let duration = duration.max(Duration::zero());
        Self {
            start: end - duration,
            end,
        }
    }

    /// Window of `duration` centred on `center`.
    pub fn centered_on(center: Timestamp, duration: Duration) -> Self {
        let duration = duration.max(Duration::zero());
        let half = duration / 2;
        Self {
            start: center - half,
            end: center - half + duration,
        }
    }

    pub fn start(&self) -> Timestamp {
        self.start
    }

    pub fn end(&self) -> Timestamp {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn contains(&self, timestamp: Timestamp) -> bool {
        self.start <= timestamp && timestamp <= self.end
    }

    /// Same width, moved so it ends at `end`.
    pub fn slide_to(&self, end: Timestamp) -> Self {
        Self::ending_at(end, self.duration())
    }
}

#[derive(Serialize, Deserialize)]
struct RawTimespan {
    start: Timestamp,
    end: Timestamp,
}

impl TryFrom<RawTimespan> for Timespan {
    type Error = InvalidTimespan;

    fn try_from(raw: RawTimespan) -> Result<Self, Self::Error> {
        Timespan::new(raw.start, raw.end)
    }
}

impl From<Timespan> for RawTimespan {
    fn from(timespan: Timespan) -> Self {
        RawTimespan {
            start: timespan.start,
            end: timespan.end,
        }
    }
}
