use chrono::Utc;
use parking_lot::RwLock;
use spanview_protocol::span::Timestamp;
use spanview_protocol::timespan::Timespan;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::error::ScreenError;
use crate::state::Observable;

/// Source of "now" for live tailing.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> Timestamp;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: RwLock<Timestamp>,
}

impl ManualClock {
    pub fn new(now: Timestamp) -> Self {
        Self {
            now: RwLock::new(now),
        }
    }

    pub fn set(&self, now: Timestamp) {
        *self.now.write() = now;
    }

    pub fn advance(&self, by: chrono::Duration) {
        *self.now.write() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.now.read()
    }
}

/// Active window and live-tail flag.
///
/// While live the window's end tracks "now" and cannot be moved by hand.
/// Turning live off freezes whatever window was current at that moment.
#[derive(Debug)]
pub struct TimeWindowState {
    timespan: Observable<Timespan>,
    live: Observable<bool>,
}

impl TimeWindowState {
    pub fn new(timespan: Timespan, live: bool) -> Self {
        Self {
            timespan: Observable::new(timespan),
            live: Observable::new(live),
        }
    }

    pub fn timespan(&self) -> Timespan {
        self.timespan.get()
    }

    pub fn is_live(&self) -> bool {
        self.live.get()
    }

    pub fn subscribe_timespan(&self) -> watch::Receiver<Timespan> {
        self.timespan.subscribe()
    }

    pub fn subscribe_live(&self) -> watch::Receiver<bool> {
        self.live.subscribe()
    }

    /// Moves the window by hand. Refused while live.
    ///
    /// Returns whether the window changed.
    pub fn set_timespan(&self, timespan: Timespan) -> Result<bool, ScreenError> {
        if self.is_live() {
            return Err(ScreenError::LiveTailActive);
        }

        let changed = self.timespan.set(timespan);
        if changed {
            info!(start = %timespan.start(), end = %timespan.end(), "timespan changed");
        }
        Ok(changed)
    }

    /// Toggles live tail. Switching on slides the window to end at `now`.
    ///
    /// Returns whether the window changed.
    pub fn set_live(&self, live: bool, now: Timestamp) -> bool {
        if !self.live.set(live) {
            return false;
        }

        info!(live, "live tail toggled");
        if live {
            self.slide_to(now)
        } else {
            false
        }
    }

    /// Advances a live window to end at `now`, keeping its width.
    ///
    /// Returns the new window if it moved.
    pub fn tick(&self, now: Timestamp) -> Option<Timespan> {
        if !self.is_live() {
            return None;
        }

        self.slide_to(now).then(|| self.timespan())
    }

    fn slide_to(&self, now: Timestamp) -> bool {
        let changed = self.timespan.update(|timespan| {
            let slid = timespan.slide_to(now);
            if slid == *timespan {
                false
            } else {
                *timespan = slid;
                true
            }
        });
        if changed {
            debug!(end = %now, "live window advanced");
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(minute: i64) -> Timestamp {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap() + Duration::minutes(minute)
    }

    fn window(start: i64, end: i64) -> Timespan {
        Timespan::new(at(start), at(end)).unwrap()
    }

    #[test]
    fn manual_changes_are_refused_while_live() {
        let state = TimeWindowState::new(window(0, 15), true);
        assert_eq!(
            state.set_timespan(window(5, 20)),
            Err(ScreenError::LiveTailActive)
        );
        assert_eq!(state.timespan(), window(0, 15));
    }

    #[test]
    fn going_live_slides_to_now_and_keeps_width() {
        let state = TimeWindowState::new(window(0, 15), false);
        assert!(state.set_live(true, at(60)));
        assert_eq!(state.timespan(), window(45, 60));
    }

    #[test]
    fn leaving_live_freezes_current_window() {
        let state = TimeWindowState::new(window(0, 15), false);
        state.set_live(true, at(60));
        state.tick(at(61));

        assert!(!state.set_live(false, at(90)));
        assert_eq!(state.timespan(), window(46, 61));
        assert_eq!(state.tick(at(95)), None);
    }

    #[test]
    fn tick_only_moves_live_windows() {
        let state = TimeWindowState::new(window(0, 15), false);
        assert_eq!(state.tick(at(30)), None);

        state.set_live(true, at(30));
        assert_eq!(state.tick(at(30)), None);
        assert_eq!(state.tick(at(31)), Some(window(16, 31)));
    }

    #[test]
    fn manual_clock_moves_on_request() {
        let clock = ManualClock::new(at(0));
        clock.advance(Duration::minutes(5));
        assert_eq!(clock.now(), at(5));
        clock.set(at(1));
        assert_eq!(clock.now(), at(1));
    }
}
