use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use spanview_protocol::timespan::Timespan;

use crate::error::ScreenError;

/// Independent asynchronous request channel with its own ordering discipline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
    Spans,
    PositionedSpans,
    Counts,
    Navigation,
}

impl SlotKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SlotKind::Spans => "spans",
            SlotKind::PositionedSpans => "positioned-spans",
            SlotKind::Counts => "counts",
            SlotKind::Navigation => "navigation",
        }
    }
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Screen state a request was issued against.
///
/// `generation` advances whenever the parsed filter changes, so two tags are
/// equal only if both the filter and the window are unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryTag {
    pub generation: u64,
    pub timespan: Timespan,
}

/// Proof of issue for one request in a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    kind: SlotKind,
    sequence: u64,
    tag: QueryTag,
}

impl Ticket {
    pub fn kind(&self) -> SlotKind {
        self.kind
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn tag(&self) -> QueryTag {
        self.tag
    }
}

/// Last-request-wins gate for one slot.
///
/// Every request takes a ticket with a strictly increasing sequence number. A
/// result may only be applied while its ticket is the newest one issued and
/// the screen is still in the state the ticket was tagged with.
#[derive(Debug, Clone)]
pub struct QuerySlot {
    kind: SlotKind,
    latest: Arc<AtomicU64>,
}

impl QuerySlot {
    pub fn new(kind: SlotKind) -> Self {
        Self {
            kind,
            latest: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn kind(&self) -> SlotKind {
        self.kind
    }

    pub fn issue(&self, tag: QueryTag) -> Ticket {
        let sequence = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        Ticket {
            kind: self.kind,
            sequence,
            tag,
        }
    }

    /// Supersedes every outstanding request without issuing a new one.
    pub fn invalidate(&self) {
        self.latest.fetch_add(1, Ordering::SeqCst);
    }

    pub fn latest(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    pub fn is_current(&self, ticket: &Ticket, current: &QueryTag) -> bool {
        ticket.kind == self.kind
            && ticket.sequence == self.latest()
            && ticket.tag == *current
    }

    /// Checks a resolved ticket, refusing it when a newer request exists or the state moved on.
    pub fn accept(&self, ticket: &Ticket, current: &QueryTag) -> Result<(), ScreenError> {
        if self.is_current(ticket, current) {
            Ok(())
        } else {
            Err(ScreenError::StaleResult { slot: self.kind })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn tag(generation: u64) -> QueryTag {
        let end = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        QueryTag {
            generation,
            timespan: Timespan::ending_at(end, Duration::minutes(15)),
        }
    }

    #[test]
    fn only_the_newest_ticket_is_accepted() {
        let slot = QuerySlot::new(SlotKind::Spans);
        let first = slot.issue(tag(1));
        let second = slot.issue(tag(1));

        assert!(second.sequence() > first.sequence());
        assert_eq!(
            slot.accept(&first, &tag(1)),
            Err(ScreenError::StaleResult {
                slot: SlotKind::Spans
            })
        );
        assert_eq!(slot.accept(&second, &tag(1)), Ok(()));
    }

    #[test]
    fn ticket_is_stale_once_state_moves_on() {
        let slot = QuerySlot::new(SlotKind::Counts);
        let ticket = slot.issue(tag(1));
        assert!(!slot.is_current(&ticket, &tag(2)));
    }

    #[test]
    fn invalidate_supersedes_outstanding_requests() {
        let slot = QuerySlot::new(SlotKind::Navigation);
        let ticket = slot.issue(tag(3));
        slot.invalidate();
        assert!(!slot.is_current(&ticket, &tag(3)));
    }

    #[test]
    fn slots_are_independent() {
        let spans = QuerySlot::new(SlotKind::Spans);
        let counts = QuerySlot::new(SlotKind::Counts);
        let span_ticket = spans.issue(tag(1));
        counts.issue(tag(1));
        counts.issue(tag(1));

        assert!(spans.is_current(&span_ticket, &tag(1)));
        assert!(!counts.is_current(&span_ticket, &tag(1)));
    }
}
