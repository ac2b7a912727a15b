use spanview_protocol::query::PositionedSpan;
use spanview_protocol::span::{Span, Timestamp};

/// Assigns each span the lowest lane that is free at its creation time.
///
/// Input must be ordered by creation time. Open spans hold their lane forever.
pub fn assign_lanes(spans: Vec<Span>) -> Vec<PositionedSpan> {
    // Per lane: time the lane frees up, `None` when held by an open span.
    let mut lanes: Vec<Option<Timestamp>> = Vec::new();

    spans
        .into_iter()
        .map(|span| {
            let free = lanes
                .iter()
                .position(|busy_until| busy_until.is_some_and(|end| end < span.created_at));
            let lane = match free {
                Some(lane) => lane,
                None => {
                    lanes.push(None);
                    lanes.len() - 1
                }
            };
            lanes[lane] = span.closed_at;
            PositionedSpan { span, lane }
        })
        .collect()
}
