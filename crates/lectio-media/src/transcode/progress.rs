//! Parsing for the encoder's `-progress` key=value stream.
//!
//! ffmpeg writes one block of `key=value` lines per progress tick. Only two
//! keys matter here: `out_time_us` (encoded position in microseconds; older
//! builds emit the same value under `out_time_ms`) and the `progress=end`
//! terminator. Everything else is ignored.

use std::time::Duration;

/// One recognized event from the progress stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProgressEvent {
    /// Encoded position within the input.
    OutTime(Duration),
    /// The encoder reported the final progress block.
    End,
}

pub(crate) fn parse_line(line: &str) -> Option<ProgressEvent> {
    let (key, value) = line.trim().split_once('=')?;
    match key {
        // Despite the name, out_time_ms carries microseconds, same as
        // out_time_us.
        "out_time_us" | "out_time_ms" => {
            let micros: u64 = value.trim().parse().ok()?;
            Some(ProgressEvent::OutTime(Duration::from_micros(micros)))
        }
        "progress" if value.trim() == "end" => Some(ProgressEvent::End),
        _ => None,
    }
}

/// Maps encoded positions onto a monotonically non-decreasing 0-100 scale.
///
/// Percentages stay at 99 or below until [`PercentTracker::finish`] marks the
/// operation complete, so a progress consumer only ever sees 100 on success.
pub(crate) struct PercentTracker {
    total: Duration,
    last: Option<u8>,
}

impl PercentTracker {
    pub(crate) fn new(total: Duration) -> Self {
        Self { total, last: None }
    }

    /// Record a new encoded position. Returns the percentage to report, or
    /// `None` when it would repeat or regress.
    pub(crate) fn observe(&mut self, position: Duration) -> Option<u8> {
        if self.total.is_zero() {
            return None;
        }
        let ratio = position.as_secs_f64() / self.total.as_secs_f64();
        let pct = ((ratio * 100.0) as u8).min(99);
        match self.last {
            Some(last) if pct <= last => None,
            _ => {
                self.last = Some(pct);
                Some(pct)
            }
        }
    }

    /// Mark the operation complete. Returns 100 unless it was already
    /// reported.
    pub(crate) fn finish(&mut self) -> Option<u8> {
        match self.last {
            Some(100) => None,
            _ => {
                self.last = Some(100);
                Some(100)
            }
        }
    }
}
