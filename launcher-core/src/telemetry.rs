//! In-memory history of controller events.
//!
//! The firmware logs each event as it happens; the ring keeps the recent
//! ones around so the emulator's `log` command (and a debugger on target)
//! can look back over a session.

use core::fmt;

use heapless::HistoryBuf;

use crate::controller::DisarmReason;
use crate::duty::Duty;
use crate::gate::{GatePhase, GateTransition, PhaseEnd};

/// Number of records retained before the oldest is overwritten.
pub const TELEMETRY_RING_CAPACITY: usize = 64;

/// Monotonic record identifier. Wraps after `u32::MAX` records.
pub type EventId = u32;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TelemetryEvent {
    Armed {
        duty: Duty,
    },
    Disarmed {
        reason: DisarmReason,
    },
    GatePhaseEnded {
        phase: GatePhase,
        cause: PhaseEnd,
        position: i32,
    },
    DutyChanged {
        duty: Duty,
    },
}

impl From<GateTransition> for TelemetryEvent {
    fn from(transition: GateTransition) -> Self {
        TelemetryEvent::GatePhaseEnded {
            phase: transition.ended,
            cause: transition.cause,
            position: transition.position,
        }
    }
}

impl fmt::Display for TelemetryEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryEvent::Armed { duty } => write!(f, "armed duty={}", duty.get()),
            TelemetryEvent::Disarmed { reason } => write!(f, "disarmed ({reason})"),
            TelemetryEvent::GatePhaseEnded {
                phase,
                cause,
                position,
            } => write!(f, "gate {phase} ended: {cause} at {position}"),
            TelemetryEvent::DutyChanged { duty } => write!(f, "duty={}", duty.get()),
        }
    }
}

/// Telemetry record stored in the ring buffer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TelemetryRecord<I> {
    pub id: EventId,
    pub timestamp: I,
    pub event: TelemetryEvent,
}

/// Fixed-capacity event history.
pub struct TelemetryRecorder<I, const CAPACITY: usize = TELEMETRY_RING_CAPACITY> {
    ring: HistoryBuf<TelemetryRecord<I>, CAPACITY>,
    next_event_id: EventId,
}

impl<I, const CAPACITY: usize> TelemetryRecorder<I, CAPACITY>
where
    I: Copy,
{
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ring: HistoryBuf::new(),
            next_event_id: 0,
        }
    }

    /// Appends an event, evicting the oldest record when full.
    pub fn record(&mut self, event: TelemetryEvent, timestamp: I) -> EventId {
        let id = self.next_event_id;
        self.next_event_id = self.next_event_id.wrapping_add(1);
        self.ring.write(TelemetryRecord {
            id,
            timestamp,
            event,
        });
        id
    }

    /// Records in chronological order.
    pub fn oldest_first(&self) -> impl Iterator<Item = &TelemetryRecord<I>> + '_ {
        self.ring.oldest_ordered()
    }

    #[must_use]
    pub fn latest(&self) -> Option<&TelemetryRecord<I>> {
        self.ring.recent()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    pub fn clear(&mut self) {
        self.ring.clear();
    }
}

impl<I, const CAPACITY: usize> Default for TelemetryRecorder<I, CAPACITY>
where
    I: Copy,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_in_order_with_ids() {
        let mut recorder: TelemetryRecorder<u32, 4> = TelemetryRecorder::new();
        assert!(recorder.is_empty());

        recorder.record(TelemetryEvent::DutyChanged { duty: Duty::new(9) }, 1);
        recorder.record(TelemetryEvent::Armed { duty: Duty::new(9) }, 2);

        let ids: heapless::Vec<EventId, 4> = recorder.oldest_first().map(|r| r.id).collect();
        assert_eq!(ids.as_slice(), &[0, 1]);
        assert_eq!(
            recorder.latest().map(|r| r.event),
            Some(TelemetryEvent::Armed { duty: Duty::new(9) })
        );
    }

    #[test]
    fn oldest_records_are_evicted() {
        let mut recorder: TelemetryRecorder<u32, 3> = TelemetryRecorder::new();
        for step in 0..5_u8 {
            recorder.record(
                TelemetryEvent::DutyChanged {
                    duty: Duty::new(step),
                },
                u32::from(step),
            );
        }

        assert_eq!(recorder.len(), 3);
        let first = recorder.oldest_first().next().map(|r| r.timestamp);
        assert_eq!(first, Some(2));
    }

    #[test]
    fn gate_transitions_convert() {
        let event = TelemetryEvent::from(GateTransition {
            ended: GatePhase::Opening,
            cause: PhaseEnd::TimedOut,
            position: 12,
        });

        let mut text: heapless::String<48> = heapless::String::new();
        core::fmt::write(&mut text, format_args!("{event}")).expect("fits");
        assert_eq!(text.as_str(), "gate opening ended: timed out at 12");
    }
}
