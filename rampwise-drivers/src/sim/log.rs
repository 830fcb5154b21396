//! Bounded event recorder

use heapless::Vec;

use rampwise_core::motion::Termination;
use rampwise_core::traits::{ControlEvent, PhaseKind, Telemetry};

/// Keeps the first `N` events; later events are counted and dropped
#[derive(Debug, Default)]
pub struct EventLog<const N: usize> {
    events: Vec<ControlEvent, N>,
    dropped: u32,
}

impl<const N: usize> EventLog<N> {
    /// Create an empty log
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            dropped: 0,
        }
    }

    /// Recorded events in order
    pub fn events(&self) -> &[ControlEvent] {
        &self.events
    }

    /// Events that did not fit
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    /// Number of power writes recorded by ramp loops
    pub fn cycles(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, ControlEvent::CycleApplied { .. }))
            .count()
    }

    /// Finished phases as `(kind, termination, tick)`
    pub fn finished(&self) -> impl Iterator<Item = (PhaseKind, Termination, i32)> + '_ {
        self.events.iter().filter_map(|e| match *e {
            ControlEvent::PhaseFinished {
                kind,
                termination,
                tick,
                ..
            } => Some((kind, termination, tick)),
            _ => None,
        })
    }

    /// Drop all events and reset the dropped count
    pub fn clear(&mut self) {
        self.events.clear();
        self.dropped = 0;
    }
}

impl<const N: usize> Telemetry for EventLog<N> {
    fn record(&mut self, event: &ControlEvent) {
        if self.events.push(*event).is_err() {
            self.dropped = self.dropped.saturating_add(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overflow_counts_dropped() {
        let mut log = EventLog::<2>::new();
        for tick in 0..5 {
            log.record(&ControlEvent::CycleApplied { tick, power: 0.1 });
        }
        assert_eq!(log.events().len(), 2);
        assert_eq!(log.dropped(), 3);
        assert_eq!(log.cycles(), 2);
        log.clear();
        assert!(log.events().is_empty());
    }
}
