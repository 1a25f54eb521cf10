//! Priority queue of pending discrete events (spike deliveries, delayed
//! connection effects), ordered by fire time.
//!
//! The queue itself never blocks or panics on overflow: it reports
//! [`QueueFull`](EventQueueError::QueueFull) and lets the caller decide.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// One pending event: fire at `time`, targeting `target` (an opaque
/// instance/part index pair the simulator interprets).
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub time: f64,
    pub part: usize,
    pub instance: usize,
    pub payload: EventPayload,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    /// A population's own recurring tick: integrate, update, finalize,
    /// then re-enqueue at `t + dt`.
    Step,
    Spike,
    Delayed { original_time: f64 },
}

impl Eq for Event {}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse so the earliest time sorts first.
        other.time.partial_cmp(&self.time).unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Delay quantization: a spike firing at
/// `t` with delay `delay` is scheduled for `t + delay`, snapped to the
/// nearest multiple of `dt` when that delay is within `1e-3` of landing
/// exactly on the step grid, and delivered off-grid otherwise.
pub fn quantize_delay(t: f64, delay: f64, dt: f64) -> f64 {
    let target = t + delay;
    if dt <= 0.0 {
        return target;
    }
    let steps = delay / dt;
    if (steps - steps.round()).abs() < 1e-3 {
        (target / dt).round() * dt
    } else {
        target
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum EventQueueError {
    #[error("event queue capacity {capacity} exceeded")]
    QueueFull { capacity: usize },
}

/// Binary-heap-backed event queue with a soft capacity bound
/// (`simulation.event_queue_capacity`).
#[derive(Debug)]
pub struct EventQueue {
    heap: BinaryHeap<Event>,
    capacity: usize,
}

impl EventQueue {
    pub fn with_capacity(capacity: usize) -> Self {
        EventQueue { heap: BinaryHeap::with_capacity(capacity), capacity }
    }

    pub fn push(&mut self, event: Event) -> Result<(), EventQueueError> {
        if self.heap.len() >= self.capacity {
            return Err(EventQueueError::QueueFull { capacity: self.capacity });
        }
        self.heap.push(event);
        Ok(())
    }

    /// Pop every event whose `time` is `<= horizon`, in ascending time
    /// order.
    pub fn drain_due(&mut self, horizon: f64) -> Vec<Event> {
        let mut due = Vec::new();
        while let Some(top) = self.heap.peek() {
            if top.time > horizon {
                break;
            }
            due.push(self.heap.pop().unwrap());
        }
        due
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn peek_time(&self) -> Option<f64> {
        self.heap.peek().map(|e| e.time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spike(time: f64) -> Event {
        Event { time, part: 0, instance: 0, payload: EventPayload::Spike }
    }

    #[test]
    fn drain_due_returns_events_in_ascending_time_order() {
        let mut queue = EventQueue::with_capacity(8);
        queue.push(spike(3.0)).unwrap();
        queue.push(spike(1.0)).unwrap();
        queue.push(spike(2.0)).unwrap();

        let due = queue.drain_due(2.5);
        let times: Vec<f64> = due.iter().map(|e| e.time).collect();
        assert_eq!(times, vec![1.0, 2.0]);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn push_past_capacity_is_an_error() {
        let mut queue = EventQueue::with_capacity(1);
        queue.push(spike(1.0)).unwrap();
        assert!(matches!(queue.push(spike(2.0)), Err(EventQueueError::QueueFull { .. })));
    }

    #[test]
    fn peek_time_reports_the_earliest_pending_event() {
        let mut queue = EventQueue::with_capacity(4);
        queue.push(spike(5.0)).unwrap();
        queue.push(spike(1.0)).unwrap();
        assert_eq!(queue.peek_time(), Some(1.0));
    }

    /// Scenario 5: source fires at `t=0.13`, `delay=0.20`,
    /// `dt=0.1` -> delivered at exactly `t=0.30`.
    #[test]
    fn quantize_delay_snaps_onto_the_step_grid() {
        let delivered = quantize_delay(0.13, 0.20, 0.1);
        assert!((delivered - 0.30).abs() < 1e-9, "delivered={delivered}");
    }

    #[test]
    fn quantize_delay_leaves_an_off_grid_delay_untouched() {
        let delivered = quantize_delay(0.0, 0.23, 0.1);
        assert!((delivered - 0.23).abs() < 1e-9, "delivered={delivered}");
    }
}
