//! Per-view event queue with coalescing.
//!
//! Native systems deliver bursts of redundant notifications during resizes and
//! fast pointer movement. Queued events keep their arrival order; a configure
//! or motion replaces one of the same kind directly before it, and exposes are
//! merged into one region delivered at the end of the batch.

use std::collections::VecDeque;

use crate::event::{Event, ExposeEvent};

/// Event queue with batching and coalescing.
#[derive(Debug)]
pub struct EventQueue {
    /// Everything but expose, in arrival order.
    pending: VecDeque<Event>,

    /// Union of every queued expose region.
    expose: Option<ExposeEvent>,

    stats: EventStats,
}

impl EventQueue {
    pub fn new() -> Self {
        Self {
            pending: VecDeque::with_capacity(64),
            expose: None,
            stats: EventStats::default(),
        }
    }

    pub fn push(&mut self, event: Event) {
        self.stats.events_received += 1;

        match event {
            Event::Nothing => {
                self.stats.events_coalesced += 1;
            }

            // A second close request adds nothing while the first is queued.
            Event::Close if self.pending.contains(&Event::Close) => {
                self.stats.events_coalesced += 1;
            }

            Event::Expose(expose) => {
                self.expose = Some(match self.expose.take() {
                    Some(queued) => {
                        self.stats.events_coalesced += 1;
                        let mut merged = ExposeEvent::new(queued.region().union(&expose.region()));
                        merged.flags = queued.flags | expose.flags;
                        merged
                    }
                    None => expose,
                });
            }

            Event::Configure(configure) => {
                if let Some(Event::Configure(queued)) = self.pending.back_mut() {
                    *queued = configure;
                    self.stats.events_coalesced += 1;
                } else {
                    self.pending.push_back(Event::Configure(configure));
                }
            }

            Event::Motion(motion) => {
                if let Some(Event::Motion(queued)) = self.pending.back_mut() {
                    *queued = motion;
                    self.stats.events_coalesced += 1;
                } else {
                    self.pending.push_back(Event::Motion(motion));
                }
            }

            other => self.pending.push_back(other),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty() && self.expose.is_none()
    }

    /// Takes every queued event in delivery order.
    ///
    /// Events come out in arrival order, followed by the merged expose so that
    /// it confirms every configure delivered before it.
    pub fn drain(&mut self) -> EventBatch {
        let mut events = Vec::with_capacity(self.pending.len() + 1);
        events.extend(self.pending.drain(..));
        if let Some(expose) = self.expose.take() {
            events.push(Event::Expose(expose));
        }

        self.stats.events_delivered += events.len();

        EventBatch { events }
    }

    pub fn stats(&self) -> &EventStats {
        &self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = EventStats::default();
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Events drained from a queue, in delivery order.
#[derive(Debug, Default)]
pub struct EventBatch {
    events: Vec<Event>,
}

impl EventBatch {
    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl IntoIterator for EventBatch {
    type Item = Event;
    type IntoIter = std::vec::IntoIter<Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}

#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct EventStats {
    pub events_received: usize,
    pub events_delivered: usize,
    pub events_coalesced: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{ConfigureEvent, EventType, KeyEvent, MotionEvent};
    use crate::geometry::Rect;

    fn types(batch: &EventBatch) -> Vec<EventType> {
        batch.iter().map(Event::event_type).collect()
    }

    fn motion(x: f64) -> Event {
        Event::Motion(MotionEvent {
            x,
            ..Default::default()
        })
    }

    #[test]
    fn test_configure_keeps_latest() {
        let mut queue = EventQueue::new();
        for width in [100, 200, 300] {
            queue.push(Event::Configure(ConfigureEvent::new(
                Rect::new(0, 0, width, 50),
                Default::default(),
            )));
        }

        let batch = queue.drain();
        assert_eq!(batch.len(), 1);
        match batch.iter().next() {
            Some(Event::Configure(c)) => assert_eq!(c.width, 300),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(queue.stats().events_coalesced, 2);
    }

    #[test]
    fn test_expose_regions_are_merged() {
        let mut queue = EventQueue::new();
        queue.push(Event::Expose(ExposeEvent::new(Rect::new(0, 0, 10, 10))));
        queue.push(Event::Expose(ExposeEvent::new(Rect::new(20, 20, 10, 10))));

        let batch = queue.drain();
        assert_eq!(batch.len(), 1);
        match batch.iter().next() {
            Some(Event::Expose(e)) => assert_eq!(e.region(), Rect::new(0, 0, 30, 30)),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_delivery_order() {
        let mut queue = EventQueue::new();
        queue.push(Event::Expose(ExposeEvent::new(Rect::new(0, 0, 10, 10))));
        queue.push(Event::KeyPress(KeyEvent::default()));
        queue.push(Event::Configure(ConfigureEvent::default()));
        queue.push(Event::Close);
        queue.push(Event::Close);

        let batch = queue.drain();
        assert_eq!(
            types(&batch),
            vec![
                EventType::KeyPress,
                EventType::Configure,
                EventType::Close,
                EventType::Expose
            ]
        );
        assert_eq!(queue.stats().events_coalesced, 1);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_close_waits_for_earlier_input() {
        let mut queue = EventQueue::new();
        queue.push(Event::KeyPress(KeyEvent::default()));
        queue.push(Event::ButtonRelease(Default::default()));
        queue.push(Event::Close);

        assert_eq!(
            types(&queue.drain()),
            vec![EventType::KeyPress, EventType::ButtonRelease, EventType::Close]
        );
    }

    #[test]
    fn test_configure_stays_behind_earlier_input() {
        let mut queue = EventQueue::new();
        queue.push(motion(1.0));
        queue.push(Event::KeyPress(KeyEvent::default()));
        queue.push(Event::Configure(ConfigureEvent::default()));

        assert_eq!(
            types(&queue.drain()),
            vec![EventType::Motion, EventType::KeyPress, EventType::Configure]
        );
    }

    #[test]
    fn test_configure_separated_by_input_is_kept() {
        let mut queue = EventQueue::new();
        for width in [100, 200] {
            queue.push(Event::Configure(ConfigureEvent::new(
                Rect::new(0, 0, width, 50),
                Default::default(),
            )));
            queue.push(Event::ButtonPress(Default::default()));
        }

        let widths: Vec<u32> = queue
            .drain()
            .iter()
            .filter_map(|e| match e {
                Event::Configure(c) => Some(c.width),
                _ => None,
            })
            .collect();
        assert_eq!(widths, vec![100, 200]);
        assert_eq!(queue.stats().events_coalesced, 0);
    }

    #[test]
    fn test_motion_stays_ordered_with_input() {
        let mut queue = EventQueue::new();
        queue.push(motion(1.0));
        queue.push(motion(2.0));
        queue.push(Event::ButtonPress(Default::default()));
        queue.push(motion(3.0));
        queue.push(motion(4.0));

        let batch = queue.drain();
        assert_eq!(
            types(&batch),
            vec![EventType::Motion, EventType::ButtonPress, EventType::Motion]
        );
        let xs: Vec<f64> = batch
            .iter()
            .filter_map(|e| match e {
                Event::Motion(m) => Some(m.x),
                _ => None,
            })
            .collect();
        assert_eq!(xs, vec![2.0, 4.0]);
    }

    #[test]
    fn test_stats() {
        let mut queue = EventQueue::new();
        queue.push(Event::Nothing);
        queue.push(motion(1.0));
        queue.push(motion(2.0));
        let _ = queue.drain();

        assert_eq!(
            queue.stats(),
            &EventStats {
                events_received: 3,
                events_delivered: 1,
                events_coalesced: 2,
            }
        );
        queue.reset_stats();
        assert_eq!(queue.stats(), &EventStats::default());
    }
}
