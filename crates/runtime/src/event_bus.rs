use crate::frame::Frame;

/// One recorded viewer transition.
///
/// `kind` is a dotted name such as `layer.materialized` or
/// `slider.finished`; `message` names the layer, date or state involved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub frame_index: u64,
    pub kind: &'static str,
    pub message: String,
}

/// Append-only log of [`Event`]s, emptied by [`EventBus::drain`].
#[derive(Debug, Default)]
pub struct EventBus {
    events: Vec<Event>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, frame: Frame, kind: &'static str, message: impl Into<String>) {
        self.events.push(Event {
            frame_index: frame.index,
            kind,
            message: message.into(),
        });
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Kinds in emission order.
    pub fn kinds(&self) -> Vec<&'static str> {
        self.events.iter().map(|e| e.kind).collect()
    }

    pub fn of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Event> + 'a {
        self.events.iter().filter(move |e| e.kind == kind)
    }

    pub fn count(&self, kind: &str) -> usize {
        self.of_kind(kind).count()
    }

    /// Most recent event of `kind`.
    pub fn last(&self, kind: &str) -> Option<&Event> {
        self.events.iter().rev().find(|e| e.kind == kind)
    }

    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::EventBus;
    use crate::frame::Frame;

    #[test]
    fn stamps_the_frame_a_layer_arrived_in() {
        let mut bus = EventBus::new();
        bus.emit(Frame::first(), "map.ready", "4 layer slots reserved");
        let later = Frame::first().advance(100.0).advance(100.0);
        bus.emit(later, "layer.materialized", "IMPD_width: 12 features");
        assert_eq!(bus.kinds(), vec!["map.ready", "layer.materialized"]);
        assert_eq!(bus.events()[1].frame_index, 2);
    }

    #[test]
    fn looks_up_the_latest_slider_event() {
        let mut bus = EventBus::new();
        let f = Frame::first();
        bus.emit(f, "slider.started", "Mon Jul 22 2024");
        bus.emit(f, "filter.applied", "1 layers");
        bus.emit(f, "slider.stopped", "Wed Jul 24 2024");
        bus.emit(f, "slider.started", "Mon Jul 22 2024");
        bus.emit(f.advance(5000.0), "slider.finished", "Mon Sep 09 2024");

        assert_eq!(bus.count("slider.started"), 2);
        assert_eq!(bus.count("rotation.toggled"), 0);
        let finished = bus.last("slider.finished").map(|e| (e.frame_index, e.message.as_str()));
        assert_eq!(finished, Some((1, "Mon Sep 09 2024")));
        let stops: Vec<_> = bus.of_kind("slider.stopped").map(|e| e.message.as_str()).collect();
        assert_eq!(stops, vec!["Wed Jul 24 2024"]);
    }

    #[test]
    fn draining_hands_events_to_the_host_once() {
        let mut bus = EventBus::new();
        bus.emit(Frame::first(), "layer.skipped", "IMPD_obstacles: HTTP 404");
        let drained = bus.drain();
        assert_eq!(drained[0].message, "IMPD_obstacles: HTTP 404");
        assert!(bus.is_empty());
        assert!(bus.drain().is_empty());
    }
}
