//! Contact bounce suppression for the switch inputs.

use std::time::{Duration, Instant};

use partyline::events::Edge;

/// Passes an edge through only when it differs from the previous accepted
/// edge or arrives after the debounce gap. Bounce shows up as a burst of
/// alternating edges within a millisecond or two; suppressing the burst
/// leaves the first transition intact.
#[derive(Debug)]
pub struct EdgeFilter {
    gap: Duration,
    last: Option<(Edge, Instant)>,
}

impl EdgeFilter {
    pub fn new(gap: Duration) -> Self {
        Self { gap, last: None }
    }

    pub fn accept(&mut self, edge: Edge, now: Instant) -> bool {
        let pass = match self.last {
            None => true,
            Some((previous, at)) => {
                edge != previous && now.saturating_duration_since(at) >= self.gap
            }
        };
        if pass {
            self.last = Some((edge, now));
        }
        pass
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_edge_passes() {
        let mut filter = EdgeFilter::new(Duration::from_millis(5));
        assert!(filter.accept(Edge::Fall, Instant::now()));
    }

    #[test]
    fn bounce_burst_is_suppressed() {
        let mut filter = EdgeFilter::new(Duration::from_millis(5));
        let t0 = Instant::now();
        assert!(filter.accept(Edge::Fall, t0));
        assert!(!filter.accept(Edge::Rise, t0 + Duration::from_millis(1)));
        assert!(!filter.accept(Edge::Fall, t0 + Duration::from_millis(2)));
    }

    #[test]
    fn real_pulses_pass() {
        // a rotary dial breaks for ~60ms and makes for ~40ms per pulse
        let mut filter = EdgeFilter::new(Duration::from_millis(5));
        let mut now = Instant::now();
        for _ in 0..10 {
            assert!(filter.accept(Edge::Fall, now));
            now += Duration::from_millis(60);
            assert!(filter.accept(Edge::Rise, now));
            now += Duration::from_millis(40);
        }
    }

    #[test]
    fn repeated_same_edge_is_dropped() {
        let mut filter = EdgeFilter::new(Duration::from_millis(5));
        let t0 = Instant::now();
        assert!(filter.accept(Edge::Rise, t0));
        assert!(!filter.accept(Edge::Rise, t0 + Duration::from_millis(50)));
    }
}
