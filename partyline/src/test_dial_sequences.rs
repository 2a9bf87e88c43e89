use proptest::prelude::*;
use std::time::Instant;

use crate::config::PhoneConfig;
use crate::dial::PulseDecoder;
use crate::events::Edge;
use crate::ring::{RingSession, RingStep};

proptest! {
    #[test]
    fn pulse_bursts_decode_mod_ten(pulses in 1u32..=30) {
        let mut decoder = PulseDecoder::new(PhoneConfig::rev_a().dial);
        for _ in 0..pulses {
            decoder.on_dial_read_edge(Edge::Fall);
            decoder.on_dial_read_edge(Edge::Rise);
        }
        decoder.on_dialing_edge(Edge::Fall);
        prop_assert_eq!(decoder.on_dialing_edge(Edge::Rise), Some((pulses % 10) as u8));
    }

    #[test]
    fn digit_sequences_decode_independently(digits in prop::collection::vec(1u32..=10, 1..8)) {
        let mut decoder = PulseDecoder::new(PhoneConfig::rev_a().dial);
        for &pulses in &digits {
            for _ in 0..pulses {
                decoder.on_dial_read_edge(Edge::Rise);
            }
            prop_assert_eq!(
                decoder.on_dialing_edge(Edge::Rise),
                Some((pulses % 10) as u8)
            );
        }
    }

    #[test]
    fn lifting_the_handset_stops_the_bell_at_any_tick(lift_after in 1u32..200) {
        let config = PhoneConfig::rev_a().ring;
        let tick = config.tick_interval;
        let mut now = Instant::now();
        let mut session = RingSession::start(config, false, now).unwrap();

        let mut elapsed_ticks = 0u32;
        loop {
            now += tick;
            elapsed_ticks += 1;
            let lifted = elapsed_ticks >= lift_after;
            match session.tick(now, lifted) {
                RingStep::Cancelled { .. } => {
                    let repeats = session.repeats_completed();
                    // once cancelled, nothing advances any more
                    let after = session.tick(now + tick, true);
                    let still_cancelled = matches!(after, RingStep::Cancelled { .. });
                    prop_assert!(still_cancelled);
                    prop_assert_eq!(session.repeats_completed(), repeats);
                    break;
                }
                RingStep::Drive { finished, .. } => {
                    prop_assert!(!lifted, "a tick with the handset up must not drive the bell");
                    if finished {
                        // the run ran out before the lift; that is fine
                        break;
                    }
                }
                RingStep::Silent => {}
            }
        }
    }
}
