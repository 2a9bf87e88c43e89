//! Pulse-dial decoding. A rotary dial encodes a digit as a burst of N
//! make/break pulses on the dial-read switch while the dialing switch is
//! held active; ten pulses encode the digit 0.

use crate::config::DialConfig;
use crate::events::Edge;

#[cfg_attr(doc, aquamarine::aquamarine)]
/// ```mermaid
/// stateDiagram-v2
///     [*] --> Idle
///     Idle --> Counting: dial-read pulse edge
///     Counting --> Counting: dial-read pulse edge
///     Counting --> Idle: dialing rest edge / emit digit
///     Idle --> Idle: dialing rest edge (spurious, ignored)
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecoderState {
    /// No pulses recorded since the last decode.
    Idle,
    /// A dialing session is open and pulses are being counted.
    Counting,
}

/// Turns the two dial switches' edge sequences into decimal digits.
///
/// Only the configured polarities are significant; every other edge is
/// ignored, as is a rest edge arriving with no counted pulses (switch
/// bounce while the dial sits at rest).
#[derive(Debug)]
pub struct PulseDecoder {
    config: DialConfig,
    state: DecoderState,
    count: u32,
}

impl PulseDecoder {
    pub fn new(config: DialConfig) -> Self {
        Self {
            config,
            state: DecoderState::Idle,
            count: 0,
        }
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    /// Feed a dial-read switch transition. Counts one pulse per release.
    pub fn on_dial_read_edge(&mut self, edge: Edge) {
        if edge == self.config.pulse_edge {
            self.count += 1;
            self.state = DecoderState::Counting;
        }
    }

    /// Feed a dialing switch transition. On the rest edge, a completed burst
    /// decodes to `count % 10` and the decoder returns to [DecoderState::Idle].
    pub fn on_dialing_edge(&mut self, edge: Edge) -> Option<u8> {
        if edge != self.config.rest_edge || self.state != DecoderState::Counting {
            return None;
        }
        let digit = (self.count % 10) as u8;
        self.count = 0;
        self.state = DecoderState::Idle;
        Some(digit)
    }
}
