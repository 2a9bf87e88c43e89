//! GPIO adapter for the telephone hardware. Translates pin interrupts into
//! typed [LineEvent]s for the exchange and applies [PinWrite] commands to
//! the ringer outputs.
//!
//! Opening the board can fail on machines without a GPIO chip; callers are
//! expected to treat that as a degraded mode, not an error.

use std::collections::HashMap;

use rppal::gpio::{Gpio, InputPin, Level as PinLevel, OutputPin, Trigger};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use partyline::events::{Edge, InputLine, Level, LineEvent, OutputLine, PinWrite};

mod filter;

pub use filter::EdgeFilter;

/// BCM pin assignment and input filtering for one hardware revision.
#[derive(Clone, Debug)]
pub struct BoardConfig {
    pub dial_read_pin: u8,
    pub dialing_pin: u8,
    pub receiver_pin: u8,
    pub ring_pin_1: u8,
    pub ring_pin_2: u8,
    /// Present only on revisions where the bell has its own driver circuit.
    pub ring_enable_pin: Option<u8>,
    /// Minimum gap between reported edges on one switch. The rotary dial
    /// pulses at roughly 10Hz, so a few milliseconds absorbs contact bounce
    /// without eating real pulses.
    pub debounce: std::time::Duration,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            dial_read_pin: 2,
            dialing_pin: 3,
            receiver_pin: 4,
            ring_pin_1: 7,
            ring_pin_2: 8,
            ring_enable_pin: None,
            debounce: std::time::Duration::from_millis(5),
        }
    }
}

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("gpio unavailable: {0}")]
    Gpio(#[from] rppal::gpio::Error),
}

/// The opened hardware: three pull-up inputs with edge interrupts, and the
/// ringer outputs. The input pins are held so their interrupt handlers stay
/// registered for the lifetime of the board.
pub struct PhoneBoard {
    _inputs: Vec<InputPin>,
    outputs: HashMap<OutputLine, OutputPin>,
}

impl PhoneBoard {
    /// Claim the pins and start forwarding edges into `events`.
    pub fn open(config: &BoardConfig, events: mpsc::Sender<LineEvent>) -> Result<Self, BoardError> {
        let gpio = Gpio::new()?;

        let mut inputs = Vec::with_capacity(3);
        let switches = [
            (InputLine::DialRead, config.dial_read_pin),
            (InputLine::Dialing, config.dialing_pin),
            (InputLine::Receiver, config.receiver_pin),
        ];
        for (line, pin) in switches {
            let mut input = gpio.get(pin)?.into_input_pullup();
            let tx = events.clone();
            let mut filter = EdgeFilter::new(config.debounce);
            input.set_async_interrupt(Trigger::Both, move |level| {
                let edge = match level {
                    PinLevel::High => Edge::Rise,
                    PinLevel::Low => Edge::Fall,
                };
                if !filter.accept(edge, std::time::Instant::now()) {
                    return;
                }
                // interrupt callbacks run on rppal's own thread; a closed
                // channel just means the exchange is shutting down
                let _ = tx.blocking_send(LineEvent { line, edge });
            })?;
            inputs.push(input);
        }

        let mut outputs = HashMap::new();
        outputs.insert(
            OutputLine::RingLine1,
            gpio.get(config.ring_pin_1)?.into_output_low(),
        );
        outputs.insert(
            OutputLine::RingLine2,
            gpio.get(config.ring_pin_2)?.into_output_low(),
        );
        if let Some(pin) = config.ring_enable_pin {
            outputs.insert(OutputLine::RingEnable, gpio.get(pin)?.into_output_low());
        }

        Ok(Self {
            _inputs: inputs,
            outputs,
        })
    }

    /// Apply pin writes until the channel closes or the token cancels.
    /// Dropping the board releases the pins and their interrupt handlers.
    pub async fn run(mut self, mut writes: mpsc::Receiver<PinWrite>, cancel: CancellationToken) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return,
                write = writes.recv() => match write {
                    Some(write) => self.apply(write),
                    None => return,
                },
            }
        }
    }

    fn apply(&mut self, write: PinWrite) {
        match self.outputs.get_mut(&write.line) {
            Some(pin) => pin.write(match write.level {
                Level::High => PinLevel::High,
                Level::Low => PinLevel::Low,
            }),
            // a cadence strategy this revision is not wired for
            None => tracing::debug!(?write, "write to an absent output, ignoring"),
        }
    }
}
