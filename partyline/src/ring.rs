//! Ringer cadence. One [RingSession] is the state of a single ring run; a
//! periodic driver owns the clock and feeds [RingSession::tick] once per
//! tick interval together with the live handset state.
//!
//! The handset check happens before any write on every tick, so lifting the
//! handset silences the bell within one tick interval.

use std::time::Instant;

use crate::config::{RingConfig, RingStrategy};
use crate::events::{Level, OutputLine, PinWrite};

/// What the driver should do for one tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RingStep {
    /// Inter-repeat silence; write nothing.
    Silent,
    /// Apply the writes; stop the driver when `finished`.
    Drive { writes: Vec<PinWrite>, finished: bool },
    /// The handset went off-hook; apply the writes and stop.
    Cancelled { writes: Vec<PinWrite> },
}

/// An active ring run: phase index within the current repeat, completed
/// repeats, and the instant the previous repeat ended (for pause timing).
#[derive(Debug)]
pub struct RingSession {
    config: RingConfig,
    phase: u32,
    repeats: u32,
    repeat_ended: Instant,
    engaged: bool,
}

impl RingSession {
    /// Begin a run, unless the handset is already off-hook — ringing a
    /// lifted handset is a no-op.
    pub fn start(config: RingConfig, handset_up: bool, now: Instant) -> Option<Self> {
        if handset_up {
            return None;
        }
        Some(Self {
            config,
            phase: 0,
            repeats: 0,
            repeat_ended: now,
            engaged: false,
        })
    }

    /// Advance the cadence by one tick.
    pub fn tick(&mut self, now: Instant, handset_up: bool) -> RingStep {
        if handset_up {
            return RingStep::Cancelled {
                writes: self.release(),
            };
        }

        if self.phase == 0
            && self.repeats > 0
            && now.saturating_duration_since(self.repeat_ended) < self.config.pause
        {
            return RingStep::Silent;
        }

        let mut writes = Vec::new();
        match self.config.strategy {
            RingStrategy::Alternate => {
                let odd = self.phase % 2 == 1;
                writes.push(PinWrite {
                    line: OutputLine::RingLine1,
                    level: level(odd),
                });
                writes.push(PinWrite {
                    line: OutputLine::RingLine2,
                    level: level(!odd),
                });
            }
            RingStrategy::EnableLine => {
                if !self.engaged {
                    self.engaged = true;
                    writes.push(PinWrite {
                        line: OutputLine::RingEnable,
                        level: Level::High,
                    });
                }
            }
        }
        self.phase += 1;

        let mut finished = false;
        if self.phase >= self.config.phase_budget {
            self.repeats += 1;
            self.phase = 0;
            if self.repeats >= self.config.repeat_budget {
                finished = true;
                writes.extend(self.release());
            } else {
                self.repeat_ended = now;
            }
        }
        RingStep::Drive { writes, finished }
    }

    /// Writes needed to leave the bell de-energized, for the driver's own
    /// shutdown path.
    pub fn teardown_writes(&mut self) -> Vec<PinWrite> {
        self.release()
    }

    pub fn repeats_completed(&self) -> u32 {
        self.repeats
    }

    fn release(&mut self) -> Vec<PinWrite> {
        if self.engaged {
            self.engaged = false;
            vec![PinWrite {
                line: OutputLine::RingEnable,
                level: Level::Low,
            }]
        } else {
            Vec::new()
        }
    }
}

fn level(on: bool) -> Level {
    if on {
        Level::High
    } else {
        Level::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PhoneConfig;
    use std::time::Duration;

    fn config() -> RingConfig {
        PhoneConfig::rev_a().ring
    }

    fn drive_writes(step: &RingStep) -> &[PinWrite] {
        match step {
            RingStep::Drive { writes, .. } => writes,
            other => panic!("expected a drive step, got {:?}", other),
        }
    }

    #[test]
    fn start_is_noop_while_off_hook() {
        let now = Instant::now();
        assert!(RingSession::start(config(), true, now).is_none());
    }

    #[test]
    fn alternation_flips_each_tick() {
        let now = Instant::now();
        let mut session = RingSession::start(config(), false, now).unwrap();
        let first = session.tick(now, false);
        assert_eq!(
            drive_writes(&first),
            &[
                PinWrite {
                    line: OutputLine::RingLine1,
                    level: Level::Low
                },
                PinWrite {
                    line: OutputLine::RingLine2,
                    level: Level::High
                },
            ]
        );
        let second = session.tick(now + Duration::from_millis(40), false);
        assert_eq!(
            drive_writes(&second),
            &[
                PinWrite {
                    line: OutputLine::RingLine1,
                    level: Level::High
                },
                PinWrite {
                    line: OutputLine::RingLine2,
                    level: Level::Low
                },
            ]
        );
    }

    #[test]
    fn full_run_performs_budgeted_repeats_with_pauses() {
        let config = config();
        let tick = config.tick_interval;
        let pause = config.pause;
        let mut now = Instant::now();
        let mut session = RingSession::start(config.clone(), false, now).unwrap();

        let mut drives = 0u32;
        let mut silents = 0u32;
        loop {
            now += tick;
            match session.tick(now, false) {
                RingStep::Silent => silents += 1,
                RingStep::Drive { finished, .. } => {
                    drives += 1;
                    if finished {
                        break;
                    }
                }
                RingStep::Cancelled { .. } => panic!("never cancelled"),
            }
        }
        assert_eq!(drives, config.phase_budget * config.repeat_budget);
        assert_eq!(session.repeats_completed(), config.repeat_budget);
        // two inter-repeat gaps, each waiting out the pause interval
        let ticks_per_pause = (pause.as_millis() / tick.as_millis()) as u32;
        assert!(silents >= (config.repeat_budget - 1) * ticks_per_pause);
    }

    #[test]
    fn off_hook_cancels_before_any_write() {
        let now = Instant::now();
        let mut session = RingSession::start(config(), false, now).unwrap();
        session.tick(now, false);
        let repeats = session.repeats_completed();
        let step = session.tick(now + Duration::from_millis(40), true);
        assert_eq!(step, RingStep::Cancelled { writes: Vec::new() });
        assert_eq!(session.repeats_completed(), repeats);
    }

    #[test]
    fn pause_separates_repeats() {
        let config = config();
        let tick = config.tick_interval;
        let mut now = Instant::now();
        let mut session = RingSession::start(config.clone(), false, now).unwrap();
        for _ in 0..config.phase_budget {
            now += tick;
            assert!(matches!(
                session.tick(now, false),
                RingStep::Drive { finished: false, .. }
            ));
        }
        // within the pause interval the cadence stays silent
        let silent = session.tick(now + tick, false);
        assert_eq!(silent, RingStep::Silent);
        // once the pause elapses the next repeat begins
        let resumed = session.tick(now + config.pause, false);
        assert!(matches!(resumed, RingStep::Drive { .. }));
    }

    #[test]
    fn enable_line_brackets_the_run() {
        let ring = PhoneConfig::rev_b().ring;
        let tick = ring.tick_interval;
        let budget = ring.phase_budget * ring.repeat_budget;
        let mut now = Instant::now();
        let mut session = RingSession::start(ring, false, now).unwrap();

        let first = session.tick(now, false);
        assert_eq!(
            drive_writes(&first),
            &[PinWrite {
                line: OutputLine::RingEnable,
                level: Level::High
            }]
        );
        for _ in 1..budget - 1 {
            now += tick;
            assert_eq!(
                session.tick(now, false),
                RingStep::Drive {
                    writes: Vec::new(),
                    finished: false
                }
            );
        }
        let last = session.tick(now + tick, false);
        assert_eq!(
            last,
            RingStep::Drive {
                writes: vec![PinWrite {
                    line: OutputLine::RingEnable,
                    level: Level::Low
                }],
                finished: true
            }
        );
    }

    #[test]
    fn enable_line_released_on_cancel() {
        let ring = PhoneConfig::rev_b().ring;
        let now = Instant::now();
        let mut session = RingSession::start(ring, false, now).unwrap();
        session.tick(now, false);
        let step = session.tick(now + Duration::from_millis(20), true);
        assert_eq!(
            step,
            RingStep::Cancelled {
                writes: vec![PinWrite {
                    line: OutputLine::RingEnable,
                    level: Level::Low
                }]
            }
        );
    }
}
