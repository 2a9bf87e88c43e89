//! Process configuration: flags with environment fallbacks.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use partyline::config::PhoneConfig;
use partyline_board::BoardConfig;

/// Rotary telephone exchange server
#[derive(Parser, Debug)]
#[command(name = "partyline-server")]
#[command(about = "Bridges a rotary telephone onto a shared websocket line")]
#[command(version)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 3333)]
    pub port: u16,

    /// Production mode: skip resolving and logging the LAN address
    #[arg(long, env = "PRODUCTION")]
    pub production: bool,

    /// Which hardware revision is attached
    #[arg(long, value_enum, default_value_t = HardwareRev::A)]
    pub hardware_rev: HardwareRev,

    /// TLS certificate path, for the transport layer terminating TLS in
    /// front of this server
    #[arg(long, requires = "key")]
    pub cert: Option<PathBuf>,

    /// TLS private key path
    #[arg(long, requires = "cert")]
    pub key: Option<PathBuf>,

    /// Default log filter when RUST_LOG is unset
    #[arg(long, default_value = "partyline_server=debug,info")]
    pub log_level: String,
}

/// The two installed hardware revisions. They differ only in ringer wiring
/// and cadence timing; see [PhoneConfig::rev_a] and [PhoneConfig::rev_b].
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum HardwareRev {
    A,
    B,
}

impl HardwareRev {
    pub fn phone_config(self) -> PhoneConfig {
        match self {
            Self::A => PhoneConfig::rev_a(),
            Self::B => PhoneConfig::rev_b(),
        }
    }

    pub fn board_config(self) -> BoardConfig {
        match self {
            Self::A => BoardConfig::default(),
            Self::B => BoardConfig {
                ring_enable_pin: Some(9),
                ..BoardConfig::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use partyline::config::RingStrategy;

    #[test]
    fn defaults_parse() {
        let args = Args::parse_from(["partyline-server"]);
        assert_eq!(args.port, 3333);
        assert!(!args.production);
    }

    #[test]
    fn revision_b_wires_the_enable_line() {
        let args = Args::parse_from(["partyline-server", "--hardware-rev", "b"]);
        assert!(args.hardware_rev.board_config().ring_enable_pin.is_some());
        assert!(matches!(
            args.hardware_rev.phone_config().ring.strategy,
            RingStrategy::EnableLine
        ));
    }

    #[test]
    fn cert_requires_key() {
        assert!(Args::try_parse_from(["partyline-server", "--cert", "cert.pem"]).is_err());
    }
}
