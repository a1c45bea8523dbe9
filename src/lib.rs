#![deny(
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    unused_qualifications
)]

//! A diagnostic client for the KWP1281 protocol spoken over a single-wire
//! K-Line by engine-control units in Porsche 964/993/965 vehicles
//! (model-year ~1989-1998).
//!
//! Through a USB/RS-232 adapter whose hardware-handshake line drives the
//! K-Line, this crate performs a 5-baud wake-up, negotiates a key-word
//! handshake, then exchanges acknowledged "blocks" with the ECU to read
//! identification strings, fetch and clear fault-code memory, poll live
//! sensor values, activate output actuators, read/write adaptation
//! channels, and log in with a PIN.
//!
//! ## Layout
//!
//! * [`kline`] - the bit-banged K-Line transport (5-baud wake, handshake,
//!   per-byte inverted-echo I/O).
//! * [`block`] - the KWP1281 block codec.
//! * [`driver`] - [`driver::KwpDriver`], the protocol session state machine
//!   and command dispatcher.
//! * [`keepalive`] - the background idle keep-alive scheduler.
//! * [`faults`] / [`fault_codes`] - fault payload decoding and the
//!   fault-description dictionary.
//! * [`live`] - the live sensor-value poller.
//! * [`simulator`] - [`simulator::Simulator`], a transport-free stand-in
//!   implementing the same [`client::EcuClient`] capability, for offline use.
//! * [`client`] - the [`client::EcuClient`] capability trait and the event
//!   types emitted to callers.
//!
//! This crate does not implement KWP2000, UDS, or CAN; it speaks only the
//! single-ECU, single-session KWP1281 dialect used by these vehicles.

pub mod block;
pub mod client;
pub mod driver;
pub mod ecu;
pub mod fault_codes;
pub mod faults;
pub mod keepalive;
pub mod kline;
pub mod live;
pub mod simulator;
pub mod timing;

pub use client::{EcuClient, FaultRecord, GroupReading, LiveReading, SessionState};
pub use driver::KwpDriver;
pub use ecu::EcuDescriptor;
pub use kline::KLineError;
pub use simulator::Simulator;

/// Result type returned by every fallible operation in this crate.
pub type DiagResult<T> = Result<T, DiagError>;

/// Error kinds produced by the KWP1281 transport and protocol driver.
///
/// This is the exhaustive set named in the error handling design: every
/// fallible operation in the crate returns one of these kinds, never a
/// bare [`std::io::Error`] or string.
#[derive(Debug, thiserror::Error)]
pub enum DiagError {
    /// An expected byte was not seen within its timeout window.
    #[error("timed out waiting for a byte")]
    Timeout,
    /// The peer returned a byte that was not the bitwise complement of the
    /// byte just sent.
    #[error("echo mismatch: sent 0x{sent:02X}, expected complement 0x{expected:02X}, got 0x{got:02X}")]
    EchoMismatch {
        /// The byte this side transmitted.
        sent: u8,
        /// The complement that should have come back.
        expected: u8,
        /// The byte that actually came back.
        got: u8,
    },
    /// The first byte received after the baud-rate switch was not the
    /// 0x55 sync byte.
    #[error("expected sync byte 0x55, got 0x{0:02X}")]
    BadSync(u8),
    /// The ECU responded to a command with a NAK block (title 0x0A).
    #[error("ECU responded with NAK")]
    ECUNak,
    /// The response block's title did not match any title the command
    /// expected.
    #[error("unexpected response title: expected one of {expected:02X?}, got 0x{got:02X}")]
    UnexpectedTitle {
        /// The titles the command would have accepted.
        expected: &'static [u8],
        /// The title the ECU actually sent.
        got: u8,
    },
    /// The received counter byte was not the expected successor of the
    /// last counter either side sent. This is a soft warning: the driver
    /// logs it and continues rather than treating it as fatal (see the
    /// Open Questions in the design notes).
    #[error("counter drift: expected 0x{expected:02X}, got 0x{got:02X}")]
    CounterDrift {
        /// The counter value that was expected.
        expected: u8,
        /// The counter value that was actually received.
        got: u8,
    },
    /// An OS-level serial I/O failure.
    #[error("serial I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// A command was issued while the session was not in the `Ready`
    /// state.
    #[error("session is not connected")]
    NotConnected,
}

impl From<KLineError> for DiagError {
    fn from(e: KLineError) -> Self {
        match e {
            KLineError::Timeout => DiagError::Timeout,
            KLineError::EchoMismatch { sent, expected, got } => {
                DiagError::EchoMismatch { sent, expected, got }
            }
            KLineError::BadSync(b) => DiagError::BadSync(b),
            KLineError::Io(e) => DiagError::Io(e),
        }
    }
}
