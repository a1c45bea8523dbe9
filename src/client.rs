//! The [`EcuClient`] capability trait, the public event types, and the
//! result types every command returns.
//!
//! A single capability trait with two concrete implementations
//! ([`crate::KwpDriver`] and [`crate::Simulator`]), with value-typed
//! closures rather than an observer interface — grounded on
//! `ServerEventHandler` (`src/kwp2000/mod.rs`), adapted here to boxed
//! closures since callers want plain function objects rather than
//! interface inheritance.

use std::sync::Arc;

use crate::DiagResult;

/// A fault record decoded from the ECU's fault memory: a numeric code,
/// its occurrence count (always `0..=63`, the low 6 bits of the status
/// byte), and a human description from the fault dictionary.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FaultRecord {
    /// The numeric fault code.
    pub code: u8,
    /// Occurrence count, `0..=63`.
    pub count: u8,
    /// Human-readable description from the fault dictionary.
    pub description: String,
}

/// One row of a `Read group` (`0x29`) response: an ECU-assigned formula
/// ID and its two raw data bytes. Interpreting `a`/`b` is formula- and
/// ECU-specific and out of this crate's scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GroupReading {
    /// Formula ID assigned by the ECU.
    pub fid: u8,
    /// First raw data byte.
    pub a: u8,
    /// Second raw data byte.
    pub b: u8,
}

/// One row of a live-value poll: the measurement's name, its scaled
/// value, unit, a display-formatted string, and a `0.0..=1.0` ratio
/// against the measurement's display range.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LiveReading {
    /// Measurement name, e.g. `"RPM"`.
    pub name: &'static str,
    /// Scaled value.
    pub value: f64,
    /// Unit string, e.g. `"rpm"`.
    pub unit: &'static str,
    /// `value` rendered to the measurement's configured precision,
    /// followed by its unit.
    pub formatted: String,
    /// `clamp((value - min) / (max - min), 0, 1)`, or `0` when
    /// `max <= min`. Always within `0.0..=1.0`.
    pub ratio: f64,
}

/// The three states emitted to [`StateObserver`]. Distinct from the
/// driver's internal connection state machine ([`crate::driver::ConnectionState`]),
/// which has two additional sub-states (`Connecting`, `Identifying`)
/// folded into `Connecting` here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum SessionState {
    /// A `connect` attempt is in progress.
    Connecting,
    /// The session reached `Ready` and a command may be issued.
    Connected,
    /// The session is closed, either by `disconnect` or by an
    /// unrecoverable error.
    Disconnected,
}

/// Receives human-readable diagnostic text: hex dumps of each block,
/// protocol narration, and error messages. Invoked from whichever
/// thread produced the event (command thread or keep-alive thread);
/// implementations must not block and must not call back into the
/// client.
///
/// `Arc` rather than `Box`: the driver and its background keep-alive
/// thread both hold a copy of the same sink.
pub type LogSink = Arc<dyn Fn(&str) + Send + Sync>;

/// Receives session state transitions. Same non-blocking,
/// no-callback-in, shared-ownership contract as [`LogSink`].
pub type StateObserver = Arc<dyn Fn(SessionState) + Send + Sync>;

/// A no-op log sink, for callers that don't want diagnostic text.
pub fn null_log_sink() -> LogSink {
    Arc::new(|_: &str| {})
}

/// A no-op state observer, for callers that don't care about
/// transitions.
pub fn null_state_observer() -> StateObserver {
    Arc::new(|_: SessionState| {})
}

/// The capability every ECU backend (real or simulated) implements.
///
/// `connect` and `read_faults` surface typed errors, while the
/// actuation/adaptation/value commands collapse a failure to
/// `false`/`None`/an empty vector after logging it, matching
/// `original_source/kwp1281/protocol.py`'s per-command `try/except`
/// blocks.
pub trait EcuClient: Send {
    /// Performs the 5-baud wake-up, handshake, and identification
    /// exchange, then starts the keep-alive. Returns the ECU's
    /// identification string on success.
    fn connect(
        &mut self,
        port: &str,
        model: &str,
        ecu_name: &str,
        ecu_address: u8,
        baud: u32,
    ) -> DiagResult<String>;

    /// Sends `EndComm`, stops the keep-alive, and closes the transport.
    /// A no-op if not connected.
    fn disconnect(&mut self);

    /// Reads and decodes the ECU's fault memory.
    fn read_faults(&mut self) -> DiagResult<Vec<FaultRecord>>;

    /// Clears the ECU's fault memory. `true` on an ACKed response.
    fn clear_faults(&mut self) -> bool;

    /// Reads one raw register byte, or `None` on any failure (including
    /// a single missed read, which is not a session loss).
    fn read_value(&mut self, register: u8) -> Option<u8>;

    /// Polls every measurement descriptor for the connected `(model,
    /// address)`, applying its formula and display range. A failed
    /// individual read is skipped, not fatal.
    fn read_live_values(&mut self) -> Vec<LiveReading>;

    /// Reads a 16-bit ADC channel value.
    fn read_adc(&mut self, channel: u8) -> Option<u16>;

    /// Activates actuator test `num`. `true` on a `0x09` or `0xF5`
    /// response.
    fn actuator_test(&mut self, num: u8) -> bool;

    /// Reads up to 4 `(formula_id, a, b)` triples from measurement
    /// `group`.
    fn read_group(&mut self, group: u8) -> Vec<GroupReading>;

    /// Logs in with `pin_hi`/`pin_lo` and an optional workshop code.
    fn login(&mut self, pin_hi: u8, pin_lo: u8, workshop: u8) -> bool;

    /// Reads adaptation `channel`'s 16-bit value.
    fn read_adaptation(&mut self, channel: u8) -> Option<(u8, u16)>;

    /// Writes `value` to adaptation `channel`.
    fn write_adaptation(&mut self, channel: u8, value: u16) -> bool;
}
