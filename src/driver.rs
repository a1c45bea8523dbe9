//! [`KwpDriver`]: the protocol session state machine and command
//! dispatcher.
//!
//! Grounded on `original_source/kwp1281/protocol.py`'s `KWP1281` class for
//! the session shape (one transport, one shared block counter, one
//! command at a time) and on `Kwp2000DiagnosticServer`
//! (`src/kwp2000/mod.rs`) for the Rust idiom: a `Mutex`-guarded shared
//! state behind an `Arc`, a background thread for the idle keep-alive
//! (see [`crate::keepalive`]), and a capability trait
//! ([`crate::client::EcuClient`]) implemented on top.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::client::{
    EcuClient, FaultRecord, GroupReading, LiveReading, LogSink, SessionState, StateObserver,
};
use crate::fault_codes::{BuiltinFaultLookup, FaultLookup};
use crate::faults;
use crate::keepalive::KeepAlive;
use crate::block::Block;
use crate::kline::{KLineConfig, KLineTransport};
use crate::live;
use crate::timing;
use crate::{DiagError, DiagResult};

/// The driver's internal connection state. Collapsed to three values
/// ([`SessionState`]) for [`StateObserver`]; kept granular here so
/// `connect`'s sub-phases are individually inspectable in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No transport open, no session.
    Closed,
    /// Performing the 5-baud wake-up and key-word handshake.
    Connecting,
    /// Handshake complete, reading the ECU's identification blocks.
    Identifying,
    /// Identification complete; commands may be dispatched.
    Ready,
}

/// Parameters governing `connect`'s retry behavior. Constructed with
/// [`Default`]; override individual fields for tests that don't want to
/// wait out the full retry delay.
#[derive(Debug, Clone, Copy)]
pub struct ConnectOptions {
    /// Number of wake-up/handshake attempts before giving up.
    pub attempts: u32,
    /// Delay between attempts.
    pub retry_delay: std::time::Duration,
    /// K-Line transport configuration (line polarity, inter-byte timeout).
    pub kline: KLineConfig,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            attempts: timing::MAX_CONNECT_ATTEMPTS,
            retry_delay: timing::INIT_RETRY_DELAY,
            kline: KLineConfig::default(),
        }
    }
}

/// The identified ECU the driver is talking to: its address, the baud
/// rate the handshake switched to, the fault-dictionary sections to
/// consult, and the identification string it reported.
#[derive(Debug, Clone)]
struct Session {
    model: String,
    ecu_name: String,
    ecu_address: u8,
    fault_sections: Vec<&'static str>,
    identification: String,
}

/// The driver's shared, `Mutex`-guarded state: the open transport, the
/// session's shared block counter, and the current connection phase.
/// `pub(crate)` so [`crate::keepalive`] can drive a keep-alive exchange
/// without the driver's command-dispatch machinery duplicated there.
pub(crate) struct DriverState {
    transport: Option<KLineTransport>,
    counter: u8,
    connection_state: ConnectionState,
    session: Option<Session>,
}

impl DriverState {
    fn closed() -> Self {
        Self {
            transport: None,
            counter: 0,
            connection_state: ConnectionState::Closed,
            session: None,
        }
    }
}

/// A decoded description of a pair of transport-level error *kinds* that
/// warrant tearing the session down: any error whose recovery would
/// require resynchronizing the block counter.
fn is_resync_error(err: &DiagError) -> bool {
    matches!(
        err,
        DiagError::Timeout | DiagError::EchoMismatch { .. } | DiagError::BadSync(_) | DiagError::Io(_)
    )
}

/// Sends a block, advancing the shared counter by one on success.
fn send_block(state: &mut DriverState, title: u8, payload: Vec<u8>) -> DiagResult<Block> {
    let transport = state.transport.as_mut().ok_or(DiagError::NotConnected)?;
    let block = Block::with_payload(state.counter, title, payload);
    block.transmit(transport)?;
    state.counter = state.counter.wrapping_add(1);
    Ok(block)
}

/// Receives a block. Returns the block, whether its terminator matched
/// `ETX`, and, if the counter it carried wasn't the expected successor,
/// a [`DiagError::CounterDrift`] describing the mismatch for the caller
/// to log — a mismatch is never treated as fatal, matching
/// `original_source/kwp1281/protocol.py`, which accepts whatever counter
/// the ECU sends and resynchronizes to it unconditionally.
fn recv_block(state: &mut DriverState) -> DiagResult<(Block, bool, Option<DiagError>)> {
    let transport = state.transport.as_mut().ok_or(DiagError::NotConnected)?;
    let (block, etx_ok) = crate::block::decode(transport)?;
    let expected = state.counter;
    let drift = if block.counter != expected {
        Some(DiagError::CounterDrift {
            expected,
            got: block.counter,
        })
    } else {
        None
    };
    state.counter = block.counter.wrapping_add(1);
    Ok((block, etx_ok, drift))
}

/// Drives one idle keep-alive exchange: send ACK, receive one block.
/// Invoked from [`crate::keepalive`]'s background thread, which never
/// otherwise touches [`DriverState`]'s fields directly.
///
/// Returns `Ok(true)` if the ECU answered with ACK, `Ok(false)` if it
/// answered with something else (logged by the caller, not fatal), and
/// `Err` for a transport failure or a session that isn't `Ready`.
pub(crate) fn keepalive_exchange(state: &mut DriverState) -> DiagResult<bool> {
    if state.connection_state != ConnectionState::Ready {
        return Err(DiagError::NotConnected);
    }
    send_block(state, 0x09, Vec::new())?;
    let (block, _etx_ok, _drift) = recv_block(state)?;
    Ok(block.title == 0x09)
}

/// Tears the transport down and returns the state to `Closed`. Used by
/// both `disconnect` and any command/keep-alive failure classified as
/// requiring resynchronization.
pub(crate) fn mark_disconnected(state: &mut DriverState) {
    state.transport = None;
    state.session = None;
    state.connection_state = ConnectionState::Closed;
}

/// A [`crate::client::EcuClient`] implementation speaking KWP1281 over a
/// real K-Line transport.
pub struct KwpDriver {
    keepalive: Option<KeepAlive>,
    state: Arc<Mutex<DriverState>>,
    command_active: Arc<AtomicBool>,
    on_log: LogSink,
    on_state_change: StateObserver,
    fault_lookup: Arc<dyn FaultLookup>,
    connect_options: ConnectOptions,
}

impl std::fmt::Debug for KwpDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock().unwrap();
        f.debug_struct("KwpDriver")
            .field("connection_state", &state.connection_state)
            .finish()
    }
}

impl KwpDriver {
    /// Builds a driver with the built-in fault dictionary and the
    /// default connect retry policy.
    pub fn new(on_log: LogSink, on_state_change: StateObserver) -> Self {
        Self {
            keepalive: None,
            state: Arc::new(Mutex::new(DriverState::closed())),
            command_active: Arc::new(AtomicBool::new(false)),
            on_log,
            on_state_change,
            fault_lookup: Arc::new(BuiltinFaultLookup),
            connect_options: ConnectOptions::default(),
        }
    }

    /// Overrides the connect retry policy.
    pub fn with_connect_options(mut self, options: ConnectOptions) -> Self {
        self.connect_options = options;
        self
    }

    /// Overrides the fault-description dictionary.
    pub fn with_fault_lookup(mut self, lookup: Arc<dyn FaultLookup>) -> Self {
        self.fault_lookup = lookup;
        self
    }

    fn log(&self, msg: impl AsRef<str>) {
        (*self.on_log)(msg.as_ref());
    }

    fn publish_state(&self, state: SessionState) {
        (*self.on_state_change)(state);
    }

    fn log_drift(&self, etx_ok: bool, drift: &Option<DiagError>) {
        if !etx_ok {
            self.log("block terminator was not 0x03; treating response as lossy");
        }
        if let Some(drift) = drift {
            self.log(format!("{drift}"));
        }
    }

    /// Runs the full connect sequence once: open the transport, wake the
    /// ECU, handshake, then read identification blocks until the ECU's
    /// closing ACK.
    fn connect_once(
        &self,
        port: &str,
        model: &str,
        ecu_name: &str,
        ecu_address: u8,
        baud: u32,
    ) -> DiagResult<Session> {
        let fault_sections = crate::ecu::ecu_descriptor(model, ecu_address)
            .map(|d| d.fault_sections.to_vec())
            .unwrap_or_default();

        self.publish_state(SessionState::Connecting);
        {
            let mut guard = self.state.lock().unwrap();
            guard.connection_state = ConnectionState::Connecting;
        }

        log::info!("connecting to {ecu_name} (model {model}, address 0x{ecu_address:02X}) on {port}");
        let mut transport = KLineTransport::open(port, self.connect_options.kline)?;
        self.log(format!("wake-up: sending address 0x{ecu_address:02X} at 5 baud"));
        transport.send_5baud(ecu_address)?;

        self.log(format!("handshake: switching to {baud} baud"));
        let (kw1, kw2) = transport.handshake(baud)?;
        self.log(format!("handshake complete: kw1=0x{kw1:02X} kw2=0x{kw2:02X}"));
        log::debug!("handshake complete for {ecu_name}: kw1=0x{kw1:02X} kw2=0x{kw2:02X}");

        {
            let mut guard = self.state.lock().unwrap();
            guard.transport = Some(transport);
            guard.counter = 1;
            guard.connection_state = ConnectionState::Identifying;
        }
        self.publish_state(SessionState::Connecting);

        // Each iteration locks only for the block it sends/receives, then
        // drops the guard before calling `self.log`/`self.log_drift` —
        // holding the mutex across a user-supplied callback would
        // deadlock a caller whose `on_log` re-enters the driver (e.g. its
        // own `Debug` impl, or any command).
        let identification = {
            let mut parts = Vec::new();
            let mut blocks_read = 0usize;
            let ident = loop {
                if blocks_read >= timing::MAX_IDENT_BLOCKS {
                    break Err(DiagError::UnexpectedTitle {
                        expected: &[0xF6, 0x09],
                        got: 0xF6,
                    });
                }
                blocks_read += 1;

                let (block, etx_ok, drift) = {
                    let mut guard = self.state.lock().unwrap();
                    recv_block(&mut guard)?
                };
                self.log_drift(etx_ok, &drift);

                match block.title {
                    0xF6 => {
                        let text = String::from_utf8_lossy(&block.payload).trim().to_string();
                        parts.push(text);
                        let mut guard = self.state.lock().unwrap();
                        send_block(&mut guard, 0x09, Vec::new())?;
                    }
                    0x09 => {
                        if parts.is_empty() {
                            break Err(DiagError::UnexpectedTitle {
                                expected: &[0xF6],
                                got: 0x09,
                            });
                        }
                        break Ok(parts.join(" "));
                    }
                    other => {
                        self.log(format!("identification aborted by unexpected title 0x{other:02X}"));
                        {
                            let mut guard = self.state.lock().unwrap();
                            let _ = send_block(&mut guard, 0x09, Vec::new());
                        }
                        break Err(DiagError::UnexpectedTitle {
                            expected: &[0xF6, 0x09],
                            got: other,
                        });
                    }
                }
            };
            ident?
        };

        {
            let mut guard = self.state.lock().unwrap();
            guard.connection_state = ConnectionState::Ready;
        }

        Ok(Session {
            model: model.to_string(),
            ecu_name: ecu_name.to_string(),
            ecu_address,
            fault_sections,
            identification,
        })
    }

    /// Runs one command's send/receive/ack round trip under the shared
    /// lock, with the command-active flag set for its duration so the
    /// keep-alive scheduler skips its cycle rather than racing a trailing
    /// ACK onto the wire.
    ///
    /// `handler` receives the locked state and the response block (plus
    /// its terminator/counter health for logging) and decides what, if
    /// anything, to send back to close the exchange — this varies enough
    /// per command (a two-block close for most responses, a bare ACK to
    /// restore symmetry on an unexpected title, no further exchange at
    /// all when the response *was* the ACK) that no single tail policy
    /// fits every command.
    ///
    /// `fatal_on_transport_error`: whether a `Timeout`/`EchoMismatch`/
    /// `BadSync`/`Io` surfacing from this command tears the session down.
    /// `read_value` passes `false`: a single missed register read is not
    /// a session loss (spec's live-poll scenario), every other command
    /// passes `true`.
    fn command<T>(
        &self,
        title: u8,
        payload: Vec<u8>,
        fatal_on_transport_error: bool,
        handler: impl FnOnce(&mut DriverState, Block, bool, Option<DiagError>) -> DiagResult<T>,
    ) -> DiagResult<T> {
        self.command_with_timeout(title, payload, fatal_on_transport_error, None, handler)
    }

    /// As [`Self::command`], but overrides the response read's inter-byte
    /// timeout for the duration of this exchange. Adaptation writes need
    /// [`timing::ADAPTATION_TIMEOUT`] since the ECU may pause for an
    /// EEPROM write before ACKing.
    fn command_with_timeout<T>(
        &self,
        title: u8,
        payload: Vec<u8>,
        fatal_on_transport_error: bool,
        timeout_override: Option<std::time::Duration>,
        handler: impl FnOnce(&mut DriverState, Block, bool, Option<DiagError>) -> DiagResult<T>,
    ) -> DiagResult<T> {
        self.command_active.store(true, Ordering::SeqCst);

        // Log lines are captured here and emitted only after `guard` is
        // dropped below: `self.log` invokes the user-supplied `on_log`
        // callback, and the mutex must never be held across a callback
        // a caller might re-enter the driver from (its own `Debug` impl,
        // or another command).
        let mut pending_logs: Vec<String> = Vec::new();

        let mut guard = self.state.lock().unwrap();
        let mut disconnected = false;
        let result: DiagResult<T> = if guard.connection_state != ConnectionState::Ready {
            Err(DiagError::NotConnected)
        } else {
            if let Some(timeout) = timeout_override {
                if let Some(transport) = guard.transport.as_mut() {
                    transport.set_interbyte_timeout(timeout);
                }
            }
            log::trace!("TX title=0x{title:02X} payload={payload:02X?}");
            pending_logs.push(format!("TX title=0x{title:02X} payload={payload:02X?}"));

            // Only a failure in this primary send/receive exchange can
            // leave the two sides disagreeing about the block counter,
            // so that case alone tears the session down. Whatever
            // `handler` goes on to do
            // with a successfully received response (ACKing it, NAK
            // detection, an unexpected-title symmetry reply) fails the
            // command but never disconnects, matching the "NAK,
            // unexpected title, or a timeout on the post-response ACK
            // round-trip leaves the session Ready" rule.
            match send_block(&mut guard, title, payload).and_then(|_| recv_block(&mut guard)) {
                Err(err) => {
                    if fatal_on_transport_error && is_resync_error(&err) {
                        log::warn!("command 0x{title:02X} failed with a resync error, tearing session down: {err}");
                        mark_disconnected(&mut guard);
                        disconnected = true;
                    }
                    Err(err)
                }
                Ok((response, etx_ok, drift)) => {
                    pending_logs.push(format!(
                        "RX title=0x{:02X} payload={:02X?}",
                        response.title, response.payload
                    ));
                    if !etx_ok {
                        pending_logs
                            .push("block terminator was not 0x03; treating response as lossy".to_string());
                    }
                    if let Some(drift) = &drift {
                        pending_logs.push(format!("{drift}"));
                    }
                    let outcome = handler(&mut guard, response, etx_ok, drift);
                    if timeout_override.is_some() {
                        if let Some(transport) = guard.transport.as_mut() {
                            transport.set_interbyte_timeout(timing::INTERBYTE_TIMEOUT);
                        }
                    }
                    outcome
                }
            }
        };
        drop(guard);
        self.command_active.store(false, Ordering::SeqCst);

        for line in pending_logs {
            self.log(line);
        }
        if disconnected {
            self.publish_state(SessionState::Disconnected);
        }
        result
    }

    /// The standard two-block close used by most commands: ACK the
    /// response, then consume the ECU's own trailing ACK.
    fn ack_and_close(guard: &mut DriverState) -> DiagResult<()> {
        send_block(guard, 0x09, Vec::new())?;
        let (trailing, _etx_ok, _drift) = recv_block(guard)?;
        if trailing.title != 0x09 {
            return Err(DiagError::UnexpectedTitle {
                expected: &[0x09],
                got: trailing.title,
            });
        }
        Ok(())
    }

    /// `0x0A` is a distinct refusal, not just an unrecognized title: the
    /// ECU understood the request and declined it. No further block is
    /// sent in reply — like the actuator test's bare-ACK response, the
    /// NAK itself closes the exchange.
    fn check_nak(response: &Block) -> DiagResult<()> {
        if response.title == 0x0A {
            Err(DiagError::ECUNak)
        } else {
            Ok(())
        }
    }

    fn session_fault_sections(guard: &DriverState) -> Vec<&'static str> {
        guard
            .session
            .as_ref()
            .map(|s| s.fault_sections.clone())
            .unwrap_or_default()
    }
}

impl EcuClient for KwpDriver {
    fn connect(
        &mut self,
        port: &str,
        model: &str,
        ecu_name: &str,
        ecu_address: u8,
        baud: u32,
    ) -> DiagResult<String> {
        let mut last_err = DiagError::NotConnected;
        for attempt in 1..=self.connect_options.attempts {
            match self.connect_once(port, model, ecu_name, ecu_address, baud) {
                Ok(session) => {
                    let identification = session.identification.clone();
                    log::info!("connected: identification = {identification:?}");
                    {
                        let mut guard = self.state.lock().unwrap();
                        guard.session = Some(session);
                    }
                    self.keepalive = Some(KeepAlive::spawn(
                        Arc::downgrade(&self.state),
                        self.command_active.clone(),
                        self.on_log.clone(),
                        self.on_state_change.clone(),
                    ));
                    self.publish_state(SessionState::Connected);
                    return Ok(identification);
                }
                Err(err) => {
                    log::warn!("connect attempt {attempt}/{} failed: {err}", self.connect_options.attempts);
                    self.log(format!("connect attempt {attempt}/{} failed: {err}", self.connect_options.attempts));
                    {
                        let mut guard = self.state.lock().unwrap();
                        mark_disconnected(&mut guard);
                    }
                    last_err = err;
                    if attempt < self.connect_options.attempts {
                        timing::sleep(self.connect_options.retry_delay);
                    }
                }
            }
        }
        self.publish_state(SessionState::Disconnected);
        Err(last_err)
    }

    fn disconnect(&mut self) {
        log::info!("disconnecting");
        if let Some(mut keepalive) = self.keepalive.take() {
            keepalive.stop();
        }
        let mut guard = self.state.lock().unwrap();
        if guard.connection_state == ConnectionState::Closed {
            return;
        }
        let _ = send_block(&mut guard, 0x06, Vec::new());
        mark_disconnected(&mut guard);
        drop(guard);
        self.publish_state(SessionState::Disconnected);
    }

    fn read_faults(&mut self) -> DiagResult<Vec<FaultRecord>> {
        self.command(0x07, Vec::new(), true, |guard, response, _etx_ok, _drift| {
            KwpDriver::check_nak(&response)?;
            if response.title != 0xFC {
                let _ = send_block(guard, 0x09, Vec::new());
                return Err(DiagError::UnexpectedTitle {
                    expected: &[0xFC],
                    got: response.title,
                });
            }
            let sections = KwpDriver::session_fault_sections(guard);
            let faults = faults::decode_faults(&response.payload, self.fault_lookup.as_ref(), &sections);
            KwpDriver::ack_and_close(guard)?;
            Ok(faults)
        })
    }

    fn clear_faults(&mut self) -> bool {
        self.command(0x05, Vec::new(), true, |guard, response, _etx_ok, _drift| {
            KwpDriver::check_nak(&response)?;
            if response.title != 0x09 {
                let _ = send_block(guard, 0x09, Vec::new());
                return Err(DiagError::UnexpectedTitle {
                    expected: &[0x09],
                    got: response.title,
                });
            }
            Ok(())
        })
        .is_ok()
    }

    fn read_value(&mut self, register: u8) -> Option<u8> {
        self.command(0x01, vec![0x01, 0x00, register], false, |guard, response, _etx_ok, _drift| {
            KwpDriver::check_nak(&response)?;
            if response.title != 0xFE || response.payload.is_empty() {
                let _ = send_block(guard, 0x09, Vec::new());
                return Err(DiagError::UnexpectedTitle {
                    expected: &[0xFE],
                    got: response.title,
                });
            }
            let value = response.payload[0];
            KwpDriver::ack_and_close(guard)?;
            Ok(value)
        })
        .ok()
    }

    fn read_live_values(&mut self) -> Vec<LiveReading> {
        let (model, address) = {
            let guard = self.state.lock().unwrap();
            match guard.session.as_ref() {
                Some(session) => (session.model.clone(), session.ecu_address),
                None => return Vec::new(),
            }
        };
        live::poll_live_values(&model, address, |register| self.read_value(register))
    }

    fn read_adc(&mut self, channel: u8) -> Option<u16> {
        self.command(0x08, vec![channel], true, |guard, response, _etx_ok, _drift| {
            KwpDriver::check_nak(&response)?;
            if response.title != 0xFB || response.payload.len() < 2 {
                let _ = send_block(guard, 0x09, Vec::new());
                return Err(DiagError::UnexpectedTitle {
                    expected: &[0xFB],
                    got: response.title,
                });
            }
            let value = u16::from_be_bytes([response.payload[0], response.payload[1]]);
            KwpDriver::ack_and_close(guard)?;
            Ok(value)
        })
        .ok()
    }

    fn actuator_test(&mut self, num: u8) -> bool {
        self.command(0x10, vec![num], true, |guard, response, _etx_ok, _drift| {
            match response.title {
                0x09 => Ok(()),
                0xF5 => KwpDriver::ack_and_close(guard),
                other => {
                    let _ = send_block(guard, 0x09, Vec::new());
                    Err(DiagError::UnexpectedTitle {
                        expected: &[0x09, 0xF5],
                        got: other,
                    })
                }
            }
        })
        .is_ok()
    }

    fn read_group(&mut self, group: u8) -> Vec<GroupReading> {
        self.command(0x29, vec![group], true, |guard, response, _etx_ok, _drift| {
            KwpDriver::check_nak(&response)?;
            if response.title != 0xE7 {
                let _ = send_block(guard, 0x09, Vec::new());
                return Err(DiagError::UnexpectedTitle {
                    expected: &[0xE7],
                    got: response.title,
                });
            }
            let readings = response
                .payload
                .chunks_exact(3)
                .take(4)
                .map(|c| GroupReading { fid: c[0], a: c[1], b: c[2] })
                .collect();
            KwpDriver::ack_and_close(guard)?;
            Ok(readings)
        })
        .unwrap_or_default()
    }

    fn login(&mut self, pin_hi: u8, pin_lo: u8, workshop: u8) -> bool {
        self.command(0x2A, vec![pin_hi, pin_lo, workshop], true, |guard, response, _etx_ok, _drift| {
            KwpDriver::check_nak(&response)?;
            if response.title != 0x09 {
                let _ = send_block(guard, 0x09, Vec::new());
                return Err(DiagError::UnexpectedTitle {
                    expected: &[0x09],
                    got: response.title,
                });
            }
            Ok(())
        })
        .is_ok()
    }

    fn read_adaptation(&mut self, channel: u8) -> Option<(u8, u16)> {
        self.command(0x2B, vec![channel], true, |guard, response, _etx_ok, _drift| {
            KwpDriver::check_nak(&response)?;
            if response.title != 0xF4 || response.payload.len() < 3 {
                let _ = send_block(guard, 0x09, Vec::new());
                return Err(DiagError::UnexpectedTitle {
                    expected: &[0xF4],
                    got: response.title,
                });
            }
            let value = u16::from_be_bytes([response.payload[1], response.payload[2]]);
            let result = (response.payload[0], value);
            KwpDriver::ack_and_close(guard)?;
            Ok(result)
        })
        .ok()
    }

    fn write_adaptation(&mut self, channel: u8, value: u16) -> bool {
        let [hi, lo] = value.to_be_bytes();
        self.command_with_timeout(
            0x2C,
            vec![channel, hi, lo],
            true,
            Some(timing::ADAPTATION_TIMEOUT),
            |guard, response, _etx_ok, _drift| {
                if response.title != 0x09 {
                    let _ = send_block(guard, 0x09, Vec::new());
                    return Err(DiagError::UnexpectedTitle {
                        expected: &[0x09],
                        got: response.title,
                    });
                }
                Ok(())
            },
        )
        .is_ok()
    }
}

impl KwpDriver {
    /// `Basic setting` (`0x28`), folded in from
    /// `original_source/kwp1281/protocol.py`: not part of [`EcuClient`]'s
    /// fixed capability surface, but present in the reference. Its
    /// response title varies by ECU and channel, so unlike every other
    /// command this one has no single expected title to validate
    /// against; it accepts whatever the ECU sends back and returns it
    /// raw rather than decoding it, mirroring the reference, which has
    /// no concrete decode for this command either.
    pub fn basic_setting(&mut self, payload: Vec<u8>) -> DiagResult<(u8, Vec<u8>)> {
        self.command(0x28, payload, true, |guard, response, _etx_ok, _drift| {
            KwpDriver::check_nak(&response)?;
            let result = (response.title, response.payload.clone());
            if response.title == 0x09 {
                Ok(result)
            } else {
                KwpDriver::ack_and_close(guard)?;
                Ok(result)
            }
        })
    }
}
