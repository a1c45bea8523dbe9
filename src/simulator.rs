//! [`Simulator`]: a transport-free stand-in implementing the same
//! [`EcuClient`] capability as [`crate::KwpDriver`], for offline use.
//!
//! Grounded on `original_source/kwp1281/demo.py`'s `DemoProtocol` for
//! behavior (canned per-`(model, address)` identification strings, a
//! fault list sampled once per section and held until `clear_faults`,
//! jittered live values from per-register base constants) and on the
//! teacher's `SimulationIsoTpChannel` (`src/hardware/simulation.rs`) for
//! the Rust shape of a fake backend living behind the real one's trait.

use std::collections::HashMap;

use rand::Rng;

use crate::client::{EcuClient, FaultRecord, GroupReading, LiveReading, SessionState};
use crate::ecu;
use crate::fault_codes::{BuiltinFaultLookup, FaultLookup};
use crate::{DiagError, DiagResult};

/// Demo part numbers, transcribed from
/// `original_source/kwp1281/constants.py::DEMO_PART_NUMBERS`. Returned as
/// the canned identification string on `connect`.
fn demo_part_number(model: &str, address: u8) -> &'static str {
    match (model, address) {
        ("964", 0x10) => "964.618.124.02",
        ("964", 0x3D) => "964.355.755.02",
        ("964", 0x51) => "964.624.911.00",
        ("964", 0x57) => "964.618.223.00",
        ("964", 0x40) => "964.618.261.00",
        ("964", 0x29) => "964.618.901.00",
        ("993", 0x10) => "993.618.124.00",
        ("993", 0x1F) => "993.355.755.00",
        ("993", 0x51) => "993.624.911.00",
        ("993", 0x57) => "993.618.223.00",
        ("993", 0x40) => "993.618.261.00",
        ("993", 0x29) => "993.618.901.00",
        ("965", 0x51) => "965.624.911.00",
        ("965", 0x57) => "965.618.223.00",
        ("965", 0x40) => "965.618.261.00",
        ("965", 0x3D) => "965.355.755.00",
        _ => "XXX.XXX.XXX.XX",
    }
}

/// Per-register base value a live read jitters around, transcribed from
/// `original_source/kwp1281/demo.py::DemoProtocol.read_value`'s
/// `base_values` table. Registers absent from this table fall back to
/// `128`, the reference's default.
fn base_value(register: u8) -> u8 {
    match register {
        0x37 => 140,
        0x38 => 180,
        0x39 => 21,
        0x3A => 21,
        0x42 => 64,
        0x45 => 92,
        0x5D => 80,
        0x36 => 204,
        0x3D => 50,
        0x47 => 51,
        _ => 128,
    }
}

/// Jitters `base` by up to +/-5%, clamped to `0..=255`, matching
/// `max(1, int(base * 0.05))` in the reference.
fn jittered(base: u8) -> u8 {
    let jitter = ((base as i32) * 5 / 100).max(1);
    let delta = rand::thread_rng().gen_range(-jitter..=jitter);
    (base as i32 + delta).clamp(0, 255) as u8
}

struct SimulatedSession {
    model: String,
    ecu_address: u8,
    fault_sections: Vec<&'static str>,
}

/// A transport-free [`EcuClient`] implementation. Connects instantly
/// (no real wire timing), reports a canned identification, and returns
/// plausible but synthetic fault/live/adaptation data so UIs and
/// integrations can be exercised without hardware.
pub struct Simulator {
    session: Option<SimulatedSession>,
    stored_faults: Option<Vec<FaultRecord>>,
    fault_lookup: Box<dyn FaultLookup>,
}

impl std::fmt::Debug for Simulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulator")
            .field("connected", &self.session.is_some())
            .finish()
    }
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulator {
    /// Builds a disconnected simulator using the built-in fault
    /// dictionary.
    pub fn new() -> Self {
        Self {
            session: None,
            stored_faults: None,
            fault_lookup: Box::new(BuiltinFaultLookup),
        }
    }

    /// Overrides the fault-description dictionary, same as
    /// [`crate::KwpDriver::with_fault_lookup`].
    pub fn with_fault_lookup(mut self, lookup: Box<dyn FaultLookup>) -> Self {
        self.fault_lookup = lookup;
        self
    }

    /// Up to 8 codes per fault section, sampled without replacement from
    /// the built-in dictionary's entries for that section, each given a
    /// random 1..=12 occurrence count, matching
    /// `DemoProtocol._generate_faults`. Sorted by code, same as the
    /// reference's `faults.sort(key=...)`.
    fn generate_faults(&self, sections: &[&'static str]) -> Vec<FaultRecord> {
        let mut rng = rand::thread_rng();
        let mut records: Vec<FaultRecord> = Vec::new();
        for section in sections {
            let mut codes: Vec<u8> = (0u8..=255)
                .filter(|code| self.fault_lookup.lookup(section, *code).is_some())
                .collect();
            if codes.is_empty() {
                continue;
            }
            // Fisher-Yates partial shuffle, same sampling-without-replacement
            // effect as `random.sample`.
            for i in (1..codes.len()).rev() {
                let j = rng.gen_range(0..=i);
                codes.swap(i, j);
            }
            codes.truncate(8);
            for code in codes {
                let description = self
                    .fault_lookup
                    .lookup(section, code)
                    .unwrap_or_else(|| format!("Unknown fault code {code}"));
                records.push(FaultRecord {
                    code,
                    count: rng.gen_range(1..=12),
                    description,
                });
            }
        }
        records.sort_by_key(|r| r.code);
        records
    }

    fn session(&self) -> DiagResult<&SimulatedSession> {
        self.session.as_ref().ok_or(DiagError::NotConnected)
    }
}

impl EcuClient for Simulator {
    fn connect(
        &mut self,
        _port: &str,
        model: &str,
        _ecu_name: &str,
        ecu_address: u8,
        _baud: u32,
    ) -> DiagResult<String> {
        let fault_sections = ecu::ecu_descriptor(model, ecu_address)
            .map(|d| d.fault_sections.to_vec())
            .unwrap_or_default();
        self.session = Some(SimulatedSession {
            model: model.to_string(),
            ecu_address,
            fault_sections,
        });
        self.stored_faults = None;
        Ok(demo_part_number(model, ecu_address).to_string())
    }

    fn disconnect(&mut self) {
        self.session = None;
        self.stored_faults = None;
    }

    fn read_faults(&mut self) -> DiagResult<Vec<FaultRecord>> {
        let sections = self.session()?.fault_sections.clone();
        if self.stored_faults.is_none() {
            self.stored_faults = Some(self.generate_faults(&sections));
        }
        Ok(self.stored_faults.clone().unwrap_or_default())
    }

    fn clear_faults(&mut self) -> bool {
        if self.session.is_none() {
            return false;
        }
        self.stored_faults = Some(Vec::new());
        true
    }

    fn read_value(&mut self, register: u8) -> Option<u8> {
        self.session.as_ref()?;
        Some(jittered(base_value(register)))
    }

    fn read_live_values(&mut self) -> Vec<LiveReading> {
        let Some(session) = self.session.as_ref() else {
            return Vec::new();
        };
        let (model, address) = (session.model.clone(), session.ecu_address);
        crate::live::poll_live_values(&model, address, |register| self.read_value(register))
    }

    fn read_adc(&mut self, channel: u8) -> Option<u16> {
        self.session.as_ref()?;
        Some(jittered(base_value(channel)) as u16 * 257)
    }

    fn actuator_test(&mut self, _num: u8) -> bool {
        self.session.is_some()
    }

    fn read_group(&mut self, _group: u8) -> Vec<GroupReading> {
        if self.session.is_none() {
            return Vec::new();
        }
        let mut rng = rand::thread_rng();
        (0..4)
            .map(|_| GroupReading {
                fid: 1,
                a: rng.gen_range(0..=255),
                b: rng.gen_range(0..=255),
            })
            .collect()
    }

    fn login(&mut self, _pin_hi: u8, _pin_lo: u8, _workshop: u8) -> bool {
        self.session.is_some()
    }

    fn read_adaptation(&mut self, channel: u8) -> Option<(u8, u16)> {
        self.session.as_ref()?;
        Some((channel, rand::thread_rng().gen_range(0..=u16::MAX)))
    }

    fn write_adaptation(&mut self, _channel: u8, _value: u16) -> bool {
        self.session.is_some()
    }
}

/// Unused by [`Simulator`] directly, but keeps parity with
/// [`crate::driver::KwpDriver`]'s state-change vocabulary available to
/// callers that want to announce simulated transitions themselves (the
/// reference's `DemoProtocol` emits `on_log`/`on_state_change` calls the
/// same way the real protocol does; this crate's `Simulator` is a pure
/// value behind [`EcuClient`] with no callback storage of its own, so a
/// caller wiring it into the same UI as [`crate::KwpDriver`] publishes
/// these itself around `connect`/`disconnect` calls).
pub const SIMULATOR_STATES: [SessionState; 3] = [
    SessionState::Connecting,
    SessionState::Connected,
    SessionState::Disconnected,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_returns_demo_part_number() {
        let mut sim = Simulator::new();
        let id = sim.connect("COM1", "965", "CCU", 0x51, 4800).unwrap();
        assert_eq!(id, "965.624.911.00");
    }

    #[test]
    fn unknown_address_falls_back_to_placeholder() {
        let mut sim = Simulator::new();
        let id = sim.connect("COM1", "965", "Unknown", 0xAA, 4800).unwrap();
        assert_eq!(id, "XXX.XXX.XXX.XX");
    }

    #[test]
    fn read_faults_is_stable_until_cleared() {
        let mut sim = Simulator::new();
        sim.connect("COM1", "964", "CCU", 0x51, 4800).unwrap();
        let first = sim.read_faults().unwrap();
        let second = sim.read_faults().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn clear_faults_empties_the_list() {
        let mut sim = Simulator::new();
        sim.connect("COM1", "964", "CCU", 0x51, 4800).unwrap();
        let _ = sim.read_faults().unwrap();
        assert!(sim.clear_faults());
        assert!(sim.read_faults().unwrap().is_empty());
    }

    #[test]
    fn commands_fail_before_connect() {
        let mut sim = Simulator::new();
        assert!(sim.read_faults().is_err());
        assert!(!sim.clear_faults());
        assert!(sim.read_value(0x3A).is_none());
        assert!(!sim.actuator_test(1));
        assert!(!sim.login(0x12, 0x34, 0));
        assert!(sim.read_adaptation(1).is_none());
        assert!(!sim.write_adaptation(1, 100));
    }

    #[test]
    fn read_value_is_plausible_and_jittered() {
        let mut sim = Simulator::new();
        sim.connect("COM1", "993", "Motronic", 0x10, 9600).unwrap();
        for _ in 0..50 {
            let v = sim.read_value(0x39).unwrap();
            assert!((0..=42).contains(&v), "RPM register jittered out of range: {v}");
        }
    }

    #[test]
    fn read_live_values_matches_table_length() {
        let mut sim = Simulator::new();
        sim.connect("COM1", "964", "Motronic", 0x10, 8800).unwrap();
        let readings = sim.read_live_values();
        assert_eq!(readings.len(), ecu::LIVE_964_MOTRONIC.len());
        for r in &readings {
            assert!((0.0..=1.0).contains(&r.ratio));
        }
    }

    #[test]
    fn disconnect_resets_fault_cache() {
        let mut sim = Simulator::new();
        sim.connect("COM1", "964", "CCU", 0x51, 4800).unwrap();
        let _ = sim.read_faults().unwrap();
        sim.disconnect();
        assert!(sim.read_faults().is_err());
    }
}
