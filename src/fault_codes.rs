//! The fault-description dictionary: an immutable lookup from
//! `(section, code)` to human text.
//!
//! An explicit initialization step returning an immutable mapping, in
//! place of the Python reference's lazy-global
//! (`original_source/kwp1281/fault_codes.py::_load_database`, which
//! populates a module-level dict on first call and parses ScanTool
//! `Trouble Codes *.txt` files that are out of this crate's scope).
//! This module ships a small built-in table covering the sections
//! [`crate::ecu`]'s descriptors reference, built once via
//! [`std::sync::OnceLock`], and exposes [`FaultLookup`] so a caller can
//! substitute a richer dictionary (e.g. one parsed from the real
//! ScanTool files) without touching the driver.

use std::collections::HashMap;
use std::sync::OnceLock;

/// A fault-description source: given a section key and a numeric fault
/// code, returns a description if known.
pub trait FaultLookup: Send + Sync {
    /// Looks up `code` within `section`.
    fn lookup(&self, section: &str, code: u8) -> Option<String>;
}

type Dictionary = HashMap<&'static str, HashMap<u8, &'static str>>;

fn build_dictionary() -> Dictionary {
    let mut db: Dictionary = HashMap::new();

    db.insert(
        "M00",
        HashMap::from([
            (11, "Oxygen sensor circuit"),
            (13, "Coolant temperature sensor"),
            (14, "Intake air temperature sensor"),
            (15, "Idle switch"),
            (17, "Throttle position sensor"),
            (18, "Knock sensor 1"),
            (21, "Knock sensor 2"),
            (23, "RPM sensor"),
            (26, "Speed signal"),
            (39, "Control unit fault"),
        ]),
    );
    db.insert(
        "M04",
        HashMap::from([
            (11, "Oxygen sensor bank 1"),
            (12, "Oxygen sensor bank 2"),
            (16, "Mass air flow sensor"),
            (17, "Throttle position sensor"),
            (19, "Knock sensor 1"),
            (20, "Knock sensor 2"),
            (34, "EVAP purge valve"),
        ]),
    );
    db.insert(
        "M06",
        HashMap::from([
            (41, "Secondary air injection"),
            (42, "Catalyst efficiency bank 1"),
            (43, "Catalyst efficiency bank 2"),
        ]),
    );
    db.insert(
        "S00",
        HashMap::from([
            (1, "Front left wheel speed sensor"),
            (2, "Front right wheel speed sensor"),
            (3, "Rear left wheel speed sensor"),
            (4, "Rear right wheel speed sensor"),
            (5, "ABS hydraulic pump"),
            (6, "ABS relay"),
        ]),
    );
    db.insert(
        "ABS5",
        HashMap::from([
            (1, "Front left wheel speed sensor open circuit"),
            (2, "Front right wheel speed sensor open circuit"),
            (7, "Valve block relay"),
            (8, "Pump motor relay"),
        ]),
    );
    db.insert(
        "H00",
        HashMap::from([
            (1, "Fresh air servo motor"),
            (2, "Defrost servo motor"),
            (3, "Footwell servo motor"),
            (4, "Mixer servo motor left"),
            (5, "Mixer servo motor right"),
        ]),
    );
    db.insert(
        "H03",
        HashMap::from([
            (10, "Inside temperature sensor"),
            (11, "Evaporator temperature sensor"),
            (12, "Outside temperature sensor"),
        ]),
    );
    db.insert(
        "H05",
        HashMap::from([
            (10, "Inside temperature sensor"),
            (11, "Evaporator temperature sensor"),
        ]),
    );
    db.insert(
        "H06",
        HashMap::from([(20, "Rear blower motor"), (21, "Rear blower relay")]),
    );
    db.insert(
        "H08",
        HashMap::from([(30, "Oil cooler fan relay")]),
    );
    db.insert(
        "B02",
        HashMap::from([
            (1, "Driver airbag squib"),
            (2, "Passenger airbag squib"),
            (3, "Seat belt tensioner left"),
            (4, "Seat belt tensioner right"),
        ]),
    );
    db.insert(
        "B03",
        HashMap::from([(5, "Side airbag squib left"), (6, "Side airbag squib right")]),
    );
    db.insert(
        "I00",
        HashMap::from([
            (1, "Hood contact switch"),
            (2, "Door contact switch left"),
            (3, "Door contact switch right"),
        ]),
    );
    db.insert(
        "I01",
        HashMap::from([(4, "Tilt sensor"), (5, "Interior motion sensor")]),
    );
    db.insert(
        "G00",
        HashMap::from([
            (1, "Transmission speed sensor"),
            (2, "Shift solenoid A"),
            (3, "Shift solenoid B"),
        ]),
    );

    db
}

fn dictionary() -> &'static Dictionary {
    static DICTIONARY: OnceLock<Dictionary> = OnceLock::new();
    DICTIONARY.get_or_init(build_dictionary)
}

/// The crate's built-in [`FaultLookup`], backed by [`dictionary`].
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinFaultLookup;

impl FaultLookup for BuiltinFaultLookup {
    fn lookup(&self, section: &str, code: u8) -> Option<String> {
        dictionary()
            .get(section)
            .and_then(|codes| codes.get(&code))
            .map(|s| s.to_string())
    }
}

/// Looks up `code` across `sections` in order, returning the first hit,
/// or a synthesized "Unknown fault code N" if none of the sections
/// cover it.
pub fn lookup_in_sections(
    lookup: &dyn FaultLookup,
    sections: &[&str],
    code: u8,
) -> String {
    for section in sections {
        if let Some(desc) = lookup.lookup(section, code) {
            return desc;
        }
    }
    format!("Unknown fault code {code}")
}
