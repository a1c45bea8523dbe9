//! Static configuration tables: known ECU targets per vehicle model and
//! the live-measurement register descriptors used by [`crate::live`].
//!
//! Transcribed from `original_source/kwp1281/constants.py` (`ECUS`,
//! `FAULT_SECTIONS`) and `original_source/kwp1281/formulas.py`
//! (`LIVE_PARAMS`, `LIVE_PARAMS_GENERIC`). None of this is mutated at
//! runtime.

/// A single ECU target: its human name, wire address, the baud rate the
/// post-init handshake should run at, and the ordered fault-dictionary
/// sections consulted to decode its fault memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EcuDescriptor {
    /// Display name, e.g. `"Motronic M2.1"`.
    pub name: &'static str,
    /// The 1-byte address sent during the 5-baud wake-up.
    pub address: u8,
    /// Post-init baud rate this ECU expects.
    pub baud: u32,
    /// Fault-dictionary sections tried in order when decoding this
    /// ECU's fault memory; first hit wins (see [`crate::faults`]).
    pub fault_sections: &'static [&'static str],
}

/// All known ECUs for the 964 (1989-1994).
pub const ECUS_964: &[EcuDescriptor] = &[
    EcuDescriptor { name: "Motronic M2.1", address: 0x10, baud: 8800, fault_sections: &["M00"] },
    EcuDescriptor { name: "ABS (C4 only)", address: 0x3D, baud: 4800, fault_sections: &["S00"] },
    EcuDescriptor { name: "CCU (Climate)", address: 0x51, baud: 4800, fault_sections: &["H00", "H03"] },
    EcuDescriptor { name: "SRS (Airbag)", address: 0x57, baud: 9600, fault_sections: &["B02"] },
    EcuDescriptor { name: "Alarm", address: 0x40, baud: 9600, fault_sections: &["I00"] },
    EcuDescriptor { name: "TIP (Tiptronic)", address: 0x29, baud: 4800, fault_sections: &["G00"] },
];

/// All known ECUs for the 993 (1994-1998).
pub const ECUS_993: &[EcuDescriptor] = &[
    EcuDescriptor { name: "Motronic M5.2", address: 0x10, baud: 9600, fault_sections: &["M04", "M06"] },
    EcuDescriptor { name: "ABS", address: 0x1F, baud: 9600, fault_sections: &["ABS5"] },
    EcuDescriptor { name: "CCU (Climate)", address: 0x51, baud: 4800, fault_sections: &["H05", "H06", "H08"] },
    EcuDescriptor { name: "SRS (Airbag)", address: 0x57, baud: 9600, fault_sections: &["B02", "B03"] },
    EcuDescriptor { name: "Alarm", address: 0x40, baud: 9600, fault_sections: &["I00", "I01"] },
    EcuDescriptor { name: "TIP (Tiptronic)", address: 0x29, baud: 4800, fault_sections: &["G00"] },
];

/// All known ECUs for the 965/928-derived climate/SRS shared bus.
pub const ECUS_965: &[EcuDescriptor] = &[
    EcuDescriptor { name: "CCU (Climate)", address: 0x51, baud: 4800, fault_sections: &["H00", "H03"] },
    EcuDescriptor { name: "SRS (Airbag)", address: 0x57, baud: 9600, fault_sections: &["B02"] },
    EcuDescriptor { name: "Alarm", address: 0x40, baud: 9600, fault_sections: &["I00"] },
    EcuDescriptor { name: "ABS", address: 0x3D, baud: 4800, fault_sections: &["S00"] },
];

/// Returns the ECU table for `model` (`"964"`, `"993"`, `"965"`), or an
/// empty slice for an unknown model.
pub fn ecus_for_model(model: &str) -> &'static [EcuDescriptor] {
    match model {
        "964" => ECUS_964,
        "993" => ECUS_993,
        "965" => ECUS_965,
        _ => &[],
    }
}

/// Looks up a single ECU descriptor by model and address.
pub fn ecu_descriptor(model: &str, address: u8) -> Option<&'static EcuDescriptor> {
    ecus_for_model(model).iter().find(|e| e.address == address)
}

/// A row in the live-measurement table: a register to poll, how to
/// scale the raw byte the ECU returns, and how to present it.
///
/// `precision` replaces the Python reference's printf-style format
/// string (`"{:.1f}"`) with a plain decimal-place count, which is all
/// any of the reference tables ever varied; [`crate::live`] renders it
/// with `format!("{:.*}", precision, value)`.
#[derive(Debug, Clone, Copy)]
pub struct MeasurementDescriptor {
    /// Display name, e.g. `"RPM"`.
    pub name: &'static str,
    /// The register byte passed to the `Read value` command.
    pub register: u8,
    /// Converts the raw byte into a physical value.
    pub formula: fn(u8) -> f64,
    /// Display-scale minimum, used for the live-value ratio.
    pub min: f64,
    /// Display-scale maximum, used for the live-value ratio.
    pub max: f64,
    /// Unit string appended to the formatted value.
    pub unit: &'static str,
    /// Decimal places to render the value with.
    pub precision: usize,
}

fn temp_f(n: u8) -> f64 {
    ((n as f64) * 115.0 / 100.0) - 26.0
}

fn temp_c(n: u8) -> f64 {
    (temp_f(n) - 32.0) * 5.0 / 9.0
}

/// Live-value table for the 964 Motronic M2.1 (address `0x10`).
pub const LIVE_964_MOTRONIC: &[MeasurementDescriptor] = &[
    MeasurementDescriptor { name: "RPM", register: 0x3A, formula: |n| n as f64 * 40.0, min: 0.0, max: 7000.0, unit: "rpm", precision: 0 },
    MeasurementDescriptor { name: "Head Temp", register: 0x38, formula: temp_c, min: 0.0, max: 130.0, unit: "\u{b0}C", precision: 0 },
    MeasurementDescriptor { name: "Intake Temp", register: 0x37, formula: temp_c, min: 0.0, max: 100.0, unit: "\u{b0}C", precision: 0 },
    MeasurementDescriptor { name: "AFM Voltage", register: 0x45, formula: |n| n as f64 * 500.0 / 255.0, min: 0.0, max: 5.0, unit: "V", precision: 2 },
    MeasurementDescriptor { name: "Injector Time", register: 0x42, formula: |n| n as f64 * 5.0, min: 0.0, max: 20.0, unit: "ms", precision: 1 },
    MeasurementDescriptor { name: "Timing", register: 0x5D, formula: |n| (((n as f64 - 0x68 as f64) * 2075.0) / 255.0) * -1.0, min: 0.0, max: 50.0, unit: "\u{b0}", precision: 1 },
];

/// Live-value table for the 993 Motronic M5.2 (address `0x10`).
pub const LIVE_993_MOTRONIC: &[MeasurementDescriptor] = &[
    MeasurementDescriptor { name: "RPM", register: 0x39, formula: |n| n as f64 * 40.0, min: 0.0, max: 7000.0, unit: "rpm", precision: 0 },
    MeasurementDescriptor { name: "Head Temp", register: 0x38, formula: temp_c, min: 0.0, max: 130.0, unit: "\u{b0}C", precision: 0 },
    MeasurementDescriptor { name: "Intake Temp", register: 0x37, formula: temp_c, min: 0.0, max: 100.0, unit: "\u{b0}C", precision: 0 },
    MeasurementDescriptor { name: "Battery", register: 0x36, formula: |n| n as f64 * 682.0 / 100.0, min: 10.0, max: 16.0, unit: "V", precision: 1 },
    MeasurementDescriptor { name: "O2 Sensor", register: 0x3D, formula: |n| n as f64 * 3.0, min: 0.0, max: 1000.0, unit: "mV", precision: 0 },
    MeasurementDescriptor { name: "MAF Voltage", register: 0x47, formula: |n| n as f64 * 500.0 / 255.0, min: 0.0, max: 5.0, unit: "V", precision: 2 },
];

/// Generic two-register fallback used when no `(model, address)` table
/// exists.
pub const LIVE_GENERIC: &[MeasurementDescriptor] = &[
    MeasurementDescriptor { name: "Value 1", register: 0x01, formula: |n| n as f64, min: 0.0, max: 255.0, unit: "raw", precision: 0 },
    MeasurementDescriptor { name: "Value 2", register: 0x02, formula: |n| n as f64, min: 0.0, max: 255.0, unit: "raw", precision: 0 },
];

/// Returns the live-measurement table for `(model, address)`, falling
/// back to [`LIVE_GENERIC`] when no specific table is known.
pub fn live_params(model: &str, address: u8) -> &'static [MeasurementDescriptor] {
    match (model, address) {
        ("964", 0x10) => LIVE_964_MOTRONIC,
        ("993", 0x10) => LIVE_993_MOTRONIC,
        _ => LIVE_GENERIC,
    }
}
