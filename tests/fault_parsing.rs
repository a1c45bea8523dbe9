//! Exercises fault-payload decoding against the built-in dictionary as
//! a caller outside the crate would: resolve a `(model, address)` to an
//! [`EcuDescriptor`]'s fault sections, then decode a raw `0xFC` payload
//! against them, matching spec.md §8's "read faults, two stored" scenario.

use kwp1281::ecu;
use kwp1281::fault_codes::BuiltinFaultLookup;
use kwp1281::faults::decode_faults;

#[test]
fn two_stored_faults_on_a_964_motronic_resolve_real_descriptions() {
    let descriptor = ecu::ecu_descriptor("964", 0x10).expect("964 Motronic M2.1 is a known ECU");
    assert_eq!(descriptor.fault_sections, &["M00"]);

    // 0x11 = 17 (throttle position sensor), status 0x84 -> count 4.
    // 0x0E = 14 (intake air temperature sensor), status 0x81 -> count 1.
    let payload = [0x11, 0x84, 0x0E, 0x81];
    let faults = decode_faults(&payload, &BuiltinFaultLookup, descriptor.fault_sections);

    assert_eq!(faults.len(), 2);
    assert_eq!(faults[0].code, 17);
    assert_eq!(faults[0].count, 4);
    assert_eq!(faults[0].description, "Throttle position sensor");
    assert_eq!(faults[1].code, 14);
    assert_eq!(faults[1].count, 1);
    assert_eq!(faults[1].description, "Intake air temperature sensor");
}

#[test]
fn no_faults_payload_is_empty_regardless_of_ecu() {
    let descriptor = ecu::ecu_descriptor("993", 0x51).expect("993 CCU is a known ECU");
    let faults = decode_faults(&[0x00], &BuiltinFaultLookup, descriptor.fault_sections);
    assert!(faults.is_empty());
}

#[test]
fn code_absent_from_every_configured_section_gets_synthesized_text() {
    let descriptor = ecu::ecu_descriptor("965", 0x57).expect("965 SRS is a known ECU");
    let faults = decode_faults(&[0xF0, 0x81], &BuiltinFaultLookup, descriptor.fault_sections);
    assert_eq!(faults.len(), 1);
    assert_eq!(faults[0].description, "Unknown fault code 240");
}

#[test]
fn unknown_model_has_no_fault_sections_and_everything_is_unmatched() {
    let faults = decode_faults(&[0x01, 0x81], &BuiltinFaultLookup, &[]);
    assert_eq!(faults[0].description, "Unknown fault code 1");
}
