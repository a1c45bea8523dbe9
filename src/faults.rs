//! Decodes the payload of a `0xFC` fault-codes response into
//! [`FaultRecord`] values. Stateless.

use crate::client::FaultRecord;
use crate::fault_codes::{self, FaultLookup};

/// Decodes a fault-response payload.
///
/// A sole byte `0x00` means "no faults stored" and decodes to an empty
/// list. Otherwise the payload is iterated as `(code, status)` pairs;
/// pairs whose code byte is zero are skipped (padding some ECUs emit
/// after the last real fault), and each surviving pair yields a record
/// whose count is the low 6 bits of the status byte, with its
/// description resolved by trying `sections` in order via `lookup`
/// (first hit wins; an unmatched code gets a synthesized "Unknown fault
/// code N").
///
/// This is a total function: every input, including a payload of odd
/// length or one whose trailing byte doesn't complete a pair, decodes
/// without panicking — a dangling last byte with no status byte is
/// simply ignored, matching the reference's `while i + 1 < len(data)`
/// loop bound.
pub fn decode_faults(
    payload: &[u8],
    lookup: &dyn FaultLookup,
    sections: &[&str],
) -> Vec<FaultRecord> {
    if payload == [0x00] {
        return Vec::new();
    }

    let mut records = Vec::new();
    let mut i = 0;
    while i + 1 < payload.len() {
        let code = payload[i];
        let status = payload[i + 1];
        i += 2;

        if code == 0 {
            continue;
        }

        let count = status & 0x3F;
        let description = fault_codes::lookup_in_sections(lookup, sections, code);
        records.push(FaultRecord {
            code,
            count,
            description,
        });
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fault_codes::BuiltinFaultLookup;

    #[test]
    fn single_zero_byte_means_no_faults() {
        let records = decode_faults(&[0x00], &BuiltinFaultLookup, &["M00"]);
        assert!(records.is_empty());
    }

    #[test]
    fn two_stored_faults_decode_in_order() {
        // 0x12=18, status 0x83 -> count 3; 0x18=24, status 0x81 -> count 1.
        let payload = [0x12, 0x83, 0x18, 0x81];
        let records = decode_faults(&payload, &BuiltinFaultLookup, &["M00"]);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].code, 18);
        assert_eq!(records[0].count, 3);
        assert_eq!(records[1].code, 24);
        assert_eq!(records[1].count, 1);
    }

    #[test]
    fn zero_code_padding_is_skipped() {
        let payload = [0x00, 0x00, 0x11, 0x81];
        let records = decode_faults(&payload, &BuiltinFaultLookup, &["M00"]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].code, 17);
    }

    #[test]
    fn count_is_always_in_range() {
        for status in 0u8..=255 {
            let payload = [0x01, status];
            let records = decode_faults(&payload, &BuiltinFaultLookup, &["M00"]);
            assert!(records[0].count <= 63);
        }
    }

    #[test]
    fn unmatched_code_gets_synthesized_description() {
        let payload = [0xAA, 0x01];
        let records = decode_faults(&payload, &BuiltinFaultLookup, &["M00"]);
        assert_eq!(records[0].description, "Unknown fault code 170");
    }
}
