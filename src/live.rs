//! The live-value poller: iterates a measurement-descriptor table,
//! issues raw reads, applies scaling formulas, and normalizes the
//! result. Stateless.

use crate::client::LiveReading;
use crate::ecu::{self, MeasurementDescriptor};

/// Polls every descriptor in `ecu::live_params(model, address)` through
/// `read_value`, skipping any register that fails to read. `read_value`
/// is a closure over the driver's raw `Read value` command so this
/// function stays a pure decoder with no transport or locking
/// knowledge of its own.
///
/// Property: the returned ratio is always in `0.0..=1.0`, and every
/// `formatted` string includes its unit.
pub fn poll_live_values(
    model: &str,
    address: u8,
    mut read_value: impl FnMut(u8) -> Option<u8>,
) -> Vec<LiveReading> {
    ecu::live_params(model, address)
        .iter()
        .filter_map(|descriptor| read_value(descriptor.register).map(|raw| reading_for(descriptor, raw)))
        .collect()
}

fn reading_for(descriptor: &MeasurementDescriptor, raw: u8) -> LiveReading {
    let value = (descriptor.formula)(raw);
    let ratio = if descriptor.max > descriptor.min {
        ((value - descriptor.min) / (descriptor.max - descriptor.min)).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let formatted = format!("{:.*} {}", descriptor.precision, value, descriptor.unit);
    LiveReading {
        name: descriptor.name,
        value,
        unit: descriptor.unit,
        formatted,
        ratio,
    }
}
