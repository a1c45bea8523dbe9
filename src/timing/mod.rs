//! Monotonic sleeps at 5-baud bit-time resolution and baud-rate switching,
//! including the non-portable fallback path some adapters need for the
//! 8800 baud KWP1281 rate.

#[cfg(target_os = "macos")]
mod macos_ioctl;

use std::time::{Duration, Instant};

/// One bit period at 5 baud: 200ms.
pub const BIT_TIME: Duration = Duration::from_millis(200);

/// Mandatory pause between receiving key-word 2 and sending its
/// complement. Some ECUs ignore an earlier reply.
pub const KEYWORD_ACK_DELAY: Duration = Duration::from_millis(30);

/// Default inter-byte timeout for all post-handshake I/O.
pub const INTERBYTE_TIMEOUT: Duration = Duration::from_millis(100);

/// Timeout waiting for the 0x55 sync byte after the baud-rate switch.
pub const SYNC_TIMEOUT: Duration = Duration::from_secs(1);

/// Timeout for the terminator byte of a received block.
pub const ETX_TIMEOUT: Duration = Duration::from_millis(100);

/// Interval between keep-alive ACK exchanges while idle.
pub const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(4);

/// Delay between `connect` attempts.
pub const INIT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Read timeout to use for adaptation writes, which may have the ECU
/// pause for an EEPROM write before ACKing.
pub const ADAPTATION_TIMEOUT: Duration = Duration::from_secs(60);

/// Number of connect attempts before giving up.
pub const MAX_CONNECT_ATTEMPTS: u32 = 3;

/// Upper bound on identification blocks read before `connect` gives up
/// waiting for the ECU to send a terminating ACK.
pub const MAX_IDENT_BLOCKS: usize = 8;

/// Sleeps for exactly `n` consecutive bit periods, anchoring each
/// interval to a fixed start instant instead of chaining `n` independent
/// `thread::sleep(BIT_TIME)` calls.
///
/// Chaining naive sleeps lets each call's scheduler overshoot accumulate
/// into the next call's nominal start time; anchoring to `start +
/// i * BIT_TIME` keeps the total duration within one scheduler tick of
/// `n * BIT_TIME` regardless of how many individual sleeps overshot.
pub fn sleep_bit_times(n: u32) {
    let start = Instant::now();
    for i in 1..=n {
        sleep_until(start + BIT_TIME * i);
    }
}

/// Sleeps for exactly one 5-baud bit period.
pub fn sleep_bit_time() {
    std::thread::sleep(BIT_TIME);
}

/// Sleeps until `deadline`, or returns immediately if it has already
/// passed. The building block [`sleep_bit_times`] and
/// [`crate::kline::KLineTransport::send_5baud`] use to anchor each bit
/// boundary to a fixed start instant instead of chaining independent
/// sleeps, so per-bit scheduler overshoot can't accumulate across the
/// 10-bit frame.
pub fn sleep_until(deadline: Instant) {
    let now = Instant::now();
    if deadline > now {
        std::thread::sleep(deadline - now);
    }
}

/// Monotonic sleep wrapper used everywhere else in the crate a fixed
/// delay is needed (the handshake's 30ms key-word gap, the 1s
/// inter-attempt delay). A thin wrapper rather than calling
/// `std::thread::sleep` directly so every blocking wait in the crate is
/// traceable to one place.
pub fn sleep(d: Duration) {
    std::thread::sleep(d);
}

/// Sets a serial port's baud rate, mapping the adapter driver's rejection
/// of non-standard rates (notably 8800 baud, used by the 964's Motronic
/// M2.1) into a [`crate::KLineError`].
///
/// Tries the portable [`serialport::SerialPort::set_baud_rate`] first.
/// On macOS, if that fails for the 8800 baud rate FTDI-based adapters
/// use for the 964's Motronic M2.1, `raw_fd` lets the caller fall back
/// to the `IOSSIOSPEED` ioctl the way
/// `original_source/kwp1281/serial_port.py::_set_baudrate_macos` does. On
/// any other platform, or for any other rate, or when no raw descriptor
/// is available, the portable setter's error is surfaced directly: there
/// is no further recovery path, and `connect` treats this as fatal for
/// the attempt.
pub fn set_baud_rate(
    port: &mut dyn serialport::SerialPort,
    baud: u32,
    #[cfg_attr(not(target_os = "macos"), allow(unused_variables))] raw_fd: Option<
        std::os::raw::c_int,
    >,
) -> Result<(), crate::KLineError> {
    match port.set_baud_rate(baud) {
        Ok(()) => Ok(()),
        Err(e) => {
            #[cfg(target_os = "macos")]
            if baud == 8800 {
                if let Some(fd) = raw_fd {
                    return macos_ioctl::set_baud_rate_ioctl(fd, baud);
                }
            }
            Err(crate::KLineError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                e.to_string(),
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ten_bit_times_complete_within_one_tick_of_two_seconds() {
        let start = Instant::now();
        sleep_bit_times(10);
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(2000));
        assert!(
            elapsed < Duration::from_millis(2100),
            "5-baud wake took {:?}, expected ~2.000s",
            elapsed
        );
    }
}
