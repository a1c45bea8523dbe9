//! macOS-only fallback for setting the non-standard 8800 baud rate some
//! adapters reject through the portable `tcsetattr`-based path.
//!
//! Grounded on `original_source/kwp1281/serial_port.py::_set_baudrate_macos`,
//! which performs the same `IOSSIOSPEED` ioctl via `fcntl.ioctl` on the
//! port's file descriptor.

use std::os::raw::c_int;

/// `IOSSIOSPEED`, from `<IOKit/serial/ioss.h>`: sets an arbitrary baud
/// rate on a macOS serial device, bypassing the fixed `termios` rate
/// table that rejects 8800.
const IOSSIOSPEED: libc::c_ulong = 0x8004_5402;

/// Issues the `IOSSIOSPEED` ioctl directly on `fd`.
pub(super) fn set_baud_rate_ioctl(fd: c_int, baud: u32) -> Result<(), crate::KLineError> {
    let speed: libc::speed_t = baud as libc::speed_t;
    let ret = unsafe { libc::ioctl(fd, IOSSIOSPEED, std::ptr::from_ref(&speed)) };
    if ret != 0 {
        return Err(crate::KLineError::Io(std::io::Error::last_os_error()));
    }
    Ok(())
}
