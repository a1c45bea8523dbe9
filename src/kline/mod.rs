//! The K-Line transport: owns the serial device, performs the 5-baud
//! wake-up and key-word handshake, and implements the per-byte
//! inverted-echo I/O that every block exchange rides on.
//!
//! Grounded on `original_source/kwp1281/serial_port.py`'s `KLineSerial`
//! for behavior, and on `SlCanDevice`
//! (`src/hardware/slcan/device.rs`) for the Rust shape of a serial-backed
//! transport.

mod error;
#[cfg(test)]
pub(crate) mod fake;

pub use error::{KLineError, KLineResult};

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::io::{Read, Write};
use std::time::Duration;

use crate::timing::{self, INTERBYTE_TIMEOUT};

/// Configuration for opening a K-Line transport.
#[derive(Debug, Copy, Clone)]
pub struct KLineConfig {
    /// Whether "K-Line HIGH" maps to the modem control line being
    /// *deasserted*. Matches the OBDPlot/ScanTool interface wiring;
    /// default `true`.
    pub inverted: bool,
    /// Inter-byte timeout applied to all post-handshake reads.
    pub interbyte_timeout: Duration,
}

impl Default for KLineConfig {
    fn default() -> Self {
        Self {
            inverted: true,
            interbyte_timeout: INTERBYTE_TIMEOUT,
        }
    }
}

/// Owns the serial device and speaks the K-Line physical/link layer:
/// the 5-baud wake-up, the key-word handshake, and per-byte
/// inverted-echo reads/writes.
pub struct KLineTransport {
    port: Box<dyn serialport::SerialPort>,
    /// Raw descriptor of the underlying device, captured at open time
    /// on unix targets only, so [`timing::set_baud_rate`] can reach the
    /// macOS `IOSSIOSPEED` ioctl fallback without downcasting the
    /// trait object.
    #[cfg(unix)]
    raw_fd: std::os::unix::io::RawFd,
    cfg: KLineConfig,
}

impl Debug for KLineTransport {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        f.debug_struct("KLineTransport")
            .field("cfg", &self.cfg)
            .finish()
    }
}

impl KLineTransport {
    /// Opens `port_name` 8-N-1, no flow control, and clears both modem
    /// control lines and both I/O buffers, matching
    /// `KLineSerial.open`.
    pub fn open(port_name: &str, cfg: KLineConfig) -> KLineResult<Self> {
        let builder = serialport::new(port_name, 9600)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .timeout(cfg.interbyte_timeout);

        #[cfg(unix)]
        let (mut port, raw_fd): (Box<dyn serialport::SerialPort>, std::os::unix::io::RawFd) = {
            use std::os::unix::io::AsRawFd;
            let native = builder.open_native()?;
            let raw_fd = native.as_raw_fd();
            (Box::new(native), raw_fd)
        };
        #[cfg(not(unix))]
        let mut port: Box<dyn serialport::SerialPort> = builder.open()?;

        port.write_data_terminal_ready(false)?;
        port.write_request_to_send(false)?;
        port.clear(serialport::ClearBuffer::All)?;

        log::debug!("K-Line transport opened on {port_name} (inverted={})", cfg.inverted);

        #[cfg(unix)]
        return Ok(Self { port, raw_fd, cfg });
        #[cfg(not(unix))]
        return Ok(Self { port, cfg });
    }

    /// Builds a transport directly from an already-open
    /// `serialport::SerialPort` implementation, bypassing `open`'s
    /// device-enumeration and line-reset steps.
    ///
    /// Exists for tests (and callers wiring up an alternate
    /// `serialport::SerialPort` implementation, such as a scripted fake
    /// peer) that want to exercise the handshake/echo/block machinery
    /// without a real device file. The macOS raw-descriptor fallback in
    /// [`timing::set_baud_rate`] is unreachable through a transport built
    /// this way, since there is no real file descriptor to pass it.
    pub fn with_port(port: Box<dyn serialport::SerialPort>, cfg: KLineConfig) -> Self {
        #[cfg(unix)]
        return Self { port, raw_fd: -1, cfg };
        #[cfg(not(unix))]
        return Self { port, cfg };
    }

    /// Drives the K-Line via the modem control line, honoring the
    /// configured polarity: with `inverted`, a logical HIGH corresponds
    /// to the line being deasserted.
    pub fn assert_kline(&mut self, high: bool) -> KLineResult<()> {
        let rts = if self.cfg.inverted { !high } else { high };
        self.port.write_request_to_send(rts)?;
        Ok(())
    }

    /// Bit-bangs the 10-bit 5-baud address frame directly on the modem
    /// control line: start bit LOW, 8 data bits LSB-first, stop bit
    /// HIGH. Exactly 10 * 200ms: each bit boundary is anchored to a
    /// single start instant (see [`timing::sleep_until`]) rather than
    /// chained via 10 independent sleeps, so scheduler overshoot on one
    /// bit can't accumulate into the next. Flushes both buffers
    /// immediately after the stop bit so that any garbage collected
    /// during the 2-second wake is discarded before the handshake
    /// begins.
    pub fn send_5baud(&mut self, address: u8) -> KLineResult<()> {
        log::debug!("5-baud wake-up: address 0x{address:02X}");
        let start = std::time::Instant::now();
        let deadline = |bit_index: u32| start + timing::BIT_TIME * bit_index;

        self.assert_kline(false)?;
        timing::sleep_until(deadline(1));

        for i in 0..8 {
            let bit = (address >> i) & 1 == 1;
            self.assert_kline(bit)?;
            timing::sleep_until(deadline(2 + i));
        }

        self.assert_kline(true)?;
        timing::sleep_until(deadline(10));

        self.port.clear(serialport::ClearBuffer::All)?;
        Ok(())
    }

    /// Switches the port to `baud` (via [`timing::set_baud_rate`], which
    /// includes the non-portable fallback path), then performs the
    /// key-word handshake: waits for sync 0x55 within 1s, receives
    /// key-word 1 and replies with its complement, receives key-word 2,
    /// waits the mandatory 30ms, then sends key-word 2's complement.
    /// Returns the `(kw1, kw2)` pair.
    pub fn handshake(&mut self, baud: u32) -> KLineResult<(u8, u8)> {
        #[cfg(unix)]
        let raw_fd = Some(self.raw_fd);
        #[cfg(not(unix))]
        let raw_fd = None;
        timing::set_baud_rate(self.port.as_mut(), baud, raw_fd)?;
        log::debug!("handshake: switched to {baud} baud, awaiting sync byte");

        let sync = self.read_byte(timing::SYNC_TIMEOUT)?;
        if sync != 0x55 {
            log::warn!("handshake: expected sync 0x55, got 0x{sync:02X}");
            return Err(KLineError::BadSync(sync));
        }

        let kw1 = self.recv_with_echo()?;
        let kw2 = self.read_byte(self.cfg.interbyte_timeout)?;
        log::debug!("handshake: key words kw1=0x{kw1:02X} kw2=0x{kw2:02X}");

        timing::sleep(timing::KEYWORD_ACK_DELAY);
        self.write_byte(!kw2)?;

        Ok((kw1, kw2))
    }

    /// Reads a single byte, overriding the port timeout for the
    /// duration of the call.
    pub fn read_byte(&mut self, timeout: Duration) -> KLineResult<u8> {
        self.port.set_timeout(timeout)?;
        let mut buf = [0u8; 1];
        match self.port.read(&mut buf) {
            Ok(1) => Ok(buf[0]),
            Ok(_) => Err(KLineError::Timeout),
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Err(KLineError::Timeout),
            Err(e) => Err(KLineError::Io(e)),
        }
    }

    /// Writes a single raw byte with no echo expectation.
    pub fn write_byte(&mut self, b: u8) -> KLineResult<()> {
        self.port.write_all(&[b])?;
        self.port.flush()?;
        Ok(())
    }

    /// Writes `b`, then reads within the inter-byte timeout and fails
    /// unless the peer echoed `!b`.
    pub fn send_with_echo(&mut self, b: u8) -> KLineResult<()> {
        self.write_byte(b)?;
        let expected = !b;
        let got = self.read_byte(self.cfg.interbyte_timeout)?;
        if got != expected {
            return Err(KLineError::EchoMismatch {
                sent: b,
                expected,
                got,
            });
        }
        Ok(())
    }

    /// Reads a byte within the inter-byte timeout, writes its
    /// complement back, and returns the byte read.
    pub fn recv_with_echo(&mut self) -> KLineResult<u8> {
        let b = self.read_byte(self.cfg.interbyte_timeout)?;
        self.write_byte(!b)?;
        Ok(b)
    }

    /// The configured inter-byte timeout.
    pub fn interbyte_timeout(&self) -> Duration {
        self.cfg.interbyte_timeout
    }

    /// Overrides the inter-byte timeout used by [`Self::send_with_echo`]
    /// and [`Self::recv_with_echo`]. Adaptation writes need this raised
    /// to [`timing::ADAPTATION_TIMEOUT`] since the ECU may pause for an
    /// EEPROM write before ACKing.
    pub fn set_interbyte_timeout(&mut self, timeout: Duration) {
        self.cfg.interbyte_timeout = timeout;
    }
}
