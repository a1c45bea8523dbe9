//! A scripted fake K-Line peer used to drive [`kwp1281::kline::KLineTransport`]
//! end-to-end without a real serial device, the way the teacher's
//! `tests/software_isotp_sim.rs` drives `SoftwareIsoTpChannel` with a pair
//! of in-memory channels standing in for real CAN hardware.
//!
//! The fake is fully scripted rather than behaving like a live peer: the
//! test pre-computes exactly which bytes the transport will read at each
//! step (an inverted-echo complement immediately following one of the
//! transport's own sends, or a literal byte from a canned ECU response),
//! and pushes them onto `rx` in that exact order. `write()` calls are
//! only ever appended to `tx` for the test to assert against; they never
//! feed back into `rx` themselves, since by the time the test builds the
//! script it already knows what every echo byte must be.

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::time::Duration;

use kwp1281::block::Block;

#[derive(Debug)]
pub struct FakeLoopbackPort {
    rx: VecDeque<u8>,
    pub tx: Vec<u8>,
    timeout: Duration,
}

impl FakeLoopbackPort {
    pub fn new() -> Self {
        Self {
            rx: VecDeque::new(),
            tx: Vec::new(),
            timeout: Duration::from_millis(100),
        }
    }

    /// Appends raw bytes to the read queue.
    pub fn push_rx(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes.iter().copied());
    }

    /// Appends the inverted-echo complements the transport expects to
    /// read back immediately after transmitting `bytes` via
    /// `send_with_echo` (i.e. every byte except a block's terminator).
    pub fn push_echo_of(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes.iter().map(|b| !b));
    }

    /// Scripts a full inbound block: `L, C, T, payload.., 0x03`, read
    /// raw (as `recv_with_echo`/`read_byte` would see it arrive from the
    /// ECU).
    pub fn push_inbound_block(&mut self, block: &Block) {
        self.push_rx(&block.encode());
    }

    /// Scripts the echoes the transport expects back after transmitting
    /// `block` (every byte except the terminator).
    pub fn push_outbound_echo(&mut self, block: &Block) {
        let encoded = block.encode();
        let (_, rest) = encoded.split_last().expect("block always has a terminator");
        self.push_echo_of(rest);
    }
}

impl Default for FakeLoopbackPort {
    fn default() -> Self {
        Self::new()
    }
}

impl Read for FakeLoopbackPort {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        match self.rx.pop_front() {
            Some(b) => {
                buf[0] = b;
                Ok(1)
            }
            None => Err(io::Error::new(io::ErrorKind::TimedOut, "no scripted byte available")),
        }
    }
}

impl Write for FakeLoopbackPort {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.tx.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl serialport::SerialPort for FakeLoopbackPort {
    fn name(&self) -> Option<String> {
        Some("fake".to_string())
    }

    fn baud_rate(&self) -> serialport::Result<u32> {
        Ok(9600)
    }

    fn data_bits(&self) -> serialport::Result<serialport::DataBits> {
        Ok(serialport::DataBits::Eight)
    }

    fn flow_control(&self) -> serialport::Result<serialport::FlowControl> {
        Ok(serialport::FlowControl::None)
    }

    fn parity(&self) -> serialport::Result<serialport::Parity> {
        Ok(serialport::Parity::None)
    }

    fn stop_bits(&self) -> serialport::Result<serialport::StopBits> {
        Ok(serialport::StopBits::One)
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn set_baud_rate(&mut self, _baud_rate: u32) -> serialport::Result<()> {
        Ok(())
    }

    fn set_data_bits(&mut self, _data_bits: serialport::DataBits) -> serialport::Result<()> {
        Ok(())
    }

    fn set_flow_control(&mut self, _flow_control: serialport::FlowControl) -> serialport::Result<()> {
        Ok(())
    }

    fn set_parity(&mut self, _parity: serialport::Parity) -> serialport::Result<()> {
        Ok(())
    }

    fn set_stop_bits(&mut self, _stop_bits: serialport::StopBits) -> serialport::Result<()> {
        Ok(())
    }

    fn set_timeout(&mut self, timeout: Duration) -> serialport::Result<()> {
        self.timeout = timeout;
        Ok(())
    }

    fn write_request_to_send(&mut self, _level: bool) -> serialport::Result<()> {
        Ok(())
    }

    fn write_data_terminal_ready(&mut self, _level: bool) -> serialport::Result<()> {
        Ok(())
    }

    fn read_clear_to_send(&mut self) -> serialport::Result<bool> {
        Ok(true)
    }

    fn read_data_set_ready(&mut self) -> serialport::Result<bool> {
        Ok(true)
    }

    fn read_ring_indicator(&mut self) -> serialport::Result<bool> {
        Ok(false)
    }

    fn read_carrier_detect(&mut self) -> serialport::Result<bool> {
        Ok(false)
    }

    fn bytes_to_read(&self) -> serialport::Result<u32> {
        Ok(self.rx.len() as u32)
    }

    fn bytes_to_write(&self) -> serialport::Result<u32> {
        Ok(0)
    }

    fn clear(&self, _buffer_to_clear: serialport::ClearBuffer) -> serialport::Result<()> {
        Ok(())
    }

    fn try_clone(&self) -> serialport::Result<Box<dyn serialport::SerialPort>> {
        Err(serialport::Error::new(
            serialport::ErrorKind::Unknown,
            "try_clone is unsupported on the fake loopback port",
        ))
    }

    fn set_break(&self) -> serialport::Result<()> {
        Ok(())
    }

    fn clear_break(&self) -> serialport::Result<()> {
        Ok(())
    }
}
