//! A scripted fake serial port backing [`super::KLineTransport`] in unit
//! and integration tests, standing in for the real K-Line device the
//! the way `SimulationIsoTpChannel`
//! (`src/hardware/simulation.rs`) stands in for a real CAN adapter.
//! `#[cfg(test)]`-only: never compiled into the published crate.

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::time::Duration;

use crate::block::Block;

/// A fully pre-scripted peer: every byte the transport will read is
/// pushed onto `rx` by the test in advance, in the exact order the
/// protocol will consume it; every byte the transport writes is
/// appended to `tx` for the test to assert against. No byte written
/// ever feeds back into `rx` — by construction time the test already
/// knows what each echo byte must be (the bitwise complement of
/// whatever the transport is about to send).
#[derive(Debug, Default)]
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

    pub fn push_rx(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes.iter().copied());
    }

    /// Appends the inverted-echo complements expected back immediately
    /// after the transport transmits `bytes` via `send_with_echo`.
    pub fn push_echo_of(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes.iter().map(|b| !b));
    }

    /// Scripts the echoes [`Block::transmit`] expects back while sending
    /// `block`: every byte except the terminator.
    pub fn push_echo_of_block(&mut self, block: &Block) {
        let encoded = block.encode();
        let (_, rest) = encoded.split_last().expect("block always has a terminator");
        self.push_echo_of(rest);
    }

    /// Scripts a full inbound block, raw, as [`crate::block::decode`]
    /// will read it off the wire.
    pub fn push_inbound_block(&mut self, block: &Block) {
        self.push_rx(&block.encode());
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
