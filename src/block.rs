//! The KWP1281 block codec: `[L, C, T, D0..Dn, 0x03]`.
//!
//! Grounded on `original_source/kwp1281/protocol.py`'s `_send_block` /
//! `_recv_block`, expressed here as a standalone [`Block`] value plus a
//! transport-coupled decoder (each payload byte needs a live echo
//! round-trip, so a pure `&[u8] -> Block` parse can't drive the wire —
//! see [`decode_from_slice`] for the pure half used by tests and the
//! simulator).

use crate::kline::KLineTransport;
use crate::DiagResult;

/// The protocol's terminator byte. Not individually acknowledged.
pub const ETX: u8 = 0x03;

/// A single KWP1281 block: counter, title, and payload. The length byte
/// and terminator are implicit in [`Block::encode`] / [`decode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// Modulo-256 sequence counter.
    pub counter: u8,
    /// Command/response title byte.
    pub title: u8,
    /// Payload bytes, excluding length/counter/title/terminator.
    pub payload: Vec<u8>,
}

impl Block {
    /// Builds a block with no payload (ACK, NAK, EndComm, ...).
    pub fn new(counter: u8, title: u8) -> Self {
        Self {
            counter,
            title,
            payload: Vec::new(),
        }
    }

    /// Builds a block carrying `payload`.
    pub fn with_payload(counter: u8, title: u8, payload: Vec<u8>) -> Self {
        Self {
            counter,
            title,
            payload,
        }
    }

    /// Serializes to `[L, C, T, payload.., 0x03]`. `L` counts every byte
    /// in the output including itself and the terminator.
    pub fn encode(&self) -> Vec<u8> {
        let length = (self.payload.len() + 3 + 1) as u8;
        let mut out = Vec::with_capacity(length as usize);
        out.push(length);
        out.push(self.counter);
        out.push(self.title);
        out.extend_from_slice(&self.payload);
        out.push(ETX);
        out
    }

    /// Transmits this block over `transport`: every byte except the
    /// terminator goes through [`KLineTransport::send_with_echo`]; the
    /// terminator is a plain write with no echo expected.
    pub fn transmit(&self, transport: &mut KLineTransport) -> DiagResult<()> {
        let encoded = self.encode();
        let (last, rest) = encoded
            .split_last()
            .expect("encoded block always has at least 4 bytes");
        for &b in rest {
            transport.send_with_echo(b)?;
        }
        transport.write_byte(*last)?;
        Ok(())
    }
}

/// Receives one block from `transport`. Every byte up to and including
/// the last payload byte is read via
/// [`KLineTransport::recv_with_echo`]; the terminator is read with
/// [`KLineTransport::read_byte`] and is **not** echoed — echoing it
/// would desynchronize the next block's length byte. A terminator other
/// than [`ETX`] is logged by the caller and the block is returned
/// anyway: some ECUs emit a non-`0x03` terminator on certain internal
/// errors, and the response is then treated as lossy by the driver
/// rather than as a hard decode failure.
///
/// Returns the decoded block plus whether the terminator matched `ETX`.
pub fn decode(transport: &mut KLineTransport) -> DiagResult<(Block, bool)> {
    let length = transport.recv_with_echo()?;
    let counter = transport.recv_with_echo()?;
    let title = transport.recv_with_echo()?;

    // `length` counts L, C, T and the terminator; the remaining bytes
    // still to read are `length - 3`, of which the last is the
    // terminator.
    let remaining = length.saturating_sub(3) as usize;
    let mut payload = Vec::with_capacity(remaining.saturating_sub(1));
    for i in 0..remaining {
        if i + 1 < remaining {
            payload.push(transport.recv_with_echo()?);
        } else {
            let etx = transport.read_byte(transport.interbyte_timeout())?;
            let ok = etx == ETX;
            return Ok((Block::with_payload(counter, title, payload), ok));
        }
    }

    // `remaining == 0` only happens for a malformed length byte (no
    // terminator at all); treat it as an immediate desync.
    Ok((Block::with_payload(counter, title, payload), false))
}

/// Parses a well-formed, already-collected byte sequence into a
/// [`Block`], with no transport or echo involved. Used by tests
/// exercising the round-trip law and by the simulator, which never
/// drives a live echo handshake.
pub fn decode_from_slice(bytes: &[u8]) -> Option<Block> {
    if bytes.len() < 4 {
        return None;
    }
    let length = bytes[0] as usize;
    if length != bytes.len() - 1 {
        return None;
    }
    if bytes[bytes.len() - 1] != ETX {
        return None;
    }
    let counter = bytes[1];
    let title = bytes[2];
    let payload = bytes[3..bytes.len() - 1].to_vec();
    Some(Block::with_payload(counter, title, payload))
}
