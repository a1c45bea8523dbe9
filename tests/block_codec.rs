//! Exercises the block codec and transport echo machinery end-to-end
//! over a scripted fake serial port, standing in for the real K-Line
//! device the way the teacher's `tests/software_isotp_sim.rs` drives a
//! software channel pair instead of real CAN hardware.

mod common;

use common::FakeLoopbackPort;
use kwp1281::block::Block;
use kwp1281::kline::{KLineConfig, KLineTransport};

fn transport_over(port: FakeLoopbackPort) -> KLineTransport {
    KLineTransport::with_port(Box::new(port), KLineConfig::default())
}

#[test]
fn transmit_and_decode_round_trip_a_block_with_payload() {
    env_logger::try_init();
    let block = Block::with_payload(4, 0xE7, vec![0x2A]);

    let mut port = FakeLoopbackPort::new();
    port.push_outbound_echo(&block);
    let mut tx = transport_over(port);
    block.transmit(&mut tx).expect("well-scripted echo");

    let mut rx_port = FakeLoopbackPort::new();
    rx_port.push_inbound_block(&block);
    let mut rx = transport_over(rx_port);
    let (decoded, etx_ok) = kwp1281::block::decode(&mut rx).expect("well-formed wire bytes");
    assert!(etx_ok);
    assert_eq!(decoded, block);
}

#[test]
fn transmit_fails_on_echo_mismatch() {
    env_logger::try_init();
    let block = Block::new(1, 0x09);
    let mut port = FakeLoopbackPort::new();
    // Deliberately push the wrong complement for the length byte.
    port.push_rx(&[0x00]);
    let mut tx = transport_over(port);
    assert!(block.transmit(&mut tx).is_err());
}

#[test]
fn decode_reports_non_etx_terminator_without_failing() {
    env_logger::try_init();
    let mut block = Block::new(7, 0x09).encode();
    *block.last_mut().unwrap() = 0x00;

    let mut port = FakeLoopbackPort::new();
    port.push_rx(&block);
    let mut rx = transport_over(port);
    let (decoded, etx_ok) = kwp1281::block::decode(&mut rx).expect("still decodes despite bad terminator");
    assert!(!etx_ok);
    assert_eq!(decoded.counter, 7);
    assert_eq!(decoded.title, 0x09);
}

#[test]
fn ack_block_has_no_payload_and_four_byte_wire_length() {
    let ack = Block::new(12, 0x09);
    assert_eq!(ack.encode(), vec![0x04, 12, 0x09, 0x03]);
}
