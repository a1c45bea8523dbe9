//! Errors produced by the K-Line transport, independent of the block
//! protocol layered on top of it.

/// Error kinds the K-Line transport itself can produce. The driver maps
/// these onto [`crate::DiagError`] variants of the same name.
#[derive(Debug, thiserror::Error)]
pub enum KLineError {
    /// No byte arrived within the active read's timeout window.
    #[error("timed out waiting for a byte")]
    Timeout,
    /// `send_with_echo` received a byte that was not the bitwise
    /// complement of the byte just written.
    #[error("echo mismatch: sent 0x{sent:02X}, expected complement 0x{expected:02X}, got 0x{got:02X}")]
    EchoMismatch {
        /// The byte this side transmitted.
        sent: u8,
        /// The complement that should have come back.
        expected: u8,
        /// The byte that actually came back.
        got: u8,
    },
    /// The first byte read after the post-init baud-rate switch was not
    /// the 0x55 sync byte.
    #[error("expected sync byte 0x55, got 0x{0:02X}")]
    BadSync(u8),
    /// An OS-level serial port failure.
    #[error("serial I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for K-Line transport operations.
pub type KLineResult<T> = Result<T, KLineError>;

/// Folds a `serialport` crate error into the same [`KLineError::Io`]
/// variant a raw `std::io::Error` would produce, so every fallible
/// `serialport::SerialPort` call in [`super::KLineTransport`] can use
/// `?` directly rather than a per-call `.map_err(...)`.
impl From<serialport::Error> for KLineError {
    fn from(e: serialport::Error) -> Self {
        KLineError::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))
    }
}
