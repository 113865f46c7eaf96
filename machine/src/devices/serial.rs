/// Byte-level access to a serial device. Defaults make a write-only or
/// absent device trivial to express.
pub trait SerialOps {
    /// Write one byte to serial without translation.
    fn write_byte(&self, _byte: u8) {}
    /// Wait until the TX FIFO is empty, aka all characters have been put on the
    /// line.
    fn flush(&self) {}
}
