//! Memory and I/O bus interface.

/// Memory and I/O bus interface.
///
/// The CPU unit calls into this trait for every memory access and every
/// `IN`/`OUT`. The bus handles address decoding and routing to ROM, RAM and
/// the ULA port. All addresses are 16-bit, so every value is in range.
pub trait Bus {
    /// Read a byte from the given address.
    fn read(&mut self, address: u16) -> u8;

    /// Write a byte to the given address.
    fn write(&mut self, address: u16, value: u8);

    /// Read from an I/O port (full 16-bit port address).
    fn io_read(&mut self, port: u16) -> u8;

    /// Write to an I/O port (full 16-bit port address).
    fn io_write(&mut self, port: u16, value: u8);
}
