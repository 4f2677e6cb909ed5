//! Byte-addressable non-volatile storage.
//!
//! The log engine only consumes the [`Store`] contract; hardware backends
//! (EEPROM, FRAM, ...) live outside this crate. [`RamStore`] is a volatile
//! reference implementation for tests and host-side simulation.

mod ram;

pub use ram::RamStore;

/// A contiguous, byte-addressable region of storage media.
///
/// Offsets are relative to the start of the region. Multi-byte values are
/// repeated byte operations at consecutive offsets, little-endian.
pub trait Store {
    /// Number of bytes in the region.
    fn capacity(&self) -> usize;

    fn read_byte(&self, offset: usize) -> u8;

    /// Write unconditionally.
    fn write_byte(&mut self, offset: usize, value: u8);

    /// Write only if the stored byte differs; returns whether a write
    /// happened.
    fn write_byte_if_changed(&mut self, offset: usize, value: u8) -> bool;

    /// Zero-fill the whole region.
    fn clear(&mut self);

    /// True if cells wear out after a limited number of writes.
    fn expiring_media(&self) -> bool {
        false
    }

    fn read_bytes(&self, offset: usize, buf: &mut [u8]) {
        for (i, byte) in buf.iter_mut().enumerate() {
            *byte = self.read_byte(offset + i);
        }
    }

    fn write_bytes(&mut self, offset: usize, bytes: &[u8]) {
        for (i, &byte) in bytes.iter().enumerate() {
            self.write_byte(offset + i, byte);
        }
    }

    /// Conditional write of every byte; true if any byte changed.
    fn update_bytes(&mut self, offset: usize, bytes: &[u8]) -> bool {
        let mut changed = false;
        for (i, &byte) in bytes.iter().enumerate() {
            changed |= self.write_byte_if_changed(offset + i, byte);
        }
        changed
    }

    fn read_u16(&self, offset: usize) -> u16 {
        let mut buf = [0u8; 2];
        self.read_bytes(offset, &mut buf);
        u16::from_le_bytes(buf)
    }

    fn update_u16(&mut self, offset: usize, value: u16) -> bool {
        self.update_bytes(offset, &value.to_le_bytes())
    }
}

impl<S: Store + ?Sized> Store for Box<S> {
    fn capacity(&self) -> usize {
        (**self).capacity()
    }

    fn read_byte(&self, offset: usize) -> u8 {
        (**self).read_byte(offset)
    }

    fn write_byte(&mut self, offset: usize, value: u8) {
        (**self).write_byte(offset, value)
    }

    fn write_byte_if_changed(&mut self, offset: usize, value: u8) -> bool {
        (**self).write_byte_if_changed(offset, value)
    }

    fn clear(&mut self) {
        (**self).clear()
    }

    fn expiring_media(&self) -> bool {
        (**self).expiring_media()
    }
}
