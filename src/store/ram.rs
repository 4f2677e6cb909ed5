use super::Store;

/// Volatile store backed by a byte vector.
///
/// Counts physical byte writes so wear-sensitive code paths can be checked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RamStore {
    memory: Vec<u8>,
    writes: usize,
}

impl RamStore {
    /// Zero-initialized store.
    pub fn new(capacity: usize) -> Self {
        Self::filled(capacity, 0)
    }

    /// Store whose cells all hold `pattern`, like never-written media.
    pub fn filled(capacity: usize, pattern: u8) -> Self {
        Self {
            memory: vec![pattern; capacity],
            writes: 0,
        }
    }

    /// Physical byte writes since construction.
    pub fn writes(&self) -> usize {
        self.writes
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.memory
    }
}

impl Store for RamStore {
    fn capacity(&self) -> usize {
        self.memory.len()
    }

    fn read_byte(&self, offset: usize) -> u8 {
        self.memory[offset]
    }

    fn write_byte(&mut self, offset: usize, value: u8) {
        self.memory[offset] = value;
        self.writes += 1;
    }

    fn write_byte_if_changed(&mut self, offset: usize, value: u8) -> bool {
        if self.memory[offset] == value {
            return false;
        }
        self.write_byte(offset, value);
        true
    }

    fn clear(&mut self) {
        for offset in 0..self.memory.len() {
            self.write_byte(offset, 0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_store_is_zeroed() {
        let store = RamStore::new(16);
        assert_eq!(store.capacity(), 16);
        assert!(store.as_bytes().iter().all(|&b| b == 0));
        assert!(!store.expiring_media());
    }

    #[test]
    fn conditional_write_skips_equal_bytes() {
        let mut store = RamStore::new(2);
        assert!(!store.write_byte_if_changed(0, 0));
        assert_eq!(store.writes(), 0);
        assert!(store.write_byte_if_changed(0, 5));
        assert_eq!(store.writes(), 1);
        assert_eq!(store.read_byte(0), 5);
    }

    #[test]
    fn clear_zero_fills() {
        let mut store = RamStore::filled(3, 0xFF);
        store.clear();
        assert_eq!(store.as_bytes(), &[0, 0, 0]);
    }
}
