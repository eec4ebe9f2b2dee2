use std::io;

/// Streaming FNV-1a (64-bit) digest over the encoded bytes of a ledger table.
///
/// Implements [`io::Write`] so bincode can serialize a table straight into it.
/// The value is stable across builds and machines, which the randomized std
/// and ahash hashers are not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerDigest(u64);

impl LedgerDigest {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    pub const fn new() -> Self {
        Self(Self::OFFSET_BASIS)
    }

    pub fn update(&mut self, bytes: &[u8]) {
        self.0 = bytes.iter().fold(self.0, |state, byte| {
            (state ^ u64::from(*byte)).wrapping_mul(Self::PRIME)
        });
    }

    pub const fn value(self) -> u64 {
        self.0
    }
}

impl Default for LedgerDigest {
    fn default() -> Self {
        Self::new()
    }
}

impl io::Write for LedgerDigest {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
