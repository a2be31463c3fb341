//! Frame checksum: CRC32 (IEEE 802.3, reflected).
//!
//! ```rust
//! use xchat::core::Crc32;
//!
//! let header = [1u8, 2, 0, 0, 0, 0, 0, 7];
//! let checksum = Crc32::compute_slices(&[&header, b"echo: a"]);
//! assert!(Crc32::verify_slices(&[&header, b"echo: a"], checksum));
//! ```

const POLY: u32 = 0xEDB8_8320;

const TABLE: [u32; 256] = build_table();

const fn build_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut n = 0;
    while n < table.len() {
        let mut value = n as u32;
        let mut bit = 0;
        while bit < 8 {
            value = if value & 1 == 1 { (value >> 1) ^ POLY } else { value >> 1 };
            bit += 1;
        }
        table[n] = value;
        n += 1;
    }
    table
}

/// Running CRC32 over one or more buffers.
#[derive(Debug, Clone, Copy)]
pub struct Crc32 {
    register: u32,
}

impl Crc32 {
    pub const fn new() -> Self {
        Self { register: !0 }
    }

    pub fn update(&mut self, data: &[u8]) {
        self.register = data.iter().fold(self.register, |reg, &byte| {
            (reg >> 8) ^ TABLE[((reg ^ byte as u32) & 0xFF) as usize]
        });
    }

    pub const fn finalize(self) -> u32 {
        !self.register
    }

    pub fn compute(data: &[u8]) -> u32 {
        Self::compute_slices(&[data])
    }

    /// Checksum of the concatenation of `slices`, so a header and its payload
    /// need not be copied into one buffer.
    pub fn compute_slices(slices: &[&[u8]]) -> u32 {
        let mut crc = Self::new();
        slices.iter().for_each(|slice| crc.update(slice));
        crc.finalize()
    }

    pub fn verify_slices(slices: &[&[u8]], expected: u32) -> bool {
        Self::compute_slices(slices) == expected
    }
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_value() {
        assert_eq!(Crc32::compute(b""), 0);
        assert_eq!(Crc32::compute(b"123456789"), 0xCBF4_3926);
    }

    #[test]
    fn test_chunked_update() {
        let mut crc = Crc32::new();
        crc.update(b"received ");
        crc.update(b"3 messages");
        assert_eq!(crc.finalize(), Crc32::compute(b"received 3 messages"));
    }

    #[test]
    fn test_header_and_payload_slices() {
        let header = [1u8, 2, 0, 0];
        let checksum = Crc32::compute_slices(&[&header, b"echo: b"]);

        assert_eq!(checksum, Crc32::compute(b"\x01\x02\x00\x00echo: b"));
        assert!(Crc32::verify_slices(&[&header, b"echo: b"], checksum));
        assert!(!Crc32::verify_slices(&[&header, b"echo: c"], checksum));
    }
}
