//! Key hashing for shard placement.
//!
//! Keys are hashed with the IEEE CRC-32 used by zlib, so existing cache roots
//! keep mapping keys to the same files.

/// Reflected CRC-32 polynomial (IEEE 802.3).
const CRC32_POLY: u32 = 0xEDB8_8320;

/// Precomputed CRC-32 lookup table (256 entries).
const CRC32_TABLE: [u32; 256] = {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u32;
        let mut j = 0;
        while j < 8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ CRC32_POLY;
            } else {
                crc >>= 1;
            }
            j += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
};

/// Computes CRC-32 over the given byte slice.
///
/// LSB-first with init and final xor of `0xFFFFFFFF`.
pub fn crc32(data: &[u8]) -> u32 {
    let mut crc: u32 = 0xFFFF_FFFF;
    for &byte in data {
        let idx = ((crc ^ byte as u32) & 0xFF) as usize;
        crc = (crc >> 8) ^ CRC32_TABLE[idx];
    }
    crc ^ 0xFFFF_FFFF
}

/// Derives the 31-bit shard hash of a key.
///
/// The low 16 bits of the checksum are discarded and the sign bit cleared.
pub fn hash(key: &str) -> u32 {
    (crc32(key.as_bytes()) >> 16) & 0x7FFF_FFFF
}
