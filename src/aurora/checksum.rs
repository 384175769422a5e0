/// CRC-16/X-25 over frame bytes: polynomial 0x8408 processed LSB-first,
/// register seeded with 0xFFFF, final complement, transmitted little-endian.
/// Every request carries it over its 8 payload bytes, every response over
/// its first 6.
pub fn compute(data: &[u8]) -> [u8; 2] {
    crc16::State::<crc16::X_25>::calculate(data).to_le_bytes()
}

/// Checks the trailing two bytes of `frame` against the CRC of everything
/// before them. Frames too short to carry a checksum never verify.
pub fn verify(frame: &[u8]) -> bool {
    if frame.len() < 2 {
        return false;
    }
    let (payload, trailer) = frame.split_at(frame.len() - 2);
    compute(payload) == [trailer[0], trailer[1]]
}
