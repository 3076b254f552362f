/// Internet checksum (RFC 1071) over `bytes`, read as big-endian 16-bit words.
///
/// An odd trailing byte is padded with zero. Run over a header whose checksum field
/// is already filled in, the result is zero when the header is intact. To stamp a
/// header, zero the field, compute, and write the result back with `to_be_bytes`.
pub fn checksum(bytes: &[u8]) -> u16 {
    let mut words = bytes.chunks_exact(2);
    let mut sum = words.by_ref().fold(0u32, |acc, x| {
        acc + u32::from(u16::from_be_bytes([x[0], x[1]]))
    });
    if let [last] = words.remainder() {
        sum += u32::from(*last) << 8;
    }
    while sum >> 16 != 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }
    !(sum as u16)
}
