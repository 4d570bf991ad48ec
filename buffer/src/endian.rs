//! Big-endian encoding and byte-order reversal for 16/32/64-bit integers.
//!
//! Little-endian forms are always derived by reversing the big-endian form,
//! so both byte orders share one encoding path.

/// Encodes a 16-bit value most-significant byte first.
pub fn short_to_bytes(v: i16) -> [u8; 2] {
    v.to_be_bytes()
}

/// Encodes a 16-bit value least-significant byte first.
pub fn short_to_bytes_le(v: i16) -> [u8; 2] {
    short_to_bytes(reverse_short(v))
}

/// Decodes a big-endian 16-bit value.
pub fn short_from_bytes(b: [u8; 2]) -> i16 {
    i16::from_be_bytes(b)
}

/// Encodes a 32-bit value most-significant byte first.
pub fn int_to_bytes(v: i32) -> [u8; 4] {
    v.to_be_bytes()
}

/// Encodes a 32-bit value least-significant byte first.
pub fn int_to_bytes_le(v: i32) -> [u8; 4] {
    int_to_bytes(reverse_int(v))
}

/// Decodes a big-endian 32-bit value.
pub fn int_from_bytes(b: [u8; 4]) -> i32 {
    i32::from_be_bytes(b)
}

/// Encodes a 64-bit value most-significant byte first.
pub fn long_to_bytes(v: i64) -> [u8; 8] {
    v.to_be_bytes()
}

/// Encodes a 64-bit value least-significant byte first.
pub fn long_to_bytes_le(v: i64) -> [u8; 8] {
    long_to_bytes(reverse_long(v))
}

/// Decodes a big-endian 64-bit value.
pub fn long_from_bytes(b: [u8; 8]) -> i64 {
    i64::from_be_bytes(b)
}

/// Reverses the byte order of a 16-bit value.
pub fn reverse_short(v: i16) -> i16 {
    v.swap_bytes()
}

/// Reverses the byte order of a 32-bit value.
pub fn reverse_int(v: i32) -> i32 {
    v.swap_bytes()
}

/// Reverses the byte order of a 64-bit value.
pub fn reverse_long(v: i64) -> i64 {
    v.swap_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_big_endian_layout() {
        assert_eq!(short_to_bytes(0x0102), [0x01, 0x02]);
        assert_eq!(int_to_bytes(0x0102_0304), [0x01, 0x02, 0x03, 0x04]);
        assert_eq!(
            long_to_bytes(0x0102_0304_0506_0708),
            [1, 2, 3, 4, 5, 6, 7, 8]
        );
    }

    #[test]
    fn test_little_endian_layout() {
        assert_eq!(short_to_bytes_le(0x0102), [0x02, 0x01]);
        assert_eq!(int_to_bytes_le(0x0102_0304), [0x04, 0x03, 0x02, 0x01]);
        assert_eq!(
            long_to_bytes_le(0x0102_0304_0506_0708),
            [8, 7, 6, 5, 4, 3, 2, 1]
        );
    }

    #[test]
    fn test_reverse_sign_bits() {
        assert_eq!(reverse_short(0x00ff), -256);
        assert_eq!(reverse_int(0x0000_00ff), 0xff00_0000u32 as i32);
        assert_eq!(reverse_long(-1), -1);
        assert_eq!(reverse_long(0x80), i64::MIN);
    }

    proptest! {
        #[test]
        fn prop_le_is_reversed_be(s: i16, i: i32, l: i64) {
            let mut be = short_to_bytes(s);
            be.reverse();
            prop_assert_eq!(short_to_bytes_le(s), be);

            let mut be = int_to_bytes(i);
            be.reverse();
            prop_assert_eq!(int_to_bytes_le(i), be);

            let mut be = long_to_bytes(l);
            be.reverse();
            prop_assert_eq!(long_to_bytes_le(l), be);
        }

        #[test]
        fn prop_reverse_is_involution(s: i16, i: i32, l: i64) {
            prop_assert_eq!(reverse_short(reverse_short(s)), s);
            prop_assert_eq!(reverse_int(reverse_int(i)), i);
            prop_assert_eq!(reverse_long(reverse_long(l)), l);
            prop_assert_eq!(short_from_bytes(short_to_bytes(s)), s);
            prop_assert_eq!(int_from_bytes(int_to_bytes(i)), i);
            prop_assert_eq!(long_from_bytes(long_to_bytes(l)), l);
        }
    }
}
