//! Conversion from digit-major to segment-major frames.
//!
//! Most controllers are addressed by digit: the byte at address `n` holds the segments of digit
//! `n`.  Some boards (the 16 button TM1638 board in particular) are wired the other way around, so
//! that the byte at address `s` holds segment `s` of every digit, one bit per digit.  Driving those
//! boards means transposing the 8x8 bit matrix of the frame before it is sent.

/// Transpose a frame of `N` digits (`N <= 8`) into `N` segment bytes.
///
/// Bit `N - 1 - j` of `segments[s]` is bit `s` of `digits[j]`, so the leftmost digit ends up in
/// the most significant bit in use.  Getting the bit order backwards mirrors the display
/// left-to-right.
///
/// This is not its own inverse.
pub fn transpose<const N: usize>(digits: &[u8; N]) -> [u8; N] {
    debug_assert!(N <= 8, "a segment byte only has room for 8 digits");

    let mut segments = [0u8; N];

    for (segment, out) in segments.iter_mut().enumerate() {
        for (digit, code) in digits.iter().enumerate() {
            *out |= ((code >> segment) & 1) << (N - 1 - digit);
        }
    }

    segments
}

/// Exchange the high and low nibbles of a segment byte.
///
/// Some clones of the 16 button board have their digits wired in two swapped groups of four.
pub const fn swap_nibbles(byte: u8) -> u8 {
    byte.rotate_left(4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leftmost_digit_lands_in_high_bit() {
        let mut digits = [0u8; 8];
        digits[0] = 0xFF;

        assert_eq!([0x80; 8], transpose(&digits));
    }

    #[test]
    fn rightmost_digit_lands_in_low_bit() {
        let mut digits = [0u8; 8];
        digits[7] = 0xFF;

        assert_eq!([0x01; 8], transpose(&digits));
    }

    #[test]
    fn one_segment_per_digit() {
        // Digit j lights only segment j: a diagonal, which comes back as the mirror diagonal
        let digits = [0x01, 0x02, 0x04, 0x08, 0x10, 0x20, 0x40, 0x80];
        assert_eq!(
            [0x80, 0x40, 0x20, 0x10, 0x08, 0x04, 0x02, 0x01],
            transpose(&digits)
        );
    }

    #[test]
    fn glyphs() {
        // "1" (segments b and c) in the second digit, "-" (segment g) in the last
        let mut digits = [0u8; 8];
        digits[1] = 0x06;
        digits[7] = 0x40;

        let segments = transpose(&digits);

        assert_eq!(0x00, segments[0]); // a
        assert_eq!(0x40, segments[1]); // b
        assert_eq!(0x40, segments[2]); // c
        assert_eq!(0x01, segments[6]); // g
        assert_eq!(0x00, segments[7]); // dp
    }

    #[test]
    fn not_self_inverse() {
        let digits = [0x01, 0, 0, 0, 0, 0, 0, 0];
        assert_ne!(digits, transpose(&transpose(&digits)));
    }

    #[test]
    fn narrow_frames() {
        // Four digits use the low four bits of each segment byte
        let digits = [0x01, 0x00, 0x00, 0x03];
        assert_eq!([0b1001, 0b0001, 0, 0], transpose(&digits));
    }

    #[test]
    fn nibbles() {
        assert_eq!(0x21, swap_nibbles(0x12));
        assert_eq!(0x0F, swap_nibbles(0xF0));
        assert_eq!(0xAA, swap_nibbles(0xAA));
    }
}
