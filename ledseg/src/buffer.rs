//! The digit buffer: the segment codes for a run of digit positions, exactly as they will be sent
//! to the display controller.

use crate::font::SegmentCode;
use crate::format::FormatError;

/// Number of digit positions on the largest display supported by the drivers in this crate
pub const MAX_DIGITS: usize = 8;

/// Segment codes for a window of `width` digit positions, leftmost first.
///
/// The buffer has room for `N` positions; `width` of them are in use.  Positions that nothing has
/// been written to are blank (all segments off).  The decimal point bit of the font the buffer was
/// built with is remembered so dots can be turned on and off without knowing the font.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DigitBuffer<const N: usize = MAX_DIGITS> {
    codes: [SegmentCode; N],
    width: usize,
    decimal_point: Option<SegmentCode>,
}

impl<const N: usize> DigitBuffer<N> {
    /// A blank window of `width` positions.
    ///
    /// Fails with [`FormatError::InvalidWidth`] if `width` is larger than `N`.
    pub fn blank(width: usize, decimal_point: Option<SegmentCode>) -> Result<Self, FormatError> {
        if width > N {
            return Err(FormatError::InvalidWidth);
        }

        Ok(Self {
            codes: [0; N],
            width,
            decimal_point,
        })
    }

    /// The number of positions in the window
    pub fn width(&self) -> usize {
        self.width
    }

    /// The codes for every position in the window, leftmost first
    pub fn codes(&self) -> &[SegmentCode] {
        &self.codes[..self.width]
    }

    pub fn get(&self, position: usize) -> Option<SegmentCode> {
        self.codes().get(position).copied()
    }

    /// Replace the code at `position`.  Writes outside the window are ignored.
    pub fn set(&mut self, position: usize, code: SegmentCode) {
        if let Some(slot) = self.codes[..self.width].get_mut(position) {
            *slot = code;
        }
    }

    /// Light the decimal point at `position`, leaving the rest of the glyph alone.
    pub fn set_decimal_point(&mut self, position: usize) {
        if let Some(dp) = self.decimal_point {
            if let Some(slot) = self.codes[..self.width].get_mut(position) {
                *slot |= dp;
            }
        }
    }

    pub fn has_decimal_point(&self, position: usize) -> bool {
        match (self.decimal_point, self.get(position)) {
            (Some(dp), Some(code)) => code & dp != 0,
            _ => false,
        }
    }

    /// Turn on the decimal points selected by `mask`.
    ///
    /// The most significant bit corresponds to the leftmost position of the window, so position
    /// `i` is controlled by bit `7 - i`.  Positions without a glyph still get a dot, which is how a
    /// lone point or colon is shown.  Dots are never turned off by this.
    pub fn apply_dots(&mut self, mask: u8) {
        for position in 0..self.width.min(8) {
            if (mask >> (7 - position)) & 1 != 0 {
                self.set_decimal_point(position);
            }
        }
    }

    /// Copy `other` into this window starting at `start`.  Anything that doesn't fit is dropped.
    pub(crate) fn splice(&mut self, start: usize, other: &[SegmentCode]) {
        for (slot, code) in self.codes[..self.width]
            .iter_mut()
            .skip(start)
            .zip(other.iter())
        {
            *slot = *code;
        }
    }

    /// Serialize the window for the wire, one byte per digit for fonts which fit in a byte and two
    /// bytes (low byte first) otherwise.
    ///
    /// Returns the number of bytes written to `bytes`, which stops early if `bytes` is too small.
    pub fn write_wire_bytes(&self, bytes_per_digit: usize, bytes: &mut [u8]) -> usize {
        let mut written = 0;

        for code in self.codes() {
            if written + bytes_per_digit > bytes.len() {
                break;
            }

            bytes[written] = (code & 0x00FF) as u8;
            if bytes_per_digit > 1 {
                bytes[written + 1] = (code >> 8) as u8;
            }
            written += bytes_per_digit;
        }

        written
    }
}
