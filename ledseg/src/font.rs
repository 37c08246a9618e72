//! Fonts that map lower ASCII chars to the segments of 7 and 14 segment displays.
//!
//! Every table is indexed by `char - FONT_BASE` and covers the printable range from space up to
//! and including `z`.  Anything outside that range is reported as
//! [`FormatError::OutOfRangeGlyph`] by [`Font::lookup`]; the formatting code recovers from that by
//! substituting the `'0'` glyph (see [`Font::glyph_or_default`]).

use crate::format::FormatError;

/// The bit pattern for one digit position.  Bit 0 is segment `a`.  7 segment glyphs only use the
/// low byte.
pub type SegmentCode = u16;

/// First ASCII char covered by the font tables (space)
pub const FONT_BASE: u8 = 0x20;

/// One past the last ASCII char covered by the font tables (`z` is the last one)
pub const FONT_END: u8 = 0x7B;

/// The kinds of display with a font bundled in this crate.
///
/// Modules with nine or sixteen segments per digit are driven with a [`Font::custom`] table.
#[derive(Copy, Clone, Debug, PartialEq, Eq, strum::VariantArray)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayType {
    /// Classic 7 segment digits plus a decimal point, `(dp)gfedcba`
    SevenSegment,

    /// 14 segment alphanumeric digits plus a decimal point, `dp-nmlkjh-g2-g1-fedcba`
    FourteenSegment,
}

impl DisplayType {
    /// The font used to render text on this kind of display
    pub const fn font(self) -> Font {
        match self {
            Self::SevenSegment => Font::SEVEN_SEGMENT,
            Self::FourteenSegment => Font::FOURTEEN_SEGMENT,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Glyphs {
    Narrow(&'static [u8]),
    Wide(&'static [u16]),
}

/// A font table together with the bit that lights the decimal point on that kind of display.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Font {
    glyphs: Glyphs,
    decimal_point: Option<SegmentCode>,
}

impl Font {
    pub const SEVEN_SEGMENT: Font = Font {
        glyphs: Glyphs::Narrow(SEVEN_SEGMENT_FONT_TABLE),
        decimal_point: Some(0x0080),
    };

    pub const FOURTEEN_SEGMENT: Font = Font {
        glyphs: Glyphs::Wide(FOURTEEN_SEGMENT_FONT_TABLE),
        decimal_point: Some(0x4000),
    };

    /// Use a caller supplied table, for instance for 9 or 16 segment modules.
    ///
    /// `table[0]` must be the glyph for space.  `decimal_point` is the bit that lights the point
    /// next to a digit; pass `None` for displays that have no such segment, in which case `.` is
    /// always rendered as a glyph of its own.
    pub const fn custom(table: &'static [u16], decimal_point: Option<SegmentCode>) -> Self {
        Self {
            glyphs: Glyphs::Wide(table),
            decimal_point,
        }
    }

    /// The bit that lights the decimal point, if this display has one
    pub fn decimal_point(&self) -> Option<SegmentCode> {
        self.decimal_point
    }

    /// How many bytes each digit takes on the wire
    pub fn bytes_per_digit(&self) -> usize {
        match self.glyphs {
            Glyphs::Narrow(_) => 1,
            Glyphs::Wide(_) => 2,
        }
    }

    /// Look up the segments for `c`.
    pub fn lookup(&self, c: char) -> Result<SegmentCode, FormatError> {
        if !c.is_ascii() {
            return Err(FormatError::OutOfRangeGlyph(c));
        }

        let ascii = c as u8;
        if !(FONT_BASE..FONT_END).contains(&ascii) {
            return Err(FormatError::OutOfRangeGlyph(c));
        }

        let index = (ascii - FONT_BASE) as usize;
        let code = match self.glyphs {
            Glyphs::Narrow(table) => table.get(index).map(|b| *b as SegmentCode),
            Glyphs::Wide(table) => table.get(index).copied(),
        };

        code.ok_or(FormatError::OutOfRangeGlyph(c))
    }

    /// Look up the segments for `c`, rendering a `0` if the font doesn't cover it.
    pub fn glyph_or_default(&self, c: char) -> SegmentCode {
        match self.lookup(c) {
            Ok(code) => code,
            Err(_e) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("{}: rendering '0' instead", _e);

                self.lookup('0').unwrap_or(0)
            }
        }
    }

    /// Segments for a single hex digit.  Only the low nibble of `nibble` is used.
    ///
    /// `b` and `d` are rendered in lower case so they can't be mistaken for `8` and `0`.
    pub fn hex_lookup(&self, nibble: u8) -> SegmentCode {
        let c = match nibble & 0x0F {
            n @ 0..=9 => (b'0' + n) as char,
            10 => 'A',
            11 => 'b',
            12 => 'C',
            13 => 'd',
            14 => 'E',
            _ => 'F',
        };

        self.glyph_or_default(c)
    }
}

/// Font Data Table, map of ASCII values/table to 7-segment, offset to position 32.
const SEVEN_SEGMENT_FONT_TABLE: &[u8] = &[
    0x00, /* (space) */
    0x86, /* ! */
    0x22, /* " */
    0x7E, /* # */
    0x6D, /* $ */
    0xD2, /* % */
    0x46, /* & */
    0x20, /* ' */
    0x29, /* ( */
    0x0B, /* ) */
    0x21, /* * */
    0x70, /* + */
    0x10, /* , */
    0x40, /* - */
    0x80, /* . */
    0x52, /* / */
    0x3F, /* 0 */
    0x06, /* 1 */
    0x5B, /* 2 */
    0x4F, /* 3 */
    0x66, /* 4 */
    0x6D, /* 5 */
    0x7D, /* 6 */
    0x07, /* 7 */
    0x7F, /* 8 */
    0x6F, /* 9 */
    0x09, /* : */
    0x0D, /* ; */
    0x61, /* < */
    0x48, /* = */
    0x43, /* > */
    0xD3, /* ? */
    0x5F, /* @ */
    0x77, /* A */
    0x7C, /* B */
    0x39, /* C */
    0x5E, /* D */
    0x79, /* E */
    0x71, /* F */
    0x3D, /* G */
    0x76, /* H */
    0x30, /* I */
    0x1E, /* J */
    0x75, /* K */
    0x38, /* L */
    0x15, /* M */
    0x37, /* N */
    0x3F, /* O */
    0x73, /* P */
    0x6B, /* Q */
    0x33, /* R */
    0x6D, /* S */
    0x78, /* T */
    0x3E, /* U */
    0x3E, /* V */
    0x2A, /* W */
    0x76, /* X */
    0x6E, /* Y */
    0x5B, /* Z */
    0x39, /* [ */
    0x64, /* \ */
    0x0F, /* ] */
    0x23, /* ^ */
    0x08, /* _ */
    0x02, /* ` */
    0x5F, /* a */
    0x7C, /* b */
    0x58, /* c */
    0x5E, /* d */
    0x7B, /* e */
    0x71, /* f */
    0x6F, /* g */
    0x74, /* h */
    0x10, /* i */
    0x0C, /* j */
    0x75, /* k */
    0x30, /* l */
    0x14, /* m */
    0x54, /* n */
    0x5C, /* o */
    0x73, /* p */
    0x67, /* q */
    0x50, /* r */
    0x6D, /* s */
    0x78, /* t */
    0x1C, /* u */
    0x1C, /* v */
    0x14, /* w */
    0x76, /* x */
    0x6E, /* y */
    0x5B, /* z */
];

/// Font Data Table, map of ASCII values/table to 14-segment, offset to position 32.
const FOURTEEN_SEGMENT_FONT_TABLE: &[u16] = &[
    0x0000, 0x4006, 0x0202, 0x12CE, 0x12ED, 0x3FE4, 0x2359, 0x0200, 0x2400, 0x0900, /* space - ) */
    0x3FC0, 0x12C0, 0x0800, 0x00C0, 0x4000, 0x0C00, 0x0C3F, 0x0406, 0x00DB, 0x008F, /* * - 3 */
    0x00E6, 0x00ED, 0x00FD, 0x0007, 0x00FF, 0x00EF, 0x1200, 0x0A00, 0x2440, 0x00C8, /* 4 - = */
    0x0980, 0x5083, 0x02BB, 0x00F7, 0x128F, 0x0039, 0x120F, 0x0079, 0x0071, 0x00BD, /* > - G */
    0x00F6, 0x1209, 0x001E, 0x2470, 0x0038, 0x0536, 0x2136, 0x003F, 0x00F3, 0x203F, /* H - Q */
    0x20F3, 0x00ED, 0x1201, 0x003E, 0x0C30, 0x2836, 0x2D00, 0x00EE, 0x0C09, 0x0039, /* R - [ */
    0x2100, 0x000F, 0x2800, 0x0008, 0x0100, 0x1058, 0x2078, 0x00D8, 0x088E, 0x0858, /* \ - e */
    0x14C0, 0x048E, 0x1070, 0x1000, 0x0A10, 0x3600, 0x0030, 0x10D4, 0x1050, 0x00DC, /* f - o */
    0x0170, 0x0486, 0x0050, 0x2088, 0x0078, 0x001C, 0x0810, 0x2814, 0x2D00, 0x028E, /* p - y */
    0x0848, /* z */
];
