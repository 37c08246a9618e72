//! Turn text and numbers into [`DigitBuffer`]s.
//!
//! There are two overflow policies here, on purpose:
//!
//! - Text that is longer than the display is truncated without complaint, so `"1234567890abc"` on
//!   an 8 digit display shows `12345678`.
//! - Numbers that don't fit are rejected with [`FormatError::ValueTooWide`] and nothing is
//!   rendered, since showing part of a number shows a different number.

use core::fmt::{self, Write};

use heapless::String;

use crate::buffer::DigitBuffer;
use crate::font::{Font, SegmentCode};

/// Room for any `i32` or `u16` in decimal, and for fixed point numbers that fit on a display
const SCRATCH_LEN: usize = 32;

/// Where formatted content goes when it is narrower than the window
#[derive(Copy, Clone, Debug, PartialEq, Eq, strum::VariantArray)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Alignment {
    /// Content starts at the leftmost position, blanks after it
    Left,

    /// Content ends at the rightmost position, blanks before it
    Right,

    /// Content ends at the rightmost position, zeros before it (after the sign, if any).
    ///
    /// Only meaningful for integers.
    RightZeroFilled,
}

/// Reasons a value can't be rendered
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FormatError {
    /// The font has no glyph for this char
    OutOfRangeGlyph(char),

    /// The number needs more digits than the window has
    ValueTooWide,

    /// The alignment makes no sense for this kind of value
    UnsupportedAlignment,

    /// The window is wider than the buffer or the display
    InvalidWidth,
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRangeGlyph(c) => write!(f, "character {c:?} is outside the font"),
            Self::ValueTooWide => f.write_str("value has too many digits for the display"),
            Self::UnsupportedAlignment => f.write_str("alignment not supported for this value"),
            Self::InvalidWidth => f.write_str("window is wider than the display"),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum Radix {
    Decimal,
    Hex,
}

/// Format an integer into a window `width` digits wide.
///
/// The sign of a negative number takes up a position of its own.  With
/// [`Alignment::RightZeroFilled`] the zeros go between the sign and the digits, so `-45` in four
/// digits is `-045`.
pub fn format_integer<const N: usize>(
    font: &Font,
    value: i32,
    width: usize,
    alignment: Alignment,
) -> Result<DigitBuffer<N>, FormatError> {
    format_number(font, value, Radix::Decimal, width, alignment)
}

/// Split the window into two halves `width_each` digits wide and format a decimal number into each.
///
/// The halves are formatted independently, with the same alignment, and either can fail with
/// [`FormatError::ValueTooWide`].
pub fn format_nibble_pair<const N: usize>(
    font: &Font,
    upper: u16,
    lower: u16,
    width_each: usize,
    alignment: Alignment,
) -> Result<DigitBuffer<N>, FormatError> {
    format_pair(font, upper, lower, Radix::Decimal, width_each, alignment)
}

/// Like [`format_nibble_pair`], but both numbers are shown in hex.
pub fn format_hex_nibble_pair<const N: usize>(
    font: &Font,
    upper: u16,
    lower: u16,
    width_each: usize,
    alignment: Alignment,
) -> Result<DigitBuffer<N>, FormatError> {
    format_pair(font, upper, lower, Radix::Hex, width_each, alignment)
}

/// Render `text` into a window `width` digits wide.
///
/// Each char takes one position, except that a `.` right after some other char lights the decimal
/// point of that char instead.  A `.` after another `.`, or at the very start, is shown as a glyph
/// of its own.  So `"abc.d.efgh"` fills eight positions with dots under `c` and `d`, while `"..."`
/// is three dot glyphs.  Fonts without a decimal point always show `.` as a glyph.
///
/// Anything which doesn't fit is dropped.  Chars the font doesn't cover are shown as `0`.
///
/// Returns the buffer and the number of `.` chars that were merged into the previous digit.
pub fn format_string<const N: usize>(
    font: &Font,
    text: &str,
    width: usize,
    alignment: Alignment,
) -> Result<(DigitBuffer<N>, usize), FormatError> {
    let (buffer, rendered) = layout_text(font, text, width, alignment)?;

    Ok((buffer, rendered.dots))
}

/// Render `value` with exactly `fraction_digits` digits after the point, in a window `width`
/// digits wide.
///
/// The point shares a position with the digit before it.  Fails with [`FormatError::ValueTooWide`]
/// if the integer digits, the fraction digits and the sign need more than `width` positions,
/// including when rounding adds a digit (`9.99` to one place is `10.0`).
pub fn format_fixed_point<const N: usize>(
    font: &Font,
    value: f32,
    fraction_digits: u8,
    width: usize,
    alignment: Alignment,
) -> Result<DigitBuffer<N>, FormatError> {
    if alignment == Alignment::RightZeroFilled {
        return Err(FormatError::UnsupportedAlignment);
    }

    if !value.is_finite() {
        return Err(FormatError::ValueTooWide);
    }

    // `as` truncates towards zero, which is the integer part we want
    let int_len = decimal_len((value as i32).unsigned_abs());
    let required = int_len + fraction_digits as usize + usize::from(value < 0.0);
    if required > width {
        #[cfg(feature = "defmt")]
        defmt::debug!("{=f32} needs {} digits, window is {}", value, required, width);

        return Err(FormatError::ValueTooWide);
    }

    let mut text: String<SCRATCH_LEN> = String::new();
    write!(text, "{:.*}", fraction_digits as usize, value)
        .map_err(|_| FormatError::ValueTooWide)?;

    let (buffer, rendered) = layout_text(font, &text, width, alignment)?;
    if rendered.truncated {
        return Err(FormatError::ValueTooWide);
    }

    Ok(buffer)
}

/// Text after the dots have been folded in, before it is aligned
struct RenderedText<const N: usize> {
    codes: [SegmentCode; N],
    len: usize,
    dots: usize,
    truncated: bool,
}

fn layout_text<const N: usize>(
    font: &Font,
    text: &str,
    width: usize,
    alignment: Alignment,
) -> Result<(DigitBuffer<N>, RenderedText<N>), FormatError> {
    if alignment == Alignment::RightZeroFilled {
        return Err(FormatError::UnsupportedAlignment);
    }

    let mut buffer = DigitBuffer::blank(width, font.decimal_point())?;
    let rendered = render_text::<N>(font, text, width);

    let start = match alignment {
        Alignment::Right => width - rendered.len,
        _ => 0,
    };
    buffer.splice(start, &rendered.codes[..rendered.len]);

    Ok((buffer, rendered))
}

/// Convert `text` to segment codes, at most `width` of them (`width` must not exceed `N`).
fn render_text<const N: usize>(font: &Font, text: &str, width: usize) -> RenderedText<N> {
    let mut rendered = RenderedText {
        codes: [0; N],
        len: 0,
        dots: 0,
        truncated: false,
    };
    let mut previous: Option<char> = None;

    for c in text.chars() {
        let follows_glyph = matches!(previous, Some(p) if p != '.');
        previous = Some(c);

        match font.decimal_point() {
            Some(dp) if c == '.' && follows_glyph => {
                // Light the point of the digit we just rendered rather than using up a position
                if let Some(last) = rendered.codes[..rendered.len].last_mut() {
                    *last |= dp;
                    rendered.dots += 1;
                }
            }
            _ => {
                if rendered.len == width {
                    rendered.truncated = true;
                    break;
                }

                rendered.codes[rendered.len] = font.glyph_or_default(c);
                rendered.len += 1;
            }
        }
    }

    #[cfg(feature = "defmt")]
    if rendered.truncated {
        defmt::debug!("text truncated to {} digits", width);
    }

    rendered
}

fn format_pair<const N: usize>(
    font: &Font,
    upper: u16,
    lower: u16,
    radix: Radix,
    width_each: usize,
    alignment: Alignment,
) -> Result<DigitBuffer<N>, FormatError> {
    let width = width_each
        .checked_mul(2)
        .ok_or(FormatError::InvalidWidth)?;
    let mut buffer = DigitBuffer::<N>::blank(width, font.decimal_point())?;

    let upper: DigitBuffer<N> = format_number(font, upper, radix, width_each, alignment)?;
    let lower: DigitBuffer<N> = format_number(font, lower, radix, width_each, alignment)?;

    buffer.splice(0, upper.codes());
    buffer.splice(width_each, lower.codes());

    Ok(buffer)
}

fn format_number<const N: usize, T>(
    font: &Font,
    value: T,
    radix: Radix,
    width: usize,
    alignment: Alignment,
) -> Result<DigitBuffer<N>, FormatError>
where
    T: fmt::Display + fmt::UpperHex,
{
    let mut buffer = DigitBuffer::blank(width, font.decimal_point())?;

    let mut digits: String<SCRATCH_LEN> = String::new();
    match radix {
        Radix::Decimal => write!(digits, "{value}"),
        Radix::Hex => write!(digits, "{value:X}"),
    }
    .map_err(|_| FormatError::ValueTooWide)?;

    if digits.len() > width {
        #[cfg(feature = "defmt")]
        defmt::debug!("{=str} doesn't fit in {} digits", digits.as_str(), width);

        return Err(FormatError::ValueTooWide);
    }

    let glyph = |c: char| match (radix, c.to_digit(16)) {
        (Radix::Hex, Some(nibble)) => font.hex_lookup(nibble as u8),
        _ => font.glyph_or_default(c),
    };
    let padding = width - digits.len();

    match alignment {
        Alignment::Left => {
            for (position, c) in digits.chars().enumerate() {
                buffer.set(position, glyph(c));
            }
        }
        Alignment::Right => {
            for (position, c) in digits.chars().enumerate() {
                buffer.set(padding + position, glyph(c));
            }
        }
        Alignment::RightZeroFilled => {
            let (sign, magnitude) = match digits.strip_prefix('-') {
                Some(magnitude) => (1, magnitude),
                None => (0, digits.as_str()),
            };

            if sign == 1 {
                buffer.set(0, glyph('-'));
            }
            for position in sign..sign + padding {
                buffer.set(position, glyph('0'));
            }
            for (position, c) in magnitude.chars().enumerate() {
                buffer.set(sign + padding + position, glyph(c));
            }
        }
    }

    Ok(buffer)
}

fn decimal_len(value: u32) -> usize {
    value.checked_ilog10().map_or(1, |log| log as usize + 1)
}
