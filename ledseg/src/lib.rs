//! Drivers for LED segment display controllers (TM1637, TM1638, HT16K33, MAX7219), built around
//! a shared engine that turns text and numbers into segment codes.
//!
//! The engine ([`format`], [`buffer`], [`font`], [`transpose`]) is plain synchronous code with no
//! I/O.  The drivers are `async` and implement [`SegmentDisplay`], which layers the engine over a
//! single "write these digits" operation:
//!
//! ```
//! # use ledseg::{Alignment, Error, Font, SegmentCode, SegmentDisplay};
//! # struct Recorder([SegmentCode; 8]);
//! # impl SegmentDisplay for Recorder {
//! #     type BusError = core::convert::Infallible;
//! #     fn digit_count(&self) -> usize { 8 }
//! #     fn font(&self) -> Font { Font::SEVEN_SEGMENT }
//! #     async fn write_digits(&mut self, start: usize, codes: &[SegmentCode]) -> Result<(), Error<Self::BusError>> {
//! #         self.0[start..start + codes.len()].copy_from_slice(codes);
//! #         Ok(())
//! #     }
//! # }
//! # let mut display = Recorder([0; 8]);
//! # embassy_futures::block_on(async {
//! display.display_integer(-45, Alignment::RightZeroFilled).await?;
//! display.display_text("abc.d.efgh", 0, Alignment::Left).await?;
//! # Ok::<(), Error<core::convert::Infallible>>(())
//! # }).unwrap();
//! ```
#![no_std]
#![allow(async_fn_in_trait)]

pub mod buffer;
mod bus;
pub mod font;
pub mod format;
pub mod ht16k33;
mod keys;
pub mod max7219;
pub mod tm1637;
mod tm1638;
pub mod transpose;

pub use buffer::{DigitBuffer, MAX_DIGITS};
pub use bus::*;
pub use font::{DisplayType, Font, SegmentCode};
pub use format::{Alignment, FormatError};
pub use keys::*;
pub use tm1638::*;

/// Errors reported by the display drivers
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// The bus reported an error
    Transport(E),

    /// The value couldn't be rendered
    Format(FormatError),

    /// The digits don't fit on the display when written starting at this position
    InvalidPosition(usize),

    /// The board doesn't have the hardware for this operation
    Unsupported,
}

impl<E> From<FormatError> for Error<E> {
    fn from(e: FormatError) -> Self {
        Error::Format(e)
    }
}

/// A display made of a row of digits, which can be sent segment codes.
///
/// Implementors only provide [`Self::write_digits`] and a description of the display; everything
/// else is done with the formatting engine.  The `display_*` methods fill the whole display,
/// leftmost digit first.
pub trait SegmentDisplay {
    type BusError;

    /// The number of digit positions on the display
    fn digit_count(&self) -> usize;

    /// The font for this kind of display
    fn font(&self) -> Font;

    /// Send `codes` to the digits starting at `start`.
    ///
    /// Fails with [`Error::InvalidPosition`] if the codes run off the end of the display.
    async fn write_digits(
        &mut self,
        start: usize,
        codes: &[SegmentCode],
    ) -> Result<(), Error<Self::BusError>>;

    /// Send a buffer built by the formatting engine, starting at `start`
    async fn display_buffer<const N: usize>(
        &mut self,
        start: usize,
        buffer: &DigitBuffer<N>,
    ) -> Result<(), Error<Self::BusError>> {
        self.write_digits(start, buffer.codes()).await
    }

    /// Show `text`, lighting the decimal points selected by `dots` (leftmost digit in bit 7).
    ///
    /// See [`format::format_string`] for how dots in the text are handled.  Returns the number of
    /// dots from `text` that were merged into a digit.
    async fn display_text(
        &mut self,
        text: &str,
        dots: u8,
        alignment: Alignment,
    ) -> Result<usize, Error<Self::BusError>> {
        let (mut buffer, dots_consumed) =
            format::format_string::<MAX_DIGITS>(&self.font(), text, self.digit_count(), alignment)?;
        buffer.apply_dots(dots);

        self.display_buffer(0, &buffer).await?;
        Ok(dots_consumed)
    }

    async fn display_integer(
        &mut self,
        value: i32,
        alignment: Alignment,
    ) -> Result<(), Error<Self::BusError>> {
        self.display_integer_with_dots(value, 0, alignment).await
    }

    /// Show `value` with the decimal points selected by `dots` lit
    async fn display_integer_with_dots(
        &mut self,
        value: i32,
        dots: u8,
        alignment: Alignment,
    ) -> Result<(), Error<Self::BusError>> {
        let mut buffer = format::format_integer::<MAX_DIGITS>(
            &self.font(),
            value,
            self.digit_count(),
            alignment,
        )?;
        buffer.apply_dots(dots);

        self.display_buffer(0, &buffer).await
    }

    /// Show two decimal numbers side by side, each on half of the display
    async fn display_nibbles(
        &mut self,
        upper: u16,
        lower: u16,
        dots: u8,
        alignment: Alignment,
    ) -> Result<(), Error<Self::BusError>> {
        let mut buffer = format::format_nibble_pair::<MAX_DIGITS>(
            &self.font(),
            upper,
            lower,
            self.digit_count() / 2,
            alignment,
        )?;
        buffer.apply_dots(dots);

        self.display_buffer(0, &buffer).await
    }

    /// Show two hex numbers side by side, each on half of the display
    async fn display_hex_nibbles(
        &mut self,
        upper: u16,
        lower: u16,
        dots: u8,
        alignment: Alignment,
    ) -> Result<(), Error<Self::BusError>> {
        let mut buffer = format::format_hex_nibble_pair::<MAX_DIGITS>(
            &self.font(),
            upper,
            lower,
            self.digit_count() / 2,
            alignment,
        )?;
        buffer.apply_dots(dots);

        self.display_buffer(0, &buffer).await
    }

    /// Show `value` with `fraction_digits` digits after the point
    async fn display_fixed_point(
        &mut self,
        value: f32,
        fraction_digits: u8,
        alignment: Alignment,
    ) -> Result<(), Error<Self::BusError>> {
        let buffer = format::format_fixed_point::<MAX_DIGITS>(
            &self.font(),
            value,
            fraction_digits,
            self.digit_count(),
            alignment,
        )?;

        self.display_buffer(0, &buffer).await
    }

    /// Blank every digit
    async fn clear(&mut self) -> Result<(), Error<Self::BusError>> {
        let buffer =
            DigitBuffer::<MAX_DIGITS>::blank(self.digit_count(), self.font().decimal_point())?;

        self.display_buffer(0, &buffer).await
    }
}

/// Check that `len` digits starting at `start` fit on a display with `digit_count` digits
pub(crate) fn check_window<E>(
    start: usize,
    len: usize,
    digit_count: usize,
) -> Result<(), Error<E>> {
    match start.checked_add(len) {
        Some(end) if end <= digit_count => Ok(()),
        _ => {
            #[cfg(feature = "defmt")]
            defmt::warn!(
                "{} digits at position {} don't fit on a {} digit display",
                len,
                start,
                digit_count
            );

            Err(Error::InvalidPosition(start))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windows() {
        assert_eq!(Ok(()), check_window::<()>(0, 8, 8));
        assert_eq!(Ok(()), check_window::<()>(6, 2, 8));
        assert_eq!(Ok(()), check_window::<()>(8, 0, 8));
        assert_eq!(Err(Error::InvalidPosition(7)), check_window::<()>(7, 2, 8));
        assert_eq!(
            Err(Error::InvalidPosition(usize::MAX)),
            check_window::<()>(usize::MAX, 1, 8)
        );
    }

    #[test]
    fn format_errors_convert() {
        let e: Error<()> = FormatError::ValueTooWide.into();
        assert_eq!(Error::Format(FormatError::ValueTooWide), e);
    }
}
