//! Driver for the TM1637, a 4 or 6 digit display controller with a two-wire bus.
//!
//! The bus looks like I2C without addresses: a start condition, bytes sent LSB first with an
//! acknowledge bit after each, then a stop condition.  Timing it is left to a [`Tm1637Bus`]
//! implementation; this module only decides what goes in each frame.

use crate::buffer::DigitBuffer;
use crate::font::{Font, SegmentCode};
use crate::format::{self, Alignment, FormatError};
use crate::{check_window, Error, SegmentDisplay};

/// Data command: write display RAM, auto-incrementing the address
const DATA_COMMAND: u8 = 0x40;

/// Address command for the first digit
const ADDRESS_COMMAND: u8 = 0xC0;

/// Display control command; brightness in the low three bits, display on in bit 3
const DISPLAY_CONTROL: u8 = 0x80;

const DISPLAY_ON: u8 = 0x08;

/// Maximum digits the controller can drive
const MAX_TM1637_DIGITS: usize = 6;

/// Frame-level access to the TM1637 two-wire bus.
pub trait Tm1637Bus {
    type Error;

    /// Send `bytes` between one start and one stop condition, checking the acknowledge after each
    /// byte.
    async fn write_frame(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;
}

/// The module sizes the TM1637 is used in
#[derive(Copy, Clone, Debug, PartialEq, Eq, strum::VariantArray)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Tm1637Digits {
    Four,
    Six,
}

impl Tm1637Digits {
    pub fn count(self) -> usize {
        match self {
            Self::Four => 4,
            Self::Six => 6,
        }
    }
}

pub struct Tm1637<Bus> {
    bus: Bus,
    digits: Tm1637Digits,

    /// Display control bits sent after every write
    control: u8,
}

impl<Bus: Tm1637Bus> Tm1637<Bus> {
    /// The display starts at full brightness, switched on.  Nothing is sent until the first write.
    pub fn new(bus: Bus, digits: Tm1637Digits) -> Self {
        Self {
            bus,
            digits,
            control: 0x07 | DISPLAY_ON,
        }
    }

    /// Set the brightness (0 to 7) and whether the display is on.
    ///
    /// The controller only picks this up with the next write.
    pub fn set_brightness(&mut self, brightness: u8, on: bool) {
        self.control = (brightness & 0x07) | if on { DISPLAY_ON } else { 0x00 };
    }

    /// Write raw segment bytes (`(dp)gfedcba`) starting at digit `position`.  Other digits are
    /// left alone.
    pub async fn set_segments(
        &mut self,
        segments: &[u8],
        position: usize,
    ) -> Result<(), Error<Bus::Error>> {
        check_window(position, segments.len(), self.digits.count())?;

        let mut frame = [0u8; MAX_TM1637_DIGITS + 1];
        frame[0] = ADDRESS_COMMAND | position as u8;
        frame[1..=segments.len()].copy_from_slice(segments);

        #[cfg(feature = "defmt")]
        defmt::trace!("tm1637 frame = {=[u8]:x}", &frame[..=segments.len()]);

        self.bus
            .write_frame(&[DATA_COMMAND])
            .await
            .map_err(Error::Transport)?;
        self.bus
            .write_frame(&frame[..=segments.len()])
            .await
            .map_err(Error::Transport)?;
        self.bus
            .write_frame(&[DISPLAY_CONTROL | self.control])
            .await
            .map_err(Error::Transport)
    }

    /// Show `number` right aligned in the `length` digits starting at `position`.
    ///
    /// Leading digits are blank unless `leading_zero` is set.  `dots` lights decimal points (or
    /// the colon, depending on the module) with its most significant bit on the first digit
    /// written.  Fails with [`FormatError::ValueTooWide`] if the number needs more than `length`
    /// digits.
    pub async fn display_decimal(
        &mut self,
        number: i32,
        dots: u8,
        leading_zero: bool,
        length: usize,
        position: usize,
    ) -> Result<(), Error<Bus::Error>> {
        let alignment = if leading_zero {
            Alignment::RightZeroFilled
        } else {
            Alignment::Right
        };

        let mut buffer =
            format::format_integer::<MAX_TM1637_DIGITS>(&self.font(), number, length, alignment)?;
        buffer.apply_dots(dots);

        self.display_buffer(position, &buffer).await
    }

    /// Show `text` one char per digit in the `length` digits starting at `position`.
    ///
    /// Unlike [`SegmentDisplay::display_text`], a `.` is a digit of its own here; decimal points
    /// come from `dots` only.  The text must be exactly `length` chars long.
    pub async fn display_str(
        &mut self,
        text: &str,
        dots: u8,
        length: usize,
        position: usize,
    ) -> Result<(), Error<Bus::Error>> {
        if text.chars().count() != length {
            return Err(Error::Format(FormatError::InvalidWidth));
        }

        let font = self.font();
        let mut buffer = DigitBuffer::<MAX_TM1637_DIGITS>::blank(length, font.decimal_point())?;
        for (i, c) in text.chars().enumerate() {
            buffer.set(i, font.glyph_or_default(c));
        }
        buffer.apply_dots(dots);

        self.display_buffer(position, &buffer).await
    }
}

impl<Bus: Tm1637Bus> SegmentDisplay for Tm1637<Bus> {
    type BusError = Bus::Error;

    fn digit_count(&self) -> usize {
        self.digits.count()
    }

    fn font(&self) -> Font {
        Font::SEVEN_SEGMENT
    }

    async fn write_digits(
        &mut self,
        start: usize,
        codes: &[SegmentCode],
    ) -> Result<(), Error<Self::BusError>> {
        check_window(start, codes.len(), self.digits.count())?;

        let mut segments = [0u8; MAX_TM1637_DIGITS];
        for (byte, code) in segments.iter_mut().zip(codes) {
            *byte = *code as u8;
        }

        self.set_segments(&segments[..codes.len()], start).await
    }
}
