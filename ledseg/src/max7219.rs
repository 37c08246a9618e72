//! Driver for the MAX7219 on an SPI bus, driving a module of up to eight 7 segment digits.
//!
//! The chip numbers its digit registers from the right, and wires its segments in
//! `DP A B C D E F G` order, the reverse of the `(dp)gfedcba` layout used by the rest of this
//! crate.  [`to_register_order`] does the conversion.
//!
//! The chip can also decode BCD ("Code B") on any of its digits; see [`DecodeMode`] and
//! [`Max7219::display_bcd_text`].

use embedded_hal_async::spi::SpiDevice;
use strum_macros::FromRepr;

use crate::buffer::MAX_DIGITS;
use crate::font::{Font, SegmentCode};
use crate::format::FormatError;
use crate::{check_window, Error, SegmentDisplay};

pub const MAX_INTENSITY: u8 = 0x0F;

/// Intensity set by [`Max7219::init`]
pub const DEFAULT_INTENSITY: u8 = 0x08;

/// Bit 7 of a digit register lights the decimal point in both decode modes
const DECIMAL_POINT: u8 = 0x80;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Register {
    Noop = 0x00,
    Digit0 = 0x01,
    Digit1 = 0x02,
    Digit2 = 0x03,
    Digit3 = 0x04,
    Digit4 = 0x05,
    Digit5 = 0x06,
    Digit6 = 0x07,
    Digit7 = 0x08,
    DecodeMode = 0x09,
    Intensity = 0x0A,
    ScanLimit = 0x0B,
    Shutdown = 0x0C,
    DisplayTest = 0x0F,
}

/// Which digits the chip decodes as BCD.  Digit 0 is the rightmost one.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum DecodeMode {
    #[default]
    NoDecode = 0x00,
    CodeBDigit0 = 0x01,
    CodeBDigits3_0 = 0x0F,
    CodeBDigits7_0 = 0xFF,
}

impl DecodeMode {
    /// Whether the digit at `register` (1 to 8) is decoded
    fn decodes(self, register: u8) -> bool {
        (self as u8) & (1 << (register - 1)) != 0
    }
}

/// The characters of the chip's built in BCD font
#[derive(Copy, Clone, Debug, PartialEq, Eq, FromRepr, strum::VariantArray)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum CodeB {
    Zero = 0x00,
    One = 0x01,
    Two = 0x02,
    Three = 0x03,
    Four = 0x04,
    Five = 0x05,
    Six = 0x06,
    Seven = 0x07,
    Eight = 0x08,
    Nine = 0x09,
    Dash = 0x0A,
    E = 0x0B,
    H = 0x0C,
    L = 0x0D,
    P = 0x0E,
    Blank = 0x0F,
}

impl CodeB {
    /// The Code B character for `c`, if the font has one.  Letters match in either case.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '0'..='9' => c.to_digit(10).and_then(|d| Self::from_repr(d as u8)),
            '-' => Some(Self::Dash),
            'E' | 'e' => Some(Self::E),
            'H' | 'h' => Some(Self::H),
            'L' | 'l' => Some(Self::L),
            'P' | 'p' => Some(Self::P),
            ' ' => Some(Self::Blank),
            _ => None,
        }
    }
}

/// Convert a `(dp)gfedcba` segment byte to the chip's `DP A B C D E F G` order
pub const fn to_register_order(code: u8) -> u8 {
    (code & DECIMAL_POINT) | ((code & !DECIMAL_POINT).reverse_bits() >> 1)
}

pub struct Max7219<SPI> {
    spi: SPI,
    digits: usize,
    decode_mode: DecodeMode,
}

impl<SPI: SpiDevice> Max7219<SPI> {
    /// A module with `digits` digits (1 to 8).  Nothing is sent until [`Self::init`].
    pub fn new(spi: SPI, digits: usize) -> Result<Self, Error<SPI::Error>> {
        if digits == 0 || digits > MAX_DIGITS {
            return Err(Error::Format(FormatError::InvalidWidth));
        }

        Ok(Self {
            spi,
            digits,
            decode_mode: DecodeMode::NoDecode,
        })
    }

    pub fn release(self) -> SPI {
        self.spi
    }

    pub fn decode_mode(&self) -> DecodeMode {
        self.decode_mode
    }

    /// Bring the chip out of shutdown with the scan limit set to the number of digits, the given
    /// decode mode, [`DEFAULT_INTENSITY`] and a blank display.
    pub async fn init(&mut self, decode_mode: DecodeMode) -> Result<(), Error<SPI::Error>> {
        #[cfg(feature = "defmt")]
        defmt::debug!(
            "max7219: init, {} digits, decode mode {}",
            self.digits,
            decode_mode
        );

        self.display_test(false).await?;
        self.write_register(Register::ScanLimit, (self.digits - 1) as u8)
            .await?;
        self.set_decode_mode(decode_mode).await?;
        self.clear().await?;
        self.set_intensity(DEFAULT_INTENSITY).await?;
        self.shutdown(false).await
    }

    pub async fn set_decode_mode(&mut self, mode: DecodeMode) -> Result<(), Error<SPI::Error>> {
        self.decode_mode = mode;
        self.write_register(Register::DecodeMode, mode as u8).await
    }

    /// Blank every digit, whichever decode mode it is in
    pub async fn clear(&mut self) -> Result<(), Error<SPI::Error>> {
        for register in 1..=self.digits as u8 {
            let blank = if self.decode_mode.decodes(register) {
                CodeB::Blank as u8
            } else {
                0x00
            };

            self.write_raw_register(register, blank).await?;
        }

        Ok(())
    }

    /// Set one of the 16 brightness levels.  Anything above [`MAX_INTENSITY`] is clamped.
    pub async fn set_intensity(&mut self, intensity: u8) -> Result<(), Error<SPI::Error>> {
        let intensity = if intensity > MAX_INTENSITY {
            #[cfg(feature = "defmt")]
            defmt::warn!(
                "Intensity {} out of range, using {}",
                intensity,
                MAX_INTENSITY
            );

            MAX_INTENSITY
        } else {
            intensity
        };

        self.write_register(Register::Intensity, intensity).await
    }

    /// Enter (`true`) or leave (`false`) shutdown.  Register contents survive shutdown.
    pub async fn shutdown(&mut self, shutdown: bool) -> Result<(), Error<SPI::Error>> {
        self.write_register(Register::Shutdown, if shutdown { 0x00 } else { 0x01 })
            .await
    }

    /// Light every segment regardless of the digit registers
    pub async fn display_test(&mut self, on: bool) -> Result<(), Error<SPI::Error>> {
        self.write_register(Register::DisplayTest, on as u8).await
    }

    /// Write a byte, already in the chip's segment order, to the digit at `position` (0 is the
    /// leftmost digit)
    pub async fn write_raw(&mut self, position: usize, data: u8) -> Result<(), Error<SPI::Error>> {
        check_window(position, 1, self.digits)?;

        self.write_raw_register(self.register_for(position), data)
            .await
    }

    /// Show a Code B character at `position`.  The digit must be in a BCD decode mode.
    pub async fn display_bcd_char(
        &mut self,
        position: usize,
        c: CodeB,
        dot: bool,
    ) -> Result<(), Error<SPI::Error>> {
        let data = c as u8 | if dot { DECIMAL_POINT } else { 0x00 };
        self.write_raw(position, data).await
    }

    /// Show `text` with the Code B font, left aligned.
    ///
    /// A `.` lights the decimal point of the digit before it; a `.` with no digit before it (at
    /// the start, or after another dot) gets a blank digit of its own.  Text past the last digit
    /// is dropped, and chars the font doesn't have are shown as `0`.
    ///
    /// Returns the number of dots merged into a digit.
    pub async fn display_bcd_text(&mut self, text: &str) -> Result<usize, Error<SPI::Error>> {
        let mut data = [CodeB::Blank as u8; MAX_DIGITS];
        let mut len = 0;
        let mut dots = 0;

        for c in text.chars() {
            if c == '.' && len > 0 && data[len - 1] & DECIMAL_POINT == 0 {
                data[len - 1] |= DECIMAL_POINT;
                dots += 1;
                continue;
            }

            if len == self.digits {
                break;
            }

            data[len] = match c {
                '.' => CodeB::Blank as u8 | DECIMAL_POINT,
                c => match CodeB::from_char(c) {
                    Some(code) => code as u8,
                    None => {
                        #[cfg(feature = "defmt")]
                        defmt::warn!("{} has no Code B glyph: rendering '0' instead", c);

                        CodeB::Zero as u8
                    }
                },
            };
            len += 1;
        }

        for (position, byte) in data[..self.digits].iter().enumerate() {
            self.write_raw(position, *byte).await?;
        }

        Ok(dots)
    }

    fn register_for(&self, position: usize) -> u8 {
        (self.digits - position) as u8
    }

    async fn write_register(
        &mut self,
        register: Register,
        data: u8,
    ) -> Result<(), Error<SPI::Error>> {
        self.write_raw_register(register as u8, data).await
    }

    async fn write_raw_register(&mut self, register: u8, data: u8) -> Result<(), Error<SPI::Error>> {
        #[cfg(feature = "defmt")]
        defmt::trace!("max7219 register {=u8:x} = {=u8:x}", register, data);

        self.spi
            .write(&[register, data])
            .await
            .map_err(Error::Transport)
    }
}

impl<SPI: SpiDevice> SegmentDisplay for Max7219<SPI> {
    type BusError = SPI::Error;

    fn digit_count(&self) -> usize {
        self.digits
    }

    fn font(&self) -> Font {
        Font::SEVEN_SEGMENT
    }

    /// Digits in a BCD decode mode will misread the segment codes, so use
    /// [`DecodeMode::NoDecode`] with this.
    async fn write_digits(
        &mut self,
        start: usize,
        codes: &[SegmentCode],
    ) -> Result<(), Error<Self::BusError>> {
        check_window(start, codes.len(), self.digits)?;

        for (i, code) in codes.iter().enumerate() {
            let register = self.register_for(start + i);
            self.write_raw_register(register, to_register_order(*code as u8))
                .await?;
        }

        Ok(())
    }
}
