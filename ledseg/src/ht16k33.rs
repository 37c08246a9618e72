//! Driver for the HT16K33 LED controller, as found on the common 7 and 14 segment I2C backpacks.
//!
//! Each digit is a 16-bit row in display RAM at address `2 * position`, low byte first, so the
//! same driver serves 7 segment modules (only the low byte lit) and 14 segment modules alike.
//! The font is chosen by the caller.
//!
//! I2C writes to these boards fail now and then, typically when the backpack sits at the end of
//! a long cable, so every write is retried according to a [`RetryPolicy`] before the error is
//! reported.

use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;

use crate::buffer::MAX_DIGITS;
use crate::font::{Font, SegmentCode};
use crate::{check_window, Error, SegmentDisplay};

/// The address of a backpack with none of the address jumpers bridged
pub const DEFAULT_ADDRESS: u8 = 0x70;

pub const DEFAULT_BRIGHTNESS: u8 = 7;

pub const MAX_BRIGHTNESS: u8 = 15;

/// System setup: oscillator on
const CMD_NORMAL: u8 = 0x21;

/// System setup: oscillator off
const CMD_STANDBY: u8 = 0x20;

/// Display setup with the display bit clear
const CMD_DISPLAY_OFF: u8 = 0x80;

/// Dimming set; the level goes in the low nibble
const CMD_BRIGHTNESS: u8 = 0xE0;

/// Blink rate of the whole display
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, strum::VariantArray)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Blink {
    #[default]
    Off = 0,
    TwoHz = 1,
    OneHz = 2,
    HalfHz = 3,
}

impl Blink {
    /// The display setup command which turns the display on with this blink rate
    pub const fn command(self) -> u8 {
        CMD_DISPLAY_OFF | 0x01 | ((self as u8) << 1)
    }
}

/// How hard to try before giving up on an I2C write
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RetryPolicy {
    /// How many times a failed write is sent again
    pub retries: u8,

    /// Pause before each retry
    pub delay_ms: u32,
}

impl RetryPolicy {
    /// Report the first failure without retrying
    pub const NONE: Self = Self {
        retries: 0,
        delay_ms: 0,
    };
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 3,
            delay_ms: 100,
        }
    }
}

/// An HT16K33 driving `DIGITS` digit positions (at most 8).
pub struct Ht16k33<I2C, D, const DIGITS: usize> {
    i2c: I2C,
    delay: D,
    address: u8,
    font: Font,
    retry: RetryPolicy,
    blink: Blink,
}

impl<I2C: I2c, D: DelayNs, const DIGITS: usize> Ht16k33<I2C, D, DIGITS> {
    const DIGITS_FIT: () = assert!(DIGITS > 0 && DIGITS <= MAX_DIGITS);

    /// Nothing is sent to the controller until [`Self::init`].
    pub fn new(i2c: I2C, delay: D, address: u8, font: Font) -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::DIGITS_FIT;

        Self {
            i2c,
            delay,
            address,
            font,
            retry: RetryPolicy::default(),
            blink: Blink::Off,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Give back the bus and delay
    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    /// Start the oscillator, set the brightness and turn the display on.
    ///
    /// Display RAM is not cleared; follow with [`SegmentDisplay::clear`] if the module may have
    /// been showing something.
    pub async fn init(&mut self, brightness: u8, blink: Blink) -> Result<(), Error<I2C::Error>> {
        #[cfg(feature = "defmt")]
        defmt::debug!(
            "ht16k33 at {=u8:x}: init, brightness {}, blink {}",
            self.address,
            brightness,
            blink
        );

        self.normal().await?;
        self.set_brightness(brightness).await?;
        self.set_blink(blink).await
    }

    /// Back to power-on settings: oscillator running, default brightness, display on, no blink
    pub async fn reset_to_defaults(&mut self) -> Result<(), Error<I2C::Error>> {
        self.init(DEFAULT_BRIGHTNESS, Blink::Off).await
    }

    /// Turn the display on, keeping the current blink rate
    pub async fn display_on(&mut self) -> Result<(), Error<I2C::Error>> {
        self.send_command(self.blink.command()).await
    }

    /// Turn the display off.  Display RAM keeps its contents.
    pub async fn display_off(&mut self) -> Result<(), Error<I2C::Error>> {
        self.send_command(CMD_DISPLAY_OFF).await
    }

    /// Stop the oscillator.  The controller draws almost nothing in standby.
    pub async fn sleep(&mut self) -> Result<(), Error<I2C::Error>> {
        self.send_command(CMD_STANDBY).await
    }

    /// Restart the oscillator after [`Self::sleep`]
    pub async fn normal(&mut self) -> Result<(), Error<I2C::Error>> {
        self.send_command(CMD_NORMAL).await
    }

    /// Set one of the 16 dimming levels.  Anything above [`MAX_BRIGHTNESS`] is clamped.
    pub async fn set_brightness(&mut self, brightness: u8) -> Result<(), Error<I2C::Error>> {
        let brightness = if brightness > MAX_BRIGHTNESS {
            #[cfg(feature = "defmt")]
            defmt::warn!(
                "Brightness {} out of range, using {}",
                brightness,
                MAX_BRIGHTNESS
            );

            MAX_BRIGHTNESS
        } else {
            brightness
        };

        self.send_command(CMD_BRIGHTNESS | brightness).await
    }

    /// Set the blink rate.  This also turns the display on.
    pub async fn set_blink(&mut self, blink: Blink) -> Result<(), Error<I2C::Error>> {
        self.blink = blink;
        self.send_command(blink.command()).await
    }

    /// Write one 16-bit segment pattern to the digit at `position`
    pub async fn write_raw(
        &mut self,
        position: usize,
        code: SegmentCode,
    ) -> Result<(), Error<I2C::Error>> {
        check_window(position, 1, DIGITS)?;

        let [lo, hi] = code.to_le_bytes();
        self.write_with_retry(&[(position * 2) as u8, lo, hi]).await
    }

    /// Read a byte back from the controller to see whether anything answers at our address.
    ///
    /// Not retried.
    pub async fn check_connection(&mut self) -> Result<(), Error<I2C::Error>> {
        let mut response = [0u8; 1];

        self.i2c
            .read(self.address, &mut response)
            .await
            .map_err(Error::Transport)
    }

    async fn send_command(&mut self, command: u8) -> Result<(), Error<I2C::Error>> {
        #[cfg(feature = "defmt")]
        defmt::trace!("ht16k33 command {=u8:x}", command);

        self.write_with_retry(&[command]).await
    }

    async fn write_with_retry(&mut self, bytes: &[u8]) -> Result<(), Error<I2C::Error>> {
        let mut retries_left = self.retry.retries;

        loop {
            match self.i2c.write(self.address, bytes).await {
                Ok(()) => return Ok(()),
                Err(e) if retries_left == 0 => {
                    #[cfg(feature = "defmt")]
                    defmt::warn!(
                        "ht16k33 at {=u8:x}: write failed, giving up after {} retries",
                        self.address,
                        self.retry.retries
                    );

                    return Err(Error::Transport(e));
                }
                Err(_) => {
                    retries_left -= 1;

                    #[cfg(feature = "defmt")]
                    defmt::warn!(
                        "ht16k33 at {=u8:x}: write failed, {} retries left",
                        self.address,
                        retries_left
                    );

                    self.delay.delay_ms(self.retry.delay_ms).await;
                }
            }
        }
    }
}

impl<I2C: I2c, D: DelayNs, const DIGITS: usize> SegmentDisplay for Ht16k33<I2C, D, DIGITS> {
    type BusError = I2C::Error;

    fn digit_count(&self) -> usize {
        DIGITS
    }

    fn font(&self) -> Font {
        self.font
    }

    /// All the digits go out in one transaction, relying on the controller's address
    /// auto-increment.
    async fn write_digits(
        &mut self,
        start: usize,
        codes: &[SegmentCode],
    ) -> Result<(), Error<Self::BusError>> {
        check_window(start, codes.len(), DIGITS)?;

        let mut frame = [0u8; 1 + 2 * MAX_DIGITS];
        frame[0] = (start * 2) as u8;
        for (bytes, code) in frame[1..].chunks_exact_mut(2).zip(codes) {
            bytes.copy_from_slice(&code.to_le_bytes());
        }

        self.write_with_retry(&frame[..1 + 2 * codes.len()]).await
    }
}
