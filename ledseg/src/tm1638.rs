use core::marker::PhantomData;
use core::num::NonZeroU8;

use crate::bus::{BusDriver, Timer};
use crate::font::{Font, SegmentCode};
use crate::keys::{Keys, KEY_BYTES};
use crate::transpose::{swap_nibbles, transpose};
use crate::{check_window, Error, SegmentDisplay};

/// Number of digits on every TM1638 board
pub const TM1638_DIGITS: usize = 8;

/// The controller has 16 bytes of display RAM: digits at even addresses, LEDs at odd ones
const DISPLAY_RAM_BYTES: usize = 16;

const DEFAULT_BRIGHTNESS: u8 = 0x02;

/// The boards built around the TM1638, which differ in how digits, LEDs and keys are wired.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Tm1638Model {
    /// 8 digits, 8 red LEDs and 8 buttons ("LED & KEY")
    LedAndKey,

    /// 8 digits and 16 buttons, no LEDs.
    ///
    /// The digits are wired to the segment lines, so the display RAM is addressed by segment
    /// instead of by digit.  Some boards also have the two groups of four digits swapped.
    SixteenKey { swap_nibbles: bool },

    /// Like [`Self::LedAndKey`] but with red/green LEDs
    BiColorLedAndKey,
}

impl Tm1638Model {
    /// The kind of LEDs on the board, if there are any
    pub fn led_variant(self) -> Option<LedVariant> {
        match self {
            Self::LedAndKey => Some(LedVariant::Monochrome),
            Self::SixteenKey { .. } => None,
            Self::BiColorLedAndKey => Some(LedVariant::BiColor),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LedVariant {
    Monochrome,
    BiColor,
}

/// The color to light an LED.
///
/// On boards with single color LEDs anything other than [`LedColor::Off`] just turns the LED on.
#[derive(Copy, Clone, Debug, PartialEq, Eq, strum::VariantArray)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LedColor {
    Off,
    Red,
    Green,
    /// Both halves of a bi-color LED
    RedAndGreen,
}

impl LedColor {
    /// The value written to the LED's address, which drives the SEG9 and SEG10 outputs
    fn mask(self, variant: LedVariant) -> u8 {
        match (variant, self) {
            (_, Self::Off) => 0x00,
            (LedVariant::Monochrome, _) => 0x01,
            (LedVariant::BiColor, Self::Red) => 0x02,
            (LedVariant::BiColor, Self::Green) => 0x01,
            (LedVariant::BiColor, Self::RedAndGreen) => 0x03,
        }
    }

    fn from_bits(red: bool, green: bool) -> Self {
        match (red, green) {
            (false, false) => Self::Off,
            (true, false) => Self::Red,
            (false, true) => Self::Green,
            (true, true) => Self::RedAndGreen,
        }
    }
}

pub struct Tm1638Builder {
    model: Tm1638Model,
}

impl Tm1638Builder {
    /// Pick the board.  The default is [`Tm1638Model::LedAndKey`].
    pub fn model(self, model: Tm1638Model) -> Self {
        Self { model }
    }

    /// Use an arbitrary [`BusDriver`] implementation
    pub fn with_bus_driver<D: BusDriver>(self, driver: D) -> Tm1638DriverBuilder<D> {
        Tm1638DriverBuilder {
            model: self.model,
            driver,
        }
    }

    /// Use an arbitrary [`Timer`] implementation with the built-in bus driver
    pub fn with_timer<T: Timer>(self) -> Tm1638TimerBuilder<T> {
        Tm1638TimerBuilder {
            model: self.model,
            _timer: PhantomData,
        }
    }

    #[cfg(feature = "embassy-time")]
    /// Use the [`Timer`] implementation built using `embassy-time`
    pub fn with_embassy_timer(self) -> Tm1638TimerBuilder<crate::EmbassyTimeTimer> {
        self.with_timer::<crate::EmbassyTimeTimer>()
    }
}

pub struct Tm1638TimerBuilder<T: Timer> {
    #[cfg_attr(not(feature = "embassy-rp"), allow(dead_code))]
    model: Tm1638Model,
    _timer: PhantomData<T>,
}

impl<T: Timer> Tm1638TimerBuilder<T> {
    /// Bit-bang the bus on the given Embassy RP HAL pins
    #[cfg(feature = "embassy-rp")]
    pub fn with_embassy_rp_pins<
        'a,
        StrobePin: embassy_rp::gpio::Pin,
        ClockPin: embassy_rp::gpio::Pin,
        DioPin: embassy_rp::gpio::Pin,
    >(
        self,
        strobe: StrobePin,
        clock: ClockPin,
        dio: DioPin,
    ) -> Tm1638DriverBuilder<crate::EmbassyRpBusDriver<'a, StrobePin, ClockPin, DioPin, T>> {
        Tm1638DriverBuilder {
            model: self.model,
            driver: crate::EmbassyRpBusDriver::new(strobe, clock, dio),
        }
    }
}

pub struct Tm1638DriverBuilder<D: BusDriver> {
    model: Tm1638Model,
    driver: D,
}

impl<D: BusDriver> Tm1638DriverBuilder<D> {
    pub fn build(self) -> Tm1638<D> {
        Tm1638::new(self.driver, self.model)
    }
}

/// Driver for the TM1638 display and key scan controller, and the boards built around it.
///
/// The bus is abstracted behind [`BusDriver`]; with the `embassy-rp` and `embassy-time` features
/// the builder can set up a bit-banging driver on RP2040 pins:
///
/// ```
/// # #[cfg(all(feature = "embassy-time", feature = "embassy-rp"))]
/// # {
/// let p = embassy_rp::init(Default::default());
/// let mut display = ledseg::Tm1638::builder()
///     .model(ledseg::Tm1638Model::LedAndKey)
///     .with_embassy_timer()
///     .with_embassy_rp_pins(p.PIN_6, p.PIN_7, p.PIN_8)
///     .build();
/// # }
/// ```
///
/// Text and numbers are shown with the [`SegmentDisplay`] methods.
pub struct Tm1638<Driver> {
    driver: Driver,
    model: Tm1638Model,

    /// `None` until the first addressing command has been sent
    addressing: Option<AddressingMode>,

    /// What the segment-addressed board is showing, one byte per digit.  Unused on the others.
    frame: [u8; TM1638_DIGITS],
}

impl Tm1638<()> {
    /// Return a builder to ease some of the type parameter complexity around creating the bus
    /// driver and timer.
    pub fn builder() -> Tm1638Builder {
        Tm1638Builder {
            model: Tm1638Model::LedAndKey,
        }
    }
}

impl<Driver: BusDriver> Tm1638<Driver> {
    pub fn new(driver: Driver, model: Tm1638Model) -> Self {
        Self {
            driver,
            model,
            addressing: None,
            frame: [0; TM1638_DIGITS],
        }
    }

    pub fn model(&self) -> Tm1638Model {
        self.model
    }

    /// Blank the display and LEDs and switch the display on at a low brightness
    pub async fn init(&mut self) -> Result<(), Error<Driver::Error>> {
        self.blank_display().await?;

        self.activate_display(DEFAULT_BRIGHTNESS).await
    }

    /// Blank every digit and LED
    pub async fn blank_display(&mut self) -> Result<(), Error<Driver::Error>> {
        self.set_incrementing_addressing().await?;

        self.apply_write_command(WriteCommand::WriteMultipleChars {
            start_display_number: 0,
            segment_masks: &[0; DISPLAY_RAM_BYTES],
        })
        .await?;

        self.frame = [0; TM1638_DIGITS];
        Ok(())
    }

    /// Switch the display on with a brightness from 0 (dimmest) to 7
    pub async fn activate_display(&mut self, brightness: u8) -> Result<(), Error<Driver::Error>> {
        self.apply_write_command(WriteCommand::ActivateDisplay { brightness })
            .await
    }

    pub async fn deactivate_display(&mut self) -> Result<(), Error<Driver::Error>> {
        self.apply_write_command(WriteCommand::DeactivateDisplay)
            .await
    }

    /// Set the raw segments of the digit at `position` (0 is leftmost), `(dp)gfedcba`.
    pub async fn set_display_mask(
        &mut self,
        position: u8,
        mask: u8,
    ) -> Result<(), Error<Driver::Error>> {
        self.write_digits(position as usize, &[mask as SegmentCode])
            .await
    }

    /// Write one segment line of the segment-addressed board: bit 7 of `digits` is the leftmost
    /// digit.
    ///
    /// Only [`Tm1638Model::SixteenKey`] is wired this way.
    pub async fn set_segment_mask(
        &mut self,
        segment: u8,
        digits: u8,
    ) -> Result<(), Error<Driver::Error>> {
        let Tm1638Model::SixteenKey { swap_nibbles: swap } = self.model else {
            return Err(Error::Unsupported);
        };

        if segment as usize >= TM1638_DIGITS {
            return Err(Error::InvalidPosition(segment as usize));
        }

        let digits = if swap { swap_nibbles(digits) } else { digits };

        self.set_fixed_addressing().await?;
        self.apply_write_command(WriteCommand::WriteSingleChar {
            display_number: segment,
            segment_mask: digits,
        })
        .await
    }

    /// Light the LED at `position` (0 is leftmost).
    pub async fn set_led_color(
        &mut self,
        position: u8,
        color: LedColor,
    ) -> Result<(), Error<Driver::Error>> {
        let variant = self.model.led_variant().ok_or(Error::Unsupported)?;

        if position as usize >= TM1638_DIGITS {
            return Err(Error::InvalidPosition(position as usize));
        }

        self.set_fixed_addressing().await?;
        self.apply_write_command(WriteCommand::WriteLed {
            led_number: position,
            mask: color.mask(variant),
        })
        .await
    }

    /// Set every LED at once, leftmost LED in bit 0.
    ///
    /// On the bi-color board the low byte turns on the red half of each LED and the high byte
    /// the green half.  The single color board ignores the high byte.
    pub async fn set_leds(&mut self, leds: u16) -> Result<(), Error<Driver::Error>> {
        let variant = self.model.led_variant().ok_or(Error::Unsupported)?;

        for position in 0..TM1638_DIGITS as u8 {
            let red = leds & (1 << position) != 0;
            let green = variant == LedVariant::BiColor && leds & (1 << (position + 8)) != 0;

            self.set_led_color(position, LedColor::from_bits(red, green))
                .await?;
        }

        Ok(())
    }

    /// Read the key scan data from the controller.
    ///
    /// Use the [`Keys`] method matching the board to make sense of it.
    pub async fn read_keys(&mut self) -> Result<Keys, Error<Driver::Error>> {
        let mut buffer = [0u8; KEY_BYTES];

        self.apply_read_command(ReadCommand::ReadKeys, &mut buffer)
            .await?;

        #[cfg(feature = "defmt")]
        defmt::trace!("keys = {:?}", buffer);

        Ok(Keys::new(buffer))
    }

    /// Write the digits in `frame` on the segment-addressed board
    async fn flush_segments(&mut self) -> Result<(), Error<Driver::Error>> {
        let segments = transpose(&self.frame);

        for (segment, digits) in segments.iter().enumerate() {
            self.set_segment_mask(segment as u8, *digits).await?;
        }

        Ok(())
    }

    async fn set_fixed_addressing(&mut self) -> Result<(), Error<Driver::Error>> {
        if self.addressing != Some(AddressingMode::Fixed) {
            self.apply_write_command(WriteCommand::SetFixedDisplayAddressing)
                .await?;
            self.addressing = Some(AddressingMode::Fixed);
        }

        Ok(())
    }

    async fn set_incrementing_addressing(&mut self) -> Result<(), Error<Driver::Error>> {
        if self.addressing != Some(AddressingMode::Incremental) {
            self.apply_write_command(WriteCommand::SetIncrementalDisplayAddressing)
                .await?;
            self.addressing = Some(AddressingMode::Incremental);
        }

        Ok(())
    }

    async fn apply_write_command(
        &mut self,
        command: WriteCommand<'_>,
    ) -> Result<(), Error<Driver::Error>> {
        let (command_byte, data_bytes) = command.encode();

        #[cfg(feature = "defmt")]
        defmt::trace!("command byte = {=u8:x}", command_byte);

        match data_bytes {
            Some(data_bytes) => {
                self.driver
                    .send_command_write_data(command_byte, data_bytes)
                    .await
            }
            None => self.driver.send_command(command_byte).await,
        }
        .map_err(Error::Transport)
    }

    async fn apply_read_command(
        &mut self,
        command: ReadCommand,
        read_buffer: &mut [u8],
    ) -> Result<(), Error<Driver::Error>> {
        let (command_byte, read_bytes) = command.encode();

        #[cfg(feature = "defmt")]
        defmt::trace!("command byte = {=u8:x}", command_byte);

        let available = read_buffer.len();
        let read_buffer = read_buffer
            .get_mut(..read_bytes.get() as usize)
            .ok_or(Error::InvalidPosition(available))?;

        self.driver
            .send_command_read_data(command_byte, read_buffer)
            .await
            .map_err(Error::Transport)
    }
}

impl<Driver: BusDriver> SegmentDisplay for Tm1638<Driver> {
    type BusError = Driver::Error;

    fn digit_count(&self) -> usize {
        TM1638_DIGITS
    }

    fn font(&self) -> Font {
        Font::SEVEN_SEGMENT
    }

    async fn write_digits(
        &mut self,
        start: usize,
        codes: &[SegmentCode],
    ) -> Result<(), Error<Self::BusError>> {
        check_window(start, codes.len(), TM1638_DIGITS)?;

        match self.model {
            Tm1638Model::SixteenKey { .. } => {
                for (slot, code) in self.frame[start..].iter_mut().zip(codes) {
                    *slot = *code as u8;
                }

                self.flush_segments().await
            }
            Tm1638Model::LedAndKey | Tm1638Model::BiColorLedAndKey => {
                self.set_fixed_addressing().await?;

                for (position, code) in (start..).zip(codes) {
                    self.apply_write_command(WriteCommand::WriteSingleChar {
                        display_number: position as u8,
                        segment_mask: *code as u8,
                    })
                    .await?;
                }

                Ok(())
            }
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum AddressingMode {
    Fixed,
    Incremental,
}

/// The write-only commands of the TM1638
enum WriteCommand<'a> {
    /// Turn the display on
    ActivateDisplay {
        /// 0 to 7; only the low three bits are used
        brightness: u8,
    },

    /// Turn the display off.  Display RAM is kept.
    DeactivateDisplay,

    /// The address is incremented after each data byte
    SetIncrementalDisplayAddressing,

    /// Every data byte goes to the address given with it
    SetFixedDisplayAddressing,

    /// Write the LED at an odd address
    WriteLed {
        led_number: u8,

        /// Only the two low bits (SEG9 and SEG10) are used
        mask: u8,
    },

    /// Write one byte at an even address.  That's a digit on the digit-addressed boards and a
    /// segment line on the segment-addressed one.
    WriteSingleChar { display_number: u8, segment_mask: u8 },

    /// Write consecutive bytes of display RAM, starting at a raw address.  Incremental
    /// addressing mode only.
    WriteMultipleChars {
        start_display_number: u8,
        segment_masks: &'a [u8],
    },
}

impl<'a> WriteCommand<'a> {
    /// The command byte, and the data bytes to send with it in the same strobe frame
    fn encode<'me>(&'me self) -> (u8, Option<&'me [u8]>)
    where
        'a: 'me,
    {
        match self {
            WriteCommand::ActivateDisplay { brightness } => {
                #[cfg(feature = "defmt")]
                defmt::debug_assert!(*brightness < 0b1000);

                (0b1000_1000 | (brightness & 0b0000_0111), None)
            }
            WriteCommand::DeactivateDisplay => (0b1000_0000, None),
            WriteCommand::SetIncrementalDisplayAddressing => (0b0100_0000, None),
            WriteCommand::SetFixedDisplayAddressing => (0b0100_0100, None),
            WriteCommand::WriteLed { led_number, mask } => (
                0b1100_0000 | (((led_number << 1) + 1) & 0b0000_1111),
                Some(core::slice::from_ref(mask)),
            ),
            WriteCommand::WriteSingleChar {
                display_number,
                segment_mask,
            } => (
                0b1100_0000 | ((display_number << 1) & 0b0000_1111),
                Some(core::slice::from_ref(segment_mask)),
            ),
            WriteCommand::WriteMultipleChars {
                start_display_number,
                segment_masks,
            } => {
                #[cfg(feature = "defmt")]
                defmt::debug_assert!(
                    *start_display_number as usize + segment_masks.len() <= DISPLAY_RAM_BYTES
                );

                (
                    0b1100_0000 | (start_display_number & 0b0000_1111),
                    Some(segment_masks),
                )
            }
        }
    }
}

/// Commands which read data back from the controller
enum ReadCommand {
    /// Four bytes of key scan data
    ReadKeys,
}

impl ReadCommand {
    /// The command byte and the number of bytes to read after it
    fn encode(&self) -> (u8, NonZeroU8) {
        match self {
            ReadCommand::ReadKeys => {
                const KEY_BYTES_NZ: NonZeroU8 = match NonZeroU8::new(KEY_BYTES as u8) {
                    Some(n) => n,
                    None => panic!("key scan must read at least one byte"),
                };

                (0b0100_0010, KEY_BYTES_NZ)
            }
        }
    }
}
