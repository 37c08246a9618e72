//! The TM1638 three-wire bus: the [`BusDriver`] trait and, with the right features enabled, a
//! bit-banging implementation for the RP2040.

#![allow(async_fn_in_trait)]

/// Byte-level access to the TM1638 bus.
///
/// The bus has a strobe line which frames each transfer, a clock, and a single bidirectional data
/// line.  It looks a lot like SPI, but the data line switches direction in the middle of a key
/// scan, which embedded-hal has no way to express, so implementations drive the pins themselves.
///
/// All three TM1638 board models talk to their controller through this trait.
pub trait BusDriver {
    type Error;

    /// Send a command byte on its own
    async fn send_command(&mut self, b: u8) -> Result<(), Self::Error>;

    /// Send a command byte followed by `data`, all in the same strobe frame
    async fn send_command_write_data(&mut self, b: u8, data: &[u8]) -> Result<(), Self::Error>;

    /// Send a command byte, then fill `data` with the controller's response
    async fn send_command_read_data(&mut self, b: u8, data: &mut [u8]) -> Result<(), Self::Error>;
}

/// Delays needed by the bit-banging driver.
///
/// Kept separate from any particular timer crate so the driver works with whatever time source
/// the application already has.
pub trait Timer {
    /// Half a clock period; the datasheet asks for at least 1us.
    async fn wait_clock_tick();

    /// tWAIT from the datasheet: the pause between a key scan command and the first bit of the
    /// response.
    async fn wait_twait() {
        Self::wait_clock_tick().await
    }
}

#[cfg(feature = "embassy-time")]
mod embassy_time_timer {
    use embassy_time::{Duration, Timer as EmbassyTimer};

    const CLOCK_TICK: Duration = Duration::from_micros(1);

    const TWAIT: Duration = Duration::from_micros(2);

    /// [`super::Timer`] built on `embassy-time`
    pub struct EmbassyTimeTimer;

    impl super::Timer for EmbassyTimeTimer {
        async fn wait_clock_tick() {
            EmbassyTimer::after(CLOCK_TICK).await
        }

        async fn wait_twait() {
            EmbassyTimer::after(TWAIT).await
        }
    }
}

#[cfg(feature = "embassy-time")]
pub use embassy_time_timer::EmbassyTimeTimer;

#[cfg(feature = "embassy-rp")]
mod embassy_rp_bus_driver {
    use core::convert::Infallible;
    use core::marker::PhantomData;
    use embassy_rp::gpio;

    /// Bit-banging [`super::BusDriver`] on RP2040 GPIO pins, using the Embassy RP HAL.
    ///
    /// Bits go out and come in LSB first.  Data is sampled by the controller on the rising edge
    /// of the clock.
    pub struct EmbassyRpBusDriver<
        'a,
        StrobePin: gpio::Pin,
        ClockPin: gpio::Pin,
        DioPin: gpio::Pin,
        Timer: super::Timer,
    > {
        strobe: gpio::Output<'a, StrobePin>,
        clock: gpio::Output<'a, ClockPin>,
        dio: gpio::Flex<'a, DioPin>,
        _timer: PhantomData<Timer>,
    }

    impl<'a, StrobePin: gpio::Pin, ClockPin: gpio::Pin, DioPin: gpio::Pin, Timer: super::Timer>
        EmbassyRpBusDriver<'a, StrobePin, ClockPin, DioPin, Timer>
    {
        pub fn new(strobe: StrobePin, clock: ClockPin, dio: DioPin) -> Self {
            let mut me = Self {
                strobe: gpio::Output::new(strobe, gpio::Level::High),
                clock: gpio::Output::new(clock, gpio::Level::Low),
                dio: gpio::Flex::new(dio),
                _timer: PhantomData,
            };

            // DIO is an output except while a key scan is being read
            me.dio.set_as_output();
            me.dio.set_low();

            me
        }

        async fn shift_byte_out(&mut self, b: u8) {
            for bit in 0..8 {
                self.dio.set_level(((b >> bit) & 1 != 0).into());

                // Let DIO settle before the rising edge
                Timer::wait_clock_tick().await;

                self.clock.set_high();
                Timer::wait_clock_tick().await;
                self.clock.set_low();
                Timer::wait_clock_tick().await;
            }
        }

        /// Assumes DIO is already an input
        async fn shift_byte_in(&mut self) -> u8 {
            let mut value = 0;

            for bit in 0..8 {
                self.clock.set_high();
                Timer::wait_clock_tick().await;

                if self.dio.is_high() {
                    value |= 1 << bit;
                }

                self.clock.set_low();
                Timer::wait_clock_tick().await;
            }

            value
        }
    }

    impl<'a, StrobePin: gpio::Pin, ClockPin: gpio::Pin, DioPin: gpio::Pin, Timer: super::Timer>
        super::BusDriver for EmbassyRpBusDriver<'a, StrobePin, ClockPin, DioPin, Timer>
    {
        type Error = Infallible;

        async fn send_command(&mut self, b: u8) -> Result<(), Self::Error> {
            self.strobe.set_low();
            self.shift_byte_out(b).await;
            self.strobe.set_high();

            Ok(())
        }

        async fn send_command_write_data(&mut self, b: u8, data: &[u8]) -> Result<(), Self::Error> {
            self.strobe.set_low();
            self.shift_byte_out(b).await;
            for b in data {
                #[cfg(feature = "defmt")]
                defmt::trace!("data byte = {=u8:x}", b);
                self.shift_byte_out(*b).await;
            }
            self.strobe.set_high();

            Ok(())
        }

        async fn send_command_read_data(
            &mut self,
            b: u8,
            data: &mut [u8],
        ) -> Result<(), Self::Error> {
            self.strobe.set_low();
            self.shift_byte_out(b).await;

            self.dio.set_as_input();
            Timer::wait_twait().await;

            #[cfg(feature = "defmt")]
            defmt::trace!("Expecting {0} bytes from controller", data.len());

            for byte in data.iter_mut() {
                *byte = self.shift_byte_in().await;
            }

            self.dio.set_as_output();
            self.strobe.set_high();

            Ok(())
        }
    }
}

#[cfg(feature = "embassy-rp")]
pub use embassy_rp_bus_driver::EmbassyRpBusDriver;
