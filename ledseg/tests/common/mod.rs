//! Bus mocks shared by the driver tests.  Each one records what the driver sent.
#![allow(dead_code)]

use core::convert::Infallible;

use embedded_hal_1::i2c::ErrorKind as I2cErrorKind;
use embedded_hal_1::spi::ErrorKind as SpiErrorKind;
use ledseg::tm1637::Tm1637Bus;
use ledseg::BusDriver;

/// A strobe frame on the TM1638 bus
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Tm1638Frame {
    Command(u8),
    Write(u8, Vec<u8>),
    Read(u8, usize),
}

#[derive(Default)]
pub struct RecordingBusDriver {
    pub frames: Vec<Tm1638Frame>,

    /// Returned by every key scan
    pub key_scan: [u8; 4],
}

impl RecordingBusDriver {
    /// Just the data frames, skipping the addressing and display control commands
    pub fn writes(&self) -> Vec<(u8, Vec<u8>)> {
        self.frames
            .iter()
            .filter_map(|frame| match frame {
                Tm1638Frame::Write(command, data) => Some((*command, data.clone())),
                _ => None,
            })
            .collect()
    }
}

impl BusDriver for &mut RecordingBusDriver {
    type Error = Infallible;

    async fn send_command(&mut self, b: u8) -> Result<(), Self::Error> {
        self.frames.push(Tm1638Frame::Command(b));
        Ok(())
    }

    async fn send_command_write_data(&mut self, b: u8, data: &[u8]) -> Result<(), Self::Error> {
        self.frames.push(Tm1638Frame::Write(b, data.to_vec()));
        Ok(())
    }

    async fn send_command_read_data(&mut self, b: u8, data: &mut [u8]) -> Result<(), Self::Error> {
        self.frames.push(Tm1638Frame::Read(b, data.len()));
        data.copy_from_slice(&self.key_scan[..data.len()]);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingTm1637Bus {
    pub frames: Vec<Vec<u8>>,
}

impl Tm1637Bus for &mut RecordingTm1637Bus {
    type Error = Infallible;

    async fn write_frame(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.frames.push(bytes.to_vec());
        Ok(())
    }
}

/// An I2C bus which fails a set number of writes before letting them through
#[derive(Default)]
pub struct FlakyI2c {
    pub writes: Vec<(u8, Vec<u8>)>,
    pub reads: Vec<(u8, usize)>,

    /// How many of the next writes fail
    pub failures: usize,

    /// Writes that failed
    pub failed: usize,

    /// Fail reads, as if nothing answers
    pub absent: bool,
}

impl embedded_hal_async::i2c::ErrorType for FlakyI2c {
    type Error = I2cErrorKind;
}

impl embedded_hal_async::i2c::I2c for FlakyI2c {
    async fn transaction(
        &mut self,
        address: u8,
        operations: &mut [embedded_hal_async::i2c::Operation<'_>],
    ) -> Result<(), Self::Error> {
        use embedded_hal_async::i2c::Operation;

        for operation in operations {
            match operation {
                Operation::Write(bytes) => {
                    if self.failures > 0 {
                        self.failures -= 1;
                        self.failed += 1;
                        return Err(I2cErrorKind::Other);
                    }
                    self.writes.push((address, bytes.to_vec()));
                }
                Operation::Read(buffer) => {
                    if self.absent {
                        return Err(I2cErrorKind::Other);
                    }
                    buffer.fill(0);
                    self.reads.push((address, buffer.len()));
                }
            }
        }

        Ok(())
    }
}

/// Records every delay, in milliseconds
#[derive(Default)]
pub struct RecordingDelay {
    pub delays_ms: Vec<u32>,
}

impl embedded_hal_async::delay::DelayNs for RecordingDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.delays_ms.push(ns / 1_000_000);
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.delays_ms.push(ms);
    }
}

#[derive(Default)]
pub struct RecordingSpi {
    pub writes: Vec<Vec<u8>>,
}

impl RecordingSpi {
    /// The `(register, data)` pairs written, in order
    pub fn registers(&self) -> Vec<(u8, u8)> {
        self.writes
            .iter()
            .filter_map(|bytes| match bytes.as_slice() {
                [register, data] => Some((*register, *data)),
                _ => None,
            })
            .collect()
    }
}

impl embedded_hal_async::spi::ErrorType for RecordingSpi {
    type Error = SpiErrorKind;
}

impl embedded_hal_async::spi::SpiDevice for RecordingSpi {
    async fn transaction(
        &mut self,
        operations: &mut [embedded_hal_async::spi::Operation<'_, u8>],
    ) -> Result<(), Self::Error> {
        use embedded_hal_async::spi::Operation;

        for operation in operations {
            if let Operation::Write(bytes) = operation {
                self.writes.push(bytes.to_vec());
            }
        }

        Ok(())
    }
}
