//! The 8-bit multiplexed parallel bus (Intel 8080 style).
//!
//! The controller registers and GRAM are 16 bits wide, but only eight data
//! lines are wired, so every transfer is split into a high and a low byte.
//! [`ParallelBus`] is the seam between the wiring and the rest of the driver:
//! the register, window and drawing logic only ever use its three primitives.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

/// The three indivisible bus transactions the controller protocol is built on.
///
/// Each call blocks until all strobes have completed. Implementations must
/// not queue or reorder transactions.
pub trait ParallelBus {
    type Error;

    /// Latches `code` as the active register index.
    fn write_command(&mut self, code: u16) -> Result<(), Self::Error>;

    /// Latches `value` into the register selected by the last command.
    fn write_data(&mut self, value: u16) -> Result<(), Self::Error>;

    /// Reads one 16-bit value from the register selected by the last command.
    fn read_data(&mut self) -> Result<u16, Self::Error>;
}

impl<T: ParallelBus + ?Sized> ParallelBus for &mut T {
    type Error = T::Error;

    fn write_command(&mut self, code: u16) -> Result<(), Self::Error> {
        T::write_command(self, code)
    }

    fn write_data(&mut self, value: u16) -> Result<(), Self::Error> {
        T::write_data(self, value)
    }

    fn read_data(&mut self) -> Result<u16, Self::Error> {
        T::read_data(self)
    }
}

/// Direction of the shared data lines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Input,
    Output,
}

/// The eight shared data lines D0..D7.
///
/// `embedded-hal` has no bidirectional port abstraction, so the board support
/// code implements this, usually as a masked write to a single GPIO port
/// register.
pub trait DataPort {
    type Error;

    fn set_direction(&mut self, direction: Direction) -> Result<(), Self::Error>;

    /// Drives `byte` onto the lines. Only valid in [`Direction::Output`].
    fn write(&mut self, byte: u8) -> Result<(), Self::Error>;

    /// Samples the lines. Only valid in [`Direction::Input`].
    fn read(&mut self) -> Result<u8, Self::Error>;
}

/// Bus timing parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusTiming {
    /// Time between asserting RD and sampling the data lines.
    ///
    /// The controller needs a long access time on reads; 15 us is what a
    /// 72 MHz Cortex-M3 needs with room to spare. Tune for your clock.
    pub read_settle_ns: u32,
}

impl Default for BusTiming {
    fn default() -> Self {
        Self {
            read_settle_ns: 15_000,
        }
    }
}

/// Error type for [`Gpio8080`].
#[derive(Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GpioBusError<PinE, PortE> {
    Pin(PinE),
    Port(PortE),
}

/// Bit-banged bus over GPIO pins.
///
/// All control lines are active low. Bytes are latched by the controller on
/// the rising edge of WR; on reads, data is valid while RD is low.
pub struct Gpio8080<CS, CD, WR, RD, DATA, D> {
    cs: CS,
    cd: CD,
    wr: WR,
    rd: RD,
    data: DATA,
    delay: D,
    timing: BusTiming,
}

impl<CS, CD, WR, RD, DATA, D, PinE, PortE> Gpio8080<CS, CD, WR, RD, DATA, D>
where
    CS: OutputPin<Error = PinE>,
    CD: OutputPin<Error = PinE>,
    WR: OutputPin<Error = PinE>,
    RD: OutputPin<Error = PinE>,
    DATA: DataPort<Error = PortE>,
    D: DelayNs,
{
    /// Takes ownership of the bus lines and drives them to the idle state:
    /// RD, WR, CS and CD high, data lines as outputs holding zero.
    pub fn new(
        cs: CS,
        cd: CD,
        wr: WR,
        rd: RD,
        data: DATA,
        delay: D,
        timing: BusTiming,
    ) -> Result<Self, GpioBusError<PinE, PortE>> {
        let mut bus = Self {
            cs,
            cd,
            wr,
            rd,
            data,
            delay,
            timing,
        };
        bus.data
            .set_direction(Direction::Output)
            .map_err(GpioBusError::Port)?;
        bus.data.write(0).map_err(GpioBusError::Port)?;
        bus.rd.set_high().map_err(GpioBusError::Pin)?;
        bus.wr.set_high().map_err(GpioBusError::Pin)?;
        bus.cs.set_high().map_err(GpioBusError::Pin)?;
        bus.cd.set_high().map_err(GpioBusError::Pin)?;
        Ok(bus)
    }

    /// Consumes the bus and returns the pins to you.
    pub fn release(self) -> (CS, CD, WR, RD, DATA, D) {
        (self.cs, self.cd, self.wr, self.rd, self.data, self.delay)
    }

    pub fn timing(&self) -> BusTiming {
        self.timing
    }

    pub fn set_timing(&mut self, timing: BusTiming) {
        self.timing = timing;
    }

    // Selects the chip in command (CD low) or data (CD high) mode with both
    // strobes idle.
    fn select(&mut self, data_mode: bool) -> Result<(), GpioBusError<PinE, PortE>> {
        self.cs.set_low().map_err(GpioBusError::Pin)?;
        if data_mode {
            self.cd.set_high().map_err(GpioBusError::Pin)?;
        } else {
            self.cd.set_low().map_err(GpioBusError::Pin)?;
        }
        self.rd.set_high().map_err(GpioBusError::Pin)?;
        self.wr.set_high().map_err(GpioBusError::Pin)
    }

    fn strobe_write(&mut self, byte: u8) -> Result<(), GpioBusError<PinE, PortE>> {
        self.data.write(byte).map_err(GpioBusError::Port)?;
        self.wr.set_low().map_err(GpioBusError::Pin)?;
        self.wr.set_high().map_err(GpioBusError::Pin)
    }

    fn strobe_read(&mut self) -> Result<u8, GpioBusError<PinE, PortE>> {
        self.rd.set_low().map_err(GpioBusError::Pin)?;
        self.delay.delay_ns(self.timing.read_settle_ns);
        let byte = self.data.read().map_err(GpioBusError::Port)?;
        self.rd.set_high().map_err(GpioBusError::Pin)?;
        Ok(byte)
    }

    fn write_word(&mut self, data_mode: bool, word: u16) -> Result<(), GpioBusError<PinE, PortE>> {
        self.select(data_mode)?;
        let [high, low] = word.to_be_bytes();
        self.strobe_write(high)?;
        self.strobe_write(low)?;
        self.cs.set_high().map_err(GpioBusError::Pin)
    }
}

impl<CS, CD, WR, RD, DATA, D, PinE, PortE> ParallelBus for Gpio8080<CS, CD, WR, RD, DATA, D>
where
    CS: OutputPin<Error = PinE>,
    CD: OutputPin<Error = PinE>,
    WR: OutputPin<Error = PinE>,
    RD: OutputPin<Error = PinE>,
    DATA: DataPort<Error = PortE>,
    D: DelayNs,
{
    type Error = GpioBusError<PinE, PortE>;

    fn write_command(&mut self, code: u16) -> Result<(), Self::Error> {
        trace!("bus: command {:#x}", code);
        self.write_word(false, code)
    }

    fn write_data(&mut self, value: u16) -> Result<(), Self::Error> {
        trace!("bus: data {:#x}", value);
        self.write_word(true, value)
    }

    fn read_data(&mut self) -> Result<u16, Self::Error> {
        self.select(true)?;
        let read = self
            .data
            .set_direction(Direction::Input)
            .map_err(GpioBusError::Port)
            .and_then(|()| {
                // Two strobes shift the 16-bit value out over the 8-bit path.
                let high = self.strobe_read()?;
                let low = self.strobe_read()?;
                Ok(u16::from_be_bytes([high, low]))
            });
        // Back to output with CS released, even after a failed strobe.
        let output = self
            .data
            .set_direction(Direction::Output)
            .map_err(GpioBusError::Port);
        let released = self.cs.set_high().map_err(GpioBusError::Pin);
        let value = read.and_then(|value| output.and(released).map(|()| value))?;
        trace!("bus: read {:#x}", value);
        Ok(value)
    }
}
