use core::marker::PhantomData;

use embedded_graphics_core::pixelcolor::raw::{RawData, RawU16};
use embedded_graphics_core::pixelcolor::Rgb565;

use crate::bus::ParallelBus;
use crate::{AddressState, Error};

/// An open GRAM stream.
///
/// Returned by [`Ili9328::open_gram_stream`](crate::Ili9328::open_gram_stream)
/// and [`Ili9328::home`](crate::Ili9328::home). Every pixel written or read
/// through it advances the controller's address counter according to the
/// entry mode of the current orientation, wrapping inside the GRAM window.
///
/// The stream mutably borrows the driver, so no other register access can be
/// interleaved with the pixel burst. Dropping it ends the stream.
pub struct GramStream<'a, BUS, PinE> {
    bus: &'a mut BUS,
    state: &'a mut AddressState,
    _pin: PhantomData<fn() -> PinE>,
}

impl<'a, BUS, PinE> GramStream<'a, BUS, PinE>
where
    BUS: ParallelBus,
{
    pub(crate) fn new(bus: &'a mut BUS, state: &'a mut AddressState) -> Self {
        *state = AddressState::StreamOpen;
        Self {
            bus,
            state,
            _pin: PhantomData,
        }
    }

    /// Writes one raw 16-bit GRAM word.
    pub fn write_raw(&mut self, value: u16) -> Result<(), Error<BUS::Error, PinE>> {
        self.bus.write_data(value).map_err(Error::Bus)
    }

    pub fn write(&mut self, color: Rgb565) -> Result<(), Error<BUS::Error, PinE>> {
        self.write_raw(RawU16::from(color).into_inner())
    }

    /// Writes the same color `count` times.
    pub fn write_repeated(
        &mut self,
        color: Rgb565,
        count: u32,
    ) -> Result<(), Error<BUS::Error, PinE>> {
        let raw = RawU16::from(color).into_inner();
        for _ in 0..count {
            self.write_raw(raw)?;
        }
        Ok(())
    }

    pub fn write_all(&mut self, colors: &[Rgb565]) -> Result<(), Error<BUS::Error, PinE>> {
        for &color in colors {
            self.write(color)?;
        }
        Ok(())
    }

    /// Reads one raw 16-bit GRAM word.
    ///
    /// The first read after the stream is opened returns a stale prefetched
    /// value and must be discarded.
    pub fn read_raw(&mut self) -> Result<u16, Error<BUS::Error, PinE>> {
        self.bus.read_data().map_err(Error::Bus)
    }

    pub fn read(&mut self) -> Result<Rgb565, Error<BUS::Error, PinE>> {
        self.read_raw().map(|raw| Rgb565::from(RawU16::new(raw)))
    }
}

impl<BUS, PinE> Drop for GramStream<'_, BUS, PinE> {
    fn drop(&mut self) {
        *self.state = AddressState::Idle;
    }
}
