//! Driver for ILI9328-based TFT displays with an 8-bit parallel interface.
//!
//! The ILI9328 addresses its registers and GRAM with 16-bit words. With the
//! 8-bit interface every word goes over the bus as two bytes, high byte
//! first. The driver is split in two:
//!
//! - a bus adapter implementing [`ParallelBus`] (write command, write data,
//!   read data). [`Gpio8080`] bit-bangs it over `embedded-hal` pins, but any
//!   implementation will do, e.g. one built on a memory controller.
//! - [`Ili9328`], which builds register access, orientation handling, GRAM
//!   windowing and the drawing primitives on top of those three operations.
//!
//! All operations are blocking. The driver assumes it is the only user of the
//! bus; if you share the display between tasks, lock around whole drawing
//! calls, since an interrupted window/stream sequence corrupts the
//! controller's addressing without any way to detect it.
//!
//! [`Ili9328`] implements [`DrawTarget`] for [`embedded-graphics`].
//!
//! [`DrawTarget`]: embedded_graphics_core::draw_target::DrawTarget
//! [`embedded-graphics`]: https://crates.io/crates/embedded-graphics

#![cfg_attr(not(test), no_std)]

use embedded_graphics_core::pixelcolor::{Rgb565, RgbColor};
use embedded_graphics_core::prelude::{OriginDimensions, Size};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

#[macro_use]
mod fmt;

pub mod bus;
mod command;
mod graphics;
#[cfg(test)]
mod mock;
mod sequence;
mod stream;

pub use bus::{BusTiming, DataPort, Direction, Gpio8080, GpioBusError, ParallelBus};
pub use command::{Register, ILI9328_ID};
pub use sequence::{InitStep, BRING_UP};
pub use stream::GramStream;

use command::{
    ENTRY_MODE_LANDSCAPE, ENTRY_MODE_PORTRAIT, OUTPUT_CONTROL_LANDSCAPE, OUTPUT_CONTROL_PORTRAIT,
};

/// Size and capabilities of a panel.
///
/// Dimensions are in the controller's native (portrait, unrotated) frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisplayProperties {
    pub width: u16,
    pub height: u16,
    /// A resistive touch panel is fitted.
    pub touchscreen: bool,
    /// The orientation can be switched at runtime.
    pub orientation: bool,
    /// Hardware vertical scrolling is available.
    pub hw_scrolling: bool,
}

impl DisplayProperties {
    /// The common 2.4"/2.8" 240x320 module.
    pub const ILI9328_240X320: Self = Self {
        width: 240,
        height: 320,
        touchscreen: true,
        orientation: true,
        hw_scrolling: true,
    };

    /// Number of physical pixels.
    pub const fn pixel_count(&self) -> u32 {
        self.width as u32 * self.height as u32
    }
}

impl Default for DisplayProperties {
    fn default() -> Self {
        Self::ILI9328_240X320
    }
}

/// Logical orientation of the display.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Orientation {
    /// Native frame; the default after reset.
    #[default]
    Portrait,
    /// Rotated by 90 degrees: logical width is the native height.
    Landscape,
}

impl Orientation {
    /// Maps logical coordinates to the native (horizontal, vertical) GRAM
    /// address order.
    ///
    /// This is the only place where logical coordinates are translated to
    /// native register order.
    pub const fn map(self, x: u16, y: u16) -> (u16, u16) {
        match self {
            Self::Portrait => (x, y),
            Self::Landscape => (y, x),
        }
    }

    // (entry mode, driver output control 1)
    const fn registers(self) -> (u16, u16) {
        match self {
            Self::Portrait => (ENTRY_MODE_PORTRAIT, OUTPUT_CONTROL_PORTRAIT),
            Self::Landscape => (ENTRY_MODE_LANDSCAPE, OUTPUT_CONTROL_LANDSCAPE),
        }
    }
}

/// Where the driver is in the window/stream protocol.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AddressState {
    #[default]
    Idle,
    /// A GRAM window has been programmed and the cursor moved to its corner.
    WindowSet,
    /// A [`GramStream`] is alive.
    StreamOpen,
}

/// Driver configuration, applied by [`Ili9328::init`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    pub properties: DisplayProperties,
    pub orientation: Orientation,
    /// Color the whole screen is filled with at the end of initialization.
    pub clear_color: Rgb565,
    pub backlight: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            properties: DisplayProperties::ILI9328_240X320,
            orientation: Orientation::Portrait,
            clear_color: Rgb565::BLACK,
            backlight: true,
        }
    }
}

/// Error type for this driver.
///
/// The controller has no status or acknowledge path, so these are only ever
/// errors propagated from the HAL.
#[derive(Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<BusE, PinE> {
    Bus(BusE),
    Pin(PinE),
}

/// A touch controller brought up after the display.
pub trait Touchscreen {
    type Error;

    fn initialize(&mut self) -> Result<(), Self::Error>;
}

/// The implementation of the driver.
///
/// Owns the bus adapter and the reset and backlight pins. The current
/// orientation is the only state kept on the host side; the GRAM window and
/// cursor live in the controller and are reprogrammed by every primitive that
/// needs them. Outside of [`Ili9328::set_window`] the window covers the whole
/// panel.
pub struct Ili9328<BUS, RST, BL> {
    config: Config,
    orientation: Orientation,
    state: AddressState,

    bus: BUS,
    rst: RST,
    bl: BL,
}

impl<BUS, RST, BL> OriginDimensions for Ili9328<BUS, RST, BL> {
    fn size(&self) -> Size {
        Size::new(u32::from(self.width()), u32::from(self.height()))
    }
}

impl<BUS, RST, BL> Ili9328<BUS, RST, BL> {
    pub fn properties(&self) -> DisplayProperties {
        self.config.properties
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn address_state(&self) -> AddressState {
        self.state
    }

    /// Logical width for the current orientation.
    pub fn width(&self) -> u16 {
        match self.orientation {
            Orientation::Portrait => self.config.properties.width,
            Orientation::Landscape => self.config.properties.height,
        }
    }

    /// Logical height for the current orientation.
    pub fn height(&self) -> u16 {
        match self.orientation {
            Orientation::Portrait => self.config.properties.height,
            Orientation::Landscape => self.config.properties.width,
        }
    }

    /// Consumes the driver and returns the peripherals to you.
    pub fn release(self) -> (BUS, RST, BL) {
        (self.bus, self.rst, self.bl)
    }

    #[cfg(test)]
    pub(crate) fn bus(&mut self) -> &mut BUS {
        &mut self.bus
    }

    fn assert_in_bounds(&self, x: u16, y: u16) {
        assert!(
            x < self.width() && y < self.height(),
            "({}, {}) outside {}x{} display",
            x,
            y,
            self.width(),
            self.height()
        );
    }
}

impl<BUS, RST, BL, PinE> Ili9328<BUS, RST, BL>
where
    BUS: ParallelBus,
    RST: OutputPin<Error = PinE>,
    BL: OutputPin<Error = PinE>,
{
    /// Creates a new driver instance and initializes the display.
    ///
    /// Takes a bus adapter (usually [`Gpio8080`]) and the reset and backlight
    /// output pins. See [`Self::init`] for what happens on the wire.
    ///
    /// # Panics
    ///
    /// If either dimension in `config.properties` is zero.
    pub fn new(
        config: Config,
        bus: BUS,
        rst: RST,
        bl: BL,
        delay: &mut impl DelayNs,
    ) -> Result<Self, Error<BUS::Error, PinE>> {
        let p = config.properties;
        assert!(p.width > 0 && p.height > 0, "empty {}x{} panel", p.width, p.height);
        let mut d = Self {
            config,
            orientation: config.orientation,
            state: AddressState::Idle,
            bus,
            rst,
            bl,
        };

        d.init(delay)?;

        Ok(d)
    }

    /// Hard-resets and re-initializes the display.
    ///
    /// Replays [`BRING_UP`], applies the configured orientation and fills the
    /// screen with the configured clear color. This takes about half a
    /// second, most of it spent in power-rail settling delays and the full
    /// screen fill. Instances returned by [`Self::new`] are already
    /// initialized.
    pub fn init(&mut self, delay: &mut impl DelayNs) -> Result<(), Error<BUS::Error, PinE>> {
        self.set_backlight(self.config.backlight)?;

        // RESET is active low.
        self.rst.set_low().map_err(Error::Pin)?;
        delay.delay_ms(50);
        self.rst.set_high().map_err(Error::Pin)?;
        delay.delay_ms(50);

        let id = self.controller_id()?;
        if id != ILI9328_ID {
            warn!("unexpected controller id {:#x}", id);
        }

        self.run_sequence(BRING_UP, delay)?;
        delay.delay_ms(50);

        self.set_orientation(self.config.orientation)?;
        self.fill(self.config.clear_color)?;
        debug!("display initialized");
        Ok(())
    }

    /// Like [`Self::new`], then hands over to the touch controller.
    ///
    /// The display is brought up once. See [`Self::init_with_touch`] for the
    /// hand-off.
    pub fn new_with_touch<T: Touchscreen>(
        config: Config,
        bus: BUS,
        rst: RST,
        bl: BL,
        delay: &mut impl DelayNs,
        touch: &mut T,
    ) -> Result<Self, Error<BUS::Error, PinE>> {
        let mut d = Self::new(config, bus, rst, bl, delay)?;
        d.initialize_touch(touch);
        Ok(d)
    }

    /// Re-initializes the display, then the touch controller.
    ///
    /// The touch controller is only initialized if the panel properties say
    /// one is fitted. Its result does not affect the display; a failure is
    /// only logged.
    pub fn init_with_touch<T: Touchscreen>(
        &mut self,
        delay: &mut impl DelayNs,
        touch: &mut T,
    ) -> Result<(), Error<BUS::Error, PinE>> {
        self.init(delay)?;
        self.initialize_touch(touch);
        Ok(())
    }

    fn initialize_touch<T: Touchscreen>(&mut self, touch: &mut T) {
        if self.config.properties.touchscreen && touch.initialize().is_err() {
            warn!("touchscreen initialization failed");
        }
    }

    fn run_sequence(
        &mut self,
        steps: &[InitStep],
        delay: &mut impl DelayNs,
    ) -> Result<(), Error<BUS::Error, PinE>> {
        for step in steps {
            debug!("init step: {:?}", step);
            match *step {
                InitStep::Write(register, value) => self.write_register(register, value)?,
                InitStep::DelayMs(ms) => delay.delay_ms(ms),
                InitStep::FullWindow => {
                    let p = self.config.properties;
                    self.write_native_window(0, p.width - 1, 0, p.height - 1)?;
                }
                InitStep::OpenGram => self
                    .bus
                    .write_command(Register::WriteDataToGram.addr())
                    .map_err(Error::Bus)?,
            }
        }
        Ok(())
    }

    /// Turns the backlight on or off. The backlight pin is active low.
    pub fn set_backlight(&mut self, on: bool) -> Result<(), Error<BUS::Error, PinE>> {
        if on {
            self.bl.set_low().map_err(Error::Pin)
        } else {
            self.bl.set_high().map_err(Error::Pin)
        }
    }

    /// Writes `value` to `register`.
    pub fn write_register(
        &mut self,
        register: Register,
        value: u16,
    ) -> Result<(), Error<BUS::Error, PinE>> {
        self.bus.write_command(register.addr()).map_err(Error::Bus)?;
        self.bus.write_data(value).map_err(Error::Bus)
    }

    pub fn read_register(&mut self, register: Register) -> Result<u16, Error<BUS::Error, PinE>> {
        self.bus.write_command(register.addr()).map_err(Error::Bus)?;
        self.bus.read_data().map_err(Error::Bus)
    }

    /// Reads the controller code, [`ILI9328_ID`] on a healthy panel.
    ///
    /// Not cached: every call goes to the controller, so it doubles as a
    /// presence check.
    pub fn controller_id(&mut self) -> Result<u16, Error<BUS::Error, PinE>> {
        let id = self.read_register(Register::DriverCodeRead)?;
        debug!("controller id {:#x}", id);
        Ok(id)
    }

    /// Switches the orientation and moves the cursor to (0, 0).
    pub fn set_orientation(
        &mut self,
        orientation: Orientation,
    ) -> Result<(), Error<BUS::Error, PinE>> {
        debug!("orientation {:?}", orientation);
        let (entry_mode, output_control) = orientation.registers();
        self.write_register(Register::EntryMode, entry_mode)?;
        self.write_register(Register::DriverOutputControl1, output_control)?;
        self.orientation = orientation;
        self.set_cursor(0, 0)
    }

    fn write_native_window(
        &mut self,
        h_start: u16,
        h_end: u16,
        v_start: u16,
        v_end: u16,
    ) -> Result<(), Error<BUS::Error, PinE>> {
        self.write_register(Register::HorizontalAddressStartPosition, h_start)?;
        self.write_register(Register::HorizontalAddressEndPosition, h_end)?;
        self.write_register(Register::VerticalAddressStartPosition, v_start)?;
        self.write_register(Register::VerticalAddressEndPosition, v_end)
    }

    /// Restricts GRAM addressing to the rectangle (x0, y0)-(x1, y1), corners
    /// included, and moves the cursor to (x0, y0).
    ///
    /// Streams wrap inside the window. Every primitive of this driver other
    /// than [`Self::fill_rect`] and [`Self::draw_vertical_span`] assumes the
    /// window covers the whole panel; call [`Self::reset_window`] when done.
    ///
    /// # Panics
    ///
    /// If a corner is outside the display or x0 > x1 or y0 > y1.
    pub fn set_window(
        &mut self,
        x0: u16,
        y0: u16,
        x1: u16,
        y1: u16,
    ) -> Result<(), Error<BUS::Error, PinE>> {
        assert!(x0 <= x1 && y0 <= y1);
        self.assert_in_bounds(x1, y1);
        let (h0, v0) = self.orientation.map(x0, y0);
        let (h1, v1) = self.orientation.map(x1, y1);
        self.write_native_window(h0, h1, v0, v1)?;
        self.set_cursor(x0, y0)?;
        self.state = AddressState::WindowSet;
        Ok(())
    }

    /// Sets the window back to the whole panel and the cursor to (0, 0).
    pub fn reset_window(&mut self) -> Result<(), Error<BUS::Error, PinE>> {
        self.set_window(0, 0, self.width() - 1, self.height() - 1)?;
        self.state = AddressState::Idle;
        Ok(())
    }

    /// Moves the GRAM cursor without touching the window.
    ///
    /// # Panics
    ///
    /// If (x, y) is outside the display.
    pub fn set_cursor(&mut self, x: u16, y: u16) -> Result<(), Error<BUS::Error, PinE>> {
        self.assert_in_bounds(x, y);
        let (h, v) = self.orientation.map(x, y);
        self.write_register(Register::HorizontalGramAddressSet, h)?;
        self.write_register(Register::VerticalGramAddressSet, v)
    }

    /// Starts a pixel stream at the cursor.
    ///
    /// Finish the whole burst before touching any other register; the
    /// returned guard enforces that.
    pub fn open_gram_stream(&mut self) -> Result<GramStream<'_, BUS, PinE>, Error<BUS::Error, PinE>> {
        self.bus
            .write_command(Register::WriteDataToGram.addr())
            .map_err(Error::Bus)?;
        Ok(GramStream::new(&mut self.bus, &mut self.state))
    }

    /// Starts a pixel stream at (0, 0).
    pub fn home(&mut self) -> Result<GramStream<'_, BUS, PinE>, Error<BUS::Error, PinE>> {
        self.set_cursor(0, 0)?;
        self.open_gram_stream()
    }

    /// Reads back the color of a pixel.
    ///
    /// # Panics
    ///
    /// If (x, y) is outside the display.
    pub fn get_pixel(&mut self, x: u16, y: u16) -> Result<Rgb565, Error<BUS::Error, PinE>> {
        self.set_cursor(x, y)?;
        let mut stream = self.open_gram_stream()?;
        // The first read after moving the cursor returns a stale value.
        stream.read_raw()?;
        stream.read()
    }

    /// # Panics
    ///
    /// If (x, y) is outside the display.
    pub fn set_pixel(
        &mut self,
        x: u16,
        y: u16,
        color: Rgb565,
    ) -> Result<(), Error<BUS::Error, PinE>> {
        self.set_cursor(x, y)?;
        self.open_gram_stream()?.write(color)
    }

    /// Writes consecutive pixels starting at (x, y), in the direction the
    /// current orientation draws rows.
    ///
    /// The run is not clipped; keep it within the row.
    ///
    /// # Panics
    ///
    /// If `colors` is empty or (x, y) is outside the display.
    pub fn draw_pixel_run(
        &mut self,
        x: u16,
        y: u16,
        colors: &[Rgb565],
    ) -> Result<(), Error<BUS::Error, PinE>> {
        assert!(!colors.is_empty(), "empty pixel run");
        self.set_cursor(x, y)?;
        self.open_gram_stream()?.write_all(colors)
    }

    /// Draws a horizontal line from x0 to x1 inclusive, in either order.
    ///
    /// Both ends are clamped to the display width.
    ///
    /// # Panics
    ///
    /// If `y` is outside the display.
    pub fn draw_horizontal_span(
        &mut self,
        x0: u16,
        x1: u16,
        y: u16,
        color: Rgb565,
    ) -> Result<(), Error<BUS::Error, PinE>> {
        let last = self.width() - 1;
        let (x0, x1) = (x0.min(x1).min(last), x0.max(x1).min(last));
        self.set_cursor(x0, y)?;
        self.open_gram_stream()?
            .write_repeated(color, u32::from(x1 - x0) + 1)
    }

    /// Draws a vertical line from y0 to y1 inclusive, in either order.
    ///
    /// Both ends are clamped to the display height. Drawn through a
    /// one-column window, so the orientation is never touched; the full
    /// window is restored even if the transfer fails.
    ///
    /// # Panics
    ///
    /// If `x` is outside the display.
    pub fn draw_vertical_span(
        &mut self,
        x: u16,
        y0: u16,
        y1: u16,
        color: Rgb565,
    ) -> Result<(), Error<BUS::Error, PinE>> {
        let last = self.height() - 1;
        let (y0, y1) = (y0.min(y1).min(last), y0.max(y1).min(last));
        self.fill_rect(x, y0, x, y1, color)
    }

    /// Fills the rectangle (x0, y0)-(x1, y1), corners included.
    ///
    /// # Panics
    ///
    /// Same as [`Self::set_window`].
    pub fn fill_rect(
        &mut self,
        x0: u16,
        y0: u16,
        x1: u16,
        y1: u16,
        color: Rgb565,
    ) -> Result<(), Error<BUS::Error, PinE>> {
        assert!(x0 <= x1 && y0 <= y1);
        let count = u32::from(x1 - x0 + 1) * u32::from(y1 - y0 + 1);
        let result = self.set_window(x0, y0, x1, y1).and_then(|()| {
            self.open_gram_stream()?.write_repeated(color, count)
        });
        let restored = self.reset_window();
        result.and(restored)
    }

    /// Fills every physical pixel with `color`.
    pub fn fill(&mut self, color: Rgb565) -> Result<(), Error<BUS::Error, PinE>> {
        let count = self.config.properties.pixel_count();
        self.home()?.write_repeated(color, count)
    }

    /// Scrolls the screen contents vertically using the hardware scroll
    /// register.
    ///
    /// The offset is in native rows and wraps around the native panel
    /// height, whatever the orientation. The controller does not clear the
    /// rows that scroll into view; `fill_color` is accepted for API symmetry
    /// with higher layers and is not used.
    pub fn scroll(
        &mut self,
        pixels: i16,
        _fill_color: Rgb565,
    ) -> Result<(), Error<BUS::Error, PinE>> {
        let rows = i32::from(self.config.properties.height);
        let line = i32::from(pixels).rem_euclid(rows) as u16;
        debug!("scroll to line {}", line);
        self.write_register(Register::VerticalScrollControl, line)
    }

    /// Draws eight horizontal color bands across the native frame.
    pub fn draw_test_pattern(&mut self) -> Result<(), Error<BUS::Error, PinE>> {
        const BANDS: [Rgb565; 8] = [
            Rgb565::BLACK,
            Rgb565::YELLOW,
            Rgb565::MAGENTA,
            Rgb565::RED,
            Rgb565::CYAN,
            Rgb565::GREEN,
            Rgb565::BLUE,
            Rgb565::WHITE,
        ];
        let p = self.config.properties;
        let band_height = (p.height / BANDS.len() as u16).max(1);
        let mut stream = self.home()?;
        for row in 0..p.height {
            let band = usize::from(row / band_height).min(BANDS.len() - 1);
            stream.write_repeated(BANDS[band], u32::from(p.width))?;
        }
        Ok(())
    }
}
