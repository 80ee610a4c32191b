/// Register indices of the ILI9328 controller.
///
/// Every register is addressed with a 16-bit index written in command mode,
/// followed by a 16-bit value written (or read) in data mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u16)]
pub enum Register {
    /// Reads back the controller code (0x9328).
    DriverCodeRead = 0x0000,
    /// SS (source shift direction) and SM bits.
    DriverOutputControl1 = 0x0001,
    LcdDrivingControl = 0x0002,
    /// BGR, ID1/ID0 (increment direction) and AM (address update direction).
    EntryMode = 0x0003,
    ResizeControl = 0x0004,
    DisplayControl1 = 0x0007,
    DisplayControl2 = 0x0008,
    DisplayControl3 = 0x0009,
    DisplayControl4 = 0x000A,
    RgbDisplayInterfaceControl1 = 0x000C,
    FrameMarkerPosition = 0x000D,
    RgbDisplayInterfaceControl2 = 0x000F,
    PowerControl1 = 0x0010,
    PowerControl2 = 0x0011,
    PowerControl3 = 0x0012,
    PowerControl4 = 0x0013,
    /// Horizontal GRAM address (AD7..AD0).
    HorizontalGramAddressSet = 0x0020,
    /// Vertical GRAM address (AD16..AD8).
    VerticalGramAddressSet = 0x0021,
    /// Opens a GRAM write or read stream at the current address.
    WriteDataToGram = 0x0022,
    PowerControl7 = 0x0029,
    FrameRateAndColorControl = 0x002B,
    GammaControl1 = 0x0030,
    GammaControl2 = 0x0031,
    GammaControl3 = 0x0032,
    GammaControl4 = 0x0035,
    GammaControl5 = 0x0036,
    GammaControl6 = 0x0037,
    GammaControl7 = 0x0038,
    GammaControl8 = 0x0039,
    GammaControl9 = 0x003C,
    GammaControl10 = 0x003D,
    HorizontalAddressStartPosition = 0x0050,
    HorizontalAddressEndPosition = 0x0051,
    VerticalAddressStartPosition = 0x0052,
    VerticalAddressEndPosition = 0x0053,
    DriverOutputControl2 = 0x0060,
    /// NDL, VLE (vertical scroll enable) and REV bits.
    BaseImageDisplayControl = 0x0061,
    /// Base image scroll line.
    VerticalScrollControl = 0x006A,
    PanelInterfaceControl1 = 0x0090,
}

impl Register {
    pub const fn addr(self) -> u16 {
        self as u16
    }
}

/// Controller code returned by [`Register::DriverCodeRead`].
pub const ILI9328_ID: u16 = 0x9328;

/// Entry mode for portrait: BGR, horizontal and vertical increment, AM=0.
pub(crate) const ENTRY_MODE_PORTRAIT: u16 = 0x1030;
/// Entry mode for landscape: BGR, horizontal decrement, vertical increment, AM=1.
pub(crate) const ENTRY_MODE_LANDSCAPE: u16 = 0x1028;
/// SS=1: source outputs shifted S720 to S1.
pub(crate) const OUTPUT_CONTROL_PORTRAIT: u16 = 0x0100;
pub(crate) const OUTPUT_CONTROL_LANDSCAPE: u16 = 0x0000;
