//! Controller bring-up sequence.

use crate::command::{Register, ENTRY_MODE_PORTRAIT, OUTPUT_CONTROL_PORTRAIT};

/// One step of an initialization sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InitStep {
    /// Write a literal value to a register.
    Write(Register, u16),
    /// Wait for the panel power rails to settle.
    DelayMs(u32),
    /// Set the GRAM window to cover the whole panel, from the display
    /// properties.
    FullWindow,
    /// Issue the write-to-GRAM command.
    OpenGram,
}

/// Power-on sequence matching the vendor reference.
///
/// Must be replayed literally and in order: the power control stages are
/// timing sensitive.
pub const BRING_UP: &[InitStep] = &[
    InitStep::Write(Register::DriverOutputControl1, OUTPUT_CONTROL_PORTRAIT),
    InitStep::Write(Register::LcdDrivingControl, 0x0700),
    InitStep::Write(Register::EntryMode, ENTRY_MODE_PORTRAIT),
    InitStep::Write(Register::DisplayControl2, 0x0302),
    InitStep::Write(Register::DisplayControl3, 0x0000),
    // FMARK off.
    InitStep::Write(Register::DisplayControl4, 0x0000),
    // Power off and discharge.
    InitStep::Write(Register::PowerControl1, 0x0000),
    InitStep::Write(Register::PowerControl2, 0x0007),
    InitStep::Write(Register::PowerControl3, 0x0000),
    InitStep::Write(Register::PowerControl4, 0x0000),
    InitStep::DelayMs(200),
    InitStep::Write(Register::PowerControl1, 0x14B0),
    InitStep::DelayMs(50),
    InitStep::Write(Register::PowerControl2, 0x0007),
    InitStep::DelayMs(50),
    InitStep::Write(Register::PowerControl3, 0x008E),
    InitStep::Write(Register::PowerControl4, 0x0C00),
    // VCOMH.
    InitStep::Write(Register::PowerControl7, 0x0015),
    InitStep::DelayMs(50),
    InitStep::Write(Register::GammaControl1, 0x0000),
    InitStep::Write(Register::GammaControl2, 0x0107),
    InitStep::Write(Register::GammaControl3, 0x0000),
    InitStep::Write(Register::GammaControl4, 0x0203),
    InitStep::Write(Register::GammaControl5, 0x0402),
    InitStep::Write(Register::GammaControl6, 0x0000),
    InitStep::Write(Register::GammaControl7, 0x0207),
    InitStep::Write(Register::GammaControl8, 0x0000),
    InitStep::Write(Register::GammaControl9, 0x0203),
    InitStep::Write(Register::GammaControl10, 0x0403),
    InitStep::FullWindow,
    // 320 gate lines, scan from G320.
    InitStep::Write(Register::DriverOutputControl2, 0xA700),
    // Enable vertical scrolling (VLE).
    InitStep::Write(Register::BaseImageDisplayControl, 0x0003),
    InitStep::Write(Register::PanelInterfaceControl1, 0x0010),
    // Display on.
    InitStep::Write(Register::DisplayControl1, 0x0133),
    InitStep::DelayMs(50),
    InitStep::OpenGram,
];
