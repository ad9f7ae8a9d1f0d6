//! The "set parameter" capability, over MIDI or the amp's raw USB frames.

use crate::devices::fender::mustang::{self, Param};
use crate::error::{AmpError, TransportError};
use core::fmt;
use mustang_midi::U7;
use usb::FrameTemplate;

pub mod midi;
pub mod usb;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TransportKind {
    Midi,
    Usb,
}

/// Where a value is placed on the wire
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ParameterAddress {
    /// Control change
    Midi { control_number: U7 },
    /// Program change, the value is the preset number
    MidiProgram,
    /// Value byte inside a vendor command frame
    UsbOffset {
        byte_index: usize,
        frame_template: FrameTemplate,
    },
}

impl ParameterAddress {
    pub fn control(control_number: u8) -> Result<Self, AmpError> {
        let control_number = U7::try_from(control_number)
            .map_err(|_| AmpError::out_of_range("control number", control_number, 127u8))?;
        Ok(ParameterAddress::Midi { control_number })
    }
}

impl fmt::Display for ParameterAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterAddress::Midi { control_number } => write!(f, "CC#{}", u8::from(*control_number)),
            ParameterAddress::MidiProgram => write!(f, "program change"),
            ParameterAddress::UsbOffset { byte_index, frame_template } => {
                write!(f, "USB frame 0x{:02x}[{}]", frame_template.opcode, byte_index)
            }
        }
    }
}

/// Sets amp parameters over one wire. Sends are strictly sequential and each one
/// blocks until the amp has had time to settle, there is no acknowledgment.
pub trait Transport {
    fn kind(&self) -> TransportKind;

    /// Range checks and encodes fully in memory, then transmits.
    /// Nothing is written when the value or address is rejected.
    fn send(&mut self, address: ParameterAddress, value: u8) -> Result<(), AmpError>;

    /// Resolve `param` through the catalog, then send
    fn set(&mut self, param: Param, value: u8) -> Result<(), AmpError> {
        let address = mustang::address(param, self.kind())?;
        self.send(address, value)
    }
}

/// Raw byte sink for complete MIDI messages
pub trait Port {
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError>;
}

/// Raw bulk OUT pipe
pub trait BulkOut {
    /// Returns the number of bytes written
    fn write_bulk(&mut self, endpoint: u8, frame: &[u8], timeout: core::time::Duration) -> Result<usize, TransportError>;
}
