//! Raw USB side: fixed 8 byte vendor command frames written to the bulk OUT
//! endpoint, bypassing MIDI entirely.

use crate::error::{AmpError, TransportError};
use crate::transport::{BulkOut, ParameterAddress, Transport, TransportKind};
use core::time::Duration;
use rusb::{Device, DeviceHandle, UsbContext};

pub const FRAME_LEN: usize = 8;

/// First byte that may carry a value, bytes before it are opcode and flags
const PAYLOAD_START: usize = 4;

/// Fixed part of a command frame. Only preset change is known; further
/// opcodes are added as constants here once their layout is established.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct FrameTemplate {
    pub opcode: u8,
    pub flags: [u8; 3],
    /// Highest value the command accepts
    pub max_value: u8,
}

impl FrameTemplate {
    pub const PRESET_CHANGE: FrameTemplate = FrameTemplate {
        opcode: 0x1c,
        flags: [0x01, 0x01, 0x01],
        max_value: 99,
    };

    /// Builds the whole frame in memory, zero padded
    pub fn build(&self, byte_index: usize, value: u8) -> Result<Frame, AmpError> {
        if !(PAYLOAD_START..FRAME_LEN).contains(&byte_index) {
            return Err(AmpError::out_of_range("frame offset", byte_index as u32, (FRAME_LEN - 1) as u32));
        }
        if value > self.max_value {
            return Err(AmpError::out_of_range("value", value, self.max_value));
        }
        let mut bytes = [0u8; FRAME_LEN];
        bytes[0] = self.opcode;
        bytes[1..PAYLOAD_START].copy_from_slice(&self.flags);
        bytes[byte_index] = value;
        Ok(Frame(bytes))
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Frame([u8; FRAME_LEN]);

impl Frame {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Writes frames to the amp's bulk OUT endpoint with a bounded timeout.
/// Failed writes are reported, never retried.
pub struct UsbFrameEncoder<B> {
    pipe: B,
    endpoint: u8,
    timeout: Duration,
}

impl<B: BulkOut> UsbFrameEncoder<B> {
    pub fn new(pipe: B, endpoint: u8, timeout: Duration) -> Self {
        UsbFrameEncoder { pipe, endpoint, timeout }
    }

    pub fn release(self) -> B {
        self.pipe
    }

    pub fn write_frame(&mut self, frame: &Frame) -> Result<(), AmpError> {
        debug!("USB EP 0x{:02x} <- {:02x?}", self.endpoint, frame.as_bytes());
        let written = self.pipe.write_bulk(self.endpoint, frame.as_bytes(), self.timeout)?;
        if written != FRAME_LEN {
            return Err(TransportError::ShortWrite { written, expected: FRAME_LEN }.into());
        }
        Ok(())
    }
}

impl<B: BulkOut> Transport for UsbFrameEncoder<B> {
    fn kind(&self) -> TransportKind {
        TransportKind::Usb
    }

    fn send(&mut self, address: ParameterAddress, value: u8) -> Result<(), AmpError> {
        match address {
            ParameterAddress::UsbOffset { byte_index, frame_template } => {
                let frame = frame_template.build(byte_index, value)?;
                self.write_frame(&frame)
            }
            other => Err(AmpError::UnknownParameter(format!("{} is not reachable over USB", other))),
        }
    }
}

impl<T: UsbContext> BulkOut for DeviceHandle<T> {
    fn write_bulk(&mut self, endpoint: u8, frame: &[u8], timeout: Duration) -> Result<usize, TransportError> {
        Ok(DeviceHandle::write_bulk(self, endpoint, frame, timeout)?)
    }
}

/// Opens the amp and puts it in a known state. Reset and configuration
/// failures are only logged, the amp often works regardless.
pub fn open<T: UsbContext>(device: &Device<T>) -> Result<DeviceHandle<T>, AmpError> {
    let mut handle = device.open().map_err(TransportError::Usb)?;
    if let Err(err) = handle.reset() {
        warn!("Could not reset device: {}", err);
    }
    if let Err(err) = handle.set_active_configuration(1) {
        warn!("Could not set configuration: {}", err);
    }
    if let Err(err) = handle.set_auto_detach_kernel_driver(true) {
        debug!("Kernel driver auto-detach unavailable: {}", err);
    }
    if let Err(err) = handle.claim_interface(0) {
        warn!("Could not claim interface 0: {}", err);
    }
    Ok(handle)
}
