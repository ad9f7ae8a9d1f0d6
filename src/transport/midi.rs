//! MIDI side: channel messages written to an externally managed output port.

use crate::devices::fender::mustang::MAX_PRESET;
use crate::error::{AmpError, TransportError};
use crate::transport::{ParameterAddress, Port, Transport, TransportKind};
use core::time::Duration;
use midir::{MidiOutput, MidiOutputConnection};
use mustang_midi::{control_change, program_change, Channel, Message, U4, U7};
use std::thread;

/// Encodes parameters as control/program changes on one channel.
/// Each send is followed by a fixed settle delay, the amp processes messages
/// serially and never acknowledges them.
pub struct MidiEncoder<P> {
    port: P,
    channel: Channel,
    settle: Duration,
}

impl<P: Port> MidiEncoder<P> {
    /// `channel` is 0-15
    pub fn new(port: P, channel: u8, settle: Duration) -> Result<Self, AmpError> {
        let channel = U4::try_from(channel)?;
        Ok(MidiEncoder { port, channel, settle })
    }

    pub fn release(self) -> P {
        self.port
    }

    pub fn control_change(&mut self, control: u8, value: u8) -> Result<(), AmpError> {
        let control = U7::try_from(control)
            .map_err(|_| AmpError::out_of_range("control number", control, 127u8))?;
        let value = U7::try_from(value).map_err(|_| AmpError::out_of_range("value", value, 127u8))?;
        self.write(control_change(self.channel, control, value))
    }

    /// Presets are 0-99 even though the wire allows 127
    pub fn program_change(&mut self, preset: u8) -> Result<(), AmpError> {
        if preset > MAX_PRESET {
            return Err(AmpError::out_of_range("preset", preset, MAX_PRESET));
        }
        self.write(program_change(self.channel, U7::try_from(preset)?))
    }

    fn write(&mut self, message: Message) -> Result<(), AmpError> {
        let bytes = message.encode();
        debug!("{:?} -> {:02x?}", message, bytes.as_slice());
        self.port.write(&bytes)?;
        thread::sleep(self.settle);
        Ok(())
    }
}

impl<P: Port> Transport for MidiEncoder<P> {
    fn kind(&self) -> TransportKind {
        TransportKind::Midi
    }

    fn send(&mut self, address: ParameterAddress, value: u8) -> Result<(), AmpError> {
        match address {
            ParameterAddress::Midi { control_number } => self.control_change(control_number.into(), value),
            ParameterAddress::MidiProgram => self.program_change(value),
            other => Err(AmpError::UnknownParameter(format!("{} is not reachable over MIDI", other))),
        }
    }
}

/// Output port opened through the system MIDI API, closed on drop
pub struct MidiPort {
    connection: MidiOutputConnection,
    name: String,
}

fn client(client_name: &str) -> Result<MidiOutput, TransportError> {
    MidiOutput::new(client_name).map_err(|e| TransportError::PortInit(e.to_string()))
}

impl MidiPort {
    /// Names of all output ports currently visible
    pub fn list(client_name: &str) -> Result<Vec<String>, TransportError> {
        let output = client(client_name)?;
        Ok(output
            .ports()
            .iter()
            .filter_map(|port| output.port_name(port).ok())
            .collect())
    }

    /// Connects to the port named `port_name`, or failing an exact match,
    /// the first port whose name starts with it
    pub fn open(client_name: &str, port_name: &str) -> Result<Self, TransportError> {
        let output = client(client_name)?;
        let ports = output.ports();
        let named: Vec<(String, &midir::MidiOutputPort)> = ports
            .iter()
            .filter_map(|port| output.port_name(port).ok().map(|name| (name, port)))
            .collect();
        let (name, port) = named
            .iter()
            .find(|(name, _)| name == port_name)
            .or_else(|| named.iter().find(|(name, _)| name.starts_with(port_name)))
            .ok_or_else(|| TransportError::PortNotFound(port_name.to_string()))?;
        info!("Opening MIDI port: {}", name);
        let connection = output
            .connect(port, client_name)
            .map_err(|e| TransportError::PortOpen(e.to_string()))?;
        Ok(MidiPort { connection, name: name.clone() })
    }

    /// Creates a virtual output port other applications can connect to
    #[cfg(unix)]
    pub fn create_virtual(client_name: &str, port_name: &str) -> Result<Self, TransportError> {
        use midir::os::unix::VirtualOutput;

        let connection = client(client_name)?
            .create_virtual(port_name)
            .map_err(|e| TransportError::PortOpen(e.to_string()))?;
        info!("Created virtual MIDI port: {}", port_name);
        Ok(MidiPort { connection, name: port_name.to_string() })
    }

    pub fn close(self) {
        debug!("Closing MIDI port: {}", self.name);
        self.connection.close();
    }
}

impl Port for MidiPort {
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.connection.send(bytes)?;
        Ok(())
    }
}
