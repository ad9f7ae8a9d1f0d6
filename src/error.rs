use mustang_midi::MidiError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AmpError {
    /// Checked before any I/O, never clamped
    #[error("{what} {value} out of range 0..={max}")]
    InvalidRange {
        what: &'static str,
        value: u32,
        max: u32,
    },
    #[error("unknown parameter: {0}")]
    UnknownParameter(String),
    #[error("screen template {template:?} invalid at {position}: {reason}")]
    TemplateParse {
        template: String,
        position: usize,
        reason: &'static str,
    },
    #[error("unknown exercise {0:?}")]
    UnknownExercise(String),
    #[error("unknown hardware generation {0:?}, expected v1 or v2")]
    UnknownGeneration(String),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("configuration: {0}")]
    Config(#[from] config::ConfigError),
}

impl AmpError {
    pub fn out_of_range(what: &'static str, value: impl Into<u32>, max: impl Into<u32>) -> Self {
        AmpError::InvalidRange {
            what,
            value: value.into(),
            max: max.into(),
        }
    }
}

impl From<MidiError> for AmpError {
    fn from(err: MidiError) -> Self {
        match err {
            MidiError::InvalidU4(value) => AmpError::out_of_range("channel", value, 15u8),
            MidiError::InvalidU7(value) => AmpError::out_of_range("data byte", value, 127u8),
        }
    }
}

/// I/O side failures; none are retried here
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("MIDI output port {0:?} not found")]
    PortNotFound(String),
    #[error("MIDI client init failed: {0}")]
    PortInit(String),
    #[error("could not open MIDI output port: {0}")]
    PortOpen(String),
    #[error("MIDI send failed: {0}")]
    MidiSend(#[from] midir::SendError),
    #[error("no device 0x{vendor_id:04x} with product id in {product_ids:04x?}")]
    DeviceNotFound {
        vendor_id: u16,
        product_ids: Vec<u16>,
    },
    #[error("USB: {0}")]
    Usb(#[from] rusb::Error),
    #[error("USB short write, {written} of {expected} bytes")]
    ShortWrite { written: usize, expected: usize },
    #[error("checkpoint: {0}")]
    Checkpoint(#[from] std::io::Error),
}
