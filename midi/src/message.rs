use crate::status::ChannelStatus;
use crate::{Channel, Control, Program, Value};
use heapless::Vec;

/// Wire form of a single channel message, status byte first
pub type Bytes = Vec<u8, 3>;

/// The channel messages an amp understands
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Message {
    ControlChange(Channel, Control, Value),
    ProgramChange(Channel, Program),
}

pub fn control_change(channel: Channel, control: Control, value: Value) -> Message {
    Message::ControlChange(channel, control, value)
}

pub fn program_change(channel: Channel, program: Program) -> Message {
    Message::ProgramChange(channel, program)
}

impl Message {
    pub fn status(&self) -> ChannelStatus {
        match self {
            Message::ControlChange(..) => ChannelStatus::ControlChange,
            Message::ProgramChange(..) => ChannelStatus::ProgramChange,
        }
    }

    pub fn channel(&self) -> Channel {
        match self {
            Message::ControlChange(channel, _, _) => *channel,
            Message::ProgramChange(channel, _) => *channel,
        }
    }

    /// Complete wire bytes, built in full before anything is written out
    pub fn encode(&self) -> Bytes {
        let mut bytes = Bytes::new();
        // capacity always matches the longest message, pushes cannot fail
        let _ = bytes.push(self.status() as u8 | u8::from(self.channel()));
        match self {
            Message::ControlChange(_, control, value) => {
                let _ = bytes.push(u8::from(*control));
                let _ = bytes.push(u8::from(*value));
            }
            Message::ProgramChange(_, program) => {
                let _ = bytes.push(u8::from(*program));
            }
        }
        bytes
    }
}
