//! Channel message codec for the parts of MIDI an amp controller needs:
//! control change and program change, with range-checked data bytes.

#![cfg_attr(not(test), no_std)]

mod message;
mod status;
mod u4;
mod u7;

pub use message::{control_change, program_change, Bytes, Message};
pub use status::ChannelStatus;
pub use u4::U4;
pub use u7::U7;

/// MIDI channel, stored as 0-15
pub type Channel = U4;
pub type Control = U7;
pub type Program = U7;
pub type Value = U7;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MidiError {
    InvalidU4(u8),
    InvalidU7(u8),
}

impl core::fmt::Display for MidiError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            MidiError::InvalidU4(value) => write!(f, "{} does not fit in 4 bits", value),
            MidiError::InvalidU7(value) => write!(f, "{} does not fit in 7 bits", value),
        }
    }
}
