use crate::MidiError;
use core::convert::TryFrom;

/// A primitive value that can be from 0-0x0F
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct U4(u8);

impl TryFrom<u8> for U4 {
    type Error = MidiError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value > U4::MAX.0 {
            Err(MidiError::InvalidU4(value))
        } else {
            Ok(U4(value))
        }
    }
}

impl From<U4> for u8 {
    fn from(value: U4) -> u8 {
        value.0
    }
}

impl U4 {
    pub const MAX: U4 = U4(0x0F);
    pub const MIN: U4 = U4(0);
}
