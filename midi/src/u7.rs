use crate::MidiError;
use core::convert::TryFrom;

/// A primitive value that can be from 0-0x7F
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct U7(u8);

impl TryFrom<u8> for U7 {
    type Error = MidiError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value > U7::MAX.0 {
            Err(MidiError::InvalidU7(value))
        } else {
            Ok(U7(value))
        }
    }
}

impl From<U7> for u8 {
    fn from(value: U7) -> u8 {
        value.0
    }
}

impl U7 {
    pub const MAX: U7 = U7(0x7F);
    pub const MIN: U7 = U7(0);

    /// For values known at compile time, fails the build when out of range
    pub const fn constant(value: u8) -> U7 {
        assert!(value <= 0x7F);
        U7(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::U4;

    #[test]
    fn should_accept_seven_bit_values() {
        for value in 0..=0x7Fu8 {
            assert_eq!(u8::from(U7::try_from(value).unwrap()), value);
        }
    }

    #[test]
    fn should_reject_eight_bit_values() {
        for value in 0x80..=0xFFu8 {
            assert_eq!(U7::try_from(value), Err(MidiError::InvalidU7(value)));
        }
    }

    #[test]
    fn should_reject_channels_above_fifteen() {
        assert_eq!(U4::try_from(16u8), Err(MidiError::InvalidU4(16)));
        assert_eq!(U4::try_from(15u8), Ok(U4::MAX));
    }
}
