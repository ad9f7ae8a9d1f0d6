/// Upper nibble of a channel message status byte, the channel goes in the low nibble
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ChannelStatus {
    ControlChange = 0xB0,
    ProgramChange = 0xC0,
}
