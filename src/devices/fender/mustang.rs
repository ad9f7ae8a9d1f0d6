//! Fender Mustang control map.
//!
//! Control change numbers follow the amp's MIDI implementation chart. Over raw USB
//! only preset selection has a known frame layout; every other parameter is
//! reported as unknown on that transport until its opcode is established.

use crate::error::AmpError;
use crate::transport::usb::FrameTemplate;
use crate::transport::{ParameterAddress, TransportKind};
use core::fmt;
use core::str::FromStr;
use num_enum::TryFromPrimitive;

use Param::*;

pub const VENDOR_ID: u16 = 0x1ed8;
pub const PRODUCT_IDS: &[u16] = &[0x0004, 0x0005, 0x000a, 0x0010, 0x0012, 0x0014, 0x0016];

/// Bulk OUT endpoint
pub const EP_OUT: u8 = 0x01;

pub const MAX_PRESET: u8 = 99;

/// Payload byte carrying the preset number in a preset change frame
pub const PRESET_OFFSET: usize = 4;

pub const TUNER: u8 = 20;
pub const EFFECT_BYPASS: u8 = 22;
pub const AMP_MODEL: u8 = 68;

/// Sent to switches (tuner, bypass, slot enable) to turn them on
pub const ON: u8 = 127;
pub const OFF: u8 = 0;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum AmpKnob {
    Gain = 69,
    Volume = 70,
    Treble = 71,
    Middle = 72,
    Bass = 73,
    Presence = 74,
    NoiseGate = 75,
    Master = 76,
    Gain2 = 77,
}

impl AmpKnob {
    pub const ALL: [AmpKnob; 9] = [
        AmpKnob::Gain,
        AmpKnob::Volume,
        AmpKnob::Treble,
        AmpKnob::Middle,
        AmpKnob::Bass,
        AmpKnob::Presence,
        AmpKnob::NoiseGate,
        AmpKnob::Master,
        AmpKnob::Gain2,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            AmpKnob::Gain => "gain",
            AmpKnob::Volume => "volume",
            AmpKnob::Treble => "treble",
            AmpKnob::Middle => "middle",
            AmpKnob::Bass => "bass",
            AmpKnob::Presence => "presence/cabinet",
            AmpKnob::NoiseGate => "noise gate",
            AmpKnob::Master => "master volume",
            AmpKnob::Gain2 => "gain2/threshold",
        }
    }
}

/// Effect chain slots, each a model select, an enable switch and a run of parameters
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Slot {
    Stomp,
    Modulation,
    Delay,
    Reverb,
}

impl Slot {
    pub const ALL: [Slot; 4] = [Slot::Stomp, Slot::Modulation, Slot::Delay, Slot::Reverb];

    pub fn name(&self) -> &'static str {
        match self {
            Slot::Stomp => "stomp",
            Slot::Modulation => "modulation",
            Slot::Delay => "delay",
            Slot::Reverb => "reverb",
        }
    }

    pub fn model_control(&self) -> u8 {
        match self {
            Slot::Stomp => 78,
            Slot::Modulation => 84,
            Slot::Delay => 90,
            Slot::Reverb => 96,
        }
    }

    pub fn enable_control(&self) -> u8 {
        self.model_control() + 1
    }

    pub fn first_param_control(&self) -> u8 {
        self.model_control() + 2
    }

    pub fn param_count(&self) -> u8 {
        match self {
            Slot::Reverb => 2,
            _ => 4,
        }
    }

    /// Highest model select value, 0 included as "empty"
    pub fn max_model(&self) -> u8 {
        match self {
            Slot::Stomp | Slot::Modulation => 11,
            Slot::Delay | Slot::Reverb => 8,
        }
    }
}

/// Semantic amp parameter, resolved to a wire address per transport by [`address`]
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Param {
    Preset,
    Tuner,
    EffectBypass,
    ModelSelect,
    Amp(AmpKnob),
    SlotModel(Slot),
    SlotEnable(Slot),
    /// Zero-based parameter index inside the slot
    SlotParam(Slot, u8),
}

impl Param {
    /// Control change number, `Preset` uses program change instead
    pub fn control(&self) -> Result<u8, AmpError> {
        match *self {
            Preset => Err(AmpError::UnknownParameter(
                "preset has no control change number".into(),
            )),
            Tuner => Ok(TUNER),
            EffectBypass => Ok(EFFECT_BYPASS),
            ModelSelect => Ok(AMP_MODEL),
            Amp(knob) => Ok(knob as u8),
            SlotModel(slot) => Ok(slot.model_control()),
            SlotEnable(slot) => Ok(slot.enable_control()),
            SlotParam(slot, index) if index < slot.param_count() => {
                Ok(slot.first_param_control() + index)
            }
            SlotParam(slot, index) => Err(AmpError::UnknownParameter(format!(
                "{} has no parameter {}",
                slot.name(),
                index + 1
            ))),
        }
    }

    /// Every parameter with a control change number, in control order
    pub fn catalog() -> impl Iterator<Item = Param> {
        [Tuner, EffectBypass, ModelSelect]
            .into_iter()
            .chain(AmpKnob::ALL.into_iter().map(Amp))
            .chain(Slot::ALL.into_iter().flat_map(|slot| {
                [SlotModel(slot), SlotEnable(slot)]
                    .into_iter()
                    .chain((0..slot.param_count()).map(move |index| SlotParam(slot, index)))
            }))
    }

    /// Accepted values, for listings
    pub fn range_hint(&self) -> String {
        match *self {
            Preset => format!("0-{}", MAX_PRESET),
            Tuner | EffectBypass | SlotEnable(_) => format!("{}=off, {}=on", OFF, ON),
            ModelSelect => format!("0-{}", AMP_MODELS.len()),
            SlotModel(slot) => format!("0-{}", slot.max_model()),
            Amp(_) | SlotParam(..) => "0-127".into(),
        }
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Preset => write!(f, "preset"),
            Tuner => write!(f, "tuner"),
            EffectBypass => write!(f, "effect bypass"),
            ModelSelect => write!(f, "amp model"),
            Amp(knob) => write!(f, "amp {}", knob.name()),
            SlotModel(slot) => write!(f, "{} model", slot.name()),
            SlotEnable(slot) => write!(f, "{} enable", slot.name()),
            SlotParam(slot, index) => write!(f, "{} parameter {}", slot.name(), index + 1),
        }
    }
}

/// Where `param` lives on the given transport
pub fn address(param: Param, transport: TransportKind) -> Result<ParameterAddress, AmpError> {
    match (transport, param) {
        (TransportKind::Midi, Preset) => Ok(ParameterAddress::MidiProgram),
        (TransportKind::Midi, param) => ParameterAddress::control(param.control()?),
        (TransportKind::Usb, Preset) => Ok(ParameterAddress::UsbOffset {
            byte_index: PRESET_OFFSET,
            frame_template: FrameTemplate::PRESET_CHANGE,
        }),
        (TransportKind::Usb, param) => Err(AmpError::UnknownParameter(format!(
            "no USB frame known for {}",
            param
        ))),
    }
}

/// Amp voicings, discriminant is the model select value
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, TryFromPrimitive)]
#[repr(u8)]
pub enum AmpModel {
    Deluxe57 = 1,
    Bassman59 = 2,
    Champ57 = 3,
    DeluxeReverb65 = 4,
    Princeton65 = 5,
    TwinReverb65 = 6,
    SuperSonic = 7,
    British60s = 8,
    British70s = 9,
    British80s = 10,
    American90s = 11,
    Metal2000 = 12,
    StudioPreamp = 13,
    Twin57 = 14,
    Thrift60s = 15,
    BritishWatts = 16,
    BritishColour = 17,
}

impl AmpModel {
    pub fn name(&self) -> &'static str {
        match self {
            AmpModel::Deluxe57 => "Fender '57 Deluxe",
            AmpModel::Bassman59 => "Fender '59 Bassman",
            AmpModel::Champ57 => "Fender '57 Champ",
            AmpModel::DeluxeReverb65 => "Fender '65 Deluxe Reverb",
            AmpModel::Princeton65 => "Fender '65 Princeton",
            AmpModel::TwinReverb65 => "Fender '65 Twin Reverb",
            AmpModel::SuperSonic => "Fender Super-Sonic",
            AmpModel::British60s => "British '60s",
            AmpModel::British70s => "British '70s",
            AmpModel::British80s => "British '80s",
            AmpModel::American90s => "American '90s",
            AmpModel::Metal2000 => "Metal 2000",
            AmpModel::StudioPreamp => "Studio Preamp",
            AmpModel::Twin57 => "Fender '57 Twin",
            AmpModel::Thrift60s => "Fender '60s Thrift",
            AmpModel::BritishWatts => "British Watts",
            AmpModel::BritishColour => "British Colour",
        }
    }
}

/// One selectable amp voicing and the layout of its second edit screen
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct AmpModelRecord {
    pub model: AmpModel,
    /// Screen template, see [`crate::template::ScreenTemplate`]
    pub screen2: &'static str,
    pub v2_only: bool,
}

// sag, bias, noise gate, threshold, cabinet from CC#74 upward.
// On edit screen 2 these replace the AmpKnob names of CC#74-77, cabinet lands on CC#78.
const V1_SCREEN2: &str = "D02AD04D09D12";
const V2_SCREEN2: &str = "D02AD04D09D17";

const fn v1(model: AmpModel) -> AmpModelRecord {
    AmpModelRecord { model, screen2: V1_SCREEN2, v2_only: false }
}

const fn v2(model: AmpModel, screen2: &'static str) -> AmpModelRecord {
    AmpModelRecord { model, screen2, v2_only: true }
}

pub static AMP_MODELS: [AmpModelRecord; 17] = [
    v1(AmpModel::Deluxe57),
    v1(AmpModel::Bassman59),
    v1(AmpModel::Champ57),
    v1(AmpModel::DeluxeReverb65),
    v1(AmpModel::Princeton65),
    v1(AmpModel::TwinReverb65),
    v1(AmpModel::SuperSonic),
    v1(AmpModel::British60s),
    v1(AmpModel::British70s),
    v1(AmpModel::British80s),
    v1(AmpModel::American90s),
    v1(AmpModel::Metal2000),
    // preamp only, no cabinet
    v2(AmpModel::StudioPreamp, "D02AD04D09"),
    v2(AmpModel::Twin57, V2_SCREEN2),
    v2(AmpModel::Thrift60s, V2_SCREEN2),
    v2(AmpModel::BritishWatts, V2_SCREEN2),
    v2(AmpModel::BritishColour, V2_SCREEN2),
];

impl AmpModelRecord {
    pub fn name(&self) -> &'static str {
        self.model.name()
    }

    pub fn select(&self) -> u8 {
        self.model as u8
    }
}

/// Amp firmware family, fixed for a whole session
#[derive(Debug, Copy, Clone, Eq, PartialEq, TryFromPrimitive)]
#[repr(u8)]
pub enum Generation {
    V1 = 1,
    V2 = 2,
}

impl Generation {
    /// Number of values swept on the amp model select control
    pub fn model_select_count(&self) -> u8 {
        match self {
            Generation::V1 => 13,
            Generation::V2 => 18,
        }
    }

    pub fn includes(&self, record: &AmpModelRecord) -> bool {
        !record.v2_only || *self == Generation::V2
    }

    pub fn models(self) -> impl Iterator<Item = &'static AmpModelRecord> {
        AMP_MODELS.iter().filter(move |record| self.includes(record))
    }
}

impl FromStr for Generation {
    type Err = AmpError;

    /// Accepts `v1`, `v2`, `1` or `2`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || AmpError::UnknownGeneration(s.to_string());
        let number = s
            .strip_prefix('v')
            .unwrap_or(s)
            .parse::<u8>()
            .map_err(|_| unknown())?;
        Generation::try_from(number).map_err(|_| unknown())
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", *self as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mustang_midi::U7;

    #[test]
    fn should_map_catalog_controls() {
        assert_eq!(Tuner.control().unwrap(), 20);
        assert_eq!(EffectBypass.control().unwrap(), 22);
        assert_eq!(ModelSelect.control().unwrap(), 68);
        assert_eq!(Amp(AmpKnob::Gain).control().unwrap(), 69);
        assert_eq!(Amp(AmpKnob::Gain2).control().unwrap(), 77);
        assert_eq!(SlotModel(Slot::Stomp).control().unwrap(), 78);
        assert_eq!(SlotEnable(Slot::Stomp).control().unwrap(), 79);
        assert_eq!(SlotParam(Slot::Stomp, 3).control().unwrap(), 83);
        assert_eq!(SlotModel(Slot::Modulation).control().unwrap(), 84);
        assert_eq!(SlotParam(Slot::Delay, 0).control().unwrap(), 92);
        assert_eq!(SlotEnable(Slot::Reverb).control().unwrap(), 97);
        assert_eq!(SlotParam(Slot::Reverb, 1).control().unwrap(), 99);
    }

    #[test]
    fn should_reject_missing_slot_parameter() {
        assert!(matches!(
            SlotParam(Slot::Reverb, 2).control(),
            Err(AmpError::UnknownParameter(_))
        ));
    }

    #[test]
    fn should_cover_controls_twenty_to_ninety_nine_once() {
        let controls: Vec<u8> = Param::catalog().map(|p| p.control().unwrap()).collect();
        let mut expected = vec![20, 22];
        expected.extend(68..=99);
        assert_eq!(controls, expected);
    }

    #[test]
    fn should_address_preset_per_transport() {
        assert_eq!(address(Preset, TransportKind::Midi).unwrap(), ParameterAddress::MidiProgram);
        assert_eq!(
            address(Preset, TransportKind::Usb).unwrap(),
            ParameterAddress::UsbOffset {
                byte_index: 4,
                frame_template: FrameTemplate::PRESET_CHANGE
            }
        );
    }

    #[test]
    fn should_address_knobs_by_control_change() {
        assert_eq!(
            address(Amp(AmpKnob::Treble), TransportKind::Midi).unwrap(),
            ParameterAddress::Midi { control_number: U7::constant(71) }
        );
    }

    #[test]
    fn should_report_unknown_usb_parameter() {
        assert!(matches!(
            address(Amp(AmpKnob::Gain), TransportKind::Usb),
            Err(AmpError::UnknownParameter(_))
        ));
    }

    #[test]
    fn should_count_model_selects_per_generation() {
        assert_eq!(Generation::V1.model_select_count(), 13);
        assert_eq!(Generation::V2.model_select_count(), 18);
    }

    #[test]
    fn should_exclude_v2_models_from_v1() {
        assert_eq!(Generation::V1.models().count(), 12);
        assert!(Generation::V1.models().all(|record| !record.v2_only));
        assert_eq!(Generation::V2.models().count(), 17);
    }

    #[test]
    fn should_select_models_in_order() {
        for (index, record) in AMP_MODELS.iter().enumerate() {
            assert_eq!(record.select() as usize, index + 1);
            assert_eq!(AmpModel::try_from(record.select()).unwrap(), record.model);
        }
    }

    #[test]
    fn should_parse_generation() {
        assert_eq!("v1".parse::<Generation>().unwrap(), Generation::V1);
        assert_eq!("2".parse::<Generation>().unwrap(), Generation::V2);
        assert!(matches!("v3".parse::<Generation>(), Err(AmpError::UnknownGeneration(_))));
        assert!(matches!("x".parse::<Generation>(), Err(AmpError::UnknownGeneration(_))));
    }
}
