//! Screen templates and the sweep engine that walks them.
//!
//! A template lists the fields of an edit screen in slot order, one control
//! number per field counting up from a base. `A` is an analog field swept
//! across its range in quarter steps, `D` plus two decimal digits is a
//! discrete field swept through every value up to that maximum. Both sweeps
//! end by returning the field to zero so the display comes to rest.
//!
//! ```text
//! "D02AD04"  =>  Discrete(2) @ base, Analog @ base+1, Discrete(4) @ base+2
//! ```

use crate::error::AmpError;
use crate::transport::{ParameterAddress, Transport};
use core::str::FromStr;

/// Amp edit screen 1: gain, volume, treble, middle, bass
pub const SCREEN1_BASE: u8 = 69;
pub const SCREEN1_FIELDS: usize = 5;

/// Amp edit screen 2 starts right after screen 1
pub const SCREEN2_BASE: u8 = 74;

pub const ANALOG_SWEEP: [u8; 6] = [0, 32, 64, 96, 127, 0];

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Field {
    Analog,
    /// Highest value, sweep is `0..=max`
    Discrete(u8),
}

impl Field {
    /// Values sent to this field, in order, rest value last
    pub fn sweep(&self) -> Vec<u8> {
        match *self {
            Field::Analog => ANALOG_SWEEP.to_vec(),
            Field::Discrete(max) => (0..=max).chain(Some(0)).collect(),
        }
    }
}

/// One value written to one control
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Step {
    pub control: u8,
    pub value: u8,
}

#[derive(Clone, Debug, Eq, PartialEq, Default)]
pub struct ScreenTemplate {
    fields: Vec<Field>,
}

impl ScreenTemplate {
    /// `count` analog fields, like screen 1 or an effect slot's knobs
    pub fn analog(count: usize) -> Self {
        Self::from_fields(core::iter::repeat(Field::Analog).take(count))
    }

    pub fn from_fields(fields: impl IntoIterator<Item = Field>) -> Self {
        ScreenTemplate {
            fields: fields.into_iter().collect(),
        }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Every step the engine will take from `base`, computed before any I/O.
    /// Fails when the last field would land past control 127.
    pub fn plan(&self, base: u8) -> Result<Vec<Step>, AmpError> {
        let last = base as usize + self.len().saturating_sub(1);
        if last > 127 {
            return Err(AmpError::out_of_range("control number", last as u32, 127u32));
        }
        let mut steps = Vec::new();
        for (offset, field) in self.fields.iter().enumerate() {
            let control = base + offset as u8;
            steps.extend(field.sweep().into_iter().map(|value| Step { control, value }));
        }
        Ok(steps)
    }

    /// Sweeps every field in order, advancing one control per field.
    /// Returns the number of values sent.
    pub fn run<T: Transport>(&self, base: u8, transport: &mut T) -> Result<usize, AmpError> {
        let steps = self.plan(base)?;
        for step in &steps {
            transport.send(ParameterAddress::control(step.control)?, step.value)?;
        }
        Ok(steps.len())
    }
}

impl FromStr for ScreenTemplate {
    type Err = AmpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let error = |position: usize, reason: &'static str| AmpError::TemplateParse {
            template: s.to_string(),
            position,
            reason,
        };
        let bytes = s.as_bytes();
        let mut template = ScreenTemplate::default();
        let mut pos = 0;
        while pos < bytes.len() {
            let field = match bytes[pos] {
                b'A' => {
                    pos += 1;
                    Field::Analog
                }
                b'D' => {
                    let digits = bytes
                        .get(pos + 1..pos + 3)
                        .filter(|digits| digits.iter().all(u8::is_ascii_digit))
                        .ok_or_else(|| error(pos, "D must be followed by two digits"))?;
                    pos += 3;
                    Field::Discrete((digits[0] - b'0') * 10 + (digits[1] - b'0'))
                }
                _ => return Err(error(pos, "expected A or D")),
            };
            template.fields.push(field);
        }
        Ok(template)
    }
}
