//! Test Sequencer: ordered exercises driven against one open transport.
//!
//! Physical setup steps (enter edit mode, step to the next screen) are
//! modelled as [`Checkpoint`]s. The sequencer hands each one to a [`Gate`]
//! and resumes once the gate returns, so no console I/O lives in here.

use crate::devices::fender::mustang::{Generation, Param, Slot, AMP_MODEL, OFF, ON};
use crate::error::AmpError;
use crate::template::{Field, ScreenTemplate, SCREEN1_BASE, SCREEN1_FIELDS, SCREEN2_BASE};
use crate::transport::Transport;
use core::fmt;
use core::str::FromStr;
use core::time::Duration;
use std::thread;

/// Presets visited by the program change exercise
pub const PRESET_WALK: [u8; 8] = [0, 25, 75, 99, 60, 40, 20, 0];

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Exercise {
    ProgramChange,
    Tuner,
    Bypass,
    AmpModels,
    Effect(Slot),
}

impl Exercise {
    /// Order used when everything runs
    pub const ALL: [Exercise; 8] = [
        Exercise::ProgramChange,
        Exercise::Tuner,
        Exercise::Bypass,
        Exercise::AmpModels,
        Exercise::Effect(Slot::Stomp),
        Exercise::Effect(Slot::Modulation),
        Exercise::Effect(Slot::Delay),
        Exercise::Effect(Slot::Reverb),
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Exercise::ProgramChange => "pc",
            Exercise::Tuner => "tuner",
            Exercise::Bypass => "efxbypass",
            Exercise::AmpModels => "amp",
            Exercise::Effect(Slot::Stomp) => "stomp",
            Exercise::Effect(Slot::Modulation) => "mod",
            Exercise::Effect(Slot::Delay) => "delay",
            Exercise::Effect(Slot::Reverb) => "reverb",
        }
    }
}

impl FromStr for Exercise {
    type Err = AmpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Exercise::ALL
            .iter()
            .find(|exercise| exercise.name() == s)
            .copied()
            .ok_or_else(|| AmpError::UnknownExercise(s.to_string()))
    }
}

impl fmt::Display for Exercise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub enum Selection {
    #[default]
    All,
    Single(Exercise),
}

impl Selection {
    pub fn exercises(&self) -> &[Exercise] {
        match self {
            Selection::All => &Exercise::ALL,
            Selection::Single(exercise) => core::slice::from_ref(exercise),
        }
    }
}

impl FromStr for Selection {
    type Err = AmpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Selection::All),
            name => Ok(Selection::Single(name.parse()?)),
        }
    }
}

/// Points where the run waits for someone at the amp
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Checkpoint {
    ProgramChange,
    AmpSelect,
    ModelEdit(&'static str),
    AmpScreen1,
    AmpScreen2,
    TunerOn,
    TunerOff,
    BypassOn,
    BypassOff,
    SlotModels(Slot),
    SlotOn(Slot),
    SlotOff(Slot),
}

impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Checkpoint::ProgramChange => write!(f, "run program change test"),
            Checkpoint::AmpSelect => write!(f, "run amp model select test"),
            Checkpoint::ModelEdit(name) => write!(f, "run parameter edit check for {}", name),
            Checkpoint::AmpScreen1 => write!(f, "enter amp edit mode on the amp"),
            Checkpoint::AmpScreen2 => write!(f, "step to amp edit screen 2"),
            Checkpoint::TunerOn => write!(f, "select tuner"),
            Checkpoint::TunerOff => write!(f, "deselect tuner"),
            Checkpoint::BypassOn => write!(f, "select all effects"),
            Checkpoint::BypassOff => write!(f, "bypass all effects"),
            Checkpoint::SlotModels(slot) => write!(f, "open the {} edit screen", slot.name()),
            Checkpoint::SlotOn(slot) => write!(f, "enable {}", slot.name()),
            Checkpoint::SlotOff(slot) => write!(f, "disable {}", slot.name()),
        }
    }
}

/// Suspends the run until the physical step behind `checkpoint` is done
pub trait Gate {
    fn wait(&mut self, checkpoint: &Checkpoint) -> Result<(), AmpError>;
}

impl<F> Gate for F
where
    F: FnMut(&Checkpoint) -> Result<(), AmpError>,
{
    fn wait(&mut self, checkpoint: &Checkpoint) -> Result<(), AmpError> {
        self(checkpoint)
    }
}

/// Runs exercises one at a time over an exclusively owned transport
pub struct Sequencer<T, G> {
    transport: T,
    gate: G,
    generation: Generation,
    /// Extra wait after model select and preset sends
    select_settle: Duration,
}

impl<T: Transport, G: Gate> Sequencer<T, G> {
    pub fn new(transport: T, gate: G, generation: Generation, select_settle: Duration) -> Self {
        Sequencer {
            transport,
            gate,
            generation,
            select_settle,
        }
    }

    /// Give back the transport so the caller can close it
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Stops at the first failing exercise
    pub fn run(&mut self, selection: Selection) -> Result<(), AmpError> {
        for exercise in selection.exercises() {
            self.run_exercise(*exercise)?;
        }
        info!("All tests complete");
        Ok(())
    }

    pub fn run_exercise(&mut self, exercise: Exercise) -> Result<(), AmpError> {
        info!("Running {} ({})", exercise, self.generation);
        let result = match exercise {
            Exercise::ProgramChange => self.program_changes(),
            Exercise::Tuner => self.toggle(Param::Tuner, Checkpoint::TunerOn, Checkpoint::TunerOff),
            Exercise::Bypass => self.toggle(Param::EffectBypass, Checkpoint::BypassOn, Checkpoint::BypassOff),
            Exercise::AmpModels => self.amp_models(),
            Exercise::Effect(slot) => self.effect(slot),
        };
        if let Err(err) = &result {
            error!("{} aborted: {}", exercise, err);
        }
        result
    }

    fn program_changes(&mut self) -> Result<(), AmpError> {
        self.gate.wait(&Checkpoint::ProgramChange)?;
        for preset in PRESET_WALK {
            self.transport.set(Param::Preset, preset)?;
            thread::sleep(self.select_settle);
        }
        Ok(())
    }

    fn toggle(&mut self, param: Param, on: Checkpoint, off: Checkpoint) -> Result<(), AmpError> {
        self.gate.wait(&on)?;
        self.transport.set(param, ON)?;
        self.gate.wait(&off)?;
        self.transport.set(param, OFF)
    }

    fn select_model(&mut self, value: u8) -> Result<(), AmpError> {
        self.transport.set(Param::ModelSelect, value)?;
        thread::sleep(self.select_settle);
        Ok(())
    }

    fn amp_models(&mut self) -> Result<(), AmpError> {
        // every template is checked before the first send
        let screen1 = ScreenTemplate::analog(SCREEN1_FIELDS);
        let mut models = Vec::new();
        for record in self.generation.models() {
            let screen2: ScreenTemplate = record.screen2.parse()?;
            screen2.plan(SCREEN2_BASE)?;
            models.push((record, screen2));
        }

        self.gate.wait(&Checkpoint::AmpSelect)?;
        for value in 0..self.generation.model_select_count() {
            self.select_model(value)?;
        }

        for (record, screen2) in models {
            self.gate.wait(&Checkpoint::ModelEdit(record.name()))?;
            info!("Amp model {} (CC#{}={})", record.name(), AMP_MODEL, record.select());
            self.select_model(record.select())?;
            self.gate.wait(&Checkpoint::AmpScreen1)?;
            screen1.run(SCREEN1_BASE, &mut self.transport)?;
            self.gate.wait(&Checkpoint::AmpScreen2)?;
            screen2.run(SCREEN2_BASE, &mut self.transport)?;
        }
        Ok(())
    }

    fn effect(&mut self, slot: Slot) -> Result<(), AmpError> {
        let models = ScreenTemplate::from_fields([Field::Discrete(slot.max_model())]);
        let params = ScreenTemplate::analog(slot.param_count() as usize);

        self.gate.wait(&Checkpoint::SlotModels(slot))?;
        models.run(slot.model_control(), &mut self.transport)?;
        self.gate.wait(&Checkpoint::SlotOn(slot))?;
        self.transport.set(Param::SlotEnable(slot), ON)?;
        self.gate.wait(&Checkpoint::SlotOff(slot))?;
        self.transport.set(Param::SlotEnable(slot), OFF)?;
        params.run(slot.first_param_control(), &mut self.transport)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::transport::midi::MidiEncoder;
    use crate::transport::mock::{RecordingBulk, RecordingPort};
    use crate::transport::usb::UsbFrameEncoder;

    type Recorded = Vec<Vec<u8>>;

    fn run_midi(generation: Generation, exercise: Exercise) -> (Result<(), AmpError>, Recorded, Vec<Checkpoint>) {
        run_on(RecordingPort::default(), generation, exercise)
    }

    fn run_on(
        port: RecordingPort,
        generation: Generation,
        exercise: Exercise,
    ) -> (Result<(), AmpError>, Recorded, Vec<Checkpoint>) {
        let mut checkpoints = Vec::new();
        let midi = MidiEncoder::new(port, 3, Duration::ZERO).unwrap();
        let gate = |checkpoint: &Checkpoint| -> Result<(), AmpError> {
            checkpoints.push(checkpoint.clone());
            Ok(())
        };
        let mut sequencer = Sequencer::new(midi, gate, generation, Duration::ZERO);
        let result = sequencer.run_exercise(exercise);
        let sent = sequencer.into_transport().release().sent;
        (result, sent, checkpoints)
    }

    fn proceed(_: &Checkpoint) -> Result<(), AmpError> {
        Ok(())
    }

    fn model_selects(sent: &Recorded) -> Vec<u8> {
        sent.iter().filter(|m| m[1] == AMP_MODEL).map(|m| m[2]).collect()
    }

    #[test]
    fn should_parse_exercise_names() {
        assert_eq!("pc".parse::<Exercise>().unwrap(), Exercise::ProgramChange);
        assert_eq!("efxbypass".parse::<Exercise>().unwrap(), Exercise::Bypass);
        assert_eq!("mod".parse::<Exercise>().unwrap(), Exercise::Effect(Slot::Modulation));
        assert!(matches!("amps".parse::<Exercise>(), Err(AmpError::UnknownExercise(_))));
        assert_eq!("all".parse::<Selection>().unwrap(), Selection::All);
        assert_eq!(
            "tuner".parse::<Selection>().unwrap().exercises(),
            &[Exercise::Tuner]
        );
    }

    #[test]
    fn should_keep_default_order() {
        let names: Vec<&str> = Selection::All.exercises().iter().map(Exercise::name).collect();
        assert_eq!(names, ["pc", "tuner", "efxbypass", "amp", "stomp", "mod", "delay", "reverb"]);
    }

    #[test]
    fn should_walk_presets() {
        let (result, sent, checkpoints) = run_midi(Generation::V1, Exercise::ProgramChange);
        result.unwrap();
        assert_eq!(checkpoints, [Checkpoint::ProgramChange]);
        let expected: Recorded = PRESET_WALK.iter().map(|p| vec![0xC3, *p]).collect();
        assert_eq!(sent, expected);
    }

    #[test]
    fn should_toggle_tuner_between_checkpoints() {
        let (result, sent, checkpoints) = run_midi(Generation::V2, Exercise::Tuner);
        result.unwrap();
        assert_eq!(checkpoints, [Checkpoint::TunerOn, Checkpoint::TunerOff]);
        assert_eq!(sent, vec![vec![0xB3, 20, 127], vec![0xB3, 20, 0]]);
    }

    #[test]
    fn should_toggle_bypass() {
        let (result, sent, _) = run_midi(Generation::V1, Exercise::Bypass);
        result.unwrap();
        assert_eq!(sent, vec![vec![0xB3, 22, 127], vec![0xB3, 22, 0]]);
    }

    #[test]
    fn should_sweep_thirteen_selects_on_v1() {
        let (result, sent, _) = run_midi(Generation::V1, Exercise::AmpModels);
        result.unwrap();
        // sweep, then one select per v1 model
        let expected: Vec<u8> = (0..13).chain(1..=12).collect();
        assert_eq!(model_selects(&sent), expected);
    }

    #[test]
    fn should_sweep_eighteen_selects_on_v2() {
        let (result, sent, _) = run_midi(Generation::V2, Exercise::AmpModels);
        result.unwrap();
        let expected: Vec<u8> = (0..18).chain(1..=17).collect();
        assert_eq!(model_selects(&sent), expected);
    }

    #[test]
    fn should_skip_v2_models_on_v1() {
        let (result, sent, checkpoints) = run_midi(Generation::V1, Exercise::AmpModels);
        result.unwrap();
        assert!(!checkpoints.contains(&Checkpoint::ModelEdit("Studio Preamp")));
        assert!(checkpoints.contains(&Checkpoint::ModelEdit("Metal 2000")));
        assert_eq!(
            checkpoints.iter().filter(|c| **c == Checkpoint::AmpScreen2).count(),
            12
        );
        // select sweep + 12 models x (select + 5x6 screen 1 + 41 screen 2)
        assert_eq!(sent.len(), 13 + 12 * (1 + 30 + 41));
    }

    #[test]
    fn should_sweep_studio_preamp_without_cabinet() {
        let (result, sent, _) = run_midi(Generation::V2, Exercise::AmpModels);
        result.unwrap();
        let start = sent.iter().rposition(|m| m[1] == AMP_MODEL && m[2] == 13).unwrap();
        let preamp = &sent[start + 1..start + 1 + 30 + 27];
        assert_eq!(preamp.last().unwrap(), &vec![0xB3, 77, 0]);
        assert_eq!(sent[start + 1 + 30 + 27], vec![0xB3, AMP_MODEL, 14]);
    }

    #[test]
    fn should_sweep_effect_slot() {
        let (result, sent, checkpoints) = run_midi(Generation::V1, Exercise::Effect(Slot::Reverb));
        result.unwrap();
        assert_eq!(
            checkpoints,
            [
                Checkpoint::SlotModels(Slot::Reverb),
                Checkpoint::SlotOn(Slot::Reverb),
                Checkpoint::SlotOff(Slot::Reverb)
            ]
        );
        // 0..=8 plus rest, enable on/off, two analog params
        assert_eq!(sent.len(), 10 + 2 + 12);
        assert_eq!(sent[0], vec![0xB3, 96, 0]);
        assert_eq!(sent[9], vec![0xB3, 96, 0]);
        assert_eq!(sent[10], vec![0xB3, 97, 127]);
        assert_eq!(sent[11], vec![0xB3, 97, 0]);
        assert_eq!(sent[12], vec![0xB3, 98, 0]);
        assert_eq!(sent[23], vec![0xB3, 99, 0]);
    }

    #[test]
    fn should_abort_exercise_on_transport_failure() {
        let port = RecordingPort {
            fail_after: Some(3),
            ..Default::default()
        };
        let (result, sent, _) = run_on(port, Generation::V1, Exercise::ProgramChange);
        assert!(matches!(result, Err(AmpError::Transport(_))));
        assert_eq!(sent.len(), 3);
    }

    #[test]
    fn should_stop_when_gate_refuses() {
        let midi = MidiEncoder::new(RecordingPort::default(), 0, Duration::ZERO).unwrap();
        let refuse = |_: &Checkpoint| -> Result<(), AmpError> {
            let eof = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "console closed");
            Err(TransportError::Checkpoint(eof).into())
        };
        let mut sequencer = Sequencer::new(midi, refuse, Generation::V1, Duration::ZERO);
        assert!(matches!(
            sequencer.run(Selection::All),
            Err(AmpError::Transport(TransportError::Checkpoint(_)))
        ));
        assert!(sequencer.into_transport().release().sent.is_empty());
    }

    #[test]
    fn should_run_presets_over_usb() {
        let usb = UsbFrameEncoder::new(RecordingBulk::default(), 0x01, Duration::from_millis(1000));
        let mut sequencer = Sequencer::new(usb, proceed, Generation::V1, Duration::ZERO);
        sequencer.run_exercise(Exercise::ProgramChange).unwrap();
        let writes = sequencer.into_transport().release().writes;
        assert_eq!(writes.len(), 8);
        assert_eq!(writes[3].1, vec![0x1c, 1, 1, 1, 99, 0, 0, 0]);
    }

    #[test]
    fn should_reject_tuner_over_usb_before_writing() {
        let usb = UsbFrameEncoder::new(RecordingBulk::default(), 0x01, Duration::from_millis(1000));
        let mut sequencer = Sequencer::new(usb, proceed, Generation::V1, Duration::ZERO);
        assert!(matches!(
            sequencer.run_exercise(Exercise::Tuner),
            Err(AmpError::UnknownParameter(_))
        ));
        assert!(sequencer.into_transport().release().writes.is_empty());
    }
}
