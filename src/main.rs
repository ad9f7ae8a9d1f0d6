use clap::{Parser, Subcommand};
use log::LevelFilter;
use mustang_ctl::devices::fender::mustang::{
    self, AmpModel, Generation, Param, AMP_MODEL, AMP_MODELS, EP_OUT, MAX_PRESET,
};
use mustang_ctl::error::{AmpError, TransportError};
use mustang_ctl::locator;
use mustang_ctl::logger;
use mustang_ctl::sequencer::{Checkpoint, Selection, Sequencer};
use mustang_ctl::settings::Settings;
use mustang_ctl::transport::midi::{MidiEncoder, MidiPort};
use mustang_ctl::transport::usb::{self, UsbFrameEncoder};
use mustang_ctl::transport::Transport;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

#[macro_use]
extern crate log;

#[derive(Parser, Debug)]
#[clap(
    name = "mustang_ctl",
    version = env!("CARGO_PKG_VERSION"),
    about = "Drive Fender Mustang amp parameters over MIDI or USB"
)]
struct Args {
    #[clap(short, long, help = "Settings file (TOML)")]
    config: Option<PathBuf>,

    #[clap(short, long, help = "Log every message sent")]
    verbose: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List MIDI output ports and the amp's controls
    List,
    /// Send one control change
    Cc {
        port: String,
        control: u8,
        value: u8,
        #[clap(long, default_value_t = 0, help = "MIDI channel 0-15")]
        channel: u8,
        #[clap(long = "virtual", help = "Create a virtual output port named PORT")]
        virtual_port: bool,
    },
    /// Select a preset with a program change
    Preset {
        port: String,
        preset: u8,
        #[clap(long, default_value_t = 0, help = "MIDI channel 0-15")]
        channel: u8,
        #[clap(long = "virtual", help = "Create a virtual output port named PORT")]
        virtual_port: bool,
    },
    /// Select a preset over raw USB, bypassing MIDI
    UsbPreset { preset: u8 },
    /// Walk the amp through its test exercises
    Test {
        port: String,
        #[clap(value_parser = clap::value_parser!(u8).range(1..=16), help = "MIDI channel 1-16")]
        channel: u8,
        #[clap(help = "Hardware generation, v1 or v2")]
        generation: Generation,
        #[clap(
            default_value = "all",
            help = "all, pc, tuner, efxbypass, amp, stomp, mod, delay or reverb"
        )]
        exercise: Selection,
        #[clap(long = "virtual", help = "Create a virtual output port named PORT")]
        virtual_port: bool,
    },
}

fn open_port(settings: &Settings, name: &str, virtual_port: bool) -> Result<MidiPort, AmpError> {
    if virtual_port {
        #[cfg(unix)]
        return Ok(MidiPort::create_virtual(&settings.client_name, name)?);
        #[cfg(not(unix))]
        return Err(TransportError::PortOpen("virtual ports need a unix MIDI backend".into()).into());
    }
    Ok(MidiPort::open(&settings.client_name, name)?)
}

/// Blocks until ENTER is pressed on the console
fn console(checkpoint: &Checkpoint) -> Result<(), AmpError> {
    print!("Hit ENTER to {}...", checkpoint);
    io::stdout().flush().map_err(TransportError::from)?;
    let mut line = String::new();
    let read = io::stdin().lock().read_line(&mut line).map_err(TransportError::from)?;
    if read == 0 {
        let eof = io::Error::new(io::ErrorKind::UnexpectedEof, "console closed");
        return Err(TransportError::Checkpoint(eof).into());
    }
    Ok(())
}

fn list(settings: &Settings) -> Result<(), AmpError> {
    println!("MIDI output ports:");
    for name in MidiPort::list(&settings.client_name)? {
        println!("  {}", name);
    }
    println!("\nControls:");
    println!("  PC   {:<24} {}", Param::Preset, Param::Preset.range_hint());
    for param in Param::catalog() {
        println!("  {:<4} {:<24} {}", param.control()?, param, param.range_hint());
    }
    println!("\nAmp models (CC#{}):", AMP_MODEL);
    for record in AMP_MODELS.iter() {
        let family = if record.v2_only { "v2" } else { "v1+v2" };
        println!("  {:<3} {:<26} {}", record.select(), record.name(), family);
    }
    Ok(())
}

fn run(args: Args, settings: Settings) -> Result<(), AmpError> {
    match args.command {
        Command::List => list(&settings),
        Command::Cc {
            port,
            control,
            value,
            channel,
            virtual_port,
        } => {
            let port = open_port(&settings, &port, virtual_port)?;
            let mut midi = MidiEncoder::new(port, channel, settings.settle())?;
            if control == AMP_MODEL {
                if let Ok(model) = AmpModel::try_from(value) {
                    info!("Selecting amp model {}", model.name());
                }
            }
            let result = midi.control_change(control, value);
            midi.release().close();
            result
        }
        Command::Preset {
            port,
            preset,
            channel,
            virtual_port,
        } => {
            if preset > MAX_PRESET {
                return Err(AmpError::out_of_range("preset", preset, MAX_PRESET));
            }
            let port = open_port(&settings, &port, virtual_port)?;
            let mut midi = MidiEncoder::new(port, channel, settings.settle())?;
            let result = midi.set(Param::Preset, preset);
            midi.release().close();
            result
        }
        Command::UsbPreset { preset } => {
            if preset > MAX_PRESET {
                return Err(AmpError::out_of_range("preset", preset, MAX_PRESET));
            }
            let context = rusb::Context::new().map_err(TransportError::from)?;
            let (identity, device) = locator::locate(&context, mustang::VENDOR_ID, mustang::PRODUCT_IDS)?;
            info!(
                "Found amp {:04x}:{:04x}",
                identity.vendor_id, identity.product_id
            );
            let handle = usb::open(&device)?;
            let mut amp = UsbFrameEncoder::new(handle, EP_OUT, settings.usb_timeout());
            amp.set(Param::Preset, preset)
        }
        Command::Test {
            port,
            channel,
            generation,
            exercise,
            virtual_port,
        } => {
            let port = open_port(&settings, &port, virtual_port)?;
            let midi = MidiEncoder::new(port, channel - 1, settings.settle())?;
            let mut sequencer = Sequencer::new(midi, console, generation, settings.select_settle());
            let result = sequencer.run(exercise);
            sequencer.into_transport().release().close();
            result
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(err) = logger::init(LevelFilter::Info) {
        eprintln!("Logger unavailable: {}", err);
    }

    let settings = match Settings::load(args.config.as_deref()) {
        Ok(settings) => settings,
        Err(err) => {
            error!("{}", err);
            return ExitCode::FAILURE;
        }
    };
    let level = match settings.level_filter() {
        Ok(_) if args.verbose => LevelFilter::Debug,
        Ok(level) => level,
        Err(_) => LevelFilter::Info,
    };
    log::set_max_level(level);
    debug!("Running with {:?}", settings);

    match run(args, settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
