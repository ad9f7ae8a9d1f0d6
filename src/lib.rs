//! Parameter protocol and screen traversal for Fender Mustang amplifiers,
//! over MIDI or the amp's own USB bulk frames.

#[macro_use]
extern crate log;

pub mod devices;
pub mod error;
pub mod locator;
pub mod logger;
pub mod sequencer;
pub mod settings;
pub mod template;
pub mod transport;
