//! Cycle-accurate NES console.
//!
//! The CPU executes one instruction at a time; every CPU cycle it consumes
//! advances the PPU by three dots and the APU by one tick. One frame is
//! 341 dots x 262 scanlines, ~29780 CPU cycles.
//!
//! Cartridge parsing, the PPU pipeline, controllers, the APU register file,
//! save states, and the top-level [`Nes`] system all live here; the CPU
//! itself is the `ricoh-2a03` crate.

mod apu;
mod bus;
pub mod capture;
mod cartridge;
mod config;
mod controller;
pub mod input;
mod nes;
pub mod palette;
pub mod ppu;
mod snapshot;

pub use bus::NesBus;
pub use cartridge::{CartridgeError, Mapper, Mirroring};
pub use config::{ntsc, NesConfig};
pub use controller::Controller;
pub use input::{InputQueue, NesButton};
pub use nes::{InputDevice, Nes, VideoDevice};
pub use snapshot::Snapshot;
