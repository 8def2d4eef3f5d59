//! Core traits for NES emulation.
//!
//! The console is a graph of chips wired to a shared address bus. These
//! traits are the seams between them: a component never stores a pointer to
//! the bus — it receives a bus reference for the duration of a single step.

mod bus;
mod cpu;

pub use bus::{Bus, SimpleBus};
pub use cpu::Cpu;
