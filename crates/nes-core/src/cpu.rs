//! CPU core trait.

use crate::Bus;

/// A CPU that executes instructions against a bus.
///
/// The type parameter `B` is the bus type this CPU operates on. The CPU
/// samples its interrupt lines between instructions: NMI is edge-triggered,
/// IRQ is level-sensitive and held until released.
pub trait Cpu<B: Bus> {
    /// Execute one instruction, or service a pending interrupt.
    /// Returns the number of CPU cycles consumed.
    fn step(&mut self, bus: &mut B) -> u32;

    /// Reset the CPU: load PC from the reset vector at $FFFC-$FFFD.
    fn reset(&mut self, bus: &mut B);

    /// Edge-trigger the non-maskable interrupt line.
    fn nmi(&mut self);

    /// Assert the level-sensitive IRQ line.
    fn irq(&mut self);

    /// Release the IRQ line.
    fn clear_irq(&mut self);

    /// Current program counter.
    fn pc(&self) -> u16;
}
