//! 6502 addressing modes.
//!
//! The 6502 has 13 addressing modes:
//! - Implied: No operand (e.g., CLC, RTS)
//! - Accumulator: Operates on A register (e.g., ASL A)
//! - Immediate: #$nn (literal value)
//! - Zero Page: $nn (8-bit address in page zero)
//! - Zero Page,X: $nn,X (8-bit address + X, wraps in page zero)
//! - Zero Page,Y: $nn,Y (8-bit address + Y, wraps in page zero)
//! - Absolute: $nnnn (16-bit address)
//! - Absolute,X: $nnnn,X (16-bit address + X, may cross page)
//! - Absolute,Y: $nnnn,Y (16-bit address + Y, may cross page)
//! - Indirect: ($nnnn) (JMP only, buggy page boundary behaviour)
//! - Indexed Indirect: ($nn,X) (pointer in zero page indexed by X)
//! - Indirect Indexed: ($nn),Y (zero page pointer + Y)
//! - Relative: Branch offset (-128 to +127)
//!
//! Read-form indexed modes record a one-cycle penalty when indexing crosses
//! a page; store and read-modify-write forms already carry that cycle in the
//! base cycle table.

use crate::Ricoh2A03;
use nes_core::Bus;

/// Addressing mode selector for the generic operand helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Absolute,
    /// Absolute,X for reads: +1 cycle on page cross.
    AbsoluteX,
    /// Absolute,X for stores/RMW: penalty cycle is in the base table.
    AbsoluteXW,
    /// Absolute,Y for reads: +1 cycle on page cross.
    AbsoluteY,
    /// Absolute,Y for stores/RMW: penalty cycle is in the base table.
    AbsoluteYW,
    IndexedIndirect,
    /// (zp),Y for reads: +1 cycle on page cross.
    IndirectIndexed,
    /// (zp),Y for stores/RMW: penalty cycle is in the base table.
    IndirectIndexedW,
}

impl Ricoh2A03 {
    /// Fetch the next byte at PC and increment PC.
    pub(crate) fn fetch(&mut self, bus: &mut impl Bus) -> u8 {
        let value = bus.read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        value
    }

    /// Fetch a 16-bit word (little-endian) at PC.
    pub(crate) fn fetch_word(&mut self, bus: &mut impl Bus) -> u16 {
        let low = self.fetch(bus);
        let high = self.fetch(bus);
        u16::from_le_bytes([low, high])
    }

    /// Read a 16-bit word from memory (little-endian).
    pub(crate) fn read_word(&self, bus: &mut impl Bus, addr: u16) -> u16 {
        let low = bus.read(addr);
        let high = bus.read(addr.wrapping_add(1));
        u16::from_le_bytes([low, high])
    }

    /// Read a 16-bit word with the 6502 page boundary bug (indirect JMP).
    /// If addr is $xxFF, the high byte comes from $xx00 instead of the next
    /// page.
    pub(crate) fn read_word_page_bug(&self, bus: &mut impl Bus, addr: u16) -> u16 {
        let low = bus.read(addr);
        let high_addr = (addr & 0xFF00) | (addr.wrapping_add(1) & 0x00FF);
        let high = bus.read(high_addr);
        u16::from_le_bytes([low, high])
    }

    /// Push a byte onto the stack.
    pub(crate) fn push(&mut self, bus: &mut impl Bus, value: u8) {
        bus.write(0x0100 | u16::from(self.sp), value);
        self.sp = self.sp.wrapping_sub(1);
    }

    /// Pull a byte from the stack.
    pub(crate) fn pull(&mut self, bus: &mut impl Bus) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        bus.read(0x0100 | u16::from(self.sp))
    }

    /// Push a 16-bit word onto the stack (high byte first).
    pub(crate) fn push_word(&mut self, bus: &mut impl Bus, value: u16) {
        self.push(bus, (value >> 8) as u8);
        self.push(bus, value as u8);
    }

    /// Pull a 16-bit word from the stack (low byte first).
    pub(crate) fn pull_word(&mut self, bus: &mut impl Bus) -> u16 {
        let low = self.pull(bus);
        let high = self.pull(bus);
        u16::from_le_bytes([low, high])
    }

    /// Resolve the effective address for the given mode.
    ///
    /// `Immediate` has no address; callers use [`Ricoh2A03::load`] for value
    /// operands.
    pub(crate) fn operand_addr(&mut self, bus: &mut impl Bus, mode: Mode) -> u16 {
        match mode {
            Mode::Immediate => {
                let addr = self.pc;
                self.pc = self.pc.wrapping_add(1);
                addr
            }
            Mode::ZeroPage => u16::from(self.fetch(bus)),
            Mode::ZeroPageX => u16::from(self.fetch(bus).wrapping_add(self.x)),
            Mode::ZeroPageY => u16::from(self.fetch(bus).wrapping_add(self.y)),
            Mode::Absolute => self.fetch_word(bus),
            Mode::AbsoluteX | Mode::AbsoluteXW => {
                let base = self.fetch_word(bus);
                let addr = base.wrapping_add(u16::from(self.x));
                if mode == Mode::AbsoluteX && page_crossed(base, addr) {
                    self.add_cycle();
                }
                addr
            }
            Mode::AbsoluteY | Mode::AbsoluteYW => {
                let base = self.fetch_word(bus);
                let addr = base.wrapping_add(u16::from(self.y));
                if mode == Mode::AbsoluteY && page_crossed(base, addr) {
                    self.add_cycle();
                }
                addr
            }
            Mode::IndexedIndirect => {
                let ptr = self.fetch(bus).wrapping_add(self.x);
                // The pointer wraps within the zero page
                let low = bus.read(u16::from(ptr));
                let high = bus.read(u16::from(ptr.wrapping_add(1)));
                u16::from_le_bytes([low, high])
            }
            Mode::IndirectIndexed | Mode::IndirectIndexedW => {
                let ptr = self.fetch(bus);
                let low = bus.read(u16::from(ptr));
                let high = bus.read(u16::from(ptr.wrapping_add(1)));
                let base = u16::from_le_bytes([low, high]);
                let addr = base.wrapping_add(u16::from(self.y));
                if mode == Mode::IndirectIndexed && page_crossed(base, addr) {
                    self.add_cycle();
                }
                addr
            }
        }
    }

    /// Read the operand value for the given mode.
    pub(crate) fn load(&mut self, bus: &mut impl Bus, mode: Mode) -> u8 {
        if mode == Mode::Immediate {
            self.fetch(bus)
        } else {
            let addr = self.operand_addr(bus, mode);
            bus.read(addr)
        }
    }

    /// Execute a branch if the condition holds.
    ///
    /// A taken branch costs one extra cycle, two if the destination is on a
    /// different page than the instruction following the branch.
    pub(crate) fn branch_if(&mut self, bus: &mut impl Bus, condition: bool) {
        let offset = self.fetch(bus) as i8;
        if condition {
            let target = self.pc.wrapping_add(offset as u16);
            self.add_cycle();
            if page_crossed(self.pc, target) {
                self.add_cycle();
            }
            self.pc = target;
        }
    }
}

/// Whether two addresses fall in different 256-byte pages.
fn page_crossed(a: u16, b: u16) -> bool {
    (a & 0xFF00) != (b & 0xFF00)
}
