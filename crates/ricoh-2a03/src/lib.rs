//! Ricoh 2A03 CPU emulator.
//!
//! The 2A03 is an NMOS 6502 with the decimal mode removed — the D flag is
//! storable but has no effect on ADC/SBC. This implements the full
//! documented instruction set with per-opcode base cycle costs taken from a
//! fixed 256-entry table, plus the extra cycles incurred by page-crossing
//! indexed reads and taken branches.
//!
//! Dispatch is a `match` over the opcode byte delegating to a small set of
//! generic routines parameterised by addressing mode. Undocumented opcodes
//! execute as NOPs of the appropriate operand length; unknown opcodes
//! advance PC past the opcode byte and consume their tabled cycles.

use nes_core::{Bus, Cpu};

mod addressing;
mod status;

use addressing::Mode;
use status::Status;

/// Base CPU cycles per opcode.
///
/// Indexed-read page crossings and taken branches add to this via the
/// per-instruction extra-cycle latch. Entries of 0 are JAM opcodes.
#[rustfmt::skip]
const CYCLES: [u8; 256] = [
    //       0 1 2 3 4 5 6 7 8 9 A B C D E F
    /* 0x00 */ 7,6,0,8,3,3,5,5,3,2,2,2,4,4,6,6,
    /* 0x10 */ 2,5,0,8,4,4,6,6,2,4,2,7,4,4,7,7,
    /* 0x20 */ 6,6,0,8,3,3,5,5,4,2,2,2,4,4,6,6,
    /* 0x30 */ 2,5,0,8,4,4,6,6,2,4,2,7,4,4,7,7,
    /* 0x40 */ 6,6,0,8,3,3,5,5,3,2,2,2,3,4,6,6,
    /* 0x50 */ 2,5,0,8,4,4,6,6,2,4,2,7,4,4,7,7,
    /* 0x60 */ 6,6,0,8,3,3,5,5,4,2,2,2,5,4,6,6,
    /* 0x70 */ 2,5,0,8,4,4,6,6,2,4,2,7,4,4,7,7,
    /* 0x80 */ 2,6,2,6,3,3,3,3,2,2,2,2,4,4,4,4,
    /* 0x90 */ 2,6,0,6,4,4,4,4,2,5,2,5,5,5,5,5,
    /* 0xA0 */ 2,6,2,6,3,3,3,3,2,2,2,2,4,4,4,4,
    /* 0xB0 */ 2,5,0,5,4,4,4,4,2,4,2,4,4,4,4,4,
    /* 0xC0 */ 2,6,2,8,3,3,5,5,2,2,2,2,4,4,6,6,
    /* 0xD0 */ 2,5,0,8,4,4,6,6,2,4,2,7,4,4,7,7,
    /* 0xE0 */ 2,6,2,8,3,3,5,5,2,2,2,2,4,4,6,6,
    /* 0xF0 */ 2,5,0,8,4,4,6,6,2,4,2,7,4,4,7,7,
];

/// NMI vector address.
const NMI_VECTOR: u16 = 0xFFFA;
/// Reset vector address.
const RESET_VECTOR: u16 = 0xFFFC;
/// IRQ/BRK vector address.
const IRQ_VECTOR: u16 = 0xFFFE;

/// The Ricoh 2A03 CPU state.
pub struct Ricoh2A03 {
    /// Accumulator
    pub(crate) a: u8,
    /// X index register
    pub(crate) x: u8,
    /// Y index register
    pub(crate) y: u8,
    /// Stack pointer (stack lives at $0100-$01FF)
    pub(crate) sp: u8,
    /// Program counter
    pub(crate) pc: u16,
    /// Status register
    pub(crate) p: Status,

    /// NMI line: edge latch, cleared on service.
    nmi_pending: bool,
    /// IRQ line: level, held until released by the asserting device.
    irq_line: bool,

    /// Extra cycles accrued by the current instruction (page crossings,
    /// taken branches).
    result_cycles: u32,
    /// Address of the most recently fetched opcode.
    last_pc: u16,
    /// Most recently fetched opcode byte.
    last_op: u8,
}

impl Ricoh2A03 {
    #[must_use]
    pub fn new() -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            sp: 0xFD, // After reset, SP is $FD
            pc: 0,
            p: Status::power_on(),
            nmi_pending: false,
            irq_line: false,
            result_cycles: 0,
            last_pc: 0,
            last_op: 0,
        }
    }

    // =========================================================================
    // Register accessors
    // =========================================================================

    #[must_use]
    pub fn a(&self) -> u8 {
        self.a
    }

    #[must_use]
    pub fn x(&self) -> u8 {
        self.x
    }

    #[must_use]
    pub fn y(&self) -> u8 {
        self.y
    }

    #[must_use]
    pub fn sp(&self) -> u8 {
        self.sp
    }

    #[must_use]
    pub fn status(&self) -> u8 {
        self.p.bits()
    }

    /// Address of the most recently executed opcode.
    #[must_use]
    pub fn last_pc(&self) -> u16 {
        self.last_pc
    }

    /// Most recently executed opcode byte.
    #[must_use]
    pub fn last_op(&self) -> u8 {
        self.last_op
    }

    #[must_use]
    pub fn nmi_pending(&self) -> bool {
        self.nmi_pending
    }

    #[must_use]
    pub fn irq_line(&self) -> bool {
        self.irq_line
    }

    pub fn set_a(&mut self, value: u8) {
        self.a = value;
    }

    pub fn set_x(&mut self, value: u8) {
        self.x = value;
    }

    pub fn set_y(&mut self, value: u8) {
        self.y = value;
    }

    pub fn set_sp(&mut self, value: u8) {
        self.sp = value;
    }

    pub fn set_pc(&mut self, value: u16) {
        self.pc = value;
    }

    pub fn set_status(&mut self, value: u8) {
        self.p = Status::from_bits(value);
    }

    pub fn set_nmi_pending(&mut self, pending: bool) {
        self.nmi_pending = pending;
    }

    pub fn set_irq_line(&mut self, asserted: bool) {
        self.irq_line = asserted;
    }

    /// Record one extra cycle for the current instruction.
    pub(crate) fn add_cycle(&mut self) {
        self.result_cycles += 1;
    }

    // =========================================================================
    // ALU operations
    // =========================================================================

    /// ADC - Add with Carry. Binary only; the 2A03 ignores the D flag.
    fn adc(&mut self, value: u8) {
        let a = u16::from(self.a);
        let v = u16::from(value);
        let c = u16::from(self.p.contains(Status::CARRY));

        let result = a + v + c;
        let result8 = result as u8;

        self.p.assign(Status::CARRY, result > 0xFF);
        self.p.assign(
            Status::OVERFLOW,
            (self.a ^ result8) & (value ^ result8) & 0x80 != 0,
        );
        self.p.update_zn(result8);
        self.a = result8;
    }

    /// SBC - Subtract with Carry (borrow is the inverted carry).
    fn sbc(&mut self, value: u8) {
        let a = u16::from(self.a);
        let v = u16::from(value);
        let borrow = u16::from(!self.p.contains(Status::CARRY));

        let result = a.wrapping_sub(v).wrapping_sub(borrow);
        let result8 = result as u8;

        self.p.assign(Status::CARRY, result < 0x100);
        self.p.assign(
            Status::OVERFLOW,
            (self.a ^ value) & (self.a ^ result8) & 0x80 != 0,
        );
        self.p.update_zn(result8);
        self.a = result8;
    }

    /// CMP/CPX/CPY - compare a register against memory. C is reg >= value.
    fn compare(&mut self, reg: u8, value: u8) {
        let result = reg.wrapping_sub(value);
        self.p.assign(Status::CARRY, reg >= value);
        self.p.update_zn(result);
    }

    /// ASL - Arithmetic Shift Left. C takes the bit shifted out.
    fn asl(&mut self, value: u8) -> u8 {
        self.p.assign(Status::CARRY, value & 0x80 != 0);
        let result = value << 1;
        self.p.update_zn(result);
        result
    }

    /// LSR - Logical Shift Right.
    fn lsr(&mut self, value: u8) -> u8 {
        self.p.assign(Status::CARRY, value & 0x01 != 0);
        let result = value >> 1;
        self.p.update_zn(result);
        result
    }

    /// ROL - Rotate Left through carry.
    fn rol(&mut self, value: u8) -> u8 {
        let carry_in = u8::from(self.p.contains(Status::CARRY));
        self.p.assign(Status::CARRY, value & 0x80 != 0);
        let result = (value << 1) | carry_in;
        self.p.update_zn(result);
        result
    }

    /// ROR - Rotate Right through carry.
    fn ror(&mut self, value: u8) -> u8 {
        let carry_in = if self.p.contains(Status::CARRY) {
            0x80
        } else {
            0
        };
        self.p.assign(Status::CARRY, value & 0x01 != 0);
        let result = (value >> 1) | carry_in;
        self.p.update_zn(result);
        result
    }

    /// BIT - Bit Test. Z from A & M, N and V copied from M bits 7 and 6.
    fn bit(&mut self, value: u8) {
        self.p.assign(Status::ZERO, self.a & value == 0);
        self.p.assign(Status::NEGATIVE, value & 0x80 != 0);
        self.p.assign(Status::OVERFLOW, value & 0x40 != 0);
    }
}

impl Default for Ricoh2A03 {
    fn default() -> Self {
        Self::new()
    }
}

impl Ricoh2A03 {
    /// Execute one instruction, or service a pending interrupt.
    /// Returns the number of CPU cycles consumed.
    pub fn step<B: Bus>(&mut self, bus: &mut B) -> u32 {
        // Interrupts are sampled between instructions. NMI wins.
        if self.nmi_pending {
            self.nmi_pending = false;
            return self.service_interrupt(bus, NMI_VECTOR);
        }
        if self.irq_line && !self.p.contains(Status::IRQ_DISABLE) {
            return self.service_interrupt(bus, IRQ_VECTOR);
        }

        self.result_cycles = 0;
        self.last_pc = self.pc;
        let opcode = self.fetch(bus);
        self.last_op = opcode;
        self.execute(bus, opcode);
        u32::from(CYCLES[opcode as usize]) + self.result_cycles
    }

    /// Reset: load PC from $FFFC-$FFFD, SP to $FD, P to $24.
    pub fn reset<B: Bus>(&mut self, bus: &mut B) {
        self.pc = self.read_word(bus, RESET_VECTOR);
        self.sp = 0xFD;
        self.p = Status::power_on();
        self.a = 0;
        self.x = 0;
        self.y = 0;
        self.nmi_pending = false;
        self.irq_line = false;
        self.result_cycles = 0;
    }

    /// Edge-trigger the NMI line.
    pub fn nmi(&mut self) {
        self.nmi_pending = true;
    }

    /// Assert the level-sensitive IRQ line.
    pub fn irq(&mut self) {
        self.irq_line = true;
    }

    /// Release the IRQ line.
    pub fn clear_irq(&mut self) {
        self.irq_line = false;
    }

    /// Current program counter.
    #[must_use]
    pub fn pc(&self) -> u16 {
        self.pc
    }
}

impl<B: Bus> Cpu<B> for Ricoh2A03 {
    fn step(&mut self, bus: &mut B) -> u32 {
        Ricoh2A03::step(self, bus)
    }

    fn reset(&mut self, bus: &mut B) {
        Ricoh2A03::reset(self, bus)
    }

    fn nmi(&mut self) {
        Ricoh2A03::nmi(self)
    }

    fn irq(&mut self) {
        Ricoh2A03::irq(self)
    }

    fn clear_irq(&mut self) {
        Ricoh2A03::clear_irq(self)
    }

    fn pc(&self) -> u16 {
        Ricoh2A03::pc(self)
    }
}

impl Ricoh2A03 {
    /// Hardware interrupt entry: push PC then P (B clear), set I, load the
    /// vector. Takes 7 cycles.
    fn service_interrupt(&mut self, bus: &mut impl Bus, vector: u16) -> u32 {
        self.push_word(bus, self.pc);
        let pushed = self.p.pushed(false);
        self.push(bus, pushed);
        self.p.assign(Status::IRQ_DISABLE, true);
        self.pc = self.read_word(bus, vector);
        7
    }

    fn execute(&mut self, bus: &mut impl Bus, opcode: u8) {
        match opcode {
            // =================================================================
            // Load/Store
            // =================================================================
            0xA9 => self.lda(bus, Mode::Immediate),
            0xA5 => self.lda(bus, Mode::ZeroPage),
            0xB5 => self.lda(bus, Mode::ZeroPageX),
            0xAD => self.lda(bus, Mode::Absolute),
            0xBD => self.lda(bus, Mode::AbsoluteX),
            0xB9 => self.lda(bus, Mode::AbsoluteY),
            0xA1 => self.lda(bus, Mode::IndexedIndirect),
            0xB1 => self.lda(bus, Mode::IndirectIndexed),

            0xA2 => self.ldx(bus, Mode::Immediate),
            0xA6 => self.ldx(bus, Mode::ZeroPage),
            0xB6 => self.ldx(bus, Mode::ZeroPageY),
            0xAE => self.ldx(bus, Mode::Absolute),
            0xBE => self.ldx(bus, Mode::AbsoluteY),

            0xA0 => self.ldy(bus, Mode::Immediate),
            0xA4 => self.ldy(bus, Mode::ZeroPage),
            0xB4 => self.ldy(bus, Mode::ZeroPageX),
            0xAC => self.ldy(bus, Mode::Absolute),
            0xBC => self.ldy(bus, Mode::AbsoluteX),

            0x85 => self.store(bus, Mode::ZeroPage, |cpu| cpu.a),
            0x95 => self.store(bus, Mode::ZeroPageX, |cpu| cpu.a),
            0x8D => self.store(bus, Mode::Absolute, |cpu| cpu.a),
            0x9D => self.store(bus, Mode::AbsoluteXW, |cpu| cpu.a),
            0x99 => self.store(bus, Mode::AbsoluteYW, |cpu| cpu.a),
            0x81 => self.store(bus, Mode::IndexedIndirect, |cpu| cpu.a),
            0x91 => self.store(bus, Mode::IndirectIndexedW, |cpu| cpu.a),

            0x86 => self.store(bus, Mode::ZeroPage, |cpu| cpu.x),
            0x96 => self.store(bus, Mode::ZeroPageY, |cpu| cpu.x),
            0x8E => self.store(bus, Mode::Absolute, |cpu| cpu.x),

            0x84 => self.store(bus, Mode::ZeroPage, |cpu| cpu.y),
            0x94 => self.store(bus, Mode::ZeroPageX, |cpu| cpu.y),
            0x8C => self.store(bus, Mode::Absolute, |cpu| cpu.y),

            // =================================================================
            // Register transfers
            // =================================================================
            0xAA => {
                // TAX
                self.x = self.a;
                self.p.update_zn(self.x);
            }
            0xA8 => {
                // TAY
                self.y = self.a;
                self.p.update_zn(self.y);
            }
            0x8A => {
                // TXA
                self.a = self.x;
                self.p.update_zn(self.a);
            }
            0x98 => {
                // TYA
                self.a = self.y;
                self.p.update_zn(self.a);
            }
            0xBA => {
                // TSX
                self.x = self.sp;
                self.p.update_zn(self.x);
            }
            0x9A => {
                // TXS (no flags)
                self.sp = self.x;
            }

            // =================================================================
            // Stack
            // =================================================================
            0x48 => {
                // PHA
                let a = self.a;
                self.push(bus, a);
            }
            0x08 => {
                // PHP pushes with B set
                let pushed = self.p.pushed(true);
                self.push(bus, pushed);
            }
            0x68 => {
                // PLA
                self.a = self.pull(bus);
                self.p.update_zn(self.a);
            }
            0x28 => {
                // PLP ignores the pushed B bit
                let bits = self.pull(bus);
                self.p = Status::pulled(bits);
            }

            // =================================================================
            // Arithmetic
            // =================================================================
            0x69 => self.alu(bus, Mode::Immediate, Self::adc),
            0x65 => self.alu(bus, Mode::ZeroPage, Self::adc),
            0x75 => self.alu(bus, Mode::ZeroPageX, Self::adc),
            0x6D => self.alu(bus, Mode::Absolute, Self::adc),
            0x7D => self.alu(bus, Mode::AbsoluteX, Self::adc),
            0x79 => self.alu(bus, Mode::AbsoluteY, Self::adc),
            0x61 => self.alu(bus, Mode::IndexedIndirect, Self::adc),
            0x71 => self.alu(bus, Mode::IndirectIndexed, Self::adc),

            0xE9 => self.alu(bus, Mode::Immediate, Self::sbc),
            0xE5 => self.alu(bus, Mode::ZeroPage, Self::sbc),
            0xF5 => self.alu(bus, Mode::ZeroPageX, Self::sbc),
            0xED => self.alu(bus, Mode::Absolute, Self::sbc),
            0xFD => self.alu(bus, Mode::AbsoluteX, Self::sbc),
            0xF9 => self.alu(bus, Mode::AbsoluteY, Self::sbc),
            0xE1 => self.alu(bus, Mode::IndexedIndirect, Self::sbc),
            0xF1 => self.alu(bus, Mode::IndirectIndexed, Self::sbc),

            // =================================================================
            // Compares
            // =================================================================
            0xC9 => self.cmp_reg(bus, Mode::Immediate, |cpu| cpu.a),
            0xC5 => self.cmp_reg(bus, Mode::ZeroPage, |cpu| cpu.a),
            0xD5 => self.cmp_reg(bus, Mode::ZeroPageX, |cpu| cpu.a),
            0xCD => self.cmp_reg(bus, Mode::Absolute, |cpu| cpu.a),
            0xDD => self.cmp_reg(bus, Mode::AbsoluteX, |cpu| cpu.a),
            0xD9 => self.cmp_reg(bus, Mode::AbsoluteY, |cpu| cpu.a),
            0xC1 => self.cmp_reg(bus, Mode::IndexedIndirect, |cpu| cpu.a),
            0xD1 => self.cmp_reg(bus, Mode::IndirectIndexed, |cpu| cpu.a),

            0xE0 => self.cmp_reg(bus, Mode::Immediate, |cpu| cpu.x),
            0xE4 => self.cmp_reg(bus, Mode::ZeroPage, |cpu| cpu.x),
            0xEC => self.cmp_reg(bus, Mode::Absolute, |cpu| cpu.x),

            0xC0 => self.cmp_reg(bus, Mode::Immediate, |cpu| cpu.y),
            0xC4 => self.cmp_reg(bus, Mode::ZeroPage, |cpu| cpu.y),
            0xCC => self.cmp_reg(bus, Mode::Absolute, |cpu| cpu.y),

            // =================================================================
            // Increments/Decrements
            // =================================================================
            0xE6 => self.rmw(bus, Mode::ZeroPage, Self::inc_value),
            0xF6 => self.rmw(bus, Mode::ZeroPageX, Self::inc_value),
            0xEE => self.rmw(bus, Mode::Absolute, Self::inc_value),
            0xFE => self.rmw(bus, Mode::AbsoluteXW, Self::inc_value),

            0xC6 => self.rmw(bus, Mode::ZeroPage, Self::dec_value),
            0xD6 => self.rmw(bus, Mode::ZeroPageX, Self::dec_value),
            0xCE => self.rmw(bus, Mode::Absolute, Self::dec_value),
            0xDE => self.rmw(bus, Mode::AbsoluteXW, Self::dec_value),

            0xE8 => {
                // INX
                self.x = self.x.wrapping_add(1);
                self.p.update_zn(self.x);
            }
            0xC8 => {
                // INY
                self.y = self.y.wrapping_add(1);
                self.p.update_zn(self.y);
            }
            0xCA => {
                // DEX
                self.x = self.x.wrapping_sub(1);
                self.p.update_zn(self.x);
            }
            0x88 => {
                // DEY
                self.y = self.y.wrapping_sub(1);
                self.p.update_zn(self.y);
            }

            // =================================================================
            // Logical
            // =================================================================
            0x29 => self.alu(bus, Mode::Immediate, Self::and),
            0x25 => self.alu(bus, Mode::ZeroPage, Self::and),
            0x35 => self.alu(bus, Mode::ZeroPageX, Self::and),
            0x2D => self.alu(bus, Mode::Absolute, Self::and),
            0x3D => self.alu(bus, Mode::AbsoluteX, Self::and),
            0x39 => self.alu(bus, Mode::AbsoluteY, Self::and),
            0x21 => self.alu(bus, Mode::IndexedIndirect, Self::and),
            0x31 => self.alu(bus, Mode::IndirectIndexed, Self::and),

            0x09 => self.alu(bus, Mode::Immediate, Self::ora),
            0x05 => self.alu(bus, Mode::ZeroPage, Self::ora),
            0x15 => self.alu(bus, Mode::ZeroPageX, Self::ora),
            0x0D => self.alu(bus, Mode::Absolute, Self::ora),
            0x1D => self.alu(bus, Mode::AbsoluteX, Self::ora),
            0x19 => self.alu(bus, Mode::AbsoluteY, Self::ora),
            0x01 => self.alu(bus, Mode::IndexedIndirect, Self::ora),
            0x11 => self.alu(bus, Mode::IndirectIndexed, Self::ora),

            0x49 => self.alu(bus, Mode::Immediate, Self::eor),
            0x45 => self.alu(bus, Mode::ZeroPage, Self::eor),
            0x55 => self.alu(bus, Mode::ZeroPageX, Self::eor),
            0x4D => self.alu(bus, Mode::Absolute, Self::eor),
            0x5D => self.alu(bus, Mode::AbsoluteX, Self::eor),
            0x59 => self.alu(bus, Mode::AbsoluteY, Self::eor),
            0x41 => self.alu(bus, Mode::IndexedIndirect, Self::eor),
            0x51 => self.alu(bus, Mode::IndirectIndexed, Self::eor),

            0x24 => self.alu(bus, Mode::ZeroPage, Self::bit),
            0x2C => self.alu(bus, Mode::Absolute, Self::bit),

            // =================================================================
            // Shifts and rotates
            // =================================================================
            0x0A => self.a = self.asl(self.a),
            0x06 => self.rmw(bus, Mode::ZeroPage, Self::asl),
            0x16 => self.rmw(bus, Mode::ZeroPageX, Self::asl),
            0x0E => self.rmw(bus, Mode::Absolute, Self::asl),
            0x1E => self.rmw(bus, Mode::AbsoluteXW, Self::asl),

            0x4A => self.a = self.lsr(self.a),
            0x46 => self.rmw(bus, Mode::ZeroPage, Self::lsr),
            0x56 => self.rmw(bus, Mode::ZeroPageX, Self::lsr),
            0x4E => self.rmw(bus, Mode::Absolute, Self::lsr),
            0x5E => self.rmw(bus, Mode::AbsoluteXW, Self::lsr),

            0x2A => self.a = self.rol(self.a),
            0x26 => self.rmw(bus, Mode::ZeroPage, Self::rol),
            0x36 => self.rmw(bus, Mode::ZeroPageX, Self::rol),
            0x2E => self.rmw(bus, Mode::Absolute, Self::rol),
            0x3E => self.rmw(bus, Mode::AbsoluteXW, Self::rol),

            0x6A => self.a = self.ror(self.a),
            0x66 => self.rmw(bus, Mode::ZeroPage, Self::ror),
            0x76 => self.rmw(bus, Mode::ZeroPageX, Self::ror),
            0x6E => self.rmw(bus, Mode::Absolute, Self::ror),
            0x7E => self.rmw(bus, Mode::AbsoluteXW, Self::ror),

            // =================================================================
            // Jumps and calls
            // =================================================================
            0x4C => {
                // JMP abs
                self.pc = self.fetch_word(bus);
            }
            0x6C => {
                // JMP (ind) with the page-wrap bug: the high byte of the
                // target is fetched from the start of the same page when the
                // pointer sits on a page boundary.
                let addr = self.fetch_word(bus);
                self.pc = self.read_word_page_bug(bus, addr);
            }
            0x20 => {
                // JSR pushes the address of its own last byte
                let low = self.fetch(bus);
                self.push_word(bus, self.pc);
                let high = self.fetch(bus);
                self.pc = u16::from_le_bytes([low, high]);
            }
            0x60 => {
                // RTS
                self.pc = self.pull_word(bus).wrapping_add(1);
            }
            0x40 => {
                // RTI: pull P (B masked), then PC
                let bits = self.pull(bus);
                self.p = Status::pulled(bits);
                self.pc = self.pull_word(bus);
            }

            // =================================================================
            // Branches
            // =================================================================
            0x10 => self.branch_if(bus, !self.p.contains(Status::NEGATIVE)), // BPL
            0x30 => self.branch_if(bus, self.p.contains(Status::NEGATIVE)),  // BMI
            0x50 => self.branch_if(bus, !self.p.contains(Status::OVERFLOW)), // BVC
            0x70 => self.branch_if(bus, self.p.contains(Status::OVERFLOW)),  // BVS
            0x90 => self.branch_if(bus, !self.p.contains(Status::CARRY)),    // BCC
            0xB0 => self.branch_if(bus, self.p.contains(Status::CARRY)),     // BCS
            0xD0 => self.branch_if(bus, !self.p.contains(Status::ZERO)),     // BNE
            0xF0 => self.branch_if(bus, self.p.contains(Status::ZERO)),      // BEQ

            // =================================================================
            // Flag manipulation
            // =================================================================
            0x18 => self.p.assign(Status::CARRY, false), // CLC
            0x38 => self.p.assign(Status::CARRY, true),  // SEC
            0x58 => self.p.assign(Status::IRQ_DISABLE, false), // CLI
            0x78 => self.p.assign(Status::IRQ_DISABLE, true), // SEI
            0xB8 => self.p.assign(Status::OVERFLOW, false), // CLV
            0xD8 => self.p.assign(Status::DECIMAL, false), // CLD
            0xF8 => self.p.assign(Status::DECIMAL, true), // SED

            // =================================================================
            // System
            // =================================================================
            0x00 => {
                // BRK: the byte after the opcode is padding, so the pushed
                // return address is opcode address + 2.
                self.fetch(bus);
                self.push_word(bus, self.pc);
                let pushed = self.p.pushed(true);
                self.push(bus, pushed);
                self.p.assign(Status::IRQ_DISABLE, true);
                self.pc = self.read_word(bus, IRQ_VECTOR);
            }

            0xEA => {} // NOP

            // =================================================================
            // Undocumented NOP families
            // =================================================================

            // 1-byte NOPs
            0x1A | 0x3A | 0x5A | 0x7A | 0xDA | 0xFA => {}

            // 2-byte NOPs (immediate operand skipped)
            0x80 | 0x82 | 0x89 | 0xC2 | 0xE2 => {
                self.fetch(bus);
            }

            // NOP zp
            0x04 | 0x44 | 0x64 => {
                self.fetch(bus);
            }

            // NOP zp,X
            0x14 | 0x34 | 0x54 | 0x74 | 0xD4 | 0xF4 => {
                self.fetch(bus);
            }

            // NOP abs
            0x0C => {
                self.fetch_word(bus);
            }

            // NOP abs,X (page crossing still costs a cycle)
            0x1C | 0x3C | 0x5C | 0x7C | 0xDC | 0xFC => {
                self.operand_addr(bus, Mode::AbsoluteX);
            }

            // Remaining undocumented opcodes: behave as a 1-byte NOP of the
            // tabled cycle cost. PC has already advanced past the opcode.
            _ => {}
        }
    }

    // =========================================================================
    // Generic instruction bodies
    // =========================================================================

    fn lda(&mut self, bus: &mut impl Bus, mode: Mode) {
        self.a = self.load(bus, mode);
        self.p.update_zn(self.a);
    }

    fn ldx(&mut self, bus: &mut impl Bus, mode: Mode) {
        self.x = self.load(bus, mode);
        self.p.update_zn(self.x);
    }

    fn ldy(&mut self, bus: &mut impl Bus, mode: Mode) {
        self.y = self.load(bus, mode);
        self.p.update_zn(self.y);
    }

    fn store(&mut self, bus: &mut impl Bus, mode: Mode, reg: fn(&Self) -> u8) {
        let addr = self.operand_addr(bus, mode);
        bus.write(addr, reg(self));
    }

    /// Value-operand instruction: read the operand, feed it to `op`.
    fn alu(&mut self, bus: &mut impl Bus, mode: Mode, op: fn(&mut Self, u8)) {
        let value = self.load(bus, mode);
        op(self, value);
    }

    fn cmp_reg(&mut self, bus: &mut impl Bus, mode: Mode, reg: fn(&Self) -> u8) {
        let value = self.load(bus, mode);
        self.compare(reg(self), value);
    }

    /// Read-modify-write instruction: read, transform, write back.
    fn rmw(&mut self, bus: &mut impl Bus, mode: Mode, op: fn(&mut Self, u8) -> u8) {
        let addr = self.operand_addr(bus, mode);
        let value = bus.read(addr);
        let result = op(self, value);
        bus.write(addr, result);
    }

    fn and(&mut self, value: u8) {
        self.a &= value;
        self.p.update_zn(self.a);
    }

    fn ora(&mut self, value: u8) {
        self.a |= value;
        self.p.update_zn(self.a);
    }

    fn eor(&mut self, value: u8) {
        self.a ^= value;
        self.p.update_zn(self.a);
    }

    fn inc_value(&mut self, value: u8) -> u8 {
        let result = value.wrapping_add(1);
        self.p.update_zn(result);
        result
    }

    fn dec_value(&mut self, value: u8) -> u8 {
        let result = value.wrapping_sub(1);
        self.p.update_zn(result);
        result
    }
}
