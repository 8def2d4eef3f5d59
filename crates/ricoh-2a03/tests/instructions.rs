//! Instruction-level behaviour tests over a flat RAM bus.

use nes_core::{Bus, SimpleBus};
use ricoh_2a03::Ricoh2A03;

/// Load a program at $0200, point PC there, and give it a full stack.
fn setup(program: &[u8]) -> (Ricoh2A03, SimpleBus) {
    let mut bus = SimpleBus::new();
    bus.load(0x0200, program);
    let mut cpu = Ricoh2A03::new();
    cpu.set_pc(0x0200);
    cpu.set_sp(0xFF);
    (cpu, bus)
}

fn run_instructions(cpu: &mut Ricoh2A03, bus: &mut SimpleBus, count: usize) -> u32 {
    let mut total = 0;
    for _ in 0..count {
        total += cpu.step(bus);
    }
    total
}

#[test]
fn stack_pha_pla_round_trip() {
    // LDA #$42; LDX #$FF; TXS; PHA; LDA #$00; PLA
    let (mut cpu, mut bus) = setup(&[
        0xA9, 0x42, // LDA #$42
        0xA2, 0xFF, // LDX #$FF
        0x9A, // TXS
        0x48, // PHA
        0xA9, 0x00, // LDA #$00
        0x68, // PLA
    ]);

    run_instructions(&mut cpu, &mut bus, 6);

    assert_eq!(cpu.a(), 0x42, "PLA should restore A");
    assert_eq!(cpu.sp(), 0xFF, "SP should be back to $FF after PLA");
    // N/Z now reflect A
    assert_eq!(cpu.status() & 0x02, 0, "A is nonzero");
    assert_eq!(cpu.status() & 0x80, 0, "A is positive");
}

#[test]
fn stack_php_plp_round_trip() {
    // LDX #$FF; TXS; SEC; PHP; CLC; PLP
    let (mut cpu, mut bus) = setup(&[
        0xA2, 0xFF, // LDX #$FF
        0x9A, // TXS
        0x38, // SEC
        0x08, // PHP
        0x18, // CLC
        0x28, // PLP
    ]);

    run_instructions(&mut cpu, &mut bus, 4);
    let p_after_sec = cpu.status();
    run_instructions(&mut cpu, &mut bus, 2);

    assert_eq!(cpu.status(), p_after_sec, "PLP restores P exactly");
    assert_ne!(cpu.status() & 0x01, 0, "carry restored");
    assert_eq!(cpu.sp(), 0xFF);
}

#[test]
fn brk_stack_layout() {
    let (mut cpu, mut bus) = setup(&[
        0xA2, 0xFF, // LDX #$FF    @ $0200
        0x9A, // TXS               @ $0202
        0x58, // CLI               @ $0203
        0x00, // BRK               @ $0204
        0xEA, // padding byte      @ $0205 (skipped)
    ]);
    bus.write(0xFFFE, 0x00);
    bus.write(0xFFFF, 0x03);

    run_instructions(&mut cpu, &mut bus, 4);

    assert_eq!(cpu.pc(), 0x0300, "PC at BRK vector target");
    assert_eq!(cpu.sp(), 0xFC, "three pushes from $FF");
    assert_ne!(cpu.status() & 0x04, 0, "I set after BRK");

    // Return address is the BRK address + 2 = $0206
    assert_eq!(bus.peek(0x01FF), 0x02, "pushed PCH");
    assert_eq!(bus.peek(0x01FE), 0x06, "pushed PCL");
    // Pushed P has B and bit 5 set, and no I (CLI ran first)
    assert_eq!(bus.peek(0x01FD) & 0x30, 0x30);
    assert_eq!(bus.peek(0x01FD) & 0x04, 0x00);
}

#[test]
fn adc_overflow_scenario() {
    // A=$50, C=0; ADC #$50 -> A=$A0, N=1 V=1 C=0 Z=0
    let (mut cpu, mut bus) = setup(&[0x18, 0xA9, 0x50, 0x69, 0x50]); // CLC; LDA #$50; ADC #$50

    run_instructions(&mut cpu, &mut bus, 3);

    assert_eq!(cpu.a(), 0xA0);
    assert_ne!(cpu.status() & 0x80, 0, "N set");
    assert_ne!(cpu.status() & 0x40, 0, "V set");
    assert_eq!(cpu.status() & 0x01, 0, "C clear");
    assert_eq!(cpu.status() & 0x02, 0, "Z clear");
}

#[test]
fn jmp_indirect_page_wrap() {
    // Pointer at $02FF: low byte from $02FF ($00), high byte from $0200
    // ($80), never from $0300.
    let (mut cpu, mut bus) = setup(&[0x6C, 0xFF, 0x02]);
    bus.write(0x02FF, 0x00);
    bus.write(0x0300, 0x02); // would be used without the bug
    bus.write(0x0200, 0x80);
    // $0200 holds the first program byte; overwrite after setup
    bus.load(0x0400, &[0x6C, 0xFF, 0x02]);
    cpu.set_pc(0x0400);

    cpu.step(&mut bus);

    assert_eq!(cpu.pc(), 0x8000);
}

#[test]
fn branch_cycles_with_page_cross() {
    // Taken branch crossing a page: 4 cycles total
    let mut bus = SimpleBus::new();
    bus.load(0x80F8, &[0xD0, 0x10]); // BNE +$10
    let mut cpu = Ricoh2A03::new();
    cpu.set_pc(0x80F8);
    assert_eq!(cpu.step(&mut bus), 4);
    assert_eq!(cpu.pc(), 0x810A);

    // Not taken: 2 cycles
    let (mut cpu, mut bus) = setup(&[0xA9, 0x00, 0xD0, 0x10]); // LDA #$00; BNE
    run_instructions(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.step(&mut bus), 2);
}

#[test]
fn rmw_operates_in_place() {
    // INC $10 twice, then ASL $10
    let (mut cpu, mut bus) = setup(&[0xE6, 0x10, 0xE6, 0x10, 0x06, 0x10]);
    bus.write(0x0010, 0x3F);

    run_instructions(&mut cpu, &mut bus, 2);
    assert_eq!(bus.peek(0x0010), 0x41);

    cpu.step(&mut bus);
    assert_eq!(bus.peek(0x0010), 0x82);
    assert_eq!(cpu.status() & 0x01, 0, "no carry out of ASL");
    assert_ne!(cpu.status() & 0x80, 0, "result negative");
}

#[test]
fn indirect_indexed_load_and_store() {
    // Pointer at $20 -> $1234; LDA ($20),Y with Y=4 reads $1238
    let (mut cpu, mut bus) = setup(&[0xA0, 0x04, 0xB1, 0x20, 0x91, 0x20]);
    bus.write(0x0020, 0x34);
    bus.write(0x0021, 0x12);
    bus.write(0x1238, 0x77);

    run_instructions(&mut cpu, &mut bus, 2);
    assert_eq!(cpu.a(), 0x77);

    // STA ($20),Y writes back to the same spot
    bus.write(0x1238, 0x00);
    cpu.step(&mut bus);
    assert_eq!(bus.peek(0x1238), 0x77);
}

#[test]
fn indexed_indirect_wraps_in_zero_page() {
    // LDX #$05; LDA ($FE,X): pointer at $03/$04 (wrapped), not $103
    let (mut cpu, mut bus) = setup(&[0xA2, 0x05, 0xA1, 0xFE]);
    bus.write(0x0003, 0xCD);
    bus.write(0x0004, 0xAB);
    bus.write(0xABCD, 0x5E);

    run_instructions(&mut cpu, &mut bus, 2);
    assert_eq!(cpu.a(), 0x5E);
}

#[test]
fn transfers_and_flags() {
    // LDA #$80; TAX; TXS; TSX sets N
    let (mut cpu, mut bus) = setup(&[0xA9, 0x80, 0xAA, 0x9A, 0xBA]);
    run_instructions(&mut cpu, &mut bus, 3);
    assert_eq!(cpu.sp(), 0x80);
    let p_before = cpu.status();
    cpu.step(&mut bus);
    assert_eq!(cpu.x(), 0x80);
    assert_ne!(cpu.status() & 0x80, 0, "TSX sets N");
    let _ = p_before;
}

#[test]
fn bit_copies_memory_high_bits() {
    let (mut cpu, mut bus) = setup(&[0xA9, 0x01, 0x24, 0x10]); // LDA #$01; BIT $10
    bus.write(0x0010, 0xC0);

    run_instructions(&mut cpu, &mut bus, 2);

    assert_ne!(cpu.status() & 0x80, 0, "N from memory bit 7");
    assert_ne!(cpu.status() & 0x40, 0, "V from memory bit 6");
    assert_ne!(cpu.status() & 0x02, 0, "Z: A & M == 0");
}

#[test]
fn nmi_interrupts_between_instructions() {
    let (mut cpu, mut bus) = setup(&[0xA9, 0x01, 0xA9, 0x02]);
    bus.write(0xFFFA, 0x00);
    bus.write(0xFFFB, 0x90);

    cpu.step(&mut bus);
    cpu.nmi();
    let cycles = cpu.step(&mut bus); // services NMI, not LDA #$02

    assert_eq!(cycles, 7);
    assert_eq!(cpu.pc(), 0x9000);
    assert_eq!(cpu.a(), 0x01, "second LDA never ran");
    // RTI returns to the interrupted instruction
    bus.write(0x9000, 0x40); // RTI
    cpu.step(&mut bus);
    assert_eq!(cpu.pc(), 0x0202);
}

#[test]
fn total_cycles_for_known_sequence() {
    // LDA #$01 (2) + STA $10 (3) + LDA $10 (3) + NOP (2) = 10
    let (mut cpu, mut bus) = setup(&[0xA9, 0x01, 0x85, 0x10, 0xA5, 0x10, 0xEA]);
    let total = run_instructions(&mut cpu, &mut bus, 4);
    assert_eq!(total, 10);
}
