//! Top-level NES system.
//!
//! `Nes` owns the CPU and the bus (which in turn owns the PPU, APU,
//! controllers and cartridge) and implements the master step: execute one
//! CPU instruction, then advance the PPU by three dots and the APU by one
//! tick for every CPU cycle the instruction consumed. Every bus write is
//! therefore observable by the PPU before the next instruction begins, and
//! the PPU's vblank NMI is sampled at the following instruction boundary.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use nes_core::Bus;
use ricoh_2a03::Ricoh2A03;

use crate::bus::NesBus;
use crate::cartridge::{self, CartridgeError};
use crate::config::NesConfig;
use crate::controller::Controller;
use crate::input::{InputQueue, NesButton};
use crate::ppu;

/// Sink for completed frames. Called exactly once per frame.
pub trait VideoDevice {
    fn set_buffer(&mut self, framebuffer: &[u32]);
}

/// Host input poller, ticked once per frame at the vblank boundary.
pub trait InputDevice {
    fn tick(&mut self, port1: &mut Controller, port2: &mut Controller);
}

/// The NES.
pub struct Nes {
    pub(crate) cpu: Ricoh2A03,
    pub(crate) bus: NesBus,
    /// Total CPU cycles since power-on (drives DMA odd-cycle accounting).
    pub(crate) cpu_cycles: u64,
    /// Completed frame counter.
    pub(crate) frame_count: u64,
    /// Frame-stamped scripted input.
    input_queue: InputQueue,
    /// Optional frame sink.
    video: Option<Box<dyn VideoDevice>>,
    /// Optional per-frame input poller.
    input: Option<Box<dyn InputDevice>>,
    /// Externally asserted IRQ line (see [`Nes::pull_irq`]).
    external_irq: bool,
    /// Stop request honoured between instructions.
    stop: Arc<AtomicBool>,
}

impl Nes {
    /// Build a NES from an iNES image.
    ///
    /// # Errors
    ///
    /// Returns [`CartridgeError`] if the image is malformed or uses an
    /// unsupported mapper.
    pub fn new(config: &NesConfig) -> Result<Self, CartridgeError> {
        let mapper = cartridge::parse_ines(&config.rom_data)?;
        let mut bus = NesBus::new(mapper);
        let mut cpu = Ricoh2A03::new();
        cpu.reset(&mut bus);

        Ok(Self {
            cpu,
            bus,
            cpu_cycles: 0,
            frame_count: 0,
            input_queue: InputQueue::new(),
            video: None,
            input: None,
            external_irq: false,
            stop: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Attach a video device. It receives the framebuffer once per frame.
    pub fn set_video_device(&mut self, video: Box<dyn VideoDevice>) {
        self.video = Some(video);
    }

    /// Attach an input device, polled once per frame.
    pub fn set_input_device(&mut self, input: Box<dyn InputDevice>) {
        self.input = Some(input);
    }

    /// Reset the console: CPU from the reset vector, PPU registers cleared,
    /// rendering disabled.
    pub fn reset(&mut self) {
        self.cpu.reset(&mut self.bus);
        self.bus.ppu.reset();
        self.external_irq = false;
    }

    // === Interrupt lines (the bus interface collaborators pull on) ===

    /// Edge-trigger the CPU's NMI line.
    pub fn pull_nmi(&mut self) {
        self.cpu.nmi();
    }

    /// Level-assert the CPU's IRQ line. Stays asserted until
    /// [`Nes::reset_irq`].
    pub fn pull_irq(&mut self) {
        self.external_irq = true;
    }

    /// Release the externally asserted IRQ line.
    pub fn reset_irq(&mut self) {
        self.external_irq = false;
    }

    // === Execution ===

    /// Execute one CPU instruction (or interrupt entry) and advance the
    /// rest of the machine by the cycles it consumed. Returns those cycles.
    pub fn step(&mut self) -> u32 {
        // A JAM opcode has a tabled cost of 0; clamp so the machine always
        // makes progress.
        let mut cycles = self.cpu.step(&mut self.bus).max(1);

        // A $4014 write stalls the CPU for the whole transfer while the
        // PPU keeps running; one extra cycle on odd alignment.
        if let Some(page) = self.bus.oam_dma_page.take() {
            let odd = (self.cpu_cycles + u64::from(cycles)) % 2 == 1;
            self.run_oam_dma(page);
            cycles += 513 + u32::from(odd);
        }

        for _ in 0..cycles {
            self.tick_cpu_cycle();
        }

        cycles
    }

    /// Run until the stop flag is raised. The flag is checked between
    /// instructions only.
    pub fn run(&mut self) {
        while !self.stop.load(Ordering::Relaxed) {
            self.step();
        }
    }

    /// Handle to the stop flag; set it from the host to end [`Nes::run`].
    #[must_use]
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Run one complete frame.
    pub fn run_frame(&mut self) {
        let start = self.frame_count;
        while self.frame_count == start {
            self.step();
        }
    }

    /// One CPU cycle: three PPU dots and one APU tick.
    fn tick_cpu_cycle(&mut self) {
        for _ in 0..3 {
            self.bus.ppu.tick(self.bus.cartridge.as_mut());
            if self.bus.ppu.take_nmi() {
                self.cpu.nmi();
            }
            if self.bus.ppu.take_frame() {
                self.finish_frame();
            }
        }

        self.bus.apu.tick();

        // The CPU IRQ input is the OR of every level source
        let irq_level = self.external_irq
            || self.bus.apu.irq_pending()
            || self.bus.cartridge.irq_pending();
        if irq_level {
            self.cpu.irq();
        } else {
            self.cpu.clear_irq();
        }

        self.cpu_cycles += 1;
    }

    /// Frame boundary: present the framebuffer and poll input.
    fn finish_frame(&mut self) {
        self.frame_count += 1;

        if let Some(video) = self.video.as_mut() {
            video.set_buffer(self.bus.ppu.framebuffer());
        }
        if let Some(input) = self.input.as_mut() {
            input.tick(&mut self.bus.controller1, &mut self.bus.controller2);
        }
        self.input_queue
            .process(self.frame_count, &mut self.bus.controller1);
    }

    /// Copy one 256-byte page into OAM, honouring the current OAMADDR.
    fn run_oam_dma(&mut self, page: u8) {
        let base = u16::from(page) << 8;
        let start = self.bus.ppu.oam_addr();
        for i in 0..=255u8 {
            let value = self.bus.read(base + u16::from(i));
            self.bus.ppu.write_oam(start.wrapping_add(i), value);
        }
    }

    // === Observation ===

    /// Reference to the framebuffer (ARGB32, 256x240).
    #[must_use]
    pub fn framebuffer(&self) -> &[u32] {
        self.bus.ppu.framebuffer()
    }

    #[must_use]
    pub fn framebuffer_width(&self) -> u32 {
        ppu::FB_WIDTH
    }

    #[must_use]
    pub fn framebuffer_height(&self) -> u32 {
        ppu::FB_HEIGHT
    }

    #[must_use]
    pub fn cpu(&self) -> &Ricoh2A03 {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Ricoh2A03 {
        &mut self.cpu
    }

    #[must_use]
    pub fn bus(&self) -> &NesBus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut NesBus {
        &mut self.bus
    }

    /// Total CPU cycles executed since power-on.
    #[must_use]
    pub fn cpu_cycles(&self) -> u64 {
        self.cpu_cycles
    }

    /// Completed frame count.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Mutable access to the scripted input queue.
    pub fn input_queue(&mut self) -> &mut InputQueue {
        &mut self.input_queue
    }

    /// Press a button on controller 1.
    pub fn press_button(&mut self, button: NesButton) {
        self.bus.controller1.set_button(button.bit(), true);
    }

    /// Release a button on controller 1.
    pub fn release_button(&mut self, button: NesButton) {
        self.bus.controller1.set_button(button.bit(), false);
    }
}
