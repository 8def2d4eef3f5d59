//! Save state (snapshot) support.
//!
//! Captures the complete machine state needed to resume emulation:
//! CPU registers, interrupt latches and internal RAM; the PPU's frame
//! position, loopy registers, OAM, nametables and palette; the mapper's
//! bank register; and the cycle/frame counters. The byte layout is
//! little-endian, identified by magic bytes and a format version.

use crate::nes::Nes;
use crate::ppu::VramAddr;

/// Magic bytes for snapshot identification.
const SNAPSHOT_MAGIC: &[u8; 4] = b"NESS";

/// Current snapshot format version.
const SNAPSHOT_VERSION: u8 = 1;

/// CPU register and interrupt-latch state.
#[derive(Clone, Debug)]
pub struct CpuState {
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub sp: u8,
    pub pc: u16,
    pub p: u8,
    pub irq_line: bool,
    pub nmi_pending: bool,
}

/// PPU state.
#[derive(Clone)]
pub struct PpuState {
    pub dot: u16,
    pub scanline: u16,
    pub v: u16,
    pub t: u16,
    pub fine_x: u8,
    pub w: bool,
    pub ctrl: u8,
    pub mask: u8,
    pub status: u8,
    pub oam_addr: u8,
    pub read_buffer: u8,
    pub frame_odd: bool,
    pub oam: [u8; 256],
    pub nametable_ram: [u8; 2048],
    pub palette_ram: [u8; 32],
}

/// Complete machine state snapshot.
#[derive(Clone)]
pub struct Snapshot {
    pub cpu: CpuState,
    pub ram: [u8; 2048],
    pub ppu: PpuState,
    /// Mapper bank select register.
    pub mapper_bank: u8,
    pub cpu_cycles: u64,
    pub frame_count: u64,
}

impl Nes {
    /// Capture the current machine state.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            cpu: CpuState {
                a: self.cpu.a(),
                x: self.cpu.x(),
                y: self.cpu.y(),
                sp: self.cpu.sp(),
                pc: self.cpu.pc(),
                p: self.cpu.status(),
                irq_line: self.cpu.irq_line(),
                nmi_pending: self.cpu.nmi_pending(),
            },
            ram: self.bus.ram,
            ppu: PpuState {
                dot: self.bus.ppu.dot,
                scanline: self.bus.ppu.scanline,
                v: self.bus.ppu.v.raw(),
                t: self.bus.ppu.t.raw(),
                fine_x: self.bus.ppu.fine_x,
                w: self.bus.ppu.w,
                ctrl: self.bus.ppu.ctrl,
                mask: self.bus.ppu.mask,
                status: self.bus.ppu.status,
                oam_addr: self.bus.ppu.oam_addr,
                read_buffer: self.bus.ppu.read_buffer,
                frame_odd: self.bus.ppu.frame_odd,
                oam: self.bus.ppu.oam,
                nametable_ram: self.bus.ppu.nametable_ram,
                palette_ram: self.bus.ppu.palette_ram,
            },
            mapper_bank: self.bus.cartridge.bank_select(),
            cpu_cycles: self.cpu_cycles,
            frame_count: self.frame_count,
        }
    }

    /// Restore a previously captured state. The cartridge image itself is
    /// not part of the snapshot; restoring against a different ROM is
    /// undefined behaviour at the emulated-machine level (not unsafe).
    pub fn restore(&mut self, state: &Snapshot) {
        self.cpu.set_a(state.cpu.a);
        self.cpu.set_x(state.cpu.x);
        self.cpu.set_y(state.cpu.y);
        self.cpu.set_sp(state.cpu.sp);
        self.cpu.set_pc(state.cpu.pc);
        self.cpu.set_status(state.cpu.p);
        self.cpu.set_irq_line(state.cpu.irq_line);
        self.cpu.set_nmi_pending(state.cpu.nmi_pending);

        self.bus.ram = state.ram;

        self.bus.ppu.dot = state.ppu.dot;
        self.bus.ppu.scanline = state.ppu.scanline;
        self.bus.ppu.v = VramAddr::from_raw(state.ppu.v);
        self.bus.ppu.t = VramAddr::from_raw(state.ppu.t);
        self.bus.ppu.fine_x = state.ppu.fine_x;
        self.bus.ppu.w = state.ppu.w;
        self.bus.ppu.ctrl = state.ppu.ctrl;
        self.bus.ppu.mask = state.ppu.mask;
        self.bus.ppu.status = state.ppu.status;
        self.bus.ppu.oam_addr = state.ppu.oam_addr;
        self.bus.ppu.read_buffer = state.ppu.read_buffer;
        self.bus.ppu.frame_odd = state.ppu.frame_odd;
        self.bus.ppu.oam = state.ppu.oam;
        self.bus.ppu.nametable_ram = state.ppu.nametable_ram;
        self.bus.ppu.palette_ram = state.ppu.palette_ram;

        self.bus.cartridge.set_bank_select(state.mapper_bank);
        self.cpu_cycles = state.cpu_cycles;
        self.frame_count = state.frame_count;
    }
}

impl Snapshot {
    /// Serialize to bytes.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(4600);

        data.extend_from_slice(SNAPSHOT_MAGIC);
        data.push(SNAPSHOT_VERSION);

        // CPU
        data.push(self.cpu.a);
        data.push(self.cpu.x);
        data.push(self.cpu.y);
        data.push(self.cpu.sp);
        data.extend_from_slice(&self.cpu.pc.to_le_bytes());
        data.push(self.cpu.p);
        data.push(u8::from(self.cpu.irq_line));
        data.push(u8::from(self.cpu.nmi_pending));

        // RAM
        data.extend_from_slice(&self.ram);

        // PPU
        data.extend_from_slice(&self.ppu.dot.to_le_bytes());
        data.extend_from_slice(&self.ppu.scanline.to_le_bytes());
        data.extend_from_slice(&self.ppu.v.to_le_bytes());
        data.extend_from_slice(&self.ppu.t.to_le_bytes());
        data.push(self.ppu.fine_x);
        data.push(u8::from(self.ppu.w));
        data.push(self.ppu.ctrl);
        data.push(self.ppu.mask);
        data.push(self.ppu.status);
        data.push(self.ppu.oam_addr);
        data.push(self.ppu.read_buffer);
        data.push(u8::from(self.ppu.frame_odd));
        data.extend_from_slice(&self.ppu.oam);
        data.extend_from_slice(&self.ppu.nametable_ram);
        data.extend_from_slice(&self.ppu.palette_ram);

        // Mapper and counters
        data.push(self.mapper_bank);
        data.extend_from_slice(&self.cpu_cycles.to_le_bytes());
        data.extend_from_slice(&self.frame_count.to_le_bytes());

        data
    }

    /// Deserialize from bytes.
    ///
    /// # Errors
    ///
    /// Returns a message if the magic, version, or length do not match.
    pub fn from_bytes(data: &[u8]) -> Result<Self, &'static str> {
        if data.len() < 5 {
            return Err("snapshot too small");
        }
        if &data[0..4] != SNAPSHOT_MAGIC {
            return Err("invalid snapshot magic");
        }
        if data[4] != SNAPSHOT_VERSION {
            return Err("unsupported snapshot version");
        }

        let mut r = Reader {
            data: &data[5..],
            pos: 0,
        };

        let cpu = CpuState {
            a: r.u8()?,
            x: r.u8()?,
            y: r.u8()?,
            sp: r.u8()?,
            pc: r.u16()?,
            p: r.u8()?,
            irq_line: r.u8()? != 0,
            nmi_pending: r.u8()? != 0,
        };

        let mut ram = [0u8; 2048];
        r.bytes(&mut ram)?;

        let ppu = {
            let dot = r.u16()?;
            let scanline = r.u16()?;
            let v = r.u16()?;
            let t = r.u16()?;
            let fine_x = r.u8()?;
            let w = r.u8()? != 0;
            let ctrl = r.u8()?;
            let mask = r.u8()?;
            let status = r.u8()?;
            let oam_addr = r.u8()?;
            let read_buffer = r.u8()?;
            let frame_odd = r.u8()? != 0;
            let mut oam = [0u8; 256];
            r.bytes(&mut oam)?;
            let mut nametable_ram = [0u8; 2048];
            r.bytes(&mut nametable_ram)?;
            let mut palette_ram = [0u8; 32];
            r.bytes(&mut palette_ram)?;
            PpuState {
                dot,
                scanline,
                v,
                t,
                fine_x,
                w,
                ctrl,
                mask,
                status,
                oam_addr,
                read_buffer,
                frame_odd,
                oam,
                nametable_ram,
                palette_ram,
            }
        };

        let mapper_bank = r.u8()?;
        let cpu_cycles = r.u64()?;
        let frame_count = r.u64()?;

        Ok(Self {
            cpu,
            ram,
            ppu,
            mapper_bank,
            cpu_cycles,
            frame_count,
        })
    }
}

/// Little cursor over the snapshot payload with truncation checks.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl Reader<'_> {
    fn u8(&mut self) -> Result<u8, &'static str> {
        let b = *self.data.get(self.pos).ok_or("snapshot truncated")?;
        self.pos += 1;
        Ok(b)
    }

    fn u16(&mut self) -> Result<u16, &'static str> {
        let lo = self.u8()?;
        let hi = self.u8()?;
        Ok(u16::from_le_bytes([lo, hi]))
    }

    fn u64(&mut self) -> Result<u64, &'static str> {
        let mut buf = [0u8; 8];
        self.bytes(&mut buf)?;
        Ok(u64::from_le_bytes(buf))
    }

    fn bytes(&mut self, out: &mut [u8]) -> Result<(), &'static str> {
        let end = self.pos + out.len();
        let src = self.data.get(self.pos..end).ok_or("snapshot truncated")?;
        out.copy_from_slice(src);
        self.pos = end;
        Ok(())
    }
}
