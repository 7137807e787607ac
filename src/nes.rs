pub mod bus;
pub mod cartridge;
pub mod cpu;
pub mod oam_dma;
pub mod ppu;
pub mod tracer;

use bus::CpuBusInterface;
use bus::nes_bus::NesBus;
use cartridge::Cartridge;
use cartridge::rom::{Rom, RomError};
use cpu::CPU;
use log::debug;
use oam_dma::{OamDma, OamDmaOp};
use ppu::frame::Frame;
use tracer::{Traceable, Tracer};

use crate::{trace, trace_obj};

pub const PPU_HZ: u64 = 5_369_318;
pub const CPU_HZ_NTSC: f64 = PPU_HZ as f64 / PPU_DOTS_PER_CPU_CYCLE as f64;
pub const PPU_DOTS_PER_CPU_CYCLE: usize = 3;
pub const OAM_DMA_CYCLES: u64 = 513;

// The PPU keeps running while the CPU spends 7 cycles on its reset sequence
const RESET_PPU_DOTS: usize = cpu::CPU_RESET_CYCLES as usize * PPU_DOTS_PER_CPU_CYCLE;

/// What one call to [`NES::step`] did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepOutcome {
    /// CPU cycles spent, OAM DMA stall included
    pub cpu_cycles: u64,
    /// The PPU wrapped into scanline 0 of a new frame during this step
    pub frame_complete: bool,
}

pub struct NES {
    pub cpu: CPU,
    pub bus: NesBus,
    oam_dma: OamDma,
    tracer: Option<Tracer>,
}

impl NES {
    pub fn new(cartridge: Box<dyn Cartridge>) -> Self {
        let mut nes = Self {
            cpu: CPU::new(),
            bus: NesBus::new(cartridge),
            oam_dma: OamDma::new(),
            tracer: None,
        };
        nes.reset();
        nes
    }

    pub fn from_rom_bytes(raw: &[u8]) -> Result<Self, RomError> {
        let cartridge = Rom::parse(raw)?.into_cartridge()?;
        Ok(Self::new(cartridge))
    }

    /// Swap cartridges and power-cycle the console
    pub fn insert_cartridge(&mut self, cartridge: Box<dyn Cartridge>) {
        self.bus.insert_cartridge(cartridge);
        self.reset();
    }

    /// Press the reset button. CPU RAM keeps its contents
    pub fn reset(&mut self) {
        self.bus.reset_components();
        self.oam_dma = OamDma::new();
        self.cpu.reset(&mut self.bus);
        self.bus.tick_ppu(RESET_PPU_DOTS);
        debug!(
            "reset: PC={:04X} CYC={}",
            self.cpu.program_counter, self.cpu.cycles
        );
    }

    /// Run one CPU instruction (or interrupt entry), any OAM DMA it
    /// triggered, then catch the PPU up by 3 dots per CPU cycle.
    pub fn step(&mut self) -> StepOutcome {
        if self.tracer.is_some() {
            let line = self.trace_line();
            if let Some(tracer) = self.tracer.as_mut() {
                tracer.write(line);
            }
        }

        let cycles = self.cpu.step(&mut self.bus) as u64;
        let mut frame_complete = self
            .bus
            .tick_ppu(cycles as usize * PPU_DOTS_PER_CPU_CYCLE);

        let mut cpu_cycles = cycles;
        if let Some(page) = self.bus.take_oam_dma_request() {
            let (stall, frame_during_dma) = self.run_oam_dma(page);
            cpu_cycles += stall;
            frame_complete |= frame_during_dma;
        }

        StepOutcome {
            cpu_cycles,
            frame_complete,
        }
    }

    /// Copies `page`*$100..+$FF into OAM while the CPU is halted.
    /// Returns the stall length and whether a frame completed meanwhile
    fn run_oam_dma(&mut self, page: u8) -> (u64, bool) {
        trace!("OAM DMA START page={:02X} cpu_cycle={}", page, self.cpu.cycles);
        self.oam_dma.start(page, self.cpu.cycles % 2 == 1);

        let mut stall = 0;
        let mut frame_complete = false;
        while self.oam_dma.active() {
            match self.oam_dma.step() {
                OamDmaOp::Dummy => {}
                OamDmaOp::Read(addr) => {
                    let value = self.bus.cpu_bus_read(addr);
                    self.oam_dma.latch(value);
                }
                OamDmaOp::Write(value) => self.bus.write_oam_dma_byte(value),
            }
            stall += 1;
            frame_complete |= self.bus.tick_ppu(PPU_DOTS_PER_CPU_CYCLE);
        }

        self.cpu.cycles += stall;
        trace!("OAM DMA COMPLETE after {} cycles", stall);
        (stall, frame_complete)
    }

    /// Step until the PPU finishes a frame. Returns the CPU cycles spent
    pub fn run_frame(&mut self) -> u64 {
        let mut cycles = 0;
        loop {
            let outcome = self.step();
            cycles += outcome.cpu_cycles;
            if outcome.frame_complete {
                trace_obj!(&self.bus.ppu);
                return cycles;
            }
        }
    }

    /// Last completed frame
    pub fn frame(&self) -> &Frame {
        self.bus.ppu.frame()
    }

    /// nestest.log line for the instruction about to run, e.g.
    /// `C000  4C F5 C5  JMP $C5F5                       A:00 X:00 Y:00 P:24 SP:FD PPU:  0, 21 CYC:7`
    pub fn trace_line(&self) -> String {
        format!(
            "{} PPU:{:>3},{:>3} CYC:{}",
            cpu::trace::trace(&self.cpu, &self.bus),
            self.bus.ppu.scanline,
            self.bus.ppu.cycles,
            self.cpu.cycles
        )
    }

    /// Record a trace line before every step, keeping the last `capacity` lines
    pub fn enable_trace(&mut self, capacity: usize) {
        self.tracer = Some(Tracer::new(capacity));
    }

    pub fn disable_trace(&mut self) {
        self.tracer = None;
    }

    pub fn trace_history(&self) -> impl Iterator<Item = &str> {
        self.tracer.iter().flat_map(Tracer::lines)
    }
}

impl Traceable for NES {
    fn trace_name(&self) -> &'static str {
        "NES"
    }

    fn trace_state(&self) -> Option<String> {
        let cpu = self.cpu.trace_state()?;
        let bus = self.bus.trace_state()?;
        Some(format!("{} | {}", cpu, bus))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::nes::cartridge::rom::Mirroring;

    // LDA #$02 / STA $4014 / JMP $8005
    fn dma_program() -> Vec<u8> {
        vec![0xA9, 0x02, 0x8D, 0x14, 0x40, 0x4C, 0x05, 0x80]
    }

    fn init_nes(program: &[u8]) -> NES {
        let mut prg_rom = vec![0xEA; 0x4000];
        prg_rom[..program.len()].copy_from_slice(program);
        prg_rom[0x3FFC] = 0x00;
        prg_rom[0x3FFD] = 0x80;
        let rom = Rom::new_custom(prg_rom, vec![0; 0x2000], 0, Mirroring::Horizontal);
        NES::new(rom.into_cartridge().unwrap())
    }

    #[test]
    fn test_reset_aligns_with_nestest_timing() {
        let nes = init_nes(&[0x4C, 0x00, 0x80]);
        assert_eq!(nes.cpu.program_counter, 0x8000);
        assert_eq!(nes.cpu.cycles, 7);
        assert_eq!(nes.bus.ppu.scanline, 0);
        assert_eq!(nes.bus.ppu.cycles, 21);
    }

    #[test]
    fn test_step_advances_ppu_three_dots_per_cycle() {
        let mut nes = init_nes(&[0xA9, 0x01, 0x4C, 0x00, 0x80]);
        let outcome = nes.step();
        assert_eq!(outcome.cpu_cycles, 2);
        assert!(!outcome.frame_complete);
        assert_eq!(nes.bus.ppu.cycles, 21 + 6);
        assert_eq!(nes.cpu.cycles, 9);
    }

    #[test]
    fn test_oam_dma_copies_page_and_stalls_cpu() {
        let mut nes = init_nes(&dma_program());
        for i in 0..=255u8 {
            nes.bus.cpu_ram[0x200 + i as usize] = i;
        }

        nes.step(); // LDA, 7 + 2 = 9
        let outcome = nes.step(); // STA, 9 + 4 = 13, odd
        assert_eq!(outcome.cpu_cycles, 4 + OAM_DMA_CYCLES + 1);
        assert_eq!(nes.cpu.cycles, 13 + 514);

        for i in 0..=255u8 {
            nes.bus.cpu_bus_write(0x2003, i);
            // attribute bytes have no storage for bits 2-4
            let expected = if i & 0x03 == 0x02 { i & 0xE3 } else { i };
            assert_eq!(nes.bus.cpu_bus_peek(0x2004), expected);
        }
    }

    #[test]
    fn test_trace_history_records_lines_before_each_step() {
        let mut nes = init_nes(&[0xA9, 0x01, 0x4C, 0x02, 0x80]);
        nes.enable_trace(2);
        nes.step();
        nes.step();
        nes.step();

        let lines: Vec<&str> = nes.trace_history().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("8002  4C 02 80  JMP $8002"));
        assert!(lines[1].ends_with("PPU:  0, 36 CYC:12"));

        nes.disable_trace();
        assert_eq!(nes.trace_history().count(), 0);
    }

    #[test]
    fn test_run_frame_reports_cycles_of_one_frame() {
        let mut nes = init_nes(&[0x4C, 0x00, 0x80]);
        let first = nes.run_frame();
        // 89342 dots minus the 21 spent in reset, in 3-cycle JMP steps
        assert!((29_767..=29_781).contains(&first));
        assert_eq!(nes.bus.ppu.frame_count(), 1);
        assert_eq!(nes.bus.ppu.scanline, 0);
    }
}
