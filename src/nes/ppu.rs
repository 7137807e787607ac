use crate::nes::bus::PpuBusInterface;
use crate::nes::cartridge::rom::Mirroring;
use crate::nes::ppu::background::{BackgroundShifters, TileLatches};
use crate::nes::ppu::consts::{PATTERN_TABLE_SIZE, PATTERN_TABLE_TILES, POWER_UP_PALETTE};
use crate::nes::ppu::frame::Frame;
use crate::nes::ppu::nmi::{Nmi, NmiEvent};
use crate::nes::ppu::registers::control_register::ControlRegister;
use crate::nes::ppu::registers::mask_register::MaskRegister;
use crate::nes::ppu::registers::scroll_register::ScrollRegister;
use crate::nes::ppu::registers::status_register::StatusRegister;
use crate::nes::ppu::scheduler::{
    DOTS, PRERENDER_SCANLINE, PpuOperation, SCAN_LINES, ppu_schedule,
};
use crate::nes::ppu::sprites::SpriteUnits;
use crate::nes::tracer::Traceable;
use crate::{trace, trace_ppu_event};

mod background;
pub mod consts;
pub mod frame;
#[cfg(test)]
mod mod_tests;
pub mod nmi;
pub mod registers;
pub mod scheduler;
mod sprites;

const PRIMARY_OAM_SIZE: usize = 256;
const SECONDARY_OAM_SIZE: usize = 32;
/// Two internal nametables plus two more for four-screen boards
const VRAM_SIZE: usize = 0x1000;
const NAME_TABLE_SIZE: u16 = 0x400;
const PALETTE_SIZE: usize = 0x20;

#[derive(Debug, Clone, Copy)]
enum PaletteKind {
    Background,
    Sprite,
}

pub struct PPU {
    /// Current dot within the scanline (0..=340)
    pub cycles: usize,
    /// 0-239 visible, 240 post-render, 241-260 vblank, 261 pre-render
    pub scanline: usize,
    frame_is_odd: bool,
    frame_count: u64,

    pub v_ram: [u8; VRAM_SIZE],
    pub palette_table: [u8; PALETTE_SIZE],
    /// $2007 read buffer
    internal_data: u8,
    /// Last value driven onto the PPU's CPU-facing data bus
    io_latch: u8,

    pub ctrl_register: ControlRegister,  // $2000 (W)
    pub mask_register: MaskRegister,     // $2001 (W)
    pub status_register: StatusRegister, // $2002 (R)
    pub scroll_register: ScrollRegister, // $2005 / $2006 (W, latched)
    pub nmi: Nmi,

    pub oam_addr: u8,                            // $2003 (W)
    pub oam_data: [u8; PRIMARY_OAM_SIZE],        // $2004 (R/W)
    pub secondary_oam: [u8; SECONDARY_OAM_SIZE], // up to 8 sprites for the next line

    next_sprite_count: usize,
    sprite_zero_next: bool,
    sprites: SpriteUnits,

    next_tile: TileLatches,
    bg_shifters: BackgroundShifters,

    frame_buffer: Frame,
    completed_frame: Frame,
}

impl Default for PPU {
    fn default() -> Self {
        Self::new()
    }
}

impl PPU {
    pub fn new() -> Self {
        PPU {
            cycles: 0,
            scanline: 0,
            frame_is_odd: false,
            frame_count: 0,

            v_ram: [0; VRAM_SIZE],
            palette_table: POWER_UP_PALETTE,
            internal_data: 0,
            io_latch: 0,

            ctrl_register: ControlRegister::new(),
            mask_register: MaskRegister::new(),
            status_register: StatusRegister::new(),
            scroll_register: ScrollRegister::new(),
            nmi: Nmi::default(),

            oam_addr: 0,
            oam_data: [0; PRIMARY_OAM_SIZE],
            secondary_oam: [0xFF; SECONDARY_OAM_SIZE],

            next_sprite_count: 0,
            sprite_zero_next: false,
            sprites: SpriteUnits::default(),

            next_tile: TileLatches::default(),
            bg_shifters: BackgroundShifters::default(),

            frame_buffer: Frame::new(),
            completed_frame: Frame::new(),
        }
    }

    /// Console reset. Timing and registers return to power-on values;
    /// VRAM, palette and OAM keep their contents
    pub fn reset(&mut self) {
        self.cycles = 0;
        self.scanline = 0;
        self.frame_is_odd = false;
        self.internal_data = 0;
        self.io_latch = 0;

        self.ctrl_register = ControlRegister::new();
        self.mask_register = MaskRegister::new();
        self.status_register = StatusRegister::new();
        self.scroll_register = ScrollRegister::new();
        self.nmi.reset();
        self.oam_addr = 0;

        self.next_sprite_count = 0;
        self.sprite_zero_next = false;
        self.sprites = SpriteUnits::default();
        self.next_tile = TileLatches::default();
        self.bg_shifters = BackgroundShifters::default();
        trace_ppu_event!("RESET");
    }

    #[inline]
    pub fn nmi_line(&self) -> bool {
        self.nmi.line()
    }

    pub fn is_odd_frame(&self) -> bool {
        self.frame_is_odd
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Last completed frame
    pub fn frame(&self) -> &Frame {
        &self.completed_frame
    }

    pub fn read_register<B: PpuBusInterface + ?Sized>(&mut self, addr: u16, bus: &mut B) -> u8 {
        let reg = 0x2000 + (addr & 7);

        let value = match reg {
            0x2002 => {
                let result = (self.status_register.bits() & 0xE0) | (self.io_latch & 0x1F);
                self.status_register.reset_vblank_status();
                self.scroll_register.reset_latch();
                self.nmi.on_event(NmiEvent::StatusReadClearsVBlank);
                result
            }
            0x2004 => self.oam_read(),
            0x2007 => self.read_data(bus),
            // Write-only registers float
            _ => self.io_latch,
        };
        self.io_latch = value;
        value
    }

    /// Register read without side effects. $2007 reports the buffered value
    /// (or the palette entry) that a real read would return
    pub fn peek_register(&self, addr: u16) -> u8 {
        match 0x2000 + (addr & 7) {
            0x2002 => (self.status_register.bits() & 0xE0) | (self.io_latch & 0x1F),
            0x2004 => self.oam_read(),
            0x2007 => {
                let vram_addr = self.scroll_register.get_addr();
                if vram_addr >= 0x3F00 {
                    self.palette_table[Self::mirror_palette_addr(vram_addr)] | (self.io_latch & 0xC0)
                } else {
                    self.internal_data
                }
            }
            _ => self.io_latch,
        }
    }

    pub fn write_register<B: PpuBusInterface + ?Sized>(&mut self, addr: u16, value: u8, bus: &mut B) {
        self.io_latch = value;
        match 0x2000 + (addr & 7) {
            0x2000 => self.write_to_ctrl(value),
            0x2001 => self.mask_register.update(value),
            0x2002 => {}
            0x2003 => self.oam_addr = value,
            0x2004 => self.write_to_oam_data(value),
            0x2005 => self.scroll_register.write_scroll(value),
            0x2006 => self.scroll_register.write_to_addr(value),
            0x2007 => self.write_data(value, bus),
            _ => unreachable!("register index is masked to 3 bits"),
        }
    }

    pub fn write_to_oam_data(&mut self, value: u8) {
        self.oam_data[self.oam_addr as usize] = value;
        self.oam_addr = self.oam_addr.wrapping_add(1);
    }

    /// Advance the PPU by one dot. Returns true when a frame was completed
    pub fn tick<B: PpuBusInterface + ?Sized>(&mut self, bus: &mut B) -> bool {
        let rendering = self.mask_register.rendering_enabled();
        let ops = &ppu_schedule()[self.scanline][self.cycles];

        for &op in ops.as_slice() {
            if !rendering && op.needs_rendering() {
                continue;
            }
            self.run_operation(op, bus);
        }

        // Odd frames drop the last pre-render dot when rendering is on
        if self.scanline == PRERENDER_SCANLINE
            && self.cycles == DOTS - 2
            && self.frame_is_odd
            && rendering
        {
            trace_ppu_event!("ODD SKIP frame={}", self.frame_count);
            self.cycles = 0;
            self.scanline = 0;
            self.complete_frame();
            return true;
        }

        self.cycles += 1;
        if self.cycles == DOTS {
            self.cycles = 0;
            self.scanline += 1;
            if self.scanline == SCAN_LINES {
                self.scanline = 0;
                self.complete_frame();
                return true;
            }
        }
        false
    }

    /// Decodes one 8x8 CHR tile into 2-bit pixel values, `[row][col]`
    pub fn pattern_tile<B: PpuBusInterface + ?Sized>(
        &self,
        bus: &mut B,
        table: u8,
        tile: u8,
    ) -> [[u8; 8]; 8] {
        let base = (table as u16 & 1) * PATTERN_TABLE_SIZE + tile as u16 * 16;
        let mut pixels = [[0u8; 8]; 8];
        for (row, line) in pixels.iter_mut().enumerate() {
            let low = bus.ppu_bus_read(base + row as u16);
            let high = bus.ppu_bus_read(base + row as u16 + 8);
            for (col, pixel) in line.iter_mut().enumerate() {
                let bit = 7 - col;
                *pixel = (((high >> bit) & 1) << 1) | ((low >> bit) & 1);
            }
        }
        pixels
    }

    /// Renders a whole pattern table as a 128x128 frame (16x16 tiles),
    /// colored with background palette `palette` (0-3) or sprite palette (4-7)
    pub fn pattern_table_frame<B: PpuBusInterface + ?Sized>(
        &self,
        bus: &mut B,
        table: u8,
        palette: u8,
    ) -> Frame {
        let mut frame = Frame::with_size(128, 128);
        let (palette, kind) = if palette & 0b100 == 0 {
            (palette & 0b11, PaletteKind::Background)
        } else {
            (palette & 0b11, PaletteKind::Sprite)
        };

        for tile in 0..PATTERN_TABLE_TILES {
            let pixels = self.pattern_tile(bus, table, tile as u8);
            let (tile_x, tile_y) = ((tile % 16) * 8, (tile / 16) * 8);
            for (row, line) in pixels.iter().enumerate() {
                for (col, &pixel) in line.iter().enumerate() {
                    let color = self.palette_color(palette, pixel, kind);
                    frame.set_pixel(tile_x + col, tile_y + row, color);
                }
            }
        }
        frame
    }

    #[cfg(test)]
    pub fn run_until_vblank<B: PpuBusInterface + ?Sized>(&mut self, bus: &mut B) {
        while !self.status_register.vblank_active() {
            self.tick(bus);
        }
    }
}

// Per-dot work
impl PPU {
    #[inline]
    fn run_operation<B: PpuBusInterface + ?Sized>(&mut self, op: PpuOperation, bus: &mut B) {
        match op {
            PpuOperation::RenderPixel => self.render_dot(),
            PpuOperation::ShiftRegisters => self.shift_background_registers(),
            PpuOperation::ShiftSprites => self.shift_sprite_registers(),

            PpuOperation::FetchNameTable => self.fetch_name_table_byte(bus),
            PpuOperation::FetchAttribute => self.fetch_attribute_byte(bus),
            PpuOperation::FetchTileLow => self.fetch_tile_low_byte(bus),
            PpuOperation::FetchTileHigh => self.fetch_tile_high_byte(bus),
            PpuOperation::LoadBackgroundRegisters => self.load_background_registers(),

            PpuOperation::IncCoarseX => self.scroll_register.increment_x(),
            PpuOperation::IncFineY => self.scroll_register.increment_y(),
            PpuOperation::CopyHorizV => self.scroll_register.copy_horizontal_bits(),
            PpuOperation::CopyVertV => self.scroll_register.copy_vertical_bits(),

            PpuOperation::ClearSecondaryOam => self.clear_secondary_oam(),
            PpuOperation::EvaluateSprites => self.evaluate_sprites(),
            PpuOperation::FillSpriteRegister => {
                self.fill_sprite_register((self.cycles - 257) / 8, bus)
            }

            PpuOperation::SetVBlank => {
                trace_ppu_event!("VBLANK SET frame={}", self.frame_count);
                self.status_register.set_vblank_started();
                self.nmi.on_event(NmiEvent::VBlankSet);
            }
            PpuOperation::ClearFlags => {
                trace_ppu_event!("VBLANK CLEAR frame={}", self.frame_count);
                self.status_register.reset_vblank_status();
                self.status_register.set_sprite_zero_hit(false);
                self.status_register.set_sprite_overflow(false);
                self.next_sprite_count = 0;
                self.sprite_zero_next = false;
                self.nmi.on_event(NmiEvent::VBlankCleared);
            }
            PpuOperation::None => {}
        }
    }

    fn render_dot(&mut self) {
        let x = self.cycles - 1;
        let y = self.scanline;

        let color = if self.mask_register.rendering_enabled() {
            self.compose_pixel()
        } else {
            // Backdrop, unless v points into palette RAM
            let addr = self.scroll_register.get_addr();
            if addr >= 0x3F00 {
                self.palette_table[Self::mirror_palette_addr(addr)]
            } else {
                self.palette_table[0]
            }
        };

        let color = if self.mask_register.is_greyscale() {
            color & 0x30
        } else {
            color & 0x3F
        };
        self.frame_buffer.set_pixel(x, y, color);
    }

    fn compose_pixel(&mut self) -> u8 {
        let (bg_palette, bg_pixel) = self.background_pixel();
        let sprite = self.sprite_pixel();

        if sprite.sprite_zero && bg_pixel != 0 && self.cycles != 256 && !self.status_register.sprite_zero_hit() {
            let left_clipped = self.cycles <= 8
                && !(self.mask_register.leftmost_8pxl_background()
                    && self.mask_register.leftmost_8pxl_sprite());
            if !left_clipped {
                trace!("sprite 0 hit scanline={} dot={}", self.scanline, self.cycles);
                self.status_register.set_sprite_zero_hit(true);
            }
        }

        let (palette, pixel, kind) = if sprite.pixel == 0 {
            (bg_palette, bg_pixel, PaletteKind::Background)
        } else if bg_pixel == 0 || sprite.in_front {
            (sprite.palette, sprite.pixel, PaletteKind::Sprite)
        } else {
            (bg_palette, bg_pixel, PaletteKind::Background)
        };

        self.palette_color(palette, pixel, kind)
    }

    fn complete_frame(&mut self) {
        std::mem::swap(&mut self.frame_buffer, &mut self.completed_frame);
        self.frame_is_odd = !self.frame_is_odd;
        self.frame_count += 1;
        trace!("[FRAME END] frame={} odd={}", self.frame_count, self.frame_is_odd);
    }
}

// Memory access
impl PPU {
    fn oam_read(&self) -> u8 {
        let value = self.oam_data[self.oam_addr as usize];
        // Byte 2 (attributes) has no storage for bits 2-4
        if self.oam_addr & 0x03 == 0x02 {
            value & 0xE3
        } else {
            value
        }
    }

    fn write_to_ctrl(&mut self, value: u8) {
        let was_enabled = self.ctrl_register.nmi_enabled();
        self.ctrl_register.update(value);
        self.scroll_register
            .write_nametable_select(self.ctrl_register.nametable_bits());

        match (was_enabled, self.ctrl_register.nmi_enabled()) {
            (false, true) => self.nmi.on_event(NmiEvent::NmiEnableSet),
            (true, false) => self.nmi.on_event(NmiEvent::NmiEnableCleared),
            _ => {}
        }
    }

    /// $2007 read: buffered below $3F00. Palette reads return immediately
    /// and refill the buffer from the nametable underneath
    fn read_data<B: PpuBusInterface + ?Sized>(&mut self, bus: &mut B) -> u8 {
        let addr = self.scroll_register.get_addr();

        let result = if addr >= 0x3F00 {
            self.internal_data = self.read_bus(addr & 0x2FFF, bus);
            self.palette_table[Self::mirror_palette_addr(addr)] | (self.io_latch & 0xC0)
        } else {
            let buffered = self.internal_data;
            self.internal_data = self.read_bus(addr, bus);
            buffered
        };

        self.increment_vram_addr();
        result
    }

    fn write_data<B: PpuBusInterface + ?Sized>(&mut self, value: u8, bus: &mut B) {
        let addr = self.scroll_register.get_addr();
        self.write_bus(addr, value, bus);
        self.increment_vram_addr();
    }

    fn increment_vram_addr(&mut self) {
        let rendering_line = self.scanline < 240 || self.scanline == PRERENDER_SCANLINE;
        if rendering_line && self.mask_register.rendering_enabled() {
            // $2007 access mid-render bumps both scroll counters
            self.scroll_register.increment_x();
            self.scroll_register.increment_y();
        } else {
            self.scroll_register
                .increment_addr(self.ctrl_register.addr_increment());
        }
    }

    /// Unbuffered read of the PPU address space
    pub(super) fn read_bus<B: PpuBusInterface + ?Sized>(&mut self, addr: u16, bus: &mut B) -> u8 {
        let addr = addr & 0x3FFF;
        match addr {
            0x0000..=0x1FFF => bus.ppu_bus_read(addr),
            0x2000..=0x3EFF => self.v_ram[Self::mirror_vram_addr(addr, bus.mirroring())],
            _ => self.palette_table[Self::mirror_palette_addr(addr)],
        }
    }

    fn write_bus<B: PpuBusInterface + ?Sized>(&mut self, addr: u16, value: u8, bus: &mut B) {
        let addr = addr & 0x3FFF;
        match addr {
            0x0000..=0x1FFF => bus.ppu_bus_write(addr, value),
            0x2000..=0x3EFF => {
                let index = Self::mirror_vram_addr(addr, bus.mirroring());
                self.v_ram[index] = value;
            }
            // Palette RAM is 6 bits wide
            _ => self.palette_table[Self::mirror_palette_addr(addr)] = value & 0x3F,
        }
    }

    fn palette_color(&self, palette: u8, pixel: u8, kind: PaletteKind) -> u8 {
        if pixel == 0 {
            return self.palette_table[0];
        }
        let base = match kind {
            PaletteKind::Background => 0x00,
            PaletteKind::Sprite => 0x10,
        };
        self.palette_table[base + ((palette as usize & 0b11) << 2) + pixel as usize]
    }

    /// Folds $3F00-$3FFF onto the 32 palette entries; $3F10/$14/$18/$1C
    /// alias the background entries
    pub fn mirror_palette_addr(addr: u16) -> usize {
        let index = (addr & 0x1F) as usize;
        match index {
            0x10 | 0x14 | 0x18 | 0x1C => index - 0x10,
            _ => index,
        }
    }

    /// Maps $2000-$3EFF onto the nametable RAM offset for the board's wiring
    pub fn mirror_vram_addr(addr: u16, mirroring: Mirroring) -> usize {
        let index = addr & 0x0FFF;
        let table = index / NAME_TABLE_SIZE;
        let offset = index % NAME_TABLE_SIZE;

        let physical = match mirroring {
            // $2000=$2800, $2400=$2C00
            Mirroring::Vertical => table & 1,
            // $2000=$2400, $2800=$2C00
            Mirroring::Horizontal => table >> 1,
            Mirroring::FourScreen => table,
            Mirroring::Single0 => 0,
            Mirroring::Single1 => 1,
        };
        (physical * NAME_TABLE_SIZE + offset) as usize
    }
}

impl Traceable for PPU {
    fn trace_name(&self) -> &'static str {
        "PPU"
    }
    fn trace_state(&self) -> Option<String> {
        Some(format!(
            "scanline={} dot={} odd={} frame={} status={:08b} v={:04X} t={:04X} nmi_line={}",
            self.scanline,
            self.cycles,
            self.frame_is_odd,
            self.frame_count,
            self.status_register.bits(),
            self.scroll_register.v,
            self.scroll_register.t,
            self.nmi.line()
        ))
    }
}
