use super::PPU;
use crate::nes::bus::PpuBusInterface;

/// Fetched bytes waiting to be loaded into the low half of the shifters
#[derive(Debug, Default, Clone)]
pub(super) struct TileLatches {
    pub tile_id: u8,
    pub attribute: u8,
    pub pattern_low: u8,
    pub pattern_high: u8,
}

#[derive(Debug, Default, Clone)]
pub(super) struct BackgroundShifters {
    pub pattern_low: u16,
    pub pattern_high: u16,
    pub attr_low: u16,
    pub attr_high: u16,
    attr_latch_low: u8,
    attr_latch_high: u8,
}

impl PPU {
    /// (palette, pixel) of the background at the current dot. Pixel 0 is transparent
    pub(super) fn background_pixel(&self) -> (u8, u8) {
        if !self.mask_register.show_background() {
            return (0, 0);
        }
        if self.cycles <= 8 && !self.mask_register.leftmost_8pxl_background() {
            return (0, 0);
        }

        let bit = 15 - (self.scroll_register.x as u16 & 0x07);
        let bg = &self.bg_shifters;

        let pixel_low = (bg.pattern_low >> bit) & 1;
        let pixel_high = (bg.pattern_high >> bit) & 1;
        let attr_low = (bg.attr_low >> bit) & 1;
        let attr_high = (bg.attr_high >> bit) & 1;

        (((attr_high << 1) | attr_low) as u8, ((pixel_high << 1) | pixel_low) as u8)
    }

    pub(super) fn load_background_registers(&mut self) {
        let next = &self.next_tile;
        let bg = &mut self.bg_shifters;

        bg.pattern_low = (bg.pattern_low & 0xFF00) | next.pattern_low as u16;
        bg.pattern_high = (bg.pattern_high & 0xFF00) | next.pattern_high as u16;

        bg.attr_latch_low = next.attribute & 0b01;
        bg.attr_latch_high = (next.attribute & 0b10) >> 1;

        let spread = |bit: u8| -> u16 { if bit != 0 { 0x00FF } else { 0x0000 } };
        bg.attr_low = (bg.attr_low & 0xFF00) | spread(bg.attr_latch_low);
        bg.attr_high = (bg.attr_high & 0xFF00) | spread(bg.attr_latch_high);
    }

    pub(super) fn shift_background_registers(&mut self) {
        let bg = &mut self.bg_shifters;
        bg.pattern_low <<= 1;
        bg.pattern_high <<= 1;
        bg.attr_low = (bg.attr_low << 1) | bg.attr_latch_low as u16;
        bg.attr_high = (bg.attr_high << 1) | bg.attr_latch_high as u16;
    }

    // dot % 8 == 1
    pub(super) fn fetch_name_table_byte<B: PpuBusInterface + ?Sized>(&mut self, bus: &mut B) {
        let addr = self.scroll_register.tile_addr();
        self.next_tile.tile_id = self.read_bus(addr, bus);
    }

    // dot % 8 == 3
    pub(super) fn fetch_attribute_byte<B: PpuBusInterface + ?Sized>(&mut self, bus: &mut B) {
        let addr = self.scroll_register.attribute_addr();
        let attr_byte = self.read_bus(addr, bus);

        // Each attribute byte covers a 4x4 tile area split into 2x2 quadrants
        let v = self.scroll_register.v;
        let coarse_x = v & 0x1F;
        let coarse_y = (v >> 5) & 0x1F;
        let shift = ((coarse_y & 0x02) << 1) | (coarse_x & 0x02);
        self.next_tile.attribute = (attr_byte >> shift) & 0b11;
    }

    // dot % 8 == 5
    pub(super) fn fetch_tile_low_byte<B: PpuBusInterface + ?Sized>(&mut self, bus: &mut B) {
        let addr = self.background_tile_row_addr();
        self.next_tile.pattern_low = self.read_bus(addr, bus);
    }

    // dot % 8 == 7
    pub(super) fn fetch_tile_high_byte<B: PpuBusInterface + ?Sized>(&mut self, bus: &mut B) {
        let addr = self.background_tile_row_addr() + 8;
        self.next_tile.pattern_high = self.read_bus(addr, bus);
    }

    fn background_tile_row_addr(&self) -> u16 {
        self.ctrl_register.background_pattern_addr()
            + (self.next_tile.tile_id as u16) * 16
            + self.scroll_register.fine_y()
    }
}
