use super::PPU;
use crate::nes::bus::PpuBusInterface;

pub(super) const MAX_SPRITES_PER_LINE: usize = 8;
const OAM_SPRITES: usize = 64;

const ATTR_PALETTE: u8 = 0b0000_0011;
const ATTR_BEHIND_BACKGROUND: u8 = 0b0010_0000;
const ATTR_FLIP_HORIZONTAL: u8 = 0b0100_0000;
const ATTR_FLIP_VERTICAL: u8 = 0b1000_0000;

/// The eight sprite output units used while drawing a scanline
#[derive(Debug, Clone)]
pub(super) struct SpriteUnits {
    pub pattern_low: [u8; MAX_SPRITES_PER_LINE],
    pub pattern_high: [u8; MAX_SPRITES_PER_LINE],
    pub x_counter: [u8; MAX_SPRITES_PER_LINE],
    pub attributes: [u8; MAX_SPRITES_PER_LINE],
    pub count: usize,
    /// Unit 0 holds OAM sprite 0
    pub zero_in_range: bool,
}

impl Default for SpriteUnits {
    fn default() -> Self {
        Self {
            pattern_low: [0; MAX_SPRITES_PER_LINE],
            pattern_high: [0; MAX_SPRITES_PER_LINE],
            x_counter: [0xFF; MAX_SPRITES_PER_LINE],
            attributes: [0; MAX_SPRITES_PER_LINE],
            count: 0,
            zero_in_range: false,
        }
    }
}

/// Winning sprite pixel at the current dot
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(super) struct SpritePixel {
    pub palette: u8,
    pub pixel: u8,
    pub in_front: bool,
    /// Sprite 0 had an opaque pixel here, whether or not it won
    pub sprite_zero: bool,
}

impl PPU {
    pub(super) fn sprite_pixel(&self) -> SpritePixel {
        let mut out = SpritePixel::default();
        if !self.mask_register.show_sprites() {
            return out;
        }
        if self.cycles <= 8 && !self.mask_register.leftmost_8pxl_sprite() {
            return out;
        }

        let units = &self.sprites;
        for i in 0..units.count {
            if units.x_counter[i] != 0 {
                continue;
            }
            let low = (units.pattern_low[i] >> 7) & 1;
            let high = (units.pattern_high[i] >> 7) & 1;
            let pixel = (high << 1) | low;
            if pixel == 0 {
                continue;
            }

            if i == 0 && units.zero_in_range {
                out.sprite_zero = true;
            }
            // Lowest OAM index wins
            if out.pixel == 0 {
                out.palette = units.attributes[i] & ATTR_PALETTE;
                out.pixel = pixel;
                out.in_front = units.attributes[i] & ATTR_BEHIND_BACKGROUND == 0;
            }
        }
        out
    }

    pub(super) fn shift_sprite_registers(&mut self) {
        let units = &mut self.sprites;
        for i in 0..MAX_SPRITES_PER_LINE {
            if units.x_counter[i] > 0 {
                units.x_counter[i] -= 1;
            } else {
                units.pattern_low[i] <<= 1;
                units.pattern_high[i] <<= 1;
            }
        }
    }

    pub(super) fn clear_secondary_oam(&mut self) {
        self.secondary_oam = [0xFF; 32];
    }

    /// Scans OAM for sprites on the next scanline. Once eight are found the
    /// hardware keeps scanning for overflow but advances the byte index m along
    /// with n on every miss, so it compares tile/attribute/X bytes as if they
    /// were Y coordinates.
    /// See: https://www.nesdev.org/wiki/PPU_sprite_evaluation
    pub(super) fn evaluate_sprites(&mut self) {
        let scanline = self.scanline;
        let height = self.ctrl_register.sprite_height() as usize;
        let in_range = |y: u8| scanline >= y as usize && scanline - (y as usize) < height;

        let mut found = 0;
        let mut n = 0;
        self.sprite_zero_next = false;

        while n < OAM_SPRITES && found < MAX_SPRITES_PER_LINE {
            let base = n * 4;
            if in_range(self.oam_data[base]) {
                self.secondary_oam[found * 4..found * 4 + 4]
                    .copy_from_slice(&self.oam_data[base..base + 4]);
                if n == 0 {
                    self.sprite_zero_next = true;
                }
                found += 1;
            }
            n += 1;
        }

        let mut m = 0;
        while n < OAM_SPRITES {
            if in_range(self.oam_data[n * 4 + m]) {
                self.status_register.set_sprite_overflow(true);
                break;
            }
            n += 1;
            m = (m + 1) & 3;
        }

        self.next_sprite_count = found;
    }

    /// Sprite fetch for output unit `slot` at dots 257 + 8 * slot
    pub(super) fn fill_sprite_register<B: PpuBusInterface + ?Sized>(
        &mut self,
        slot: usize,
        bus: &mut B,
    ) {
        if slot == 0 {
            self.sprites.count = self.next_sprite_count;
            self.sprites.zero_in_range = self.sprite_zero_next;
        }

        let base = slot * 4;
        let y = self.secondary_oam[base];
        let tile = self.secondary_oam[base + 1];
        let attributes = self.secondary_oam[base + 2];
        let x = self.secondary_oam[base + 3];

        if slot >= self.sprites.count {
            // Empty slots still fetch tile $FF
            let addr = self.ctrl_register.sprite_pattern_addr() + 0xFF * 16;
            self.read_bus(addr, bus);
            self.read_bus(addr + 8, bus);

            self.sprites.x_counter[slot] = 0xFF;
            self.sprites.attributes[slot] = 0;
            self.sprites.pattern_low[slot] = 0;
            self.sprites.pattern_high[slot] = 0;
            return;
        }

        let height = self.ctrl_register.sprite_height() as u16;
        let mut row = (self.scanline as u16).wrapping_sub(y as u16) & (height - 1);
        if attributes & ATTR_FLIP_VERTICAL != 0 {
            row = height - 1 - row;
        }

        let addr = if height == 16 {
            let table = (tile & 0x01) as u16 * 0x1000;
            let top = (tile & 0xFE) as u16;
            let half = if row < 8 { 0 } else { 1 };
            table + (top + half) * 16 + (row & 0x07)
        } else {
            self.ctrl_register.sprite_pattern_addr() + tile as u16 * 16 + row
        };

        let mut low = self.read_bus(addr, bus);
        let mut high = self.read_bus(addr + 8, bus);
        if attributes & ATTR_FLIP_HORIZONTAL != 0 {
            low = low.reverse_bits();
            high = high.reverse_bits();
        }

        self.sprites.x_counter[slot] = x;
        self.sprites.attributes[slot] = attributes;
        self.sprites.pattern_low[slot] = low;
        self.sprites.pattern_high[slot] = high;
    }
}
