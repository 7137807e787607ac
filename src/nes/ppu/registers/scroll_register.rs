/* Internal "loopy" registers shared by $2005 (PPUSCROLL) and $2006 (PPUADDR).
   See: https://www.nesdev.org/wiki/PPU_scrolling

   v / t layout (15 bits):
   yyy NN YYYYY XXXXX
   ||| || ||||| +++++-- coarse X scroll
   ||| || +++++-------- coarse Y scroll
   ||| ++-------------- nametable select
   +++----------------- fine Y scroll
*/

const COARSE_X: u16 = 0b000_00_00000_11111;
const COARSE_Y: u16 = 0b000_00_11111_00000;
const NAMETABLE_X: u16 = 0b000_01_00000_00000;
const NAMETABLE_Y: u16 = 0b000_10_00000_00000;
const FINE_Y: u16 = 0b111_00_00000_00000;

const HORIZONTAL_BITS: u16 = NAMETABLE_X | COARSE_X;
const VERTICAL_BITS: u16 = FINE_Y | NAMETABLE_Y | COARSE_Y;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrollRegister {
    /// Current VRAM address
    pub v: u16,
    /// Temporary VRAM address; top-left onscreen tile
    pub t: u16,
    /// Fine X scroll (3 bits)
    pub x: u8,
    /// First/second write toggle shared by $2005 and $2006
    pub w: bool,
}

impl ScrollRegister {
    pub fn new() -> Self {
        Self::default()
    }

    /// $2000 write: nametable select goes into t
    pub fn write_nametable_select(&mut self, bits: u16) {
        self.t = (self.t & !(NAMETABLE_X | NAMETABLE_Y)) | (bits & (NAMETABLE_X | NAMETABLE_Y));
    }

    /// $2005 write
    pub fn write_scroll(&mut self, data: u8) {
        let data = data as u16;
        if !self.w {
            self.x = (data & 0b111) as u8;
            self.t = (self.t & !COARSE_X) | (data >> 3);
        } else {
            self.t = (self.t & !(FINE_Y | COARSE_Y)) | ((data & 0b111) << 12) | ((data >> 3) << 5);
        }
        self.w = !self.w;
    }

    /// $2006 write. The high byte drops bit 14; the low byte also copies t into v
    pub fn write_to_addr(&mut self, data: u8) {
        let data = data as u16;
        if !self.w {
            self.t = (self.t & 0x00FF) | ((data & 0x3F) << 8);
        } else {
            self.t = (self.t & 0x7F00) | data;
            self.v = self.t;
        }
        self.w = !self.w;
    }

    /// VRAM address as seen on the PPU address bus
    pub fn get_addr(&self) -> u16 {
        self.v & 0x3FFF
    }

    pub fn increment_addr(&mut self, inc: u16) {
        self.v = self.v.wrapping_add(inc) & 0x7FFF;
    }

    pub fn reset_latch(&mut self) {
        self.w = false;
    }

    pub fn fine_y(&self) -> u16 {
        (self.v & FINE_Y) >> 12
    }

    /// Coarse X increment with horizontal nametable wrap
    pub fn increment_x(&mut self) {
        if self.v & COARSE_X == 31 {
            self.v &= !COARSE_X;
            self.v ^= NAMETABLE_X;
        } else {
            self.v += 1;
        }
    }

    /// Fine Y increment, carrying into coarse Y. Row 29 wraps and flips the
    /// vertical nametable; rows 30-31 (attribute area) wrap without flipping
    pub fn increment_y(&mut self) {
        if self.v & FINE_Y != FINE_Y {
            self.v += 0x1000;
            return;
        }

        self.v &= !FINE_Y;
        let coarse_y = match (self.v & COARSE_Y) >> 5 {
            29 => {
                self.v ^= NAMETABLE_Y;
                0
            }
            31 => 0,
            y => y + 1,
        };
        self.v = (self.v & !COARSE_Y) | (coarse_y << 5);
    }

    pub fn copy_horizontal_bits(&mut self) {
        self.v = (self.v & !HORIZONTAL_BITS) | (self.t & HORIZONTAL_BITS);
    }

    pub fn copy_vertical_bits(&mut self) {
        self.v = (self.v & !VERTICAL_BITS) | (self.t & VERTICAL_BITS);
    }

    /// Nametable byte address for the tile under v
    pub fn tile_addr(&self) -> u16 {
        0x2000 | (self.v & 0x0FFF)
    }

    /// Attribute byte address for the tile under v
    pub fn attribute_addr(&self) -> u16 {
        0x23C0 | (self.v & 0x0C00) | ((self.v >> 4) & 0x38) | ((self.v >> 2) & 0x07)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_scroll_writes_split_x_and_y() {
        let mut sr = ScrollRegister::new();
        sr.write_scroll(0b10101_011);
        assert_eq!(sr.x, 0b011);
        assert_eq!(sr.t & COARSE_X, 0b10101);
        assert!(sr.w);

        sr.write_scroll(0b01110_101);
        assert_eq!((sr.t & COARSE_Y) >> 5, 0b01110);
        assert_eq!((sr.t & FINE_Y) >> 12, 0b101);
        assert!(!sr.w);
    }

    #[test]
    fn test_addr_writes_copy_t_into_v_on_second_write() {
        let mut sr = ScrollRegister::new();
        sr.write_to_addr(0x3F);
        assert_eq!(sr.v, 0);
        sr.write_to_addr(0x10);
        assert_eq!(sr.v, 0x3F10);
        assert_eq!(sr.get_addr(), 0x3F10);
    }

    #[test]
    fn test_addr_high_write_masks_to_six_bits() {
        let mut sr = ScrollRegister::new();
        sr.write_to_addr(0xFF);
        sr.write_to_addr(0xFF);
        assert_eq!(sr.v, 0x3FFF);
    }

    #[test]
    fn test_scroll_and_addr_share_latch() {
        let mut sr = ScrollRegister::new();
        sr.write_scroll(0x00);
        sr.write_to_addr(0x12);
        // Second write of the shared latch: low byte
        assert_eq!(sr.v, 0x0012);
        sr.reset_latch();
        assert!(!sr.w);
    }

    #[test]
    fn test_increment_x_wraps_into_next_nametable() {
        let mut sr = ScrollRegister::new();
        sr.v = 31;
        sr.increment_x();
        assert_eq!(sr.v & COARSE_X, 0);
        assert_eq!(sr.v & NAMETABLE_X, NAMETABLE_X);
    }

    #[test]
    fn test_increment_y_row_29_flips_vertical_nametable() {
        let mut sr = ScrollRegister::new();
        sr.v = FINE_Y | (29 << 5);
        sr.increment_y();
        assert_eq!(sr.v & (FINE_Y | COARSE_Y), 0);
        assert_eq!(sr.v & NAMETABLE_Y, NAMETABLE_Y);
    }

    #[test]
    fn test_increment_y_row_31_wraps_without_flip() {
        let mut sr = ScrollRegister::new();
        sr.v = FINE_Y | (31 << 5);
        sr.increment_y();
        assert_eq!(sr.v, 0);
    }

    #[test]
    fn test_increment_y_fine_only() {
        let mut sr = ScrollRegister::new();
        sr.v = 5 << 5;
        sr.increment_y();
        assert_eq!(sr.fine_y(), 1);
        assert_eq!((sr.v & COARSE_Y) >> 5, 5);
    }

    #[test]
    fn test_copy_bits_from_t() {
        let mut sr = ScrollRegister::new();
        sr.t = 0x7FFF;
        sr.copy_horizontal_bits();
        assert_eq!(sr.v, HORIZONTAL_BITS);
        sr.v = 0;
        sr.copy_vertical_bits();
        assert_eq!(sr.v, VERTICAL_BITS);
    }

    #[test]
    fn test_fetch_addresses() {
        let mut sr = ScrollRegister::new();
        // Nametable 1, coarse X = 5, coarse Y = 9, fine Y = 3
        sr.v = (3 << 12) | NAMETABLE_X | (9 << 5) | 5;
        assert_eq!(sr.tile_addr(), 0x2400 | (9 << 5) | 5);
        assert_eq!(sr.attribute_addr(), 0x27C0 | ((9 / 4) << 3) | (5 / 4));
    }
}
