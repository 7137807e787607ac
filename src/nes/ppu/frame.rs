use super::consts::{FRAME_COLS, FRAME_ROWS, NES_SYSTEM_PALETTE};

/// A picture made of 6-bit NES palette indices, row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl Default for Frame {
    fn default() -> Self {
        Self::new()
    }
}

impl Frame {
    /// A blank 256x240 screen
    pub fn new() -> Self {
        Self::with_size(FRAME_COLS, FRAME_ROWS)
    }

    pub fn with_size(width: usize, height: usize) -> Self {
        Frame {
            width,
            height,
            data: vec![0; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Out-of-bounds writes are dropped
    #[inline]
    pub fn set_pixel(&mut self, x: usize, y: usize, palette_index: u8) {
        if x < self.width && y < self.height {
            self.data[y * self.width + x] = palette_index & 0x3F;
        }
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<u8> {
        if x < self.width && y < self.height {
            Some(self.data[y * self.width + x])
        } else {
            None
        }
    }

    pub fn indices(&self) -> &[u8] {
        &self.data
    }

    /// Packed RGB24, three bytes per pixel
    pub fn to_rgb(&self) -> Vec<u8> {
        let mut rgb = Vec::with_capacity(self.data.len() * 3);
        for &index in &self.data {
            let (r, g, b) = NES_SYSTEM_PALETTE[(index & 0x3F) as usize];
            rgb.extend_from_slice(&[r, g, b]);
        }
        rgb
    }
}
