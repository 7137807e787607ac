/// One CPU cycle of an OAM DMA transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OamDmaOp {
    /// Halt or alignment cycle: the CPU is stalled but nothing moves
    Dummy,
    /// Read a byte from CPU space, to be handed back through `latch`
    Read(u16),
    /// Write the latched byte to $2004
    Write(u8),
}

/// $4014 sprite DMA: 256 read/write pairs after one halt cycle, plus one
/// alignment cycle when the transfer starts on an odd CPU cycle
#[derive(Debug, Default)]
pub struct OamDma {
    active: bool,
    page: u8,
    cycle: u16,
    latch: u8,
    dummy_cycles: u8,
}

impl OamDma {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> bool {
        self.active
    }

    /// Start OAM DMA. `cpu_odd_cycle` decides whether an alignment cycle is needed
    pub fn start(&mut self, page: u8, cpu_odd_cycle: bool) {
        self.active = true;
        self.page = page;
        self.cycle = 0;
        self.latch = 0;
        self.dummy_cycles = 1 + cpu_odd_cycle as u8;
    }

    /// Hands the byte fetched for the last `Read` to the following `Write`
    pub fn latch(&mut self, value: u8) {
        self.latch = value;
    }

    pub fn step(&mut self) -> OamDmaOp {
        if !self.active {
            return OamDmaOp::Dummy;
        }

        if self.dummy_cycles > 0 {
            self.dummy_cycles -= 1;
            return OamDmaOp::Dummy;
        }

        // 512 cycles to complete 256 read/write pairs
        let phase = self.cycle & 1;
        let index = self.cycle >> 1;

        let op = if phase == 0 {
            OamDmaOp::Read(((self.page as u16) << 8) | index)
        } else {
            OamDmaOp::Write(self.latch)
        };

        self.cycle += 1;

        // done when 256 bytes have been written
        if index == 255 && phase == 1 {
            self.active = false;
        }

        op
    }
}
