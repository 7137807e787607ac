use crate::nes::tracer::Traceable;
use bitflags::bitflags;

bitflags! {
    /* See: https://www.nesdev.org/wiki/PPU_registers#PPUSTATUS
        7  bit  0
        ---- ----
        VSOx xxxx
        |||| ||||
        |||+-++++- (PPU open bus)
        ||+------- Sprite overflow flag
        |+-------- Sprite 0 hit flag
        +--------- Vblank flag, cleared on read.
     */
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct StatusRegister: u8 {
        const SPRITE_OVERFLOW  = 0b0010_0000;
        const SPRITE_ZERO_HIT  = 0b0100_0000;
        const VBLANK_STARTED   = 0b1000_0000;
    }
}

impl StatusRegister {
    pub fn new() -> Self {
        StatusRegister::empty()
    }

    pub fn vblank_active(&self) -> bool {
        self.contains(StatusRegister::VBLANK_STARTED)
    }

    pub fn set_vblank_started(&mut self) {
        self.insert(StatusRegister::VBLANK_STARTED);
    }

    pub fn reset_vblank_status(&mut self) {
        self.remove(StatusRegister::VBLANK_STARTED);
    }

    pub fn sprite_zero_hit(&self) -> bool {
        self.contains(StatusRegister::SPRITE_ZERO_HIT)
    }

    pub fn set_sprite_zero_hit(&mut self, status: bool) {
        self.set(StatusRegister::SPRITE_ZERO_HIT, status);
    }

    pub fn sprite_overflow(&self) -> bool {
        self.contains(StatusRegister::SPRITE_OVERFLOW)
    }

    pub fn set_sprite_overflow(&mut self, status: bool) {
        self.set(StatusRegister::SPRITE_OVERFLOW, status);
    }
}

impl Traceable for StatusRegister {
    fn trace_name(&self) -> &'static str {
        "PPU_STATUS"
    }
    fn trace_state(&self) -> Option<String> {
        Some(format!("0b{:08b}", self.bits()))
    }
}
