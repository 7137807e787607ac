// See: https://www.nesdev.org/wiki/CPU_interrupts
use super::Flags;
use crate::nes::bus::consts::{IRQ_VECTOR, NMI_VECTOR};

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum InterruptType {
    Nmi, // Non-maskable, edge of the PPU's NMI output
    Irq, // Level-sensitive, masked by the I flag
    Brk, // Software interrupt, shares the IRQ vector
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Interrupt {
    pub interrupt_type: InterruptType,
    pub vector_addr: u16,
    /// Bits 4 (B) and 5 as they appear in the pushed status byte
    pub b_flag_mask: u8,
    pub cpu_cycles: u8,
}

impl Interrupt {
    /// Status byte as pushed on the stack when this interrupt is entered
    pub fn pushed_status(&self, status: Flags) -> u8 {
        let mut pushed = status;
        pushed.set(Flags::BREAK, self.b_flag_mask & Flags::BREAK.bits() != 0);
        pushed.set(Flags::BREAK2, self.b_flag_mask & Flags::BREAK2.bits() != 0);
        pushed.bits()
    }
}

pub const NMI: Interrupt = Interrupt {
    interrupt_type: InterruptType::Nmi,
    vector_addr: NMI_VECTOR,
    b_flag_mask: 0b0010_0000,
    cpu_cycles: 7,
};

pub const BRK: Interrupt = Interrupt {
    interrupt_type: InterruptType::Brk,
    vector_addr: IRQ_VECTOR,
    b_flag_mask: 0b0011_0000,
    cpu_cycles: 7,
};

pub const IRQ: Interrupt = Interrupt {
    interrupt_type: InterruptType::Irq,
    vector_addr: IRQ_VECTOR,
    b_flag_mask: 0b0010_0000,
    cpu_cycles: 7,
};
