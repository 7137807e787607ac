use crate::nes::cartridge::Cartridge;
use crate::nes::cartridge::rom::Mirroring;

pub mod consts;
pub mod nes_bus;
#[cfg(test)]
mod nes_bus_test;
pub mod simple_bus;

/// The CPU's view of the system: a 16-bit address space plus the two
/// interrupt inputs it samples at instruction boundaries
pub trait CpuBusInterface {
    fn cpu_bus_read(&mut self, addr: u16) -> u8;
    fn cpu_bus_write(&mut self, addr: u16, value: u8);

    /// Read without side effects (no register clears, no open-bus update).
    /// Used for disassembly and trace output
    fn cpu_bus_peek(&self, addr: u16) -> u8;

    /// Level of the NMI output driven by the PPU. The CPU detects the edge
    fn nmi_line(&self) -> bool {
        false
    }

    /// Level of the shared IRQ line
    fn irq_line(&self) -> bool {
        false
    }
}

/// The PPU's view of the system: the 8 KB pattern space and the
/// nametable wiring, both provided by the cartridge
pub trait PpuBusInterface {
    fn ppu_bus_read(&mut self, addr: u16) -> u8;
    fn ppu_bus_write(&mut self, addr: u16, value: u8);
    fn mirroring(&self) -> Mirroring;
}

impl<C: Cartridge + ?Sized> PpuBusInterface for C {
    #[inline]
    fn ppu_bus_read(&mut self, addr: u16) -> u8 {
        self.ppu_read(addr)
    }

    #[inline]
    fn ppu_bus_write(&mut self, addr: u16, value: u8) {
        self.ppu_write(addr, value)
    }

    #[inline]
    fn mirroring(&self) -> Mirroring {
        Cartridge::mirroring(self)
    }
}
