use super::rom::{Mirroring, PRG_ROM_PAGE_SIZE};
use super::{Cartridge, ChrMemory};

/// Mapper 2: switchable 16 KB bank at $8000, last bank fixed at $C000
#[derive(Debug)]
pub struct Mapper002UxRom {
    chr: ChrMemory,
    prg_rom: Vec<u8>,
    mirroring: Mirroring,
    bank_select: usize,
}

impl Mapper002UxRom {
    pub fn new(prg_rom: Vec<u8>, chr_rom: Vec<u8>, mirroring: Mirroring) -> Mapper002UxRom {
        Mapper002UxRom {
            chr: ChrMemory::new(chr_rom),
            prg_rom,
            mirroring,
            bank_select: 0,
        }
    }

    fn prg_bank_count(&self) -> usize {
        (self.prg_rom.len() / PRG_ROM_PAGE_SIZE).max(1)
    }
}

impl Cartridge for Mapper002UxRom {
    fn cpu_peek(&self, addr: u16) -> Option<u8> {
        let bank_count = self.prg_bank_count();
        match addr {
            0x8000..=0xBFFF => {
                let base = (self.bank_select % bank_count) * PRG_ROM_PAGE_SIZE;
                Some(self.prg_rom[base + (addr as usize - 0x8000)])
            }
            0xC000..=0xFFFF => {
                let base = (bank_count - 1) * PRG_ROM_PAGE_SIZE;
                Some(self.prg_rom[base + (addr as usize - 0xC000)])
            }
            _ => None,
        }
    }

    fn cpu_write(&mut self, addr: u16, data: u8) {
        /*
           7  bit  0
           ---- ----
           xxxx pPPP
                ||||
                ++++- Select 16 KB PRG ROM bank for CPU $8000-$BFFF
                     (UNROM uses bits 2-0; UOROM uses bits 3-0)
        */
        if addr >= 0x8000 {
            self.bank_select = (data & 0x0F) as usize;
            log::debug!("UxROM: PRG bank {}", self.bank_select);
        }
    }

    fn ppu_read(&mut self, addr: u16) -> u8 {
        self.chr.read(0, addr)
    }

    fn ppu_write(&mut self, addr: u16, data: u8) {
        self.chr.write(addr, data);
    }

    fn mirroring(&self) -> Mirroring {
        self.mirroring
    }
}
