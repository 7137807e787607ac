use super::rom::Mirroring;
use super::{Cartridge, ChrMemory};

const PRG_RAM_SIZE: usize = 0x2000;

/// Mapper 0: fixed 16 KB or 32 KB PRG, 8 KB CHR, optional PRG-RAM at $6000
#[derive(Debug)]
pub struct NromCart {
    chr: ChrMemory,
    prg_rom: Vec<u8>,
    prg_ram: Vec<u8>,
    mirroring: Mirroring,
}

impl NromCart {
    pub fn new(prg_rom: Vec<u8>, chr_rom: Vec<u8>, mirroring: Mirroring) -> NromCart {
        NromCart {
            chr: ChrMemory::new(chr_rom),
            prg_rom,
            prg_ram: vec![0; PRG_RAM_SIZE],
            mirroring,
        }
    }

    pub fn chr_is_ram(&self) -> bool {
        self.chr.is_ram()
    }
}

impl Cartridge for NromCart {
    fn cpu_peek(&self, addr: u16) -> Option<u8> {
        match addr {
            0x6000..=0x7FFF => Some(self.prg_ram[(addr - 0x6000) as usize]),
            0x8000..=0xFFFF => {
                // 16 KB images are mirrored into $C000-$FFFF
                let index = (addr - 0x8000) as usize % self.prg_rom.len();
                Some(self.prg_rom[index])
            }
            _ => None,
        }
    }

    fn cpu_write(&mut self, addr: u16, data: u8) {
        match addr {
            0x6000..=0x7FFF => self.prg_ram[(addr - 0x6000) as usize] = data,
            0x8000..=0xFFFF => log::warn!("NROM: write to PRG-ROM at {addr:04X} = {data:02X}"),
            _ => {}
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
