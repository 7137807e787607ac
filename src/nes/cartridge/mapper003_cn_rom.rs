use super::rom::Mirroring;
use super::{Cartridge, ChrMemory};

/// Mapper 3: fixed PRG (NROM layout), switchable 8 KB CHR bank
#[derive(Debug)]
pub struct Mapper003CnRom {
    chr: ChrMemory,
    prg_rom: Vec<u8>,
    mirroring: Mirroring,
    bank_select: usize,
}

impl Mapper003CnRom {
    pub fn new(prg_rom: Vec<u8>, chr_rom: Vec<u8>, mirroring: Mirroring) -> Mapper003CnRom {
        Mapper003CnRom {
            chr: ChrMemory::new(chr_rom),
            prg_rom,
            mirroring,
            bank_select: 0,
        }
    }
}

impl Cartridge for Mapper003CnRom {
    fn cpu_peek(&self, addr: u16) -> Option<u8> {
        match addr {
            0x8000..=0xFFFF => {
                let index = (addr as usize - 0x8000) % self.prg_rom.len();
                Some(self.prg_rom[index])
            }
            _ => None,
        }
    }

    fn cpu_write(&mut self, addr: u16, data: u8) {
        /*
           7  bit  0
           ---- ----
           xxxx CCCC
                ||||
                ++++- Select 8 KB CHR ROM bank for PPU $0000-$1FFF
        */
        if addr >= 0x8000 {
            self.bank_select = (data & 0x0F) as usize;
            log::debug!("CNROM: CHR bank {}", self.bank_select);
        }
    }

    fn ppu_read(&mut self, addr: u16) -> u8 {
        self.chr.read(self.bank_select, addr)
    }

    fn ppu_write(&mut self, addr: u16, data: u8) {
        self.chr.write(addr, data);
    }

    fn mirroring(&self) -> Mirroring {
        self.mirroring
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_chr_bank_switching() {
        let chr: Vec<u8> = (0..4u8)
            .flat_map(|bank| std::iter::repeat_n(bank, 0x2000))
            .collect();
        let mut cart = Mapper003CnRom::new(vec![0xEA; 0x8000], chr, Mirroring::Vertical);
        assert_eq!(cart.ppu_read(0x0000), 0);

        cart.cpu_write(0x8000, 3);
        assert_eq!(cart.ppu_read(0x1FFF), 3);

        cart.cpu_write(0x8000, 6);
        assert_eq!(cart.ppu_read(0x0100), 2);
        assert_eq!(cart.cpu_read(0xFFFC), Some(0xEA));
    }
}
