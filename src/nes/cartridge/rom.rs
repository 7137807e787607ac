use crate::nes::cartridge::Cartridge;
use crate::nes::cartridge::mapper000_nrom::NromCart;
use crate::nes::cartridge::mapper002_ux_rom::Mapper002UxRom;
use crate::nes::cartridge::mapper003_cn_rom::Mapper003CnRom;
use thiserror::Error;

const NES_MAGIC_BYTES: &[u8; 4] = b"NES\x1A";
const HEADER_SIZE: usize = 16;
const TRAINER_SIZE: usize = 512;
pub const PRG_ROM_PAGE_SIZE: usize = 0x4000;
pub const CHR_ROM_PAGE_SIZE: usize = 0x2000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RomError {
    #[error("{0}")]
    InvalidFormat(String),

    #[error("Unsupported ROM version: v{0}")]
    UnsupportedVersion(u8),

    #[error("Unsupported Mapper: {0}")]
    UnsupportedMapper(u8),

    #[error("ROM image truncated: expected {expected} bytes, found {actual}")]
    Truncated { expected: usize, actual: usize },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Mirroring {
    Vertical,
    Horizontal,
    FourScreen,
    Single0,
    Single1,
}

/// Validated iNES image split into its banks
#[derive(Debug, Clone)]
pub struct Rom {
    pub prg_rom: Vec<u8>,
    pub chr_rom: Vec<u8>,
    pub mapper: u8,
    pub screen_mirroring: Mirroring,
}

impl Rom {
    /// Parses an iNES (v1) image.
    ///
    /// ```text
    /// 0-3  "NES" + $1A
    /// 4    PRG-ROM size in 16 KB units
    /// 5    CHR-ROM size in 8 KB units (0 = board has CHR-RAM)
    /// 6    NNNN FTBM  mapper low nibble, four-screen, trainer, battery, mirroring
    /// 7    NNNN VV..  mapper high nibble, header version (2 = NES 2.0)
    /// ```
    pub fn parse(raw: &[u8]) -> Result<Rom, RomError> {
        if raw.len() < HEADER_SIZE || &raw[0..4] != NES_MAGIC_BYTES {
            return Err(RomError::InvalidFormat("Not an iNES file".into()));
        }

        let ines_ver = (raw[7] >> 2) & 0b11;
        if ines_ver != 0 {
            return Err(RomError::UnsupportedVersion(ines_ver));
        }

        let mapper = (raw[7] & 0b1111_0000) | (raw[6] >> 4);

        let four_screen = raw[6] & 0b1000 != 0;
        let vertical_mirroring = raw[6] & 0b1 != 0;
        let screen_mirroring = match (four_screen, vertical_mirroring) {
            (true, _) => Mirroring::FourScreen,
            (false, true) => Mirroring::Vertical,
            (false, false) => Mirroring::Horizontal,
        };

        let prg_rom_size = raw[4] as usize * PRG_ROM_PAGE_SIZE;
        let chr_rom_size = raw[5] as usize * CHR_ROM_PAGE_SIZE;
        if prg_rom_size == 0 {
            return Err(RomError::InvalidFormat("ROM declares no PRG-ROM banks".into()));
        }

        let has_trainer = raw[6] & 0b100 != 0;
        let prg_rom_start = HEADER_SIZE + if has_trainer { TRAINER_SIZE } else { 0 };
        let chr_rom_start = prg_rom_start + prg_rom_size;
        let expected = chr_rom_start + chr_rom_size;
        if raw.len() < expected {
            return Err(RomError::Truncated {
                expected,
                actual: raw.len(),
            });
        }

        log::debug!(
            "iNES image: mapper={} prg={}KB chr={}KB mirroring={:?} trainer={}",
            mapper,
            prg_rom_size / 1024,
            chr_rom_size / 1024,
            screen_mirroring,
            has_trainer
        );

        Ok(Rom {
            prg_rom: raw[prg_rom_start..chr_rom_start].to_vec(),
            chr_rom: raw[chr_rom_start..expected].to_vec(),
            mapper,
            screen_mirroring,
        })
    }

    pub fn new_custom(
        prg_rom: Vec<u8>,
        chr_rom: Vec<u8>,
        mapper: u8,
        screen_mirroring: Mirroring,
    ) -> Rom {
        Rom {
            prg_rom,
            chr_rom,
            mapper,
            screen_mirroring,
        }
    }

    pub fn into_cartridge(self) -> Result<Box<dyn Cartridge>, RomError> {
        match self.mapper {
            0 => {
                self.check_fixed_prg("NROM")?;
                let cart = NromCart::new(self.prg_rom, self.chr_rom, self.screen_mirroring);
                Ok(Box::new(cart))
            }
            2 => {
                if self.prg_rom.is_empty() || self.prg_rom.len() % PRG_ROM_PAGE_SIZE != 0 {
                    return Err(RomError::InvalidFormat(format!(
                        "UxROM expects PRG-ROM in whole 16 KB banks, found {} bytes",
                        self.prg_rom.len()
                    )));
                }
                let cart = Mapper002UxRom::new(self.prg_rom, self.chr_rom, self.screen_mirroring);
                Ok(Box::new(cart))
            }
            3 => {
                self.check_fixed_prg("CNROM")?;
                let cart = Mapper003CnRom::new(self.prg_rom, self.chr_rom, self.screen_mirroring);
                Ok(Box::new(cart))
            }
            id => Err(RomError::UnsupportedMapper(id)),
        }
    }

    // NROM-layout boards map 16 KB (mirrored) or 32 KB of PRG at $8000
    fn check_fixed_prg(&self, board: &str) -> Result<(), RomError> {
        if self.prg_rom.len() != PRG_ROM_PAGE_SIZE && self.prg_rom.len() != 2 * PRG_ROM_PAGE_SIZE {
            return Err(RomError::InvalidFormat(format!(
                "{} expects 16 KB or 32 KB of PRG-ROM, found {} bytes",
                board,
                self.prg_rom.len()
            )));
        }
        Ok(())
    }
}
