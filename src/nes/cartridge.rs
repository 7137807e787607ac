use rom::Mirroring;

pub mod mapper000_nrom;
pub mod mapper002_ux_rom;
pub mod mapper003_cn_rom;
pub mod rom;

pub trait Cartridge {
    /// CPU read ($4020-$FFFF) without side effects.
    /// `None` means the board leaves the data bus floating
    fn cpu_peek(&self, addr: u16) -> Option<u8>;

    /// CPU read ($4020-$FFFF). Boards with read-triggered side effects override this
    fn cpu_read(&mut self, addr: u16) -> Option<u8> {
        self.cpu_peek(addr)
    }

    /// CPU write ($4020-$FFFF)
    fn cpu_write(&mut self, addr: u16, data: u8);

    /// PPU read ($0000-$1FFF)
    fn ppu_read(&mut self, addr: u16) -> u8;

    /// PPU write ($0000-$1FFF)
    fn ppu_write(&mut self, addr: u16, data: u8);

    /// Nametable mirroring mode
    fn mirroring(&self) -> Mirroring;

    /// Mapper IRQ output. None of the boards in this crate drive it
    fn irq_line(&self) -> bool {
        false
    }
}

/// CHR storage shared by the discrete-logic boards: ROM when the image ships
/// pattern data, otherwise 8 KB of writable RAM
#[derive(Debug, Clone)]
pub(crate) struct ChrMemory {
    data: Vec<u8>,
    is_ram: bool,
}

impl ChrMemory {
    pub(crate) fn new(chr_rom: Vec<u8>) -> Self {
        if chr_rom.is_empty() {
            Self {
                data: vec![0; rom::CHR_ROM_PAGE_SIZE],
                is_ram: true,
            }
        } else {
            Self {
                data: chr_rom,
                is_ram: false,
            }
        }
    }

    pub(crate) fn is_ram(&self) -> bool {
        self.is_ram
    }

    pub(crate) fn bank_count(&self) -> usize {
        (self.data.len() / rom::CHR_ROM_PAGE_SIZE).max(1)
    }

    /// Read within the 8 KB window selected by `bank`
    pub(crate) fn read(&self, bank: usize, addr: u16) -> u8 {
        let base = (bank % self.bank_count()) * rom::CHR_ROM_PAGE_SIZE;
        let index = (base + (addr as usize & 0x1FFF)) % self.data.len();
        self.data[index]
    }

    pub(crate) fn write(&mut self, addr: u16, data: u8) {
        if self.is_ram {
            let index = addr as usize & 0x1FFF;
            self.data[index] = data;
        } else {
            log::debug!("Ignored write to CHR-ROM at {addr:04X} = {data:02X}");
        }
    }
}
