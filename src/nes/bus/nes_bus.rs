use log::debug;

use crate::nes::bus::CpuBusInterface;
use crate::nes::bus::consts::*;
use crate::nes::cartridge::Cartridge;
use crate::nes::ppu::PPU;
use crate::trace;

pub struct NesBus {
    cart: Box<dyn Cartridge>,

    pub cpu_ram: [u8; CPU_RAM_SIZE],
    pub ppu: PPU,

    /// APU and controller ports are not emulated; writes are latched here
    pub apu_io: [u8; APU_IO_SIZE],

    /// Page written to $4014, waiting for the driver to run the transfer
    pub oam_dma_page: Option<u8>,

    // Unmapped reads return the last byte seen on the data bus
    pub last_cpu_read: u8,
}

impl NesBus {
    pub fn new(cart: Box<dyn Cartridge>) -> NesBus {
        debug!("cartridge inserted ({:?} mirroring)", cart.mirroring());
        NesBus {
            cart,
            cpu_ram: [0; CPU_RAM_SIZE],
            ppu: PPU::new(),
            apu_io: [0; APU_IO_SIZE],
            oam_dma_page: None,
            last_cpu_read: 0,
        }
    }

    pub fn insert_cartridge(&mut self, cart: Box<dyn Cartridge>) {
        debug!("cartridge swapped ({:?} mirroring)", cart.mirroring());
        self.cart = cart;
        self.cpu_ram = [0; CPU_RAM_SIZE];
        self.reset_components();
    }

    /// Console reset. RAM survives, everything else returns to power-on state
    pub fn reset_components(&mut self) {
        self.apu_io = [0; APU_IO_SIZE];
        self.oam_dma_page = None;
        self.last_cpu_read = 0;
        self.ppu.reset();
    }

    pub fn cartridge(&self) -> &dyn Cartridge {
        self.cart.as_ref()
    }

    /// Advance the PPU by `dots`. Returns true if a frame completed on the way
    pub fn tick_ppu(&mut self, dots: usize) -> bool {
        let mut frame_complete = false;
        for _ in 0..dots {
            frame_complete |= self.ppu.tick(self.cart.as_mut());
        }
        frame_complete
    }

    pub fn take_oam_dma_request(&mut self) -> Option<u8> {
        self.oam_dma_page.take()
    }

    /// DMA writes land in OAM through the same path as $2004
    pub fn write_oam_dma_byte(&mut self, value: u8) {
        self.ppu.write_to_oam_data(value);
    }
}

impl CpuBusInterface for NesBus {
    fn cpu_bus_read(&mut self, addr: u16) -> u8 {
        let value = match addr {
            CPU_RAM_START..=CPU_RAM_END => self.cpu_ram[(addr & CPU_RAM_MIRROR_MASK) as usize],
            PPU_REGISTERS_START..=PPU_REGISTERS_END => {
                self.ppu.read_register(addr, self.cart.as_mut())
            }
            APU_IO_START..=APU_IO_END => self.last_cpu_read,
            CART_START..=CART_END => self.cart.cpu_read(addr).unwrap_or(self.last_cpu_read),
        };
        self.last_cpu_read = value;
        value
    }

    fn cpu_bus_write(&mut self, addr: u16, value: u8) {
        match addr {
            CPU_RAM_START..=CPU_RAM_END => {
                self.cpu_ram[(addr & CPU_RAM_MIRROR_MASK) as usize] = value;
            }
            PPU_REGISTERS_START..=PPU_REGISTERS_END => {
                self.ppu.write_register(addr, value, self.cart.as_mut());
            }
            OAM_DMA => {
                trace!("OAM DMA requested from page ${:02X}", value);
                self.apu_io[(addr - APU_IO_START) as usize] = value;
                self.oam_dma_page = Some(value);
            }
            APU_IO_START..=APU_IO_END => {
                self.apu_io[(addr - APU_IO_START) as usize] = value;
            }
            CART_START..=CART_END => self.cart.cpu_write(addr, value),
        }
    }

    fn cpu_bus_peek(&self, addr: u16) -> u8 {
        match addr {
            CPU_RAM_START..=CPU_RAM_END => self.cpu_ram[(addr & CPU_RAM_MIRROR_MASK) as usize],
            PPU_REGISTERS_START..=PPU_REGISTERS_END => self.ppu.peek_register(addr),
            APU_IO_START..=APU_IO_END => self.last_cpu_read,
            CART_START..=CART_END => self.cart.cpu_peek(addr).unwrap_or(self.last_cpu_read),
        }
    }

    fn nmi_line(&self) -> bool {
        self.ppu.nmi_line()
    }

    fn irq_line(&self) -> bool {
        self.cart.irq_line()
    }
}

use crate::nes::tracer::Traceable;
impl Traceable for NesBus {
    fn trace_name(&self) -> &'static str {
        "BUS"
    }

    fn trace_state(&self) -> Option<String> {
        let ppu_trace = self.ppu.trace().unwrap_or("---".to_string());
        Some(format!(
            "open_bus={:02X} dma={:?} | {}",
            self.last_cpu_read, self.oam_dma_page, ppu_trace
        ))
    }
}
