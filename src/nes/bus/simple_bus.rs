use crate::nes::bus::CpuBusInterface;

/// Flat 64 KB of RAM with hand-driven interrupt lines. Runs the CPU on its
/// own, without a PPU or cartridge
pub struct SimpleBus {
    pub memory: Box<[u8; 0x10000]>,
    pub nmi: bool,
    pub irq: bool,
}

impl Default for SimpleBus {
    fn default() -> Self {
        Self::new(&[])
    }
}

impl SimpleBus {
    /// Program bytes are placed from $0000
    pub fn new(program: &[u8]) -> SimpleBus {
        let mut bus = SimpleBus {
            memory: Box::new([0; 0x10000]),
            nmi: false,
            irq: false,
        };
        bus.load(0x0000, program);
        bus
    }

    pub fn load(&mut self, start: u16, bytes: &[u8]) {
        for (i, &byte) in bytes.iter().enumerate() {
            let addr = start.wrapping_add(i as u16);
            self.memory[addr as usize] = byte;
        }
    }

    pub fn store_byte(&mut self, addr: u16, value: u8) {
        self.memory[addr as usize] = value;
    }

    pub fn store_u16(&mut self, addr: u16, value: u16) {
        self.store_byte(addr, value as u8);
        self.store_byte(addr.wrapping_add(1), (value >> 8) as u8);
    }

    pub fn read_byte(&self, addr: u16) -> u8 {
        self.memory[addr as usize]
    }

    pub fn set_nmi_line(&mut self, level: bool) {
        self.nmi = level;
    }

    pub fn set_irq_line(&mut self, level: bool) {
        self.irq = level;
    }
}

impl CpuBusInterface for SimpleBus {
    fn cpu_bus_read(&mut self, addr: u16) -> u8 {
        self.memory[addr as usize]
    }
    fn cpu_bus_write(&mut self, addr: u16, value: u8) {
        self.memory[addr as usize] = value;
    }
    fn cpu_bus_peek(&self, addr: u16) -> u8 {
        self.memory[addr as usize]
    }
    fn nmi_line(&self) -> bool {
        self.nmi
    }
    fn irq_line(&self) -> bool {
        self.irq
    }
}
