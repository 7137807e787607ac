pub const CPU_RAM_SIZE: usize = 2048;
pub const CPU_RAM_START: u16 = 0x0000;
pub const CPU_RAM_END: u16 = 0x1FFF;
pub const CPU_RAM_MIRROR_MASK: u16 = 0x07FF;

pub const PPU_REGISTERS_START: u16 = 0x2000;
pub const PPU_REGISTERS_END: u16 = 0x3FFF;

pub const APU_IO_START: u16 = 0x4000;
pub const OAM_DMA: u16 = 0x4014;
pub const APU_IO_END: u16 = 0x401F;
pub const APU_IO_SIZE: usize = (APU_IO_END - APU_IO_START + 1) as usize;

pub const CART_START: u16 = 0x4020;
pub const CART_END: u16 = 0xFFFF;

pub const NMI_VECTOR: u16 = 0xFFFA;
pub const RESET_VECTOR: u16 = 0xFFFC;
pub const IRQ_VECTOR: u16 = 0xFFFE;
