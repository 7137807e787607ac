// NES core modules
pub mod nes;
pub mod prelude;

// Re-exports
pub use nes::NES;

pub use nes::cartridge::Cartridge;
pub use nes::cartridge::rom::{Mirroring, Rom, RomError};
