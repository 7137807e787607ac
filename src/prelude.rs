//! Convenient imports for consumers of nes-cycle-core
//!
//! Pull in everything commonly needed in one line:
//! ```rust
//! use nes_cycle_core::prelude::*;
//! ```

// Main NES emulator API
pub use crate::nes::cartridge::rom::{Mirroring, Rom, RomError};
pub use crate::nes::ppu::frame::Frame;
pub use crate::nes::{NES, StepOutcome};

// Traits that users might need
pub use crate::nes::bus::{CpuBusInterface, PpuBusInterface};
pub use crate::nes::cartridge::Cartridge;
pub use crate::nes::tracer::Traceable;

// Constants
pub use crate::nes::ppu::consts::NES_SYSTEM_PALETTE;
pub use crate::nes::{CPU_HZ_NTSC, PPU_HZ};
