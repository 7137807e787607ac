use crate::trace_ppu_event;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NmiEvent {
    /// Scanline 241 dot 1
    VBlankSet,
    /// Pre-render scanline dot 1
    VBlankCleared,
    /// $2000 bit 7 went 0->1
    NmiEnableSet,
    /// $2000 bit 7 went 1->0
    NmiEnableCleared,
    /// $2002 read cleared the vblank flag
    StatusReadClearsVBlank,
}

/// PPU-side NMI output. The line is high while vblank and NMI-enable are both
/// set; the CPU latches the rising edge.
#[derive(Debug, Default, Clone)]
pub struct Nmi {
    enabled: bool,
    vblank: bool,
    line: bool,
}

impl Nmi {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    #[inline]
    pub fn line(&self) -> bool {
        self.line
    }

    #[inline]
    fn set_line(&mut self, _why: &'static str) {
        let high = self.enabled && self.vblank;
        if self.line != high {
            self.line = high;
            trace_ppu_event!(
                "[NMI LINE {}] why={} enabled={} vblank={}",
                if high { "HIGH" } else { "LOW" },
                _why,
                self.enabled,
                self.vblank
            );
        }
    }

    pub fn on_event(&mut self, event: NmiEvent) {
        match event {
            NmiEvent::VBlankSet => {
                self.vblank = true;
                self.set_line("vblank_entry");
            }
            NmiEvent::VBlankCleared => {
                self.vblank = false;
                self.set_line("vblank_exit");
            }
            NmiEvent::NmiEnableSet => {
                self.enabled = true;
                self.set_line("enable");
            }
            NmiEvent::NmiEnableCleared => {
                self.enabled = false;
                self.set_line("disable");
            }
            NmiEvent::StatusReadClearsVBlank => {
                self.vblank = false;
                self.set_line("status_read");
            }
        }
    }
}
