pub const DOTS: usize = 341;
pub const SCAN_LINES: usize = 262;
pub const PRERENDER_SCANLINE: usize = 261;
pub const VBLANK_SCANLINE: usize = 241;

const MAX_OPS_PER_DOT: usize = 8;

#[cfg(not(feature = "runtime-ppu-schedule"))]
static PPU_SCHEDULE: [[DotOperations; DOTS]; SCAN_LINES] = build_schedule();

#[cfg(feature = "runtime-ppu-schedule")]
use std::sync::OnceLock;
#[cfg(feature = "runtime-ppu-schedule")]
static PPU_SCHEDULE: OnceLock<[[DotOperations; DOTS]; SCAN_LINES]> = OnceLock::new();

#[inline(always)]
pub fn ppu_schedule() -> &'static [[DotOperations; DOTS]; SCAN_LINES] {
    #[cfg(feature = "runtime-ppu-schedule")]
    {
        PPU_SCHEDULE.get_or_init(build_schedule)
    }
    #[cfg(not(feature = "runtime-ppu-schedule"))]
    {
        &PPU_SCHEDULE
    }
}

/// Operations that only run while background or sprite rendering is enabled
pub const RENDER_OPS: u32 = bit(PpuOperation::ShiftRegisters)
    | bit(PpuOperation::ShiftSprites)
    | bit(PpuOperation::FetchNameTable)
    | bit(PpuOperation::FetchAttribute)
    | bit(PpuOperation::FetchTileLow)
    | bit(PpuOperation::FetchTileHigh)
    | bit(PpuOperation::LoadBackgroundRegisters)
    | bit(PpuOperation::IncCoarseX)
    | bit(PpuOperation::IncFineY)
    | bit(PpuOperation::CopyHorizV)
    | bit(PpuOperation::CopyVertV)
    | bit(PpuOperation::ClearSecondaryOam)
    | bit(PpuOperation::EvaluateSprites)
    | bit(PpuOperation::FillSpriteRegister);

pub const fn bit(op: PpuOperation) -> u32 {
    1u32 << (op as u8)
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum PpuOperation {
    RenderPixel,
    ShiftRegisters,
    ShiftSprites,

    FetchNameTable,
    FetchAttribute,
    FetchTileLow,
    FetchTileHigh,
    LoadBackgroundRegisters,

    IncCoarseX,
    IncFineY,
    CopyHorizV,
    CopyVertV,

    ClearSecondaryOam,
    EvaluateSprites,
    FillSpriteRegister,

    SetVBlank,
    ClearFlags,

    None,
}

impl PpuOperation {
    #[inline(always)]
    pub fn needs_rendering(self) -> bool {
        RENDER_OPS & bit(self) != 0
    }
}

#[derive(Debug, Copy, Clone)]
pub struct DotOperations {
    pub len: u8,
    pub ops: [PpuOperation; MAX_OPS_PER_DOT],
}

impl DotOperations {
    pub const fn new() -> Self {
        Self {
            len: 0,
            ops: [PpuOperation::None; MAX_OPS_PER_DOT],
        }
    }

    pub const fn push(mut self, op: PpuOperation) -> Self {
        assert!((self.len as usize) < MAX_OPS_PER_DOT);
        self.ops[self.len as usize] = op;
        self.len += 1;
        self
    }

    #[inline(always)]
    pub fn as_slice(&self) -> &[PpuOperation] {
        &self.ops[..self.len as usize]
    }
}

impl Default for DotOperations {
    fn default() -> Self {
        Self::new()
    }
}

const fn build_schedule() -> [[DotOperations; DOTS]; SCAN_LINES] {
    let mut table = [[DotOperations::new(); DOTS]; SCAN_LINES];
    let mut scanline = 0;
    while scanline < SCAN_LINES {
        let mut dot = 0;
        while dot < DOTS {
            table[scanline][dot] = schedule_for(scanline, dot);
            dot += 1;
        }
        scanline += 1;
    }
    table
}

/// Operations for one scanline/dot, in execution order:
/// output first, then shifters, then fetches and loopy updates
const fn schedule_for(scanline: usize, dot: usize) -> DotOperations {
    let mut ops = DotOperations::new();

    let visible = scanline < 240;
    let prerender = scanline == PRERENDER_SCANLINE;
    let rendering = visible || prerender;

    let visible_dot = dot >= 1 && dot <= 256;
    let prefetch_dot = dot >= 321 && dot <= 336;
    let bg_fetch_window = rendering && (visible_dot || prefetch_dot);

    if visible && visible_dot {
        ops = ops.push(PpuOperation::RenderPixel);
    }

    if bg_fetch_window {
        ops = ops.push(PpuOperation::ShiftRegisters);
    }

    if visible && visible_dot {
        ops = ops.push(PpuOperation::ShiftSprites);
    }

    if bg_fetch_window {
        match dot % 8 {
            1 => ops = ops.push(PpuOperation::FetchNameTable),
            3 => ops = ops.push(PpuOperation::FetchAttribute),
            5 => ops = ops.push(PpuOperation::FetchTileLow),
            7 => ops = ops.push(PpuOperation::FetchTileHigh),
            0 => {
                ops = ops.push(PpuOperation::LoadBackgroundRegisters);
                if (dot >= 8 && dot <= 256) || (dot >= 328 && dot <= 336) {
                    ops = ops.push(PpuOperation::IncCoarseX);
                }
            }
            _ => {}
        }
    }

    if rendering && dot == 256 {
        ops = ops.push(PpuOperation::IncFineY);
    }

    if rendering && dot == 257 {
        ops = ops.push(PpuOperation::CopyHorizV);
    }

    if prerender && dot >= 280 && dot <= 304 {
        ops = ops.push(PpuOperation::CopyVertV);
    }

    // Secondary OAM is cleared over dots 1-64 and evaluated over 65-256.
    // Both are collapsed onto their last dot
    if visible && dot == 64 {
        ops = ops.push(PpuOperation::ClearSecondaryOam);
    }

    if visible && dot == 256 {
        ops = ops.push(PpuOperation::EvaluateSprites);
    }

    // One sprite slot per 8 dots across 257-320
    if rendering && dot >= 257 && dot <= 320 && (dot - 257) % 8 == 0 {
        ops = ops.push(PpuOperation::FillSpriteRegister);
    }

    if scanline == VBLANK_SCANLINE && dot == 1 {
        ops = ops.push(PpuOperation::SetVBlank);
    }

    if prerender && dot == 1 {
        ops = ops.push(PpuOperation::ClearFlags);
    }

    ops
}
