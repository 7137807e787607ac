#[cfg(test)]
mod test {
    use crate::nes::bus::PpuBusInterface;
    use crate::nes::cartridge::rom::Mirroring;
    use crate::nes::ppu::PPU;
    use crate::nes::ppu::scheduler::{DOTS, SCAN_LINES};

    const FRAME_DOTS: usize = DOTS * SCAN_LINES;

    struct MockPpuBus {
        pub chr: [u8; 0x2000],
        pub mirroring: Mirroring,
    }

    impl MockPpuBus {
        fn new(mirroring: Mirroring) -> Self {
            Self {
                chr: [0; 0x2000],
                mirroring,
            }
        }
    }

    impl PpuBusInterface for MockPpuBus {
        fn ppu_bus_read(&mut self, addr: u16) -> u8 {
            self.chr[addr as usize % 0x2000]
        }
        fn ppu_bus_write(&mut self, addr: u16, value: u8) {
            self.chr[addr as usize % 0x2000] = value;
        }
        fn mirroring(&self) -> Mirroring {
            self.mirroring
        }
    }

    fn init_mock_ppu(mirroring: Mirroring) -> (PPU, MockPpuBus) {
        (PPU::new(), MockPpuBus::new(mirroring))
    }

    fn set_addr(ppu: &mut PPU, bus: &mut MockPpuBus, addr: u16) {
        ppu.write_register(0x2006, (addr >> 8) as u8, bus);
        ppu.write_register(0x2006, (addr & 0xFF) as u8, bus);
    }

    /// Ticks until a frame completes, returning how many dots it took
    fn run_frame(ppu: &mut PPU, bus: &mut MockPpuBus) -> usize {
        let mut dots = 1;
        while !ppu.tick(bus) {
            dots += 1;
            assert!(dots <= FRAME_DOTS, "frame never completed");
        }
        dots
    }

    /// Tile 1 of pattern table 0 is solid color 1
    fn solid_tile_bus() -> MockPpuBus {
        let mut bus = MockPpuBus::new(Mirroring::Horizontal);
        for row in 0..8 {
            bus.chr[16 + row] = 0xFF;
        }
        bus
    }

    #[test]
    fn test_write_palette_table() {
        let (mut ppu, mut bus) = init_mock_ppu(Mirroring::Horizontal);
        set_addr(&mut ppu, &mut bus, 0x3F00);
        ppu.write_register(0x2007, 0x34, &mut bus);
        assert_eq!(ppu.palette_table[0], 0x34);
    }

    #[test]
    fn test_write_palette_table_mirrored() {
        let (mut ppu, mut bus) = init_mock_ppu(Mirroring::Vertical);
        for (mirror, base) in [(0x3F10, 0), (0x3F14, 4), (0x3F18, 8), (0x3F1C, 12)] {
            set_addr(&mut ppu, &mut bus, mirror);
            ppu.write_register(0x2007, 0x20 + base as u8, &mut bus);
            assert_eq!(ppu.palette_table[base], 0x20 + base as u8);
        }
        // $3F20-$3FFF repeat the 32 entries
        assert_eq!(PPU::mirror_palette_addr(0x3FE5), 0x05);
    }

    #[test]
    fn test_write_to_ctrl_sets_nametable_bits_in_t() {
        let (mut ppu, mut bus) = init_mock_ppu(Mirroring::Horizontal);
        ppu.write_register(0x2000, 0b0000_0010, &mut bus);
        assert_eq!(ppu.scroll_register.t & 0x0C00, 0x0800);
    }

    #[test]
    fn test_write_memory_via_registers() {
        let (mut ppu, mut bus) = init_mock_ppu(Mirroring::Horizontal);
        set_addr(&mut ppu, &mut bus, 0x2500);
        ppu.write_register(0x2007, 0x42, &mut bus);

        // Horizontal: $2400 aliases $2000
        assert_eq!(PPU::mirror_vram_addr(0x2500, Mirroring::Horizontal), 0x0100);
        assert_eq!(ppu.v_ram[0x0100], 0x42);
    }

    #[test]
    fn test_nametable_mirroring_modes() {
        let cases = [
            (Mirroring::Vertical, [0x000, 0x400, 0x000, 0x400]),
            (Mirroring::Horizontal, [0x000, 0x000, 0x400, 0x400]),
            (Mirroring::FourScreen, [0x000, 0x400, 0x800, 0xC00]),
            (Mirroring::Single0, [0x000, 0x000, 0x000, 0x000]),
            (Mirroring::Single1, [0x400, 0x400, 0x400, 0x400]),
        ];
        for (mirroring, expected) in cases {
            for (table, want) in expected.iter().enumerate() {
                let addr = 0x2000 + table as u16 * 0x400 + 0x15;
                assert_eq!(
                    PPU::mirror_vram_addr(addr, mirroring),
                    want + 0x15,
                    "{:?} table {}",
                    mirroring,
                    table
                );
                // $3000-$3EFF mirrors $2000-$2EFF
                assert_eq!(
                    PPU::mirror_vram_addr(addr + 0x1000, mirroring),
                    want + 0x15
                );
            }
        }
    }

    #[test]
    fn test_scroll_register_writes() {
        let (mut ppu, mut bus) = init_mock_ppu(Mirroring::Horizontal);
        ppu.write_register(0x2005, 0b0011_0101, &mut bus);
        assert!(ppu.scroll_register.w);
        assert_eq!(ppu.scroll_register.t & 0x1F, 6);
        assert_eq!(ppu.scroll_register.x, 0b101);

        ppu.write_register(0x2005, 0b1101_0111, &mut bus);
        assert!(!ppu.scroll_register.w);
        assert_eq!((ppu.scroll_register.t >> 5) & 0x1F, 0b11010);
        assert_eq!((ppu.scroll_register.t >> 12) & 0x07, 0b111);
    }

    #[test]
    fn test_ppudata_round_trip_is_buffered() {
        let (mut ppu, mut bus) = init_mock_ppu(Mirroring::Vertical);
        set_addr(&mut ppu, &mut bus, 0x2305);
        ppu.write_register(0x2007, 0x66, &mut bus);
        ppu.write_register(0x2007, 0x77, &mut bus);

        set_addr(&mut ppu, &mut bus, 0x2305);
        let _stale = ppu.read_register(0x2007, &mut bus);
        assert_eq!(ppu.read_register(0x2007, &mut bus), 0x66);
        assert_eq!(ppu.read_register(0x2007, &mut bus), 0x77);
    }

    #[test]
    fn test_ppudata_reads_chr_through_bus() {
        let (mut ppu, mut bus) = init_mock_ppu(Mirroring::Vertical);
        bus.chr[0x0123] = 0xAB;
        set_addr(&mut ppu, &mut bus, 0x0123);
        ppu.read_register(0x2007, &mut bus);
        assert_eq!(ppu.read_register(0x2007, &mut bus), 0xAB);

        set_addr(&mut ppu, &mut bus, 0x0010);
        ppu.write_register(0x2007, 0x5A, &mut bus);
        assert_eq!(bus.chr[0x0010], 0x5A);
    }

    #[test]
    fn test_palette_read_is_immediate_and_refills_buffer_from_nametable() {
        let (mut ppu, mut bus) = init_mock_ppu(Mirroring::Vertical);
        set_addr(&mut ppu, &mut bus, 0x2F01);
        ppu.write_register(0x2007, 0x99, &mut bus);
        set_addr(&mut ppu, &mut bus, 0x3F01);
        ppu.write_register(0x2007, 0x21, &mut bus);

        set_addr(&mut ppu, &mut bus, 0x3F01);
        assert_eq!(ppu.read_register(0x2007, &mut bus), 0x21);

        // Buffer now holds the nametable byte under the palette ($2F01)
        set_addr(&mut ppu, &mut bus, 0x2000);
        assert_eq!(ppu.read_register(0x2007, &mut bus), 0x99);
    }

    #[test]
    fn test_vram_increment_32() {
        let (mut ppu, mut bus) = init_mock_ppu(Mirroring::Horizontal);
        ppu.write_register(0x2000, 0b0000_0100, &mut bus);
        set_addr(&mut ppu, &mut bus, 0x2000);
        ppu.write_register(0x2007, 0x01, &mut bus);
        ppu.write_register(0x2007, 0x02, &mut bus);
        assert_eq!(ppu.v_ram[0x00], 0x01);
        assert_eq!(ppu.v_ram[0x20], 0x02);
        assert_eq!(ppu.scroll_register.get_addr(), 0x2040);
    }

    #[test]
    fn test_oam_ports() {
        let (mut ppu, mut bus) = init_mock_ppu(Mirroring::Horizontal);
        ppu.write_register(0x2003, 0x10, &mut bus);
        for value in [0x20, 0x01, 0xFF, 0x40] {
            ppu.write_register(0x2004, value, &mut bus);
        }
        assert_eq!(ppu.oam_addr, 0x14);
        assert_eq!(&ppu.oam_data[0x10..0x14], &[0x20, 0x01, 0xFF, 0x40]);

        // Reads don't increment; attribute bits 2-4 read back as 0
        ppu.write_register(0x2003, 0x12, &mut bus);
        assert_eq!(ppu.read_register(0x2004, &mut bus), 0xE3);
        assert_eq!(ppu.read_register(0x2004, &mut bus), 0xE3);
        assert_eq!(ppu.oam_addr, 0x12);
    }

    #[test]
    fn test_write_only_registers_read_io_latch() {
        let (mut ppu, mut bus) = init_mock_ppu(Mirroring::Horizontal);
        ppu.write_register(0x2001, 0x5C, &mut bus);
        assert_eq!(ppu.read_register(0x2000, &mut bus), 0x5C);
        assert_eq!(ppu.read_register(0x3FFD, &mut bus), 0x5C);

        // Status fills its low bits from the latch
        assert_eq!(ppu.read_register(0x2002, &mut bus) & 0x1F, 0x1C);
    }

    #[test]
    fn test_vblank_sets_at_scanline_241_dot_1() {
        let (mut ppu, mut bus) = init_mock_ppu(Mirroring::Horizontal);
        let dots_until_vblank = 241 * DOTS + 1;
        for _ in 0..dots_until_vblank {
            ppu.tick(&mut bus);
        }
        assert!(!ppu.status_register.vblank_active(), "set one dot early");
        assert_eq!((ppu.scanline, ppu.cycles), (241, 1));

        ppu.tick(&mut bus);
        assert!(ppu.status_register.vblank_active());
    }

    #[test]
    fn test_status_read_reports_and_clears_vblank() {
        let (mut ppu, mut bus) = init_mock_ppu(Mirroring::Horizontal);
        ppu.write_register(0x2000, 0x80, &mut bus);
        ppu.run_until_vblank(&mut bus);
        ppu.write_register(0x2005, 0x00, &mut bus);
        assert!(ppu.scroll_register.w);

        let first = ppu.read_register(0x2002, &mut bus);
        assert_eq!(first & 0x80, 0x80);
        assert!(!ppu.scroll_register.w);

        let second = ppu.read_register(0x2002, &mut bus);
        assert_eq!(second & 0x80, 0);
    }

    #[test]
    fn test_peek_has_no_side_effects() {
        let (mut ppu, mut bus) = init_mock_ppu(Mirroring::Horizontal);
        ppu.run_until_vblank(&mut bus);
        assert_eq!(ppu.peek_register(0x2002) & 0x80, 0x80);
        assert_eq!(ppu.peek_register(0x2002) & 0x80, 0x80);
        assert!(ppu.status_register.vblank_active());
    }

    #[test]
    fn test_nmi_line_follows_vblank_and_enable() {
        let (mut ppu, mut bus) = init_mock_ppu(Mirroring::Horizontal);
        ppu.write_register(0x2000, 0x80, &mut bus);
        ppu.run_until_vblank(&mut bus);
        assert!(ppu.nmi_line());

        ppu.read_register(0x2002, &mut bus);
        assert!(!ppu.nmi_line());
    }

    #[test]
    fn test_enabling_nmi_during_vblank_raises_line() {
        let (mut ppu, mut bus) = init_mock_ppu(Mirroring::Horizontal);
        ppu.run_until_vblank(&mut bus);
        assert!(!ppu.nmi_line());
        ppu.write_register(0x2000, 0x80, &mut bus);
        assert!(ppu.nmi_line());
    }

    #[test]
    fn test_prerender_clears_flags() {
        let (mut ppu, mut bus) = init_mock_ppu(Mirroring::Horizontal);
        ppu.run_until_vblank(&mut bus);
        ppu.status_register.set_sprite_zero_hit(true);
        ppu.status_register.set_sprite_overflow(true);

        while !(ppu.scanline == 261 && ppu.cycles == 2) {
            ppu.tick(&mut bus);
        }
        assert_eq!(ppu.status_register.bits(), 0);
    }

    #[test]
    fn test_frame_length_with_rendering_disabled() {
        let (mut ppu, mut bus) = init_mock_ppu(Mirroring::Horizontal);
        for _ in 0..3 {
            assert_eq!(run_frame(&mut ppu, &mut bus), FRAME_DOTS);
            assert_eq!((ppu.scanline, ppu.cycles), (0, 0));
        }
        assert_eq!(ppu.frame_count(), 3);
    }

    #[test]
    fn test_odd_frames_skip_a_dot_with_rendering_enabled() {
        let (mut ppu, mut bus) = init_mock_ppu(Mirroring::Horizontal);
        ppu.write_register(0x2001, 0x08, &mut bus);

        assert!(!ppu.is_odd_frame());
        assert_eq!(run_frame(&mut ppu, &mut bus), FRAME_DOTS);
        assert!(ppu.is_odd_frame());
        assert_eq!(run_frame(&mut ppu, &mut bus), FRAME_DOTS - 1);
        assert_eq!(run_frame(&mut ppu, &mut bus), FRAME_DOTS);
        assert_eq!(run_frame(&mut ppu, &mut bus), FRAME_DOTS - 1);
    }

    #[test]
    fn test_sprite_overflow_with_nine_sprites_on_a_line() {
        let (mut ppu, mut bus) = init_mock_ppu(Mirroring::Horizontal);
        ppu.oam_data = [0xFF; 256];
        for n in 0..9 {
            ppu.oam_data[n * 4] = 10;
        }
        ppu.write_register(0x2001, 0x10, &mut bus);

        while ppu.scanline < 11 {
            ppu.tick(&mut bus);
        }
        assert!(ppu.status_register.sprite_overflow());
    }

    #[test]
    fn test_eight_sprites_do_not_overflow() {
        let (mut ppu, _bus) = init_mock_ppu(Mirroring::Horizontal);
        ppu.oam_data = [0xFF; 256];
        for n in 0..8 {
            ppu.oam_data[n * 4] = 10;
        }
        ppu.scanline = 12;
        ppu.evaluate_sprites();
        assert!(!ppu.status_register.sprite_overflow());
        assert_eq!(ppu.next_sprite_count, 8);
        assert!(ppu.sprite_zero_next);
    }

    #[test]
    fn test_sprite_overflow_hardware_bug_reads_wrong_byte() {
        let (mut ppu, _bus) = init_mock_ppu(Mirroring::Horizontal);
        ppu.oam_data = [0xFF; 256];
        for n in 0..8 {
            ppu.oam_data[n * 4] = 10;
        }
        // Sprite 8 misses, so sprite 9 is checked at byte 1 (its tile
        // index), which happens to look like an in-range Y
        ppu.oam_data[8 * 4] = 200;
        ppu.oam_data[9 * 4] = 200;
        ppu.oam_data[9 * 4 + 1] = 10;

        ppu.scanline = 10;
        ppu.evaluate_sprites();
        assert!(ppu.status_register.sprite_overflow());
        assert_eq!(ppu.next_sprite_count, 8);
    }

    #[test]
    fn test_sprite_evaluation_uses_8x16_height() {
        let (mut ppu, mut bus) = init_mock_ppu(Mirroring::Horizontal);
        ppu.oam_data = [0xFF; 256];
        ppu.oam_data[4..8].copy_from_slice(&[20, 0x03, 0x00, 40]);

        ppu.scanline = 33;
        ppu.evaluate_sprites();
        assert_eq!(ppu.next_sprite_count, 0);

        ppu.write_register(0x2000, 0x20, &mut bus);
        ppu.evaluate_sprites();
        assert_eq!(ppu.next_sprite_count, 1);
        assert!(!ppu.sprite_zero_next);
        assert_eq!(&ppu.secondary_oam[0..4], &[20, 0x03, 0x00, 40]);
    }

    fn sprite_zero_scene(sprite_x: u8, mask: u8) -> (PPU, MockPpuBus) {
        let mut bus = solid_tile_bus();
        let mut ppu = PPU::new();
        for addr in 0..0x3C0 {
            ppu.v_ram[addr] = 1;
        }
        ppu.oam_data = [0xFF; 256];
        ppu.oam_data[0..4].copy_from_slice(&[30, 1, 0, sprite_x]);
        ppu.write_register(0x2001, mask, &mut bus);
        (ppu, bus)
    }

    #[test]
    fn test_sprite_zero_hit_on_overlap() {
        let (mut ppu, mut bus) = sprite_zero_scene(50, 0x1E);
        while !ppu.status_register.sprite_zero_hit() {
            ppu.tick(&mut bus);
            assert!(ppu.scanline < 240, "no sprite 0 hit");
        }
        // Sprite Y is top - 1; the first opaque pixel is x=50 on line 31
        assert_eq!((ppu.scanline, ppu.cycles), (31, 52));

        // Holds until the pre-render line
        while ppu.scanline != 261 {
            ppu.tick(&mut bus);
            assert!(ppu.status_register.sprite_zero_hit());
        }
        ppu.tick(&mut bus);
        ppu.tick(&mut bus);
        assert!(!ppu.status_register.sprite_zero_hit());
    }

    #[test]
    fn test_no_sprite_zero_hit_at_x_255() {
        let (mut ppu, mut bus) = sprite_zero_scene(255, 0x1E);
        run_frame(&mut ppu, &mut bus);
        assert!(!ppu.status_register.sprite_zero_hit());
    }

    #[test]
    fn test_no_sprite_zero_hit_inside_left_clip() {
        let (mut ppu, mut bus) = sprite_zero_scene(0, 0x18);
        run_frame(&mut ppu, &mut bus);
        assert!(!ppu.status_register.sprite_zero_hit());

        let (mut ppu, mut bus) = sprite_zero_scene(0, 0x1E);
        while ppu.scanline < 240 {
            ppu.tick(&mut bus);
        }
        assert!(ppu.status_register.sprite_zero_hit());
    }

    #[test]
    fn test_no_sprite_zero_hit_without_background() {
        let (mut ppu, mut bus) = sprite_zero_scene(50, 0x14);
        run_frame(&mut ppu, &mut bus);
        assert!(!ppu.status_register.sprite_zero_hit());
    }

    #[test]
    fn test_background_renders_palette_indices() {
        let mut bus = solid_tile_bus();
        let mut ppu = PPU::new();
        for addr in 0..0x3C0 {
            ppu.v_ram[addr] = 1;
        }
        set_addr(&mut ppu, &mut bus, 0x3F00);
        ppu.write_register(0x2007, 0x0F, &mut bus);
        ppu.write_register(0x2007, 0x16, &mut bus);
        set_addr(&mut ppu, &mut bus, 0x0000);
        ppu.write_register(0x2001, 0x0A, &mut bus);

        run_frame(&mut ppu, &mut bus);
        run_frame(&mut ppu, &mut bus);

        let frame = ppu.frame();
        assert_eq!(frame.pixel(0, 0), Some(0x16));
        assert_eq!(frame.pixel(100, 100), Some(0x16));
        assert_eq!(frame.pixel(255, 239), Some(0x16));
    }

    #[test]
    fn test_sprite_in_front_of_background_and_behind_when_flagged() {
        let mut bus = solid_tile_bus();
        // Tile 2 is solid color 2
        for row in 0..8 {
            bus.chr[32 + 8 + row] = 0xFF;
        }
        let mut ppu = PPU::new();
        for addr in 0..0x3C0 {
            ppu.v_ram[addr] = 1;
        }
        ppu.palette_table[1] = 0x11;
        ppu.palette_table[0x12] = 0x22;
        ppu.oam_data = [0xFF; 256];
        ppu.oam_data[0..4].copy_from_slice(&[50, 2, 0x00, 40]);
        ppu.oam_data[4..8].copy_from_slice(&[50, 2, 0x20, 100]);
        ppu.write_register(0x2001, 0x1E, &mut bus);

        run_frame(&mut ppu, &mut bus);
        run_frame(&mut ppu, &mut bus);

        let frame = ppu.frame();
        assert_eq!(frame.pixel(44, 55), Some(0x22));
        assert_eq!(frame.pixel(104, 55), Some(0x11));
        assert_eq!(frame.pixel(44, 50), Some(0x11));
    }

    #[test]
    fn test_lowest_oam_index_wins_sprite_overlap() {
        let mut bus = MockPpuBus::new(Mirroring::Horizontal);
        for row in 0..8 {
            bus.chr[32 + 8 + row] = 0xFF; // tile 2: solid color 2
            bus.chr[48 + row] = 0xF0; // tile 3: left half color 1
        }
        let mut ppu = PPU::new();
        ppu.palette_table[0x12] = 0x22;
        ppu.palette_table[0x15] = 0x25;
        ppu.palette_table[0x16] = 0x26;
        ppu.oam_data = [0xFF; 256];
        ppu.oam_data[0..4].copy_from_slice(&[50, 2, 0x00, 60]);
        ppu.oam_data[4..8].copy_from_slice(&[50, 2, 0x01, 64]);
        ppu.oam_data[8..12].copy_from_slice(&[100, 3, 0x01, 60]);
        ppu.oam_data[12..16].copy_from_slice(&[100, 2, 0x01, 60]);
        ppu.write_register(0x2001, 0x1E, &mut bus);

        run_frame(&mut ppu, &mut bus);
        run_frame(&mut ppu, &mut bus);

        let frame = ppu.frame();
        assert_eq!(frame.pixel(62, 55), Some(0x22));
        assert_eq!(frame.pixel(66, 55), Some(0x22));
        assert_eq!(frame.pixel(70, 55), Some(0x26));

        // A transparent pixel of the lower index lets the next sprite through
        assert_eq!(frame.pixel(61, 105), Some(0x25));
        assert_eq!(frame.pixel(65, 105), Some(0x26));
    }

    #[test]
    fn test_sprite_flips() {
        let mut bus = MockPpuBus::new(Mirroring::Horizontal);
        for row in 0..8 {
            bus.chr[48 + row] = 0xF0; // tile 3: left half only
        }
        bus.chr[64] = 0xFF; // tile 4: top row only
        let mut ppu = PPU::new();
        ppu.palette_table[0] = 0x0F;
        ppu.palette_table[0x11] = 0x2C;
        ppu.oam_data = [0xFF; 256];
        ppu.oam_data[0..4].copy_from_slice(&[50, 3, 0x00, 40]);
        ppu.oam_data[4..8].copy_from_slice(&[50, 3, 0x40, 100]);
        ppu.oam_data[8..12].copy_from_slice(&[50, 4, 0x00, 160]);
        ppu.oam_data[12..16].copy_from_slice(&[50, 4, 0x80, 200]);
        ppu.write_register(0x2001, 0x1E, &mut bus);

        run_frame(&mut ppu, &mut bus);
        run_frame(&mut ppu, &mut bus);

        let frame = ppu.frame();
        // horizontal flip
        assert_eq!(frame.pixel(41, 54), Some(0x2C));
        assert_eq!(frame.pixel(46, 54), Some(0x0F));
        assert_eq!(frame.pixel(101, 54), Some(0x0F));
        assert_eq!(frame.pixel(106, 54), Some(0x2C));
        // vertical flip
        assert_eq!(frame.pixel(163, 51), Some(0x2C));
        assert_eq!(frame.pixel(163, 58), Some(0x0F));
        assert_eq!(frame.pixel(203, 51), Some(0x0F));
        assert_eq!(frame.pixel(203, 58), Some(0x2C));
    }

    #[test]
    fn test_backdrop_when_rendering_disabled() {
        let (mut ppu, mut bus) = init_mock_ppu(Mirroring::Horizontal);
        set_addr(&mut ppu, &mut bus, 0x3F00);
        ppu.write_register(0x2007, 0x21, &mut bus);
        set_addr(&mut ppu, &mut bus, 0x0000);
        run_frame(&mut ppu, &mut bus);
        assert!(ppu.frame().indices().iter().all(|&p| p == 0x21));

        ppu.write_register(0x2001, 0x01, &mut bus);
        run_frame(&mut ppu, &mut bus);
        assert!(ppu.frame().indices().iter().all(|&p| p == 0x20));
    }

    #[test]
    fn test_backdrop_follows_v_inside_palette_space() {
        let (mut ppu, mut bus) = init_mock_ppu(Mirroring::Horizontal);
        ppu.palette_table[5] = 0x2A;
        set_addr(&mut ppu, &mut bus, 0x3F05);
        run_frame(&mut ppu, &mut bus);
        assert_eq!(ppu.frame().pixel(128, 120), Some(0x2A));
    }

    #[test]
    fn test_pattern_tile_decodes_bitplanes() {
        let (ppu, mut bus) = init_mock_ppu(Mirroring::Horizontal);
        bus.chr[0x1000 + 3 * 16] = 0b1000_0001;
        bus.chr[0x1000 + 3 * 16 + 8] = 0b1000_0010;

        let tile = ppu.pattern_tile(&mut bus, 1, 3);
        assert_eq!(tile[0], [3, 0, 0, 0, 0, 0, 2, 1]);
        assert_eq!(tile[1], [0; 8]);
    }

    #[test]
    fn test_pattern_table_frame_layout() {
        let (mut ppu, mut bus) = init_mock_ppu(Mirroring::Horizontal);
        ppu.palette_table[0] = 0x0F;
        ppu.palette_table[1 + 4] = 0x30;
        // Tile 17 sits at column 1, row 1
        bus.chr[17 * 16] = 0x80;

        let frame = ppu.pattern_table_frame(&mut bus, 0, 1);
        assert_eq!((frame.width(), frame.height()), (128, 128));
        assert_eq!(frame.pixel(8, 8), Some(0x30));
        assert_eq!(frame.pixel(9, 8), Some(0x0F));
    }

    #[test]
    fn test_reset_keeps_memory() {
        let (mut ppu, mut bus) = init_mock_ppu(Mirroring::Horizontal);
        ppu.v_ram[0x10] = 0x77;
        ppu.oam_data[3] = 0x44;
        ppu.write_register(0x2000, 0x80, &mut bus);
        ppu.tick(&mut bus);

        ppu.reset();
        assert_eq!((ppu.scanline, ppu.cycles), (0, 0));
        assert!(!ppu.ctrl_register.nmi_enabled());
        assert_eq!(ppu.v_ram[0x10], 0x77);
        assert_eq!(ppu.oam_data[3], 0x44);
    }
}
