#[cfg(test)]
mod test {
    use crate::nes::bus::CpuBusInterface;
    use crate::nes::bus::nes_bus::NesBus;
    use crate::nes::cartridge::rom::{Mirroring, Rom};
    use crate::nes::ppu::PPU;

    fn init_bus(mirroring: Mirroring) -> NesBus {
        let mut prg_rom = vec![0; 0x4000];
        prg_rom[0x0000] = 0xA9;
        prg_rom[0x3FFC] = 0x00; // reset vector -> $8000
        prg_rom[0x3FFD] = 0x80;
        let chr_rom = vec![0; 0x2000];
        let rom = Rom::new_custom(prg_rom, chr_rom, 0, mirroring);
        let cartridge = rom.into_cartridge().unwrap();
        NesBus::new(cartridge)
    }

    fn set_vram_addr(bus: &mut NesBus, addr: u16) {
        bus.cpu_bus_write(0x2006, (addr >> 8) as u8);
        bus.cpu_bus_write(0x2006, (addr & 0xFF) as u8);
    }

    #[test]
    fn test_ram_is_mirrored_every_2k() {
        let mut bus = init_bus(Mirroring::Vertical);
        bus.cpu_bus_write(0x0123, 0x42);
        for mirror in [0x0123, 0x0923, 0x1123, 0x1923] {
            assert_eq!(bus.cpu_bus_read(mirror), 0x42, "mirror ${:04X}", mirror);
        }
        bus.cpu_bus_write(0x1FFF, 0x99);
        assert_eq!(bus.cpu_ram[0x07FF], 0x99);
    }

    #[test]
    fn test_cpu_write_to_nametables_via_2006_2007() {
        let mut bus = init_bus(Mirroring::Vertical);

        // Test a handful of addresses within $2000-$2FFF
        let test_addresses = [0x2000, 0x2400, 0x27FF, 0x2C00, 0x2FFF];

        for &addr in &test_addresses {
            let value = (addr & 0xFF) as u8;
            set_vram_addr(&mut bus, addr);
            bus.cpu_bus_write(0x2007, value);

            let mirrored = PPU::mirror_vram_addr(addr, Mirroring::Vertical);
            let actual = bus.ppu.v_ram[mirrored];
            assert_eq!(
                actual, value,
                "VRAM write failed: CPU wrote {:02X} to ${:04X} (mirrored to ${:04X}) but found {:02X}",
                value, addr, mirrored, actual
            );
        }
    }

    #[test]
    fn test_ppu_registers_are_mirrored_every_8_bytes() {
        let mut bus = init_bus(Mirroring::Horizontal);

        // $3FFE/$3FFF alias $2006/$2007
        bus.cpu_bus_write(0x3FFE, 0x21);
        bus.cpu_bus_write(0x3FFE, 0x08);
        bus.cpu_bus_write(0x3FFF, 0x5A);

        set_vram_addr(&mut bus, 0x2108);
        let _ = bus.cpu_bus_read(0x2007); // buffered
        assert_eq!(bus.cpu_bus_read(0x200F), 0x5A);
    }

    #[test]
    fn test_status_read_clears_vblank_but_peek_does_not() {
        let mut bus = init_bus(Mirroring::Vertical);
        bus.ppu.status_register.set_vblank_started();

        assert_eq!(bus.cpu_bus_peek(0x2002) & 0x80, 0x80);
        assert_eq!(bus.cpu_bus_peek(0x2002) & 0x80, 0x80);

        assert_eq!(bus.cpu_bus_read(0x2002) & 0x80, 0x80);
        assert_eq!(bus.cpu_bus_read(0x2002) & 0x80, 0x00);
    }

    #[test]
    fn test_cartridge_space_reads_prg_rom() {
        let mut bus = init_bus(Mirroring::Vertical);
        assert_eq!(bus.cpu_bus_read(0x8000), 0xA9);
        // 16 KB image mirrored into $C000
        assert_eq!(bus.cpu_bus_read(0xC000), 0xA9);
        assert_eq!(bus.cpu_bus_read(0xFFFD), 0x80);
        assert_eq!(bus.cpu_bus_peek(0xFFFD), 0x80);
    }

    #[test]
    fn test_prg_ram_round_trip() {
        let mut bus = init_bus(Mirroring::Vertical);
        bus.cpu_bus_write(0x6000, 0x77);
        assert_eq!(bus.cpu_bus_read(0x6000), 0x77);
    }

    #[test]
    fn test_unmapped_reads_return_open_bus() {
        let mut bus = init_bus(Mirroring::Vertical);
        bus.cpu_bus_write(0x0010, 0x3C);
        let _ = bus.cpu_bus_read(0x0010);
        assert_eq!(bus.cpu_bus_read(0x4018), 0x3C);
        assert_eq!(bus.cpu_bus_read(0x4015), 0x3C);
        // Nothing lives at $5000 on NROM
        assert_eq!(bus.cpu_bus_read(0x5000), 0x3C);
        assert_eq!(bus.last_cpu_read, 0x3C);
    }

    #[test]
    fn test_apu_io_writes_are_latched() {
        let mut bus = init_bus(Mirroring::Vertical);
        bus.cpu_bus_write(0x4000, 0x30);
        bus.cpu_bus_write(0x4017, 0x40);
        assert_eq!(bus.apu_io[0x00], 0x30);
        assert_eq!(bus.apu_io[0x17], 0x40);
        assert_eq!(bus.oam_dma_page, None);
    }

    #[test]
    fn test_4014_write_requests_oam_dma() {
        let mut bus = init_bus(Mirroring::Vertical);
        bus.cpu_bus_write(0x4014, 0x02);
        assert_eq!(bus.take_oam_dma_request(), Some(0x02));
        assert_eq!(bus.take_oam_dma_request(), None);
    }

    #[test]
    fn test_oam_dma_bytes_go_through_oam_port() {
        let mut bus = init_bus(Mirroring::Vertical);
        bus.cpu_bus_write(0x2003, 0xFE);
        bus.write_oam_dma_byte(0x11);
        bus.write_oam_dma_byte(0x22);
        bus.write_oam_dma_byte(0x33);
        assert_eq!(bus.ppu.oam_data[0xFE], 0x11);
        assert_eq!(bus.ppu.oam_data[0xFF], 0x22);
        assert_eq!(bus.ppu.oam_data[0x00], 0x33);
    }

    #[test]
    fn test_nmi_line_follows_ppu() {
        let mut bus = init_bus(Mirroring::Vertical);
        bus.cpu_bus_write(0x2000, 0x80);
        assert!(!bus.nmi_line());

        // 241 full scanlines plus the two dots that reach (241, 1)
        let dots = 241 * 341 + 2;
        assert!(!bus.tick_ppu(dots));
        assert!(bus.nmi_line());

        let _ = bus.cpu_bus_read(0x2002);
        assert!(!bus.nmi_line());
        assert!(!bus.irq_line());
    }

    #[test]
    fn test_tick_ppu_reports_frame_completion() {
        let mut bus = init_bus(Mirroring::Vertical);
        assert!(!bus.tick_ppu(341 * 262 - 1));
        assert!(bus.tick_ppu(1));
        assert_eq!(bus.ppu.frame_count(), 1);
    }

    #[test]
    fn test_reset_components_keeps_ram() {
        let mut bus = init_bus(Mirroring::Vertical);
        bus.cpu_bus_write(0x0000, 0x12);
        bus.cpu_bus_write(0x4014, 0x03);
        bus.reset_components();
        assert_eq!(bus.cpu_ram[0], 0x12);
        assert_eq!(bus.oam_dma_page, None);
        assert_eq!(bus.ppu.scanline, 0);
    }
}
