use super::opcodes::{self, Opcode};
use super::{AddressingMode, CPU, CpuBusInterface};

/// Disassembles the instruction at PC in nestest.log layout, e.g.
/// `C000  4C F5 C5  JMP $C5F5                       A:00 X:00 Y:00 P:24 SP:FD`.
/// Memory is only peeked, so tracing never disturbs PPU registers.
pub fn trace(cpu: &CPU, bus: &dyn CpuBusInterface) -> String {
    let begin = cpu.program_counter;
    let code = bus.cpu_bus_peek(begin);
    let opcode = opcodes::lookup(code);

    let hex_dump = (0..opcode.size as u16)
        .map(|i| format!("{:02X}", bus.cpu_bus_peek(begin.wrapping_add(i))))
        .collect::<Vec<String>>()
        .join(" ");

    let operand = format_operand(cpu, bus, opcode, begin);
    let asm_str = format!("{:04X}  {:8} {: >4} {}", begin, hex_dump, opcode.name, operand)
        .trim_end()
        .to_string();

    format!(
        "{:47} A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X}",
        asm_str,
        cpu.register_a,
        cpu.register_x,
        cpu.register_y,
        cpu.status.bits(),
        cpu.stack_pointer,
    )
}

fn peek_u16_zero_page(bus: &dyn CpuBusInterface, ptr: u8) -> u16 {
    let lo = bus.cpu_bus_peek(ptr as u16) as u16;
    let hi = bus.cpu_bus_peek(ptr.wrapping_add(1) as u16) as u16;
    (hi << 8) | lo
}

fn format_operand(cpu: &CPU, bus: &dyn CpuBusInterface, opcode: &Opcode, begin: u16) -> String {
    let byte = bus.cpu_bus_peek(begin.wrapping_add(1));
    let word = ((bus.cpu_bus_peek(begin.wrapping_add(2)) as u16) << 8) | byte as u16;
    let peek = |addr: u16| bus.cpu_bus_peek(addr);

    match opcode.mode {
        AddressingMode::Implied => String::new(),
        AddressingMode::Accumulator => "A".to_string(),
        AddressingMode::Immediate => format!("#${:02X}", byte),
        AddressingMode::ZeroPage => format!("${:02X} = {:02X}", byte, peek(byte as u16)),
        AddressingMode::ZeroPageX => {
            let addr = byte.wrapping_add(cpu.register_x);
            format!("${:02X},X @ {:02X} = {:02X}", byte, addr, peek(addr as u16))
        }
        AddressingMode::ZeroPageY => {
            let addr = byte.wrapping_add(cpu.register_y);
            format!("${:02X},Y @ {:02X} = {:02X}", byte, addr, peek(addr as u16))
        }
        // Control flow targets print without the memory annotation
        AddressingMode::Absolute if matches!(opcode.code, 0x4C | 0x20) => format!("${:04X}", word),
        AddressingMode::Absolute => format!("${:04X} = {:02X}", word, peek(word)),
        AddressingMode::AbsoluteX => {
            let addr = word.wrapping_add(cpu.register_x as u16);
            format!("${:04X},X @ {:04X} = {:02X}", word, addr, peek(addr))
        }
        AddressingMode::AbsoluteY => {
            let addr = word.wrapping_add(cpu.register_y as u16);
            format!("${:04X},Y @ {:04X} = {:02X}", word, addr, peek(addr))
        }
        AddressingMode::Indirect => {
            let hi_addr = (word & 0xFF00) | (word as u8).wrapping_add(1) as u16;
            let target = ((peek(hi_addr) as u16) << 8) | peek(word) as u16;
            format!("(${:04X}) = {:04X}", word, target)
        }
        AddressingMode::IndirectX => {
            let ptr = byte.wrapping_add(cpu.register_x);
            let addr = peek_u16_zero_page(bus, ptr);
            format!("(${:02X},X) @ {:02X} = {:04X} = {:02X}", byte, ptr, addr, peek(addr))
        }
        AddressingMode::IndirectY => {
            let base = peek_u16_zero_page(bus, byte);
            let addr = base.wrapping_add(cpu.register_y as u16);
            format!("(${:02X}),Y = {:04X} @ {:04X} = {:02X}", byte, base, addr, peek(addr))
        }
        AddressingMode::Relative => {
            let target = begin.wrapping_add(2).wrapping_add_signed(byte as i8 as i16);
            format!("${:04X}", target)
        }
    }
}
