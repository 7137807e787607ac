use log::debug;

use super::interrupts::{self, Interrupt};
use super::opcodes;
use super::{
    AccessType, AddressingMode, CPU, CPU_JAM_CYCLES, CPU_RESET_CYCLES, CPU_STACK_RESET,
    CPU_STATUS_RESET, CpuBusInterface, Flags, Operand,
};
use crate::nes::bus::consts::RESET_VECTOR;
use crate::{trace_cpu_event, trace_obj};

impl CPU {
    pub fn new() -> CPU {
        CPU {
            register_a: 0,
            register_x: 0,
            register_y: 0,
            stack_pointer: CPU_STACK_RESET,
            status: Flags::from_bits_truncate(CPU_STATUS_RESET),
            program_counter: 0,
            cycles: 0,
            jammed: false,
            nmi_previous_line: false,
            nmi_pending: false,
            extra_cycles: 0,
            last_opcode_desc: "",
        }
    }

    /// Power-on / reset sequence: PC from $FFFC, SP=$FD, P=$24, 7 cycles
    pub fn reset(&mut self, bus: &mut dyn CpuBusInterface) {
        self.register_a = 0;
        self.register_x = 0;
        self.register_y = 0;
        self.stack_pointer = CPU_STACK_RESET;
        self.status = Flags::from_bits_truncate(CPU_STATUS_RESET);
        self.program_counter = self.bus_read_u16(bus, RESET_VECTOR);
        self.cycles = CPU_RESET_CYCLES;
        self.jammed = false;
        self.nmi_previous_line = bus.nmi_line();
        self.nmi_pending = false;
        self.extra_cycles = 0;
        self.last_opcode_desc = "";
        debug!("CPU reset, PC=${:04X}", self.program_counter);
    }

    /// Run one instruction (or one interrupt entry). Returns the cycles it took
    pub fn step(&mut self, bus: &mut dyn CpuBusInterface) -> u8 {
        if self.jammed {
            self.cycles += CPU_JAM_CYCLES as u64;
            return CPU_JAM_CYCLES;
        }

        if let Some(interrupt) = self.poll_interrupts(bus) {
            return self.service_interrupt(bus, interrupt);
        }

        let code = self.consume_program_counter(bus);
        let opcode = opcodes::lookup(code);
        self.last_opcode_desc = opcode.name;
        self.extra_cycles = 0;

        let operand = self.resolve_operand(bus, opcode.mode);
        (opcode.exec)(self, bus, operand);

        let mut cycles = opcode.cycles + self.extra_cycles;
        if opcode.access_type == AccessType::Read
            && operand.page_crossed
            && matches!(
                opcode.mode,
                AddressingMode::AbsoluteX | AddressingMode::AbsoluteY | AddressingMode::IndirectY
            )
        {
            cycles += 1;
        }

        self.cycles += cycles as u64;
        trace_obj!(&*self);
        cycles
    }

    /// Step until a JAM opcode stops the CPU
    pub fn run(&mut self, bus: &mut dyn CpuBusInterface) {
        while !self.jammed {
            self.step(bus);
        }
    }

    fn poll_interrupts(&mut self, bus: &mut dyn CpuBusInterface) -> Option<Interrupt> {
        let nmi_line = bus.nmi_line();
        if nmi_line && !self.nmi_previous_line {
            self.nmi_pending = true;
        }
        self.nmi_previous_line = nmi_line;

        if self.nmi_pending {
            self.nmi_pending = false;
            return Some(interrupts::NMI);
        }
        if bus.irq_line() && !self.status.contains(Flags::INTERRUPT_DISABLE) {
            return Some(interrupts::IRQ);
        }
        None
    }

    fn service_interrupt(&mut self, bus: &mut dyn CpuBusInterface, interrupt: Interrupt) -> u8 {
        trace_cpu_event!(
            "{:?} taken at PC=${:04X}",
            interrupt.interrupt_type,
            self.program_counter
        );
        self.handle_interrupt(bus, interrupt);
        self.cycles += interrupt.cpu_cycles as u64;
        interrupt.cpu_cycles
    }

    pub(super) fn bus_read_u16(&self, bus: &mut dyn CpuBusInterface, addr: u16) -> u16 {
        let lo = bus.cpu_bus_read(addr) as u16;
        let hi = bus.cpu_bus_read(addr.wrapping_add(1)) as u16;
        (hi << 8) | lo
    }

    pub(super) fn consume_program_counter(&mut self, bus: &mut dyn CpuBusInterface) -> u8 {
        let byte = bus.cpu_bus_read(self.program_counter);
        self.program_counter = self.program_counter.wrapping_add(1);
        byte
    }

    fn consume_program_counter_u16(&mut self, bus: &mut dyn CpuBusInterface) -> u16 {
        let lo = self.consume_program_counter(bus) as u16;
        let hi = self.consume_program_counter(bus) as u16;
        (hi << 8) | lo
    }

    /// Reads the operand bytes and leaves PC on the next instruction
    fn resolve_operand(&mut self, bus: &mut dyn CpuBusInterface, mode: AddressingMode) -> Operand {
        let direct = |addr: u16| Operand {
            addr,
            base: addr,
            page_crossed: false,
        };
        let indexed = |base: u16, index: u8| {
            let addr = base.wrapping_add(index as u16);
            Operand {
                addr,
                base,
                page_crossed: Self::is_boundary_crossed(base, addr),
            }
        };

        match mode {
            AddressingMode::Implied | AddressingMode::Accumulator => Operand::default(),
            AddressingMode::Immediate => {
                let addr = self.program_counter;
                self.program_counter = self.program_counter.wrapping_add(1);
                direct(addr)
            }
            AddressingMode::ZeroPage => direct(self.consume_program_counter(bus) as u16),
            AddressingMode::ZeroPageX => {
                let base = self.consume_program_counter(bus);
                direct(base.wrapping_add(self.register_x) as u16)
            }
            AddressingMode::ZeroPageY => {
                let base = self.consume_program_counter(bus);
                direct(base.wrapping_add(self.register_y) as u16)
            }
            AddressingMode::Absolute => direct(self.consume_program_counter_u16(bus)),
            AddressingMode::AbsoluteX => {
                let base = self.consume_program_counter_u16(bus);
                indexed(base, self.register_x)
            }
            AddressingMode::AbsoluteY => {
                let base = self.consume_program_counter_u16(bus);
                indexed(base, self.register_y)
            }
            AddressingMode::Indirect => {
                /* NOTE:
                  The NMOS 6502 does not correctly fetch the target address if the indirect vector falls
                  on a page boundary (e.g. $xxFF where xx is any value from $00 to $FF). In this case it fetches
                  the LSB from $xxFF as expected but takes the MSB from $xx00.
                */
                let indirect_vec = self.consume_program_counter_u16(bus);
                let lo = bus.cpu_bus_read(indirect_vec) as u16;
                let hi_addr = (indirect_vec & 0xFF00) | (indirect_vec as u8).wrapping_add(1) as u16;
                let hi = bus.cpu_bus_read(hi_addr) as u16;
                direct((hi << 8) | lo)
            }
            AddressingMode::IndirectX => {
                let ptr = self.consume_program_counter(bus).wrapping_add(self.register_x); // Zero-page wrapping
                let lo = bus.cpu_bus_read(ptr as u16) as u16;
                let hi = bus.cpu_bus_read(ptr.wrapping_add(1) as u16) as u16;
                direct((hi << 8) | lo)
            }
            AddressingMode::IndirectY => {
                let ptr = self.consume_program_counter(bus);
                let lo = bus.cpu_bus_read(ptr as u16) as u16;
                let hi = bus.cpu_bus_read(ptr.wrapping_add(1) as u16) as u16;
                indexed((hi << 8) | lo, self.register_y)
            }
            AddressingMode::Relative => {
                // The offset is relative to the PC *after* the operand
                let offset = self.consume_program_counter(bus) as i8;
                let base = self.program_counter;
                let addr = base.wrapping_add_signed(offset as i16);
                Operand {
                    addr,
                    base,
                    page_crossed: Self::is_boundary_crossed(base, addr),
                }
            }
        }
    }

    pub(super) fn is_boundary_crossed(addr1: u16, addr2: u16) -> bool {
        addr1 & 0xFF00 != addr2 & 0xFF00
    }

    pub(super) fn add_extra_cycles(&mut self, cycles: u8) {
        self.extra_cycles += cycles;
    }
}
