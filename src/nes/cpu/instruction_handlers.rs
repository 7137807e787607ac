use log::debug;

use super::interrupts::{self, Interrupt};
use super::{CPU, CPU_STACK_BASE, CpuBusInterface, Flags, Operand};

// Every handler shares the `Opcode::exec` signature. The operand has already
// been resolved and PC points at the next instruction.
impl CPU {
    pub(super) fn lda(&mut self, bus: &mut dyn CpuBusInterface, op: Operand) {
        let param = bus.cpu_bus_read(op.addr);
        self.set_register_a(param);
    }

    pub(super) fn ldx(&mut self, bus: &mut dyn CpuBusInterface, op: Operand) {
        let param = bus.cpu_bus_read(op.addr);
        self.set_register_x(param);
    }

    pub(super) fn ldy(&mut self, bus: &mut dyn CpuBusInterface, op: Operand) {
        let param = bus.cpu_bus_read(op.addr);
        self.set_register_y(param);
    }

    pub(super) fn sta(&mut self, bus: &mut dyn CpuBusInterface, op: Operand) {
        bus.cpu_bus_write(op.addr, self.register_a);
    }

    pub(super) fn stx(&mut self, bus: &mut dyn CpuBusInterface, op: Operand) {
        bus.cpu_bus_write(op.addr, self.register_x);
    }

    pub(super) fn sty(&mut self, bus: &mut dyn CpuBusInterface, op: Operand) {
        bus.cpu_bus_write(op.addr, self.register_y);
    }

    pub(super) fn tax(&mut self, _bus: &mut dyn CpuBusInterface, _op: Operand) {
        self.set_register_x(self.register_a);
    }

    pub(super) fn tay(&mut self, _bus: &mut dyn CpuBusInterface, _op: Operand) {
        self.set_register_y(self.register_a);
    }

    pub(super) fn tsx(&mut self, _bus: &mut dyn CpuBusInterface, _op: Operand) {
        self.set_register_x(self.stack_pointer);
    }

    pub(super) fn txa(&mut self, _bus: &mut dyn CpuBusInterface, _op: Operand) {
        self.set_register_a(self.register_x);
    }

    pub(super) fn txs(&mut self, _bus: &mut dyn CpuBusInterface, _op: Operand) {
        self.stack_pointer = self.register_x;
    }

    pub(super) fn tya(&mut self, _bus: &mut dyn CpuBusInterface, _op: Operand) {
        self.set_register_a(self.register_y);
    }

    pub(super) fn cld(&mut self, _bus: &mut dyn CpuBusInterface, _op: Operand) {
        self.status.remove(Flags::DECIMAL_MODE);
    }

    pub(super) fn cli(&mut self, _bus: &mut dyn CpuBusInterface, _op: Operand) {
        self.status.remove(Flags::INTERRUPT_DISABLE);
    }

    pub(super) fn clv(&mut self, _bus: &mut dyn CpuBusInterface, _op: Operand) {
        self.status.remove(Flags::OVERFLOW);
    }

    pub(super) fn clc(&mut self, _bus: &mut dyn CpuBusInterface, _op: Operand) {
        self.status.remove(Flags::CARRY);
    }

    pub(super) fn sec(&mut self, _bus: &mut dyn CpuBusInterface, _op: Operand) {
        self.status.insert(Flags::CARRY);
    }

    pub(super) fn sei(&mut self, _bus: &mut dyn CpuBusInterface, _op: Operand) {
        self.status.insert(Flags::INTERRUPT_DISABLE);
    }

    // Decimal mode is latched but the 2A03 has no BCD adder
    pub(super) fn sed(&mut self, _bus: &mut dyn CpuBusInterface, _op: Operand) {
        self.status.insert(Flags::DECIMAL_MODE);
    }

    pub(super) fn inx(&mut self, _bus: &mut dyn CpuBusInterface, _op: Operand) {
        self.set_register_x(self.register_x.wrapping_add(1));
    }

    pub(super) fn iny(&mut self, _bus: &mut dyn CpuBusInterface, _op: Operand) {
        self.set_register_y(self.register_y.wrapping_add(1));
    }

    pub(super) fn dex(&mut self, _bus: &mut dyn CpuBusInterface, _op: Operand) {
        self.set_register_x(self.register_x.wrapping_sub(1));
    }

    pub(super) fn dey(&mut self, _bus: &mut dyn CpuBusInterface, _op: Operand) {
        self.set_register_y(self.register_y.wrapping_sub(1));
    }

    pub(super) fn pha(&mut self, bus: &mut dyn CpuBusInterface, _op: Operand) {
        self.stack_push(bus, self.register_a)
    }

    pub(super) fn pla(&mut self, bus: &mut dyn CpuBusInterface, _op: Operand) {
        let value = self.stack_pop(bus);
        self.set_register_a(value);
    }

    pub(super) fn php(&mut self, bus: &mut dyn CpuBusInterface, _op: Operand) {
        // https://www.nesdev.org/wiki/Status_flags
        // B is pushed as 1, but not affected on the CPU
        let mut status_copy = self.status;
        status_copy.insert(Flags::BREAK | Flags::BREAK2);
        self.stack_push(bus, status_copy.bits())
    }

    pub(super) fn plp(&mut self, bus: &mut dyn CpuBusInterface, _op: Operand) {
        self.status = Flags::from_bits_truncate(self.stack_pop(bus));
        self.status.remove(Flags::BREAK); // This flag is disabled when fetching
        self.status.insert(Flags::BREAK2); // This flag is always 1 on the CPU
    }

    pub(super) fn asl_accumulator(&mut self, _bus: &mut dyn CpuBusInterface, _op: Operand) {
        self.register_a = self.shift_left(self.register_a);
    }

    pub(super) fn asl(&mut self, bus: &mut dyn CpuBusInterface, op: Operand) {
        self.read_modify_write(bus, op, CPU::shift_left);
    }

    pub(super) fn lsr_accumulator(&mut self, _bus: &mut dyn CpuBusInterface, _op: Operand) {
        self.register_a = self.shift_right(self.register_a);
    }

    pub(super) fn lsr(&mut self, bus: &mut dyn CpuBusInterface, op: Operand) {
        self.read_modify_write(bus, op, CPU::shift_right);
    }

    pub(super) fn rol_accumulator(&mut self, _bus: &mut dyn CpuBusInterface, _op: Operand) {
        self.register_a = self.rotate_left(self.register_a);
    }

    pub(super) fn rol(&mut self, bus: &mut dyn CpuBusInterface, op: Operand) {
        self.read_modify_write(bus, op, CPU::rotate_left);
    }

    pub(super) fn ror_accumulator(&mut self, _bus: &mut dyn CpuBusInterface, _op: Operand) {
        self.register_a = self.rotate_right(self.register_a);
    }

    pub(super) fn ror(&mut self, bus: &mut dyn CpuBusInterface, op: Operand) {
        self.read_modify_write(bus, op, CPU::rotate_right);
    }

    pub(super) fn inc(&mut self, bus: &mut dyn CpuBusInterface, op: Operand) {
        let value = self.read_modify_write(bus, op, |_, v| v.wrapping_add(1));
        self.update_zero_and_negative_flags(value);
    }

    pub(super) fn dec(&mut self, bus: &mut dyn CpuBusInterface, op: Operand) {
        let value = self.read_modify_write(bus, op, |_, v| v.wrapping_sub(1));
        self.update_zero_and_negative_flags(value);
    }

    pub(super) fn cmp(&mut self, bus: &mut dyn CpuBusInterface, op: Operand) {
        let value = bus.cpu_bus_read(op.addr);
        self.compare(self.register_a, value);
    }

    pub(super) fn cpx(&mut self, bus: &mut dyn CpuBusInterface, op: Operand) {
        let value = bus.cpu_bus_read(op.addr);
        self.compare(self.register_x, value);
    }

    pub(super) fn cpy(&mut self, bus: &mut dyn CpuBusInterface, op: Operand) {
        let value = bus.cpu_bus_read(op.addr);
        self.compare(self.register_y, value);
    }

    pub(super) fn adc(&mut self, bus: &mut dyn CpuBusInterface, op: Operand) {
        let value = bus.cpu_bus_read(op.addr);
        self.add_to_register_a(value);
    }

    pub(super) fn sbc(&mut self, bus: &mut dyn CpuBusInterface, op: Operand) {
        let value = bus.cpu_bus_read(op.addr);
        self.sub_from_register_a(value);
    }

    pub(super) fn and(&mut self, bus: &mut dyn CpuBusInterface, op: Operand) {
        let value = bus.cpu_bus_read(op.addr);
        self.set_register_a(self.register_a & value);
    }

    pub(super) fn eor(&mut self, bus: &mut dyn CpuBusInterface, op: Operand) {
        let value = bus.cpu_bus_read(op.addr);
        self.set_register_a(self.register_a ^ value);
    }

    pub(super) fn ora(&mut self, bus: &mut dyn CpuBusInterface, op: Operand) {
        let value = bus.cpu_bus_read(op.addr);
        self.set_register_a(self.register_a | value);
    }

    pub(super) fn bit(&mut self, bus: &mut dyn CpuBusInterface, op: Operand) {
        let value = bus.cpu_bus_read(op.addr);
        self.status.set(Flags::ZERO, value & self.register_a == 0);

        // These flags come straight from the fetched data
        self.status.set(Flags::NEGATIVE, value & (1 << 7) != 0);
        self.status.set(Flags::OVERFLOW, value & (1 << 6) != 0);
    }

    pub(super) fn jmp(&mut self, _bus: &mut dyn CpuBusInterface, op: Operand) {
        self.program_counter = op.addr;
    }

    pub(super) fn jsr(&mut self, bus: &mut dyn CpuBusInterface, op: Operand) {
        // The pushed address is the last byte of the JSR itself
        let return_address = self.program_counter.wrapping_sub(1);
        self.stack_push_u16(bus, return_address);
        self.program_counter = op.addr;
    }

    pub(super) fn rts(&mut self, bus: &mut dyn CpuBusInterface, _op: Operand) {
        let return_address_minus_one = self.stack_pop_u16(bus);
        self.program_counter = return_address_minus_one.wrapping_add(1);
    }

    pub(super) fn rti(&mut self, bus: &mut dyn CpuBusInterface, _op: Operand) {
        // Unlike RTS, the return address on the stack is the actual address
        let mut restored_flags = Flags::from_bits_truncate(self.stack_pop(bus));
        restored_flags.remove(Flags::BREAK);
        restored_flags.insert(Flags::BREAK2);
        self.status = restored_flags;
        self.program_counter = self.stack_pop_u16(bus);
    }

    pub(super) fn brk(&mut self, bus: &mut dyn CpuBusInterface, _op: Operand) {
        // BRK skips a padding byte, so the return address is opcode + 2
        self.program_counter = self.program_counter.wrapping_add(1);
        self.handle_interrupt(bus, interrupts::BRK);
    }

    pub(super) fn bne(&mut self, _bus: &mut dyn CpuBusInterface, op: Operand) {
        self.branch(op, !self.status.contains(Flags::ZERO))
    }

    pub(super) fn beq(&mut self, _bus: &mut dyn CpuBusInterface, op: Operand) {
        self.branch(op, self.status.contains(Flags::ZERO))
    }

    pub(super) fn bvs(&mut self, _bus: &mut dyn CpuBusInterface, op: Operand) {
        self.branch(op, self.status.contains(Flags::OVERFLOW))
    }

    pub(super) fn bvc(&mut self, _bus: &mut dyn CpuBusInterface, op: Operand) {
        self.branch(op, !self.status.contains(Flags::OVERFLOW))
    }

    pub(super) fn bmi(&mut self, _bus: &mut dyn CpuBusInterface, op: Operand) {
        self.branch(op, self.status.contains(Flags::NEGATIVE))
    }

    pub(super) fn bpl(&mut self, _bus: &mut dyn CpuBusInterface, op: Operand) {
        self.branch(op, !self.status.contains(Flags::NEGATIVE))
    }

    pub(super) fn bcs(&mut self, _bus: &mut dyn CpuBusInterface, op: Operand) {
        self.branch(op, self.status.contains(Flags::CARRY))
    }

    pub(super) fn bcc(&mut self, _bus: &mut dyn CpuBusInterface, op: Operand) {
        self.branch(op, !self.status.contains(Flags::CARRY))
    }

    pub(super) fn nop(&mut self, _bus: &mut dyn CpuBusInterface, _op: Operand) {}

    /// Multi-byte NOPs still perform their operand read
    pub(super) fn nop_read(&mut self, bus: &mut dyn CpuBusInterface, op: Operand) {
        let _ = bus.cpu_bus_read(op.addr);
    }
}

/////////////////////////
// Illegal Opcodes
// https://www.nesdev.org/wiki/Programming_with_unofficial_opcodes
/////////////////////////
impl CPU {
    pub(super) fn lax(&mut self, bus: &mut dyn CpuBusInterface, op: Operand) {
        let value = bus.cpu_bus_read(op.addr);
        self.set_register_a(value);
        self.register_x = value;
    }

    pub(super) fn sax(&mut self, bus: &mut dyn CpuBusInterface, op: Operand) {
        // A and X are put on the bus at the same time, ANDing them
        bus.cpu_bus_write(op.addr, self.register_a & self.register_x);
    }

    pub(super) fn dcp(&mut self, bus: &mut dyn CpuBusInterface, op: Operand) {
        let value = self.read_modify_write(bus, op, |_, v| v.wrapping_sub(1));
        self.compare(self.register_a, value);
    }

    pub(super) fn isc(&mut self, bus: &mut dyn CpuBusInterface, op: Operand) {
        let value = self.read_modify_write(bus, op, |_, v| v.wrapping_add(1));
        self.sub_from_register_a(value);
    }

    pub(super) fn slo(&mut self, bus: &mut dyn CpuBusInterface, op: Operand) {
        let shifted = self.read_modify_write(bus, op, CPU::shift_left);
        self.set_register_a(self.register_a | shifted);
    }

    pub(super) fn rla(&mut self, bus: &mut dyn CpuBusInterface, op: Operand) {
        let rotated = self.read_modify_write(bus, op, CPU::rotate_left);
        self.set_register_a(self.register_a & rotated);
    }

    pub(super) fn sre(&mut self, bus: &mut dyn CpuBusInterface, op: Operand) {
        let shifted = self.read_modify_write(bus, op, CPU::shift_right);
        self.set_register_a(self.register_a ^ shifted);
    }

    pub(super) fn rra(&mut self, bus: &mut dyn CpuBusInterface, op: Operand) {
        let rotated = self.read_modify_write(bus, op, CPU::rotate_right);
        self.add_to_register_a(rotated);
    }

    pub(super) fn anc(&mut self, bus: &mut dyn CpuBusInterface, op: Operand) {
        let value = bus.cpu_bus_read(op.addr);
        self.set_register_a(self.register_a & value);
        self.status.set(Flags::CARRY, self.register_a & 0b1000_0000 != 0);
    }

    pub(super) fn alr(&mut self, bus: &mut dyn CpuBusInterface, op: Operand) {
        let value = bus.cpu_bus_read(op.addr);
        self.register_a = self.shift_right(self.register_a & value);
    }

    pub(super) fn arr(&mut self, bus: &mut dyn CpuBusInterface, op: Operand) {
        // AND + ROR, with C and V taken from bits 6 and 5 of the result
        let value = bus.cpu_bus_read(op.addr);
        let carry = self.status.contains(Flags::CARRY) as u8;
        let result = ((self.register_a & value) >> 1) | (carry << 7);
        self.set_register_a(result);

        let bit6 = result & 0b0100_0000 != 0;
        let bit5 = result & 0b0010_0000 != 0;
        self.status.set(Flags::CARRY, bit6);
        self.status.set(Flags::OVERFLOW, bit6 ^ bit5);
    }

    pub(super) fn sbx(&mut self, bus: &mut dyn CpuBusInterface, op: Operand) {
        let value = bus.cpu_bus_read(op.addr);
        let and_result = self.register_a & self.register_x;
        self.status.set(Flags::CARRY, and_result >= value);
        self.set_register_x(and_result.wrapping_sub(value));
    }

    pub(super) fn usbc(&mut self, bus: &mut dyn CpuBusInterface, op: Operand) {
        self.sbc(bus, op);
    }

    pub(super) fn las(&mut self, bus: &mut dyn CpuBusInterface, op: Operand) {
        let result = bus.cpu_bus_read(op.addr) & self.stack_pointer;
        self.set_register_a(result);
        self.register_x = result;
        self.stack_pointer = result;
    }

    // ANE and LXA depend on analog behaviour; $EE is the usual magic constant
    pub(super) fn ane(&mut self, bus: &mut dyn CpuBusInterface, op: Operand) {
        let value = bus.cpu_bus_read(op.addr);
        self.set_register_a((self.register_a | UNSTABLE_MAGIC) & self.register_x & value);
    }

    pub(super) fn lxa(&mut self, bus: &mut dyn CpuBusInterface, op: Operand) {
        let value = bus.cpu_bus_read(op.addr);
        let result = (self.register_a | UNSTABLE_MAGIC) & value;
        self.set_register_a(result);
        self.register_x = result;
    }

    pub(super) fn sha(&mut self, bus: &mut dyn CpuBusInterface, op: Operand) {
        self.store_and_high_byte(bus, op, self.register_a & self.register_x);
    }

    pub(super) fn shx(&mut self, bus: &mut dyn CpuBusInterface, op: Operand) {
        self.store_and_high_byte(bus, op, self.register_x);
    }

    pub(super) fn shy(&mut self, bus: &mut dyn CpuBusInterface, op: Operand) {
        self.store_and_high_byte(bus, op, self.register_y);
    }

    pub(super) fn tas(&mut self, bus: &mut dyn CpuBusInterface, op: Operand) {
        self.stack_pointer = self.register_a & self.register_x;
        self.store_and_high_byte(bus, op, self.stack_pointer);
    }

    pub(super) fn jam(&mut self, _bus: &mut dyn CpuBusInterface, _op: Operand) {
        // Park PC on the JAM opcode itself
        self.program_counter = self.program_counter.wrapping_sub(1);
        self.jammed = true;
        debug!("CPU jammed at ${:04X}", self.program_counter);
    }
}

const UNSTABLE_MAGIC: u8 = 0xEE;

///////////////////////////////////////////////////////////////////////////////
////// Utility functions
///////////////////////////////////////////////////////////////////////////////
impl CPU {
    fn read_modify_write(
        &mut self,
        bus: &mut dyn CpuBusInterface,
        op: Operand,
        modify: impl FnOnce(&mut CPU, u8) -> u8,
    ) -> u8 {
        let value = bus.cpu_bus_read(op.addr);
        let result = modify(self, value);
        bus.cpu_bus_write(op.addr, result);
        result
    }

    /// SHA/SHX/SHY/TAS: value & (H + 1), where H is the high byte of the
    /// base address. A page cross replaces the target high byte with the result
    fn store_and_high_byte(&mut self, bus: &mut dyn CpuBusInterface, op: Operand, value: u8) {
        let high_plus_one = ((op.base >> 8) as u8).wrapping_add(1);
        let result = value & high_plus_one;
        let addr = if op.page_crossed {
            ((result as u16) << 8) | (op.addr & 0x00FF)
        } else {
            op.addr
        };
        bus.cpu_bus_write(addr, result);
    }

    fn shift_left(&mut self, value: u8) -> u8 {
        let result = value << 1;
        self.status.set(Flags::CARRY, value & 0x80 != 0);
        self.update_zero_and_negative_flags(result);
        result
    }

    fn shift_right(&mut self, value: u8) -> u8 {
        let result = value >> 1;
        self.status.set(Flags::CARRY, value & 1 != 0);
        self.update_zero_and_negative_flags(result);
        result
    }

    fn rotate_left(&mut self, value: u8) -> u8 {
        let (result, new_carry) =
            Self::rotate_value_left(value, self.status.contains(Flags::CARRY));
        self.status.set(Flags::CARRY, new_carry);
        self.update_zero_and_negative_flags(result);
        result
    }

    fn rotate_right(&mut self, value: u8) -> u8 {
        let (result, new_carry) =
            Self::rotate_value_right(value, self.status.contains(Flags::CARRY));
        self.status.set(Flags::CARRY, new_carry);
        self.update_zero_and_negative_flags(result);
        result
    }

    pub(super) fn rotate_value_left(value: u8, current_carry: bool) -> (u8, bool) {
        let new_carry = value & 0b1000_0000 != 0;
        let shifted = (value << 1) | current_carry as u8;
        (shifted, new_carry)
    }

    pub(super) fn rotate_value_right(value: u8, current_carry: bool) -> (u8, bool) {
        let new_carry = value & 0b0000_0001 != 0;
        let shifted = (value >> 1) | ((current_carry as u8) << 7);
        (shifted, new_carry)
    }

    pub(super) fn set_register_a(&mut self, value: u8) {
        self.register_a = value;
        self.update_zero_and_negative_flags(value);
    }

    pub(super) fn set_register_x(&mut self, value: u8) {
        self.register_x = value;
        self.update_zero_and_negative_flags(value);
    }

    pub(super) fn set_register_y(&mut self, value: u8) {
        self.register_y = value;
        self.update_zero_and_negative_flags(value);
    }

    // The stack lives in page 1 and wraps inside it
    fn stack_push(&mut self, bus: &mut dyn CpuBusInterface, value: u8) {
        bus.cpu_bus_write(CPU_STACK_BASE | self.stack_pointer as u16, value);
        self.stack_pointer = self.stack_pointer.wrapping_sub(1);
    }

    fn stack_push_u16(&mut self, bus: &mut dyn CpuBusInterface, value: u16) {
        self.stack_push(bus, (value >> 8) as u8);
        self.stack_push(bus, value as u8);
    }

    fn stack_pop(&mut self, bus: &mut dyn CpuBusInterface) -> u8 {
        self.stack_pointer = self.stack_pointer.wrapping_add(1);
        bus.cpu_bus_read(CPU_STACK_BASE | self.stack_pointer as u16)
    }

    fn stack_pop_u16(&mut self, bus: &mut dyn CpuBusInterface) -> u16 {
        let lo = self.stack_pop(bus) as u16;
        let hi = self.stack_pop(bus) as u16;
        (hi << 8) | lo
    }

    fn update_zero_and_negative_flags(&mut self, result: u8) {
        self.status.set(Flags::ZERO, result == 0);
        self.status.set(Flags::NEGATIVE, result & 0b1000_0000 != 0);
    }

    fn add_to_register_a(&mut self, value: u8) {
        let curr_carry = self.status.contains(Flags::CARRY) as u16;
        let sum = self.register_a as u16 + value as u16 + curr_carry;
        let result = sum as u8;

        // OVERFLOW when both inputs share a sign that the result does not
        // See: https://forums.nesdev.org/viewtopic.php?t=6331
        let signed_overflow =
            ((self.register_a ^ result) & 0x80 != 0) && ((self.register_a ^ value) & 0x80 == 0);

        self.status.set(Flags::OVERFLOW, signed_overflow);
        self.status.set(Flags::CARRY, sum > 0xFF);
        self.set_register_a(result);
    }

    fn sub_from_register_a(&mut self, data: u8) {
        self.add_to_register_a(!data);
    }

    fn compare(&mut self, register: u8, value: u8) {
        self.status.set(Flags::CARRY, register >= value);
        self.update_zero_and_negative_flags(register.wrapping_sub(value));
    }

    fn branch(&mut self, op: Operand, condition: bool) {
        if condition {
            self.program_counter = op.addr;
            self.add_extra_cycles(1 + op.page_crossed as u8);
        }
    }

    /// Pushes PC and status, sets I and jumps through the vector.
    /// Cycle accounting is left to the caller
    pub(super) fn handle_interrupt(&mut self, bus: &mut dyn CpuBusInterface, interrupt: Interrupt) {
        self.stack_push_u16(bus, self.program_counter);
        self.stack_push(bus, interrupt.pushed_status(self.status));
        self.status.insert(Flags::INTERRUPT_DISABLE);
        self.program_counter = self.bus_read_u16(bus, interrupt.vector_addr);
    }
}
