use super::addressing::{crossed_page, AddrMode};
use super::status::Flags;
use super::Cpu;
use crate::Bus;

/// Operation selector for the instruction table. Dispatch happens through
/// one exhaustive match in `Cpu::operate`, never through stored closures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Adc, And, Asl, Bcc, Bcs, Beq, Bit, Bmi, Bne, Bpl, Brk, Bvc, Bvs,
    Clc, Cld, Cli, Clv, Cmp, Cpx, Cpy, Dec, Dex, Dey, Eor, Inc, Inx,
    Iny, Jmp, Jsr, Lda, Ldx, Ldy, Lsr, Nop, Ora, Pha, Php, Pla, Plp,
    Rol, Ror, Rti, Rts, Sbc, Sec, Sed, Sei, Sta, Stx, Sty, Tax, Tay,
    Tsx, Txa, Txs, Tya,
    /// illegal opcode placeholder, executes as a no-op
    Xxx,
}

pub struct Instruction {
    pub(crate) name: &'static str,
    pub(crate) op: Operation,
    pub(crate) mode: AddrMode,
    pub(crate) cycles: u8,
}

lazy_static::lazy_static! {
    /// All 256 opcodes. Illegal encodings map to the `???` placeholder
    /// with their measured cycle costs, so every byte decodes.
    pub(crate) static ref INSTRUCTIONS: [Instruction; 256] = build_instruction_table();
}

#[rustfmt::skip]
fn build_instruction_table() -> [Instruction; 256] {
    use AddrMode::*;
    use Operation::*;

    fn i(name: &'static str, op: Operation, mode: AddrMode, cycles: u8) -> Instruction {
        Instruction { name, op, mode, cycles }
    }

    [
        i("BRK", Brk, IMM, 7), i("ORA", Ora, IZX, 6), i("???", Xxx, IMP, 2), i("???", Xxx, IMP, 8), i("???", Nop, IMP, 3), i("ORA", Ora, ZEP, 3), i("ASL", Asl, ZEP, 5), i("???", Xxx, IMP, 5), i("PHP", Php, IMP, 3), i("ORA", Ora, IMM, 2), i("ASL", Asl, ACC, 2), i("???", Xxx, IMP, 2), i("???", Nop, IMP, 4), i("ORA", Ora, ABS, 4), i("ASL", Asl, ABS, 6), i("???", Xxx, IMP, 6),
        i("BPL", Bpl, REL, 2), i("ORA", Ora, IZY, 5), i("???", Xxx, IMP, 2), i("???", Xxx, IMP, 8), i("???", Nop, IMP, 4), i("ORA", Ora, ZPX, 4), i("ASL", Asl, ZPX, 6), i("???", Xxx, IMP, 6), i("CLC", Clc, IMP, 2), i("ORA", Ora, ABY, 4), i("???", Nop, IMP, 2), i("???", Xxx, IMP, 7), i("???", Nop, IMP, 4), i("ORA", Ora, ABX, 4), i("ASL", Asl, ABX, 7), i("???", Xxx, IMP, 7),
        i("JSR", Jsr, ABS, 6), i("AND", And, IZX, 6), i("???", Xxx, IMP, 2), i("???", Xxx, IMP, 8), i("BIT", Bit, ZEP, 3), i("AND", And, ZEP, 3), i("ROL", Rol, ZEP, 5), i("???", Xxx, IMP, 5), i("PLP", Plp, IMP, 4), i("AND", And, IMM, 2), i("ROL", Rol, ACC, 2), i("???", Xxx, IMP, 2), i("BIT", Bit, ABS, 4), i("AND", And, ABS, 4), i("ROL", Rol, ABS, 6), i("???", Xxx, IMP, 6),
        i("BMI", Bmi, REL, 2), i("AND", And, IZY, 5), i("???", Xxx, IMP, 2), i("???", Xxx, IMP, 8), i("???", Nop, IMP, 4), i("AND", And, ZPX, 4), i("ROL", Rol, ZPX, 6), i("???", Xxx, IMP, 6), i("SEC", Sec, IMP, 2), i("AND", And, ABY, 4), i("???", Nop, IMP, 2), i("???", Xxx, IMP, 7), i("???", Nop, IMP, 4), i("AND", And, ABX, 4), i("ROL", Rol, ABX, 7), i("???", Xxx, IMP, 7),
        i("RTI", Rti, IMP, 6), i("EOR", Eor, IZX, 6), i("???", Xxx, IMP, 2), i("???", Xxx, IMP, 8), i("???", Nop, IMP, 3), i("EOR", Eor, ZEP, 3), i("LSR", Lsr, ZEP, 5), i("???", Xxx, IMP, 5), i("PHA", Pha, IMP, 3), i("EOR", Eor, IMM, 2), i("LSR", Lsr, ACC, 2), i("???", Xxx, IMP, 2), i("JMP", Jmp, ABS, 3), i("EOR", Eor, ABS, 4), i("LSR", Lsr, ABS, 6), i("???", Xxx, IMP, 6),
        i("BVC", Bvc, REL, 2), i("EOR", Eor, IZY, 5), i("???", Xxx, IMP, 2), i("???", Xxx, IMP, 8), i("???", Nop, IMP, 4), i("EOR", Eor, ZPX, 4), i("LSR", Lsr, ZPX, 6), i("???", Xxx, IMP, 6), i("CLI", Cli, IMP, 2), i("EOR", Eor, ABY, 4), i("???", Nop, IMP, 2), i("???", Xxx, IMP, 7), i("???", Nop, IMP, 4), i("EOR", Eor, ABX, 4), i("LSR", Lsr, ABX, 7), i("???", Xxx, IMP, 7),
        i("RTS", Rts, IMP, 6), i("ADC", Adc, IZX, 6), i("???", Xxx, IMP, 2), i("???", Xxx, IMP, 8), i("???", Nop, IMP, 3), i("ADC", Adc, ZEP, 3), i("ROR", Ror, ZEP, 5), i("???", Xxx, IMP, 5), i("PLA", Pla, IMP, 4), i("ADC", Adc, IMM, 2), i("ROR", Ror, ACC, 2), i("???", Xxx, IMP, 2), i("JMP", Jmp, IND, 5), i("ADC", Adc, ABS, 4), i("ROR", Ror, ABS, 6), i("???", Xxx, IMP, 6),
        i("BVS", Bvs, REL, 2), i("ADC", Adc, IZY, 5), i("???", Xxx, IMP, 2), i("???", Xxx, IMP, 8), i("???", Nop, IMP, 4), i("ADC", Adc, ZPX, 4), i("ROR", Ror, ZPX, 6), i("???", Xxx, IMP, 6), i("SEI", Sei, IMP, 2), i("ADC", Adc, ABY, 4), i("???", Nop, IMP, 2), i("???", Xxx, IMP, 7), i("???", Nop, IMP, 4), i("ADC", Adc, ABX, 4), i("ROR", Ror, ABX, 7), i("???", Xxx, IMP, 7),
        i("???", Nop, IMP, 2), i("STA", Sta, IZX, 6), i("???", Nop, IMP, 2), i("???", Xxx, IMP, 6), i("STY", Sty, ZEP, 3), i("STA", Sta, ZEP, 3), i("STX", Stx, ZEP, 3), i("???", Xxx, IMP, 3), i("DEY", Dey, IMP, 2), i("???", Nop, IMP, 2), i("TXA", Txa, IMP, 2), i("???", Xxx, IMP, 2), i("STY", Sty, ABS, 4), i("STA", Sta, ABS, 4), i("STX", Stx, ABS, 4), i("???", Xxx, IMP, 4),
        i("BCC", Bcc, REL, 2), i("STA", Sta, IZY, 6), i("???", Xxx, IMP, 2), i("???", Xxx, IMP, 6), i("STY", Sty, ZPX, 4), i("STA", Sta, ZPX, 4), i("STX", Stx, ZPY, 4), i("???", Xxx, IMP, 4), i("TYA", Tya, IMP, 2), i("STA", Sta, ABY, 5), i("TXS", Txs, IMP, 2), i("???", Xxx, IMP, 5), i("???", Nop, IMP, 5), i("STA", Sta, ABX, 5), i("???", Xxx, IMP, 5), i("???", Xxx, IMP, 5),
        i("LDY", Ldy, IMM, 2), i("LDA", Lda, IZX, 6), i("LDX", Ldx, IMM, 2), i("???", Xxx, IMP, 6), i("LDY", Ldy, ZEP, 3), i("LDA", Lda, ZEP, 3), i("LDX", Ldx, ZEP, 3), i("???", Xxx, IMP, 3), i("TAY", Tay, IMP, 2), i("LDA", Lda, IMM, 2), i("TAX", Tax, IMP, 2), i("???", Xxx, IMP, 2), i("LDY", Ldy, ABS, 4), i("LDA", Lda, ABS, 4), i("LDX", Ldx, ABS, 4), i("???", Xxx, IMP, 4),
        i("BCS", Bcs, REL, 2), i("LDA", Lda, IZY, 5), i("???", Xxx, IMP, 2), i("???", Xxx, IMP, 5), i("LDY", Ldy, ZPX, 4), i("LDA", Lda, ZPX, 4), i("LDX", Ldx, ZPY, 4), i("???", Xxx, IMP, 4), i("CLV", Clv, IMP, 2), i("LDA", Lda, ABY, 4), i("TSX", Tsx, IMP, 2), i("???", Xxx, IMP, 4), i("LDY", Ldy, ABX, 4), i("LDA", Lda, ABX, 4), i("LDX", Ldx, ABY, 4), i("???", Xxx, IMP, 4),
        i("CPY", Cpy, IMM, 2), i("CMP", Cmp, IZX, 6), i("???", Nop, IMP, 2), i("???", Xxx, IMP, 8), i("CPY", Cpy, ZEP, 3), i("CMP", Cmp, ZEP, 3), i("DEC", Dec, ZEP, 5), i("???", Xxx, IMP, 5), i("INY", Iny, IMP, 2), i("CMP", Cmp, IMM, 2), i("DEX", Dex, IMP, 2), i("???", Xxx, IMP, 2), i("CPY", Cpy, ABS, 4), i("CMP", Cmp, ABS, 4), i("DEC", Dec, ABS, 6), i("???", Xxx, IMP, 6),
        i("BNE", Bne, REL, 2), i("CMP", Cmp, IZY, 5), i("???", Xxx, IMP, 2), i("???", Xxx, IMP, 8), i("???", Nop, IMP, 4), i("CMP", Cmp, ZPX, 4), i("DEC", Dec, ZPX, 6), i("???", Xxx, IMP, 6), i("CLD", Cld, IMP, 2), i("CMP", Cmp, ABY, 4), i("NOP", Nop, IMP, 2), i("???", Xxx, IMP, 7), i("???", Nop, IMP, 4), i("CMP", Cmp, ABX, 4), i("DEC", Dec, ABX, 7), i("???", Xxx, IMP, 7),
        i("CPX", Cpx, IMM, 2), i("SBC", Sbc, IZX, 6), i("???", Nop, IMP, 2), i("???", Xxx, IMP, 8), i("CPX", Cpx, ZEP, 3), i("SBC", Sbc, ZEP, 3), i("INC", Inc, ZEP, 5), i("???", Xxx, IMP, 5), i("INX", Inx, IMP, 2), i("SBC", Sbc, IMM, 2), i("NOP", Nop, IMP, 2), i("???", Sbc, IMP, 2), i("CPX", Cpx, ABS, 4), i("SBC", Sbc, ABS, 4), i("INC", Inc, ABS, 6), i("???", Xxx, IMP, 6),
        i("BEQ", Beq, REL, 2), i("SBC", Sbc, IZY, 5), i("???", Xxx, IMP, 2), i("???", Xxx, IMP, 8), i("???", Nop, IMP, 4), i("SBC", Sbc, ZPX, 4), i("INC", Inc, ZPX, 6), i("???", Xxx, IMP, 6), i("SED", Sed, IMP, 2), i("SBC", Sbc, ABY, 4), i("NOP", Nop, IMP, 2), i("???", Xxx, IMP, 7), i("???", Nop, IMP, 4), i("SBC", Sbc, ABX, 4), i("INC", Inc, ABX, 7), i("???", Xxx, IMP, 7),
    ]
}

impl Cpu {
    /// Executes `op`, returning true when the operation is eligible for
    /// the page-cross extra cycle reported by its addressing mode.
    pub(crate) fn operate(&mut self, op: Operation, bus: &mut Bus) -> bool {
        use Operation::*;
        match op {
            Adc => self.adc(bus),
            And => self.and(bus),
            Asl => self.asl(bus),
            Bcc => self.bcc(),
            Bcs => self.bcs(),
            Beq => self.beq(),
            Bit => self.bit(bus),
            Bmi => self.bmi(),
            Bne => self.bne(),
            Bpl => self.bpl(),
            Brk => self.brk(bus),
            Bvc => self.bvc(),
            Bvs => self.bvs(),
            Clc => self.clc(),
            Cld => self.cld(),
            Cli => self.cli(),
            Clv => self.clv(),
            Cmp => self.cmp(bus),
            Cpx => self.cpx(bus),
            Cpy => self.cpy(bus),
            Dec => self.dec(bus),
            Dex => self.dex(),
            Dey => self.dey(),
            Eor => self.eor(bus),
            Inc => self.inc(bus),
            Inx => self.inx(),
            Iny => self.iny(),
            Jmp => self.jmp(),
            Jsr => self.jsr(bus),
            Lda => self.lda(bus),
            Ldx => self.ldx(bus),
            Ldy => self.ldy(bus),
            Lsr => self.lsr(bus),
            Nop => self.nop(),
            Ora => self.ora(bus),
            Pha => self.pha(bus),
            Php => self.php(bus),
            Pla => self.pla(bus),
            Plp => self.plp(bus),
            Rol => self.rol(bus),
            Ror => self.ror(bus),
            Rti => self.rti(bus),
            Rts => self.rts(bus),
            Sbc => self.sbc(bus),
            Sec => self.sec(),
            Sed => self.sed(),
            Sei => self.sei(),
            Sta => self.sta(bus),
            Stx => self.stx(bus),
            Sty => self.sty(bus),
            Tax => self.tax(),
            Tay => self.tay(),
            Tsx => self.tsx(),
            Txa => self.txa(),
            Txs => self.txs(),
            Tya => self.tya(),
            Xxx => false,
        }
    }

    fn write_back(&mut self, value: u8, bus: &mut Bus) {
        if INSTRUCTIONS[self.opcode as usize].mode == AddrMode::ACC {
            self.a = value;
        } else {
            bus.write(self.addr_abs, value);
        }
    }
}

/// arith
impl Cpu {
    fn adc(&mut self, bus: &mut Bus) -> bool {
        let operand = self.fetch(bus);
        self.add_with_carry(operand);
        true
    }

    fn sbc(&mut self, bus: &mut Bus) -> bool {
        let operand = self.fetch(bus);
        self.add_with_carry(!operand);
        true
    }

    fn and(&mut self, bus: &mut Bus) -> bool {
        let operand = self.fetch(bus);
        self.a &= operand;
        self.p.set_zn(self.a);
        true
    }

    fn ora(&mut self, bus: &mut Bus) -> bool {
        let operand = self.fetch(bus);
        self.a |= operand;
        self.p.set_zn(self.a);
        true
    }

    fn eor(&mut self, bus: &mut Bus) -> bool {
        let operand = self.fetch(bus);
        self.a ^= operand;
        self.p.set_zn(self.a);
        true
    }

    fn inc(&mut self, bus: &mut Bus) -> bool {
        let v = self.fetch(bus).wrapping_add(1);
        bus.write(self.addr_abs, v);
        self.p.set_zn(v);
        false
    }

    fn dec(&mut self, bus: &mut Bus) -> bool {
        let v = self.fetch(bus).wrapping_sub(1);
        bus.write(self.addr_abs, v);
        self.p.set_zn(v);
        false
    }

    fn inx(&mut self) -> bool {
        self.x = self.x.wrapping_add(1);
        self.p.set_zn(self.x);
        false
    }

    fn iny(&mut self) -> bool {
        self.y = self.y.wrapping_add(1);
        self.p.set_zn(self.y);
        false
    }

    fn dex(&mut self) -> bool {
        self.x = self.x.wrapping_sub(1);
        self.p.set_zn(self.x);
        false
    }

    fn dey(&mut self) -> bool {
        self.y = self.y.wrapping_sub(1);
        self.p.set_zn(self.y);
        false
    }

    fn asl(&mut self, bus: &mut Bus) -> bool {
        let v = self.fetch(bus);
        self.p.set(Flags::C, v & 0x80 != 0);

        let v = v << 1;
        self.p.set_zn(v);
        self.write_back(v, bus);
        false
    }

    fn lsr(&mut self, bus: &mut Bus) -> bool {
        let v = self.fetch(bus);
        self.p.set(Flags::C, v & 0x01 != 0);

        let v = v >> 1;
        self.p.set_zn(v);
        self.write_back(v, bus);
        false
    }

    fn rol(&mut self, bus: &mut Bus) -> bool {
        let c = self.p.contains(Flags::C) as u8;
        let v = self.fetch(bus);
        self.p.set(Flags::C, v & 0x80 != 0);

        let v = (v << 1) | c;
        self.p.set_zn(v);
        self.write_back(v, bus);
        false
    }

    fn ror(&mut self, bus: &mut Bus) -> bool {
        let c = self.p.contains(Flags::C) as u8;
        let v = self.fetch(bus);
        self.p.set(Flags::C, v & 0x01 != 0);

        let v = (v >> 1) | (c << 7);
        self.p.set_zn(v);
        self.write_back(v, bus);
        false
    }
}

/// branch and jump
impl Cpu {
    fn brk(&mut self, bus: &mut Bus) -> bool {
        self.pc = self.pc.wrapping_add(1);

        self.p.insert(Flags::I);
        self.push_word(self.pc, bus);

        self.p.insert(Flags::B);
        self.push_byte(self.p.bits(), bus);
        self.p.remove(Flags::B);

        self.pc = self.read_word(super::IRQ_VECTOR, bus);
        false
    }

    fn bcc(&mut self) -> bool {
        self.branch(!self.p.contains(Flags::C));
        false
    }

    fn bcs(&mut self) -> bool {
        self.branch(self.p.contains(Flags::C));
        false
    }

    fn beq(&mut self) -> bool {
        self.branch(self.p.contains(Flags::Z));
        false
    }

    fn bne(&mut self) -> bool {
        self.branch(!self.p.contains(Flags::Z));
        false
    }

    fn bmi(&mut self) -> bool {
        self.branch(self.p.contains(Flags::N));
        false
    }

    fn bpl(&mut self) -> bool {
        self.branch(!self.p.contains(Flags::N));
        false
    }

    fn bvc(&mut self) -> bool {
        self.branch(!self.p.contains(Flags::V));
        false
    }

    fn bvs(&mut self) -> bool {
        self.branch(self.p.contains(Flags::V));
        false
    }

    fn jmp(&mut self) -> bool {
        self.pc = self.addr_abs;
        false
    }

    fn jsr(&mut self, bus: &mut Bus) -> bool {
        self.pc = self.pc.wrapping_sub(1);
        self.push_word(self.pc, bus);
        self.pc = self.addr_abs;
        false
    }

    fn rti(&mut self, bus: &mut Bus) -> bool {
        self.p = Flags::from_bits_truncate(self.pop_byte(bus));
        self.p.remove(Flags::B);
        self.p.remove(Flags::U);
        self.pc = self.pop_word(bus);
        false
    }

    fn rts(&mut self, bus: &mut Bus) -> bool {
        self.pc = self.pop_word(bus).wrapping_add(1);
        false
    }
}

/// move
impl Cpu {
    fn lda(&mut self, bus: &mut Bus) -> bool {
        self.a = self.fetch(bus);
        self.p.set_zn(self.a);
        true
    }

    fn ldx(&mut self, bus: &mut Bus) -> bool {
        self.x = self.fetch(bus);
        self.p.set_zn(self.x);
        true
    }

    fn ldy(&mut self, bus: &mut Bus) -> bool {
        self.y = self.fetch(bus);
        self.p.set_zn(self.y);
        true
    }

    fn sta(&mut self, bus: &mut Bus) -> bool {
        bus.write(self.addr_abs, self.a);
        false
    }

    fn stx(&mut self, bus: &mut Bus) -> bool {
        bus.write(self.addr_abs, self.x);
        false
    }

    fn sty(&mut self, bus: &mut Bus) -> bool {
        bus.write(self.addr_abs, self.y);
        false
    }

    fn pha(&mut self, bus: &mut Bus) -> bool {
        self.push_byte(self.a, bus);
        false
    }

    fn php(&mut self, bus: &mut Bus) -> bool {
        self.push_byte((self.p | Flags::B | Flags::U).bits(), bus);
        self.p.remove(Flags::B);
        self.p.remove(Flags::U);
        false
    }

    fn pla(&mut self, bus: &mut Bus) -> bool {
        self.a = self.pop_byte(bus);
        self.p.set_zn(self.a);
        false
    }

    fn plp(&mut self, bus: &mut Bus) -> bool {
        self.p = Flags::from_bits_truncate(self.pop_byte(bus));
        self.p.insert(Flags::U);
        false
    }

    fn tax(&mut self) -> bool {
        self.x = self.a;
        self.p.set_zn(self.x);
        false
    }

    fn tay(&mut self) -> bool {
        self.y = self.a;
        self.p.set_zn(self.y);
        false
    }

    fn tsx(&mut self) -> bool {
        self.x = self.sp;
        self.p.set_zn(self.x);
        false
    }

    fn txs(&mut self) -> bool {
        self.sp = self.x;
        false
    }

    fn txa(&mut self) -> bool {
        self.a = self.x;
        self.p.set_zn(self.a);
        false
    }

    fn tya(&mut self) -> bool {
        self.a = self.y;
        self.p.set_zn(self.a);
        false
    }
}

/// flags
impl Cpu {
    fn bit(&mut self, bus: &mut Bus) -> bool {
        let v = self.fetch(bus);
        self.p.set(Flags::Z, self.a & v == 0);
        self.p.set(Flags::N, v & 0x80 != 0);
        self.p.set(Flags::V, v & 0x40 != 0);
        false
    }

    fn cmp(&mut self, bus: &mut Bus) -> bool {
        let v = self.fetch(bus);
        self.compare(self.a, v);
        true
    }

    fn cpx(&mut self, bus: &mut Bus) -> bool {
        let v = self.fetch(bus);
        self.compare(self.x, v);
        false
    }

    fn cpy(&mut self, bus: &mut Bus) -> bool {
        let v = self.fetch(bus);
        self.compare(self.y, v);
        false
    }

    fn clc(&mut self) -> bool {
        self.p.remove(Flags::C);
        false
    }

    fn cld(&mut self) -> bool {
        self.p.remove(Flags::D);
        false
    }

    fn cli(&mut self) -> bool {
        self.p.remove(Flags::I);
        false
    }

    fn clv(&mut self) -> bool {
        self.p.remove(Flags::V);
        false
    }

    fn sec(&mut self) -> bool {
        self.p.insert(Flags::C);
        false
    }

    fn sed(&mut self) -> bool {
        self.p.insert(Flags::D);
        false
    }

    fn sei(&mut self) -> bool {
        self.p.insert(Flags::I);
        false
    }

    fn nop(&mut self) -> bool {
        // the wider unofficial NOPs honor the page-cross cycle
        matches!(self.opcode, 0x1c | 0x3c | 0x5c | 0x7c | 0xdc | 0xfc)
    }
}

impl Cpu {
    fn add_with_carry(&mut self, operand: u8) {
        let sum = self.a as u16 + operand as u16 + self.p.contains(Flags::C) as u16;

        self.p.set(Flags::C, sum > 0xff);
        self.p.set(
            Flags::V,
            (!(self.a ^ operand) & (self.a ^ sum as u8)) & 0x80 != 0,
        );
        self.a = sum as u8;
        self.p.set_zn(self.a);
    }

    fn branch(&mut self, taken: bool) {
        if taken {
            self.cycles += 1;
            self.addr_abs = self.pc.wrapping_add(self.addr_rel);
            if crossed_page(self.addr_abs, self.pc) {
                self.cycles += 1;
            }
            self.pc = self.addr_abs;
        }
    }

    fn compare(&mut self, reg: u8, operand: u8) {
        self.p.set(Flags::C, reg >= operand);
        self.p.set_zn(reg.wrapping_sub(operand));
    }
}
