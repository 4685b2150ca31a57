bitflags::bitflags! {
    /// 6502 status register
    pub struct Flags: u8 {
        /// carry
        const C = 1 << 0;
        /// zero
        const Z = 1 << 1;
        /// interrupt disable
        const I = 1 << 2;
        /// decimal (no effect on the 2A03)
        const D = 1 << 3;
        /// break mark, only ever lives on the stack
        const B = 1 << 4;
        /// unused, reads back as 1
        const U = 1 << 5;
        /// overflow
        const V = 1 << 6;
        /// negative
        const N = 1 << 7;
    }
}

impl Flags {
    pub(crate) fn set_zn(&mut self, v: u8) {
        self.set(Flags::Z, v == 0);
        self.set(Flags::N, v & 0x80 != 0);
    }
}

impl Default for Flags {
    fn default() -> Self {
        Flags::U
    }
}

impl std::fmt::Display for Flags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (flag, c) in [
            (Flags::N, 'N'),
            (Flags::V, 'V'),
            (Flags::U, 'U'),
            (Flags::B, 'B'),
            (Flags::D, 'D'),
            (Flags::I, 'I'),
            (Flags::Z, 'Z'),
            (Flags::C, 'C'),
        ] {
            write!(f, "{}", if self.contains(flag) { c } else { '-' })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags() {
        let mut p = Flags::default();
        assert_eq!(p.bits(), 0b0010_0000);

        p.set_zn(0x00);
        assert!(p.contains(Flags::Z));
        assert!(!p.contains(Flags::N));

        p.set_zn(0x80);
        assert!(!p.contains(Flags::Z));
        assert!(p.contains(Flags::N));

        let p = Flags::from_bits_truncate(0xff);
        assert_eq!(format!("{}", p), "NVUBDIZC");
    }
}
