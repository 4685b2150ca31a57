/// Controller button snapshot for one port.
#[derive(Debug, Default, Clone, Copy)]
pub struct InputStates {
    pub a: bool,
    pub b: bool,
    pub select: bool,
    pub start: bool,
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl InputStates {
    /// serial bit order, A shifts out first
    fn to_u8(self) -> u8 {
        ((self.a as u8) << 7)
            | ((self.b as u8) << 6)
            | ((self.select as u8) << 5)
            | ((self.start as u8) << 4)
            | ((self.up as u8) << 3)
            | ((self.down as u8) << 2)
            | ((self.left as u8) << 1)
            | ((self.right as u8) << 0)
    }
}

impl From<u8> for InputStates {
    /// bitmask form, same bit order the shift register drains in
    fn from(b: u8) -> Self {
        Self {
            a: b & 0x80 != 0,
            b: b & 0x40 != 0,
            select: b & 0x20 != 0,
            start: b & 0x10 != 0,
            up: b & 0x08 != 0,
            down: b & 0x04 != 0,
            left: b & 0x02 != 0,
            right: b & 0x01 != 0,
        }
    }
}

#[derive(Debug, Default)]
pub struct Joystick {
    states: [InputStates; 2],
    shift: [u8; 2],
}

impl Joystick {
    pub fn set_input(&mut self, port: usize, states: InputStates) {
        self.states[port] = states;
    }

    /// strobe: latch the current snapshot of both ports
    pub fn write(&mut self, _data: u8) {
        self.shift = [self.states[0].to_u8(), self.states[1].to_u8()];
    }

    /// shift out the port's top bit, 1 while the button is held
    pub fn read(&mut self, port: usize) -> u8 {
        let bit = (self.shift[port] & 0x80 != 0) as u8;
        self.shift[port] <<= 1;
        bit
    }
}
