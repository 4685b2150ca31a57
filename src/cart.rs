use bit_field::BitField;
use thiserror::Error;

mod mapper000;

const HEADER_SIZE: usize = 16;
const TRAINER_SIZE: usize = 0x200;
const PRG_BANK_SIZE: usize = 0x4000;
const CHR_BANK_SIZE: usize = 0x2000;
const MAGIC: [u8; 4] = [b'N', b'E', b'S', 0x1a];

#[derive(Debug, Error)]
pub enum CartridgeError {
    #[error("invalid image header")]
    InvalidHeader,
    #[error("image truncated: need {need} bytes, have {have}")]
    Truncated { need: usize, have: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum Mirroring {
    Horizontal = 0,
    Vertical = 1,
}

/// Address translation strategy selected by the mapper id. Each query
/// either claims the address, yielding the offset into the owning byte
/// array, or declines it so the bus/PPU fall through to their own memory.
pub trait Mapper {
    fn cpu_map_read(&self, addr: u16) -> Option<usize>;
    fn cpu_map_write(&self, addr: u16) -> Option<usize>;
    fn ppu_map_read(&self, addr: u16) -> Option<usize>;
    fn ppu_map_write(&self, addr: u16) -> Option<usize>;
}

pub struct Cartridge {
    prg_rom: Vec<u8>,
    chr_mem: Vec<u8>,
    mirroring: Mirroring,
    mapper: Option<Box<dyn Mapper + Send + Sync>>,
}

impl Cartridge {
    /// The nothing-inserted cartridge: no mapper, every query declined.
    pub fn empty() -> Self {
        Self {
            prg_rom: Vec::new(),
            chr_mem: Vec::new(),
            mirroring: Mirroring::Horizontal,
            mapper: None,
        }
    }

    /// Parses an iNES image. Malformed or truncated images are load-time
    /// errors; an unsupported mapper id is not — the cartridge comes back
    /// unmapped and behaves like open bus.
    pub fn load(data: &[u8]) -> Result<Self, CartridgeError> {
        if data.len() < HEADER_SIZE || data[..4] != MAGIC {
            return Err(CartridgeError::InvalidHeader);
        }

        let prg_banks = data[4] as usize;
        let chr_banks = data[5] as usize;
        if prg_banks == 0 {
            return Err(CartridgeError::InvalidHeader);
        }

        let f6 = data[6];
        let f7 = data[7];
        let trainer = f6.get_bit(2);
        let mirroring = if f6.get_bit(0) {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        };
        let mapper_id = (f7 & 0xf0) | (f6 >> 4);

        let offset = HEADER_SIZE + trainer as usize * TRAINER_SIZE;
        let prg_len = prg_banks * PRG_BANK_SIZE;
        let chr_len = chr_banks * CHR_BANK_SIZE;

        let need = offset + prg_len + chr_len;
        if data.len() < need {
            return Err(CartridgeError::Truncated {
                need,
                have: data.len(),
            });
        }

        let prg_rom = data[offset..][..prg_len].to_vec();
        let chr_mem = if chr_banks == 0 {
            // CHR-RAM cartridge
            vec![0u8; CHR_BANK_SIZE]
        } else {
            data[offset + prg_len..][..chr_len].to_vec()
        };

        let mapper: Option<Box<dyn Mapper + Send + Sync>> = match mapper_id {
            0 => Some(Box::new(mapper000::Mapper000::new(prg_banks, chr_banks))),
            _ => {
                log::warn!("unsupported mapper {:03}, cartridge stays unmapped", mapper_id);
                None
            }
        };

        log::info!(
            "mapper {:03}, prg {} * 16KB, chr {} * 8KB, {:?} mirroring",
            mapper_id,
            prg_banks,
            chr_banks,
            mirroring
        );

        Ok(Self {
            prg_rom,
            chr_mem,
            mirroring,
            mapper,
        })
    }

    pub fn is_valid(&self) -> bool {
        self.mapper.is_some()
    }

    pub fn mirroring(&self) -> Mirroring {
        self.mirroring
    }

    pub fn cpu_read(&self, addr: u16) -> Option<u8> {
        let mapper = self.mapper.as_ref()?;
        mapper.cpu_map_read(addr).map(|offset| self.prg_rom[offset])
    }

    pub fn cpu_write(&mut self, addr: u16, data: u8) -> bool {
        match self.mapper.as_ref().and_then(|m| m.cpu_map_write(addr)) {
            Some(offset) => {
                self.prg_rom[offset] = data;
                true
            }
            None => false,
        }
    }

    pub fn ppu_read(&self, addr: u16) -> Option<u8> {
        let mapper = self.mapper.as_ref()?;
        mapper.ppu_map_read(addr).map(|offset| self.chr_mem[offset])
    }

    pub fn ppu_write(&mut self, addr: u16, data: u8) -> bool {
        match self.mapper.as_ref().and_then(|m| m.ppu_map_write(addr)) {
            Some(offset) => {
                self.chr_mem[offset] = data;
                true
            }
            None => false,
        }
    }
}
