//! Whole-system tests driving only the public surface.

use famicore::{Bus, Cartridge, Flags, InputStates};

const HEADER: usize = 16;
const PRG_BANK: usize = 0x4000;
const CHR_BANK: usize = 0x2000;
const FRAME_CLOCKS: usize = 341 * 262;

/// Minimal single-bank NROM image with both vectors pointing at 0x8000.
fn rom_image(program: &[u8]) -> Vec<u8> {
    let mut image = vec![b'N', b'E', b'S', 0x1a, 1, 1, 0x00, 0x00];
    image.resize(HEADER, 0x00);
    image.resize(HEADER + PRG_BANK + CHR_BANK, 0x00);

    image[HEADER..HEADER + program.len()].copy_from_slice(program);
    image[HEADER + 0x3ffc] = 0x00;
    image[HEADER + 0x3ffd] = 0x80;
    image[HEADER + 0x3ffa] = 0x00;
    image[HEADER + 0x3ffb] = 0x80;
    image
}

fn boot_image(image: &[u8]) -> Bus {
    let cart = Cartridge::load(image).expect("load rom failed");
    let mut bus = Bus::new(cart);
    bus.reset();
    bus
}

fn boot(program: &[u8]) -> Bus {
    boot_image(&rom_image(program))
}

#[test]
fn reset_boots_from_the_vector() {
    let bus = boot(&[0x4c, 0x00, 0x80]);

    let s = bus.cpu().state();
    assert_eq!(s.pc, 0x8000);
    assert_eq!(s.sp, 0xfd);
    assert_eq!(s.p, Flags::U);
}

#[test]
fn program_writes_reach_ram() {
    // LDA #$42; STA $10; JMP $8005 (spin)
    let mut bus = boot(&[0xa9, 0x42, 0x85, 0x10, 0x4c, 0x05, 0x80]);

    for _ in 0..300 {
        bus.clock();
    }

    assert_eq!(bus.read(0x0010), 0x42);
}

#[test]
fn frame_completes_every_89342_clocks() {
    let mut bus = boot(&[0x4c, 0x00, 0x80]);

    let mut edges = Vec::new();
    for i in 0..FRAME_CLOCKS * 3 {
        bus.clock();
        if bus.ppu().frame_complete() {
            edges.push(i);
            bus.ppu_mut().clear_frame_complete();
        }
    }

    assert_eq!(edges.len(), 3);
    assert_eq!(edges[1] - edges[0], FRAME_CLOCKS);
    assert_eq!(edges[2] - edges[1], FRAME_CLOCKS);
}

#[test]
fn vblank_flag_reads_once() {
    let mut bus = boot(&[0x4c, 0x00, 0x80]);

    while bus.ppu().timing() != (241, 2) {
        bus.clock();
    }

    // the read returns the live bit and clears it
    assert_eq!(bus.read(0x2002) & 0x80, 0x80);
    assert_eq!(bus.read(0x2002) & 0x80, 0x00);
}

#[test]
fn nmi_handler_runs_once_per_frame() {
    // main: JMP $8000 spin; handler at $8010: INC $0f; RTI
    let mut image = rom_image(&[0x4c, 0x00, 0x80]);
    image[HEADER + 0x10..HEADER + 0x13].copy_from_slice(&[0xe6, 0x0f, 0x40]);
    image[HEADER + 0x3ffa] = 0x10;
    image[HEADER + 0x3ffb] = 0x80;

    let mut bus = boot_image(&image);
    bus.write(0x2000, 0x80);

    for _ in 0..FRAME_CLOCKS * 3 {
        bus.clock();
    }

    assert_eq!(bus.read(0x000f), 3);
}

#[test]
fn controller_snapshot_drains_in_order() {
    let mut bus = boot(&[0x4c, 0x00, 0x80]);
    bus.set_input0(InputStates {
        b: true,
        select: true,
        down: true,
        ..Default::default()
    });
    bus.set_input1(InputStates {
        left: true,
        ..Default::default()
    });

    bus.write(0x4016, 0x01);

    let port0: Vec<u8> = (0..8).map(|_| bus.read(0x4016)).collect();
    let port1: Vec<u8> = (0..8).map(|_| bus.read(0x4017)).collect();
    assert_eq!(port0, [0, 1, 1, 0, 0, 1, 0, 0]);
    assert_eq!(port1, [0, 0, 0, 0, 0, 0, 1, 0]);
}

#[test]
fn oam_dma_fills_sprite_memory() {
    // fill $0300 with a ramp, then kick DMA from that page
    let mut bus = boot(&[0x4c, 0x00, 0x80]);
    for i in 0..=255u16 {
        bus.write(0x0300 + i, i as u8);
    }

    bus.write(0x4014, 0x03);
    for _ in 0..514 * 3 + 3 {
        bus.clock();
    }

    for i in 0..=255u8 {
        bus.write(0x2003, i);
        assert_eq!(bus.read(0x2004), i);
    }
}

#[test]
fn disassembler_reads_the_cartridge() {
    let bus = boot(&[0xa9, 0x42, 0x85, 0x10, 0x4c, 0x05, 0x80]);

    let lines = bus.cpu().disassemble(&bus, 0x8000, 0x8006);
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0].1, "$8000: LDA #$42 {IMM}");
    assert_eq!(lines[1].1, "$8002: STA $10 {ZEP}");
    assert_eq!(lines[2].1, "$8004: JMP $8005 {ABS}");
}

#[test]
fn missing_cartridge_degrades_to_blank_output() {
    assert!(Cartridge::load(b"not a rom").is_err());

    let mut bus = Bus::new(Cartridge::empty());
    bus.reset();

    // unmapped reads float low, the clock loop still runs a full frame
    assert_eq!(bus.read(0x8000), 0);
    for _ in 0..FRAME_CLOCKS {
        bus.clock();
    }

    let frame = bus.ppu().display_buf();
    assert_eq!(frame.len(), 256 * 240 * 3);
}

#[test]
fn cartridge_swap_takes_effect() {
    let mut bus = boot(&[0x4c, 0x00, 0x80]);
    assert_eq!(bus.read(0x8000), 0x4c);

    let mut image = rom_image(&[0xea]);
    image[HEADER] = 0xea;
    bus.insert_cartridge(Cartridge::load(&image).unwrap());
    assert_eq!(bus.read(0x8000), 0xea);
}
