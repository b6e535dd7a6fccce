//! End-to-end scenarios: tiny hand-assembled programs run through the full
//! façade, exercising CPU, bus, PPU, timer, DMA and joypad together.

use std::sync::{Arc, Mutex};

use ferroboi_core::hardware::cartridge::header::compute_header_checksum;
use ferroboi_core::{DisplayColour, Emulator, EmulatorOptions, InputKey};

/// A 32 KB cartridge with a valid header: entry point `NOP NOP JP 0x0150`,
/// title "TEST", no MBC, no RAM, recomputed header checksum. `program` lands
/// at 0x0150.
fn test_rom(program: &[u8]) -> Vec<u8> {
    let mut rom = vec![0u8; 0x8000];

    rom[0x100..0x105].copy_from_slice(&[0x00, 0x00, 0xC3, 0x50, 0x01]);
    for (i, byte) in b"TEST".iter().enumerate() {
        rom[0x134 + i] = *byte;
    }
    rom[0x147] = 0x00;
    rom[0x148] = 0x00;
    rom[0x149] = 0x00;
    rom[0x14D] = compute_header_checksum(&rom);

    rom[0x150..0x150 + program.len()].copy_from_slice(program);
    rom
}

fn emulator_for(program: &[u8]) -> Emulator {
    Emulator::new(&test_rom(program), EmulatorOptions::new()).unwrap()
}

#[test]
fn bootstrap_reaches_cartridge_code() {
    // An all-NOP body: the PC should cruise through ROM for a whole frame.
    let mut emulator = emulator_for(&[]);

    emulator.step_frame();

    assert!(emulator.pc() >= 0x0150, "PC = {:#06X}", emulator.pc());
    assert!(emulator.pc() < 0x8000, "PC = {:#06X}", emulator.pc());
    assert_eq!(emulator.game_title(), "TEST");
}

#[test]
fn serial_byte_reaches_the_hook() {
    // LD A, 0x41; LD (FF01), A; LD A, 0x81; LD (FF02), A; HALT
    let program = [
        0x3E, 0x41, //
        0xEA, 0x01, 0xFF, //
        0x3E, 0x81, //
        0xEA, 0x02, 0xFF, //
        0x76,
    ];

    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = received.clone();
    let options = EmulatorOptions::new()
        .with_serial_hook(Box::new(move |byte| sink.lock().unwrap().push(byte)));

    let mut emulator = Emulator::new(&test_rom(&program), options).unwrap();
    emulator.step_frame();

    assert_eq!(*received.lock().unwrap(), vec![0x41]);
}

#[test]
fn timer_interrupt_is_serviced() {
    // TIMA = 0xF9, TMA = 0xAA, TAC = enabled + divider bit 3, then EI; HALT.
    let program = [
        0x3E, 0xF9, //
        0xEA, 0x05, 0xFF, //
        0x3E, 0xAA, //
        0xEA, 0x06, 0xFF, //
        0x3E, 0x05, //
        0xEA, 0x07, 0xFF, //
        0x3E, 0x04, // IE = timer
        0xE0, 0xFF, //
        0xFB, //
        0x76,
    ];
    let mut emulator = emulator_for(&program);

    // 7 timer increments at 16 machine cycles each, plus slack for the
    // set-up instructions and the dispatch itself.
    let mut serviced = false;
    for _ in 0..200 {
        emulator.step_instruction();
        if emulator.pc() == 0x0050 {
            serviced = true;
            break;
        }
    }

    assert!(serviced, "timer interrupt never reached its vector");
    assert_eq!(emulator.read_memory(0xFF05), 0xAA);
    assert_eq!(emulator.read_memory(0xFF06), 0xAA);
}

#[test]
fn dma_copies_a_page_into_oam() {
    // Fill 0xC100..=0xC19F with 0x00..=0x9F, then start DMA from page 0xC1.
    let program = [
        0x21, 0x00, 0xC1, // LD HL, 0xC100
        0x7D, // loop: LD A, L
        0x22, // LD (HL+), A
        0x7D, // LD A, L
        0xFE, 0xA0, // CP 0xA0
        0x20, 0xF9, // JR NZ, loop
        0x3E, 0xC1, // LD A, 0xC1
        0xE0, 0x46, // LDH (0x46), A
        0x76, // HALT
    ];
    let mut emulator = emulator_for(&program);

    // The program plus the 160-cycle transfer fit comfortably in one frame;
    // at the frame boundary the PPU is in V-Blank and OAM is observable.
    emulator.step_frame();

    for i in 0..0xA0u16 {
        assert_eq!(emulator.read_memory(0xFE00 + i), i as u8, "OAM byte {}", i);
    }
}

#[test]
fn blank_frame_renders_palette_colour_zero() {
    // BGP = 0xE4 (identity), VRAM zeroed, scroll (0, 0), then HALT.
    let program = [
        0x3E, 0xE4, //
        0xE0, 0x47, //
        0x76,
    ];
    let mut emulator = emulator_for(&program);

    let frame = emulator.step_frame();

    let white = DisplayColour::default().white;
    assert!(frame
        .chunks(3)
        .all(|pixel| (pixel[0], pixel[1], pixel[2]) == (white.0, white.1, white.2)));
}

#[test]
fn joypad_press_wakes_and_vectors() {
    // Select the button row, enable only the joypad interrupt, EI; HALT.
    let program = [
        0x3E, 0x10, // LD A, 0x10
        0xE0, 0x00, // LDH (0x00), A - buttons selected (active low)
        0x3E, 0x10, // LD A, 0x10
        0xE0, 0xFF, // LDH (0xFF), A - IE = joypad only
        0xFB, // EI
        0x76, // HALT
    ];
    let mut emulator = emulator_for(&program);

    // Let the program reach HALT first.
    for _ in 0..16 {
        emulator.step_instruction();
    }

    emulator.press_key(InputKey::A);

    let mut vectored = false;
    // Well under one frame's worth of instruction steps.
    for _ in 0..1000 {
        emulator.step_instruction();
        if emulator.pc() == 0x0060 {
            vectored = true;
            break;
        }
    }

    assert!(vectored, "joypad interrupt never reached its vector");
}

#[test]
fn audio_buffers_become_available() {
    let mut emulator = emulator_for(&[]);
    let consumer = emulator.audio_consumer().unwrap();

    // One frame is ~17.5k machine cycles = ~730 samples; a couple of frames
    // fill the 1024-frame hand-off buffer.
    while !consumer.ready() {
        emulator.step_frame();
    }

    let mut out = vec![1.0f32; 2048];
    assert!(emulator.pull_audio_samples(&mut out));
}
