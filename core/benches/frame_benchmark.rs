use criterion::{criterion_group, criterion_main, Criterion};
use ferroboi_core::hardware::apu::audio_buffer::NullSink;
use ferroboi_core::hardware::cartridge::header::compute_header_checksum;
use ferroboi_core::{Emulator, EmulatorOptions};

/// A synthetic NOP-sled cartridge, so the bench needs no ROM on disk.
fn bench_rom() -> Vec<u8> {
    let mut rom = vec![0u8; 0x8000];
    // Entry: jump to 0x0150, then an endless loop of NOPs ending in a jump
    // back, to keep the PC inside ROM forever.
    rom[0x100..0x105].copy_from_slice(&[0x00, 0x00, 0xC3, 0x50, 0x01]);
    rom[0x7FF0..0x7FF3].copy_from_slice(&[0xC3, 0x50, 0x01]);
    for (i, byte) in b"BENCH".iter().enumerate() {
        rom[0x134 + i] = *byte;
    }
    rom[0x14D] = compute_header_checksum(&rom);
    rom
}

fn frame_benchmark(c: &mut Criterion) {
    // A sink that never blocks: nothing drains the double buffer here.
    let options = EmulatorOptions::new().with_audio_sink(Box::new(NullSink));
    let mut emulator = Emulator::new(&bench_rom(), options).unwrap();

    c.bench_function("step_frame", |b| {
        b.iter(|| {
            emulator.step_frame();
        })
    });
}

criterion_group!(benches, frame_benchmark);
criterion_main!(benches);
