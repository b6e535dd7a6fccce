//! Emulation core for the monochrome handheld: LR35902 CPU, tile PPU,
//! four-voice APU, banked cartridge bus, timer, joypad and DMA engine, all
//! advanced in lockstep one machine cycle at a time.
//!
//! Host front ends drive the core through the [`emulator::Emulator`] façade
//! and provide their own video/audio plumbing via the [`FramePresenter`] and
//! [`AudioSink`] traits.
//!
//! [`FramePresenter`]: emulator::FramePresenter
//! [`AudioSink`]: hardware::apu::audio_buffer::AudioSink

pub mod emulator;
pub mod hardware;
pub mod io;

pub use crate::emulator::{Emulator, EmulatorOptions, FramePresenter};
pub use crate::hardware::apu::audio_buffer::{AudioConsumer, AudioSink};
pub use crate::hardware::cartridge::CartridgeError;
pub use crate::hardware::ppu::palette::{DisplayColour, RGB};
pub use crate::hardware::ppu::{FRAMEBUFFER_SIZE, RESOLUTION_HEIGHT, RESOLUTION_WIDTH};
pub use crate::io::joypad::InputKey;
