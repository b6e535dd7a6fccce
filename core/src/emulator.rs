use crate::hardware::apu::audio_buffer::{audio_double_buffer, AudioConsumer, AudioSink};
use crate::hardware::cartridge::{Cartridge, CartridgeError};
use crate::hardware::cpu::CPU;
use crate::hardware::mmu::Memory;
use crate::hardware::ppu::palette::DisplayColour;
use crate::hardware::ppu::FRAMEBUFFER_SIZE;
use crate::io::joypad::InputKey;
use crate::io::serial::SerialHook;

/// Where completed frames go. The core never names a host toolkit; a host
/// hands in whatever puts pixels on a screen.
pub trait FramePresenter {
    /// `frame` is RGB8, 160x144, row major.
    fn present(&mut self, frame: &[u8]);
}

/// Construction options, mirroring what the hardware can't decide for
/// itself: colours, persisted save RAM, and the host hook-ups.
#[derive(Default)]
pub struct EmulatorOptions {
    pub display_colour: Option<DisplayColour>,
    pub saved_ram: Option<Vec<u8>>,
    pub serial_hook: Option<SerialHook>,
    pub audio_sink: Option<Box<dyn AudioSink>>,
    pub presenter: Option<Box<dyn FramePresenter>>,
}

impl EmulatorOptions {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_display_colour(mut self, colours: DisplayColour) -> Self {
        self.display_colour = Some(colours);
        self
    }

    pub fn with_saved_ram(mut self, ram: Vec<u8>) -> Self {
        self.saved_ram = Some(ram);
        self
    }

    pub fn with_serial_hook(mut self, hook: SerialHook) -> Self {
        self.serial_hook = Some(hook);
        self
    }

    pub fn with_audio_sink(mut self, sink: Box<dyn AudioSink>) -> Self {
        self.audio_sink = Some(sink);
        self
    }

    pub fn with_presenter(mut self, presenter: Box<dyn FramePresenter>) -> Self {
        self.presenter = Some(presenter);
        self
    }
}

/// The register values the power-up sequence leaves behind, applied through
/// the ordinary bus so every component sees its own write.
const POWER_UP_IO_WRITES: [(u16, u8); 23] = [
    (0xFF05, 0x00),
    (0xFF06, 0x00),
    (0xFF07, 0x00),
    (0xFF10, 0x80),
    (0xFF11, 0xBF),
    (0xFF12, 0xF3),
    (0xFF14, 0xBF),
    (0xFF16, 0x3F),
    (0xFF19, 0xBF),
    (0xFF1A, 0x7F),
    (0xFF1B, 0xFF),
    (0xFF1C, 0x9F),
    (0xFF1E, 0xBF),
    (0xFF20, 0xFF),
    (0xFF23, 0xBF),
    (0xFF24, 0x77),
    (0xFF25, 0xF3),
    (0xFF26, 0xF1),
    (0xFF40, 0x91),
    (0xFF47, 0xFC),
    (0xFF48, 0xFF),
    (0xFF49, 0xFF),
    (0xFFFF, 0x00),
];

/// The whole machine behind one façade: run a frame, feed it buttons, pull
/// its audio.
pub struct Emulator {
    cpu: CPU<Memory>,
    presenter: Option<Box<dyn FramePresenter>>,
    audio_consumer: Option<AudioConsumer>,
}

impl Emulator {
    pub fn new(cartridge_bytes: &[u8], options: EmulatorOptions) -> Result<Self, CartridgeError> {
        let cartridge = Cartridge::new(cartridge_bytes, options.saved_ram)?;

        let (audio_sink, audio_consumer) = match options.audio_sink {
            Some(sink) => (sink, None),
            None => {
                let (producer, consumer) = audio_double_buffer();
                (Box::new(producer) as Box<dyn AudioSink>, Some(consumer))
            }
        };

        let mut memory = Memory::new(
            cartridge,
            options.display_colour.unwrap_or_default(),
            audio_sink,
        );
        if let Some(hook) = options.serial_hook {
            memory.serial.set_hook(hook);
        }

        let mut emulator = Emulator {
            cpu: CPU::new(memory),
            presenter: options.presenter,
            audio_consumer,
        };
        emulator.apply_power_up_state();

        Ok(emulator)
    }

    /// The state the boot procedure hands over to cartridge code.
    fn apply_power_up_state(&mut self) {
        self.cpu.registers.pc = 0x100;
        self.cpu.registers.sp = 0xFFFE;

        for (address, value) in POWER_UP_IO_WRITES.iter() {
            self.cpu.mmu.write_byte_bypass(*address, *value);
        }
    }

    /// Run until the PPU finishes the current frame, then hand the frame to
    /// the presenter (if any) and return it.
    pub fn step_frame(&mut self) -> &[u8] {
        loop {
            self.cpu.step_instruction();
            if self.cpu.mmu.ppu.take_frame_ready() {
                break;
            }
        }

        let frame = self.cpu.mmu.ppu.frame_buffer();
        debug_assert_eq!(frame.len(), FRAMEBUFFER_SIZE);
        if let Some(presenter) = self.presenter.as_mut() {
            presenter.present(frame);
        }
        frame
    }

    /// Execute a single instruction; mostly useful for tests and tooling.
    pub fn step_instruction(&mut self) {
        self.cpu.step_instruction();
    }

    pub fn press_key(&mut self, key: InputKey) {
        self.cpu.mmu.joypad_register.set_button(key, true);
    }

    pub fn release_key(&mut self, key: InputKey) {
        self.cpu.mmu.joypad_register.set_button(key, false);
    }

    /// Copy the most recent completed audio buffer into `out`, zero-filling
    /// on underrun. Only available when no custom sink was installed.
    pub fn pull_audio_samples(&self, out: &mut [f32]) -> bool {
        match &self.audio_consumer {
            Some(consumer) => consumer.fill(out),
            None => false,
        }
    }

    /// A cloneable handle for the host's audio callback thread.
    pub fn audio_consumer(&self) -> Option<AudioConsumer> {
        self.audio_consumer.clone()
    }

    pub fn set_tracing(&mut self, tracing: bool) {
        self.cpu.set_tracing(tracing);
    }

    /// Battery backed external RAM, for hosts that persist saves.
    pub fn battery_ram(&self) -> Option<&[u8]> {
        self.cpu.mmu.cartridge().battery_ram()
    }

    pub fn game_title(&self) -> &str {
        &self.cpu.mmu.cartridge().cartridge_header().title
    }

    /// The current program counter; exposed for tests and diagnostics.
    pub fn pc(&self) -> u16 {
        self.cpu.registers.pc
    }

    /// Raw bus read without side effects on the cycle counter.
    pub fn read_memory(&self, address: u16) -> u8 {
        self.cpu.mmu.read_byte_bypass(address)
    }

    pub fn frame_buffer(&self) -> &[u8] {
        self.cpu.mmu.ppu.frame_buffer()
    }

    pub fn cycles_performed(&self) -> u64 {
        self.cpu.cycles_performed
    }
}
