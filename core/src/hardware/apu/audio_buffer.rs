use std::sync::{Arc, Condvar, Mutex};

/// Stereo samples per hand-off buffer (1024 frames, left/right interleaved).
pub const AUDIO_BUFFER_SIZE: usize = 1024 * 2;

/// Where the mixer delivers finished sample buffers. The core never names a
/// host audio toolkit; hosts provide their own sink or use the built-in
/// double buffer.
pub trait AudioSink: Send {
    fn submit(&mut self, buffer: &[f32]);
}

struct FrontBuffer {
    samples: Vec<f32>,
    /// The 1-slot hand-off signal: true once the producer has filled the
    /// front buffer and until the consumer has copied it out.
    full: bool,
}

struct Shared {
    front: Mutex<FrontBuffer>,
    front_emptied: Condvar,
}

/// Producer half of the audio double buffer. `submit` blocks until the
/// consumer has drained the previous buffer, which paces the emulation
/// thread against real time.
pub struct DoubleBufferSink {
    shared: Arc<Shared>,
}

/// Consumer half, intended to be called from the host's audio callback
/// thread.
#[derive(Clone)]
pub struct AudioConsumer {
    shared: Arc<Shared>,
}

/// Create a connected producer/consumer pair around one front buffer.
pub fn audio_double_buffer() -> (DoubleBufferSink, AudioConsumer) {
    let shared = Arc::new(Shared {
        front: Mutex::new(FrontBuffer {
            samples: vec![0.0; AUDIO_BUFFER_SIZE],
            full: false,
        }),
        front_emptied: Condvar::new(),
    });

    (
        DoubleBufferSink {
            shared: shared.clone(),
        },
        AudioConsumer { shared },
    )
}

impl AudioSink for DoubleBufferSink {
    fn submit(&mut self, buffer: &[f32]) {
        let mut front = self.shared.front.lock().unwrap();
        while front.full {
            front = self.shared.front_emptied.wait(front).unwrap();
        }

        let length = buffer.len().min(front.samples.len());
        front.samples[..length].copy_from_slice(&buffer[..length]);
        front.full = true;
    }
}

impl AudioConsumer {
    /// Copy the front buffer into `out` and release it back to the producer.
    ///
    /// When the producer has not finished a buffer yet, `out` is zero-filled
    /// instead and `false` is returned; the producer is never blocked by the
    /// consumer.
    pub fn fill(&self, out: &mut [f32]) -> bool {
        let mut front = self.shared.front.lock().unwrap();
        if !front.full {
            drop(front);
            for sample in out.iter_mut() {
                *sample = 0.0;
            }
            log::warn!("audio can't keep up, inserting silence");
            return false;
        }

        let length = out.len().min(front.samples.len());
        out[..length].copy_from_slice(&front.samples[..length]);
        for sample in out[length..].iter_mut() {
            *sample = 0.0;
        }
        front.full = false;
        self.shared.front_emptied.notify_one();
        true
    }

    /// Whether a completed buffer is waiting for pickup.
    pub fn ready(&self) -> bool {
        self.shared.front.lock().unwrap().full
    }
}

/// Discards everything it is given; used when the host has no audio device.
pub struct NullSink;

impl AudioSink for NullSink {
    fn submit(&mut self, _buffer: &[f32]) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_underrun_zero_fills() {
        let (_producer, consumer) = audio_double_buffer();
        let mut out = [1.0f32; 8];

        assert!(!consumer.fill(&mut out));
        assert!(out.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_round_trip() {
        let (mut producer, consumer) = audio_double_buffer();
        let buffer = vec![0.5f32; AUDIO_BUFFER_SIZE];

        producer.submit(&buffer);
        assert!(consumer.ready());

        let mut out = vec![0.0f32; AUDIO_BUFFER_SIZE];
        assert!(consumer.fill(&mut out));
        assert_eq!(out, buffer);
        assert!(!consumer.ready());
    }

    #[test]
    fn test_producer_blocks_until_consumed() {
        let (mut producer, consumer) = audio_double_buffer();

        producer.submit(&vec![0.25f32; AUDIO_BUFFER_SIZE]);

        // The second submit can only finish after a fill on this thread.
        let handle = thread::spawn(move || {
            producer.submit(&vec![0.75f32; AUDIO_BUFFER_SIZE]);
        });

        let mut out = vec![0.0f32; AUDIO_BUFFER_SIZE];
        while !consumer.fill(&mut out) {
            thread::yield_now();
        }
        assert_eq!(out[0], 0.25);

        handle.join().unwrap();
        assert!(consumer.fill(&mut out));
        assert_eq!(out[0], 0.75);
    }
}
