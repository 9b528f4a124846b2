//! Camera frames and the single-slot buffer between sensor callbacks and the
//! render loop.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::{OverlayError, Result};

/// A decoded camera image in BGRA byte order (4 bytes per pixel, row-major,
/// top-left origin).
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Simulator frame number the image was captured at.
    pub sequence: u64,
    /// Simulated time of capture, in seconds.
    pub timestamp: f64,
    data: Vec<u8>,
}

impl Frame {
    /// Creates a frame, checking that `data` holds `width * height` BGRA pixels.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = (width as usize) * (height as usize) * 4;
        if data.len() != expected {
            return Err(OverlayError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            sequence: 0,
            timestamp: 0.0,
            data,
        })
    }

    /// Creates a frame filled with one BGRA color.
    #[must_use]
    pub fn filled(width: u32, height: u32, bgra: [u8; 4]) -> Self {
        let pixels = (width as usize) * (height as usize);
        Self {
            width,
            height,
            sequence: 0,
            timestamp: 0.0,
            data: bgra.repeat(pixels),
        }
    }

    /// Sets the capture metadata.
    #[must_use]
    pub fn with_capture(mut self, sequence: u64, timestamp: f64) -> Self {
        self.sequence = sequence;
        self.timestamp = timestamp;
        self
    }

    /// Raw BGRA bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the BGRA pixel at (x, y).
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + x as usize) * 4;
        Some([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }
}

#[derive(Debug, Clone)]
struct Published {
    generation: u64,
    frame: Arc<Frame>,
}

#[derive(Debug, Default)]
struct Shared {
    slot: RwLock<Option<Published>>,
    generation: AtomicU64,
    stopped: AtomicBool,
    rejected: AtomicU64,
}

/// Latest-frame slot shared between one producer (the sensor callback, on the
/// simulator's thread) and one consumer (the render loop).
///
/// Publishing swaps a whole `Arc<Frame>` in; reading clones the `Arc` out.
/// Neither side holds the lock for longer than a pointer swap: frames are
/// allocated before the write lock is taken and the displaced frame is
/// dropped after it is released. A reader never waits on frame decoding or
/// deallocation and never sees a partly written frame.
/// Frames are not queued: a frame replaced before the consumer reads it is
/// simply never seen.
///
/// Cloning the buffer yields another handle to the same slot.
#[derive(Debug, Clone, Default)]
pub struct SensorFrameBuffer {
    shared: Arc<Shared>,
}

impl SensorFrameBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the slot contents with `frame`.
    ///
    /// Returns `false` (and drops the frame) once the buffer has been stopped.
    pub fn publish(&self, frame: Frame) -> bool {
        let frame = Arc::new(frame);
        let displaced = {
            let mut slot = self
                .shared
                .slot
                .write()
                .unwrap_or_else(PoisonError::into_inner);

            // Checked under the write lock so nothing lands after `stop` returns.
            if self.shared.stopped.load(Ordering::Acquire) {
                self.shared.rejected.fetch_add(1, Ordering::Relaxed);
                return false;
            }

            let generation = self.shared.generation.fetch_add(1, Ordering::AcqRel) + 1;
            slot.replace(Published { generation, frame })
        };

        // The replaced frame is freed only after the guard is released.
        drop(displaced);
        true
    }

    /// Returns the most recently published frame, or `None` if nothing has
    /// been published yet.
    pub fn read(&self) -> Option<Arc<Frame>> {
        self.read_with_generation().map(|(_, frame)| frame)
    }

    /// Returns the latest frame together with its publish generation
    /// (1 for the first accepted frame, incrementing per publish).
    pub fn read_with_generation(&self) -> Option<(u64, Arc<Frame>)> {
        let slot = self
            .shared
            .slot
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        slot.as_ref().map(|p| (p.generation, Arc::clone(&p.frame)))
    }

    /// Number of frames accepted so far.
    pub fn generation(&self) -> u64 {
        self.shared.generation.load(Ordering::Acquire)
    }

    /// Permanently rejects further publishes. Idempotent.
    ///
    /// The last published frame stays readable.
    pub fn stop(&self) {
        let _slot = self
            .shared
            .slot
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        self.shared.stopped.store(true, Ordering::Release);
    }

    /// Returns true once [`stop`](Self::stop) has been called.
    pub fn is_stopped(&self) -> bool {
        self.shared.stopped.load(Ordering::Acquire)
    }

    /// Number of publishes rejected because the buffer was stopped.
    pub fn rejected(&self) -> u64 {
        self.shared.rejected.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_frame_size_check() {
        assert!(Frame::new(2, 2, vec![0; 16]).is_ok());
        assert!(Frame::new(2, 2, vec![0; 15]).is_err());
    }

    #[test]
    fn test_frame_pixel() {
        let mut data = vec![0u8; 2 * 2 * 4];
        data[12..16].copy_from_slice(&[1, 2, 3, 4]);
        let frame = Frame::new(2, 2, data).unwrap();
        assert_eq!(frame.pixel(1, 1), Some([1, 2, 3, 4]));
        assert_eq!(frame.pixel(2, 0), None);
    }

    #[test]
    fn test_read_before_publish_is_empty() {
        let buffer = SensorFrameBuffer::new();
        assert!(buffer.read().is_none());
        assert_eq!(buffer.generation(), 0);
    }

    #[test]
    fn test_read_returns_latest_until_next_publish() {
        let buffer = SensorFrameBuffer::new();
        assert!(buffer.publish(Frame::filled(4, 4, [1, 1, 1, 255]).with_capture(10, 0.5)));

        let first = buffer.read().unwrap();
        assert_eq!(first.sequence, 10);
        assert_eq!(buffer.read().unwrap().sequence, 10);

        assert!(buffer.publish(Frame::filled(4, 4, [2, 2, 2, 255]).with_capture(11, 0.55)));
        let (generation, second) = buffer.read_with_generation().unwrap();
        assert_eq!(generation, 2);
        assert_eq!(second.sequence, 11);

        // The earlier handle is unaffected by the replacement.
        assert_eq!(first.pixel(0, 0), Some([1, 1, 1, 255]));
    }

    #[test]
    fn test_displaced_frame_released_after_publish() {
        let buffer = SensorFrameBuffer::new();
        buffer.publish(Frame::filled(1920, 1080, [7; 4]).with_capture(1, 0.0));
        let first = Arc::downgrade(&buffer.read().unwrap());
        assert!(first.upgrade().is_some());

        buffer.publish(Frame::filled(1920, 1080, [8; 4]).with_capture(2, 0.05));
        assert!(first.upgrade().is_none());
        assert_eq!(buffer.read().unwrap().pixel(0, 0), Some([8; 4]));

        // A frame still held by the consumer outlives its replacement.
        let held = buffer.read().unwrap();
        buffer.publish(Frame::filled(1920, 1080, [9; 4]).with_capture(3, 0.1));
        assert_eq!(held.sequence, 2);
        assert_eq!(Arc::strong_count(&held), 1);
    }

    #[test]
    fn test_stop_rejects_publish() {
        let buffer = SensorFrameBuffer::new();
        buffer.publish(Frame::filled(1, 1, [0; 4]).with_capture(1, 0.0));
        buffer.stop();
        buffer.stop();

        assert!(buffer.is_stopped());
        assert!(!buffer.publish(Frame::filled(1, 1, [0; 4]).with_capture(2, 0.0)));
        assert_eq!(buffer.rejected(), 1);
        assert_eq!(buffer.read().unwrap().sequence, 1);
    }

    #[test]
    fn test_concurrent_publish_is_never_torn() {
        let buffer = SensorFrameBuffer::new();
        let producer = buffer.clone();

        let handle = thread::spawn(move || {
            for i in 0..250u64 {
                #[allow(clippy::cast_possible_truncation)]
                let v = i as u8;
                producer.publish(Frame::filled(8, 8, [v, v, v, v]).with_capture(i, 0.0));
            }
        });

        let mut last_generation = 0;
        for _ in 0..2000 {
            if let Some((generation, frame)) = buffer.read_with_generation() {
                assert!(generation >= last_generation);
                last_generation = generation;
                let first = frame.data()[0];
                assert!(frame.data().iter().all(|&b| b == first));
            }
        }

        handle.join().unwrap();
        assert_eq!(buffer.generation(), 250);
    }
}
