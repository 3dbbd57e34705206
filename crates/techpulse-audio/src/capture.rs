use std::sync::{Arc, Mutex};

use crate::buffer::AudioBuffer;
use crate::error::{AudioError, Result};

/// Abstraction over a microphone capture device.
///
/// Contract: `stop` releases the underlying device unconditionally, even
/// when finalizing the buffer fails. After `stop` returns (Ok or Err) the
/// capture may be started again.
pub trait AudioCapture: Send {
    fn start(&mut self) -> Result<()>;
    fn pause(&mut self) -> Result<()>;
    fn resume(&mut self) -> Result<()>;
    fn stop(&mut self) -> Result<AudioBuffer>;
}

/// In-memory capture device with injectable failures, for tests and for
/// running the pipeline without a microphone.
pub struct MockCapture {
    buffer: AudioBuffer,
    fail_start: Option<String>,
    fail_stop: Option<String>,
    recording: bool,
    started: Arc<Mutex<u32>>,
    stopped: Arc<Mutex<u32>>,
}

impl MockCapture {
    pub fn new() -> Self {
        Self {
            buffer: AudioBuffer::new(vec![0u8; 16], "audio/webm;codecs=opus"),
            fail_start: None,
            fail_stop: None,
            recording: false,
            started: Arc::new(Mutex::new(0)),
            stopped: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_buffer(mut self, buffer: AudioBuffer) -> Self {
        self.buffer = buffer;
        self
    }

    /// Make `start` fail as if the device were missing or denied.
    pub fn with_start_failure(mut self, message: &str) -> Self {
        self.fail_start = Some(message.to_string());
        self
    }

    /// Make `stop` fail while still releasing the device.
    pub fn with_stop_failure(mut self, message: &str) -> Self {
        self.fail_stop = Some(message.to_string());
        self
    }

    /// Shared counter of successful `start` calls.
    pub fn start_counter(&self) -> Arc<Mutex<u32>> {
        Arc::clone(&self.started)
    }

    /// Shared counter of `stop` calls, counted even when stop fails.
    pub fn stop_counter(&self) -> Arc<Mutex<u32>> {
        Arc::clone(&self.stopped)
    }
}

impl Default for MockCapture {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioCapture for MockCapture {
    fn start(&mut self) -> Result<()> {
        if let Some(message) = &self.fail_start {
            return Err(AudioError::Device {
                message: message.clone(),
            });
        }
        self.recording = true;
        *self.started.lock().unwrap() += 1;
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        Ok(())
    }

    fn resume(&mut self) -> Result<()> {
        Ok(())
    }

    fn stop(&mut self) -> Result<AudioBuffer> {
        // Device is released before the failure check: stop never leaks
        // a held microphone.
        self.recording = false;
        *self.stopped.lock().unwrap() += 1;
        if let Some(message) = &self.fail_stop {
            return Err(AudioError::Encoding(message.clone()));
        }
        Ok(self.buffer.clone())
    }
}
