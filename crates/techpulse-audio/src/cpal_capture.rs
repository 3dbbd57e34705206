//! Microphone capture backed by CPAL, encoding to WAV on stop.

use std::io::Cursor;
use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use crate::buffer::AudioBuffer;
use crate::capture::AudioCapture;
use crate::error::{AudioError, Result};

const SAMPLE_RATE: u32 = 16_000;

/// Wrapper for cpal::Stream to make it Send.
///
/// SAFETY: the stream is only touched while holding the session's
/// exclusive reference; calls never cross threads concurrently.
struct SendableStream(cpal::Stream);

unsafe impl Send for SendableStream {}

/// Captures 16-bit PCM at 16kHz mono and finalizes recordings as WAV.
pub struct CpalCapture {
    device: cpal::Device,
    stream: Option<SendableStream>,
    samples: Arc<Mutex<Vec<i16>>>,
}

impl CpalCapture {
    /// Open the given input device, or the system default.
    pub fn new(device_name: Option<&str>) -> Result<Self> {
        let host = cpal::default_host();

        let device = if let Some(name) = device_name {
            let mut devices = host.input_devices().map_err(|e| AudioError::Device {
                message: format!("failed to enumerate input devices: {e}"),
            })?;
            devices
                .find(|d| d.name().map(|n| n == name).unwrap_or(false))
                .ok_or_else(|| AudioError::Device {
                    message: format!("input device not found: {name}"),
                })?
        } else {
            host.default_input_device().ok_or_else(|| AudioError::Device {
                message: "no default input device".to_string(),
            })?
        };

        Ok(Self {
            device,
            stream: None,
            samples: Arc::new(Mutex::new(Vec::new())),
        })
    }

    fn build_stream(&self) -> Result<cpal::Stream> {
        let config = cpal::StreamConfig {
            channels: 1,
            sample_rate: cpal::SampleRate(SAMPLE_RATE),
            buffer_size: cpal::BufferSize::Default,
        };

        let err_callback = |err| {
            tracing::error!(error = %err, "audio stream error");
        };

        // i16 mono first; PipeWire/PulseAudio convert transparently.
        let samples = Arc::clone(&self.samples);
        if let Ok(stream) = self.device.build_input_stream(
            &config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                if let Ok(mut buf) = samples.lock() {
                    buf.extend_from_slice(data);
                }
            },
            err_callback,
            None,
        ) {
            return Ok(stream);
        }

        // Devices that only expose float formats.
        let samples = Arc::clone(&self.samples);
        self.device
            .build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut buf) = samples.lock() {
                        buf.extend(
                            data.iter()
                                .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16),
                        );
                    }
                },
                err_callback,
                None,
            )
            .map_err(|e| AudioError::Device {
                message: format!("failed to build input stream: {e}"),
            })
    }

    fn encode_wav(samples: &[i16]) -> Result<Vec<u8>> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: SAMPLE_RATE,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec)
                .map_err(|e| AudioError::Encoding(e.to_string()))?;
            for &sample in samples {
                writer
                    .write_sample(sample)
                    .map_err(|e| AudioError::Encoding(e.to_string()))?;
            }
            writer
                .finalize()
                .map_err(|e| AudioError::Encoding(e.to_string()))?;
        }
        Ok(cursor.into_inner())
    }
}

impl AudioCapture for CpalCapture {
    fn start(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }
        if let Ok(mut buf) = self.samples.lock() {
            buf.clear();
        }

        let stream = self.build_stream()?;
        stream.play().map_err(|e| AudioError::Device {
            message: format!("failed to start audio stream: {e}"),
        })?;
        self.stream = Some(SendableStream(stream));
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        if let Some(stream) = &self.stream {
            stream.0.pause().map_err(|e| AudioError::Device {
                message: format!("failed to pause audio stream: {e}"),
            })?;
        }
        Ok(())
    }

    fn resume(&mut self) -> Result<()> {
        if let Some(stream) = &self.stream {
            stream.0.play().map_err(|e| AudioError::Device {
                message: format!("failed to resume audio stream: {e}"),
            })?;
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<AudioBuffer> {
        // Dropping the stream releases the device regardless of what the
        // encoder does next.
        self.stream.take();

        let samples = self
            .samples
            .lock()
            .map_err(|_| AudioError::Encoding("sample buffer poisoned".to_string()))?
            .split_off(0);

        let wav = Self::encode_wav(&samples)?;
        Ok(AudioBuffer::new(wav, "audio/wav"))
    }
}
