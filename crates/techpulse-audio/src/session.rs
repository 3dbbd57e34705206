use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::buffer::AudioBuffer;
use crate::capture::AudioCapture;
use crate::clock::{Clock, SystemClock};
use crate::error::Result;
use crate::transcription::TranscriptionClient;

const DEFAULT_MAX_DURATION: Duration = Duration::from_secs(300);

/// Where a recording is in its lifecycle. Exactly one state holds at a
/// time; every transition goes through a `RecordingSession` method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingState {
    Idle,
    Recording,
    Paused,
    Transcribing,
    Ready,
    Error,
}

/// Drives one microphone recording from start through transcription.
///
/// Duration accounting excludes paused time. Recordings auto-stop at
/// `max_duration`, checked by `poll`.
pub struct RecordingSession {
    capture: Box<dyn AudioCapture>,
    clock: Arc<dyn Clock>,
    state: RecordingState,
    started_at: Option<Instant>,
    paused_accum: Duration,
    pause_started: Option<Instant>,
    frozen_elapsed: Option<Duration>,
    buffer: Option<AudioBuffer>,
    buffer_generation: u64,
    transcribed_generation: Option<u64>,
    transcript: Option<String>,
    error: Option<String>,
    max_duration: Duration,
}

impl RecordingSession {
    pub fn new(capture: Box<dyn AudioCapture>) -> Self {
        Self {
            capture,
            clock: Arc::new(SystemClock),
            state: RecordingState::Idle,
            started_at: None,
            paused_accum: Duration::ZERO,
            pause_started: None,
            frozen_elapsed: None,
            buffer: None,
            buffer_generation: 0,
            transcribed_generation: None,
            transcript: None,
            error: None,
            max_duration: DEFAULT_MAX_DURATION,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_max_duration(mut self, max_duration: Duration) -> Self {
        self.max_duration = max_duration;
        self
    }

    pub fn state(&self) -> RecordingState {
        self.state
    }

    pub fn transcript(&self) -> Option<&str> {
        self.transcript.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn buffer(&self) -> Option<&AudioBuffer> {
        self.buffer.as_ref()
    }

    /// Recorded time excluding paused intervals. Frozen once the
    /// recording stops.
    pub fn elapsed(&self) -> Duration {
        if let Some(frozen) = self.frozen_elapsed {
            return frozen;
        }
        let Some(started_at) = self.started_at else {
            return Duration::ZERO;
        };
        let end = match self.state {
            RecordingState::Paused => self.pause_started.unwrap_or_else(|| self.clock.now()),
            _ => self.clock.now(),
        };
        end.saturating_duration_since(started_at)
            .saturating_sub(self.paused_accum)
    }

    /// Begin a fresh recording. A no-op while a recording is already in
    /// progress or being transcribed; starting from Ready or Error
    /// discards the previous result.
    pub fn start(&mut self) -> Result<()> {
        match self.state {
            RecordingState::Recording
            | RecordingState::Paused
            | RecordingState::Transcribing => {
                tracing::warn!(state = ?self.state, "start ignored, recording already active");
                return Ok(());
            }
            RecordingState::Idle | RecordingState::Ready | RecordingState::Error => {}
        }

        self.buffer = None;
        self.transcript = None;
        self.error = None;
        self.started_at = None;
        self.frozen_elapsed = None;
        self.paused_accum = Duration::ZERO;
        self.pause_started = None;

        if let Err(e) = self.capture.start() {
            self.state = RecordingState::Idle;
            self.error = Some(e.to_string());
            return Err(e);
        }

        self.started_at = Some(self.clock.now());
        self.state = RecordingState::Recording;
        Ok(())
    }

    pub fn pause(&mut self) -> Result<()> {
        if self.state != RecordingState::Recording {
            tracing::warn!(state = ?self.state, "pause ignored");
            return Ok(());
        }
        self.capture.pause()?;
        self.pause_started = Some(self.clock.now());
        self.state = RecordingState::Paused;
        Ok(())
    }

    pub fn resume(&mut self) -> Result<()> {
        if self.state != RecordingState::Paused {
            tracing::warn!(state = ?self.state, "resume ignored");
            return Ok(());
        }
        if let Some(pause_started) = self.pause_started.take() {
            self.paused_accum += self.clock.now().saturating_duration_since(pause_started);
        }
        self.capture.resume()?;
        self.state = RecordingState::Recording;
        Ok(())
    }

    /// Finalize the recording. The capture device is released whether or
    /// not finalization produced a buffer.
    pub fn stop(&mut self) -> Result<()> {
        if !matches!(
            self.state,
            RecordingState::Recording | RecordingState::Paused
        ) {
            tracing::warn!(state = ?self.state, "stop ignored");
            return Ok(());
        }

        self.frozen_elapsed = Some(self.elapsed());
        self.pause_started = None;

        match self.capture.stop() {
            Ok(buffer) => {
                self.buffer_generation += 1;
                self.buffer = Some(buffer);
                self.transcript = None;
                self.state = RecordingState::Transcribing;
                Ok(())
            }
            Err(e) => {
                self.error = Some(e.to_string());
                self.state = RecordingState::Error;
                Err(e)
            }
        }
    }

    /// Enforce the maximum recording duration. Call periodically while a
    /// recording is active.
    pub fn poll(&mut self) -> Result<()> {
        if matches!(
            self.state,
            RecordingState::Recording | RecordingState::Paused
        ) && self.elapsed() >= self.max_duration
        {
            tracing::info!(max = ?self.max_duration, "maximum recording duration reached");
            return self.stop();
        }
        Ok(())
    }

    /// Send the finalized recording for transcription. Returns the
    /// transcript on success; on failure the session moves to Error with
    /// the failure message and keeps the buffer so the call can be
    /// retried. A buffer that already transcribed successfully is served
    /// from cache.
    pub async fn transcribe(&mut self, client: &TranscriptionClient) -> Option<String> {
        if self.state == RecordingState::Ready
            && self.transcribed_generation == Some(self.buffer_generation)
        {
            return self.transcript.clone();
        }

        let Some(buffer) = self.buffer.clone() else {
            self.error = Some("No recording available to transcribe".to_string());
            self.state = RecordingState::Error;
            return None;
        };

        self.state = RecordingState::Transcribing;
        self.transcribed_generation = Some(self.buffer_generation);

        match client.transcribe(&buffer).await {
            Ok(result) => {
                self.transcript = Some(result.text.clone());
                self.error = None;
                self.state = RecordingState::Ready;
                Some(result.text)
            }
            Err(e) => {
                self.error = Some(e.to_string());
                self.state = RecordingState::Error;
                None
            }
        }
    }

    /// Drop everything and return to Idle. Stops the capture device
    /// best-effort if a recording is still running.
    pub fn clear(&mut self) {
        if matches!(
            self.state,
            RecordingState::Recording | RecordingState::Paused
        ) {
            if let Err(e) = self.capture.stop() {
                tracing::warn!(error = %e, "capture stop failed during clear");
            }
        }
        self.state = RecordingState::Idle;
        self.started_at = None;
        self.paused_accum = Duration::ZERO;
        self.pause_started = None;
        self.frozen_elapsed = None;
        self.buffer = None;
        self.transcript = None;
        self.error = None;
        self.transcribed_generation = None;
    }
}
