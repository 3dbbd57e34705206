pub mod buffer;
pub mod capture;
pub mod clock;
pub mod error;
pub mod session;
pub mod transcription;

#[cfg(feature = "cpal-audio")]
pub mod cpal_capture;

pub use buffer::AudioBuffer;
pub use capture::{AudioCapture, MockCapture};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::AudioError;
pub use session::{RecordingSession, RecordingState};
pub use transcription::{
    validate_upload, HttpTranscriptionBackend, TranscriptionBackend, TranscriptionClient,
    TranscriptionResult, MAX_AUDIO_BYTES,
};

#[cfg(feature = "cpal-audio")]
pub use cpal_capture::CpalCapture;
