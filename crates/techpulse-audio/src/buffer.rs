use std::path::Path;

use crate::error::{AudioError, Result};

/// A finalized, immutable recording: encoded container bytes plus the MIME
/// type naming the container. This is the only form in which audio crosses
/// the network boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioBuffer {
    data: Vec<u8>,
    mime: String,
}

impl AudioBuffer {
    pub fn new(data: Vec<u8>, mime: impl Into<String>) -> Self {
        Self {
            data,
            mime: mime.into(),
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    /// MIME type with any codec parameter suffix removed
    /// (`audio/webm;codecs=opus` -> `audio/webm`).
    pub fn base_mime(&self) -> &str {
        self.mime.split(';').next().unwrap_or(&self.mime).trim()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// File name suggestion for uploads/downloads, derived from the MIME
    /// subtype (`recording.webm`, `recording.wav`, ...).
    pub fn file_name(&self) -> String {
        let ext = self
            .base_mime()
            .strip_prefix("audio/")
            .unwrap_or("webm")
            .replace("mpeg", "mp3");
        format!("recording.{ext}")
    }

    /// Write the encoded bytes to disk (the "download recording" path).
    pub fn export_to(&self, path: &Path) -> Result<()> {
        std::fs::write(path, &self.data)
            .map_err(|e| AudioError::Encoding(format!("failed to write {}: {e}", path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_mime_strips_codec_suffix() {
        let buffer = AudioBuffer::new(vec![1], "audio/webm;codecs=opus");
        assert_eq!(buffer.base_mime(), "audio/webm");
        assert_eq!(buffer.mime(), "audio/webm;codecs=opus");
    }

    #[test]
    fn base_mime_passes_plain_types_through() {
        let buffer = AudioBuffer::new(vec![1], "audio/wav");
        assert_eq!(buffer.base_mime(), "audio/wav");
    }

    #[test]
    fn file_name_follows_container() {
        assert_eq!(
            AudioBuffer::new(vec![1], "audio/webm;codecs=opus").file_name(),
            "recording.webm"
        );
        assert_eq!(AudioBuffer::new(vec![1], "audio/mpeg").file_name(), "recording.mp3");
        assert_eq!(AudioBuffer::new(vec![1], "audio/wav").file_name(), "recording.wav");
    }

    #[test]
    fn export_writes_raw_bytes() {
        let dir = std::env::temp_dir().join("techpulse-audio-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("export.webm");

        let buffer = AudioBuffer::new(vec![1, 2, 3], "audio/webm");
        buffer.export_to(&path).unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), vec![1, 2, 3]);
        std::fs::remove_file(&path).ok();
    }
}
