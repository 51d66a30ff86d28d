use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Broad media category of an upload, derived once from the primary file's
/// content type at task creation. Anything that is not `image/*` takes the
/// video path.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn from_content_type(content_type: &str) -> Self {
        if content_type.starts_with("image/") {
            MediaKind::Image
        } else {
            MediaKind::Video
        }
    }
}

impl Display for MediaKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            MediaKind::Image => write!(f, "image"),
            MediaKind::Video => write!(f, "video"),
        }
    }
}

impl FromStr for MediaKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(MediaKind::Image),
            "video" => Ok(MediaKind::Video),
            _ => Err(anyhow::anyhow!("Invalid media kind: {}", s)),
        }
    }
}

/// An in-memory file: name, declared content type, and payload.
///
/// Payloads are `Bytes`, so cloning a file (for example to hand the original
/// back after a failed compression) does not copy the data.
#[derive(Debug, Clone)]
pub struct MediaFile {
    pub name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl MediaFile {
    pub fn new(
        name: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    pub fn kind(&self) -> MediaKind {
        MediaKind::from_content_type(&self.content_type)
    }

    /// Lowercased extension of the file name, without the dot.
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_lowercase())
    }

    /// File name without its final extension.
    pub fn stem(&self) -> &str {
        match self.name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => &self.name,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_content_type() {
        assert_eq!(MediaKind::from_content_type("image/jpeg"), MediaKind::Image);
        assert_eq!(MediaKind::from_content_type("image/png"), MediaKind::Image);
        assert_eq!(MediaKind::from_content_type("video/mp4"), MediaKind::Video);
        assert_eq!(
            MediaKind::from_content_type("video/quicktime"),
            MediaKind::Video
        );
        // Unknown types take the video path
        assert_eq!(
            MediaKind::from_content_type("application/octet-stream"),
            MediaKind::Video
        );
    }

    #[test]
    fn test_media_kind_display_and_parse() {
        assert_eq!(MediaKind::Image.to_string(), "image");
        assert_eq!(MediaKind::Video.to_string(), "video");
        assert_eq!("image".parse::<MediaKind>().unwrap(), MediaKind::Image);
        assert_eq!("video".parse::<MediaKind>().unwrap(), MediaKind::Video);
        assert!("audio".parse::<MediaKind>().is_err());
    }

    #[test]
    fn test_extension() {
        let file = MediaFile::new("lesson.MP4", "video/mp4", vec![1u8]);
        assert_eq!(file.extension().as_deref(), Some("mp4"));

        let no_ext = MediaFile::new("lesson", "video/mp4", vec![1u8]);
        assert_eq!(no_ext.extension(), None);

        let dotfile = MediaFile::new(".hidden", "video/mp4", vec![1u8]);
        assert_eq!(dotfile.extension(), None);
    }

    #[test]
    fn test_stem() {
        let file = MediaFile::new("intro.lesson.mov", "video/quicktime", vec![1u8]);
        assert_eq!(file.stem(), "intro.lesson");

        let no_ext = MediaFile::new("intro", "video/mp4", vec![1u8]);
        assert_eq!(no_ext.stem(), "intro");
    }

    #[test]
    fn test_clone_shares_payload() {
        let file = MediaFile::new("a.jpg", "image/jpeg", vec![0u8; 1024]);
        let copy = file.clone();
        assert_eq!(file.data, copy.data);
        assert_eq!(file.len(), 1024);
        assert!(!file.is_empty());
    }
}
