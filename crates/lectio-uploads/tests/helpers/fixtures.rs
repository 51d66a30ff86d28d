//! Sample media payloads.
//!
//! The pipeline tests stub out the codecs, so payload bytes only need to be
//! recognizable, not decodable.

use bytes::Bytes;
use lectio_core::MediaFile;

pub fn image_file(name: &str) -> MediaFile {
    MediaFile::new(
        name,
        "image/png",
        Bytes::from_static(b"\x89PNG\r\n\x1a\n fake image payload"),
    )
}

pub fn video_file(name: &str) -> MediaFile {
    MediaFile::new(
        name,
        "video/mp4",
        Bytes::from_static(b"\x00\x00\x00\x18ftypmp42 fake video payload"),
    )
}

pub fn document_file(name: &str) -> MediaFile {
    MediaFile::new(
        name,
        "application/pdf",
        Bytes::from_static(b"%PDF-1.4 fake document payload"),
    )
}
