// Copyright (C) 2023 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

//! File signatures ("magic numbers") used to sniff the media type of content.

use crate::MediaType;

pub const FILE_BMP_MAGIC_NUMBER: &[u8; 2] = b"BM";
pub const FILE_FLAC_MAGIC_NUMBER: &[u8; 4] = b"fLaC";
pub const FILE_GIF87A_MAGIC_NUMBER: &[u8; 6] = b"GIF87a";
pub const FILE_GIF89A_MAGIC_NUMBER: &[u8; 6] = b"GIF89a";
pub const FILE_GZIP_MAGIC_NUMBER: &[u8; 2] = &[0x1F, 0x8B];
pub const FILE_JPEG_MAGIC_NUMBER: &[u8; 3] = &[0xFF, 0xD8, 0xFF];
pub const FILE_PDF_MAGIC_NUMBER: &[u8; 5] = b"%PDF-";
pub const FILE_PNG_MAGIC_NUMBER: &[u8; 8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
pub const FILE_WASM_MAGIC_NUMBER: &[u8; 4] = &[0x00, b'a', b's', b'm'];
pub const FILE_WEBM_MAGIC_NUMBER: &[u8; 4] = &[0x1A, 0x45, 0xDF, 0xA3];
pub const FILE_ZIP_MAGIC_NUMBER: &[u8; 4] = &[b'P', b'K', 0x03, 0x04];

/// The minimum amount of bytes [`detect`] needs to recognize every signature.
pub const SNIFF_LENGTH: usize = 12;

/// Detects the media type of the given content by its signature, or `None`
/// when no known signature matches.
#[must_use]
pub fn detect(prefix: &[u8]) -> Option<&'static MediaType> {
    const SIGNATURES: &[(&[u8], &MediaType)] = &[
        (FILE_PNG_MAGIC_NUMBER, &MediaType::PNG),
        (FILE_JPEG_MAGIC_NUMBER, &MediaType::JPEG),
        (FILE_GIF87A_MAGIC_NUMBER, &MediaType::GIF),
        (FILE_GIF89A_MAGIC_NUMBER, &MediaType::GIF),
        (FILE_PDF_MAGIC_NUMBER, &MediaType::PDF),
        (FILE_ZIP_MAGIC_NUMBER, &MediaType::ZIP),
        (FILE_GZIP_MAGIC_NUMBER, &MediaType::GZIP),
        (FILE_FLAC_MAGIC_NUMBER, &MediaType::FLAC),
        (FILE_WASM_MAGIC_NUMBER, &MediaType::WASM),
        (FILE_WEBM_MAGIC_NUMBER, &MediaType::WEBM),
        (FILE_BMP_MAGIC_NUMBER, &MediaType::BMP),
    ];

    for (signature, media_type) in SIGNATURES {
        if prefix.starts_with(signature) {
            return Some(media_type);
        }
    }

    // RIFF containers carry their format at offset 8.
    if prefix.len() >= 12 && &prefix[0..4] == b"RIFF" {
        return match &prefix[8..12] {
            b"WEBP" => Some(&MediaType::WEBP),
            b"WAVE" => Some(&MediaType::WAV),
            b"AVI " => Some(&MediaType::AVI),
            _ => None,
        };
    }

    // ISO base media files start with a box size followed by `ftyp`.
    if prefix.len() >= 8 && &prefix[4..8] == b"ftyp" {
        return Some(&MediaType::MP4);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(&[0xFF, 0xD8, 0xFF, 0xE0], Some(&MediaType::JPEG))]
    #[case(b"GIF89a\x01\x00", Some(&MediaType::GIF))]
    #[case(b"%PDF-1.7\n", Some(&MediaType::PDF))]
    #[case(b"RIFF\x00\x00\x00\x00WEBPVP8 ", Some(&MediaType::WEBP))]
    #[case(b"RIFF\x00\x00\x00\x00WAVEfmt ", Some(&MediaType::WAV))]
    #[case(b"\x00\x00\x00\x18ftypmp42", Some(&MediaType::MP4))]
    #[case(b"RIFF", None)]
    #[case(b"plain text", None)]
    #[case(b"", None)]
    fn test_detect(#[case] input: &[u8], #[case] expected: Option<&MediaType>) {
        assert_eq!(detect(input), expected);
    }
}
