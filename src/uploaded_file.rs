// Copyright (C) 2023 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

use std::{
    cell::OnceCell,
    io::{self, Read},
    path::{Path, PathBuf},
};

use indexmap::IndexMap;
use messaggero_resources::{magic::SNIFF_LENGTH, MediaType};
use strum_macros::AsRefStr;
use tracing::debug;

use crate::{
    environment::{RawUpload, UploadValue},
    error::{Result, SequenceViolation},
};

/// The status of an upload, as reported by the gateway.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, AsRefStr)]
pub enum UploadError {
    None,
    /// Larger than the maximum the server allows.
    IniSize,
    /// Larger than the maximum the form allows.
    FormSize,
    Partial,
    NoFile,
    NoTmpDir,
    CantWrite,
    /// Stopped by a server extension.
    Extension,
    Unknown(u16),
}

impl UploadError {
    pub fn from_code(code: u16) -> Self {
        match code {
            0 => Self::None,
            1 => Self::IniSize,
            2 => Self::FormSize,
            3 => Self::Partial,
            4 => Self::NoFile,
            6 => Self::NoTmpDir,
            7 => Self::CantWrite,
            8 => Self::Extension,
            code => Self::Unknown(code),
        }
    }
}

#[derive(Clone, Debug)]
pub struct UploadedFile {
    client_name: String,
    client_media_type: String,
    path: PathBuf,
    error: UploadError,
    size: u64,
    moved: bool,
    sniffed_media_type: OnceCell<MediaType>,
}

impl UploadedFile {
    pub fn new(client_name: &str, client_media_type: &str, temp_path: impl Into<PathBuf>, error: UploadError, size: u64) -> Self {
        Self {
            client_name: client_name.to_owned(),
            client_media_type: client_media_type.to_owned(),
            path: temp_path.into(),
            error,
            size,
            moved: false,
            sniffed_media_type: OnceCell::new(),
        }
    }

    /// The file name on the machine of the client. Never trust this.
    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    /// The media type the client claimed. Never trust this.
    pub fn client_media_type(&self) -> &str {
        &self.client_media_type
    }

    /// Where the file is now: the temporary path, or the destination after
    /// [`UploadedFile::move_to`].
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn error(&self) -> UploadError {
        self.error
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn is_valid(&self) -> bool {
        self.error == UploadError::None
    }

    pub fn is_moved(&self) -> bool {
        self.moved
    }

    /// The media type determined from the contents of the file, falling back
    /// to the extension of the client name.
    pub fn sniffed_media_type(&self) -> &MediaType {
        self.sniffed_media_type.get_or_init(|| {
            let mut prefix = [0; SNIFF_LENGTH];
            let length = read_prefix(&self.path, &mut prefix).unwrap_or(0);
            MediaType::sniff(&prefix[..length], &self.client_name)
        })
    }

    /// The extension belonging to the sniffed media type, or otherwise the
    /// extension the client sent.
    pub fn extension(&self) -> Option<String> {
        if let Some(extension) = self.sniffed_media_type().preferred_extension() {
            return Some(extension.to_owned());
        }

        Path::new(&self.client_name)
            .extension()
            .and_then(|extension| extension.to_str())
            .map(str::to_ascii_lowercase)
    }

    /// Moves the file out of the temporary directory. This can only be done
    /// once.
    pub async fn move_to(&mut self, destination: impl AsRef<Path>) -> Result<()> {
        if self.moved {
            return Err(SequenceViolation::FileAlreadyMoved.into());
        }

        let destination = destination.as_ref();
        if tokio::fs::rename(&self.path, destination).await.is_err() {
            // Renaming fails across filesystems.
            tokio::fs::copy(&self.path, destination).await?;
            tokio::fs::remove_file(&self.path).await?;
        }

        debug!("Moved upload \"{}\" from {} to {}", self.client_name, self.path.display(), destination.display());
        self.path = destination.to_path_buf();
        self.moved = true;
        Ok(())
    }
}

fn read_prefix(path: &Path, buffer: &mut [u8]) -> io::Result<usize> {
    let mut file = std::fs::File::open(path)?;
    let mut length = 0;
    while length < buffer.len() {
        let read = file.read(&mut buffer[length..])?;
        if read == 0 {
            break;
        }
        length += read;
    }
    Ok(length)
}

/// The uploads of one form field. Fields named `file[]` or `file[a][b]`
/// produce nested trees, with a [`UploadedFileTree::File`] at every leaf.
#[derive(Clone, Debug)]
pub enum UploadedFileTree {
    File(UploadedFile),
    Nested(IndexMap<String, UploadedFileTree>),
}

impl UploadedFileTree {
    /// Builds the tree from the five parallel trees of the gateway.
    pub fn from_raw(raw: &RawUpload) -> Self {
        walk(Some(&raw.name), Some(&raw.media_type), Some(&raw.tmp_name), Some(&raw.error), Some(&raw.size))
    }

    pub fn as_file(&self) -> Option<&UploadedFile> {
        match self {
            Self::File(file) => Some(file),
            Self::Nested(_) => None,
        }
    }

    pub fn as_file_mut(&mut self) -> Option<&mut UploadedFile> {
        match self {
            Self::File(file) => Some(file),
            Self::Nested(_) => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&UploadedFileTree> {
        match self {
            Self::File(_) => None,
            Self::Nested(children) => children.get(key),
        }
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut UploadedFileTree> {
        match self {
            Self::File(_) => None,
            Self::Nested(children) => children.get_mut(key),
        }
    }

    /// Every file in the tree, depth-first.
    pub fn files(&self) -> Vec<&UploadedFile> {
        match self {
            Self::File(file) => vec![file],
            Self::Nested(children) => children.values().flat_map(UploadedFileTree::files).collect(),
        }
    }
}

fn walk(
    name: Option<&UploadValue>,
    media_type: Option<&UploadValue>,
    tmp_name: Option<&UploadValue>,
    error: Option<&UploadValue>,
    size: Option<&UploadValue>,
) -> UploadedFileTree {
    match name {
        Some(UploadValue::Nested(children)) => UploadedFileTree::Nested(
            children.iter()
                .map(|(key, child)| {
                    let tree = walk(
                        Some(child),
                        child_of(media_type, key),
                        child_of(tmp_name, key),
                        child_of(error, key),
                        child_of(size, key),
                    );
                    (key.clone(), tree)
                })
                .collect()
        ),
        name => UploadedFileTree::File(UploadedFile::new(
            scalar(name),
            scalar(media_type),
            scalar(tmp_name),
            UploadError::from_code(scalar(error).trim().parse().unwrap_or(0)),
            scalar(size).trim().parse().unwrap_or(0),
        )),
    }
}

fn child_of<'a>(value: Option<&'a UploadValue>, key: &str) -> Option<&'a UploadValue> {
    match value {
        Some(UploadValue::Nested(children)) => children.get(key),
        _ => None,
    }
}

fn scalar(value: Option<&UploadValue>) -> &str {
    match value {
        Some(UploadValue::Scalar(value)) => value,
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;

    use crate::Error;

    fn nested(entries: &[(&str, UploadValue)]) -> UploadValue {
        UploadValue::Nested(entries.iter().map(|(key, value)| (key.to_string(), value.clone())).collect())
    }

    #[test]
    fn test_single_file() {
        let tree = UploadedFileTree::from_raw(&RawUpload::single("cat.png", "image/png", "/tmp/php1", 0, 120));
        let file = tree.as_file().unwrap();
        assert_eq!(file.client_name(), "cat.png");
        assert_eq!(file.client_media_type(), "image/png");
        assert_eq!(file.path(), Path::new("/tmp/php1"));
        assert_eq!(file.size(), 120);
        assert!(file.is_valid());
    }

    #[test]
    fn test_nested_tree() {
        // <input type="file" name="docs[a][]"> twice and <input type="file" name="docs[b]">
        let raw = RawUpload {
            name: nested(&[("a", nested(&[("0", "x.txt".into()), ("1", "y.txt".into())])), ("b", "z.pdf".into())]),
            media_type: nested(&[("a", nested(&[("0", "text/plain".into()), ("1", "text/plain".into())])), ("b", "application/pdf".into())]),
            tmp_name: nested(&[("a", nested(&[("0", "/tmp/1".into()), ("1", "/tmp/2".into())])), ("b", "/tmp/3".into())]),
            error: nested(&[("a", nested(&[("0", "0".into()), ("1", "3".into())])), ("b", "4".into())]),
            size: nested(&[("a", nested(&[("0", "10".into()), ("1", "20".into())])), ("b", "0".into())]),
        };

        let tree = UploadedFileTree::from_raw(&raw);
        let second = tree.get("a").and_then(|a| a.get("1")).and_then(UploadedFileTree::as_file).unwrap();
        assert_eq!(second.client_name(), "y.txt");
        assert_eq!(second.path(), Path::new("/tmp/2"));
        assert_eq!(second.error(), UploadError::Partial);
        assert_eq!(second.size(), 20);

        let b = tree.get("b").and_then(UploadedFileTree::as_file).unwrap();
        assert_eq!(b.error(), UploadError::NoFile);

        let names: Vec<&str> = tree.files().iter().map(|file| file.client_name()).collect();
        assert_eq!(names, ["x.txt", "y.txt", "z.pdf"]);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(UploadError::from_code(0), UploadError::None);
        assert_eq!(UploadError::from_code(1), UploadError::IniSize);
        assert_eq!(UploadError::from_code(8), UploadError::Extension);
        assert_eq!(UploadError::from_code(5), UploadError::Unknown(5));
    }

    #[test]
    fn test_sniffed_media_type() {
        let mut temp = tempfile::NamedTempFile::new().unwrap();
        temp.write_all(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0]).unwrap();

        // The client claims it's a text file.
        let file = UploadedFile::new("notes.txt", "text/plain", temp.path(), UploadError::None, 12);
        assert_eq!(file.sniffed_media_type(), &MediaType::PNG);
        assert_eq!(file.extension().as_deref(), Some("png"));
    }

    #[test]
    fn test_sniff_falls_back_to_client_name() {
        let file = UploadedFile::new("report.PDF", "application/pdf", "/nonexistent/upload", UploadError::None, 0);
        assert_eq!(file.sniffed_media_type(), &MediaType::PDF);
    }

    #[tokio::test]
    async fn test_move_once() {
        let directory = tempfile::tempdir().unwrap();
        let source = directory.path().join("upload.tmp");
        std::fs::write(&source, b"contents").unwrap();

        let mut file = UploadedFile::new("a.txt", "text/plain", &source, UploadError::None, 8);
        let destination = directory.path().join("a.txt");
        file.move_to(&destination).await.unwrap();

        assert!(file.is_moved());
        assert_eq!(file.path(), destination);
        assert!(!source.exists());
        assert_eq!(std::fs::read(&destination).unwrap(), b"contents");

        let again = file.move_to(directory.path().join("b.txt")).await;
        assert!(matches!(again, Err(Error::Sequence(SequenceViolation::FileAlreadyMoved))));
    }
}
