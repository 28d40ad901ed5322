// Copyright (C) 2023 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

use std::{io, path::PathBuf};

use messaggero_http::ValidationError;
use strum_macros::AsRefStr;
use thiserror::Error;

#[derive(Debug, AsRefStr, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The file to download doesn't exist or can't be opened for reading.
    #[error("file \"{}\" does not exist or is not readable", .0.display())]
    InvalidFilePath(PathBuf),

    /// The size or modification time of the file couldn't be determined.
    #[error("could not stat \"{}\"", .0.display())]
    StatResourceUnavailable(PathBuf),

    /// The file changed on disk after its headers were computed, so the body
    /// can't match the announced `Content-Length`.
    #[error("\"{}\" changed while it was being sent", .0.display())]
    ResourceChanged(PathBuf),

    #[error(transparent)]
    Sequence(#[from] SequenceViolation),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// An operation was performed in an order that isn't allowed. This is always
/// a programming error in the application.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, AsRefStr, Error)]
pub enum SequenceViolation {
    /// `send()` was called on a response that was already sent.
    #[error("the response has already been sent")]
    AlreadySent,

    /// The transport flushed the head of the response before `send()`.
    #[error("the headers have already been sent by the transport")]
    HeadersAlreadySent,

    /// An uploaded file can be moved only once.
    #[error("the uploaded file has already been moved")]
    FileAlreadyMoved,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
