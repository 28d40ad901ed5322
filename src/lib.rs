// Copyright (C) 2023 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

//! The HTTP message exchange of an application: a [`Request`] derived from
//! the [`Environment`] of the gateway, and a [`Response`] written to a
//! [`Transport`], optionally serving a file with byte ranges.

pub mod authorization;
pub mod config;
pub mod csrf;
pub mod download;
pub mod environment;
pub mod error;
pub mod message;
pub mod request;
pub mod response;
pub mod session;
pub mod transport;
pub mod uploaded_file;
pub mod user_agent;

pub use authorization::{Authorization, DigestCredentials};
pub use config::{CsrfSettings, DownloadOptions, RequestSettings};
pub use csrf::AntiCsrf;
pub use download::{RangeDownload, TransferOutcome, TransferPlan};
pub use environment::{Environment, RawUpload, UploadValue};
pub use error::{Error, Result, SequenceViolation};
pub use message::{HttpMessage, Message};
pub use request::Request;
pub use response::Response;
pub use session::{ActiveSession, MemorySessionStore, SessionStore};
pub use transport::{BufferedTransport, HeaderSink, Transport};
pub use uploaded_file::{UploadError, UploadedFile, UploadedFileTree};
pub use user_agent::UserAgent;

pub use messaggero_http as http;
pub use messaggero_resources as resources;
