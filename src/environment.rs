// Copyright (C) 2023 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

//! The already decoded input of a request, as provided by the gateway
//! (CGI, FastCGI or an embedding server) that sits in front of this library.

use indexmap::IndexMap;

/// One slot of an upload table. Form fields named like `file[a][]` nest, so
/// every property of an upload is a tree with the same shape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UploadValue {
    Scalar(String),
    Nested(IndexMap<String, UploadValue>),
}

impl From<&str> for UploadValue {
    fn from(value: &str) -> Self {
        Self::Scalar(value.to_owned())
    }
}

impl From<String> for UploadValue {
    fn from(value: String) -> Self {
        Self::Scalar(value)
    }
}

/// The upload table of a single form field: five parallel trees that
/// describe the files uploaded under that field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawUpload {
    /// The file name the client sent.
    pub name: UploadValue,

    /// The media type the client claimed.
    pub media_type: UploadValue,

    /// Where the gateway stored the file.
    pub tmp_name: UploadValue,

    /// The numeric upload error code.
    pub error: UploadValue,

    /// The size in bytes.
    pub size: UploadValue,
}

impl RawUpload {
    /// The upload table of a field carrying a single file.
    pub fn single(name: &str, media_type: &str, tmp_name: &str, error: u8, size: u64) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            tmp_name: tmp_name.into(),
            error: error.to_string().into(),
            size: size.to_string().into(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Environment {
    /// Server variables (`REQUEST_METHOD`, `HTTP_HOST`, `HTTPS`, ...).
    pub server: IndexMap<String, String>,

    /// The decoded query string.
    pub query: IndexMap<String, String>,

    /// The decoded form body.
    pub post: IndexMap<String, String>,

    /// Cookies the gateway already decoded.
    pub cookies: IndexMap<String, String>,

    /// Uploaded files, keyed by form field name.
    pub files: IndexMap<String, RawUpload>,

    /// The raw request body.
    pub body: Vec<u8>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_server(mut self, key: &str, value: &str) -> Self {
        self.server.insert(key.to_owned(), value.to_owned());
        self
    }

    /// Adds a request header in the CGI form: `Accept-Language` is stored as
    /// `HTTP_ACCEPT_LANGUAGE`.
    #[must_use]
    pub fn with_header(self, name: &str, value: &str) -> Self {
        let key = format!("HTTP_{}", name.to_ascii_uppercase().replace('-', "_"));
        self.with_server(&key, value)
    }

    #[must_use]
    pub fn with_query(mut self, key: &str, value: &str) -> Self {
        self.query.insert(key.to_owned(), value.to_owned());
        self
    }

    #[must_use]
    pub fn with_post(mut self, key: &str, value: &str) -> Self {
        self.post.insert(key.to_owned(), value.to_owned());
        self
    }

    #[must_use]
    pub fn with_cookie(mut self, name: &str, value: &str) -> Self {
        self.cookies.insert(name.to_owned(), value.to_owned());
        self
    }

    #[must_use]
    pub fn with_upload(mut self, field: &str, upload: RawUpload) -> Self {
        self.files.insert(field.to_owned(), upload);
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn server_value(&self, key: &str) -> Option<&str> {
        self.server.get(key).map(String::as_str)
    }
}
