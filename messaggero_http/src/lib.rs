// Copyright (C) 2023 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

//! This crate contains the HTTP primitives shared by requests and responses:
//! header names and maps, cookies, URLs, methods, status codes, versions,
//! byte ranges and content negotiation.

pub mod abnf;
pub mod cookie;
pub mod date;
pub mod error;
pub mod header_map;
pub mod header_name;
pub mod header_value;
pub mod method;
pub mod range;
pub mod sink;
pub mod status;
pub mod syntax;
pub mod url;
pub mod version;

pub use cookie::*;
pub use error::*;
pub use header_map::*;
pub use header_name::*;
pub use header_value::*;
pub use method::*;
pub use range::*;
pub use sink::*;
pub use status::*;
pub use url::*;
pub use version::*;
