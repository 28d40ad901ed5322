// Copyright (C) 2023 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

//! Parsers for the values of specific header fields.

pub mod lists;

pub use lists::*;
