// Copyright (C) 2023 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

//! This crate contains the utilities for describing resources that are served
//! or received over HTTP: media types by extension and by content.

pub mod magic;
pub mod media_type;

pub use media_type::*;
