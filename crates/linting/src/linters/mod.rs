// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Built-in linters

mod field;
mod filters;
mod index;
mod namespace;
mod projection;

pub use field::FieldCheckingLinter;
pub use filters::NotUsingFiltersLinter;
pub use index::IndexCheckingLinter;
pub use namespace::NamespaceCheckingLinter;
pub use projection::InvalidProjectionLinter;
