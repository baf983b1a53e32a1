//! # GOLOCATE
//!
//! Go package location and struct dependency extraction for code generators.
//!
//! Given an import path and a working directory, [`core::PackageLocator`] finds the
//! directory that defines the package, honouring module files, the module cache,
//! the standard library root, the legacy GOPATH workspace and `vendor/` paths.
//!
//! On top of it, [`core::TypeGraphBuilder`] walks struct types from a seed type through
//! their exported fields and produces an ordered, deduplicated list of definitions
//! suitable for emitting serialization schemas.

pub mod core;
pub mod error;
pub mod formatters;
pub mod parsers;

pub use error::{LocateError, Result};
