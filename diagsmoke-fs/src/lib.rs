//! Filesystem abstraction for diagsmoke.
//!
//! This crate provides:
//! - Filesystem trait for reads, file checks and atomic writes
//! - RealFilesystem backed by `std::fs`
//! - MockFilesystem, an in-memory implementation for tests

pub mod filesystem;

pub use filesystem::{Filesystem, FsError, MockFilesystem, RealFilesystem};
