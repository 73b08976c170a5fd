//! Shared plumbing for the fen binaries.

pub mod common;
