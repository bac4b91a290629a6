//! tvm installer library.
//!
//! This crate resolves which release of a tool a project requires, verifies
//! the downloaded archive against the published checksums, and extracts it
//! under a per-version install directory. It is used by the `tvm` CLI binary
//! and can be consumed programmatically for testing or custom workflows.
//!
//! # Modules
//!
//! - [`catalog`] - Release listing and asset lookup
//! - [`checksum`] - SHA-256 digests and checksum manifests
//! - [`cli`] - Command-line argument definitions
//! - [`config`] - Paths, platform, and policies threaded through the pipeline
//! - [`dirs`] - Directory resolution abstraction for platform-specific paths
//! - [`download`] - HTTP retrieval seam
//! - [`error`] - Semantic error types for each pipeline stage
//! - [`extraction`] - Hardened zip and tar.gz extraction
//! - [`install`] - Download, verify, and extract one resolved version
//! - [`manager`] - Operations exposed by the binary
//! - [`output`] - Output formatting for command results
//! - [`platform`] - Release operating system and architecture
//! - [`resolver`] - Source precedence and version selection
//! - [`sources`] - Places a version requirement can come from
//! - [`verification`] - Checksum verification policy

pub mod catalog;
pub mod checksum;
pub mod cli;
pub mod config;
pub mod dirs;
pub mod download;
pub mod error;
pub mod extraction;
pub mod install;
pub mod manager;
pub mod output;
pub mod platform;
pub mod resolver;
pub mod sources;
pub mod verification;

#[cfg(test)]
mod test_utils;
