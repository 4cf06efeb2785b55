//! Source acquisition, workspace lifecycle, and corpus aggregation.
//!
//! This crate provides:
//! - [`SourceAcquirer`]: resolves a [`SourceDescriptor`](askctx_shared::SourceDescriptor)
//!   to an aggregation root, cloning remote repositories into a [`Workspace`]
//! - [`RepositoryCloner`] / [`GitCloner`]: the clone seam and its git implementation
//! - [`aggregate`]: deterministic concatenation of selected files

pub mod acquire;
pub mod aggregate;
pub mod clone;
pub mod workspace;

pub use acquire::{AcquiredSource, SourceAcquirer};
pub use aggregate::{FileSelector, aggregate};
pub use clone::{CloneProgress, GitCloner, RepositoryCloner, SilentCloneProgress};
pub use workspace::Workspace;
