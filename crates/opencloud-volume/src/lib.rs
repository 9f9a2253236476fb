//! Block storage client and data models for OpenStack/Rackspace clouds.
//!
//! Provides strongly typed models and an asynchronous service wrapper for the
//! Cinder v1 API: volumes, volume types and snapshots.

#![deny(missing_docs)]

pub mod client;
pub mod models;

pub use client::VolumeService;
pub use models::{
    Snapshot, SnapshotListParams, Volume, VolumeAttachment, VolumeListParams, VolumeType,
};

/// Convenient result alias using the shared OpenCloud error type.
pub type Result<T> = opencloud_core::Result<T>;
