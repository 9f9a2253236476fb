//! Compute client and data models for OpenStack/Rackspace clouds.
//!
//! Provides strongly typed models and an asynchronous service wrapper for the
//! Nova v2 API: servers, flavors and images.

#![deny(missing_docs)]

pub mod client;
pub mod models;

pub use client::ComputeService;
pub use models::{
    Address, BandwidthUsage, Flavor, FlavorListParams, Image, ImageListParams, ResourceRef,
    Server, ServerListParams,
};
pub use opencloud_core::Link;

/// Convenient result alias using the shared OpenCloud error type.
pub type Result<T> = opencloud_core::Result<T>;
