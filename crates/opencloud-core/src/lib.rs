//! # opencloud-core
//!
//! Core types and utilities for talking to OpenStack and Rackspace compatible clouds.
//!
//! This crate resolves regional endpoints from an authenticated service catalog,
//! builds request URLs against them and decodes paginated JSON listings into typed
//! collections. Concrete services (compute, volumes) live in their own crates and
//! wrap [`service::Service`].
//!
//! ## Modules
//!
//! - [`error`] - Error types and HTTP status code mapping
//! - [`ids`] - Strongly-typed identifier wrappers for cloud resources
//! - [`types`] - URL types, region defaults and other shared vocabulary
//! - [`config`] - Configuration structures for cloud clients
//! - [`catalog`] - Service catalog model and endpoint lookup
//! - [`endpoint`] - Public/private base URL pair selected for a service
//! - [`client`] - HTTP client abstraction and the reqwest-backed implementation
//! - [`service`] - Service base shared by every concrete REST wrapper
//! - [`collection`] - Page-aware resource collections
//! - [`resource`] - Resource trait and the generic key/value record
//! - [`query`] - Query parameter builder

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod catalog;
pub mod client;
pub mod collection;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod ids;
pub mod query;
pub mod resource;
pub mod service;
pub mod types;

// Re-export commonly used types
pub use catalog::{find_endpoint, CatalogEndpoint, CatalogEntry, EndpointQuery, ServiceCatalog};
pub use client::{Authenticator, CloudClient, HttpClient, HttpClientBuilder, Session};
pub use collection::Collection;
pub use endpoint::Endpoint;
pub use error::{Error, Result};
pub use resource::{Link, Record, Resource};
pub use service::{Extension, Limits, Service};
pub use types::UrlType;
