//! Linode provider for FleetScale
//!
//! This crate implements the CloudProvider trait for Linode using the
//! Linode API v4 directly.
//!
//! # Requirements
//!
//! - A Linode API token with read/write access to Linodes
//! - Optionally a root password for new instances
//!
//! # Example
//!
//! ```ignore
//! use fleetscale_cloud::CloudProvider;
//! use fleetscale_cloud_linode::{LinodeApi, LinodeProvider};
//!
//! let provider = LinodeProvider::new(LinodeApi::new(token))
//!     .with_root_pass(root_pass)
//!     .with_check_mode(false);
//!
//! let auth = provider.check_auth().await?;
//! if !auth.authenticated {
//!     panic!("Not authenticated: {:?}", auth.error);
//! }
//! ```

pub mod api;
pub mod error;
pub mod provider;

pub use api::{LINODE_API_BASE, LinodeApi, LinodeInstance, Profile};
pub use error::{LinodeError, Result};
pub use provider::LinodeProvider;
