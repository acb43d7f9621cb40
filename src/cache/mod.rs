//! Offline asset cache.
//!
//! Mirrors the policy the site's browser-side worker installs:
//!
//! - **Policy**: ordered URL-pattern rules, first match wins
//! - **Store**: per-cache-name entries with FIFO limits and max-age expiry
//! - **Worker**: dispatches requests to cache-first, stale-while-revalidate or
//!   network-first handling
//!
//! The same policy is exported as a JSON manifest for the browser worker.

pub(crate) mod lock;
mod network;
mod policy;
mod store;
mod worker;

pub use network::{AssetRequest, AssetResponse, Network, WorkerError};
pub use policy::{
    CacheManifest, CachePolicy, CacheRule, ManifestExpiration, ManifestRule, Strategy,
};
pub use store::{AssetStore, StoredAsset};
pub use worker::AssetWorker;
