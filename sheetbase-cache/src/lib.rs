//! Document cache with ordered write-back.
//!
//! A [`DocumentCache`] owns the in-memory copy of one partition's document.
//! It fetches the document lazily, at most once, and serves every read from
//! memory. Writes update memory immediately and are uploaded by a single
//! background worker, one full-document save at a time, in the order the
//! writes happened.
//!
//! Fetch and save failures never reach callers. A failed fetch installs the
//! schema's fallback document; a failed save is dropped. Both are reported to
//! registered [`CacheObserver`]s as [`CacheEvent`]s.
//!
//! # Example
//!
//! ```ignore
//! let cache = DocumentCache::builder(Arc::new(endpoint))
//!     .with_partition(PartitionKey::new("spring-fair")?)
//!     .with_observer(|event: &CacheEvent| eprintln!("{event:?}"))
//!     .build()?;
//!
//! let events = cache.get("events", json!([])).await;
//! cache.set("events", json!([{ "title": "Bake sale" }])).await;
//! cache.flush().await?;
//! ```

pub mod cache;
pub mod observer;
mod queue;

pub use cache::{DocumentCache, DocumentCacheBuilder};
pub use observer::{CacheObserver, ChannelObserver};
pub use sheetbase_core::{CacheEvent, CacheState};
