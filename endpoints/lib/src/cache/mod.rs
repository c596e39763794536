//! Response caching.
//!
//! The transport stores successful responses in a [`CacheStore`]; the
//! executor reads them back for cache-first policies and for the offline
//! fallback. [`MemoryCache`] is the in-process store sessions use by default.

pub(crate) mod memory;

use std::time::SystemTime;

use bytes::Bytes;

use crate::response::ResponseMetadata;
use crate::transport::RequestKey;

pub use memory::MemoryCache;

/// How a request may use stored responses.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(serialize_all = "kebab-case")]
pub enum CachePolicy {
    /// Load from origin; store the response if it is cacheable.
    #[default]
    Normal,
    /// Always load from origin, ignoring stored responses.
    ReloadIgnoringCache,
    /// Use a stored response if there is one, otherwise load from origin.
    ReturnCacheElseLoad,
    /// Use a stored response; never touch the network.
    ReturnCacheOnly,
}

impl CachePolicy {
    /// Returns `true` if this policy may read stored responses before
    /// going to the network.
    pub fn reads_cache_first(&self) -> bool {
        matches!(self, Self::ReturnCacheElseLoad | Self::ReturnCacheOnly)
    }

    /// Returns `true` if this policy may perform a network exchange.
    pub fn allows_network(&self) -> bool {
        !matches!(self, Self::ReturnCacheOnly)
    }
}

/// A stored response.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedResponse {
    pub metadata: ResponseMetadata,
    pub body: Bytes,
    pub stored_at: SystemTime,
}

impl CachedResponse {
    pub fn new(metadata: ResponseMetadata, body: Bytes) -> Self {
        Self {
            metadata,
            body,
            stored_at: SystemTime::now(),
        }
    }
}

/// Shared storage of responses keyed by request.
///
/// Implementations are shared between the transport (writer) and the
/// executor (reader) and must be safe to use from any thread.
pub trait CacheStore: Send + Sync {
    fn lookup(&self, key: &RequestKey) -> Option<CachedResponse>;

    fn store(&self, key: RequestKey, response: CachedResponse);

    fn remove(&self, key: &RequestKey) -> Option<CachedResponse>;

    fn clear(&self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
