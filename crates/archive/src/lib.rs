//! Product archive access.
//!
//! The pipeline only needs two things from an archive: list the products
//! of a collection inside a time window, and open one named entry of a
//! product as a byte stream. [`Archive`] is that seam; [`DataStoreClient`]
//! implements it against the EUMETSAT Data Store REST API.

pub mod datastore;
pub mod error;

pub use datastore::{Credentials, DataStoreClient, DataStoreConfig};
pub use error::{ArchiveError, ArchiveResult};

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use sat_common::TimeWindow;
use serde::{Deserialize, Serialize};

/// Streamed entry content.
pub type ByteStream = BoxStream<'static, ArchiveResult<Bytes>>;

/// A product found by a search, with the names of its entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateProduct {
    pub product_id: String,
    pub collection_id: String,
    pub entries: Vec<String>,
}

/// Trait for archives that can list products and open their entries.
#[async_trait]
pub trait Archive: Send + Sync {
    /// Products whose sensing time falls in `window`, in archive order
    /// (newest first). With a `limit`, at most that many are listed.
    async fn search(&self, window: &TimeWindow, limit: Option<usize>) -> ArchiveResult<Vec<CandidateProduct>>;

    /// Open one entry of a product for streaming.
    async fn open(&self, product: &CandidateProduct, entry: &str) -> ArchiveResult<ByteStream>;
}
