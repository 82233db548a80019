pub mod error;
pub mod fetcher;
pub mod result;
pub mod tracker;
pub mod traverser;

pub use error::{FetchError, ScanError};
pub use fetcher::{Fetcher, HttpFetcher, StaticFetcher};
pub use result::{Page, VisitRecord, VisitState};
pub use tracker::{Snapshot, VisitTracker};
pub use traverser::{traverse, NodeId, ProgressCallback, Traverser};
