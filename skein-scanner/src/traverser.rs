use crate::fetcher::Fetcher;
use crate::result::VisitRecord;
use crate::tracker::{Snapshot, VisitTracker};
use futures::FutureExt;
use futures::future::BoxFuture;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Anything usable as a graph node key.
pub trait NodeId: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T> NodeId for T where T: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

/// Called with the node id and its remaining depth budget each time a node is claimed.
pub type ProgressCallback<K> = Arc<dyn Fn(&K, usize) + Send + Sync>;

/// Depth-bounded, deduplicated, concurrent graph walker.
///
/// Each claimed node spawns one tokio task per outbound link and waits for
/// every one of them before its own call returns, so the outermost
/// [`traverse`](Self::traverse) finishes only after the whole reachable
/// subgraph has been visited.
pub struct Traverser<K> {
    fetcher: Arc<dyn Fetcher<K>>,
    progress_callback: Option<ProgressCallback<K>>,
    fetch_limit: Option<Arc<Semaphore>>,
}

impl<K> Clone for Traverser<K> {
    fn clone(&self) -> Self {
        Self {
            fetcher: self.fetcher.clone(),
            progress_callback: self.progress_callback.clone(),
            fetch_limit: self.fetch_limit.clone(),
        }
    }
}

impl<K: NodeId> Traverser<K> {
    pub fn new(fetcher: Arc<dyn Fetcher<K>>) -> Self {
        Self {
            fetcher,
            progress_callback: None,
            fetch_limit: None,
        }
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback<K>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Caps how many fetches run at once. Zero means unbounded.
    ///
    /// Only the fetch itself holds a permit; spawning and joining children
    /// do not, so a parent waiting on its children never starves them.
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.fetch_limit = (max_in_flight > 0).then(|| Arc::new(Semaphore::new(max_in_flight)));
        self
    }

    /// Walks from `root` with a fresh tracker and returns everything visited.
    pub async fn run(&self, root: K, max_depth: usize) -> Snapshot<K> {
        info!("Starting traversal of {:?} with depth {}", root, max_depth);
        let started = Instant::now();

        let tracker = Arc::new(VisitTracker::new());
        let root_task = tokio::spawn(self.traverse(root.clone(), max_depth, tracker.clone()));
        if let Err(e) = root_task.await {
            warn!("Traversal of {:?} ended abnormally: {}", root, e);
        }
        let snapshot = tracker.snapshot();

        info!(
            "Traversal complete. Visited {} nodes in {:?}",
            snapshot.len(),
            started.elapsed()
        );
        snapshot
    }

    /// Visits `id` with the given depth budget against a shared tracker.
    ///
    /// Returns once `id` and every descendant this call spawned are done.
    pub fn traverse(
        &self,
        id: K,
        depth: usize,
        tracker: Arc<VisitTracker<K>>,
    ) -> BoxFuture<'static, ()> {
        let this = self.clone();

        async move {
            if depth == 0 {
                debug!("Depth budget exhausted at {:?}", id);
                return;
            }

            if !tracker.try_claim(&id) {
                debug!("{:?} already claimed", id);
                return;
            }

            debug!("Claimed {:?} (depth {})", id, depth);
            if let Some(ref callback) = this.progress_callback {
                callback(&id, depth);
            }

            let outcome = {
                let _permit = match this.fetch_limit {
                    Some(ref limit) => limit.clone().acquire_owned().await.ok(),
                    None => None,
                };
                this.fetcher.fetch(&id).await
            };

            if let Err(ref e) = outcome {
                warn!("Fetch failed for {:?}: {}", id, e);
            }

            let record = VisitRecord::from(outcome);
            let links = if record.is_ok() {
                record.links.clone()
            } else {
                Vec::new()
            };
            tracker.finalize(id.clone(), record);

            let children: Vec<JoinHandle<()>> = links
                .into_iter()
                .map(|child| tokio::spawn(this.traverse(child, depth - 1, tracker.clone())))
                .collect();

            for child in children {
                if let Err(e) = child.await {
                    warn!("Sub-traversal under {:?} ended abnormally: {}", id, e);
                }
            }
        }
        .boxed()
    }
}

/// Walks from `root` up to `max_depth` links away using `fetcher`.
///
/// A depth of 0 visits nothing; a depth of 1 fetches only `root`.
pub async fn traverse<K: NodeId>(
    root: K,
    max_depth: usize,
    fetcher: Arc<dyn Fetcher<K>>,
) -> Snapshot<K> {
    Traverser::new(fetcher).run(root, max_depth).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::StaticFetcher;

    fn chain() -> Arc<dyn Fetcher<String>> {
        Arc::new(
            StaticFetcher::new()
                .with_page("a", "A", ["b"])
                .with_page("b", "B", ["c"])
                .with_page("c", "C", Vec::<String>::new()),
        )
    }

    #[tokio::test]
    async fn test_zero_depth_visits_nothing() {
        let snapshot = traverse("a".to_string(), 0, chain()).await;
        assert!(snapshot.is_empty());
    }

    #[tokio::test]
    async fn test_depth_counts_nodes_along_chain() {
        for depth in 1..=3 {
            let snapshot = traverse("a".to_string(), depth, chain()).await;
            assert_eq!(snapshot.len(), depth);
        }
        let snapshot = traverse("a".to_string(), 10, chain()).await;
        assert_eq!(snapshot.len(), 3);
        assert!(snapshot.is_complete());
    }

    #[tokio::test]
    async fn test_shared_tracker_skips_known_nodes() {
        let traverser = Traverser::new(chain());
        let tracker = Arc::new(VisitTracker::new());
        tracker.try_claim(&"b".to_string());

        traverser.traverse("a".to_string(), 5, tracker.clone()).await;

        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.get(&"b".to_string()).unwrap().is_pending());
        assert!(!snapshot.contains(&"c".to_string()));
    }

    #[tokio::test]
    async fn test_zero_max_in_flight_is_unbounded() {
        let traverser = Traverser::new(chain()).with_max_in_flight(0);
        assert!(traverser.fetch_limit.is_none());
        assert_eq!(traverser.run("a".to_string(), 3).await.len(), 3);
    }
}
