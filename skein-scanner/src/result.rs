use crate::error::FetchError;
use serde::{Deserialize, Serialize};

/// What a fetcher hands back for a node it could load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<K> {
    pub content: String,
    #[serde(default = "Vec::new")]
    pub links: Vec<K>,
}

impl<K> Page<K> {
    pub fn new(content: impl Into<String>, links: Vec<K>) -> Self {
        Self {
            content: content.into(),
            links,
        }
    }
}

/// Final outcome of fetching one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitRecord<K> {
    pub content: String,
    pub links: Vec<K>,
    pub error: Option<FetchError>,
}

impl<K> VisitRecord<K> {
    pub fn fetched(page: Page<K>) -> Self {
        Self {
            content: page.content,
            links: page.links,
            error: None,
        }
    }

    /// A failed record never carries links.
    pub fn failed(error: FetchError) -> Self {
        Self {
            content: String::new(),
            links: Vec::new(),
            error: Some(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

impl<K> From<Result<Page<K>, FetchError>> for VisitRecord<K> {
    fn from(outcome: Result<Page<K>, FetchError>) -> Self {
        match outcome {
            Ok(page) => Self::fetched(page),
            Err(e) => Self::failed(e),
        }
    }
}

/// Tracker entry for a claimed node. Absent ids are simply not in the map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisitState<K> {
    /// Claimed, fetch still in flight.
    Pending,
    Done(VisitRecord<K>),
}

impl<K> VisitState<K> {
    pub fn record(&self) -> Option<&VisitRecord<K>> {
        match self {
            VisitState::Pending => None,
            VisitState::Done(record) => Some(record),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, VisitState::Pending)
    }
}
