use std::sync::Arc;

use chrono::Utc;

use crate::catalog::{Book, BookDraft, BookPatch, CatalogError, CatalogStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchStatus {
    Pending,
    Processing,
    Done(BookDraft),
    Error(String),
}

impl BatchStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Done(_) => "done",
            Self::Error(_) => "error",
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Done(_) | Self::Error(_))
    }
}

/// Result of running one item through identification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    Done(BookDraft),
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct BatchItem {
    pub id: String,
    pub image: Arc<[u8]>,
    pub status: BatchStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProgress {
    pub finished: usize,
    pub total: usize,
}

impl BatchProgress {
    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        ((self.finished * 100) as f64 / self.total as f64).round() as u32
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitSummary {
    pub added: usize,
    pub excluded: usize,
    pub book_ids: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("{unfinished} item(s) are still being identified")]
    CommitBlocked { unfinished: usize },

    #[error("batch item not found: {0}")]
    ItemNotFound(String),

    #[error("batch item {0} has no draft to edit")]
    NotEditable(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Captured photos waiting for identification, in capture order.
///
/// Items move `Pending -> Processing -> Done | Error`. At most one
/// collaborator call is in flight at any time, and nothing starts while the
/// review is closed.
///
/// The in-flight slot is tracked apart from the items: removing the item
/// being processed keeps the slot taken until its result comes back.
#[derive(Debug, Default)]
pub struct BatchQueue {
    items: Vec<BatchItem>,
    review_open: bool,
    in_flight: Option<String>,
}

impl BatchQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[BatchItem] {
        &self.items
    }

    pub fn item(&self, id: &str) -> Option<&BatchItem> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_review_open(&self) -> bool {
        self.review_open
    }

    pub fn enqueue(&mut self, image: impl Into<Arc<[u8]>>) -> String {
        let id = uuid::Uuid::new_v4().simple().to_string();
        self.items.push(BatchItem {
            id: id.clone(),
            image: image.into(),
            status: BatchStatus::Pending,
        });
        tracing::debug!(item_id = %id, queued = self.items.len(), "batch item queued");
        id
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.id != id);
        self.items.len() != before
    }

    pub fn open_review(&mut self) {
        self.review_open = true;
    }

    pub fn processing_count(&self) -> usize {
        self.items
            .iter()
            .filter(|i| i.status == BatchStatus::Processing)
            .count()
    }

    /// Id of the item whose collaborator call is running, even if that item
    /// has since been removed.
    pub fn in_flight(&self) -> Option<&str> {
        self.in_flight.as_deref()
    }

    /// Marks the earliest pending item as processing and hands out its image.
    pub fn begin_next(&mut self) -> Option<(String, Arc<[u8]>)> {
        if !self.review_open || self.in_flight.is_some() {
            return None;
        }
        let item = self
            .items
            .iter_mut()
            .find(|i| i.status == BatchStatus::Pending)?;
        item.status = BatchStatus::Processing;
        self.in_flight = Some(item.id.clone());
        Some((item.id.clone(), Arc::clone(&item.image)))
    }

    /// Applies an outcome to a processing item and frees the in-flight slot.
    /// Stale outcomes only free the slot and return `false`.
    pub fn finish(&mut self, id: &str, outcome: BatchOutcome) -> bool {
        if self.in_flight.as_deref() == Some(id) {
            self.in_flight = None;
        }
        let Some(item) = self
            .items
            .iter_mut()
            .find(|i| i.id == id && i.status == BatchStatus::Processing)
        else {
            return false;
        };
        item.status = match outcome {
            BatchOutcome::Done(draft) => BatchStatus::Done(draft),
            BatchOutcome::Failed(message) => BatchStatus::Error(message),
        };
        true
    }

    pub fn update_draft(&mut self, id: &str, patch: &BookPatch) -> Result<(), BatchError> {
        let item = self
            .items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| BatchError::ItemNotFound(id.to_owned()))?;
        match &mut item.status {
            BatchStatus::Done(draft) => {
                draft.apply(patch);
                Ok(())
            }
            _ => Err(BatchError::NotEditable(id.to_owned())),
        }
    }

    pub fn progress(&self) -> BatchProgress {
        BatchProgress {
            finished: self.items.iter().filter(|i| i.status.is_finished()).count(),
            total: self.items.len(),
        }
    }

    pub fn is_settled(&self) -> bool {
        self.items.iter().all(|i| i.status.is_finished())
    }

    /// Saves every finished draft with a title into `store` in one write.
    ///
    /// Error items are dropped with the queue. When nothing is committable
    /// the store and the queue are left as they are.
    pub fn commit_all(&mut self, store: &mut CatalogStore) -> Result<CommitSummary, BatchError> {
        let unfinished = self
            .items
            .iter()
            .filter(|i| !i.status.is_finished())
            .count();
        if unfinished > 0 {
            return Err(BatchError::CommitBlocked { unfinished });
        }

        let fallback_shelf = store.first_shelf_id().unwrap_or_default().to_owned();
        let added_at = Utc::now();
        let books: Vec<Book> = self
            .items
            .iter()
            .filter_map(|item| match &item.status {
                BatchStatus::Done(draft) if !draft.title.trim().is_empty() => {
                    let mut draft = draft.clone();
                    if draft.shelf_id.trim().is_empty() {
                        draft.shelf_id.clone_from(&fallback_shelf);
                    }
                    draft
                        .is_committable()
                        .then(|| draft.into_book(item.id.clone(), added_at))
                }
                _ => None,
            })
            .collect();

        let excluded = self.items.len() - books.len();
        if books.is_empty() {
            tracing::info!(excluded, "nothing to commit");
            return Ok(CommitSummary {
                added: 0,
                excluded,
                book_ids: Vec::new(),
            });
        }

        let book_ids = books.iter().map(|b| b.id.clone()).collect();
        let added = store.add_books(books)?;
        self.close();

        tracing::info!(added, excluded, "batch committed");
        Ok(CommitSummary {
            added,
            excluded,
            book_ids,
        })
    }

    /// Discards every item, committed or not, and closes the review.
    pub fn close(&mut self) -> usize {
        let discarded = self.items.len();
        self.items.clear();
        self.review_open = false;
        self.in_flight = None;
        discarded
    }
}
