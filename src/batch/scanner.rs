use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;

use crate::batch::queue::{BatchError, BatchOutcome, BatchQueue, CommitSummary};
use crate::catalog::model::DEFAULT_GENRE;
use crate::catalog::{BookDraft, CatalogStore};
use crate::identify::{Identifier, is_meaningful_query};

pub const NO_BOOK_DETECTED: &str = "no book detected in image";
pub const CONNECTION_ERROR: &str = "connection error";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub processed: usize,
    pub abandoned: bool,
}

/// Drives a [`BatchQueue`] through an [`Identifier`], one item at a time.
///
/// The collaborator call for the current item races a cancellation token;
/// [`BatchScanner::close`] trips it so a late result is never applied.
pub struct BatchScanner {
    queue: Arc<Mutex<BatchQueue>>,
    identifier: Arc<dyn Identifier>,
    default_shelf_id: String,
    cancel: Mutex<CancellationToken>,
}

impl BatchScanner {
    pub fn new(identifier: Arc<dyn Identifier>, default_shelf_id: impl Into<String>) -> Self {
        Self {
            queue: Arc::new(Mutex::new(BatchQueue::new())),
            identifier,
            default_shelf_id: default_shelf_id.into(),
            cancel: Mutex::new(CancellationToken::new()),
        }
    }

    /// Shared handle for observers (progress display, tests).
    pub fn queue(&self) -> Arc<Mutex<BatchQueue>> {
        Arc::clone(&self.queue)
    }

    pub fn with_queue<R>(&self, f: impl FnOnce(&mut BatchQueue) -> R) -> R {
        f(&mut lock(&self.queue))
    }

    pub fn enqueue(&self, image: impl Into<Arc<[u8]>>) -> String {
        self.with_queue(|q| q.enqueue(image))
    }

    pub fn open_review(&self) {
        self.with_queue(BatchQueue::open_review);
    }

    /// Processes pending items in capture order until none can start.
    ///
    /// Items queued while draining are picked up by the same loop. A second
    /// concurrent call returns immediately because the queue refuses to
    /// start an item while a collaborator call is in flight, including one
    /// for an item that was removed meanwhile.
    pub async fn drain(&self) -> DrainReport {
        let mut report = DrainReport::default();
        loop {
            let token = lock(&self.cancel).clone();
            let Some((item_id, image)) = self.with_queue(BatchQueue::begin_next) else {
                break;
            };
            tracing::info!(item_id = %item_id, bytes = image.len(), "identifying batch item");

            let pipeline =
                identify_draft(self.identifier.as_ref(), &image, &self.default_shelf_id);
            let outcome = tokio::select! {
                biased;
                _ = token.cancelled() => {
                    tracing::info!(item_id = %item_id, "batch closed; abandoning in-flight item");
                    report.abandoned = true;
                    break;
                }
                outcome = pipeline => outcome,
            };

            match &outcome {
                BatchOutcome::Done(draft) => {
                    tracing::info!(item_id = %item_id, title = %draft.title, "batch item done");
                }
                BatchOutcome::Failed(message) => {
                    tracing::warn!(item_id = %item_id, message = %message, "batch item failed");
                }
            }
            if self.with_queue(|q| q.finish(&item_id, outcome)) {
                report.processed += 1;
            } else {
                tracing::debug!(item_id = %item_id, "dropping result for discarded item");
            }
        }
        report
    }

    pub fn commit_all(&self, store: &mut CatalogStore) -> Result<CommitSummary, BatchError> {
        self.with_queue(|q| q.commit_all(store))
    }

    /// Abandons the in-flight call and discards the whole queue.
    pub fn close(&self) -> usize {
        {
            let mut token = lock(&self.cancel);
            token.cancel();
            *token = CancellationToken::new();
        }
        let discarded = self.with_queue(BatchQueue::close);
        tracing::info!(discarded, "batch closed");
        discarded
    }
}

/// Identification then enrichment for one captured photo.
pub async fn identify_draft(
    identifier: &dyn Identifier,
    image: &[u8],
    default_shelf_id: &str,
) -> BatchOutcome {
    let scan = match identifier.identify_from_image(image).await {
        Ok(Some(scan)) => scan,
        Ok(None) => return BatchOutcome::Failed(NO_BOOK_DETECTED.to_owned()),
        Err(err) => return connection_failed(err),
    };

    let mut draft = BookDraft {
        isbn: scan.isbn.clone(),
        title: scan.title.clone(),
        author: scan.author.clone(),
        genre: DEFAULT_GENRE.to_owned(),
        ..BookDraft::for_shelf(default_shelf_id)
    };

    let query = scan.enrichment_query();
    if is_meaningful_query(&query) {
        match identifier.fetch_metadata(&query).await {
            Ok(Some(details)) => draft.enrich(&details),
            Ok(None) => {}
            Err(err) => return connection_failed(err),
        }
    }

    BatchOutcome::Done(draft)
}

fn connection_failed(err: anyhow::Error) -> BatchOutcome {
    tracing::warn!(error = %format!("{err:#}"), "identifier call failed");
    BatchOutcome::Failed(CONNECTION_ERROR.to_owned())
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
