pub mod queue;
pub mod scanner;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;

use crate::cli::BatchArgs;
use crate::config;
use crate::identify;

pub use queue::{
    BatchError, BatchItem, BatchOutcome, BatchProgress, BatchQueue, BatchStatus, CommitSummary,
};
pub use scanner::{BatchScanner, CONNECTION_ERROR, DrainReport, NO_BOOK_DETECTED, identify_draft};

/// Captures every image, drains the queue, then commits (unless dry run).
/// Ctrl-C while draining closes the batch and discards all drafts.
pub async fn run(data_dir: &Path, args: BatchArgs) -> anyhow::Result<()> {
    let mut store = config::open_store(data_dir)?;
    let identifier = identify::from_args(&args.identify)?;

    let default_shelf = match args.shelf.as_deref() {
        Some(shelf_id) => {
            if store.shelf(shelf_id).is_none() {
                anyhow::bail!("unknown shelf: {shelf_id}");
            }
            shelf_id.to_owned()
        }
        None => store
            .first_shelf_id()
            .ok_or_else(|| anyhow::anyhow!("no shelves configured; add one with `shelf add`"))?
            .to_owned(),
    };

    let scanner = Arc::new(BatchScanner::new(identifier, default_shelf));
    for path in &args.images {
        let image = tokio::fs::read(path)
            .await
            .with_context(|| format!("read image: {}", path.display()))?;
        scanner.enqueue(image);
    }
    tracing::info!(images = args.images.len(), "batch captured");

    scanner.open_review();
    let mut worker = tokio::spawn({
        let scanner = Arc::clone(&scanner);
        async move { scanner.drain().await }
    });

    let report = tokio::select! {
        joined = &mut worker => joined.context("join batch worker")?,
        _ = tokio::signal::ctrl_c() => {
            let discarded = scanner.close();
            let report = worker.await.context("join batch worker")?;
            eprintln!("batch cancelled; discarded {discarded} item(s)");
            tracing::info!(?report, "batch cancelled");
            return Ok(());
        }
    };
    tracing::info!(processed = report.processed, "batch drained");

    scanner.with_queue(|queue| print_items(queue.items()));

    if args.dry_run {
        let discarded = scanner.close();
        println!("dry run: discarded {discarded} draft(s)");
        return Ok(());
    }

    let summary = scanner.commit_all(&mut store)?;
    println!(
        "added {} book(s); excluded {} item(s)",
        summary.added, summary.excluded
    );
    Ok(())
}

fn print_items(items: &[BatchItem]) {
    for (index, item) in items.iter().enumerate() {
        let detail = match &item.status {
            BatchStatus::Done(draft) => format!("{} / {}", draft.title, draft.author),
            BatchStatus::Error(message) => message.clone(),
            BatchStatus::Pending | BatchStatus::Processing => String::new(),
        };
        println!(
            "{}\t{}\t{}\t{}",
            index + 1,
            item.id,
            item.status.label(),
            detail
        );
    }
}
