use std::path::Path;

use anyhow::Context as _;

use crate::catalog::BookDraft;
use crate::cli::ScanArgs;
use crate::config;
use crate::identify::{self, Identifier, is_meaningful_query};

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("no barcode or readable text found in the image")]
    NothingDetected,

    #[error("no book information found, try a clearer photo")]
    NoBookInfo,

    #[error("connection error, please try again")]
    Connectivity(anyhow::Error),
}

/// Identifies one photo and fills the edit form `base` with the result.
///
/// Metadata fields win over `base`; title, author and ISBN take the first
/// non-empty value of metadata, then the identified value.
pub async fn scan_single(
    identifier: &dyn Identifier,
    image: &[u8],
    base: BookDraft,
) -> Result<BookDraft, ScanError> {
    let identified = identifier
        .identify_from_image(image)
        .await
        .map_err(connectivity)?
        .ok_or(ScanError::NothingDetected)?;
    tracing::info!(
        isbn = %identified.isbn,
        title = %identified.title,
        "image identified"
    );

    let query = identified.enrichment_query();
    let details = if is_meaningful_query(&query) {
        identifier
            .fetch_metadata(&query)
            .await
            .map_err(connectivity)?
    } else {
        None
    };

    if details.is_none() && identified.title.trim().is_empty() {
        return Err(ScanError::NoBookInfo);
    }

    let details = details.unwrap_or_default();
    let mut draft = base;
    draft.enrich(&details);
    draft.title = first_non_empty(details.title.as_deref(), &identified.title);
    draft.author = first_non_empty(details.author.as_deref(), &identified.author);
    draft.isbn = first_non_empty(details.isbn.as_deref(), &identified.isbn);
    Ok(draft)
}

pub async fn run(data_dir: &Path, args: ScanArgs) -> anyhow::Result<()> {
    let mut store = config::open_store(data_dir)?;
    let identifier = identify::from_args(&args.identify)?;
    let image = tokio::fs::read(&args.image)
        .await
        .with_context(|| format!("read image: {}", args.image.display()))?;

    let shelf_id = match args.fields.shelf.as_deref() {
        Some(shelf_id) => shelf_id,
        None => store.first_shelf_id().unwrap_or_default(),
    };
    let base = BookDraft::for_shelf(shelf_id);
    let mut draft = scan_single(identifier.as_ref(), &image, base).await?;
    draft.apply(&args.fields.to_patch());

    if !args.save {
        let json = serde_json::to_string_pretty(&draft).context("serialize draft")?;
        println!("{json}");
        return Ok(());
    }

    let book = store.add_book(draft)?;
    tracing::info!(book_id = %book.id, title = %book.title, "scanned book saved");
    let json = serde_json::to_string_pretty(&book).context("serialize book")?;
    println!("{json}");
    Ok(())
}

fn first_non_empty(preferred: Option<&str>, fallback: &str) -> String {
    match preferred.map(str::trim) {
        Some(value) if !value.is_empty() => value.to_owned(),
        _ => fallback.trim().to_owned(),
    }
}

fn connectivity(err: anyhow::Error) -> ScanError {
    tracing::warn!(error = %format!("{err:#}"), "identifier call failed");
    ScanError::Connectivity(err)
}
