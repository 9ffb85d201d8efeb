use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use chrono::{Local, NaiveDate};

use crate::catalog::{Book, CatalogStore, ShelfFilter, filter_books};
use crate::cli::ExportArgs;
use crate::config;

pub const HEADERS: [&str; 8] = [
    "Title",
    "Author",
    "Publisher",
    "Year",
    "Genre",
    "ISBN",
    "Shelf",
    "Added",
];

const BOM: char = '\u{feff}';
const DATE_FORMAT: &str = "%d.%m.%Y";

pub fn run(data_dir: &Path, args: ExportArgs) -> anyhow::Result<()> {
    let store = config::open_store(data_dir)?;
    let out = args
        .out
        .clone()
        .unwrap_or_else(|| PathBuf::from(default_file_name(Local::now().date_naive())));

    if out.exists() && !args.force {
        anyhow::bail!("export output already exists: {}", out.display());
    }
    if let Some(parent) = out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create export output dir: {}", parent.display()))?;
    }

    let filter: ShelfFilter = args.filter.shelf.parse()?;
    let books = filter_books(store.books(), &args.filter.search, &filter);
    let csv = render_csv(&store, &books);

    let mut options = OpenOptions::new();
    options.write(true);
    if args.force {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }
    let mut file = options
        .open(&out)
        .with_context(|| format!("open output: {}", out.display()))?;
    file.write_all(csv.as_bytes())
        .with_context(|| format!("write output: {}", out.display()))?;
    file.flush()
        .with_context(|| format!("flush output: {}", out.display()))?;

    tracing::info!(books = books.len(), out = %out.display(), "catalog exported");
    println!("{}", out.display());
    Ok(())
}

pub fn default_file_name(today: NaiveDate) -> String {
    format!("library_export_{}.csv", today.format(DATE_FORMAT))
}

/// Header plus one row per book, every value quoted, prefixed with a BOM.
pub fn render_csv(store: &CatalogStore, books: &[&Book]) -> String {
    let mut lines = Vec::with_capacity(books.len() + 1);
    lines.push(HEADERS.join(","));
    for book in books {
        let added = book
            .added_at
            .with_timezone(&Local)
            .format(DATE_FORMAT)
            .to_string();
        let row = [
            book.title.as_str(),
            book.author.as_str(),
            book.publisher.as_str(),
            book.year.as_str(),
            book.genre.as_str(),
            book.isbn.as_str(),
            store.shelf_name_for(&book.shelf_id),
            added.as_str(),
        ]
        .map(quote);
        lines.push(row.join(","));
    }

    let mut csv = String::new();
    csv.push(BOM);
    csv.push_str(&lines.join("\n"));
    csv
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}
