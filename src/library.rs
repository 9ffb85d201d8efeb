use std::path::Path;

use anyhow::Context as _;

use crate::catalog::stats;
use crate::catalog::{Book, BookDraft, CatalogError, CatalogStore, ShelfFilter, filter_books};
use crate::cli::{
    BookAddArgs, BookCommand, BookEditArgs, BookListArgs, ShelfCommand, ShelfEditArgs, StatsArgs,
};
use crate::config;

pub fn book(data_dir: &Path, command: BookCommand) -> anyhow::Result<()> {
    let mut store = config::open_store(data_dir)?;
    match command {
        BookCommand::Add(args) => add_book(&mut store, args),
        BookCommand::Edit(args) => edit_book(&mut store, args),
        BookCommand::Rm(args) => {
            let removed = store.remove_book(&args.id)?;
            println!("removed {} ({})", removed.id, removed.title);
            Ok(())
        }
        BookCommand::List(args) => list_books(&store, &args),
    }
}

fn add_book(store: &mut CatalogStore, args: BookAddArgs) -> anyhow::Result<()> {
    let mut draft = BookDraft::for_shelf(store.first_shelf_id().unwrap_or_default());
    draft.apply(&args.fields.to_patch());
    let book = store.add_book(draft)?;
    println!("{}", book.id);
    Ok(())
}

fn edit_book(store: &mut CatalogStore, args: BookEditArgs) -> anyhow::Result<()> {
    let patch = args.fields.to_patch();
    if patch.is_empty() {
        anyhow::bail!("nothing to update: pass at least one field");
    }
    let book = store.update_book(&args.id, &patch)?;
    println!("updated {} ({})", book.id, book.title);
    Ok(())
}

fn list_books(store: &CatalogStore, args: &BookListArgs) -> anyhow::Result<()> {
    let filter: ShelfFilter = args.filter.shelf.parse()?;
    let books = filter_books(store.books(), &args.filter.search, &filter);
    if args.json {
        let json = serde_json::to_string_pretty(&books).context("serialize books")?;
        println!("{json}");
        return Ok(());
    }
    for book in books {
        println!("{}", book_line(store, book));
    }
    Ok(())
}

fn book_line(store: &CatalogStore, book: &Book) -> String {
    format!(
        "{}\t{}\t{}\t{}\t{}",
        book.id,
        book.title,
        book.author,
        book.genre,
        store.shelf_name_for(&book.shelf_id)
    )
}

pub fn shelf(data_dir: &Path, command: ShelfCommand) -> anyhow::Result<()> {
    let mut store = config::open_store(data_dir)?;
    match command {
        ShelfCommand::Add(args) => {
            let shelf = store.add_shelf(&args.name, &args.description)?;
            println!("{}", shelf.id);
        }
        ShelfCommand::Edit(args) => edit_shelf(&mut store, args)?,
        ShelfCommand::Rm(args) => match store.remove_shelf(&args.id) {
            Ok(shelf) => println!("removed {} ({})", shelf.id, shelf.name),
            Err(CatalogError::ShelfInUse { shelf_id, count }) => {
                tracing::warn!(shelf_id = %shelf_id, count, "shelf still holds books");
                eprintln!("warning: shelf {shelf_id} still holds {count} book(s); not removed");
            }
            Err(err) => return Err(err.into()),
        },
        ShelfCommand::Move(args) => {
            if !store.reorder_shelf(&args.id, args.direction)? {
                eprintln!("shelf {} is already at the edge", args.id);
            }
        }
        ShelfCommand::List(args) => {
            let counts = stats::shelf_counts(store.books(), store.shelves());
            if args.json {
                let json = serde_json::to_string_pretty(&counts).context("serialize shelves")?;
                println!("{json}");
            } else {
                for count in counts {
                    println!("{}\t{}\t{} book(s)", count.shelf_id, count.name, count.books);
                }
            }
        }
    }
    Ok(())
}

fn edit_shelf(store: &mut CatalogStore, args: ShelfEditArgs) -> anyhow::Result<()> {
    let current = store
        .shelf(&args.id)
        .cloned()
        .ok_or_else(|| CatalogError::ShelfNotFound(args.id.clone()))?;
    let name = args.name.unwrap_or(current.name);
    let description = args.description.unwrap_or(current.description);
    let shelf = store.update_shelf(&args.id, &name, &description)?;
    println!("updated {} ({})", shelf.id, shelf.name);
    Ok(())
}

pub fn stats(data_dir: &Path, args: StatsArgs) -> anyhow::Result<()> {
    let store = config::open_store(data_dir)?;
    let summary = stats::summarize(store.books(), store.shelves());
    if args.json {
        let json = serde_json::to_string_pretty(&summary).context("serialize stats")?;
        println!("{json}");
        return Ok(());
    }

    println!("books\t{}", summary.total_books);
    println!("shelves\t{}", summary.total_shelves);
    for genre in &summary.genres {
        println!("genre\t{}\t{}", genre.genre, genre.books);
    }
    for shelf in &summary.shelves {
        println!("shelf\t{}\t{}", shelf.name, shelf.books);
    }
    let authors = stats::unique_authors(store.books());
    if !authors.is_empty() {
        println!("authors\t{}", authors.join(", "));
    }
    let publishers = stats::unique_publishers(store.books());
    if !publishers.is_empty() {
        println!("publishers\t{}", publishers.join(", "));
    }
    Ok(())
}
