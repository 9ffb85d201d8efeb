use std::sync::Arc;

use anyhow::Context as _;
use chrono::Utc;
use serde::Serialize;

use crate::catalog::model::{Book, BookDraft, BookPatch, Shelf, UNKNOWN_SHELF};
use crate::catalog::storage::KeyValueStore;

pub const BOOKS_KEY: &str = "library_books";
pub const SHELVES_KEY: &str = "library_shelves";

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("book title is required")]
    MissingTitle,

    #[error("shelf is required")]
    MissingShelf,

    #[error("shelf name must not be empty")]
    EmptyShelfName,

    #[error("book not found: {0}")]
    BookNotFound(String),

    #[error("shelf not found: {0}")]
    ShelfNotFound(String),

    #[error("shelf {shelf_id} still holds {count} book(s)")]
    ShelfInUse { shelf_id: String, count: usize },

    #[error("persist catalog: {0:#}")]
    Persist(anyhow::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum MoveDirection {
    Up,
    Down,
}

/// Owns the book and shelf collections and mirrors them to storage.
///
/// Each mutation builds the complete next collection of the one kind it
/// touches, writes that single key, and only then swaps the in-memory state.
/// A failed write leaves both memory and the other key unchanged.
pub struct CatalogStore {
    storage: Arc<dyn KeyValueStore>,
    books: Vec<Book>,
    shelves: Vec<Shelf>,
}

impl CatalogStore {
    pub fn load(storage: Arc<dyn KeyValueStore>) -> anyhow::Result<Self> {
        let books: Vec<Book> = match storage.get(BOOKS_KEY).context("read books")? {
            Some(raw) => serde_json::from_str(&raw).context("parse books")?,
            None => Vec::new(),
        };
        let shelves: Vec<Shelf> = match storage.get(SHELVES_KEY).context("read shelves")? {
            Some(raw) => serde_json::from_str(&raw).context("parse shelves")?,
            None => Shelf::defaults(),
        };
        tracing::debug!(books = books.len(), shelves = shelves.len(), "catalog loaded");
        Ok(Self {
            storage,
            books,
            shelves,
        })
    }

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn shelves(&self) -> &[Shelf] {
        &self.shelves
    }

    pub fn book(&self, id: &str) -> Option<&Book> {
        self.books.iter().find(|b| b.id == id)
    }

    pub fn shelf(&self, id: &str) -> Option<&Shelf> {
        self.shelves.iter().find(|s| s.id == id)
    }

    pub fn first_shelf_id(&self) -> Option<&str> {
        self.shelves.first().map(|s| s.id.as_str())
    }

    pub fn shelf_name_for(&self, shelf_id: &str) -> &str {
        self.shelf(shelf_id)
            .map(|s| s.name.as_str())
            .unwrap_or(UNKNOWN_SHELF)
    }

    pub fn books_on_shelf(&self, shelf_id: &str) -> usize {
        self.books.iter().filter(|b| b.shelf_id == shelf_id).count()
    }

    pub fn add_book(&mut self, draft: BookDraft) -> Result<Book, CatalogError> {
        validate_draft(&draft)?;
        let book = draft.into_book(new_book_id(), Utc::now());

        let mut books = Vec::with_capacity(self.books.len() + 1);
        books.push(book.clone());
        books.extend(self.books.iter().cloned());
        self.commit_books(books)?;

        tracing::debug!(book_id = %book.id, title = %book.title, "book added");
        Ok(book)
    }

    /// Prepends already-built books in one write (batch commit).
    pub fn add_books(&mut self, new_books: Vec<Book>) -> Result<usize, CatalogError> {
        if new_books.is_empty() {
            return Ok(0);
        }
        let added = new_books.len();
        let mut books = new_books;
        books.extend(self.books.iter().cloned());
        self.commit_books(books)?;

        tracing::debug!(added, "books added");
        Ok(added)
    }

    pub fn update_book(&mut self, id: &str, patch: &BookPatch) -> Result<Book, CatalogError> {
        let index = self
            .books
            .iter()
            .position(|b| b.id == id)
            .ok_or_else(|| CatalogError::BookNotFound(id.to_owned()))?;

        let existing = &self.books[index];
        let mut draft = existing.to_draft();
        draft.apply(patch);
        validate_draft(&draft)?;
        let updated = Book {
            id: existing.id.clone(),
            added_at: existing.added_at,
            isbn: draft.isbn,
            title: draft.title,
            author: draft.author,
            publisher: draft.publisher,
            year: draft.year,
            genre: draft.genre,
            shelf_id: draft.shelf_id,
            cover_description: draft.cover_description,
        };

        let mut books = self.books.clone();
        books[index] = updated.clone();
        self.commit_books(books)?;

        tracing::debug!(book_id = %id, "book updated");
        Ok(updated)
    }

    pub fn remove_book(&mut self, id: &str) -> Result<Book, CatalogError> {
        let index = self
            .books
            .iter()
            .position(|b| b.id == id)
            .ok_or_else(|| CatalogError::BookNotFound(id.to_owned()))?;

        let mut books = self.books.clone();
        let removed = books.remove(index);
        self.commit_books(books)?;

        tracing::debug!(book_id = %id, "book removed");
        Ok(removed)
    }

    pub fn add_shelf(&mut self, name: &str, description: &str) -> Result<Shelf, CatalogError> {
        let name = validate_shelf_name(name)?;
        let shelf = Shelf::new(
            format!("shelf-{}", uuid::Uuid::new_v4().simple()),
            name,
            description.trim(),
        );

        let mut shelves = self.shelves.clone();
        shelves.push(shelf.clone());
        self.commit_shelves(shelves)?;

        tracing::debug!(shelf_id = %shelf.id, name = %shelf.name, "shelf added");
        Ok(shelf)
    }

    pub fn update_shelf(
        &mut self,
        id: &str,
        name: &str,
        description: &str,
    ) -> Result<Shelf, CatalogError> {
        let name = validate_shelf_name(name)?;
        let index = self.shelf_index(id)?;

        let mut shelves = self.shelves.clone();
        shelves[index].name = name.to_owned();
        shelves[index].description = description.trim().to_owned();
        let updated = shelves[index].clone();
        self.commit_shelves(shelves)?;

        tracing::debug!(shelf_id = %id, "shelf updated");
        Ok(updated)
    }

    pub fn remove_shelf(&mut self, id: &str) -> Result<Shelf, CatalogError> {
        let index = self.shelf_index(id)?;
        let count = self.books_on_shelf(id);
        if count > 0 {
            return Err(CatalogError::ShelfInUse {
                shelf_id: id.to_owned(),
                count,
            });
        }

        let mut shelves = self.shelves.clone();
        let removed = shelves.remove(index);
        self.commit_shelves(shelves)?;

        tracing::debug!(shelf_id = %id, "shelf removed");
        Ok(removed)
    }

    /// Swaps the shelf with its neighbour. Returns `false` at the boundary.
    pub fn reorder_shelf(
        &mut self,
        id: &str,
        direction: MoveDirection,
    ) -> Result<bool, CatalogError> {
        let index = self.shelf_index(id)?;
        let target = match direction {
            MoveDirection::Up if index > 0 => index - 1,
            MoveDirection::Down if index + 1 < self.shelves.len() => index + 1,
            _ => return Ok(false),
        };

        let mut shelves = self.shelves.clone();
        shelves.swap(index, target);
        self.commit_shelves(shelves)?;

        tracing::debug!(shelf_id = %id, ?direction, "shelf moved");
        Ok(true)
    }

    fn shelf_index(&self, id: &str) -> Result<usize, CatalogError> {
        self.shelves
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| CatalogError::ShelfNotFound(id.to_owned()))
    }

    fn commit_books(&mut self, books: Vec<Book>) -> Result<(), CatalogError> {
        write_collection(self.storage.as_ref(), BOOKS_KEY, &books)
            .map_err(CatalogError::Persist)?;
        self.books = books;
        Ok(())
    }

    fn commit_shelves(&mut self, shelves: Vec<Shelf>) -> Result<(), CatalogError> {
        write_collection(self.storage.as_ref(), SHELVES_KEY, &shelves)
            .map_err(CatalogError::Persist)?;
        self.shelves = shelves;
        Ok(())
    }
}

fn write_collection<T: Serialize>(
    storage: &dyn KeyValueStore,
    key: &str,
    items: &[T],
) -> anyhow::Result<()> {
    let json = serde_json::to_string(items).with_context(|| format!("serialize {key}"))?;
    storage.set(key, &json).with_context(|| format!("write {key}"))
}

fn validate_draft(draft: &BookDraft) -> Result<(), CatalogError> {
    if draft.title.trim().is_empty() {
        return Err(CatalogError::MissingTitle);
    }
    if draft.shelf_id.trim().is_empty() {
        return Err(CatalogError::MissingShelf);
    }
    Ok(())
}

fn validate_shelf_name(name: &str) -> Result<&str, CatalogError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CatalogError::EmptyShelfName);
    }
    Ok(name)
}

pub fn new_book_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
