use std::str::FromStr;

use crate::catalog::model::Book;

pub const ALL_SHELVES: &str = "ALL";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ShelfFilter {
    #[default]
    All,
    Shelf(String),
}

impl ShelfFilter {
    pub fn matches(&self, book: &Book) -> bool {
        match self {
            Self::All => true,
            Self::Shelf(id) => book.shelf_id == *id,
        }
    }
}

impl FromStr for ShelfFilter {
    type Err = std::convert::Infallible;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        if raw.is_empty() || raw.eq_ignore_ascii_case(ALL_SHELVES) {
            Ok(Self::All)
        } else {
            Ok(Self::Shelf(raw.to_owned()))
        }
    }
}

/// Case-insensitive substring match on title or author.
pub fn matches_search(book: &Book, query: &str) -> bool {
    let needle = query.to_lowercase();
    book.title.to_lowercase().contains(&needle) || book.author.to_lowercase().contains(&needle)
}

pub fn filter_books<'a>(books: &'a [Book], query: &str, shelf: &ShelfFilter) -> Vec<&'a Book> {
    books
        .iter()
        .filter(|b| matches_search(b, query) && shelf.matches(b))
        .collect()
}
