use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::catalog::model::{Book, DEFAULT_GENRE, Shelf};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ShelfCount {
    pub shelf_id: String,
    pub name: String,
    pub books: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct GenreCount {
    pub genre: String,
    pub books: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct LibrarySummary {
    pub total_books: usize,
    pub total_shelves: usize,
    pub genres: Vec<GenreCount>,
    pub shelves: Vec<ShelfCount>,
}

pub fn summarize(books: &[Book], shelves: &[Shelf]) -> LibrarySummary {
    LibrarySummary {
        total_books: books.len(),
        total_shelves: shelves.len(),
        genres: genre_breakdown(books),
        shelves: shelf_counts(books, shelves),
    }
}

pub fn shelf_counts(books: &[Book], shelves: &[Shelf]) -> Vec<ShelfCount> {
    shelves
        .iter()
        .map(|shelf| ShelfCount {
            shelf_id: shelf.id.clone(),
            name: shelf.name.clone(),
            books: books.iter().filter(|b| b.shelf_id == shelf.id).count(),
        })
        .collect()
}

/// Books per genre, largest first. Blank genres count as the default genre.
pub fn genre_breakdown(books: &[Book]) -> Vec<GenreCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for book in books {
        let genre = match book.genre.trim() {
            "" => DEFAULT_GENRE,
            genre => genre,
        };
        *counts.entry(genre).or_default() += 1;
    }

    let mut breakdown: Vec<GenreCount> = counts
        .into_iter()
        .map(|(genre, books)| GenreCount {
            genre: genre.to_owned(),
            books,
        })
        .collect();
    breakdown.sort_by(|a, b| b.books.cmp(&a.books).then_with(|| a.genre.cmp(&b.genre)));
    breakdown
}

pub fn unique_authors(books: &[Book]) -> Vec<String> {
    unique_non_empty(books.iter().map(|b| b.author.as_str()))
}

pub fn unique_publishers(books: &[Book]) -> Vec<String> {
    unique_non_empty(books.iter().map(|b| b.publisher.as_str()))
}

fn unique_non_empty<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .filter(|v| !v.is_empty())
        .filter(|v| seen.insert(*v))
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::catalog::model::BookDraft;

    fn book(genre: &str, author: &str, publisher: &str, shelf_id: &str) -> Book {
        let mut b = BookDraft {
            title: "t".to_owned(),
            author: author.to_owned(),
            publisher: publisher.to_owned(),
            shelf_id: shelf_id.to_owned(),
            ..BookDraft::default()
        }
        .into_book("id".to_owned(), Utc::now());
        b.genre = genre.to_owned();
        b
    }

    #[test]
    fn genre_breakdown_orders_by_count_and_folds_blank() {
        let books = vec![
            book("Novel", "a", "", "shelf-1"),
            book("", "a", "", "shelf-1"),
            book("History", "a", "", "shelf-1"),
            book("Novel", "a", "", "shelf-1"),
            book("Other", "a", "", "shelf-1"),
        ];
        let breakdown = genre_breakdown(&books);
        assert_eq!(
            breakdown,
            vec![
                GenreCount {
                    genre: "Novel".to_owned(),
                    books: 2
                },
                GenreCount {
                    genre: "Other".to_owned(),
                    books: 2
                },
                GenreCount {
                    genre: "History".to_owned(),
                    books: 1
                },
            ]
        );
    }

    #[test]
    fn shelf_counts_follow_shelf_order() {
        let shelves = Shelf::defaults();
        let books = vec![
            book("Novel", "a", "", "shelf-3"),
            book("Novel", "a", "", "shelf-3"),
            book("Novel", "a", "", "gone"),
        ];
        let counts: Vec<_> = shelf_counts(&books, &shelves)
            .into_iter()
            .map(|c| c.books)
            .collect();
        assert_eq!(counts, [0, 0, 2]);
    }

    #[test]
    fn suggestions_are_distinct_in_first_seen_order() {
        let books = vec![
            book("", "Hugo", "YKY", "s"),
            book("", "Tolstoy", "", "s"),
            book("", "Hugo", "İş Bankası", "s"),
        ];
        assert_eq!(unique_authors(&books), ["Hugo", "Tolstoy"]);
        assert_eq!(unique_publishers(&books), ["YKY", "İş Bankası"]);
    }
}
