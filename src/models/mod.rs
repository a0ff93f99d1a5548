pub mod book;

pub use book::{BookItem, PageRequest, SearchResponse};
