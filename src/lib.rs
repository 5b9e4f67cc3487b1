//! Translate generic filter/sort/pagination queries into search-engine
//! filter documents and REST `where`/`sort` parameters.

pub mod query;
pub mod source;
pub mod usage;
