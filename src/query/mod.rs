pub mod ast;
pub mod elastic;
pub mod fields;
pub mod parser;
pub mod rest;

pub use ast::{CompareOp, Comparison, Filter, Query, SortDirection, SortDirective};
pub use fields::collect_fields;
pub use parser::{parse_filter, parse_query, parse_sort, ParseError, ParseErrorKind};
