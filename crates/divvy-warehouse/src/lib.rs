pub mod api;
pub mod autocomplete;
pub mod catalog;
pub mod config;
pub mod error;
pub mod memory;
pub mod model;
pub mod schema;
pub mod scrape;

pub use crate::autocomplete::{AutocompleteIndex, AUTOCOMPLETE_LIMIT};
pub use crate::catalog::Catalog;
pub use crate::config::Config;
pub use crate::error::{Error, ErrorKind};
pub use crate::model::{
    Company, CompanyRecord, Dividend, DividendHistory, Page, PageRequest, ScrapedResult,
};
