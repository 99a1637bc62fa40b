//! Quotedesk - import quotation spreadsheet ingestion
//!
//! Supplier quotation sheets (CSV or Excel) are read into a cell grid, their
//! header row located by import mode, each data row mapped onto a typed
//! `QuotationRecord`, validated, and checked against the stored records by
//! reference code before anything is persisted.

pub mod cli;
pub mod config;
pub mod db;
pub mod derived;
pub mod dispatcher;
pub mod error;
pub mod export;
pub mod importers;
pub mod session;
pub mod utils;
