//! Tabular ingestion pipeline
//!
//! Turns a grid of cells (first row = headers) into validated rows plus a
//! per-row error list. Header problems and empty files fail the whole load;
//! a bad row only ever affects itself.

pub mod cells;
pub mod headers;
pub mod pipeline;
pub mod row;
pub mod source;

pub use headers::{resolve_headers, HeaderMap, REQUIRED_HEADERS};
pub use pipeline::{ingest, IngestionReport, IngestionSummary, MAX_REPORTED_ERRORS};
pub use row::{parse_row, ParsedRow, RowError};
pub use source::{CellValue, Grid, GridSource, TabularSource};
