// Station file importers: path discovery, tokenizing and record normalization

pub mod path_resolver;
pub mod record_normalizer;
pub mod row_scanner;

// Re-export commonly used items
pub use path_resolver::{station_code_for, FilesToIngest, PathResolveError};
pub use record_normalizer::{NormalizeError, RecordNormalizer, RowError};
pub use row_scanner::{RawRow, RawToken, RowScanner, MISSING_SENTINEL};
