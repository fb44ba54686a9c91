//! Record extraction: the seam between the batch core and the format-specific parser.

pub mod gaussian;

use std::path::Path;

use crate::error::ExtractionError;
use crate::record::Record;

pub use gaussian::GaussianExtractor;

/// Turns one input file into a [`Record`]. Called concurrently from worker threads.
pub trait Extractor: Sync {
    fn extract(&self, path: &Path) -> Result<Record, ExtractionError>;
}

impl<F> Extractor for F
where
    F: Fn(&Path) -> Result<Record, ExtractionError> + Sync,
{
    fn extract(&self, path: &Path) -> Result<Record, ExtractionError> {
        self(path)
    }
}
