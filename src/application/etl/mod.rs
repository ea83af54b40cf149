//! Extract, transform and load of historical booking records.

pub mod extract;
pub mod load;
pub mod transform;

pub use extract::{Extractor, RawSnapshot};
pub use load::{QualityReport, TrainingDataset, quality_check, read_rows_csv};
pub use transform::{DropReason, KindMapping, TransformOutcome, Transformer, map_record};
