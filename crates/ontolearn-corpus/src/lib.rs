//! ontolearn-corpus: Per-paper extraction records and their corpus-wide aggregate.
//! - Batch output splitting (one extraction file per paper)
//! - Paper store access and boundary validation
//! - Normalisation policy
//! - Aggregation into concept / paper indices
//! - JSON and JSONL exports

pub mod error;
pub mod models;
pub mod normalise;
pub mod aggregate;
pub mod store;
pub mod batch;
pub mod export;

pub use aggregate::{aggregate, CorpusIndex, CorpusStats, IndexBuilder};
pub use error::{RecordError, ShapeError, SkipKind};
pub use models::{ExtractionRecord, PaperId};
pub use normalise::NormalisePolicy;
pub use store::{CorpusScan, LoadReport, PaperFile, PaperStore, SkippedPaper, StoreOptions};
