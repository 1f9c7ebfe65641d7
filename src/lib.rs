pub mod aggregator;
pub mod config;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod loader;
pub mod model;
pub mod output;
pub mod platform;
pub mod probe;
pub mod scheduler;

pub use aggregator::{NullObserver, ScanObserver};
pub use config::Config;
pub use dataset::DatasetSource;
pub use engine::{ScanEngine, ScanSettings};
pub use error::{DatasetError, LoadError, ScanError};
pub use loader::{HttpLoader, LoaderKind, ProfileLoader, ResourceLoader};
pub use model::{Browser, Candidate, Detection, MetadataIndex, ScanPhase, ScanReport};
pub use probe::Prober;
pub use scheduler::BatchScheduler;
