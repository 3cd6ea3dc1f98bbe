mod directory;
pub mod namespace;
pub mod pool;
mod source_type;

pub(crate) use directory::{is_test_file, list_source_files};
pub use pool::{WorkerLost, run_bounded};
pub use source_type::SourceType;
