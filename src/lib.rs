pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{cli::LocalStorage, toml_config::TomlConfig};

pub use core::{
    allocator::{allocate, Allocation, AllocationSession},
    engine::{AllocationEngine, RunOutcome},
    loader::load_records,
    months::month_range,
    period::{parse_endpoint, parse_period, FormatError},
    pipeline::AllocationPipeline,
    reporter::{summarize, Summary},
};
pub use domain::model::{AllocationRecord, DateRange, MonthKey, Quantity, RawRow};
pub use utils::error::{AllocError, Result};
