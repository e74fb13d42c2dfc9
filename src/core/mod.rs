pub mod allocator;
pub mod engine;
pub mod loader;
pub mod months;
pub mod period;
pub mod pipeline;
pub mod render;
pub mod reporter;

pub use crate::domain::model::{AllocationRecord, MonthKey, RawRow};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
