pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use crate::config::{storage::LocalStorage, toml_config::NestConfig};
pub use crate::core::{
    converter::ResultConverter, engine::NestEngine, grouping::ConvertOptions,
    pipeline::FilePipeline,
};
pub use crate::domain::mapping::{GroupSpec, MappingDefinition};
pub use crate::domain::model::{Output, Row};
pub use crate::utils::error::{NestError, Result};
