pub mod converter;
pub mod engine;
pub mod flatten;
pub mod grouping;
pub mod pipeline;

pub use crate::domain::model::{Output, Row};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
