use crate::core::flatten::InputFormat;
use crate::core::grouping::ConvertOptions;
use crate::domain::mapping::MappingDefinition;
use crate::domain::model::{Output, Row};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn input_path(&self) -> &str;
    fn input_format(&self) -> InputFormat;
    fn output_path(&self) -> &str;
    fn pretty_output(&self) -> bool;
    fn mappings(&self) -> &[MappingDefinition];
    fn convert_options(&self) -> ConvertOptions;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<Row>>;
    async fn transform(&self, rows: Vec<Row>) -> Result<Output>;
    async fn load(&self, output: Output) -> Result<String>;
}
