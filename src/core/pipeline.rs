use crate::core::converter::ResultConverter;
use crate::core::flatten;
use crate::core::{ConfigProvider, Output, Pipeline, Row, Storage};
use crate::utils::error::Result;

/// Reads a query result from storage, nests it and writes the JSON document back.
pub struct FilePipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    converter: ResultConverter,
}

impl<S: Storage, C: ConfigProvider> FilePipeline<S, C> {
    pub fn new(storage: S, config: C) -> Result<Self> {
        let converter =
            ResultConverter::with_options(config.mappings().to_vec(), config.convert_options())?;
        Ok(Self {
            storage,
            config,
            converter,
        })
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for FilePipeline<S, C> {
    async fn extract(&self) -> Result<Vec<Row>> {
        tracing::debug!(
            "Reading {} input from: {}",
            self.config.input_format().as_str(),
            self.config.input_path()
        );
        let data = self.storage.read_file(self.config.input_path()).await?;
        flatten::rows_from_bytes(&data, self.config.input_format())
    }

    async fn transform(&self, rows: Vec<Row>) -> Result<Output> {
        self.converter.convert(&rows)
    }

    async fn load(&self, output: Output) -> Result<String> {
        let document = output.into_json();
        let mut data = if self.config.pretty_output() {
            serde_json::to_vec_pretty(&document)?
        } else {
            serde_json::to_vec(&document)?
        };
        data.push(b'\n');

        tracing::debug!("Writing {} bytes to {}", data.len(), self.config.output_path());
        self.storage
            .write_file(self.config.output_path(), &data)
            .await?;

        Ok(self.config.output_path().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::flatten::InputFormat;
    use crate::core::grouping::ConvertOptions;
    use crate::domain::mapping::{GroupSpec, MappingDefinition};
    use crate::utils::error::NestError;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn with_file(path: &str, data: &str) -> Self {
            let mut files = HashMap::new();
            files.insert(path.to_string(), data.as_bytes().to_vec());
            Self {
                files: Arc::new(Mutex::new(files)),
            }
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                NestError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    struct MockConfig {
        format: InputFormat,
        pretty: bool,
        mappings: Vec<MappingDefinition>,
    }

    impl MockConfig {
        fn new(format: InputFormat) -> Self {
            Self {
                format,
                pretty: false,
                mappings: vec![GroupSpec::new("owners", "owner", "ownerName")
                    .child(MappingDefinition::pass_through("pets"))
                    .into()],
            }
        }
    }

    impl ConfigProvider for MockConfig {
        fn input_path(&self) -> &str {
            "input"
        }

        fn input_format(&self) -> InputFormat {
            self.format
        }

        fn output_path(&self) -> &str {
            "output.json"
        }

        fn pretty_output(&self) -> bool {
            self.pretty
        }

        fn mappings(&self) -> &[MappingDefinition] {
            &self.mappings
        }

        fn convert_options(&self) -> ConvertOptions {
            ConvertOptions::default()
        }
    }

    #[tokio::test]
    async fn test_extract_csv_input() {
        let storage = MockStorage::with_file("input", "owner,pet\nAl,Rex\nBo,\n");
        let pipeline = FilePipeline::new(storage, MockConfig::new(InputFormat::Csv)).unwrap();

        let rows = pipeline.extract().await.unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("pet"), Some("Rex"));
        assert!(!rows[1].contains("pet"));
    }

    #[tokio::test]
    async fn test_extract_missing_input() {
        let storage = MockStorage::with_file("other", "");
        let pipeline = FilePipeline::new(storage, MockConfig::new(InputFormat::Json)).unwrap();

        let err = pipeline.extract().await.unwrap_err();
        assert!(matches!(err, NestError::IoError(_)));
    }

    #[tokio::test]
    async fn test_transform_and_load() {
        let storage = MockStorage::with_file("input", "");
        let pipeline =
            FilePipeline::new(storage.clone(), MockConfig::new(InputFormat::Json)).unwrap();

        let rows: Vec<Row> = vec![
            [("owner", "Al"), ("pet", "Rex")].into_iter().collect(),
            [("owner", "Bo"), ("pet", "Tom")].into_iter().collect(),
        ];
        let output = pipeline.transform(rows).await.unwrap();
        let path = pipeline.load(output).await.unwrap();

        assert_eq!(path, "output.json");
        let written = storage.get_file("output.json").await.unwrap();
        let document: serde_json::Value = serde_json::from_slice(&written).unwrap();
        assert_eq!(
            document,
            serde_json::json!({"owners": [
                {"ownerName": "Al", "pets": [{"pet": "Rex"}]},
                {"ownerName": "Bo", "pets": [{"pet": "Tom"}]}
            ]})
        );
    }

    #[test]
    fn test_invalid_mappings_are_rejected_up_front() {
        let mut config = MockConfig::new(InputFormat::Json);
        config.mappings.push(MappingDefinition::pass_through("owners"));

        let result = FilePipeline::new(MockStorage::with_file("input", ""), config);
        assert!(result.is_err());
    }
}
