use crate::core::flatten::InputFormat;
use crate::core::grouping::ConvertOptions;
use crate::core::ConfigProvider;
use crate::domain::mapping::{mappings_from_json, validate_mappings, MappingDefinition};
use crate::utils::error::{NestError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NestConfig {
    pub input: InputConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub conversion: ConversionConfig,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mappings: Vec<MappingDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    pub path: String,
    /// `json` 或 `csv`，未設定時依副檔名判斷
    pub format: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: String,
    pub pretty: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionConfig {
    #[serde(default)]
    pub strict_collection: bool,
    pub mappings_file: Option<String>,
}

impl NestConfig {
    /// 從 TOML 檔案載入配置，並載入 mappings_file (相對於配置檔目錄)
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(NestError::IoError)?;
        let mut config = Self::from_toml_str(&content)?;

        let base_dir = path
            .as_ref()
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        config.resolve_mappings_file(&base_dir)?;
        Ok(config)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| NestError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${RESULTS_DIR})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| NestError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 讀取外部 JSON mapping 檔
    pub fn resolve_mappings_file(&mut self, base_dir: &Path) -> Result<()> {
        let Some(file) = self.conversion.mappings_file.as_deref() else {
            return Ok(());
        };

        if !self.mappings.is_empty() {
            return Err(NestError::ConfigValidationError {
                field: "conversion.mappings_file".to_string(),
                message: "use either inline [[mappings]] or mappings_file, not both".to_string(),
            });
        }
        validation::validate_file_extension("conversion.mappings_file", file, &["json"])?;

        let mut path = PathBuf::from(file);
        if path.is_relative() {
            path = base_dir.join(path);
        }
        tracing::debug!("Loading mapping definitions from {}", path.display());

        let content = std::fs::read_to_string(&path)?;
        self.mappings = mappings_from_json(&content)?;
        Ok(())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_path("input.path", &self.input.path)?;
        validation::validate_path("output.path", &self.output.path)?;

        if let Some(format) = &self.input.format {
            validation::validate_one_of("input.format", &format.to_ascii_lowercase(), &InputFormat::ALL)?;
        }

        if self.mappings.is_empty() {
            return Err(NestError::MissingConfigError {
                field: "mappings".to_string(),
            });
        }
        validate_mappings(&self.mappings)
    }

    /// 取得輸入格式
    pub fn input_format(&self) -> InputFormat {
        match self.input.format.as_deref() {
            Some(format) => format.parse().unwrap_or_default(),
            None if self.input.path.to_ascii_lowercase().ends_with(".csv") => InputFormat::Csv,
            None => InputFormat::Json,
        }
    }

    pub fn convert_options(&self) -> ConvertOptions {
        ConvertOptions {
            strict_collection: self.conversion.strict_collection,
        }
    }
}

impl ConfigProvider for NestConfig {
    fn input_path(&self) -> &str {
        &self.input.path
    }

    fn input_format(&self) -> InputFormat {
        self.input_format()
    }

    fn output_path(&self) -> &str {
        &self.output.path
    }

    fn pretty_output(&self) -> bool {
        self.output.pretty.unwrap_or(true)
    }

    fn mappings(&self) -> &[MappingDefinition] {
        &self.mappings
    }

    fn convert_options(&self) -> ConvertOptions {
        self.convert_options()
    }
}

impl Validate for NestConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
