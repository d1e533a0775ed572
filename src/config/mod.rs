pub mod storage;
pub mod toml_config;

#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "row-nest")]
#[command(about = "Nest flat SPARQL results into hierarchical JSON documents")]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "row-nest.toml")]
    pub config: String,

    /// Override input file from config
    #[arg(long)]
    pub input: Option<String>,

    /// Override input format (json or csv)
    #[arg(long)]
    pub format: Option<String>,

    /// Override output file from config
    #[arg(long)]
    pub output: Option<String>,

    /// Fail when a collected field differs inside a group
    #[arg(long)]
    pub strict: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Log output format (compact or json)
    #[arg(long, default_value = "compact")]
    pub log_format: crate::utils::logger::LogFormat,

    /// Show the resolved configuration without converting anything
    #[arg(long)]
    pub dry_run: bool,
}

#[cfg(feature = "cli")]
impl CliArgs {
    /// 將命令列參數覆蓋到配置上
    pub fn apply_to(&self, config: &mut toml_config::NestConfig) {
        if let Some(input) = &self.input {
            config.input.path = input.clone();
        }
        if let Some(format) = &self.format {
            config.input.format = Some(format.clone());
        }
        if let Some(output) = &self.output {
            config.output.path = output.clone();
        }
        if self.strict {
            config.conversion.strict_collection = true;
        }
    }
}
