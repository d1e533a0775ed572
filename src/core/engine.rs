use crate::core::Pipeline;
use crate::utils::error::Result;

pub struct NestEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> NestEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("Starting conversion...");

        // Extract
        let rows = self.pipeline.extract().await?;
        tracing::info!("Extracted {} rows", rows.len());

        // Transform
        let output = self.pipeline.transform(rows).await?;
        tracing::info!("Built {} top-level collections", output.len());

        // Load
        let output_path = self.pipeline.load(output).await?;
        tracing::info!("Output saved to: {}", output_path);

        Ok(output_path)
    }
}
