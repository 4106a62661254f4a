use crate::core::Pipeline;
use crate::utils::error::Result;
use std::time::Instant;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<String> {
        let name = self.pipeline.name();
        let started = Instant::now();
        tracing::info!("🚀 Starting {}", name);

        tracing::debug!("Extracting...");
        let raw_data = self.pipeline.extract().await?;
        tracing::debug!("Extract finished after {:?}", started.elapsed());

        tracing::debug!("Transforming...");
        let transformed = self.pipeline.transform(raw_data).await?;
        tracing::debug!("Transform finished after {:?}", started.elapsed());

        tracing::debug!("Loading...");
        let output_path = self.pipeline.load(transformed).await?;

        tracing::info!("✅ {} finished in {:?}", name, started.elapsed());
        Ok(output_path)
    }
}
