use crate::core::reporter::Summary;
use crate::core::Pipeline;
use crate::utils::error::Result;

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub output_path: String,
    pub summary: Summary,
}

pub struct AllocationEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> AllocationEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<RunOutcome> {
        tracing::info!("Starting allocation run...");

        // Extract
        tracing::info!("Reading input rows...");
        let rows = self.pipeline.extract().await?;
        tracing::info!("Read {} rows", rows.len());

        // Transform
        tracing::info!("Allocating units...");
        let output = self.pipeline.transform(rows).await?;
        let summary = output.summary.clone();
        tracing::info!(
            "Allocated {}/{} units across {} years",
            summary.total_allocated,
            summary.total_requested,
            summary.years.len()
        );

        // Load
        tracing::info!("Writing {} output files...", output.files.len());
        let output_path = self.pipeline.load(output).await?;
        tracing::info!("Output saved to: {}", output_path);

        Ok(RunOutcome {
            output_path,
            summary,
        })
    }
}
