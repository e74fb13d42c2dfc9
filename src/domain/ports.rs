use crate::core::render::RenderedOutput;
use crate::domain::model::RawRow;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;

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
    fn output_path(&self) -> &str;
    fn capacity_per_year(&self) -> u32;
    fn period_column(&self) -> &str;
    fn units_column(&self) -> &str;
    fn output_formats(&self) -> &[String];
    fn compression_filename(&self) -> Option<&str>;

    /// Units already consumed per year outside this batch.
    fn committed_units(&self) -> BTreeMap<i32, u32> {
        BTreeMap::new()
    }
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<RawRow>>;
    async fn transform(&self, rows: Vec<RawRow>) -> Result<RenderedOutput>;
    async fn load(&self, output: RenderedOutput) -> Result<String>;
}
