use crate::generator::{ChunkEncoding, ScenarioConfig};
use anyhow::Context;
use loracore::PipelineConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub pipeline: PipelineConfig,
    pub scenario: ScenarioConfig,
    pub encoding: ChunkEncoding,
    pub max_chunk_bytes: usize,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            pipeline: PipelineConfig::default(),
            scenario: ScenarioConfig::default(),
            encoding: ChunkEncoding::Mixed,
            max_chunk_bytes: 24,
        }
    }
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(seed: u64, passes: usize, encoding: ChunkEncoding, max_chunk_bytes: usize) -> Self {
        let mut config = Self::default();
        config.scenario.seed = seed;
        config.scenario.passes = passes;
        config.encoding = encoding;
        config.max_chunk_bytes = max_chunk_bytes;
        config
    }
}
