//! Per-stage latency measurement.
//!
//! Every pipeline stage (partitioning, indexing, query embedding, retrieval,
//! each verifier run) is timed on its own so the report can attribute
//! latency. Timings are wall-clock milliseconds from `Instant`.

use std::time::Instant;

use serde::Serialize;

/// Stages slower than this are logged at `warn`.
pub const SLOW_STAGE_THRESHOLD_MS: f64 = 1_000.0;

/// Pipeline stages that are timed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Partitioning,
    PartitionEmbedding,
    IndexBuild,
    QueryEmbedding,
    Retrieval,
    /// One verifier variant, named by its algorithm.
    Verification(String),
}

impl Stage {
    pub fn label(&self) -> String {
        match self {
            Stage::Partitioning => "partitioning".to_string(),
            Stage::PartitionEmbedding => "partition embedding".to_string(),
            Stage::IndexBuild => "index build".to_string(),
            Stage::QueryEmbedding => "query embedding".to_string(),
            Stage::Retrieval => "retrieval".to_string(),
            Stage::Verification(name) => format!("{} verification", name),
        }
    }
}

/// One recorded stage.
#[derive(Debug, Clone, Serialize)]
pub struct StageTiming {
    pub stage: Stage,
    pub elapsed_ms: f64,
}

/// Ordered list of stage timings for one run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StageTimings {
    entries: Vec<StageTiming>,
}

impl StageTimings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f`, record its duration under `stage`, and return its output.
    pub fn measure<T>(&mut self, stage: Stage, f: impl FnOnce() -> T) -> T {
        let started = Instant::now();
        let out = f();
        self.record(stage, elapsed_ms(started));
        out
    }

    pub fn record(&mut self, stage: Stage, elapsed_ms: f64) {
        if elapsed_ms >= SLOW_STAGE_THRESHOLD_MS {
            tracing::warn!(stage = %stage.label(), elapsed_ms, "slow stage");
        }
        self.entries.push(StageTiming { stage, elapsed_ms });
    }

    /// Duration of the first entry for `stage`.
    pub fn get(&self, stage: &Stage) -> Option<f64> {
        self.entries
            .iter()
            .find(|t| &t.stage == stage)
            .map(|t| t.elapsed_ms)
    }

    pub fn entries(&self) -> &[StageTiming] {
        &self.entries
    }

    pub fn total_ms(&self) -> f64 {
        self.entries.iter().map(|t| t.elapsed_ms).sum()
    }
}

/// Milliseconds since `started`, with sub-millisecond precision.
pub fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1_000.0
}
