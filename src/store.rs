use anyhow::{Context, Result};
use chrono::Utc;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::models::{Finding, FindingKey, ItemFailure, Stage, StageResult, StageStatus};

struct StageRecord {
    result: StageResult,
    seen: HashSet<FindingKey>,
}

impl StageRecord {
    fn new(stage: Stage) -> Self {
        Self {
            result: StageResult::new(stage),
            seen: HashSet::new(),
        }
    }

    fn from_result(result: StageResult) -> Self {
        let seen = result.findings.iter().map(Finding::key).collect();
        Self { result, seen }
    }
}

pub struct ResultStore {
    dir: PathBuf,
    stages: Mutex<HashMap<Stage, StageRecord>>,
}

impl ResultStore {
    // Opens (or creates) the run directory and reads back any stage artifacts
    // left by a previous run, so completed stages can be skipped on resume.
    pub fn open(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create output directory {}", dir.display()))?;

        let mut stages = HashMap::new();
        for stage in Stage::ALL {
            let artifact = dir.join(stage.artifact_name());
            let record = if artifact.exists() {
                let content = fs::read_to_string(&artifact)
                    .with_context(|| format!("failed to read {}", artifact.display()))?;
                let result: StageResult = serde_json::from_str(&content)
                    .with_context(|| format!("corrupt stage artifact {}", artifact.display()))?;
                StageRecord::from_result(result)
            } else {
                StageRecord::new(stage)
            };
            stages.insert(stage, record);
        }

        Ok(Self {
            dir: dir.to_path_buf(),
            stages: Mutex::new(stages),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Stage, StageRecord>> {
        self.stages.lock().unwrap_or_else(|e| e.into_inner())
    }

    // Marks a stage Running for a fresh attempt. Findings from a previous
    // partial run are kept (the dedup key makes re-recording a no-op) but
    // failures are retried from a clean slate.
    pub fn begin(&self, stage: Stage) {
        let mut stages = self.lock();
        if let Some(record) = stages.get_mut(&stage) {
            record.result.status = StageStatus::Running;
            record.result.failures.clear();
            record.result.attempted = 0;
            record.result.started_at = Some(Utc::now());
            record.result.finished_at = None;
        }
    }

    // Idempotent: recording a finding with an already-seen key is a no-op.
    pub fn record(&self, finding: Finding) -> bool {
        let mut stages = self.lock();
        let Some(record) = stages.get_mut(&finding.stage) else {
            return false;
        };
        if !record.seen.insert(finding.key()) {
            return false;
        }
        record.result.findings.push(finding);
        true
    }

    pub fn record_failure(&self, stage: Stage, failure: ItemFailure) {
        let mut stages = self.lock();
        if let Some(record) = stages.get_mut(&stage) {
            record.result.failures.push(failure);
        }
    }

    // Derives the terminal status from the per-item ledger and persists the
    // stage artifact. Downstream stages only ever read terminal snapshots.
    pub fn finalize(&self, stage: Stage, attempted: usize) -> Result<StageResult> {
        let snapshot = {
            let mut stages = self.lock();
            let Some(record) = stages.get_mut(&stage) else {
                anyhow::bail!("unknown stage {}", stage);
            };
            record.result.attempted = attempted;
            record.result.finished_at = Some(Utc::now());
            record.result.status = if attempted == 0 {
                StageStatus::Failed
            } else if record.result.failures.is_empty() {
                StageStatus::Complete
            } else if record.result.failures.len() >= attempted {
                StageStatus::Failed
            } else {
                StageStatus::PartiallyFailed
            };
            record.result.clone()
        };
        self.persist(&snapshot)?;
        Ok(snapshot)
    }

    fn persist(&self, result: &StageResult) -> Result<()> {
        let artifact = self.dir.join(result.stage.artifact_name());
        let json = serde_json::to_string_pretty(result)?;
        fs::write(&artifact, json)
            .with_context(|| format!("failed to write {}", artifact.display()))?;
        Ok(())
    }

    pub fn status(&self, stage: Stage) -> StageStatus {
        self.lock()
            .get(&stage)
            .map(|record| record.result.status)
            .unwrap_or(StageStatus::Pending)
    }

    pub fn snapshot(&self, stage: Stage) -> StageResult {
        self.lock()
            .get(&stage)
            .map(|record| record.result.clone())
            .unwrap_or_else(|| StageResult::new(stage))
    }

    pub fn count_for(&self, stage: Stage) -> usize {
        self.lock()
            .get(&stage)
            .map(|record| record.result.findings.len())
            .unwrap_or(0)
    }

    // The deduplicated, ordered subject list of a stage: the input set for
    // whatever stage consumes it downstream.
    pub fn subjects(&self, stage: Stage) -> Vec<String> {
        let stages = self.lock();
        let Some(record) = stages.get(&stage) else {
            return Vec::new();
        };
        let unique: BTreeSet<&String> = record
            .result
            .findings
            .iter()
            .map(|finding| &finding.subject)
            .collect();
        unique.into_iter().cloned().collect()
    }

    pub fn results(&self) -> Vec<StageResult> {
        let stages = self.lock();
        Stage::ALL
            .iter()
            .filter_map(|stage| stages.get(stage).map(|record| record.result.clone()))
            .collect()
    }
}
