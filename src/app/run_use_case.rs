use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::app::clean_use_case::{CleanOutcome, CleanUseCase};
use crate::app::merge_use_case::{MergeOutcome, MergeStats, MergeUseCase};
use crate::app::ports::{Diagnostic, DiagnosticKind, DiagnosticsPort};
use crate::config::Config;
use crate::domain::Platform;
use crate::error::Result;
use crate::pipeline::processing::platforms::{PlatformProfile, PlatformRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformStatus {
    NoFiles,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlatformRunResult {
    pub platform: Platform,
    pub status: PlatformStatus,
    pub files: Vec<CleanOutcome>,
    /// Set when discovery itself failed
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum MergeStatus {
    Merged(MergeStats),
    NothingToMerge,
    /// No platform produced output
    Skipped,
    Failed(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub platforms: Vec<PlatformRunResult>,
    pub merge: MergeStatus,
}

impl RunSummary {
    pub fn has_failures(&self) -> bool {
        self.platforms.iter().any(|p| p.status == PlatformStatus::Failed)
            || matches!(self.merge, MergeStatus::Failed(_))
    }

    pub fn exit_code(&self) -> i32 {
        if self.has_failures() {
            1
        } else {
            0
        }
    }
}

/// Input files for `profile` in `dir`, ordered by file name
pub fn discover_inputs(profile: &dyn PlatformProfile, dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();
        if profile.matches_file_name(&name) && profile.supports_extension(&extension) {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Orchestrates a full run: every enabled platform, then the merge
pub struct RunUseCase {
    config: Config,
    registry: PlatformRegistry,
    cleaner: CleanUseCase,
    merger: MergeUseCase,
    diagnostics: Arc<dyn DiagnosticsPort>,
}

impl RunUseCase {
    pub fn new(
        config: Config,
        cleaner: CleanUseCase,
        merger: MergeUseCase,
        diagnostics: Arc<dyn DiagnosticsPort>,
    ) -> Self {
        Self {
            config,
            registry: PlatformRegistry::new(),
            cleaner,
            merger,
            diagnostics,
        }
    }

    pub fn run(&self) -> RunSummary {
        let started_at = Local::now();

        let mut platforms = Vec::new();
        for profile in self.registry.profiles() {
            if !self.config.is_enabled(profile.platform()) {
                self.diagnostics.emit(Diagnostic::info(
                    DiagnosticKind::Progress,
                    format!("Skipping disabled platform {}", profile.platform()),
                ));
                continue;
            }
            platforms.push(self.run_platform(profile));
        }

        let merge = if platforms.iter().any(|p| p.status == PlatformStatus::Succeeded) {
            match self
                .merger
                .merge(&self.config.output_dir, &self.config.merged_file_name)
            {
                Ok(MergeOutcome::Merged(stats)) => MergeStatus::Merged(stats),
                Ok(MergeOutcome::NothingToMerge) => MergeStatus::NothingToMerge,
                Err(e) => {
                    self.diagnostics.emit(Diagnostic::error(
                        DiagnosticKind::FileFailed,
                        format!("Merge failed: {}", e),
                    ));
                    MergeStatus::Failed(e.to_string())
                }
            }
        } else {
            self.diagnostics.emit(Diagnostic::warn(
                DiagnosticKind::EmptyInput,
                "No platform produced output; skipping merge",
            ));
            MergeStatus::Skipped
        };

        RunSummary {
            started_at,
            finished_at: Local::now(),
            platforms,
            merge,
        }
    }

    fn run_platform(&self, profile: &dyn PlatformProfile) -> PlatformRunResult {
        let platform = profile.platform();
        let inputs = match discover_inputs(profile, &self.config.input_dir) {
            Ok(inputs) => inputs,
            Err(e) => {
                self.diagnostics.emit(Diagnostic::error(
                    DiagnosticKind::FileFailed,
                    format!("Could not list inputs for {}: {}", platform, e),
                ));
                return PlatformRunResult {
                    platform,
                    status: PlatformStatus::Failed,
                    files: Vec::new(),
                    error: Some(e.to_string()),
                };
            }
        };

        if inputs.is_empty() {
            self.diagnostics.emit(Diagnostic::info(
                DiagnosticKind::EmptyInput,
                format!("No {} files found in {}", profile.name(), self.config.input_dir.display()),
            ));
            return PlatformRunResult {
                platform,
                status: PlatformStatus::NoFiles,
                files: Vec::new(),
                error: None,
            };
        }

        let files: Vec<CleanOutcome> = inputs
            .iter()
            .map(|input| self.cleaner.clean_file(profile, input, &self.config.output_dir))
            .collect();
        let status = if files.iter().all(CleanOutcome::is_success) {
            PlatformStatus::Succeeded
        } else {
            PlatformStatus::Failed
        };

        PlatformRunResult {
            platform,
            status,
            files,
            error: None,
        }
    }
}
