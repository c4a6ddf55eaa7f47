//! Markdown rendering of a run summary.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use crate::app::clean_use_case::CleanOutcome;
use crate::app::run_use_case::{MergeStatus, PlatformStatus, RunSummary};
use crate::constants::{REPORT_FILE, REPORT_PREVIEW_ROWS};
use crate::error::Result;

fn status_label(status: PlatformStatus) -> &'static str {
    match status {
        PlatformStatus::Succeeded => "成功",
        PlatformStatus::Failed => "失败",
        PlatformStatus::NoFiles => "未处理",
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn table_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

fn render_preview(out: &mut String, columns: &[String], rows: &[Vec<String>]) {
    let _ = writeln!(out, "#### 前{}行数据\n", REPORT_PREVIEW_ROWS);
    if rows.is_empty() {
        let _ = writeln!(out, "无数据\n");
        return;
    }

    let header: Vec<String> = columns.iter().map(|c| table_cell(c)).collect();
    let _ = writeln!(out, "| {} |", header.join(" | "));
    let _ = writeln!(out, "|{}", " --- |".repeat(columns.len()));
    for row in rows {
        let cells: Vec<String> = row.iter().map(|c| table_cell(c)).collect();
        let _ = writeln!(out, "| {} |", cells.join(" | "));
    }
    let _ = writeln!(out);
}

pub fn render_markdown(summary: &RunSummary) -> String {
    let mut out = String::new();
    let elapsed = summary.finished_at - summary.started_at;

    // Writing to a String cannot fail
    let _ = writeln!(out, "# 账单整合处理报告\n");
    let _ = writeln!(out, "- 开始时间: {}", summary.started_at.format("%Y-%m-%d %H:%M:%S"));
    let _ = writeln!(out, "- 结束时间: {}", summary.finished_at.format("%Y-%m-%d %H:%M:%S"));
    let _ = writeln!(out, "- 耗时: {:.2}s\n", elapsed.num_milliseconds() as f64 / 1000.0);

    let _ = writeln!(out, "## 平台状态\n");
    let _ = writeln!(out, "| 平台 | 状态 | 文件数 | 成功 | 失败 |");
    let _ = writeln!(out, "|------|------|--------|------|------|");
    for result in &summary.platforms {
        let succeeded = result.files.iter().filter(|f| f.is_success()).count();
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} | {} |",
            result.platform.display_name(),
            status_label(result.status),
            result.files.len(),
            succeeded,
            result.files.len() - succeeded
        );
    }

    let _ = writeln!(out, "\n## 文件明细\n");
    let outcomes = summary.platforms.iter().flat_map(|p| p.files.iter());
    let mut any = false;
    for outcome in outcomes {
        any = true;
        match outcome {
            CleanOutcome::Success(stats) => {
                let _ = writeln!(out, "### {}\n", file_name(&stats.input_file));
                let _ = writeln!(out, "- 平台: {}", stats.platform.display_name());
                let _ = writeln!(out, "- 输出文件: {}", file_name(&stats.output_file));
                if let Some(encoding) = stats.encoding {
                    let _ = writeln!(out, "- 编码: {}", encoding);
                }
                let _ = writeln!(out, "- 表头行: {}", stats.header_offset);
                let _ = writeln!(out, "- 原始行数: {}", stats.original_rows);
                let _ = writeln!(out, "- 最终行数: {}", stats.final_rows);
                let _ = writeln!(out, "- 删除空行: {}", stats.cleaned_rows);
                let _ = writeln!(out, "- 删除重复行: {}", stats.deduplicated_rows);
                let _ = writeln!(
                    out,
                    "- 无法解析: 时间 {} / 金额 {} / 收支 {}",
                    stats.null_times, stats.null_amounts, stats.unknown_directions
                );
                let missing = stats.reconciliation.missing();
                if !missing.is_empty() {
                    let names: Vec<&str> = missing.iter().map(|f| f.as_str()).collect();
                    let _ = writeln!(out, "- 缺失字段: {}", names.join(", "));
                }
                let _ = writeln!(out, "- 列: {}", stats.columns.join(", "));
                let _ = writeln!(
                    out,
                    "- 收入: {} / 支出: {} / 净额: {}\n",
                    stats.income_total,
                    stats.expense_total,
                    stats.net_total()
                );
                render_preview(&mut out, &stats.columns, &stats.preview);
                if !stats.type_counts.is_empty() {
                    let _ = writeln!(out, "#### 交易类型分布\n");
                    for entry in &stats.type_counts {
                        let _ = writeln!(out, "- {}: {}", entry.label, entry.count);
                    }
                    let _ = writeln!(out);
                }
            }
            CleanOutcome::Failed { input_file, error, .. } => {
                let _ = writeln!(out, "### {}\n", file_name(input_file));
                let _ = writeln!(out, "- 处理失败: {}\n", error);
            }
        }
    }
    if !any {
        let _ = writeln!(out, "没有处理任何文件\n");
    }

    let _ = writeln!(out, "## 合并结果\n");
    match &summary.merge {
        MergeStatus::Merged(stats) => {
            let _ = writeln!(out, "- 输出文件: {}", file_name(&stats.output_file));
            let _ = writeln!(out, "- 总行数: {}", stats.total_rows);
            for source in &stats.sources {
                let _ = writeln!(out, "  - {}: {} 行", file_name(&source.file), source.rows);
            }
        }
        MergeStatus::NothingToMerge => {
            let _ = writeln!(out, "- 没有可合并的文件");
        }
        MergeStatus::Skipped => {
            let _ = writeln!(out, "- 未执行（没有平台成功输出）");
        }
        MergeStatus::Failed(error) => {
            let _ = writeln!(out, "- 合并失败: {}", error);
        }
    }

    out
}

/// Write the markdown report into `output_dir`
pub fn write_report(summary: &RunSummary, output_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)?;
    let path = output_dir.join(REPORT_FILE);
    fs::write(&path, render_markdown(summary))?;
    Ok(path)
}

/// Pretty JSON form of the summary
pub fn render_json(summary: &RunSummary) -> Result<String> {
    Ok(serde_json::to_string_pretty(summary)?)
}
