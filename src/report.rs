//! 리포트 모듈
//!
//! 실행 요약 집계, 콘솔 요약 출력, 매핑 리포트/에러 로그/요약 JSON 저장을 담당합니다.

use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use crate::converter::{ConversionMap, ConversionOutcome};
use crate::error::{MigrateError, Result};
use crate::rewriter::UpdateResult;
use crate::stats::format_duration;

/// 요약에 표시할 변환 실패 수
pub const FAILURE_SAMPLE_LIMIT: usize = 5;

/// 요약에 표시할 갱신 파일 수
pub const UPDATED_SAMPLE_LIMIT: usize = 10;

/// 매핑 리포트 구분선 길이
pub const SEPARATOR_WIDTH: usize = 80;

/// 실패 항목 예시
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureSample {
    pub path: String,
    pub error: String,
}

/// 갱신된 파일 예시
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatedSample {
    pub path: String,
    pub replacements: usize,
}

/// 실행 요약
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// 발견된 이미지 수
    pub images_found: usize,
    /// 변환 성공 수
    pub converted: usize,
    /// 변환 실패 수
    pub failed: usize,
    /// 검사한 참조 파일 수
    pub files_scanned: usize,
    /// 다시 쓰인 파일 수
    pub files_updated: usize,
    /// 갱신 실패 파일 수
    pub update_failed: usize,
    /// 총 치환 횟수
    pub replacements: usize,
    /// 경과 시간 (초)
    pub elapsed_secs: f64,
    pub failure_samples: Vec<FailureSample>,
    pub updated_samples: Vec<UpdatedSample>,
    pub update_failure_samples: Vec<FailureSample>,
}

impl RunSummary {
    /// 변환/갱신 결과를 접어서 요약 생성
    ///
    /// 경로는 프로젝트 루트 기준으로 표기됩니다.
    pub fn build(
        images_found: usize,
        conversions: &ConversionOutcome,
        updates: &[UpdateResult],
        project_root: &Path,
        elapsed: Duration,
    ) -> Self {
        let updated: Vec<&UpdateResult> = updates.iter().filter(|r| r.updated).collect();
        let update_failures: Vec<&UpdateResult> =
            updates.iter().filter(|r| r.error.is_some()).collect();

        Self {
            images_found,
            converted: conversions.converted(),
            failed: conversions.failed(),
            files_scanned: updates.len(),
            files_updated: updated.len(),
            update_failed: update_failures.len(),
            replacements: updated.iter().map(|r| r.replacements).sum(),
            elapsed_secs: elapsed.as_secs_f64(),
            failure_samples: conversions
                .failures
                .iter()
                .take(FAILURE_SAMPLE_LIMIT)
                .map(|f| FailureSample {
                    path: f.source.display().to_string(),
                    error: f.error.clone().unwrap_or_else(|| "알 수 없는 오류".to_string()),
                })
                .collect(),
            updated_samples: updated
                .iter()
                .take(UPDATED_SAMPLE_LIMIT)
                .map(|r| UpdatedSample {
                    path: relative_display(&r.path, project_root),
                    replacements: r.replacements,
                })
                .collect(),
            update_failure_samples: update_failures
                .iter()
                .take(FAILURE_SAMPLE_LIMIT)
                .map(|r| FailureSample {
                    path: r.path.display().to_string(),
                    error: r.error.clone().unwrap_or_default(),
                })
                .collect(),
        }
    }
}

/// 기준 폴더에 대한 상대 경로 문자열 (`/` 구분자). 기준 밖이면 전체 경로.
pub fn relative_display(path: &Path, base: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

/// 확장자의 표시용 이름 (`jpg` → `JPEG`)
pub fn format_label(extension: &str) -> String {
    let ext = extension.trim_start_matches('.');
    if ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg") {
        "JPEG".to_string()
    } else {
        ext.to_uppercase()
    }
}

/// 매핑 리포트 헤더
pub fn mapping_header(source_extension: &str, target_extension: &str) -> String {
    format!(
        "{} to {} Conversion Mapping",
        format_label(source_extension),
        format_label(target_extension)
    )
}

/// 매핑 리포트 작성
///
/// 헤더, 구분선, 빈 줄 뒤에 성공한 변환을 원본 경로 순으로 한 줄씩 씁니다.
pub fn write_mapping_report(
    report_path: &Path,
    header: &str,
    map: &ConversionMap,
    project_root: &Path,
) -> std::io::Result<()> {
    let mut writer = BufWriter::new(File::create(report_path)?);

    writeln!(writer, "{}", header)?;
    writeln!(writer, "{}", "=".repeat(SEPARATOR_WIDTH))?;
    writeln!(writer)?;

    for (source, destination) in map {
        writeln!(
            writer,
            "{} -> {}",
            relative_display(source, project_root),
            relative_display(destination, project_root)
        )?;
    }

    writer.flush()
}

/// 요약을 JSON으로 저장
pub fn write_summary_json(path: &Path, summary: &RunSummary) -> Result<()> {
    let write_error = |reason: String| MigrateError::WriteError {
        file: path.to_path_buf(),
        reason,
    };

    let file = File::create(path).map_err(|e| write_error(e.to_string()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, summary).map_err(|e| write_error(e.to_string()))?;
    writer.flush().map_err(|e| write_error(e.to_string()))
}

/// 에러 로그 파일 작성
pub fn write_error_log(
    log_path: &Path,
    conversions: &ConversionOutcome,
    updates: &[UpdateResult],
) -> std::io::Result<()> {
    let update_failures: Vec<&UpdateResult> =
        updates.iter().filter(|r| r.error.is_some()).collect();
    let mut log_file = BufWriter::new(File::create(log_path)?);

    writeln!(log_file, "asset-migrate 에러 로그")?;
    writeln!(log_file, "생성 시간: {}", unix_now())?;
    writeln!(
        log_file,
        "총 에러 수: {}",
        conversions.failures.len() + update_failures.len()
    )?;
    writeln!(log_file, "{}", "=".repeat(50))?;

    for failure in &conversions.failures {
        writeln!(log_file, "\n[변환] 파일: {:?}", failure.source)?;
        writeln!(
            log_file,
            "에러: {}",
            failure.error.as_deref().unwrap_or("알 수 없는 오류")
        )?;
    }

    for failure in update_failures {
        writeln!(log_file, "\n[갱신] 파일: {:?}", failure.path)?;
        writeln!(log_file, "에러: {}", failure.error.as_deref().unwrap_or_default())?;
    }

    log_file.flush()
}

/// 현재 시간 문자열 반환
fn unix_now() -> String {
    use std::time::SystemTime;
    let duration = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default();
    format!("Unix timestamp: {}", duration.as_secs())
}

/// 콘솔 요약 출력
pub fn print_summary(summary: &RunSummary) {
    println!("\n{}", "═".repeat(50).bright_blue());
    println!("{}", " 📊 마이그레이션 통계".bright_white().bold());
    println!("{}", "═".repeat(50).bright_blue());

    println!(
        "  {} 발견한 이미지:   {}",
        "🖼️".bright_cyan(),
        summary.images_found
    );
    println!(
        "  {} 변환 성공:       {}",
        "✅".bright_green(),
        summary.converted.to_string().green()
    );

    if summary.failed > 0 {
        println!(
            "  {} 변환 실패:       {}",
            "❌".bright_red(),
            summary.failed.to_string().red()
        );
    } else {
        println!("  {} 변환 실패:       {}", "✅".bright_green(), "0".green());
    }

    println!(
        "  {} 검사한 파일:     {}",
        "📁".bright_cyan(),
        summary.files_scanned
    );
    println!(
        "  {} 갱신한 파일:     {}",
        "📝".bright_yellow(),
        summary.files_updated.to_string().green()
    );
    println!(
        "  {} 참조 치환:       {}",
        "🔁".bright_magenta(),
        summary.replacements
    );
    println!(
        "  {} 처리 시간:       {}",
        "⏱️".bright_cyan(),
        format_duration(Duration::from_secs_f64(summary.elapsed_secs))
    );

    println!("{}", "═".repeat(50).bright_blue());

    if !summary.failure_samples.is_empty() {
        println!(
            "\n{} (처음 {}개)",
            "❌ 변환 실패 파일:".bright_red(),
            FAILURE_SAMPLE_LIMIT
        );
        for failure in &summary.failure_samples {
            println!("  {} {}: {}", "•".red(), failure.path, failure.error.dimmed());
        }
    }

    if !summary.updated_samples.is_empty() {
        println!(
            "\n{} (처음 {}개)",
            "📝 참조가 갱신된 파일:".bright_cyan(),
            UPDATED_SAMPLE_LIMIT
        );
        for sample in &summary.updated_samples {
            println!(
                "  {} {} ({}회 치환)",
                "•".green(),
                sample.path,
                sample.replacements
            );
        }
    }

    if !summary.update_failure_samples.is_empty() {
        println!(
            "\n{} {}개:",
            "❌ 갱신 실패 파일".bright_red(),
            summary.update_failed.to_string().red()
        );
        for failure in &summary.update_failure_samples {
            println!("  {} {}: {}", "•".red(), failure.path, failure.error.dimmed());
        }
    }
}
