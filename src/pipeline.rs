//! 마이그레이션 실행 모듈
//!
//! 탐색 → 변환 → 참조 갱신 → 리포트 순서로 단계를 실행합니다. 각 단계는 앞 단계의
//! 결과만 사용합니다.

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};

use crate::config::{MigrationConfig, DEFAULT_REPORT_NAME};
use crate::converter::{build_tasks, convert_all, ConversionOutcome, Converter, ExternalConverter};
use crate::error::{MigrateError, Result};
use crate::pattern::PatternMatcher;
use crate::report::{mapping_header, print_summary, write_mapping_report, RunSummary};
use crate::rewriter::{ReferenceRewriter, UpdateResult};
use crate::scanner::{find_images, find_reference_files};
use crate::stats::{
    should_report_progress, Statistics, CONVERSION_PROGRESS_INTERVAL, REWRITE_PROGRESS_INTERVAL,
};

/// 실행 결과
#[derive(Debug, Default)]
pub struct MigrationReport {
    pub summary: RunSummary,
    pub conversions: ConversionOutcome,
    pub updates: Vec<UpdateResult>,
    /// 작성된 매핑 리포트 경로 (이미지가 없어 일찍 끝난 경우 None)
    pub report_path: Option<PathBuf>,
}

/// 입력 경로 유효성 검사 후 정규화된 절대 경로 반환
pub fn validate_input(input: &Path) -> Result<PathBuf> {
    if !input.exists() {
        return Err(MigrateError::InputNotFound {
            path: input.to_path_buf(),
        });
    }

    if !input.is_dir() {
        return Err(MigrateError::NotADirectory {
            path: input.to_path_buf(),
        });
    }

    input
        .canonicalize()
        .map_err(|e| MigrateError::FileOpenError {
            file: input.to_path_buf(),
            reason: e.to_string(),
        })
}

/// 설정의 경로들을 절대 경로로 확정
///
/// 에셋 루트를 정규화하고, 지정되지 않은 프로젝트 루트와 리포트 경로를 채웁니다.
pub fn resolve_paths(config: &MigrationConfig) -> Result<MigrationConfig> {
    let asset_root = validate_input(&config.asset_root)?;

    let project_root = match &config.project_root {
        Some(root) => root.canonicalize().unwrap_or_else(|_| root.clone()),
        None => asset_root
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| asset_root.clone()),
    };

    let report_path = config
        .report_path
        .clone()
        .unwrap_or_else(|| project_root.join(DEFAULT_REPORT_NAME));

    Ok(MigrationConfig {
        asset_root,
        project_root: Some(project_root),
        report_path: Some(report_path),
        ..config.clone()
    })
}

/// 설정의 외부 변환기로 마이그레이션 실행
pub fn run(config: &MigrationConfig) -> Result<MigrationReport> {
    let converter = ExternalConverter::new(config.converter.clone(), config.timeout)
        .with_args(config.converter_args.clone());
    run_with_converter(config, &converter)
}

/// 주어진 변환기로 마이그레이션 실행
///
/// 항목 단위의 실패(변환/읽기/쓰기)는 결과에 기록될 뿐 실행을 멈추지 않습니다.
/// 입력 폴더 오류와 매핑 리포트 쓰기 실패만 에러로 반환됩니다.
pub fn run_with_converter<C: Converter + ?Sized>(
    config: &MigrationConfig,
    converter: &C,
) -> Result<MigrationReport> {
    let config = resolve_paths(config)?;
    let project_root = config.resolved_project_root();
    let matcher = PatternMatcher::new(config.pattern.clone())?;
    let header = mapping_header(
        config.source_extensions.first().map(String::as_str).unwrap_or("jpg"),
        &config.target_extension,
    );

    // 1. 이미지 탐색
    println!("\n{}", "[1/5] 이미지 파일 검색 중...".bright_cyan());
    let images = find_images(&config.asset_root, &config.source_extensions, &matcher);
    println!(
        "  {} 발견된 이미지 수: {}",
        "📋".bright_white(),
        images.len().to_string().bright_green()
    );

    if images.is_empty() {
        println!("{}", "⚠️ 변환할 이미지가 없습니다. 종료합니다.".yellow());
        return Ok(MigrationReport::default());
    }

    let stats = Statistics::new(images.len());

    // 2. 변환
    println!(
        "\n{}",
        format!(
            "[2/5] 이미지 {}개를 {}로 변환 중... (동시 {}개)",
            images.len(),
            config.target_extension.to_uppercase(),
            config.jobs
        )
        .bright_cyan()
    );
    tracing::info!(count = images.len(), jobs = config.jobs, "변환 시작");

    let pb = create_progress_bar(images.len());
    let tasks = build_tasks(&images, &config.target_extension);
    let results = convert_all(tasks, converter, config.jobs, |result, done, total| {
        stats.record_conversion(result);
        pb.inc(1);
        pb.set_message(format!(
            "{}/{} (성공 {} / 실패 {})",
            stats.completed(),
            stats.total_images,
            stats.get_converted(),
            stats.get_failed()
        ));
        if should_report_progress(done, total, CONVERSION_PROGRESS_INTERVAL) {
            pb.suspend(|| println!("  진행: {}/{}", done, total));
        }
    })?;
    pb.finish_with_message("완료!");

    let conversions = ConversionOutcome::from_results(results);
    println!(
        "  {} 변환 성공: {}",
        "✅".bright_green(),
        conversions.converted().to_string().green()
    );
    if conversions.failed() > 0 {
        println!(
            "  {} 변환 실패: {}",
            "❌".bright_red(),
            conversions.failed().to_string().red()
        );
    }

    // 3. 참조 파일 탐색
    println!(
        "\n{}",
        "[3/5] 이미지 참조가 있을 수 있는 파일 검색 중...".bright_cyan()
    );
    let reference_files = find_reference_files(&config.asset_root, &config.reference_extensions);
    println!(
        "  {} 검사할 파일 수: {}",
        "📋".bright_white(),
        reference_files.len().to_string().bright_green()
    );

    // 4. 참조 갱신 (순차)
    println!("\n{}", "[4/5] 파일의 참조 갱신 중...".bright_cyan());
    let rewriter = ReferenceRewriter::new(&conversions.map, &config.asset_root, &config.strip_prefix)?;
    tracing::info!(
        files = reference_files.len(),
        rules = rewriter.len(),
        "참조 갱신 시작"
    );

    let pb = create_progress_bar(reference_files.len());
    let updates = rewriter.update_all(&reference_files, |done, total| {
        pb.inc(1);
        if should_report_progress(done, total, REWRITE_PROGRESS_INTERVAL) {
            pb.suspend(|| println!("  진행: {}/{}", done, total));
        }
    });
    pb.finish_with_message("완료!");

    // 5. 요약
    println!("\n{}", "[5/5] 요약".bright_cyan());
    let summary = RunSummary::build(
        images.len(),
        &conversions,
        &updates,
        &project_root,
        stats.elapsed(),
    );
    print_summary(&summary);

    let report_path = config.resolved_report_path();
    println!(
        "\n{} 매핑 파일 생성: {:?}",
        "[INFO]".bright_blue(),
        report_path
    );
    write_mapping_report(&report_path, &header, &conversions.map, &project_root).map_err(
        |e| MigrateError::WriteError {
            file: report_path.clone(),
            reason: e.to_string(),
        },
    )?;

    println!("\n{}", "═".repeat(50).bright_blue());
    println!("{}", " ✅ 변환 완료!".bright_white().bold());
    println!("{}", "═".repeat(50).bright_blue());

    Ok(MigrationReport {
        summary,
        conversions,
        updates,
        report_path: Some(report_path),
    })
}

/// 변환 없이 변환될 이미지 목록 반환 (드라이런)
pub fn plan(config: &MigrationConfig) -> Result<Vec<PathBuf>> {
    let asset_root = validate_input(&config.asset_root)?;
    let matcher = PatternMatcher::new(config.pattern.clone())?;
    Ok(find_images(&asset_root, &config.source_extensions, &matcher))
}

/// 진행률 바 생성
fn create_progress_bar(total: usize) -> ProgressBar {
    let pb = ProgressBar::new(total as u64);
    if let Ok(style) = ProgressStyle::default_bar().template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
    ) {
        pb.set_style(style.progress_chars("█▓▒░"));
    }
    pb
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_validate_input() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("file.cfg");
        fs::write(&file, "x").unwrap();

        assert!(validate_input(temp_dir.path()).unwrap().is_absolute());
        assert!(matches!(
            validate_input(&temp_dir.path().join("missing")),
            Err(MigrateError::InputNotFound { .. })
        ));
        assert!(matches!(
            validate_input(&file),
            Err(MigrateError::NotADirectory { .. })
        ));
    }

    #[test]
    fn test_resolve_paths_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let assets = temp_dir.path().join("assets");
        fs::create_dir(&assets).unwrap();

        let resolved = resolve_paths(&MigrationConfig::new(&assets)).unwrap();
        let project = temp_dir.path().canonicalize().unwrap();

        assert_eq!(resolved.asset_root, assets.canonicalize().unwrap());
        assert_eq!(resolved.resolved_project_root(), project);
        assert_eq!(
            resolved.resolved_report_path(),
            project.join(DEFAULT_REPORT_NAME)
        );
    }

    #[test]
    fn test_run_without_images_exits_early() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.cfg"), "map a.jpg").unwrap();

        let report = run(&MigrationConfig::new(temp_dir.path())).unwrap();

        assert_eq!(report.summary.images_found, 0);
        assert!(report.report_path.is_none());
        assert_eq!(
            fs::read_to_string(temp_dir.path().join("a.cfg")).unwrap(),
            "map a.jpg"
        );
    }
}
