//! asset-migrate - JPEG → TGA 에셋 마이그레이션 도구
//!
//! 메인 엔트리포인트

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;

use asset_migrate::{
    cli::Args,
    config::MigrationConfig,
    logging::init_logging,
    pipeline::{self, MigrationReport},
    report::{write_error_log, write_summary_json},
};

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    // 입력 폴더 확인 및 리포트 경로 확정
    let config = pipeline::resolve_paths(&args.to_config())?;

    // 헤더 출력
    print_header(&args, &config);

    // 드라이런 모드
    if args.dry_run {
        let images = pipeline::plan(&config)?;
        print_dry_run(&images);
        return Ok(());
    }

    let report = pipeline::run(&config).context("마이그레이션 실패")?;

    // 로그 파일 작성
    if let Some(ref log_path) = args.log {
        if report.summary.images_found > 0 {
            write_error_log(log_path, &report.conversions, &report.updates)
                .with_context(|| format!("에러 로그 저장 실패: {:?}", log_path))?;
            println!("\n{} 에러 로그 저장: {:?}", "📝".bright_cyan(), log_path);
        }
    }

    // 요약 JSON 저장
    if let Some(ref json_path) = args.summary_json {
        write_summary_json(json_path, &report.summary)?;
        println!("{} 요약 저장: {:?}", "📄".bright_cyan(), json_path);
    }

    print_verbose_failures(&args, &report);

    Ok(())
}

/// 헤더 출력
fn print_header(args: &Args, config: &MigrationConfig) {
    println!("\n{}", "═".repeat(50).bright_blue());
    println!(
        "{}",
        format!(
            " 🚀 {} → {} ASSET MIGRATOR",
            config
                .source_extensions
                .first()
                .map(|s| s.to_uppercase())
                .unwrap_or_default(),
            config.target_extension.to_uppercase()
        )
        .bright_white()
        .bold()
    );
    println!("{}", "═".repeat(50).bright_blue());
    println!("  {} 에셋 폴더: {:?}", "📂".bright_cyan(), config.asset_root);

    if !args.dry_run {
        println!(
            "  {} 매핑 리포트: {:?}",
            "📄".bright_green(),
            config.resolved_report_path()
        );
        println!(
            "  {} 변환기: {} {}",
            "⚙️".bright_yellow(),
            config.converter,
            config.converter_args.join(" ")
        );
        println!(
            "  {} 동시 변환: {}개 / 제한 시간: {}초",
            "🧵".bright_white(),
            config.jobs,
            config.timeout.as_secs()
        );
    }

    println!(
        "  {} 참조 파일 확장자: {}",
        "🔍".bright_magenta(),
        config.reference_extensions.join(", ")
    );

    if let Some(ref pattern) = config.pattern {
        println!("  {} 패턴 필터: {}", "🎯".bright_cyan(), pattern);
    }

    if args.dry_run {
        println!(
            "  {} {}",
            "⚠️".bright_yellow(),
            "드라이런 모드 (실제 변환 없음)".yellow()
        );
    }

    println!("{}", "═".repeat(50).bright_blue());
}

/// 드라이런 출력
fn print_dry_run(images: &[PathBuf]) {
    println!("\n{}", "📋 변환 예정 이미지 목록:".bright_cyan());
    for (i, path) in images.iter().enumerate() {
        println!("  {}. {}", i + 1, path.display());
    }
    println!(
        "\n{} 총 {} 개의 이미지가 변환될 예정입니다.",
        "ℹ️".bright_blue(),
        images.len().to_string().bright_green()
    );
}

/// 상세 모드에서 모든 실패 출력
fn print_verbose_failures(args: &Args, report: &MigrationReport) {
    if !args.verbose || report.conversions.failures.is_empty() {
        return;
    }

    println!("\n{}", "❌ 전체 변환 실패 목록:".bright_red());
    for failure in &report.conversions.failures {
        println!("  {} {}", "•".red(), failure.source.display());
        if let Some(ref error) = failure.error {
            println!("    {}", error.dimmed());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asset_migrate::config::DEFAULT_REPORT_NAME;

    #[test]
    fn test_print_header_dry_run() {
        let args = Args::parse_from(["asset-migrate", "-i", ".", "--dry-run"]);
        let config = args.to_config();

        // 헤더 출력은 패닉 없이 끝나야 함
        print_header(&args, &config);
        assert!(args.dry_run);
    }

    #[test]
    fn test_header_report_path_is_resolved() {
        let args = Args::parse_from(["asset-migrate", "-i", "src"]);
        let config = pipeline::resolve_paths(&args.to_config()).unwrap();
        let cwd = std::env::current_dir().unwrap().canonicalize().unwrap();

        // 상대 경로 입력이어도 실제로 쓰일 위치 (에셋 루트의 부모)
        assert_eq!(
            config.resolved_report_path(),
            cwd.join(DEFAULT_REPORT_NAME)
        );
        print_header(&args, &config);
    }
}
