//! CLI 인자 파싱 모듈
//!
//! clap을 사용한 명령줄 인자 정의 및 파싱을 담당합니다.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{
    MigrationConfig, DEFAULT_CONVERTER, DEFAULT_JOBS, DEFAULT_STRIP_PREFIX,
    DEFAULT_TARGET_EXTENSION, DEFAULT_TIMEOUT_SECS,
};

/// asset-migrate CLI 인자 구조체
#[derive(Parser, Debug)]
#[command(
    name = "asset-migrate",
    author = "YourName <your@email.com>",
    version,
    about = "JPEG → TGA 에셋 마이그레이션 도구 - 이미지를 일괄 변환하고 에셋 파일의 참조를 갱신합니다",
    long_about = r#"
ASSET MIGRATOR (JPEG → TGA)
===========================

에셋 폴더의 모든 JPEG 이미지를 외부 변환기로 TGA로 변환한 뒤,
셰이더/스킨/설정 파일 등의 파일 이름 참조를 새 확장자로 바꿉니다.

특징:
  • 고정 크기 워커 풀로 병렬 변환 (변환당 제한 시간)
  • 대소문자 무시 참조 치환 (상대 경로 / 접두사 제거 경로 / 파일 이름)
  • 변환 매핑 리포트 및 상세 통계

예제:
  asset-migrate -i ./Quake3/assets
  asset-migrate -i ./assets -j 4 --timeout 60
  asset-migrate -i ./assets --dry-run
  asset-migrate -i ./assets --converter magick --summary-json summary.json
"#
)]
pub struct Args {
    /// 이미지와 에셋 파일이 있는 에셋 루트 폴더
    #[arg(short, long)]
    pub input: PathBuf,

    /// 리포트 경로 표기의 기준 폴더 (기본값: 에셋 폴더의 부모)
    #[arg(long)]
    pub project_root: Option<PathBuf>,

    /// 매핑 리포트 파일 경로 (기본값: <project-root>/jpeg_to_tga_mapping.txt)
    #[arg(short = 'o', long)]
    pub report: Option<PathBuf>,

    /// 외부 변환기 프로그램 (`<converter> <원본> <대상>` 형태로 실행)
    #[arg(long, default_value = DEFAULT_CONVERTER)]
    pub converter: String,

    /// 원본/대상 경로 앞에 붙일 변환기 인자 (반복 가능, 예: --converter magick --converter-arg convert)
    #[arg(long = "converter-arg", allow_hyphen_values = true)]
    pub converter_args: Vec<String>,

    /// 동시 변환 수
    #[arg(short = 'j', long, default_value_t = DEFAULT_JOBS)]
    pub jobs: usize,

    /// 변환 하나당 제한 시간 (초)
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// 원본 이미지 확장자 (쉼표로 구분)
    #[arg(long, value_delimiter = ',', default_value = "jpg,jpeg")]
    pub source_ext: Vec<String>,

    /// 변환 대상 확장자
    #[arg(long, default_value = DEFAULT_TARGET_EXTENSION)]
    pub target_ext: String,

    /// 참조를 검사할 파일 확장자 (쉼표로 구분)
    #[arg(
        long,
        value_delimiter = ',',
        default_value = "shader,skin,cfg,script,arena,bot"
    )]
    pub ref_ext: Vec<String>,

    /// 상대 경로에서 한 번 더 제거해 볼 접두사
    #[arg(long, default_value = DEFAULT_STRIP_PREFIX)]
    pub strip_prefix: String,

    /// 이미지 파일 이름 패턴 필터 (glob 형식, 예: "*_diffuse*")
    #[arg(short, long)]
    pub pattern: Option<String>,

    /// 상세 출력 모드
    #[arg(short, long)]
    pub verbose: bool,

    /// 실제 변환 없이 변환될 이미지 목록만 표시
    #[arg(long)]
    pub dry_run: bool,

    /// 에러 로그 파일 경로
    #[arg(long)]
    pub log: Option<PathBuf>,

    /// 실행 요약을 JSON으로 저장할 경로
    #[arg(long)]
    pub summary_json: Option<PathBuf>,
}

impl Args {
    /// 인자를 마이그레이션 설정으로 변환
    pub fn to_config(&self) -> MigrationConfig {
        MigrationConfig::new(self.input.clone())
            .with_project_root(self.project_root.clone())
            .with_report_path(self.report.clone())
            .with_converter(self.converter.clone())
            .with_converter_args(self.converter_args.clone())
            .with_jobs(self.jobs)
            .with_timeout(Duration::from_secs(self.timeout))
            .with_source_extensions(clean_list(&self.source_ext))
            .with_target_extension(self.target_ext.clone())
            .with_reference_extensions(clean_list(&self.ref_ext))
            .with_strip_prefix(self.strip_prefix.clone())
            .with_pattern(self.pattern.clone())
    }
}

/// 쉼표 목록의 공백과 빈 항목 정리
fn clean_list(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
