//! 마이그레이션 설정 모듈
//!
//! 경로, 확장자, 변환기 등 실행 전체에 쓰이는 설정값을 담습니다.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// 기본 원본 이미지 확장자
pub const DEFAULT_SOURCE_EXTENSIONS: &[&str] = &["jpg", "jpeg"];

/// 기본 대상 이미지 확장자
pub const DEFAULT_TARGET_EXTENSION: &str = "tga";

/// 참조를 검사할 기본 텍스트 에셋 확장자
pub const DEFAULT_REFERENCE_EXTENSIONS: &[&str] =
    &["shader", "skin", "cfg", "script", "arena", "bot"];

/// 기본 외부 변환기 (ImageMagick)
pub const DEFAULT_CONVERTER: &str = "convert";

/// 기본 매핑 리포트 파일 이름
pub const DEFAULT_REPORT_NAME: &str = "jpeg_to_tga_mapping.txt";

/// 상대 경로에서 한 번 더 제거해 보는 하위 접두사
pub const DEFAULT_STRIP_PREFIX: &str = "assets/";

/// 기본 동시 변환 수
pub const DEFAULT_JOBS: usize = 8;

/// 기본 변환 제한 시간 (초)
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// 마이그레이션 실행 설정
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    /// 탐색 루트이자 참조 경로의 기준이 되는 에셋 폴더
    pub asset_root: PathBuf,
    /// 리포트 경로 표기의 기준 폴더 (None이면 에셋 폴더의 부모)
    pub project_root: Option<PathBuf>,
    /// 매핑 리포트 경로 (None이면 프로젝트 루트의 기본 이름)
    pub report_path: Option<PathBuf>,
    /// 외부 변환기 프로그램
    pub converter: String,
    /// 원본/대상 경로 앞에 붙는 변환기 인자
    pub converter_args: Vec<String>,
    /// 동시 변환 수
    pub jobs: usize,
    /// 변환 하나당 제한 시간
    pub timeout: Duration,
    pub source_extensions: Vec<String>,
    pub target_extension: String,
    pub reference_extensions: Vec<String>,
    pub strip_prefix: String,
    /// 이미지 파일 이름 glob 필터
    pub pattern: Option<String>,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("."),
            project_root: None,
            report_path: None,
            converter: DEFAULT_CONVERTER.to_string(),
            converter_args: Vec::new(),
            jobs: DEFAULT_JOBS,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            source_extensions: to_strings(DEFAULT_SOURCE_EXTENSIONS),
            target_extension: DEFAULT_TARGET_EXTENSION.to_string(),
            reference_extensions: to_strings(DEFAULT_REFERENCE_EXTENSIONS),
            strip_prefix: DEFAULT_STRIP_PREFIX.to_string(),
            pattern: None,
        }
    }
}

impl MigrationConfig {
    /// 에셋 루트를 지정한 기본 설정 생성
    pub fn new(asset_root: impl Into<PathBuf>) -> Self {
        Self {
            asset_root: asset_root.into(),
            ..Default::default()
        }
    }

    /// 프로젝트 루트 설정
    pub fn with_project_root(mut self, project_root: Option<PathBuf>) -> Self {
        self.project_root = project_root;
        self
    }

    /// 리포트 경로 설정
    pub fn with_report_path(mut self, report_path: Option<PathBuf>) -> Self {
        self.report_path = report_path;
        self
    }

    /// 변환기 프로그램 설정
    pub fn with_converter(mut self, converter: impl Into<String>) -> Self {
        self.converter = converter.into();
        self
    }

    /// 변환기 앞쪽 인자 설정
    pub fn with_converter_args(mut self, args: Vec<String>) -> Self {
        self.converter_args = args;
        self
    }

    /// 동시 변환 수 설정 (최소 1)
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// 변환 제한 시간 설정
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_source_extensions(mut self, extensions: Vec<String>) -> Self {
        self.source_extensions = extensions;
        self
    }

    pub fn with_target_extension(mut self, extension: impl Into<String>) -> Self {
        self.target_extension = extension.into().trim_start_matches('.').to_string();
        self
    }

    pub fn with_reference_extensions(mut self, extensions: Vec<String>) -> Self {
        self.reference_extensions = extensions;
        self
    }

    pub fn with_strip_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.strip_prefix = prefix.into();
        self
    }

    /// 이미지 파일 이름 필터 설정
    pub fn with_pattern(mut self, pattern: Option<String>) -> Self {
        self.pattern = pattern;
        self
    }

    /// 실제로 쓰일 프로젝트 루트
    pub fn resolved_project_root(&self) -> PathBuf {
        match &self.project_root {
            Some(root) => root.clone(),
            None => self
                .asset_root
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| self.asset_root.clone()),
        }
    }

    /// 실제로 쓰일 리포트 경로
    pub fn resolved_report_path(&self) -> PathBuf {
        match &self.report_path {
            Some(path) => path.clone(),
            None => self.resolved_project_root().join(DEFAULT_REPORT_NAME),
        }
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MigrationConfig::default();
        assert_eq!(config.jobs, 8);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.source_extensions, vec!["jpg", "jpeg"]);
        assert_eq!(config.target_extension, "tga");
        assert_eq!(config.reference_extensions.len(), 6);
        assert_eq!(config.converter, "convert");
    }

    #[test]
    fn test_resolved_paths() {
        let config = MigrationConfig::new("/home/user/Quake3/assets");
        assert_eq!(
            config.resolved_project_root(),
            PathBuf::from("/home/user/Quake3")
        );
        assert_eq!(
            config.resolved_report_path(),
            PathBuf::from("/home/user/Quake3/jpeg_to_tga_mapping.txt")
        );

        let config = config
            .with_project_root(Some(PathBuf::from("/tmp/proj")))
            .with_report_path(Some(PathBuf::from("/tmp/map.txt")));
        assert_eq!(config.resolved_project_root(), PathBuf::from("/tmp/proj"));
        assert_eq!(config.resolved_report_path(), PathBuf::from("/tmp/map.txt"));
    }

    #[test]
    fn test_builder() {
        let config = MigrationConfig::new("assets")
            .with_jobs(0)
            .with_target_extension(".png")
            .with_converter("magick");
        assert_eq!(config.jobs, 1);
        assert_eq!(config.target_extension, "png");
        assert_eq!(config.converter, "magick");
    }
}
