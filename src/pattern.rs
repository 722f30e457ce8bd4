//! 패턴 매칭 모듈
//!
//! glob 패턴을 사용한 이미지 파일 이름 필터링과 확장자 허용 목록을 담당합니다.

use glob::{MatchOptions, Pattern};
use std::path::Path;

use crate::error::{MigrateError, Result};

/// 컴파일된 파일 이름 패턴 매처
#[derive(Default)]
pub struct PatternMatcher {
    pattern: Option<Pattern>,
}

impl PatternMatcher {
    /// 새 패턴 매처 생성
    ///
    /// # Arguments
    /// * `pattern` - 글로브 패턴 문자열 (None이면 모든 파일 매칭)
    ///
    /// # Examples
    /// ```
    /// use asset_migrate::pattern::PatternMatcher;
    ///
    /// let matcher = PatternMatcher::new(Some("*_diffuse*".to_string())).unwrap();
    /// assert!(matcher.matches("wall_DIFFUSE.jpg"));
    /// assert!(!matcher.matches("wall_normal.jpg"));
    /// ```
    pub fn new(pattern: Option<String>) -> Result<Self> {
        let compiled = match pattern {
            Some(ref p) => Some(
                Pattern::new(p)
                    .map_err(|_| MigrateError::InvalidPattern { pattern: p.clone() })?,
            ),
            None => None,
        };

        Ok(Self { pattern: compiled })
    }

    /// 파일 이름이 패턴과 일치하는지 확인 (대소문자 무시)
    ///
    /// 패턴이 없으면 항상 true
    pub fn matches(&self, file_name: &str) -> bool {
        let options = MatchOptions {
            case_sensitive: false,
            ..MatchOptions::new()
        };
        match &self.pattern {
            Some(p) => p.matches_with(file_name, options),
            None => true,
        }
    }
}

/// 경로의 확장자가 허용 목록에 있는지 확인 (대소문자 무시)
///
/// 목록의 확장자는 점 없이 (`jpg`) 또는 점과 함께 (`.jpg`) 적을 수 있습니다.
pub fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            extensions
                .iter()
                .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}
