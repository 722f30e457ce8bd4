//! 참조 갱신 모듈
//!
//! 텍스트 에셋 파일 안의 이미지 파일 이름 참조를 변환된 파일 이름으로 바꿉니다.
//!
//! 변환된 이미지마다 세 가지 표기를 순서대로 시도합니다.
//!
//! 1. 에셋 루트 기준 상대 경로 (`models/player/head.jpg`)
//! 2. 1에서 하위 접두사(기본값 `assets/`)를 한 번 제거한 경로
//! 3. 폴더 없는 파일 이름 (`head.jpg`)
//!
//! 각 표기는 정규식 이스케이프된 리터럴로 대소문자 무시 매칭되며, 매칭된 텍스트는
//! 대상 표기로 통째로 교체됩니다 (원래 대소문자는 보존되지 않음).
//!
//! 같은 텍스트가 여러 이미지의 표기와 겹치면 매핑 순서(원본 경로 순)대로 적용되고,
//! 앞에서 이미 바뀐 텍스트는 뒤의 표기에서 다시 세지 않습니다. 파일 이름이 같은
//! 이미지가 여러 폴더에 있는 트리에서는 이 순서 때문에 치환 수가 실제 의도와
//! 다를 수 있습니다.

use memmap2::Mmap;
use regex::{NoExpand, Regex, RegexBuilder};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::converter::ConversionMap;
use crate::error::{MigrateError, Result};

/// 이 크기 이상의 파일은 메모리 매핑으로 읽음
pub const MMAP_THRESHOLD: u64 = 10 * 1024 * 1024;

/// 파일 하나의 갱신 결과
#[derive(Debug, Clone)]
pub struct UpdateResult {
    /// 검사한 파일 경로
    pub path: PathBuf,
    /// 내용이 바뀌어 다시 쓰였는지 여부
    pub updated: bool,
    /// 치환 횟수
    pub replacements: usize,
    /// 에러 메시지 (읽기/쓰기 실패 시)
    pub error: Option<String>,
}

impl UpdateResult {
    /// 갱신 성공 결과 생성
    pub fn updated(path: PathBuf, replacements: usize) -> Self {
        Self {
            path,
            updated: true,
            replacements,
            error: None,
        }
    }

    /// 변경 없음 결과 생성
    pub fn unchanged(path: PathBuf) -> Self {
        Self {
            path,
            updated: false,
            replacements: 0,
            error: None,
        }
    }

    /// 실패 결과 생성
    pub fn failure(path: PathBuf, error: String) -> Self {
        Self {
            path,
            updated: false,
            replacements: 0,
            error: Some(error),
        }
    }
}

/// 바이트를 UTF-8로 해석하되, 잘못된 바이트 시퀀스는 대체 문자 없이 버림
///
/// # Examples
/// ```
/// use asset_migrate::rewriter::decode_lossy;
///
/// assert_eq!(decode_lossy(b"map \xff\xfehead.jpg"), "map head.jpg");
/// assert_eq!(decode_lossy("텍스처.jpg".as_bytes()), "텍스처.jpg");
/// ```
pub fn decode_lossy(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());
    }
    text
}

/// 파일을 읽어 손실 허용 디코딩
///
/// 큰 파일은 메모리 매핑을 사용합니다. 열기 자체가 실패하면 에러입니다.
pub fn read_text(path: &Path) -> Result<String> {
    let open_error = |e: std::io::Error| MigrateError::FileOpenError {
        file: path.to_path_buf(),
        reason: e.to_string(),
    };

    let file = File::open(path).map_err(open_error)?;
    let file_size = file.metadata().map(|m| m.len()).unwrap_or(0);

    if file_size >= MMAP_THRESHOLD {
        let mmap = unsafe {
            Mmap::map(&file).map_err(|e| MigrateError::FileOpenError {
                file: path.to_path_buf(),
                reason: format!("메모리 매핑 실패: {}", e),
            })?
        };
        Ok(decode_lossy(&mmap))
    } else {
        let bytes = fs::read(path).map_err(open_error)?;
        Ok(decode_lossy(&bytes))
    }
}

/// 임시 파일에 쓴 뒤 rename으로 교체 (부분적으로 쓰인 상태가 보이지 않음)
pub fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let write_error = |reason: String| MigrateError::WriteError {
        file: path.to_path_buf(),
        reason,
    };

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut temp = NamedTempFile::new_in(dir).map_err(|e| write_error(e.to_string()))?;
    temp.write_all(content.as_bytes())
        .map_err(|e| write_error(e.to_string()))?;

    if let Ok(metadata) = fs::metadata(path) {
        let _ = temp.as_file().set_permissions(metadata.permissions());
    }

    temp.persist(path)
        .map_err(|e| write_error(e.error.to_string()))?;
    Ok(())
}

/// 경로를 `/` 구분자 문자열로 변환
fn to_slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// 이미지 하나에 대한 세 가지 파일 이름 표기
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenameVariants {
    /// 에셋 루트 기준 상대 경로
    pub relative: String,
    /// 하위 접두사를 한 번 제거한 상대 경로
    pub short: String,
    /// 파일 이름
    pub file_name: String,
}

impl FilenameVariants {
    /// 경로에서 표기 유도
    ///
    /// 에셋 루트 밖의 경로는 전체 경로를 그대로 상대 경로로 씁니다. 접두사 제거는
    /// 경로 안의 첫 번째 등장 위치에 적용됩니다.
    pub fn derive(path: &Path, asset_root: &Path, strip_prefix: &str) -> Self {
        let relative = match path.strip_prefix(asset_root) {
            Ok(rel) => to_slash(rel),
            Err(_) => to_slash(path),
        };

        let short = if strip_prefix.is_empty() {
            relative.clone()
        } else {
            relative.replacen(strip_prefix, "", 1)
        };

        let file_name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            relative,
            short,
            file_name,
        }
    }

    /// 우선순위 순서의 표기 목록
    pub fn in_order(&self) -> [&str; 3] {
        [&self.relative, &self.short, &self.file_name]
    }
}

/// 컴파일된 치환 규칙 하나
#[derive(Debug)]
struct Substitution {
    pattern: Regex,
    replacement: String,
}

/// 변환 매핑을 바탕으로 텍스트 파일의 참조를 바꾸는 갱신기
#[derive(Debug)]
pub struct ReferenceRewriter {
    substitutions: Vec<Substitution>,
}

impl ReferenceRewriter {
    /// 매핑의 모든 (원본, 대상) 쌍에 대해 치환 규칙을 미리 컴파일
    pub fn new(map: &ConversionMap, asset_root: &Path, strip_prefix: &str) -> Result<Self> {
        let mut substitutions = Vec::with_capacity(map.len() * 3);

        for (source, destination) in map {
            let from = FilenameVariants::derive(source, asset_root, strip_prefix);
            let to = FilenameVariants::derive(destination, asset_root, strip_prefix);

            for (pattern, replacement) in from.in_order().into_iter().zip(to.in_order()) {
                if pattern.is_empty() {
                    continue;
                }
                let regex = RegexBuilder::new(&regex::escape(pattern))
                    .case_insensitive(true)
                    .build()
                    .map_err(|_| MigrateError::InvalidPattern {
                        pattern: pattern.to_string(),
                    })?;
                substitutions.push(Substitution {
                    pattern: regex,
                    replacement: replacement.to_string(),
                });
            }
        }

        Ok(Self { substitutions })
    }

    /// 치환 규칙 수
    pub fn len(&self) -> usize {
        self.substitutions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.substitutions.is_empty()
    }

    /// 문자열에 모든 치환을 누적 적용하고 (결과, 치환 횟수) 반환
    ///
    /// 각 단계의 횟수는 그 단계 직전 내용에서의 매칭 수이며, 내용이 실제로
    /// 바뀐 단계만 더해집니다.
    pub fn rewrite_content(&self, content: &str) -> (String, usize) {
        let mut current = content.to_string();
        let mut replacements = 0;

        for sub in &self.substitutions {
            let count = sub.pattern.find_iter(&current).count();
            if count == 0 {
                continue;
            }

            let replaced = sub
                .pattern
                .replace_all(&current, NoExpand(&sub.replacement))
                .into_owned();
            if replaced != current {
                replacements += count;
                current = replaced;
            }
        }

        (current, replacements)
    }

    /// 파일 하나의 참조 갱신
    ///
    /// 내용이 바뀐 경우에만 파일 전체를 다시 씁니다. 모든 에러는 결과에 담깁니다.
    pub fn update_file(&self, path: &Path) -> UpdateResult {
        let original = match read_text(path) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "참조 파일 읽기 실패");
                return UpdateResult::failure(path.to_path_buf(), e.to_string());
            }
        };

        let (content, replacements) = self.rewrite_content(&original);
        if content == original {
            return UpdateResult::unchanged(path.to_path_buf());
        }

        match write_atomic(path, &content) {
            Ok(()) => {
                tracing::debug!(file = %path.display(), replacements, "참조 갱신");
                UpdateResult::updated(path.to_path_buf(), replacements)
            }
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "참조 파일 쓰기 실패");
                UpdateResult::failure(path.to_path_buf(), e.to_string())
            }
        }
    }

    /// 모든 파일을 하나씩 순서대로 갱신
    ///
    /// 파일마다 `on_progress(처리 수, 전체 수)`가 호출됩니다.
    pub fn update_all<F>(&self, files: &[PathBuf], mut on_progress: F) -> Vec<UpdateResult>
    where
        F: FnMut(usize, usize),
    {
        let total = files.len();
        files
            .iter()
            .enumerate()
            .map(|(i, path)| {
                let result = self.update_file(path);
                on_progress(i + 1, total);
                result
            })
            .collect()
    }
}
