//! 파일 탐색 모듈
//!
//! 에셋 루트를 끝까지 탐색하여 변환할 이미지와 참조를 검사할 텍스트 파일을 수집합니다.

use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use crate::pattern::{has_extension, PatternMatcher};

/// 버전 관리 메타데이터 폴더 (참조 파일 탐색에서 제외)
pub const VCS_DIR: &str = ".git";

/// 원본 확장자를 가진 이미지 수집
///
/// 루트를 정규화하므로 결과는 항상 절대 경로입니다. 탐색 중 접근할 수 없는
/// 항목은 건너뜁니다. 파일을 가리키는 심볼릭 링크도 포함됩니다.
pub fn find_images(root: &Path, extensions: &[String], matcher: &PatternMatcher) -> Vec<PathBuf> {
    let root = absolute_root(root);

    let mut images: Vec<PathBuf> = WalkDir::new(&root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(is_regular_file)
        .filter(|e| has_extension(e.path(), extensions))
        .filter(|e| {
            e.file_name()
                .to_str()
                .map(|s| matcher.matches(s))
                .unwrap_or(false)
        })
        .map(DirEntry::into_path)
        .collect();

    images.sort();
    tracing::debug!(root = %root.display(), count = images.len(), "이미지 탐색 완료");
    images
}

/// 참조를 검사할 텍스트 파일 수집 (`.git` 하위 제외)
pub fn find_reference_files(root: &Path, extensions: &[String]) -> Vec<PathBuf> {
    let root = absolute_root(root);

    let mut files: Vec<PathBuf> = WalkDir::new(&root)
        .into_iter()
        .filter_entry(|e| !is_vcs_dir(e))
        .filter_map(|e| e.ok())
        .filter(is_regular_file)
        .filter(|e| has_extension(e.path(), extensions))
        .map(DirEntry::into_path)
        .collect();

    files.sort();
    tracing::debug!(root = %root.display(), count = files.len(), "참조 파일 탐색 완료");
    files
}

/// 일반 파일 또는 파일을 가리키는 링크
fn is_regular_file(entry: &DirEntry) -> bool {
    if entry.path_is_symlink() {
        entry.path().is_file()
    } else {
        entry.file_type().is_file()
    }
}

fn is_vcs_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir() && entry.file_name() == VCS_DIR
}

fn absolute_root(root: &Path) -> PathBuf {
    root.canonicalize().unwrap_or_else(|_| root.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"x").unwrap();
    }

    fn exts(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_find_images_nested() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(&root.join("a.jpg"));
        touch(&root.join("textures/base/b.JPEG"));
        touch(&root.join("models/player/deep/er/c.Jpg"));
        touch(&root.join("models/player/head.tga"));
        touch(&root.join(".git/objects/d.jpg"));

        let matcher = PatternMatcher::new(None).unwrap();
        let images = find_images(root, &exts(&["jpg", "jpeg"]), &matcher);

        // .git 하위 이미지도 변환 대상
        assert_eq!(images.len(), 4);
        for image in &images {
            assert!(image.is_absolute());
            assert!(has_extension(image, &exts(&["jpg", "jpeg"])));
        }
    }

    #[test]
    fn test_find_images_with_pattern() {
        let temp_dir = TempDir::new().unwrap();
        touch(&temp_dir.path().join("sky_up.jpg"));
        touch(&temp_dir.path().join("sky_dn.jpg"));
        touch(&temp_dir.path().join("wall.jpg"));

        let matcher = PatternMatcher::new(Some("sky_*".to_string())).unwrap();
        let images = find_images(temp_dir.path(), &exts(&["jpg"]), &matcher);

        assert_eq!(images.len(), 2);
    }

    #[test]
    fn test_find_reference_files_skips_git() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(&root.join("scripts/base.shader"));
        touch(&root.join("models/player/head_default.SKIN"));
        touch(&root.join("q3config.cfg"));
        touch(&root.join(".git/hooks/hook.cfg"));
        touch(&root.join("readme.txt"));

        let files = find_reference_files(root, &exts(&["shader", "skin", "cfg"]));

        assert_eq!(files.len(), 3);
        assert!(files.iter().all(|f| !f.to_string_lossy().contains(".git")));
    }

    #[test]
    fn test_empty_root() {
        let temp_dir = TempDir::new().unwrap();
        let matcher = PatternMatcher::new(None).unwrap();

        assert!(find_images(temp_dir.path(), &exts(&["jpg"]), &matcher).is_empty());
        assert!(find_reference_files(temp_dir.path(), &exts(&["cfg"])).is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_files_are_found() {
        use std::os::unix::fs::symlink;

        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(&root.join("real.jpg"));
        touch(&root.join("real.cfg"));
        symlink(root.join("real.jpg"), root.join("link.jpg")).unwrap();
        symlink(root.join("real.cfg"), root.join("link.cfg")).unwrap();
        // 대상이 없는 링크는 제외
        symlink(root.join("gone.jpg"), root.join("dangling.jpg")).unwrap();

        let matcher = PatternMatcher::new(None).unwrap();
        let images = find_images(root, &exts(&["jpg"]), &matcher);
        let files = find_reference_files(root, &exts(&["cfg"]));

        assert_eq!(images.len(), 2);
        assert!(images.iter().any(|p| p.ends_with("link.jpg")));
        assert_eq!(files.len(), 2);
        assert!(files.iter().any(|p| p.ends_with("link.cfg")));
    }
}
