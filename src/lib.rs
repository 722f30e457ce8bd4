//! asset-migrate - JPEG → TGA 에셋 마이그레이션 도구
//!
//! 에셋 폴더의 이미지를 외부 변환기로 일괄 변환하고, 텍스트 에셋 파일 안의
//! 파일 이름 참조를 변환된 이름으로 갱신하는 CLI 도구입니다.
//!
//! # 주요 기능
//!
//! - 🚀 **병렬 변환**: 고정 크기 워커 풀로 외부 변환기를 동시에 실행 (변환당 제한 시간)
//! - 🔁 **참조 갱신**: 상대 경로 / 접두사 제거 경로 / 파일 이름 순서의 대소문자 무시 치환
//! - 🛡️ **원자적 쓰기**: 바뀐 파일만 임시 파일 + rename으로 교체
//! - 📈 **상세 통계**: 변환/실패/갱신/치환 수와 예시 출력
//! - 🗺️ **매핑 리포트**: 성공한 변환을 원본 경로 순으로 기록
//! - 🧪 **드라이런 모드**: 실제 변환 없이 대상 이미지 목록 확인
//!
//! # 예제
//!
//! ```bash
//! # 기본 사용법 (ImageMagick `convert` 사용)
//! asset-migrate -i ./Quake3/assets
//!
//! # 동시 변환 수와 제한 시간 조정
//! asset-migrate -i ./assets -j 4 --timeout 60
//!
//! # 변환 대상만 확인
//! asset-migrate -i ./assets --dry-run
//! ```

pub mod cli;
pub mod config;
pub mod converter;
pub mod error;
pub mod logging;
pub mod pattern;
pub mod pipeline;
pub mod report;
pub mod rewriter;
pub mod scanner;
pub mod stats;

// Re-exports for convenient access
pub use cli::Args;
pub use config::MigrationConfig;
pub use converter::{
    ConversionMap, ConversionOutcome, ConversionResult, ConversionTask, Converter,
    ExternalConverter,
};
pub use error::{MigrateError, Result};
pub use pattern::PatternMatcher;
pub use pipeline::{run, run_with_converter, MigrationReport};
pub use report::RunSummary;
pub use rewriter::{decode_lossy, ReferenceRewriter, UpdateResult};
pub use stats::{format_duration, Statistics};
