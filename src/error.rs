//! 에러 타입 정의 모듈
//!
//! thiserror를 사용한 커스텀 에러 타입을 정의합니다.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// asset-migrate 에러 타입
#[derive(Error, Debug)]
pub enum MigrateError {
    /// 입력 폴더가 존재하지 않음
    #[error("입력 폴더를 찾을 수 없습니다: {path}")]
    InputNotFound { path: PathBuf },

    /// 입력이 폴더가 아님
    #[error("입력 경로가 폴더가 아닙니다: {path}")]
    NotADirectory { path: PathBuf },

    /// 변환기 프로세스 실행 실패
    #[error("변환기 실행 실패 ({program}): {reason}")]
    SpawnError { program: String, reason: String },

    /// 변환기가 0이 아닌 종료 코드로 끝남
    #[error("변환 실패 ({file}): {reason}")]
    ConversionFailed { file: PathBuf, reason: String },

    /// 변환 시간 초과
    #[error("변환 시간 초과 ({file}): {timeout:?} 이내에 끝나지 않았습니다")]
    Timeout { file: PathBuf, timeout: Duration },

    /// 종료 코드는 성공이지만 결과 파일이 없음
    #[error("변환 결과 파일이 생성되지 않았습니다: {file}")]
    DestinationMissing { file: PathBuf },

    /// 파일 열기 실패
    #[error("파일을 열 수 없습니다 ({file}): {reason}")]
    FileOpenError { file: PathBuf, reason: String },

    /// 파일 쓰기 실패
    #[error("파일 쓰기 실패 ({file}): {reason}")]
    WriteError { file: PathBuf, reason: String },

    /// 스레드 풀 초기화 실패
    #[error("스레드 풀 초기화 실패: {reason}")]
    ThreadPoolError { reason: String },

    /// 유효하지 않은 패턴
    #[error("유효하지 않은 패턴: {pattern}")]
    InvalidPattern { pattern: String },
}

/// asset-migrate 결과 타입 별칭
pub type Result<T> = std::result::Result<T, MigrateError>;
