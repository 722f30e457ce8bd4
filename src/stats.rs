//! 통계 및 유틸리티 모듈
//!
//! 변환 진행 중의 실시간 통계 수집과 진행률 출력 주기, 시간 포맷팅을 담당합니다.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use crate::converter::ConversionResult;

/// 변환 진행률 출력 주기
pub const CONVERSION_PROGRESS_INTERVAL: usize = 100;

/// 참조 갱신 진행률 출력 주기
pub const REWRITE_PROGRESS_INTERVAL: usize = 50;

/// 실시간 처리 통계 구조체
///
/// 워커 스레드에서 동시에 갱신되므로 원자적 카운터를 사용합니다.
#[derive(Debug, Default)]
pub struct Statistics {
    /// 발견된 이미지 수
    pub total_images: usize,
    /// 변환 성공 수
    pub converted: AtomicUsize,
    /// 변환 실패 수
    pub failed: AtomicUsize,
    /// 처리 시작 시간
    start_time: Option<Instant>,
}

impl Statistics {
    /// 새 통계 인스턴스 생성
    pub fn new(total_images: usize) -> Self {
        Self {
            total_images,
            start_time: Some(Instant::now()),
            ..Default::default()
        }
    }

    /// 변환 결과 하나 반영
    pub fn record_conversion(&self, result: &ConversionResult) {
        if result.is_success() {
            self.converted.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// 성공 수 반환
    pub fn get_converted(&self) -> usize {
        self.converted.load(Ordering::Relaxed)
    }

    /// 실패 수 반환
    pub fn get_failed(&self) -> usize {
        self.failed.load(Ordering::Relaxed)
    }

    /// 완료 수 반환
    pub fn completed(&self) -> usize {
        self.get_converted() + self.get_failed()
    }

    /// 경과 시간 반환
    pub fn elapsed(&self) -> Duration {
        self.start_time
            .map(|t| t.elapsed())
            .unwrap_or(Duration::ZERO)
    }
}

/// 진행률을 출력할 차례인지 확인
///
/// `interval`의 배수마다, 그리고 마지막 완료 시에는 항상 true
///
/// # Examples
/// ```
/// use asset_migrate::stats::should_report_progress;
///
/// assert!(should_report_progress(100, 250, 100));
/// assert!(!should_report_progress(101, 250, 100));
/// assert!(should_report_progress(250, 250, 100));
/// ```
pub fn should_report_progress(completed: usize, total: usize, interval: usize) -> bool {
    completed == total || (interval > 0 && completed % interval == 0)
}

/// 경과 시간을 읽기 쉬운 형식으로 변환
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if secs >= 3600 {
        let hours = secs / 3600;
        let mins = (secs % 3600) / 60;
        format!("{}시간 {}분", hours, mins)
    } else if secs >= 60 {
        let mins = secs / 60;
        let remaining_secs = secs % 60;
        format!("{}분 {}초", mins, remaining_secs)
    } else if secs > 0 {
        format!("{}.{:03}초", secs, millis)
    } else {
        format!("{}ms", millis)
    }
}
