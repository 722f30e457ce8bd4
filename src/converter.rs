//! 이미지 변환 모듈
//!
//! 외부 변환기 프로세스 실행과 고정 크기 워커 풀을 사용한 병렬 변환을 담당합니다.

use rayon::prelude::*;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{MigrateError, Result};

/// 원본 → 변환 결과 경로 매핑 (원본 경로 순으로 정렬)
pub type ConversionMap = BTreeMap<PathBuf, PathBuf>;

/// 변환 작업 하나
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionTask {
    /// 원본 이미지 경로
    pub source: PathBuf,
    /// 같은 폴더, 같은 이름, 대상 확장자
    pub destination: PathBuf,
}

impl ConversionTask {
    /// 원본 경로에서 대상 경로를 유도하여 작업 생성
    ///
    /// # Examples
    /// ```
    /// use asset_migrate::converter::ConversionTask;
    /// use std::path::Path;
    ///
    /// let task = ConversionTask::new("/q3/models/head.jpg", "tga");
    /// assert_eq!(task.destination, Path::new("/q3/models/head.tga"));
    /// ```
    pub fn new(source: impl Into<PathBuf>, target_extension: &str) -> Self {
        let source = source.into();
        let destination = source.with_extension(target_extension);
        Self {
            source,
            destination,
        }
    }
}

/// 변환 결과
#[derive(Debug, Clone)]
pub struct ConversionResult {
    /// 원본 이미지 경로
    pub source: PathBuf,
    /// 생성된 파일 경로 (성공 시)
    pub destination: Option<PathBuf>,
    /// 에러 메시지 (실패 시)
    pub error: Option<String>,
}

impl ConversionResult {
    /// 성공 결과 생성
    pub fn success(task: ConversionTask) -> Self {
        Self {
            source: task.source,
            destination: Some(task.destination),
            error: None,
        }
    }

    /// 실패 결과 생성
    pub fn failure(task: ConversionTask, error: String) -> Self {
        Self {
            source: task.source,
            destination: None,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.destination.is_some()
    }
}

/// 이미지 한 장을 변환하는 주체
///
/// 워커 스레드 사이에서 공유되므로 `Sync`여야 합니다.
pub trait Converter: Sync {
    /// 작업의 원본을 읽어 대상 경로에 새 파일을 만듭니다.
    fn convert(&self, task: &ConversionTask) -> Result<()>;
}

/// `<program> [args..] <원본> <대상>` 형태로 실행되는 외부 변환기
#[derive(Debug, Clone)]
pub struct ExternalConverter {
    program: String,
    args: Vec<String>,
    timeout: Duration,
    poll_interval: Duration,
}

impl ExternalConverter {
    /// 새 외부 변환기 생성
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout,
            poll_interval: Duration::from_millis(20),
        }
    }

    /// 원본/대상 경로 앞에 붙일 인자 설정 (예: `magick convert`)
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    fn spawn(&self, task: &ConversionTask) -> Result<Child> {
        Command::new(&self.program)
            .args(&self.args)
            .arg(&task.source)
            .arg(&task.destination)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| MigrateError::SpawnError {
                program: self.program.clone(),
                reason: e.to_string(),
            })
    }

    /// 제한 시간까지 종료를 기다리고, 넘기면 프로세스를 종료시킵니다.
    fn wait_with_timeout(&self, child: &mut Child, task: &ConversionTask) -> Result<ExitStatus> {
        let started = Instant::now();
        loop {
            let polled = child
                .try_wait()
                .map_err(|e| MigrateError::ConversionFailed {
                    file: task.source.clone(),
                    reason: e.to_string(),
                })?;

            if let Some(status) = polled {
                return Ok(status);
            }

            if started.elapsed() >= self.timeout {
                let _ = child.kill();
                let _ = child.wait();
                tracing::warn!(
                    file = %task.source.display(),
                    "변환기가 {:?} 안에 끝나지 않아 종료시킴",
                    self.timeout
                );
                return Err(MigrateError::Timeout {
                    file: task.source.clone(),
                    timeout: self.timeout,
                });
            }

            thread::sleep(self.poll_interval);
        }
    }
}

impl Converter for ExternalConverter {
    fn convert(&self, task: &ConversionTask) -> Result<()> {
        let deadline = Instant::now() + self.timeout;
        let mut child = self.spawn(task)?;

        // 파이프가 가득 차 자식이 멈추지 않도록 stderr는 별도 스레드에서 읽음
        let stderr = child.stderr.take();
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut buf = Vec::new();
            if let Some(mut pipe) = stderr {
                let _ = pipe.read_to_end(&mut buf);
            }
            let _ = tx.send(String::from_utf8_lossy(&buf).trim().to_string());
        });

        let status = self.wait_with_timeout(&mut child, task)?;

        // 자식이 남긴 백그라운드 프로세스가 파이프를 쥐고 있으면 마감 시간까지만 기다림
        let remaining = deadline
            .saturating_duration_since(Instant::now())
            .max(self.poll_interval);
        let stderr_text = rx.recv_timeout(remaining).unwrap_or_default();

        if !status.success() {
            let reason = if stderr_text.is_empty() {
                format!("종료 상태: {}", status)
            } else {
                stderr_text
            };
            return Err(MigrateError::ConversionFailed {
                file: task.source.clone(),
                reason,
            });
        }

        if !task.destination.exists() {
            return Err(MigrateError::DestinationMissing {
                file: task.destination.clone(),
            });
        }

        Ok(())
    }
}

/// 작업 하나를 실행하여 결과로 변환 (에러는 결과 안에 담김)
pub fn run_task<C: Converter + ?Sized>(converter: &C, task: ConversionTask) -> ConversionResult {
    match converter.convert(&task) {
        Ok(()) => {
            tracing::debug!(file = %task.source.display(), "변환 성공");
            ConversionResult::success(task)
        }
        Err(e) => {
            tracing::debug!(file = %task.source.display(), error = %e, "변환 실패");
            ConversionResult::failure(task, e.to_string())
        }
    }
}

/// 최대 `jobs`개의 작업을 동시에 실행하는 워커 풀로 모든 작업 변환
///
/// 완료될 때마다 `on_progress(결과, 완료 수, 전체 수)`가 호출됩니다. 완료 순서는
/// 제출 순서와 다를 수 있습니다. 결과는 작업마다 정확히 하나씩 반환됩니다.
pub fn convert_all<C, F>(
    tasks: Vec<ConversionTask>,
    converter: &C,
    jobs: usize,
    on_progress: F,
) -> Result<Vec<ConversionResult>>
where
    C: Converter + ?Sized,
    F: Fn(&ConversionResult, usize, usize) + Sync,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs.max(1))
        .thread_name(|i| format!("convert-{}", i))
        .build()
        .map_err(|e| MigrateError::ThreadPoolError {
            reason: e.to_string(),
        })?;

    let total = tasks.len();
    let completed = AtomicUsize::new(0);

    let results: Vec<ConversionResult> = pool.install(|| {
        tasks
            .into_par_iter()
            .map(|task| {
                let result = run_task(converter, task);
                let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                on_progress(&result, done, total);
                result
            })
            .collect()
    });

    Ok(results)
}

/// 변환 결과 집계
#[derive(Debug, Default)]
pub struct ConversionOutcome {
    /// 성공한 변환만 담은 매핑
    pub map: ConversionMap,
    /// 실패한 변환 (작업 순)
    pub failures: Vec<ConversionResult>,
}

impl ConversionOutcome {
    /// 결과 목록을 성공 매핑과 실패 목록으로 분리
    pub fn from_results(results: Vec<ConversionResult>) -> Self {
        let mut outcome = Self::default();
        for result in results {
            match result.destination.clone() {
                Some(destination) => {
                    outcome.map.insert(result.source, destination);
                }
                None => outcome.failures.push(result),
            }
        }
        outcome
    }

    pub fn converted(&self) -> usize {
        self.map.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

/// 이미지 목록으로 변환 작업 생성
pub fn build_tasks(images: &[PathBuf], target_extension: &str) -> Vec<ConversionTask> {
    images
        .iter()
        .map(|image| ConversionTask::new(image.as_path(), target_extension))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// 이름에 "broken"이 들어간 파일만 실패시키는 가짜 변환기
    struct FakeConverter {
        delay: Duration,
        running: AtomicUsize,
        peak: AtomicUsize,
        seen: Mutex<Vec<PathBuf>>,
    }

    impl FakeConverter {
        fn new(delay: Duration) -> Self {
            Self {
                delay,
                running: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl Converter for FakeConverter {
        fn convert(&self, task: &ConversionTask) -> Result<()> {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            thread::sleep(self.delay);
            self.seen.lock().unwrap().push(task.source.clone());
            self.running.fetch_sub(1, Ordering::SeqCst);

            if task.source.to_string_lossy().contains("broken") {
                return Err(MigrateError::ConversionFailed {
                    file: task.source.clone(),
                    reason: "corrupt JPEG data".to_string(),
                });
            }
            Ok(())
        }
    }

    #[test]
    fn test_task_destination() {
        let task = ConversionTask::new("/q3/assets/models/player/head.jpeg", "tga");
        assert_eq!(
            task.destination,
            PathBuf::from("/q3/assets/models/player/head.tga")
        );
        assert_eq!(task.destination.parent(), task.source.parent());
        assert_eq!(task.destination.file_stem(), task.source.file_stem());

        let dotted = ConversionTask::new("/q3/sky.v2.JPG", "tga");
        assert_eq!(dotted.destination, PathBuf::from("/q3/sky.v2.tga"));
    }

    #[test]
    fn test_convert_all_one_result_per_task() {
        let images: Vec<PathBuf> = (0..40)
            .map(|i| {
                if i % 10 == 0 {
                    PathBuf::from(format!("/a/broken{}.jpg", i))
                } else {
                    PathBuf::from(format!("/a/img{}.jpg", i))
                }
            })
            .collect();
        let tasks = build_tasks(&images, "tga");
        let converter = FakeConverter::new(Duration::from_millis(5));
        let calls = AtomicUsize::new(0);
        let last = AtomicUsize::new(0);

        let results = convert_all(tasks, &converter, 4, |_, done, total| {
            calls.fetch_add(1, Ordering::SeqCst);
            last.fetch_max(done, Ordering::SeqCst);
            assert_eq!(total, 40);
        })
        .unwrap();

        assert_eq!(results.len(), 40);
        assert_eq!(calls.load(Ordering::SeqCst), 40);
        assert_eq!(last.load(Ordering::SeqCst), 40);
        assert_eq!(converter.seen.lock().unwrap().len(), 40);

        let outcome = ConversionOutcome::from_results(results);
        assert_eq!(outcome.converted(), 36);
        assert_eq!(outcome.failed(), 4);
        assert!(outcome
            .map
            .keys()
            .all(|k| !k.to_string_lossy().contains("broken")));
        for failure in &outcome.failures {
            assert!(failure.error.as_ref().unwrap().contains("corrupt JPEG data"));
        }
    }

    #[test]
    fn test_convert_all_respects_pool_width() {
        let images: Vec<PathBuf> = (0..24)
            .map(|i| PathBuf::from(format!("/a/{}.jpg", i)))
            .collect();
        let converter = FakeConverter::new(Duration::from_millis(20));

        convert_all(build_tasks(&images, "tga"), &converter, 3, |_, _, _| {}).unwrap();

        let peak = converter.peak.load(Ordering::SeqCst);
        assert!(peak <= 3, "동시 실행 수 초과: {}", peak);
        assert!(peak >= 1);
    }

    #[test]
    fn test_convert_all_empty() {
        let converter = FakeConverter::new(Duration::ZERO);
        let results = convert_all(Vec::new(), &converter, 8, |_, _, _| {}).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_spawn_failure_is_recorded() {
        let converter =
            ExternalConverter::new("definitely-not-a-real-converter-binary", Duration::from_secs(5));
        let result = run_task(&converter, ConversionTask::new("/nope/a.jpg", "tga"));

        assert!(!result.is_success());
        assert!(result.error.unwrap().contains("변환기 실행 실패"));
    }

    #[cfg(unix)]
    #[test]
    fn test_external_converter_success() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("wall.jpg");
        fs::write(&source, b"jpeg bytes").unwrap();

        let converter = ExternalConverter::new("cp", Duration::from_secs(10));
        let result = run_task(&converter, ConversionTask::new(&source, "tga"));

        assert!(result.is_success());
        assert!(temp_dir.path().join("wall.tga").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_external_converter_stderr_becomes_error() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("bad.jpg");
        fs::write(&source, b"x").unwrap();

        let converter = ExternalConverter::new("sh", Duration::from_secs(10)).with_args(vec![
            "-c".to_string(),
            "echo 'convert: improper image header' >&2; exit 1".to_string(),
            "sh".to_string(),
        ]);
        let result = run_task(&converter, ConversionTask::new(&source, "tga"));

        assert!(!result.is_success());
        assert!(result.error.unwrap().contains("improper image header"));
    }

    #[cfg(unix)]
    #[test]
    fn test_external_converter_nonzero_without_stderr() {
        let converter = ExternalConverter::new("false", Duration::from_secs(10));
        let result = run_task(&converter, ConversionTask::new("/tmp/x.jpg", "tga"));

        assert!(!result.is_success());
        assert!(result.error.unwrap().contains("종료 상태"));
    }

    #[cfg(unix)]
    #[test]
    fn test_external_converter_missing_destination() {
        let converter = ExternalConverter::new("true", Duration::from_secs(10));
        let result = run_task(
            &converter,
            ConversionTask::new("/nonexistent/dir/x.jpg", "tga"),
        );

        assert!(!result.is_success());
        assert!(result.error.unwrap().contains("생성되지 않았습니다"));
    }

    #[cfg(unix)]
    #[test]
    fn test_background_child_holding_stderr_does_not_block() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("wall.jpg");
        fs::write(&source, b"jpeg bytes").unwrap();

        let converter = ExternalConverter::new("sh", Duration::from_millis(300)).with_args(vec![
            "-c".to_string(),
            r#"cp "$1" "$2"; sleep 6 & exit 0"#.to_string(),
            "sh".to_string(),
        ]);

        let started = Instant::now();
        let results = convert_all(
            vec![ConversionTask::new(&source, "tga")],
            &converter,
            1,
            |_, _, _| {},
        )
        .unwrap();

        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(results[0].is_success());
        assert!(temp_dir.path().join("wall.tga").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_external_converter_timeout() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("slow.jpg");
        fs::write(&source, b"x").unwrap();

        let converter = ExternalConverter::new("sh", Duration::from_millis(200)).with_args(vec![
            "-c".to_string(),
            "exec sleep 5".to_string(),
            "sh".to_string(),
        ]);

        let started = Instant::now();
        let results = convert_all(
            vec![ConversionTask::new(&source, "tga")],
            &converter,
            1,
            |_, _, _| {},
        )
        .unwrap();
        assert!(started.elapsed() < Duration::from_secs(4));

        let outcome = ConversionOutcome::from_results(results);
        assert!(outcome.map.is_empty());
        assert_eq!(outcome.failed(), 1);
        assert!(outcome.failures[0]
            .error
            .as_ref()
            .unwrap()
            .contains("시간 초과"));
    }
}
