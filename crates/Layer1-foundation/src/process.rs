//! Bounded process execution
//!
//! 권한 채널과 서비스 명령은 모두 외부 프로세스 호출이라 느릴 수 있습니다.
//! 제한 시간을 넘기면 자식 프로세스를 종료하고 `Error::Timeout`을 반환하며,
//! 재시도 여부는 호출자가 결정합니다.

use crate::{Error, Result};
use std::io::Read;
use std::process::{Child, Command, Output, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// 기본 제한 시간 (초)
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// kill 이후 종료 확인을 기다리는 최대 시간
const REAP_GRACE: Duration = Duration::from_secs(1);

/// 명령 실행 후 종료까지 대기 (제한 시간 포함)
///
/// stdin은 닫힌 상태로 실행합니다. stdout/stderr는 파이프가 막히지 않도록
/// 별도 스레드에서 읽습니다.
pub fn run_bounded(mut command: Command, timeout: Duration) -> Result<Output> {
    let label = describe(&command);
    debug!(command = %label, timeout_secs = timeout.as_secs(), "Running external command");

    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = command
        .spawn()
        .map_err(|e| Error::Persistence(format!("failed to spawn `{}`: {}", label, e)))?;

    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);

    let deadline = Instant::now() + timeout;
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if Instant::now() >= deadline {
            warn!(command = %label, "External command timed out, killing it");
            abandon(&mut child, &label);
            return Err(Error::Timeout(format!(
                "`{}` did not finish within {}s",
                label,
                timeout.as_secs()
            )));
        }
        thread::sleep(POLL_INTERVAL);
    };

    Ok(Output {
        status,
        stdout: collect(stdout),
        stderr: collect(stderr),
    })
}

/// 제한 시간을 넘긴 자식 프로세스 정리 (블로킹 wait 없음)
///
/// 권한 상승 후의 자식은 root라서 kill이 EPERM으로 실패할 수 있습니다.
/// 그 경우 그대로 두고 돌아갑니다.
fn abandon(child: &mut Child, label: &str) {
    if let Err(e) = child.kill() {
        warn!(command = %label, error = %e, "Cannot kill timed-out command, leaving it running");
        return;
    }

    let reap_deadline = Instant::now() + REAP_GRACE;
    while Instant::now() < reap_deadline {
        match child.try_wait() {
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Ok(Some(_)) | Err(_) => return,
        }
    }
    warn!(command = %label, "Killed command has not exited yet");
}

/// 사람이 읽을 수 있는 명령 문자열
pub fn describe(command: &Command) -> String {
    std::iter::once(command.get_program())
        .chain(command.get_args())
        .map(|part| part.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

fn drain<R: Read + Send + 'static>(mut reader: R) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = reader.read_to_end(&mut buf);
        buf
    })
}

fn collect(handle: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(script);
        cmd
    }

    #[test]
    fn test_captures_output_and_status() {
        let output = run_bounded(sh("echo out; echo err >&2; exit 3"), Duration::from_secs(5))
            .unwrap();
        assert_eq!(output.status.code(), Some(3));
        assert_eq!(String::from_utf8_lossy(&output.stdout), "out\n");
        assert_eq!(String::from_utf8_lossy(&output.stderr), "err\n");
    }

    #[test]
    fn test_times_out() {
        let started = Instant::now();
        let err = run_bounded(sh("sleep 30"), Duration::from_millis(100)).unwrap_err();
        assert!(matches!(err, Error::Timeout(_)));
        // 타임아웃 후에도 제한 시간 + 정리 시간 안에 반환
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_abandon_returns_for_already_reaped_child() {
        let mut child = sh("exit 0").spawn().unwrap();
        child.wait().unwrap();

        let started = Instant::now();
        abandon(&mut child, "sh -c exit 0");
        assert!(started.elapsed() < REAP_GRACE + Duration::from_millis(500));
    }

    #[test]
    fn test_missing_program_is_persistence_failure() {
        let cmd = Command::new("/nonexistent/ssdsaver-helper");
        let err = run_bounded(cmd, Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, Error::Persistence(_)));
    }

    #[test]
    fn test_describe() {
        let mut cmd = Command::new("systemctl");
        cmd.args(["is-active", "log2ram"]);
        assert_eq!(describe(&cmd), "systemctl is-active log2ram");
    }
}
