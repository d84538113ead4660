//! 외부 측정 프로세스 실행.
//!
//! 짧게 사는 프로세스를 띄워 종료까지 기다리고 표준 출력을 돌려준다.

use linkwatch_core::error::ProbeError;
use tokio::process::Command;
use tracing::debug;

/// 프로세스를 실행하고 표준 출력 반환
///
/// 실행 실패는 [`ProbeError::Spawn`], 0이 아닌 종료 코드는 [`ProbeError::NonZeroExit`].
/// 별도 타임아웃은 없다.
pub(crate) async fn run_captured(program: &str, args: &[String]) -> Result<String, ProbeError> {
    let command = describe(program, args);
    debug!("프로세스 실행: {command}");

    let mut child = Command::new(program);
    child.args(args).kill_on_drop(true);
    detach_from_terminal_signals(&mut child);

    let output = child
        .output()
        .await
        .map_err(|source| ProbeError::Spawn {
            command: command.clone(),
            source,
        })?;

    if !output.status.success() {
        return Err(ProbeError::NonZeroExit {
            command,
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// 측정 프로세스를 별도 프로세스 그룹으로 분리
///
/// 터미널의 Ctrl+C는 모니터만 받는다. 진행 중인 틱의 측정은 끝까지 수행된다.
#[cfg(unix)]
fn detach_from_terminal_signals(command: &mut Command) {
    command.process_group(0);
}

#[cfg(windows)]
fn detach_from_terminal_signals(command: &mut Command) {
    const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
    command.creation_flags(CREATE_NEW_PROCESS_GROUP);
}

#[cfg(not(any(unix, windows)))]
fn detach_from_terminal_signals(_command: &mut Command) {}

/// 로그/에러용 명령 문자열
fn describe(program: &str, args: &[String]) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{program} {}", args.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn describe_joins_arguments() {
        assert_eq!(
            describe("ping", &["-c".to_string(), "3".to_string()]),
            "ping -c 3"
        );
        assert_eq!(describe("speedtest-cli", &[]), "speedtest-cli");
    }

    #[tokio::test]
    async fn missing_program_is_spawn_error() {
        let result = run_captured("linkwatch-no-such-program", &[]).await;
        assert_matches!(result, Err(ProbeError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_program_is_non_zero_exit() {
        let result = run_captured("false", &[]).await;
        assert_matches!(result, Err(ProbeError::NonZeroExit { code: Some(1), .. }));
    }

    /// /proc/<pid>/stat의 프로세스 그룹 (5번째 필드)
    #[cfg(target_os = "linux")]
    fn process_group_of(stat: &str) -> u32 {
        let after_comm = &stat[stat.rfind(')').unwrap() + 1..];
        after_comm.split_whitespace().nth(2).unwrap().parse().unwrap()
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn child_runs_in_own_process_group() {
        let script = "cat /proc/$$/stat; echo; echo $$".to_string();
        let out = run_captured("sh", &["-c".to_string(), script]).await.unwrap();
        let mut lines = out.lines().filter(|l| !l.is_empty());
        let child_group = process_group_of(lines.next().unwrap());
        let child_pid: u32 = lines.next().unwrap().trim().parse().unwrap();

        let own_stat = std::fs::read_to_string("/proc/self/stat").unwrap();
        assert_eq!(child_group, child_pid);
        assert_ne!(child_group, process_group_of(&own_stat));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn captures_stdout() {
        let out = run_captured("echo", &["hello".to_string()]).await.unwrap();
        assert_eq!(out.trim(), "hello");
    }
}
