#![cfg(unix)]

use std::time::Duration;

use mdbkit_core::{Debugger, MdbError, Session, SessionConfig, SessionState};

/// A scripted stand-in for the real debugger.
const FAKE_MDB: &str = r#"
n=0
printf 'fake mdb 1.0\n>'
while IFS= read -r line; do
  case "$line" in
    "break "*)
      n=$((n+1))
      printf '%s\nBreakpoint %d at file main.c, line 10.\n>' "$line" "$n" ;;
    "info breakpoints")
      printf 'Num Enb Address what\n1\ty\t0x1d0\tmain.c\t10\n2\tn\t0x2f4\tisr.c\t7\n>' ;;
    Continue|Run)
      printf 'Running\nStop at\n\tmain.c:10\n>'
      printf 'HALTED\n'
      printf 'Simulator halted\n>' ;;
    "print /x count")
      printf 'count=\n0x2a\n>' ;;
    hang) ;;
    quit) exit 0 ;;
    *) printf '%s\n>' "$line" ;;
  esac
done
"#;

fn fake_config() -> SessionConfig {
    SessionConfig {
        args: vec!["-c".to_string(), FAKE_MDB.to_string()],
        ..SessionConfig::new("sh")
    }
}

#[tokio::test]
async fn banner_is_consumed_and_echo_round_trips() {
    let mut session = Session::spawn(&fake_config()).await.unwrap();
    assert_eq!(session.state(), SessionState::Stopped);
    assert!(session.pid().is_some());
    assert_eq!(session.frames_read(), 1);

    let response = session.transact("echo hello").await.unwrap();
    assert_eq!(response, "echo hello\n>");
    assert_eq!(session.frames_read(), 2);

    session.close().await.unwrap();
    assert_eq!(session.state(), SessionState::Dead);
}

#[tokio::test]
async fn breakpoints_and_halt_through_client() {
    let mut dbg = Debugger::launch(&fake_config()).await.unwrap();

    assert_eq!(dbg.break_line("main.c", 10, 0).await.unwrap(), 1);
    assert_eq!(dbg.break_function("isr", 0).await.unwrap(), 2);

    let bps = dbg.info_breakpoints().await.unwrap();
    assert_eq!(bps.len(), 2);
    assert_eq!(bps[0].address, 0x1d0);
    assert!(bps[0].is_enabled());
    assert_eq!(bps[1].filename, "isr.c");
    assert!(!bps[1].is_enabled());

    let before = dbg.session().frames_read();
    dbg.continue_execution().await.unwrap();
    assert_eq!(dbg.state(), SessionState::Stopped);
    assert_eq!(dbg.session().last_response(), "Simulator halted\n>");
    assert_eq!(dbg.session().frames_read(), before + 3);

    assert_eq!(dbg.print_var('x', None, "count").await.unwrap(), 42);

    dbg.quit().await.unwrap();
    assert_eq!(dbg.state(), SessionState::Dead);
}

#[tokio::test]
async fn close_is_idempotent_and_io_after_close_fails() {
    let mut session = Session::spawn(&fake_config()).await.unwrap();
    session.close().await.unwrap();
    session.close().await.unwrap();

    assert!(matches!(session.send("pwd").await, Err(MdbError::Closed)));
    assert!(matches!(session.transact("pwd").await, Err(MdbError::Closed)));
}

#[tokio::test]
async fn silent_debugger_times_out_then_terminates() {
    let mut session = Session::spawn(&fake_config()).await.unwrap();
    let err = session
        .transact_within("hang", Some(Duration::from_millis(200)))
        .await
        .unwrap_err();
    assert!(matches!(err, MdbError::Timeout(_)), "got: {err:?}");

    session.terminate().await.unwrap();
    assert_eq!(session.state(), SessionState::Dead);
}

#[tokio::test]
async fn close_survives_output_flood_after_stdin_closes() {
    // Far more than the output channel and a pipe buffer can hold.
    let script = r#"
printf 'fake mdb\n>'
while IFS= read -r line; do printf '%s\n>' "$line"; done
head -c 2000000 /dev/zero | tr '\0' x
exit 0
"#;
    let config = SessionConfig {
        args: vec!["-c".to_string(), script.to_string()],
        ..SessionConfig::new("sh")
    };
    let mut session = Session::spawn(&config).await.unwrap();
    assert_eq!(session.transact("pwd").await.unwrap(), "pwd\n>");

    tokio::time::timeout(Duration::from_secs(20), session.close())
        .await
        .expect("close blocked on undrained output")
        .unwrap();
    assert_eq!(session.state(), SessionState::Dead);
}

#[tokio::test]
async fn missing_executable_fails_to_spawn() {
    let err = Session::spawn(&SessionConfig::new("no-such-mdb-binary-anywhere"))
        .await
        .unwrap_err();
    assert!(matches!(err, MdbError::SpawnFailed { .. }), "got: {err:?}");
}

#[tokio::test]
async fn debugger_exiting_during_banner_is_an_error() {
    let config = SessionConfig {
        args: vec!["-c".to_string(), "printf 'no prompt here'".to_string()],
        ..SessionConfig::new("sh")
    };
    match Session::spawn(&config).await {
        Err(MdbError::Receive { partial }) => assert_eq!(partial, "no prompt here"),
        other => panic!("expected Receive, got: {other:?}"),
    }
}
