#![cfg(unix)]

use std::fs;
use std::process::Command;

use tempfile::TempDir;

const FAKE_MDB: &str = r#"n=0
printf 'fake mdb\n>'
while IFS= read -r line; do
  case "$line" in
    "break "*)
      n=$((n+1))
      printf '%s\nBreakpoint %d at file main.c, line 10.\n>' "$line" "$n" ;;
    "info breakpoints")
      printf 'Num Enb Address what\n1\ty\t0x1d0\tmain.c\t10\n>' ;;
    Continue)
      printf 'Running\nStop at\n\tmain.c:10\n>'
      printf 'HALTED\n'
      printf 'Simulator halted\n>' ;;
    quit) exit 0 ;;
    *) printf '%s\n>' "$line" ;;
  esac
done
"#;

/// Lay out a fake debugger, a config pointing at it, and a command script.
fn fixture(script: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    let fake = dir.path().join("fake-mdb.sh");
    fs::write(&fake, FAKE_MDB).unwrap();
    fs::write(
        dir.path().join("mdbkit.toml"),
        format!(
            "[debugger]\nexecutable = \"sh\"\nargs = ['{}']\n\n[log]\nlevel = \"debug\"\nfile = '{}'\n",
            fake.display(),
            dir.path().join("mdbkit.log").display(),
        ),
    )
    .unwrap();
    fs::write(dir.path().join("commands.mdb"), script).unwrap();
    dir
}

fn run(dir: &TempDir) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_mdbkit"))
        .arg(dir.path().join("commands.mdb"))
        .env("MDBKIT_CONFIG", dir.path().join("mdbkit.toml"))
        .env_remove("MDBKIT_LOG")
        .output()
        .unwrap()
}

#[test]
fn script_drives_debugger_to_completion() {
    let dir = fixture("# setup\nbreak main.c:10\n\n:breakpoints\nContinue\n:state\nquit\n");
    let out = run(&dir);
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    assert!(stdout.contains("Breakpoint 1 at file main.c"), "{stdout}");
    assert!(stdout.contains("1\ty\t0x1d0\tmain.c:10"), "{stdout}");
    assert!(stdout.contains("Simulator halted"), "{stdout}");
    assert!(stdout.contains("Stopped"), "{stdout}");
    assert!(!stdout.contains("# setup"), "{stdout}");

    let log = fs::read_to_string(dir.path().join("mdbkit.log")).unwrap();
    assert!(log.contains("debugger spawned"), "{log}");
}

#[test]
fn end_of_script_closes_session() {
    let dir = fixture("echo one\n");
    let out = run(&dir);
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stdout).contains("echo one"));
}

#[test]
fn missing_script_fails_with_message() {
    let dir = fixture("");
    let out = Command::new(env!("CARGO_BIN_EXE_mdbkit"))
        .arg(dir.path().join("nope.mdb"))
        .env("MDBKIT_CONFIG", dir.path().join("mdbkit.toml"))
        .output()
        .unwrap();
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("failed to open script"));
}
