use std::env;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

use mdbkit_config::{load_config, load_file, Config, ConfigError, DebuggerConfig, LogConfig};
use mdbkit_core::logging::{default_log_file_path, ensure_log_dir, RotationPolicy};
use mdbkit_core::{Breakpoint, Command, Debugger, MdbError, SessionConfig, SessionState};

/// Overrides the layered config lookup with a single file.
const CONFIG_ENV: &str = "MDBKIT_CONFIG";

/// Overrides the configured log level with a full filter directive.
const LOG_ENV: &str = "MDBKIT_LOG";

/// What to do with one input line.
#[derive(Debug, Clone, PartialEq)]
enum Line<'a> {
    /// Blank or `#` comment.
    Skip,
    /// `:breakpoints`
    Breakpoints,
    /// `:state`
    State,
    /// `quit`; the session ends after it.
    Quit,
    /// A command the client tracks state for.
    Typed(Command),
    /// Anything else, passed through verbatim.
    Raw(&'a str),
}

fn classify(line: &str) -> Line<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Line::Skip;
    }
    match trimmed {
        ":breakpoints" => Line::Breakpoints,
        ":state" => Line::State,
        t if t.eq_ignore_ascii_case("quit") => Line::Quit,
        t if t.eq_ignore_ascii_case("continue") => Line::Typed(Command::Continue),
        t if t.eq_ignore_ascii_case("run") => Line::Typed(Command::Run),
        t if t.eq_ignore_ascii_case("halt") => Line::Typed(Command::Halt),
        _ => Line::Raw(trimmed),
    }
}

fn session_config(debugger: &DebuggerConfig) -> SessionConfig {
    SessionConfig {
        executable: debugger.executable.clone(),
        args: debugger.args.clone(),
        prompt: debugger.prompt.clone(),
        halted_pattern: debugger.halted_pattern.clone(),
        halt_marker: debugger.halt_marker.clone(),
        quit_exclusion: debugger.quit_exclusion.clone(),
        receive_timeout: debugger.receive_timeout(),
    }
}

fn format_breakpoint(bp: &Breakpoint) -> String {
    format!(
        "{}\t{}\t0x{:x}\t{}:{}",
        bp.number, bp.enabled, bp.address, bp.filename, bp.line
    )
}

fn load_settings() -> (Config, Option<ConfigError>) {
    let loaded = match env::var_os(CONFIG_ENV) {
        Some(path) => load_file(&PathBuf::from(path)),
        None => match mdbkit_config::paths::config_dir() {
            Some(dir) => {
                let project_dir = env::current_dir().ok();
                load_config(&dir, project_dir.as_deref())
            }
            None => Ok(Config::default()),
        },
    };
    match loaded {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    }
}

/// Send tracing output to the log file so it never mixes with responses.
fn init_logging(log: &LogConfig) -> Result<()> {
    let path = log.file.clone().unwrap_or_else(default_log_file_path);
    ensure_log_dir(&path)
        .with_context(|| format!("failed to create log directory for {}", path.display()))?;
    if let Err(e) = RotationPolicy::default().rotate(&path) {
        eprintln!("mdbkit: log rotation failed: {e}");
    }

    let writer = match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => BoxMakeWriter::new(Mutex::new(file)),
        Err(e) => {
            eprintln!("mdbkit: cannot open log {}: {e}", path.display());
            BoxMakeWriter::new(std::io::sink)
        }
    };
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(log.level.as_filter()));

    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_ansi(false)
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))
}

async fn drive(
    debugger: &mut Debugger,
    mut input: Box<dyn AsyncBufRead + Unpin>,
) -> Result<()> {
    let mut text = String::new();
    loop {
        text.clear();
        if input
            .read_line(&mut text)
            .await
            .context("failed to read command input")?
            == 0
        {
            break;
        }

        match classify(&text) {
            Line::Skip => {}
            Line::State => println!("{:?}", debugger.state()),
            Line::Breakpoints => {
                for bp in debugger.info_breakpoints().await? {
                    println!("{}", format_breakpoint(&bp));
                }
            }
            Line::Quit => {
                debugger.quit().await.context("quit failed")?;
                return Ok(());
            }
            Line::Typed(command) => report(debugger.execute(&command).await)?,
            Line::Raw(raw) => report(debugger.session_mut().transact(raw).await)?,
        }
    }
    Ok(())
}

/// Print a response; a missed deadline is reported and the script goes on.
fn report(result: Result<&str, MdbError>) -> Result<()> {
    match result {
        Ok(response) => {
            println!("{response}");
            Ok(())
        }
        Err(e @ MdbError::Timeout(_)) => {
            warn!(error = %e, "command timed out");
            eprintln!("mdbkit: {e}");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

async fn run_script(config: Config, script: Option<PathBuf>) -> Result<()> {
    let input: Box<dyn AsyncBufRead + Unpin> = match &script {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("failed to open script: {}", path.display()))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(tokio::io::stdin())),
    };

    let session_config = session_config(&config.debugger);
    let mut debugger = Debugger::launch(&session_config)
        .await
        .with_context(|| format!("failed to start {}", session_config.executable))?;
    info!(pid = ?debugger.session().pid(), "session ready");

    let outcome = drive(&mut debugger, input).await;
    if debugger.state() != SessionState::Dead {
        let closed = if outcome.is_ok() {
            debugger.session_mut().close().await
        } else {
            // Leave nothing running behind a failed script.
            debugger.session_mut().terminate().await
        };
        if let Err(e) = closed {
            error!(error = %e, "closing debugger session");
        }
    }
    outcome
}

fn run(script: Option<PathBuf>) -> Result<()> {
    let (config, config_error) = load_settings();
    init_logging(&config.log)?;
    if let Some(e) = config_error {
        error!("config load failed, using defaults: {}", e);
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    runtime.block_on(run_script(config, script))
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let script = args.get(1).map(PathBuf::from);

    if let Err(e) = run(script) {
        eprintln!("mdbkit: {:#}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn classify_meta_and_comments() {
        assert_eq!(classify("\n"), Line::Skip);
        assert_eq!(classify("   # setup\n"), Line::Skip);
        assert_eq!(classify(":breakpoints\n"), Line::Breakpoints);
        assert_eq!(classify(" :state "), Line::State);
    }

    #[test]
    fn classify_tracked_commands() {
        assert_eq!(classify("Continue\n"), Line::Typed(Command::Continue));
        assert_eq!(classify("run"), Line::Typed(Command::Run));
        assert_eq!(classify("halt\r\n"), Line::Typed(Command::Halt));
        assert_eq!(classify("QUIT"), Line::Quit);
    }

    #[test]
    fn classify_passes_other_lines_through_trimmed() {
        assert_eq!(classify("  break main.c:10 \n"), Line::Raw("break main.c:10"));
        assert_eq!(classify("Continue 2"), Line::Raw("Continue 2"));
    }

    #[test]
    fn session_config_copies_debugger_settings() {
        let debugger = DebuggerConfig {
            executable: "/opt/mdb/mdb.sh".into(),
            args: vec!["--quiet".into()],
            receive_timeout_ms: 1500,
            ..DebuggerConfig::default()
        };
        let cfg = session_config(&debugger);
        assert_eq!(cfg.executable, "/opt/mdb/mdb.sh");
        assert_eq!(cfg.args, vec!["--quiet".to_string()]);
        assert_eq!(cfg.prompt, SessionConfig::default().prompt);
        assert_eq!(cfg.receive_timeout, Some(Duration::from_millis(1500)));
    }

    #[test]
    fn breakpoint_line_format() {
        let bp = Breakpoint {
            number: 3,
            enabled: 'y',
            address: 0x1d0,
            filename: "main.c".into(),
            line: 42,
        };
        assert_eq!(format_breakpoint(&bp), "3\ty\t0x1d0\tmain.c:42");
    }
}
