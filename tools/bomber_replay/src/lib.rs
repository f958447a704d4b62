pub mod config;
pub mod errors;
pub mod logging;
pub mod observer;
pub mod replay;
pub mod runtime;
pub mod tui;
pub mod types;

use clap::{error::ErrorKind, Parser, ValueEnum};
use config::{load_config, AppConfig, CliOverrides};
use errors::ReplayError;
use logging::{structured_fallback_line, JsonlLogger, LogEvent};
use observer::{Observers, StepLog, VerbosePrinter};
use replay::normalize::normalize;
use replay::replayer::{replay, ReplayOptions, ReplayOutcome, ReplayReport};
use replay::report::{recording_digest, RunReport};
use replay::simulator::ProcessForwardModel;
use replay::verify::Comparison;
use runtime::ProductionRuntime;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tui::TerminalRenderer;

#[derive(Debug, Clone, Parser)]
#[command(name = "bomber-replay")]
#[command(about = "Replay a recorded bomber game through a forward model and verify every step")]
pub struct Cli {
    /// Recording to replay.
    #[arg(long)]
    pub gamefile: PathBuf,
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Step through the recording without comparing against it.
    #[arg(long, default_value_t = false)]
    pub noverify: bool,
    /// Print the actions and board of every step.
    #[arg(long, default_value_t = false)]
    pub verbose: bool,
    #[arg(long, default_value_t = false)]
    pub render: bool,
    #[arg(long, value_enum)]
    pub compare: Option<CliComparison>,
    #[arg(long)]
    pub pace_ms: Option<u64>,
    /// Executable that advances a scene by one tick.
    #[arg(long)]
    pub simulator: Option<String>,
    #[arg(long = "simulator-arg", allow_hyphen_values = true)]
    pub simulator_args: Vec<String>,
    #[arg(long)]
    pub report_json: Option<PathBuf>,
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CliComparison {
    Board,
    Scene,
}

impl From<CliComparison> for Comparison {
    fn from(value: CliComparison) -> Self {
        match value {
            CliComparison::Board => Comparison::Board,
            CliComparison::Scene => Comparison::Scene,
        }
    }
}

pub fn run() -> Result<i32, ReplayError> {
    let args = std::env::args_os().collect::<Vec<_>>();
    let cwd = std::env::current_dir().map_err(|e| ReplayError::Io(e.to_string()))?;
    let runtime = ProductionRuntime::new();
    run_with_runtime(&args, &cwd, &runtime)
}

/// Exit code 0 when the recording was reproduced or verification was off,
/// 1 on divergence. Structural and I/O failures come back as `Err`.
pub fn run_with_runtime(
    args: &[std::ffi::OsString],
    cwd: &Path,
    runtime: &ProductionRuntime,
) -> Result<i32, ReplayError> {
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => match error.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                print!("{error}");
                return Ok(0);
            }
            _ => return Err(ReplayError::Cli(error.to_string())),
        },
    };

    let overrides = CliOverrides {
        config_path: cli.config.clone(),
        no_verify: cli.noverify,
        render: cli.render,
        comparison: cli.compare.map(Into::into),
        pace_ms: cli.pace_ms,
        simulator: cli.simulator.clone(),
        simulator_args: cli.simulator_args.clone(),
        log_file: cli.log_file.clone(),
    };
    let cfg = load_config(&overrides, cwd, runtime.file_system.as_ref())?;

    let mut logger = JsonlLogger::new(&cfg.log.path);
    logger.max_payload_bytes = cfg.log.max_payload_bytes;
    logger.budget_bytes = cfg.log.budget_bytes;

    let gamefile = if cli.gamefile.is_absolute() {
        cli.gamefile.clone()
    } else {
        cwd.join(&cli.gamefile)
    };
    let raw = runtime.file_system.read_to_string(&gamefile)?;
    logger.append(&LogEvent::info(
        "replay_started",
        json!({
            "gamefile": gamefile.display().to_string(),
            "sha256": recording_digest(&raw),
            "verify": cfg.replay.verify,
            "comparison": cfg.replay.comparison.as_str(),
            "simulator": cfg.simulator.program,
        }),
    ))?;

    let (snapshots, report) = match replay_recording(&cli, &cfg, cwd, runtime, &logger, &raw) {
        Ok(replayed) => replayed,
        Err(error) => {
            logger.append(&LogEvent::warn(
                "replay_failed",
                json!({
                    "error": error.to_string(),
                    "structural": error.is_structural(),
                }),
            ))?;
            return Err(error);
        }
    };

    let terminal = runtime.terminal.as_ref();
    if let ReplayOutcome::Diverged(divergence) = &report.outcome {
        terminal.write_line(&format!("failed at step: {}", divergence.step_index))?;
        for mismatch in &divergence.mismatches {
            terminal.write_line(&format!("  {mismatch}"))?;
        }
        logger.append(&LogEvent::warn(
            "divergence",
            serde_json::to_value(divergence).map_err(|e| ReplayError::Io(e.to_string()))?,
        ))?;
    }
    if !terminal.stdout_is_tty() {
        terminal.write_line(&structured_fallback_line(
            report.transitions,
            report.outcome.as_str(),
            &format!("{snapshots} snapshots replayed"),
        ))?;
    }
    logger.append(&LogEvent::info(
        "replay_finished",
        json!({
            "outcome": report.outcome.as_str(),
            "transitions": report.transitions,
            "snapshots": snapshots,
        }),
    ))?;

    if let Some(path) = &cli.report_json {
        let path = if path.is_absolute() {
            path.clone()
        } else {
            cwd.join(path)
        };
        let run_report = RunReport::new(
            gamefile.display().to_string(),
            &raw,
            snapshots,
            cfg.replay.verify,
            cfg.replay.comparison,
            &report,
        );
        let text = serde_json::to_string_pretty(&run_report)
            .map_err(|e| ReplayError::Io(e.to_string()))?;
        if let Some(parent) = path.parent() {
            runtime.file_system.create_dir_all(parent)?;
        }
        runtime.file_system.write_string(&path, &text)?;
    }

    Ok(match report.outcome {
        ReplayOutcome::Diverged(_) => 1,
        ReplayOutcome::Verified | ReplayOutcome::Unverified => 0,
    })
}

fn replay_recording(
    cli: &Cli,
    cfg: &AppConfig,
    cwd: &Path,
    runtime: &ProductionRuntime,
    logger: &JsonlLogger,
    raw: &str,
) -> Result<(usize, ReplayReport), ReplayError> {
    let recording = normalize(raw)?;

    let mut model = ProcessForwardModel::new(
        runtime.process_runner.as_ref(),
        cfg.simulator.program.clone(),
        cfg.simulator.args.clone(),
    )
    .with_cwd(cwd);

    let mut observers = Observers::default();
    if cli.verbose {
        observers.push(VerbosePrinter::new(runtime.terminal.as_ref()));
        observers.push(StepLog::new(logger));
    }
    if cfg.render.enabled {
        observers.push(TerminalRenderer::new(
            runtime.terminal.as_ref(),
            runtime.clock.as_ref(),
            Duration::from_millis(cfg.render.pace_ms),
            cfg.render.width,
            cfg.render.height,
        ));
    }

    let report = replay(
        &recording,
        &mut model,
        &mut observers,
        ReplayOptions {
            verify: cfg.replay.verify,
            comparison: cfg.replay.comparison,
        },
    )?;
    Ok((recording.len(), report))
}
