use crate::errors::ReplayError;
use crate::logging::{DEFAULT_DISK_BUDGET_BYTES, DEFAULT_MAX_PAYLOAD_BYTES};
use crate::replay::verify::Comparison;
use crate::runtime::FileSystem;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_SIMULATOR: &str = "pommerman-step";

#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config_path: Option<PathBuf>,
    pub no_verify: bool,
    pub render: bool,
    pub comparison: Option<Comparison>,
    pub pace_ms: Option<u64>,
    pub simulator: Option<String>,
    pub simulator_args: Vec<String>,
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    pub replay: ReplayConfig,
    pub render: RenderConfig,
    pub simulator: SimulatorConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReplayConfig {
    pub verify: bool,
    pub comparison: Comparison,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RenderConfig {
    pub enabled: bool,
    pub pace_ms: u64,
    pub width: u16,
    pub height: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SimulatorConfig {
    pub program: String,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogConfig {
    pub path: PathBuf,
    pub max_payload_bytes: usize,
    pub budget_bytes: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            replay: ReplayConfig {
                verify: true,
                comparison: Comparison::Board,
            },
            render: RenderConfig {
                enabled: false,
                pace_ms: 100,
                width: 80,
                height: 30,
            },
            simulator: SimulatorConfig {
                program: DEFAULT_SIMULATOR.to_string(),
                args: Vec::new(),
            },
            log: LogConfig {
                path: PathBuf::from(".cache/bomber-replay/run.jsonl"),
                max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
                budget_bytes: DEFAULT_DISK_BUDGET_BYTES,
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct PartialAppConfig {
    replay: Option<PartialReplayConfig>,
    render: Option<PartialRenderConfig>,
    simulator: Option<PartialSimulatorConfig>,
    log: Option<PartialLogConfig>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct PartialReplayConfig {
    verify: Option<bool>,
    comparison: Option<Comparison>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct PartialRenderConfig {
    enabled: Option<bool>,
    pace_ms: Option<u64>,
    width: Option<u16>,
    height: Option<u16>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct PartialSimulatorConfig {
    program: Option<String>,
    args: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct PartialLogConfig {
    path: Option<PathBuf>,
    max_payload_bytes: Option<usize>,
    budget_bytes: Option<u64>,
}

/// Defaults, then the `--config` file, then CLI flags. Relative paths are
/// resolved against `process_cwd`.
pub fn load_config(
    overrides: &CliOverrides,
    process_cwd: &Path,
    fs: &dyn FileSystem,
) -> Result<AppConfig, ReplayError> {
    let mut cfg = AppConfig::default();

    if let Some(path) = &overrides.config_path {
        let file_contents = fs.read_to_string(&absolutize_path(process_cwd, path))?;
        let partial: PartialAppConfig = toml::from_str(&file_contents)
            .map_err(|e| ReplayError::ConfigParse(e.to_string()))?;
        merge_partial_config(&mut cfg, partial);
    }

    apply_cli_overrides(&mut cfg, overrides);
    cfg.log.path = absolutize_path(process_cwd, &cfg.log.path);
    validate_config(&cfg)?;
    Ok(cfg)
}

fn merge_partial_config(cfg: &mut AppConfig, partial: PartialAppConfig) {
    if let Some(replay) = partial.replay {
        if let Some(verify) = replay.verify {
            cfg.replay.verify = verify;
        }
        if let Some(comparison) = replay.comparison {
            cfg.replay.comparison = comparison;
        }
    }

    if let Some(render) = partial.render {
        if let Some(value) = render.enabled {
            cfg.render.enabled = value;
        }
        if let Some(value) = render.pace_ms {
            cfg.render.pace_ms = value;
        }
        if let Some(value) = render.width {
            cfg.render.width = value;
        }
        if let Some(value) = render.height {
            cfg.render.height = value;
        }
    }

    if let Some(simulator) = partial.simulator {
        if let Some(program) = simulator.program {
            cfg.simulator.program = program;
        }
        if let Some(args) = simulator.args {
            cfg.simulator.args = args;
        }
    }

    if let Some(log) = partial.log {
        if let Some(path) = log.path {
            cfg.log.path = path;
        }
        if let Some(value) = log.max_payload_bytes {
            cfg.log.max_payload_bytes = value;
        }
        if let Some(value) = log.budget_bytes {
            cfg.log.budget_bytes = value;
        }
    }
}

fn apply_cli_overrides(cfg: &mut AppConfig, overrides: &CliOverrides) {
    if overrides.no_verify {
        cfg.replay.verify = false;
    }
    if overrides.render {
        cfg.render.enabled = true;
    }
    if let Some(comparison) = overrides.comparison {
        cfg.replay.comparison = comparison;
    }
    if let Some(pace_ms) = overrides.pace_ms {
        cfg.render.pace_ms = pace_ms;
    }
    if let Some(program) = &overrides.simulator {
        cfg.simulator.program = program.clone();
        cfg.simulator.args.clear();
    }
    if !overrides.simulator_args.is_empty() {
        cfg.simulator.args = overrides.simulator_args.clone();
    }
    if let Some(path) = &overrides.log_file {
        cfg.log.path = path.clone();
    }
}

fn absolutize_path(base: &Path, value: &Path) -> PathBuf {
    if value.is_absolute() {
        value.to_path_buf()
    } else {
        base.join(value)
    }
}

fn validate_config(cfg: &AppConfig) -> Result<(), ReplayError> {
    if cfg.simulator.program.trim().is_empty() {
        return Err(ReplayError::InvalidConfig(
            "simulator.program must name an executable".to_string(),
        ));
    }
    if cfg.render.width == 0 || cfg.render.height == 0 {
        return Err(ReplayError::InvalidConfig(
            "render.width and render.height must be greater than zero".to_string(),
        ));
    }
    if cfg.log.max_payload_bytes < 16 {
        return Err(ReplayError::InvalidConfig(
            "log.max_payload_bytes must be at least 16".to_string(),
        ));
    }
    Ok(())
}
