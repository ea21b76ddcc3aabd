use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};

use anyhow::{Context, Result, anyhow, bail};
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, Layer,
    filter::{Directive, LevelFilter},
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
};
use uuid::Uuid;

use crate::config::{LoggingConfig, LoggingRotation};

const LOG_FILE_PREFIX: &str = "chainproof.log";

/// Targets this crate emits events under; `logging.targets` may tune each one.
pub const LOG_TARGETS: [&str; 5] = ["arbitration", "logging", "router", "router_node", "server"];

pub struct LoggingGuard {
    _worker_guard: WorkerGuard,
    run_id: String,
}

impl LoggingGuard {
    pub fn run_id(&self) -> &str {
        &self.run_id
    }
}

#[derive(Debug, Default)]
struct RetentionSweep {
    removed: Vec<PathBuf>,
    warnings: Vec<String>,
}

pub fn init_tracing(logging_config: &LoggingConfig) -> Result<LoggingGuard> {
    if logging_config.dir.as_os_str().is_empty() {
        bail!("logging.dir cannot be empty");
    }
    let file_filter = compose_filter(&logging_config.filter, &logging_config.targets)?;
    let stderr_level = parse_level(&logging_config.stderr_level, "logging.stderr_level")?;

    let log_dir = std::path::absolute(&logging_config.dir).with_context(|| {
        format!(
            "failed to resolve logging directory {}",
            logging_config.dir.display()
        )
    })?;
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create logging directory {}", log_dir.display()))?;

    let sweep = sweep_expired_logs(&log_dir, logging_config.retention_days, SystemTime::now());

    let rotation = match logging_config.rotation {
        LoggingRotation::Daily => Rotation::DAILY,
        LoggingRotation::Hourly => Rotation::HOURLY,
    };
    let appender = RollingFileAppender::builder()
        .rotation(rotation)
        .filename_prefix(LOG_FILE_PREFIX)
        .build(&log_dir)
        .with_context(|| format!("failed to open log appender in {}", log_dir.display()))?;
    let (writer, worker_guard) = tracing_appender::non_blocking(appender);

    let file_layer = fmt::layer()
        .json()
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_target(true)
        .with_current_span(true)
        .with_ansi(false)
        .with_writer(writer)
        .with_filter(file_filter);

    let stderr_layer = logging_config.stderr_enabled.then(|| {
        fmt::layer()
            .compact()
            .with_writer(io::stderr)
            .with_filter(stderr_level)
    });

    tracing_subscriber::registry()
        .with(ErrorLayer::default())
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .context("failed to initialize tracing subscriber")?;

    let run_id = Uuid::now_v7().to_string();
    tracing::info!(
        target: "logging",
        run_id = %run_id,
        dir = %log_dir.display(),
        filter = %logging_config.filter,
        targets = ?logging_config.targets,
        rotation = ?logging_config.rotation,
        stderr_level = %stderr_level,
        expired_removed = sweep.removed.len(),
        "logging_initialized"
    );
    for warning in sweep.warnings {
        tracing::warn!(target: "logging", warning = %warning, "log_retention_warning");
    }

    Ok(LoggingGuard {
        _worker_guard: worker_guard,
        run_id,
    })
}

fn parse_level(level: &str, field: &str) -> Result<LevelFilter> {
    level
        .trim()
        .parse::<LevelFilter>()
        .map_err(|_| anyhow!("invalid {field} '{level}'"))
}

/// Base filter plus one `target=level` directive per configured target.
fn compose_filter(base: &str, targets: &BTreeMap<String, String>) -> Result<EnvFilter> {
    if base.trim().is_empty() {
        bail!("logging.filter cannot be empty");
    }
    let mut filter = EnvFilter::try_new(base)
        .with_context(|| format!("failed to parse logging.filter '{base}'"))?;

    for (target, level) in targets {
        if !LOG_TARGETS.contains(&target.as_str()) {
            bail!(
                "unknown logging.targets key '{target}', expected one of {}",
                LOG_TARGETS.join(", ")
            );
        }
        let level = parse_level(level, &format!("logging.targets.{target}"))?;
        let directive: Directive = format!("{target}={level}")
            .parse()
            .with_context(|| format!("failed to build filter directive for {target}"))?;
        filter = filter.add_directive(directive);
    }
    Ok(filter)
}

fn is_rotated_log(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with(LOG_FILE_PREFIX))
}

fn is_expired(path: &Path, cutoff: SystemTime) -> io::Result<bool> {
    let metadata = fs::metadata(path)?;
    Ok(metadata.is_file() && metadata.modified()? <= cutoff)
}

fn sweep_expired_logs(log_dir: &Path, retention_days: usize, now: SystemTime) -> RetentionSweep {
    let retention = Duration::from_secs(retention_days as u64 * 24 * 60 * 60);
    let cutoff = now.checked_sub(retention).unwrap_or(SystemTime::UNIX_EPOCH);
    let mut sweep = RetentionSweep::default();

    let entries = match fs::read_dir(log_dir) {
        Ok(entries) => entries,
        Err(err) => {
            sweep
                .warnings
                .push(format!("failed to scan {}: {err}", log_dir.display()));
            return sweep;
        }
    };

    let candidates = entries
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| is_rotated_log(path));
    for path in candidates {
        match is_expired(&path, cutoff) {
            Ok(false) => {}
            Ok(true) => match fs::remove_file(&path) {
                Ok(()) => sweep.removed.push(path),
                Err(err) => sweep
                    .warnings
                    .push(format!("failed to remove {}: {err}", path.display())),
            },
            Err(err) => sweep
                .warnings
                .push(format!("failed to inspect {}: {err}", path.display())),
        }
    }
    sweep
}
