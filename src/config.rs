use crate::session::{
    DEFAULT_AUTO_STOP,
    SessionOptions,
};
use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use std::{
    path::PathBuf,
    time::Duration,
};

pub const DEFAULT_STATE_DIR: &str = ".family-bingo";
const LOG_SUBDIR: &str = "logs";

pub const USAGE: &str = "Usage: family-bingo [--state-dir <path>] [--log-dir <path>]\n\
    [--auto-stop-ms <ms> | --no-auto-stop] [--seed <n>]\n\
    \n\
    Flags:\n\
      --state-dir <path>   Where the saved game lives (default ~/.family-bingo)\n\
      --log-dir <path>     Where log files go (default <state-dir>/logs)\n\
      --auto-stop-ms <ms>  Stop a roll automatically after <ms> (default 3000)\n\
      --no-auto-stop       Only stop a roll with the space bar\n\
      --seed <n>           Seed draws and reveals for a reproducible session\n\
    \n\
    Keys: space roll/stop, c climax, g grid, s settings, r reset, q quit\n\
    Log level: BINGO_LOG (e.g. BINGO_LOG=debug)";

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AppConfig {
    pub state_dir: PathBuf,
    pub log_dir: PathBuf,
    pub auto_stop: Option<Duration>,
    pub seed: Option<u64>,
}

impl AppConfig {
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            auto_stop: self.auto_stop,
            seed: self.seed,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Command {
    Run(AppConfig),
    Help,
}

pub fn default_state_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").wrap_err("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(DEFAULT_STATE_DIR))
}

pub fn resolve_dir(raw: &str) -> PathBuf {
    let expanded = shellexpand::tilde(raw);
    PathBuf::from(expanded.into_owned())
}

pub fn parse_args<I>(args: I) -> Result<Command>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut state_dir: Option<PathBuf> = None;
    let mut log_dir: Option<PathBuf> = None;
    let mut auto_stop_ms: Option<u64> = None;
    let mut no_auto_stop = false;
    let mut seed: Option<u64> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--state-dir" => {
                let dir = args
                    .next()
                    .ok_or_else(|| eyre!("--state-dir requires a path argument"))?;
                if state_dir.is_some() {
                    return Err(eyre!("--state-dir may only be specified once"));
                }
                state_dir = Some(resolve_dir(&dir));
            }
            "--log-dir" => {
                let dir = args
                    .next()
                    .ok_or_else(|| eyre!("--log-dir requires a path argument"))?;
                if log_dir.is_some() {
                    return Err(eyre!("--log-dir may only be specified once"));
                }
                log_dir = Some(resolve_dir(&dir));
            }
            "--auto-stop-ms" => {
                let raw = args
                    .next()
                    .ok_or_else(|| eyre!("--auto-stop-ms requires a number"))?;
                let ms = raw
                    .parse::<u64>()
                    .wrap_err_with(|| format!("invalid --auto-stop-ms value {raw:?}"))?;
                if ms == 0 {
                    return Err(eyre!("--auto-stop-ms must be greater than zero"));
                }
                auto_stop_ms = Some(ms);
            }
            "--no-auto-stop" => no_auto_stop = true,
            "--seed" => {
                let raw = args
                    .next()
                    .ok_or_else(|| eyre!("--seed requires a number"))?;
                let value = raw
                    .parse::<u64>()
                    .wrap_err_with(|| format!("invalid --seed value {raw:?}"))?;
                seed = Some(value);
            }
            "--help" | "-h" => return Ok(Command::Help),
            other => return Err(eyre!("Unknown argument: {other}")),
        }
    }

    if no_auto_stop && auto_stop_ms.is_some() {
        return Err(eyre!("--auto-stop-ms and --no-auto-stop are mutually exclusive"));
    }

    let state_dir = match state_dir {
        Some(dir) => dir,
        None => default_state_dir()?,
    };
    let log_dir = log_dir.unwrap_or_else(|| state_dir.join(LOG_SUBDIR));
    let auto_stop = if no_auto_stop {
        None
    } else {
        Some(auto_stop_ms.map_or(DEFAULT_AUTO_STOP, Duration::from_millis))
    };

    Ok(Command::Run(AppConfig {
        state_dir,
        log_dir,
        auto_stop,
        seed,
    }))
}
