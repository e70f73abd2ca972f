//! Command line parsing and resolved runtime settings.

use std::time::Duration;

use crate::availability::{DEFAULT_WINDOW_DAYS, MAX_WINDOW_DAYS};
use crate::poller::PollSettings;

pub const DEFAULT_INTERVAL_MS: u64 = 1000;
pub const MIN_INTERVAL_MS: u64 = 100;
pub const DEFAULT_DETAIL_INTERVAL_MS: u64 = 5000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEMO_PORT: u16 = 3232;

pub fn usage(prog: &str) -> String {
    format!(
        "Usage: {prog} [--profile NAME|-P NAME] [--save] [--interval MS|-i MS] [--days N|-d N] [--timeout SECS] [--history NAME] [--dry-run] [--demo] [http(s)://HOST[:PORT]]"
    )
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ParsedArgs {
    pub url: Option<String>,
    pub profile: Option<String>,
    pub interval_ms: Option<u64>,
    pub days: Option<u32>,
    pub timeout_secs: Option<u64>,
    pub history: Option<String>,
    pub save: bool,
    pub dry_run: bool,
    pub demo: bool,
}

fn number<T: std::str::FromStr>(flag: &str, v: Option<String>) -> Result<T, String> {
    let v = v.ok_or_else(|| format!("{flag} needs a value"))?;
    v.trim()
        .parse::<T>()
        .map_err(|_| format!("{flag}: not a number: {v}"))
}

/// Parse `std::env::args()`-style input. `Err` carries the text to print
/// (usage for `--help`, a message for bad input).
pub fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<ParsedArgs, String> {
    let mut it = args.into_iter();
    let prog = it.next().unwrap_or_else(|| "fleettop".into());
    let mut out = ParsedArgs::default();

    while let Some(arg) = it.next() {
        // --flag=value
        let (flag, inline) = match arg.split_once('=') {
            Some((f, v)) if f.starts_with("--") => (f.to_string(), Some(v.to_string())),
            _ => (arg.clone(), None),
        };
        let mut value = |inline: Option<String>| inline.or_else(|| it.next());

        match flag.as_str() {
            "-h" | "--help" => return Err(usage(&prog)),
            "--profile" | "-P" => out.profile = value(inline).filter(|v| !v.is_empty()),
            "--interval" | "-i" => out.interval_ms = Some(number(&flag, value(inline))?),
            "--days" | "-d" => {
                let days: u32 = number(&flag, value(inline))?;
                if days > MAX_WINDOW_DAYS {
                    return Err(format!("{flag}: at most {MAX_WINDOW_DAYS} days"));
                }
                out.days = Some(days);
            }
            "--timeout" => out.timeout_secs = Some(number(&flag, value(inline))?),
            "--history" => out.history = value(inline).filter(|v| !v.is_empty()),
            "--save" => out.save = true,
            "--dry-run" => out.dry_run = true,
            "--demo" => out.demo = true,
            _ if flag.starts_with('-') => {
                return Err(format!("Unknown option {flag}. {}", usage(&prog)));
            }
            _ => {
                if out.url.is_none() {
                    out.url = Some(arg);
                } else {
                    return Err(format!("Unexpected argument. {}", usage(&prog)));
                }
            }
        }
    }
    Ok(out)
}

/// Everything the app needs once a profile has been resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub base_url: String,
    pub interval: Duration,
    pub detail_interval: Duration,
    pub timeout: Duration,
    pub window_days: u32,
}

impl Settings {
    pub fn new(base_url: String, interval_ms: Option<u64>, args: &ParsedArgs) -> Self {
        let interval_ms = interval_ms
            .unwrap_or(DEFAULT_INTERVAL_MS)
            .max(MIN_INTERVAL_MS);
        Self {
            base_url,
            interval: Duration::from_millis(interval_ms),
            detail_interval: Duration::from_millis(DEFAULT_DETAIL_INTERVAL_MS.max(interval_ms)),
            timeout: Duration::from_secs(args.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS).max(1)),
            window_days: args
                .days
                .unwrap_or(DEFAULT_WINDOW_DAYS)
                .clamp(1, MAX_WINDOW_DAYS),
        }
    }

    pub fn poll(&self) -> PollSettings {
        PollSettings {
            interval: self.interval,
            detail_interval: self.detail_interval,
            timeout: self.timeout,
        }
    }
}

impl std::fmt::Display for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "url: {}", self.base_url)?;
        writeln!(f, "interval_ms: {}", self.interval.as_millis())?;
        writeln!(f, "detail_interval_ms: {}", self.detail_interval.as_millis())?;
        writeln!(f, "timeout_secs: {}", self.timeout.as_secs())?;
        write!(f, "days: {}", self.window_days)
    }
}
