//! Entry point for the fleettop TUI. Parses args, resolves a profile and runs the App.

mod app;
mod ui;

use std::env;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context;
use app::App;
use fleettop::api::ApiClient;
use fleettop::config::{parse_args, ParsedArgs, Settings, DEMO_PORT};
use fleettop::logging;
use fleettop::profiles::{
    load_profiles, save_profiles, ProfileEntry, ProfileRequest, ResolveProfile,
};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let parsed = match parse_args(env::args()) {
        Ok(v) => v,
        Err(msg) => {
            eprintln!("{msg}");
            return Ok(());
        }
    };

    // Demo mode short-circuit
    if parsed.demo || matches!(parsed.profile.as_deref(), Some("demo")) {
        return run_demo_mode(&parsed).await;
    }

    let profiles_file = load_profiles();
    let req = ProfileRequest {
        profile_name: parsed.profile.clone(),
        url: parsed.url.clone(),
        interval_ms: parsed.interval_ms,
    };
    let resolved = req.resolve(&profiles_file);

    let mut profiles_mut = profiles_file.clone();
    let entry: ProfileEntry = match resolved {
        ResolveProfile::Direct(entry) => {
            // Save if a profile was named and it is new, or changed and confirmed
            if let Some(name) = parsed.profile.as_ref() {
                match profiles_mut.profiles.get(name) {
                    None => {
                        profiles_mut.profiles.insert(name.clone(), entry.clone());
                        persist(&profiles_mut);
                    }
                    Some(existing) if *existing != entry => {
                        let overwrite = parsed.save
                            || prompt_yes_no(&format!(
                                "Overwrite existing profile '{name}'? [y/N]: "
                            ));
                        if overwrite {
                            profiles_mut.profiles.insert(name.clone(), entry.clone());
                            persist(&profiles_mut);
                        }
                    }
                    Some(_) => {}
                }
            }
            entry
        }
        ResolveProfile::Loaded(entry) => entry,
        ResolveProfile::PromptSelect(mut names) => {
            if !names.iter().any(|n| n == "demo") {
                names.push("demo".into());
            }
            eprintln!("Select profile:");
            for (i, n) in names.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, n);
            }
            let line = prompt_string("Enter number (or blank to abort): ")?;
            let Some(name) = line
                .trim()
                .parse::<usize>()
                .ok()
                .and_then(|idx| idx.checked_sub(1))
                .and_then(|idx| names.get(idx))
            else {
                return Ok(());
            };
            if name == "demo" {
                return run_demo_mode(&parsed).await;
            }
            match profiles_mut.profiles.get(name) {
                Some(entry) => ProfileEntry {
                    url: entry.url.clone(),
                    interval_ms: parsed.interval_ms.or(entry.interval_ms),
                },
                None => return Ok(()),
            }
        }
        ResolveProfile::PromptCreate(name) => {
            eprintln!("Profile '{name}' does not exist yet.");
            let url = prompt_string("Enter URL (http://HOST:PORT or https://...): ")?;
            if url.trim().is_empty() {
                return Ok(());
            }
            let interval = prompt_string("Refresh interval in ms (or leave blank): ")?;
            let entry = ProfileEntry {
                url: url.trim().to_string(),
                interval_ms: parsed
                    .interval_ms
                    .or_else(|| interval.trim().parse::<u64>().ok()),
            };
            profiles_mut.profiles.insert(name, entry.clone());
            persist(&profiles_mut);
            entry
        }
        ResolveProfile::None => {
            eprintln!("No URL provided and no profiles to select.");
            return Ok(());
        }
    };

    let settings = Settings::new(entry.url, entry.interval_ms, &parsed);
    run(settings, &parsed).await
}

async fn run(settings: Settings, parsed: &ParsedArgs) -> anyhow::Result<()> {
    if parsed.dry_run {
        println!("{settings}");
        return Ok(());
    }
    if let Some(machine) = parsed.history.as_deref() {
        return print_history(&settings, machine).await;
    }

    if let Some(path) = logging::init() {
        info!(log = %path.display(), "fleettop starting");
    }
    let mut app = App::new(&settings);
    app.run(&settings).await
}

async fn print_history(settings: &Settings, machine: &str) -> anyhow::Result<()> {
    let client = ApiClient::new(&settings.base_url, settings.timeout)?;
    let data = client
        .fetch_historical_data(machine)
        .await
        .with_context(|| format!("fetching history for {machine}"))?;
    println!("{}", serde_json::to_string_pretty(&data)?);
    Ok(())
}

fn persist(profiles: &fleettop::profiles::ProfilesFile) {
    if let Err(e) = save_profiles(profiles) {
        eprintln!("Could not save profiles: {e}");
    }
}

fn prompt_yes_no(prompt: &str) -> bool {
    eprint!("{prompt}");
    let _ = io::stderr().flush();
    let mut line = String::new();
    if io::stdin().read_line(&mut line).is_ok() {
        matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    } else {
        false
    }
}

fn prompt_string(prompt: &str) -> io::Result<String> {
    eprint!("{prompt}");
    let _ = io::stderr().flush();
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line)
}

// --- Demo Mode ---

async fn run_demo_mode(parsed: &ParsedArgs) -> anyhow::Result<()> {
    let url = format!("http://127.0.0.1:{DEMO_PORT}");
    let settings = Settings::new(url, parsed.interval_ms, parsed);
    if parsed.dry_run {
        println!("{settings}");
        return Ok(());
    }
    let child = spawn_demo_agent(DEMO_PORT)?;
    let mut app = App::new(&settings);
    tokio::select! {
        res = app.run(&settings) => { drop(child); res }
        _ = tokio::signal::ctrl_c() => {
            drop(child);
            Ok(())
        }
    }
}

struct DemoGuard(Arc<Mutex<Option<std::process::Child>>>);

impl Drop for DemoGuard {
    fn drop(&mut self) {
        let child = match self.0.lock() {
            Ok(mut g) => g.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(mut ch) = child {
            if let Err(e) = ch.kill() {
                warn!(error = %e, "failed to stop demo agent");
            }
            let _ = ch.wait();
        }
    }
}

fn spawn_demo_agent(port: u16) -> anyhow::Result<DemoGuard> {
    let candidate = find_agent_executable();
    let mut cmd = std::process::Command::new(&candidate);
    cmd.arg("--port").arg(port.to_string());
    cmd.env("FLEETTOP_AGENT_GPU", "0");
    cmd.stdout(std::process::Stdio::null());
    cmd.stderr(std::process::Stdio::null());
    let child = cmd
        .spawn()
        .with_context(|| format!("starting demo agent {}", candidate.display()))?;
    // Give the agent a brief moment to start
    std::thread::sleep(Duration::from_millis(300));
    Ok(DemoGuard(Arc::new(Mutex::new(Some(child)))))
}

fn find_agent_executable() -> std::path::PathBuf {
    #[cfg(windows)]
    let name = "fleettop_agent.exe";
    #[cfg(not(windows))]
    let name = "fleettop_agent";
    if let Some(parent) = std::env::current_exe().ok().and_then(|e| e.parent().map(|p| p.to_path_buf())) {
        let candidate = parent.join(name);
        if candidate.exists() {
            return candidate;
        }
    }
    // Fallback to relying on PATH
    std::path::PathBuf::from(name)
}
