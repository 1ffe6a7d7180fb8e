use std::fs;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};
use std::thread;

use anyhow::{bail, Context, Result};
use buildwatch_core::{
    parse, parse_locator, Job, JobId, JobStore, KeyValueStore, SecretStore, Settings,
    TrackerView, WatchEvent,
};
use buildwatch_engine::{
    Collaborators, CommandSpeaker, DesktopNotifier, FileStore, KeyringSecretStore, LogNotifier,
    Notifier, ReqwestStatusClient, SilentSpeaker, Speaker, WatchHandle,
};
use chrono::{Local, Utc};
use engine_logging::{engine_info, engine_warn};

use crate::cli::{ConfigArgs, WatchArgs};

/// One line typed while `watch` runs.
#[derive(Debug, PartialEq, Eq)]
enum InputCommand {
    Add(String),
    Remove(String),
    List,
    Reload,
    Quit,
    Blank,
}

impl InputCommand {
    fn parse(line: &str) -> Self {
        let line = line.trim();
        match line.split_once(char::is_whitespace) {
            Some(("remove", target)) => InputCommand::Remove(target.trim().to_string()),
            Some(("add", locator)) => InputCommand::Add(locator.trim().to_string()),
            _ => match line {
                "" => InputCommand::Blank,
                "list" => InputCommand::List,
                "reload" => InputCommand::Reload,
                "quit" | "exit" => InputCommand::Quit,
                other => InputCommand::Add(other.to_string()),
            },
        }
    }
}

/// Present in the data directory while `watch` runs.
const WATCH_MARKER: &str = "watch.pid";

/// Marks the data directory as watched until dropped.
struct WatchMarker {
    path: PathBuf,
}

impl WatchMarker {
    fn create(data_dir: &Path) -> Self {
        let path = data_dir.join(WATCH_MARKER);
        if let Err(err) = fs::write(&path, std::process::id().to_string()) {
            engine_warn!("Failed to write {}: {}", path.display(), err);
        }
        Self { path }
    }
}

impl Drop for WatchMarker {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

fn is_watched(data_dir: &Path) -> bool {
    data_dir.join(WATCH_MARKER).exists()
}

enum UiEvent {
    Watch(WatchEvent),
    Line(String),
    InputClosed,
}

pub fn watch(data_dir: &Path, args: &WatchArgs) -> Result<()> {
    let config = args.service_config();
    let client = ReqwestStatusClient::new(&config.client_settings())
        .context("failed to build HTTP client")?;
    let notifier: Arc<dyn Notifier> = if args.quiet_notifications {
        Arc::new(LogNotifier)
    } else {
        Arc::new(DesktopNotifier)
    };
    let speaker: Arc<dyn Speaker> = if args.no_speech {
        Arc::new(SilentSpeaker)
    } else {
        Arc::new(CommandSpeaker)
    };

    let values = Arc::new(FileStore::new(data_dir));
    let secrets = Arc::new(KeyringSecretStore::default());
    let handle = WatchHandle::spawn(
        config,
        Collaborators {
            values: values.clone(),
            secrets: secrets.clone(),
            client: Arc::new(client),
            notifier,
            speaker,
        },
    )?;
    let _marker = WatchMarker::create(data_dir);

    let (ui_tx, ui_rx) = mpsc::channel();
    let watch_events = handle.subscribe()?;
    let forward_tx = ui_tx.clone();
    thread::spawn(move || {
        for event in watch_events {
            if forward_tx.send(UiEvent::Watch(event)).is_err() {
                break;
            }
        }
    });
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if ui_tx.send(UiEvent::Line(line)).is_err() {
                return;
            }
        }
        let _ = ui_tx.send(UiEvent::InputClosed);
    });

    for locator in &args.locators {
        submit(&handle, locator);
    }

    let view = handle.view()?;
    if !view.configured {
        println!("No server configured; run `buildwatch config --url <URL>` first.");
    }
    print_view(&view);

    for event in ui_rx {
        match event {
            UiEvent::Watch(event) => print_event(&event),
            UiEvent::Line(line) => match InputCommand::parse(&line) {
                InputCommand::Add(locator) => submit(&handle, &locator),
                InputCommand::Remove(target) => {
                    let view = handle.view()?;
                    match resolve_target(
                        view.jobs.iter().map(|row| (row.job_id, row.path.as_str())),
                        &target,
                    ) {
                        Some(job_id) => handle.remove_job(job_id)?,
                        None => println!("No tracked build matches {target:?}"),
                    }
                }
                InputCommand::List => print_view(&handle.view()?),
                InputCommand::Reload => {
                    reload_settings(&handle, values.as_ref(), secrets.as_ref())?;
                }
                InputCommand::Quit => break,
                InputCommand::Blank => {}
            },
            UiEvent::InputClosed => {
                engine_info!("Input closed; watching until interrupted");
            }
        }
    }

    if let Some(state) = handle.shutdown() {
        engine_info!("Stopped with {} tracked jobs", state.jobs().len());
    }
    Ok(())
}

/// Re-read the stored settings and hand them to the service, which re-polls every eligible job.
fn reload_settings(
    handle: &WatchHandle,
    values: &dyn KeyValueStore,
    secrets: &dyn SecretStore,
) -> Result<()> {
    let settings = Settings::load(values, secrets);
    engine_info!("Reloading settings for {}", settings.base_url);
    handle.save_settings(settings)?;
    Ok(())
}

fn submit(handle: &WatchHandle, locator: &str) {
    if let Err(err) = handle.add_locator(locator) {
        println!("Cannot track {locator:?}: {err}");
    }
}

pub fn add(data_dir: &Path, locators: &[String]) -> Result<()> {
    warn_if_watched(data_dir, "add");
    let mut store = open_jobs(data_dir);
    let mut failed = 0;
    for raw in locators {
        match parse(raw) {
            Ok(job) => {
                let path = job.path.clone();
                if store.add(job) {
                    println!("Tracking {path}");
                } else {
                    println!("Already tracking {path}");
                }
            }
            Err(err) => {
                println!("Cannot track {raw:?}: {err}");
                failed += 1;
            }
        }
    }
    if failed > 0 {
        bail!("{failed} locator(s) rejected");
    }
    Ok(())
}

pub fn remove(data_dir: &Path, target: &str) -> Result<()> {
    warn_if_watched(data_dir, "remove");
    let mut store = open_jobs(data_dir);
    let Some(job_id) = resolve_target(job_keys(store.all()), target) else {
        bail!("no tracked build matches {target:?}");
    };
    let job = store.remove(job_id)?;
    println!("Stopped tracking {}", job.path);
    Ok(())
}

pub fn list(data_dir: &Path) -> Result<()> {
    let values = FileStore::new(data_dir);
    let secrets = KeyringSecretStore::default();
    let settings = Settings::load(&values, &secrets);
    let store = JobStore::load(Box::new(values));

    if settings.is_configured() {
        println!("Server: {}", settings.base_url);
    } else {
        println!("Server: (not configured)");
    }
    if store.is_empty() {
        println!("No tracked builds.");
    }
    for job in store.all() {
        println!(
            "{}  {:<10} {} #{}  (checked {})",
            job.id,
            job.status,
            job.display_name(),
            job.build_id,
            job.last_checked.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
        );
    }
    Ok(())
}

pub fn config(data_dir: &Path, args: &ConfigArgs) -> Result<()> {
    let values = FileStore::new(data_dir);
    let secrets = KeyringSecretStore::default();
    configure(&values, &secrets, args, read_password_line)?;
    if !args.is_empty() && is_watched(data_dir) {
        println!("Type `reload` in the running `buildwatch watch` to apply the new settings.");
    }
    Ok(())
}

fn configure(
    values: &dyn KeyValueStore,
    secrets: &dyn SecretStore,
    args: &ConfigArgs,
    read_password: impl FnOnce() -> Result<String>,
) -> Result<()> {
    let mut settings = Settings::load(values, secrets);
    if args.is_empty() {
        println!("URL:      {}", settings.base_url);
        println!("Username: {}", settings.username);
        println!(
            "Password: {}",
            if settings.secret.is_empty() { "(none)" } else { "(stored)" }
        );
        return Ok(());
    }

    if let Some(url) = &args.url {
        settings.base_url = url.trim().to_string();
    }
    if let Some(username) = &args.username {
        settings.username = username.clone();
    }
    if let Some(password) = &args.password {
        engine_warn!("Password given on the command line; prefer --password-stdin");
        settings.secret = password.clone();
    } else if args.password_stdin {
        settings.secret = read_password()?;
    }

    settings
        .save(values, secrets)
        .context("failed to save server settings")?;
    println!("Saved settings for {}", settings.base_url);
    Ok(())
}

fn read_password_line() -> Result<String> {
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read password from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// The running watcher keeps its own job list and overwrites `state.json` on its next save.
fn warn_if_watched(data_dir: &Path, command: &str) {
    if is_watched(data_dir) {
        println!(
            "Note: `buildwatch watch` is running on this data directory and will overwrite \
             this change; type `{command} ...` into its input instead."
        );
    }
}

fn open_jobs(data_dir: &Path) -> JobStore {
    JobStore::load(Box::new(FileStore::new(data_dir)))
}

/// Finds a job by id, or by a locator naming the same build.
fn resolve_target<'a>(
    candidates: impl IntoIterator<Item = (JobId, &'a str)>,
    target: &str,
) -> Option<JobId> {
    let target = target.trim();
    let mut candidates = candidates.into_iter();
    if let Ok(id) = JobId::parse_str(target) {
        return candidates.find(|(job_id, _)| *job_id == id).map(|(job_id, _)| job_id);
    }
    let locator = parse_locator(target).ok()?;
    candidates
        .find(|(_, path)| *path == locator.path)
        .map(|(job_id, _)| job_id)
}

fn job_keys(jobs: &[Job]) -> impl Iterator<Item = (JobId, &str)> {
    jobs.iter().map(|job| (job.id, job.path.as_str()))
}

fn print_view(view: &TrackerView) {
    if view.jobs.is_empty() {
        println!("No tracked builds.");
        return;
    }
    for row in &view.jobs {
        let marker = if row.polling { "*" } else { " " };
        println!(
            "{marker} {}  {:<10} {} #{}",
            row.job_id, row.status, row.name, row.build_id
        );
    }
}

fn print_event(event: &WatchEvent) {
    let now = Utc::now().with_timezone(&Local).format("%H:%M:%S");
    match event {
        WatchEvent::JobAdded(job) => println!("[{now}] + {} #{}", job.display_name(), job.build_id),
        WatchEvent::JobUpdated { job, previous } if *previous != job.status => println!(
            "[{now}] {} #{}: {} -> {}",
            job.display_name(),
            job.build_id,
            previous,
            job.status
        ),
        WatchEvent::JobUpdated { .. } => {}
        WatchEvent::JobRemoved(job) => {
            println!("[{now}] - {} #{}", job.display_name(), job.build_id)
        }
        WatchEvent::SettingsChanged { configured } => {
            println!("[{now}] Settings changed (configured: {configured})")
        }
    }
}
