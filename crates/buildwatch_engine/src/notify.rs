use std::process::{Command, Stdio};
use std::thread;

use engine_logging::{engine_debug, engine_info};

/// Shows a user-visible alert. Fire-and-forget: failures are logged, never returned.
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, subtitle: &str, body: &str);
}

/// Reads text aloud. Fire-and-forget like [`Notifier`].
pub trait Speaker: Send + Sync {
    fn speak(&self, text: &str);
}

/// Desktop banner via `osascript` on macOS and `notify-send` elsewhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn notify(&self, title: &str, subtitle: &str, body: &str) {
        if cfg!(target_os = "macos") {
            let script = format!(
                "display notification \"{}\" with title \"{}\" subtitle \"{}\"",
                applescript_escape(body),
                applescript_escape(title),
                applescript_escape(subtitle)
            );
            spawn_detached("osascript", &["-e", &script]);
        } else {
            let text = format!("{subtitle}\n{body}");
            spawn_detached("notify-send", &["--app-name=buildwatch", title, &text]);
        }
    }
}

/// Writes alerts to the log only; for headless runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, title: &str, subtitle: &str, body: &str) {
        engine_info!("{}: {} {}", title, subtitle, body);
    }
}

/// Speech via `say` on macOS and `spd-say` elsewhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandSpeaker;

impl Speaker for CommandSpeaker {
    fn speak(&self, text: &str) {
        if cfg!(target_os = "macos") {
            spawn_detached("say", &[text]);
        } else {
            spawn_detached("spd-say", &[text]);
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SilentSpeaker;

impl Speaker for SilentSpeaker {
    fn speak(&self, _text: &str) {}
}

fn applescript_escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Start a helper process and reap it on a background thread.
fn spawn_detached(program: &str, args: &[&str]) {
    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();
    match child {
        Ok(mut child) => {
            thread::spawn(move || {
                let _ = child.wait();
            });
        }
        Err(err) => engine_debug!("Could not start {}: {}", program, err),
    }
}
