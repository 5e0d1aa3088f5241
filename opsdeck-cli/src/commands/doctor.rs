use std::path::{Path, PathBuf};

use opsdeck_core::config::OpsdeckConfig;
use opsdeck_core::model::MapTheme;
use opsdeck_core::preferences::{FileStore, PreferenceStore, SETTINGS_KEY, load_map_theme};

#[derive(Debug)]
pub struct Check {
    pub name: String,
    pub passed: bool,
    pub message: String,
    pub hint: Option<String>,
}

impl Check {
    fn ok(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: true,
            message: message.into(),
            hint: None,
        }
    }

    fn fail(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: false,
            message: message.into(),
            hint: None,
        }
    }

    fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

pub fn run_doctor(explicit: Option<&Path>) -> Result<(), String> {
    println!("Opsdeck Doctor\n");

    let cwd = std::env::current_dir().map_err(|e| e.to_string())?;
    let mut checks: Vec<Check> = Vec::new();

    // === Config ===
    println!("Configuration:");
    let (config_check, path, config) = check_config(explicit, &cwd);
    print_check(&config_check);
    checks.push(config_check);

    let base = path
        .as_deref()
        .and_then(Path::parent)
        .filter(|parent| !parent.as_os_str().is_empty())
        .map_or_else(|| cwd.clone(), Path::to_path_buf);

    let handoff = if config.handoff_delay_ms == 0 {
        Check::fail("handoff", "delay is 0 ms")
            .with_hint("the estimate panel may miss payloads; 50 ms is the default")
    } else {
        Check::ok("handoff", format!("{} ms", config.handoff_delay_ms))
    };
    print_check(&handoff);
    checks.push(handoff);
    println!();

    // === Preferences ===
    let dir = config.preferences_dir(&base);
    println!("Preferences: {}", dir.display());
    for check in check_preferences(&dir) {
        print_check(&check);
        checks.push(check);
    }
    println!();

    // === Terminal ===
    println!("Terminal:");
    let terminal = check_terminal(config.compact_width);
    print_check(&terminal);
    checks.push(terminal);
    println!();

    // === Summary ===
    let failed: Vec<_> = checks.iter().filter(|c| !c.passed).collect();
    if failed.is_empty() {
        println!("All checks passed!");
    } else {
        println!("Issues found:");
        for check in &failed {
            println!("  - {}: {}", check.name, check.message);
            if let Some(hint) = &check.hint {
                println!("    Hint: {}", hint);
            }
        }
    }

    Ok(())
}

fn print_check(check: &Check) {
    let icon = if check.passed { "✓" } else { "✗" };
    let color = if check.passed { "\x1b[32m" } else { "\x1b[31m" };
    let reset = "\x1b[0m";

    println!(
        "  {}{}{} {}: {}",
        color, icon, reset, check.name, check.message
    );

    if let Some(hint) = &check.hint {
        println!("    └─ {}", hint);
    }
}

/// A config that fails to load is reported, then defaults stand in so the
/// remaining checks still run.
fn check_config(explicit: Option<&Path>, cwd: &Path) -> (Check, Option<PathBuf>, OpsdeckConfig) {
    let loaded = match explicit {
        Some(path) => OpsdeckConfig::load(path).map(|c| (Some(path.to_path_buf()), c)),
        None => OpsdeckConfig::discover_or_default(cwd),
    };
    match loaded {
        Ok((Some(path), config)) => (
            Check::ok("config", path.display().to_string()),
            Some(path),
            config,
        ),
        Ok((None, config)) => (
            Check::ok("config", "not found, using defaults")
                .with_hint("create opsdeck.yaml to set the initial map view"),
            None,
            config,
        ),
        Err(e) => (
            Check::fail("config", e.to_string()).with_hint("fix the file or pass --config"),
            explicit.map(Path::to_path_buf),
            OpsdeckConfig::default(),
        ),
    }
}

fn check_preferences(dir: &Path) -> Vec<Check> {
    if !dir.exists() {
        return vec![Check::ok("directory", "not created yet").with_hint("created on first launch")];
    }
    if !dir.is_dir() {
        return vec![Check::fail("directory", "exists but is not a directory")];
    }

    let store = FileStore::new(dir);
    let mut checks = vec![Check::ok("directory", "present")];
    let settings = match store.read(SETTINGS_KEY) {
        None => Check::ok("settings", "not saved yet"),
        Some(raw) => match serde_json::from_str::<serde_json::Value>(&raw) {
            Ok(_) => {
                let theme = match load_map_theme(&store) {
                    MapTheme::Division => "division",
                    MapTheme::Animus => "animus",
                };
                Check::ok("settings", format!("map theme {theme}"))
            }
            Err(e) => Check::fail("settings", format!("unreadable JSON: {e}"))
                .with_hint(format!(
                    "the Division theme is used until {} is fixed",
                    store.path_for(SETTINGS_KEY).display()
                )),
        },
    };
    checks.push(settings);
    checks
}

fn check_terminal(compact_width: u16) -> Check {
    match crossterm::terminal::size() {
        Ok((width, height)) => {
            let layout = if width < compact_width { "compact" } else { "wide" };
            let check = Check::ok("size", format!("{width}x{height}, {layout} layout"));
            if height < 12 {
                Check::fail("size", format!("{width}x{height} is too short"))
                    .with_hint("panels need at least 12 rows")
            } else {
                check
            }
        }
        Err(e) => Check::fail("size", format!("not a terminal ({e})")),
    }
}
