//! Terminal host state: one mounted command center plus the pieces a real
//! front end would own (map engine, text inputs, panel consumers).

use std::io;
use std::path::Path;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyModifiers};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use opsdeck_core::bus::{BridgeEvent, EventBus, Subscription, Topic};
use opsdeck_core::config::OpsdeckConfig;
use opsdeck_core::controller::{CenterOptions, CommandCenter};
use opsdeck_core::keyboard::{FocusTarget, Key, KeyInput, Modifiers};
use opsdeck_core::mobile::{DockItem, IntelAction, LayerToggle};
use opsdeck_core::model::{LayoutMode, MapTheme, MobilePanel, ModalKey};
use opsdeck_core::palette::{self, PaletteEntry};
use opsdeck_core::preferences::{FileStore, PreferenceStore, SETTINGS_KEY};
use opsdeck_core::render::Panel;

use crate::surface::SimulatedMap;
use crate::watcher::PreferenceWatcher;

const WATCH_INTERVAL: Duration = Duration::from_secs(1);

/// Where typed characters go.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Palette,
    Search,
}

impl InputMode {
    fn focus(self) -> FocusTarget {
        match self {
            Self::Normal => FocusTarget::Document,
            Self::Palette | Self::Search => FocusTarget::TextInput,
        }
    }
}

pub struct App {
    pub center: CommandCenter,
    pub map: SimulatedMap,
    bus: EventBus,
    store: FileStore,
    watcher: PreferenceWatcher,
    /// Listener of the estimate calculator; only alive while it is mounted.
    estimate_inbox: Option<Subscription>,
    pub estimate: Option<Value>,
    pub scans: u64,
    pub mode: InputMode,
    pub palette_query: String,
    pub palette_pick: usize,
    pub search_input: String,
    search_focus_seen: u64,
    pub sheet_pick: usize,
    pub status: Option<String>,
    compact_width: u16,
    pub quit: bool,
}

/// Translate a terminal key into the router's input shape.
pub fn key_input(code: KeyCode, modifiers: KeyModifiers, focus: FocusTarget) -> KeyInput {
    let key = match code {
        KeyCode::Char(c) => Key::Char(c),
        KeyCode::Esc => Key::Escape,
        KeyCode::Enter => Key::Enter,
        _ => Key::Other,
    };
    KeyInput {
        key,
        modifiers: Modifiers {
            ctrl: modifiers.contains(KeyModifiers::CONTROL),
            meta: modifiers.intersects(KeyModifiers::SUPER | KeyModifiers::META),
            shift: modifiers.contains(KeyModifiers::SHIFT),
            alt: modifiers.contains(KeyModifiers::ALT),
        },
        focus,
    }
}

impl App {
    pub fn new(config: &OpsdeckConfig, base: &Path) -> io::Result<Self> {
        let dir = config.preferences_dir(base);
        std::fs::create_dir_all(&dir)?;
        let store = FileStore::new(dir);

        let bus = EventBus::new(config.bus_capacity);
        let options = CenterOptions::from_config(config);
        let map = SimulatedMap::new(bus.clone(), &options.initial_map);
        let mut center = CommandCenter::new(bus.clone(), Box::new(store.clone()), options);
        center.attach_map(Box::new(map.clone()));

        let watcher = PreferenceWatcher::new(store.clone(), &[SETTINGS_KEY], WATCH_INTERVAL);

        Ok(Self {
            center,
            map,
            bus,
            store,
            watcher,
            estimate_inbox: None,
            estimate: None,
            scans: 0,
            mode: InputMode::Normal,
            palette_query: String::new(),
            palette_pick: 0,
            search_input: String::new(),
            search_focus_seen: 0,
            sheet_pick: 0,
            status: None,
            compact_width: config.compact_width,
            quit: false,
        })
    }

    pub fn resize(&mut self, width: u16) {
        let layout = if width < self.compact_width {
            LayoutMode::Compact
        } else {
            LayoutMode::Wide
        };
        self.center.set_layout(layout);
    }

    /// One host iteration: pick up foreign preference writes, drain the
    /// bridge, then let mounted consumers read what is meant for them.
    pub fn tick(&mut self) {
        self.watcher.poll(&self.bus);
        self.center.drain();
        self.sync_estimate_panel();
    }

    fn sync_estimate_panel(&mut self) {
        let mounted = self.center.mount_plan().contains(&Panel::EstimateCalculator);
        if !mounted {
            if self.estimate_inbox.take().is_some() {
                debug!("estimate calculator unmounted");
            }
            self.estimate = None;
            return;
        }
        let inbox = self
            .estimate_inbox
            .get_or_insert_with(|| self.bus.subscribe_to(&[Topic::DetectionEstimate]));
        for envelope in inbox.drain() {
            if let BridgeEvent::DetectionEstimate { analysis, .. } = envelope.event {
                info!(seq = envelope.seq, "estimate calculator received analysis");
                self.estimate = Some(analysis);
            }
        }
    }

    pub fn palette_matches(&self) -> Vec<&'static PaletteEntry> {
        palette::filter(&self.palette_query)
    }

    pub fn top_panel(&self) -> Option<Panel> {
        self.center.mount_plan().last().copied()
    }

    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
            self.quit = true;
            return;
        }

        let input = key_input(code, modifiers, self.mode.focus());
        if self.center.handle_key(&input).is_none() {
            match self.mode {
                InputMode::Palette => self.palette_key(code, modifiers),
                InputMode::Search => self.search_key(code, modifiers),
                InputMode::Normal => self.normal_key(code, modifiers),
            }
        }
        self.sync_input_mode();
    }

    /// Follow the center: the palette modal and search focus requests
    /// decide which text input owns the keyboard.
    fn sync_input_mode(&mut self) {
        let palette_open = self.center.state().modals.is_open(ModalKey::CommandPalette);
        if palette_open && self.mode != InputMode::Palette {
            self.mode = InputMode::Palette;
            self.palette_query.clear();
            self.palette_pick = 0;
        } else if !palette_open && self.mode == InputMode::Palette {
            self.mode = InputMode::Normal;
        }

        let seq = self.center.state().search_focus_seq;
        if seq != self.search_focus_seen {
            self.search_focus_seen = seq;
            if self.mode == InputMode::Normal {
                self.mode = InputMode::Search;
                self.search_input.clear();
            }
        }
    }

    fn palette_key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        if is_chord(code, modifiers) {
            return;
        }
        match code {
            KeyCode::Esc => {
                self.center.close_modal(ModalKey::CommandPalette);
            }
            KeyCode::Enter => {
                if let Some(entry) = self.palette_matches().get(self.palette_pick).copied() {
                    self.center.select_palette_entry(entry);
                }
            }
            KeyCode::Up => self.palette_pick = self.palette_pick.saturating_sub(1),
            KeyCode::Down => {
                if self.palette_pick + 1 < self.palette_matches().len() {
                    self.palette_pick += 1;
                }
            }
            KeyCode::Backspace => {
                self.palette_query.pop();
                self.palette_pick = 0;
            }
            KeyCode::Char(c) => {
                self.palette_query.push(c);
                self.palette_pick = 0;
            }
            _ => {}
        }
    }

    fn search_key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        if is_chord(code, modifiers) {
            return;
        }
        match code {
            KeyCode::Esc => self.mode = InputMode::Normal,
            KeyCode::Enter => {
                match parse_coordinates(&self.search_input) {
                    Some((lat, lng)) => {
                        self.map.go_to(lat, lng);
                        self.status = Some(format!("centered on {lat:.4}, {lng:.4}"));
                    }
                    None => {
                        self.status = Some(format!("not a coordinate: {}", self.search_input));
                    }
                }
                self.mode = InputMode::Normal;
            }
            KeyCode::Backspace => {
                self.search_input.pop();
            }
            KeyCode::Char(c) => self.search_input.push(c),
            _ => {}
        }
    }

    fn normal_key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        if self.sheet_key(code) {
            return;
        }
        if let KeyCode::F(n) = code {
            if let Some(item) = DockItem::ALL.get(usize::from(n).wrapping_sub(1)) {
                self.center.press_dock(*item);
            }
            return;
        }
        if !modifiers.is_empty() && modifiers != KeyModifiers::SHIFT {
            return;
        }
        match code {
            KeyCode::Enter => self.panel_action(),
            KeyCode::Char('q') => self.quit = true,
            KeyCode::Char('x') => {
                if let Some(panel) = self.top_panel() {
                    self.center.close_panel(panel);
                }
            }
            KeyCode::Up => self.map.pan(1.0, 0.0),
            KeyCode::Down => self.map.pan(-1.0, 0.0),
            KeyCode::Left => self.map.pan(0.0, -1.0),
            KeyCode::Right => self.map.pan(0.0, 1.0),
            KeyCode::Char('+') | KeyCode::Char('=') => self.map.zoom_by(1.0),
            KeyCode::Char('-') => self.map.zoom_by(-1.0),
            KeyCode::Char('c') => self.center.map().clear(),
            KeyCode::Char('l') => self.center.map().locate_me(),
            KeyCode::Char('v') => self.center.map().toggle_street_view(),
            KeyCode::Char('r') => self.center.map().toggle_parcels(),
            KeyCode::Char('i') => {
                let next = self.center.map_state().imagery.next();
                self.center.map().set_imagery(next);
            }
            _ => {}
        }
    }

    /// Row navigation inside the visible bottom sheet.
    fn sheet_key(&mut self, code: KeyCode) -> bool {
        let Some(sheet) = self.center.visible_sheet() else {
            return false;
        };
        let rows = match sheet {
            MobilePanel::Layers => LayerToggle::ALL.len(),
            MobilePanel::Intel => IntelAction::ALL.len(),
            _ => return false,
        };
        match code {
            KeyCode::Up => self.sheet_pick = self.sheet_pick.saturating_sub(1),
            KeyCode::Down => self.sheet_pick = (self.sheet_pick + 1).min(rows - 1),
            KeyCode::Enter => match sheet {
                MobilePanel::Layers => {
                    if let Some(layer) = LayerToggle::ALL.get(self.sheet_pick) {
                        self.center.flip_layer(*layer);
                    }
                }
                _ => {
                    if let Some(action) = IntelAction::ALL.get(self.sheet_pick) {
                        self.center.run_intel_action(*action);
                        self.sheet_pick = 0;
                    }
                }
            },
            _ => return false,
        }
        true
    }

    /// Enter acts on the topmost panel, or drops a shape on the bare map.
    fn panel_action(&mut self) {
        match self.top_panel() {
            Some(Panel::AiDetection) => self.run_scan(),
            Some(Panel::Settings) => self.toggle_theme(),
            Some(_) => {}
            None => {
                if !self.map.place_shape() {
                    self.status = Some("select a drawing tool first (1-4, m)".into());
                }
            }
        }
    }

    /// Produce a detection result and hand it to the bridge, the way the
    /// detection panel does once its analysis finishes.
    fn run_scan(&mut self) {
        self.scans += 1;
        let n = self.scans;
        let snapshot = self.map.snapshot();
        let condition = ["good", "fair", "poor"][(n % 3) as usize];
        let analysis = json!({
            "scanId": n,
            "areaSqFt": 1200 + (n * 337) % 900,
            "condition": condition,
            "cracksDetected": (n * 7) % 11,
            "lat": snapshot.lat,
            "lng": snapshot.lng,
        });
        self.bus.publish(BridgeEvent::detection(analysis));
        self.center.close_modal(ModalKey::AiDetection);
        self.status = Some(format!("scan #{n} sent to estimate"));
    }

    fn toggle_theme(&mut self) {
        let next = match self.center.map_theme() {
            MapTheme::Division => "animus",
            MapTheme::Animus => "division",
        };
        match self.write_setting("mapTheme", Value::from(next)) {
            Ok(()) => {
                self.watcher.acknowledge(SETTINGS_KEY);
                self.center.reload_preferences();
            }
            Err(e) => {
                warn!(error = %e, "failed to write settings");
                self.status = Some(format!("settings not saved: {e}"));
            }
        }
    }

    /// Set one field of the settings blob, keeping the others.
    fn write_setting(&self, field: &str, value: Value) -> io::Result<()> {
        let mut blob = self
            .store
            .read(SETTINGS_KEY)
            .and_then(|raw| serde_json::from_str::<Value>(&raw).ok())
            .filter(Value::is_object)
            .unwrap_or_else(|| json!({}));
        if let Some(obj) = blob.as_object_mut() {
            obj.insert(field.to_string(), value);
        }
        let text = serde_json::to_string_pretty(&blob).map_err(io::Error::other)?;
        std::fs::write(self.store.path_for(SETTINGS_KEY), text)
    }

    /// Unmount: the center goes first, then the session bus.
    pub fn shutdown(self) {
        let Self { center, bus, .. } = self;
        drop(center);
        bus.close();
        info!("command center unmounted");
    }
}

/// A character typed with a command modifier is a shortcut, never text.
fn is_chord(code: KeyCode, modifiers: KeyModifiers) -> bool {
    matches!(code, KeyCode::Char(_))
        && modifiers.intersects(
            KeyModifiers::CONTROL | KeyModifiers::SUPER | KeyModifiers::META | KeyModifiers::ALT,
        )
}

/// `"lat, lng"` or `"lat lng"`.
fn parse_coordinates(input: &str) -> Option<(f64, f64)> {
    let mut parts = input
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty());
    let lat: f64 = parts.next()?.parse().ok()?;
    let lng: f64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() || !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
        return None;
    }
    Some((lat, lng))
}
