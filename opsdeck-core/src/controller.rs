//! The command center orchestrator.
//!
//! One [`CommandCenter`] exists per mounted session. It owns the state
//! container, the map adapter and the keyboard router, and it is the only
//! consumer of the bridge that mutates orchestration state. Dropping it is
//! the unmount.

use std::time::Duration;

use serde_json::Value;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::bus::{BridgeEvent, EventBus, Subscription, Topic};
use crate::config::OpsdeckConfig;
use crate::keyboard::{self, Dispatch, KeyCommand, KeyInput};
use crate::map::{MapControls, MapSurface};
use crate::mobile::{DockItem, IntelAction, LayerToggle};
use crate::model::{CommandModule, LayoutMode, MapTheme, MobilePanel, ModalKey};
use crate::palette::PaletteEntry;
use crate::preferences::{self, PreferenceStore, SETTINGS_KEY};
use crate::reducer::{Intent, Transition, reduce};
use crate::render::{self, Panel};
use crate::state::{CommandCenterState, MapUiState};

pub const DEFAULT_HANDOFF_DELAY: Duration = Duration::from_millis(50);

#[derive(Clone, Debug, PartialEq)]
pub struct CenterOptions {
    /// Time given to the estimate module to mount before the payload is
    /// re-published for it.
    pub handoff_delay: Duration,
    pub initial_map: MapUiState,
    pub layout: LayoutMode,
}

impl Default for CenterOptions {
    fn default() -> Self {
        Self {
            handoff_delay: DEFAULT_HANDOFF_DELAY,
            initial_map: MapUiState::default(),
            layout: LayoutMode::Wide,
        }
    }
}

impl CenterOptions {
    pub fn from_config(config: &OpsdeckConfig) -> Self {
        Self {
            handoff_delay: config.handoff_delay(),
            initial_map: config.initial_map(),
            ..Self::default()
        }
    }
}

/// Posted by the handoff timer task when its delay has elapsed.
#[derive(Debug)]
struct HandoffDue;

pub struct CommandCenter {
    state: CommandCenterState,
    map: MapControls,
    bus: EventBus,
    inbox: Subscription,
    preferences: Box<dyn PreferenceStore>,
    layout: LayoutMode,
    pending_estimate: Option<Value>,
    handoff_scheduled: bool,
    handoff_delay: Duration,
    timer_tx: mpsc::UnboundedSender<HandoffDue>,
    timer_rx: mpsc::UnboundedReceiver<HandoffDue>,
}

impl std::fmt::Debug for CommandCenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandCenter")
            .field("state", &self.state)
            .field("map", &self.map)
            .field("layout", &self.layout)
            .field("pending_estimate", &self.pending_estimate)
            .field("handoff_scheduled", &self.handoff_scheduled)
            .finish_non_exhaustive()
    }
}

impl CommandCenter {
    /// Mount a command center on `bus`. The theme preference is read once
    /// here and again whenever the bridge reports the settings key changed.
    pub fn new(bus: EventBus, preferences: Box<dyn PreferenceStore>, options: CenterOptions) -> Self {
        let inbox = bus.subscribe_to(&[Topic::MapState, Topic::DetectionEstimate, Topic::Storage]);
        let (timer_tx, timer_rx) = mpsc::unbounded_channel();
        let map_theme = preferences::load_map_theme(preferences.as_ref());
        let state = CommandCenterState {
            map_theme,
            ..CommandCenterState::new()
        };
        info!(theme = ?map_theme, "command center mounted");

        Self {
            state,
            map: MapControls::new(options.initial_map),
            bus,
            inbox,
            preferences,
            layout: options.layout,
            pending_estimate: None,
            handoff_scheduled: false,
            handoff_delay: options.handoff_delay,
            timer_tx,
            timer_rx,
        }
    }

    pub fn state(&self) -> &CommandCenterState {
        &self.state
    }

    pub fn map_state(&self) -> &MapUiState {
        self.map.state()
    }

    /// The map adapter; the only path to the map surface.
    pub fn map(&mut self) -> &mut MapControls {
        &mut self.map
    }

    pub fn attach_map(&mut self, surface: Box<dyn MapSurface>) {
        self.map.attach(surface);
    }

    pub fn detach_map(&mut self) -> Option<Box<dyn MapSurface>> {
        self.map.detach()
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn map_theme(&self) -> MapTheme {
        self.state.map_theme
    }

    pub fn pending_estimate(&self) -> Option<&Value> {
        self.pending_estimate.as_ref()
    }

    pub fn handoff_scheduled(&self) -> bool {
        self.handoff_scheduled
    }

    // --- state transitions ---

    pub fn apply(&mut self, intent: Intent) -> Transition {
        let transition = reduce(&mut self.state, &intent);
        self.maybe_schedule_handoff();
        transition
    }

    pub fn open_modal(&mut self, key: ModalKey) -> bool {
        self.apply(Intent::OpenModal(key)).changed
    }

    pub fn close_modal(&mut self, key: ModalKey) -> bool {
        self.apply(Intent::CloseModal(key)).changed
    }

    pub fn toggle_modal(&mut self, key: ModalKey, value: Option<bool>) -> bool {
        self.apply(Intent::ToggleModal { key, value }).changed
    }

    pub fn set_active_module(&mut self, module: Option<CommandModule>) -> Transition {
        self.apply(Intent::SetActiveModule(module))
    }

    pub fn clear_active_module(&mut self) -> Transition {
        self.set_active_module(None)
    }

    pub fn set_mobile_panel(&mut self, panel: Option<MobilePanel>) -> bool {
        self.apply(Intent::SetMobilePanel(panel)).changed
    }

    // --- layout and panels ---

    pub fn layout(&self) -> LayoutMode {
        self.layout
    }

    pub fn set_layout(&mut self, layout: LayoutMode) {
        if self.layout != layout {
            debug!(?layout, "layout changed");
            self.layout = layout;
        }
    }

    /// Bottom sheet to draw. Sheets only exist in the compact layout; the
    /// selection survives a switch to wide and back.
    pub fn visible_sheet(&self) -> Option<MobilePanel> {
        match self.layout {
            LayoutMode::Compact => self.state.mobile_panel,
            LayoutMode::Wide => None,
        }
    }

    pub fn mount_plan(&self) -> Vec<Panel> {
        render::mount_plan(&self.state)
    }

    pub fn close_panel(&mut self, panel: Panel) -> Transition {
        let transition = render::close_panel(&mut self.state, panel);
        self.maybe_schedule_handoff();
        transition
    }

    pub fn select_palette_entry(&mut self, entry: &PaletteEntry) -> Transition {
        let transition = self.set_active_module(Some(entry.module));
        self.close_modal(ModalKey::CommandPalette);
        transition
    }

    pub fn press_dock(&mut self, item: DockItem) -> Transition {
        let intent = item.press(&self.state);
        self.apply(intent)
    }

    pub fn run_intel_action(&mut self, action: IntelAction) {
        for intent in action.intents() {
            self.apply(intent);
        }
    }

    pub fn flip_layer(&mut self, layer: LayerToggle) {
        layer.flip(&mut self.map);
    }

    // --- keyboard ---

    /// Route a key press and apply it. Returns what was dispatched so the
    /// host can honor `prevent_default`.
    pub fn handle_key(&mut self, input: &KeyInput) -> Option<Dispatch> {
        let dispatch = keyboard::route(input)?;
        self.run_command(dispatch.command);
        Some(dispatch)
    }

    fn run_command(&mut self, command: KeyCommand) {
        match command {
            KeyCommand::OpenCommandPalette => {
                self.toggle_modal(ModalKey::CommandPalette, Some(true));
            }
            KeyCommand::ActivateModule(module) => {
                self.set_active_module(Some(module));
            }
            KeyCommand::FocusSearch => {
                self.state.search_focus_seq += 1;
            }
            KeyCommand::SaveMap => self.map.save(),
            KeyCommand::OpenModal(key) => {
                self.open_modal(key);
            }
            KeyCommand::Dismiss => self.dismiss(),
            KeyCommand::ToggleModal(key) => {
                self.toggle_modal(key, None);
            }
            KeyCommand::ChangeMode(mode) => self.map.change_mode(Some(mode)),
            KeyCommand::ToggleTraffic => self.map.toggle_traffic(),
            KeyCommand::ToggleWeatherRadar => self.map.toggle_weather_radar(),
            KeyCommand::ToggleEmployee => self.map.toggle_employee(),
            KeyCommand::ManualPulse => {
                self.bus.publish(BridgeEvent::ManualPulse);
            }
        }
    }

    /// One dismissal step: the active module first, then the first open
    /// modal in enumeration order.
    fn dismiss(&mut self) {
        if self.state.active_module.is_some() {
            self.clear_active_module();
        } else if let Some(key) = self.state.modals.first_open() {
            self.close_modal(key);
        }
    }

    // --- bridge ---

    /// Process every queued bridge event and elapsed timer, in arrival
    /// order. Returns how many items were handled.
    pub fn drain(&mut self) -> usize {
        let mut handled = 0;
        loop {
            let mut progressed = false;
            while let Some(envelope) = self.inbox.try_next() {
                self.handle_event(envelope.event);
                handled += 1;
                progressed = true;
            }
            while self.timer_rx.try_recv().is_ok() {
                self.deliver_handoff();
                handled += 1;
                progressed = true;
            }
            if !progressed {
                return handled;
            }
        }
    }

    fn handle_event(&mut self, event: BridgeEvent) {
        match event {
            BridgeEvent::MapStateChanged(patch) => self.map.apply_patch(&patch),
            BridgeEvent::DetectionEstimate {
                redelivery: true, ..
            } => {}
            BridgeEvent::DetectionEstimate { analysis, .. } => self.receive_detection(analysis),
            BridgeEvent::StorageChanged { key } => {
                if key == SETTINGS_KEY {
                    self.reload_preferences();
                }
            }
            BridgeEvent::ManualPulse => {}
        }
    }

    fn receive_detection(&mut self, analysis: Value) {
        if is_empty_analysis(&analysis) {
            debug!("detection event without analysis ignored");
            return;
        }
        if self.pending_estimate.is_some() {
            debug!("pending estimate payload replaced");
        }
        self.pending_estimate = Some(analysis);
        self.set_active_module(Some(CommandModule::Estimate));
    }

    pub fn reload_preferences(&mut self) {
        let theme = preferences::load_map_theme(self.preferences.as_ref());
        if theme != self.state.map_theme {
            info!(?theme, "map theme changed");
            self.state.map_theme = theme;
        }
    }

    fn maybe_schedule_handoff(&mut self) {
        if self.handoff_scheduled
            || self.pending_estimate.is_none()
            || self.state.active_module != Some(CommandModule::Estimate)
        {
            return;
        }
        self.handoff_scheduled = true;

        let tx = self.timer_tx.clone();
        match Handle::try_current() {
            Ok(handle) => {
                let deadline = Instant::now() + self.handoff_delay;
                debug!(delay_ms = self.handoff_delay.as_millis() as u64, "estimate handoff scheduled");
                handle.spawn(async move {
                    tokio::time::sleep_until(deadline).await;
                    // Receiver is gone after unmount.
                    let _ = tx.send(HandoffDue);
                });
            }
            Err(_) => {
                debug!("no runtime, estimate handoff is due immediately");
                let _ = tx.send(HandoffDue);
            }
        }
    }

    fn deliver_handoff(&mut self) {
        self.handoff_scheduled = false;
        let Some(analysis) = self.pending_estimate.take() else {
            return;
        };
        debug!("estimate handoff delivered");
        self.bus.publish(BridgeEvent::DetectionEstimate {
            analysis,
            redelivery: true,
        });
    }
}

/// `null`, `false`, zero and the empty string carry no analysis.
fn is_empty_analysis(analysis: &Value) -> bool {
    match analysis {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().is_none_or(|f| f == 0.0 || f.is_nan()),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyboard::{FocusTarget, Key, Modifiers};
    use crate::model::DrawingMode;
    use crate::palette;
    use crate::preferences::MemoryStore;
    use crate::state::MapStatePatch;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn center(bus: &EventBus) -> CommandCenter {
        CommandCenter::new(bus.clone(), Box::new(MemoryStore::new()), CenterOptions::default())
    }

    fn detections(sub: &mut Subscription) -> Vec<(Value, bool)> {
        sub.drain()
            .into_iter()
            .filter_map(|env| match env.event {
                BridgeEvent::DetectionEstimate {
                    analysis,
                    redelivery,
                } => Some((analysis, redelivery)),
                _ => None,
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_detection_is_handed_to_estimate_after_delay() {
        let bus = EventBus::new(16);
        let mut listener = bus.subscribe_to(&[Topic::DetectionEstimate]);
        let mut center = center(&bus);
        center.set_active_module(Some(CommandModule::Dashboard));

        bus.publish(BridgeEvent::detection(json!({ "score": 42 })));
        center.drain();

        assert_eq!(center.state().active_module, Some(CommandModule::Estimate));
        assert!(center.handoff_scheduled());
        assert_eq!(detections(&mut listener), vec![(json!({ "score": 42 }), false)]);

        tokio::time::sleep(Duration::from_millis(40)).await;
        center.drain();
        assert!(detections(&mut listener).is_empty());

        tokio::time::sleep(Duration::from_millis(20)).await;
        center.drain();
        assert_eq!(detections(&mut listener), vec![(json!({ "score": 42 }), true)]);
        assert!(center.pending_estimate().is_none());
        assert!(!center.handoff_scheduled());

        center.set_active_module(Some(CommandModule::Jobs));
        center.set_active_module(Some(CommandModule::Estimate));
        tokio::time::sleep(Duration::from_millis(100)).await;
        center.drain();
        assert!(detections(&mut listener).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_newer_payload_wins() {
        let bus = EventBus::new(16);
        let mut listener = bus.subscribe_to(&[Topic::DetectionEstimate]);
        let mut center = center(&bus);

        bus.publish(BridgeEvent::detection(json!({ "score": 1 })));
        bus.publish(BridgeEvent::detection(json!({ "score": 2 })));
        center.drain();
        listener.drain();

        tokio::time::sleep(Duration::from_millis(60)).await;
        center.drain();
        assert_eq!(detections(&mut listener), vec![(json!({ "score": 2 }), true)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_navigation_does_not_cancel_redelivery() {
        let bus = EventBus::new(16);
        let mut listener = bus.subscribe_to(&[Topic::DetectionEstimate]);
        let mut center = center(&bus);

        bus.publish(BridgeEvent::detection(json!({ "area": 120 })));
        center.drain();
        listener.drain();
        center.set_active_module(Some(CommandModule::Fleet));

        tokio::time::sleep(Duration::from_millis(60)).await;
        center.drain();
        assert_eq!(detections(&mut listener), vec![(json!({ "area": 120 }), true)]);
        assert_eq!(center.state().active_module, Some(CommandModule::Fleet));
        assert!(center.pending_estimate().is_none());
    }

    #[test]
    fn test_handoff_without_runtime_is_immediate() {
        let bus = EventBus::new(16);
        let mut listener = bus.subscribe_to(&[Topic::DetectionEstimate]);
        let mut center = center(&bus);

        bus.publish(BridgeEvent::detection(json!("scan-7")));
        center.drain();

        assert_eq!(
            detections(&mut listener),
            vec![(json!("scan-7"), false), (json!("scan-7"), true)]
        );
        assert_eq!(center.state().active_module, Some(CommandModule::Estimate));
    }

    #[test]
    fn test_redelivery_and_empty_analysis_are_ignored() {
        let bus = EventBus::new(16);
        let mut center = center(&bus);

        bus.publish(BridgeEvent::DetectionEstimate {
            analysis: json!({ "score": 1 }),
            redelivery: true,
        });
        bus.publish(BridgeEvent::detection(Value::Null));
        bus.publish(BridgeEvent::detection(json!(false)));
        bus.publish(BridgeEvent::detection(json!(0)));
        bus.publish(BridgeEvent::detection(json!("")));
        center.drain();

        assert_eq!(center.state().active_module, None);
        assert!(center.pending_estimate().is_none());
    }

    #[test]
    fn test_map_patches_merge_in_order() {
        let bus = EventBus::new(16);
        let mut center = center(&bus);
        center.map().toggle_traffic();

        bus.publish(BridgeEvent::MapStateChanged(MapStatePatch::zoom(17.0)));
        bus.publish(BridgeEvent::MapStateChanged(MapStatePatch::from_json(
            &json!({ "zoom": 12, "activeMode": "circle" }),
        )));
        center.drain();

        let map = center.map_state();
        assert_eq!(map.zoom, 12.0);
        assert_eq!(map.active_mode, Some(DrawingMode::Circle));
        assert!(map.show_traffic);
    }

    #[test]
    fn test_storage_change_reloads_theme() {
        #[derive(Clone, Default)]
        struct SharedStore(Arc<Mutex<MemoryStore>>);

        impl PreferenceStore for SharedStore {
            fn read(&self, key: &str) -> Option<String> {
                self.0.lock().unwrap().read(key)
            }
        }

        let store = SharedStore::default();
        let bus = EventBus::new(16);
        let mut center =
            CommandCenter::new(bus.clone(), Box::new(store.clone()), CenterOptions::default());
        assert_eq!(center.map_theme(), MapTheme::Division);

        store
            .0
            .lock()
            .unwrap()
            .set(SETTINGS_KEY, r#"{"mapTheme":"animus"}"#);
        bus.publish(BridgeEvent::StorageChanged {
            key: "unrelated".into(),
        });
        center.drain();
        assert_eq!(center.map_theme(), MapTheme::Division);

        bus.publish(BridgeEvent::StorageChanged {
            key: SETTINGS_KEY.into(),
        });
        center.drain();
        assert_eq!(center.map_theme(), MapTheme::Animus);
    }

    #[test]
    fn test_letter_in_text_input_does_nothing() {
        let bus = EventBus::new(16);
        let mut center = center(&bus);
        let before = center.state().clone();

        let input = KeyInput::bare('a').focused(FocusTarget::TextInput);
        assert!(center.handle_key(&input).is_none());
        assert_eq!(center.state(), &before);
        assert!(!center.state().modals.is_open(ModalKey::AiAssistant));
    }

    #[test]
    fn test_escape_closes_exactly_one_modal() {
        let bus = EventBus::new(16);
        let mut center = center(&bus);
        center.open_modal(ModalKey::Settings);
        center.open_modal(ModalKey::AiAssistant);
        center.open_modal(ModalKey::Export);

        center.handle_key(&KeyInput::escape());

        let open: Vec<_> = center.state().modals.open_keys().collect();
        assert_eq!(open, vec![ModalKey::Settings, ModalKey::Export]);
    }

    #[test]
    fn test_escape_clears_module_before_modals() {
        let bus = EventBus::new(16);
        let mut center = center(&bus);
        center.open_modal(ModalKey::Chat);
        center.set_active_module(Some(CommandModule::Jobs));

        center.handle_key(&KeyInput::escape());
        assert_eq!(center.state().active_module, None);
        assert!(center.state().modals.is_open(ModalKey::Chat));

        center.handle_key(&KeyInput::escape());
        assert!(!center.state().modals.any_open());
    }

    #[test]
    fn test_key_shortcuts_reach_their_targets() {
        let bus = EventBus::new(16);
        let mut pulses = bus.subscribe_to(&[Topic::ManualPulse]);
        let mut center = center(&bus);

        center.handle_key(&KeyInput::ctrl('k').focused(FocusTarget::TextArea));
        assert!(center.state().modals.is_open(ModalKey::CommandPalette));

        center.handle_key(&KeyInput::ctrl('n'));
        assert_eq!(center.state().active_module, Some(CommandModule::Jobs));

        center.handle_key(&KeyInput::ctrl('/'));
        assert_eq!(center.state().search_focus_seq, 1);

        center.handle_key(&KeyInput::bare('3'));
        assert_eq!(center.map_state().active_mode, Some(DrawingMode::Circle));

        center.handle_key(&KeyInput::bare('w'));
        assert!(center.map_state().show_weather_radar);

        center.handle_key(&KeyInput::bare('p'));
        assert_eq!(pulses.drain().len(), 1);

        center.handle_key(&KeyInput::ctrl('.'));
        assert!(center.state().modals.is_open(ModalKey::Settings));

        let none = KeyInput::new(Key::Other, Modifiers::NONE);
        assert!(center.handle_key(&none).is_none());
    }

    #[test]
    fn test_palette_selection_closes_palette_and_redirects() {
        let bus = EventBus::new(16);
        let mut center = center(&bus);
        center.open_modal(ModalKey::CommandPalette);

        let settings = palette::filter("prefer")[0];
        center.select_palette_entry(settings);

        assert!(!center.state().modals.is_open(ModalKey::CommandPalette));
        assert!(center.state().modals.is_open(ModalKey::Settings));
        assert_eq!(center.state().active_module, None);
        assert_eq!(center.mount_plan(), vec![Panel::Settings]);
    }

    #[test]
    fn test_sheets_only_show_in_compact_layout() {
        let bus = EventBus::new(16);
        let mut center = center(&bus);
        center.press_dock(DockItem::Intel);
        assert_eq!(center.visible_sheet(), None);

        center.set_layout(LayoutMode::Compact);
        assert_eq!(center.visible_sheet(), Some(MobilePanel::Intel));

        center.run_intel_action(IntelAction::Analytics);
        assert_eq!(center.visible_sheet(), None);
        assert!(center.state().modals.is_open(ModalKey::Analytics));
    }

    #[test]
    fn test_close_panel_through_center() {
        let bus = EventBus::new(16);
        let mut center = center(&bus);
        center.set_active_module(Some(CommandModule::Receipts));
        assert_eq!(center.mount_plan(), vec![Panel::Receipts]);

        center.close_panel(Panel::Receipts);
        assert!(center.mount_plan().is_empty());
    }
}
