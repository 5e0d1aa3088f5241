//! Map control adapter
//!
//! The map surface is owned by whatever renders it. The orchestrator only sees
//! it through [`MapSurface`], a capability trait where every entry point is
//! optional, and only [`MapControls`] is allowed to call it.

use tracing::trace;

use crate::model::{DrawingMode, Imagery};
use crate::state::{MapStatePatch, MapUiState};

/// Imperative handle of an externally owned map surface.
///
/// Every method has a default body returning `false`, meaning "not provided
/// by this surface". Implementations override what they support and return
/// `true`.
pub trait MapSurface: Send {
    /// Human-readable name of the surface implementation
    fn name(&self) -> &'static str;

    fn handle_mode_change(&mut self, mode: Option<DrawingMode>) -> bool {
        let _ = mode;
        false
    }

    fn handle_clear(&mut self) -> bool {
        false
    }

    fn handle_toggle_traffic(&mut self) -> bool {
        false
    }

    fn toggle_employee_tracking(&mut self) -> bool {
        false
    }

    fn toggle_parcels(&mut self) -> bool {
        false
    }

    fn handle_toggle_street_view(&mut self) -> bool {
        false
    }

    fn toggle_weather_radar(&mut self) -> bool {
        false
    }

    fn handle_locate_me(&mut self) -> bool {
        false
    }

    fn handle_save(&mut self) -> bool {
        false
    }

    fn set_imagery(&mut self, imagery: Imagery) -> bool {
        let _ = imagery;
        false
    }
}

/// Translates orchestrator intents into map surface calls and keeps the
/// local mirror in step with user intent.
///
/// The mirror is written even when the surface is missing, so toggles keep
/// their highlight while the map is still mounting.
pub struct MapControls {
    surface: Option<Box<dyn MapSurface>>,
    state: MapUiState,
}

impl std::fmt::Debug for MapControls {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapControls")
            .field("surface", &self.surface.as_ref().map(|s| s.name()))
            .field("state", &self.state)
            .finish()
    }
}

impl Default for MapControls {
    fn default() -> Self {
        Self::new(MapUiState::default())
    }
}

impl MapControls {
    pub fn new(initial: MapUiState) -> Self {
        Self {
            surface: None,
            state: initial,
        }
    }

    pub fn state(&self) -> &MapUiState {
        &self.state
    }

    /// Attach the mounted map surface, replacing any previous one.
    pub fn attach(&mut self, surface: Box<dyn MapSurface>) {
        trace!(surface = surface.name(), "map surface attached");
        self.surface = Some(surface);
    }

    pub fn detach(&mut self) -> Option<Box<dyn MapSurface>> {
        self.surface.take()
    }

    fn call(&mut self, op: &'static str, f: impl FnOnce(&mut dyn MapSurface) -> bool) {
        let handled = match self.surface.as_deref_mut() {
            Some(surface) => f(surface),
            None => false,
        };
        if !handled {
            trace!(op, "map surface call skipped");
        }
    }

    pub fn change_mode(&mut self, mode: Option<DrawingMode>) {
        self.call("mode_change", |s| s.handle_mode_change(mode));
        self.state.active_mode = mode;
    }

    pub fn clear(&mut self) {
        self.call("clear", |s| s.handle_clear());
        self.state.active_mode = None;
    }

    pub fn toggle_traffic(&mut self) {
        self.call("toggle_traffic", |s| s.handle_toggle_traffic());
        self.state.show_traffic = !self.state.show_traffic;
    }

    pub fn toggle_employee(&mut self) {
        self.call("toggle_employee_tracking", |s| s.toggle_employee_tracking());
        self.state.show_employee_tracking = !self.state.show_employee_tracking;
    }

    pub fn toggle_parcels(&mut self) {
        self.call("toggle_parcels", |s| s.toggle_parcels());
        self.state.show_parcels = !self.state.show_parcels;
    }

    pub fn toggle_weather_radar(&mut self) {
        self.call("toggle_weather_radar", |s| s.toggle_weather_radar());
        self.state.show_weather_radar = !self.state.show_weather_radar;
    }

    /// No mirror: street view is transient and never shown as a badge.
    pub fn toggle_street_view(&mut self) {
        self.call("toggle_street_view", |s| s.handle_toggle_street_view());
    }

    pub fn locate_me(&mut self) {
        self.call("locate_me", |s| s.handle_locate_me());
    }

    pub fn save(&mut self) {
        self.call("save", |s| s.handle_save());
    }

    pub fn set_imagery(&mut self, imagery: Imagery) {
        self.call("set_imagery", |s| s.set_imagery(imagery));
        self.state.imagery = imagery;
    }

    /// Merge a state notification coming from the surface itself.
    pub fn apply_patch(&mut self, patch: &MapStatePatch) {
        self.state.apply(patch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Calls {
        traffic: usize,
        modes: Vec<Option<DrawingMode>>,
        street_view: usize,
        saves: usize,
    }

    struct RecordingSurface(Arc<Mutex<Calls>>);

    impl MapSurface for RecordingSurface {
        fn name(&self) -> &'static str {
            "recording"
        }

        fn handle_mode_change(&mut self, mode: Option<DrawingMode>) -> bool {
            self.0.lock().unwrap().modes.push(mode);
            true
        }

        fn handle_toggle_traffic(&mut self) -> bool {
            self.0.lock().unwrap().traffic += 1;
            true
        }

        fn handle_toggle_street_view(&mut self) -> bool {
            self.0.lock().unwrap().street_view += 1;
            true
        }

        fn handle_save(&mut self) -> bool {
            self.0.lock().unwrap().saves += 1;
            true
        }
    }

    fn recording() -> (MapControls, Arc<Mutex<Calls>>) {
        let calls = Arc::new(Mutex::new(Calls::default()));
        let mut controls = MapControls::default();
        controls.attach(Box::new(RecordingSurface(calls.clone())));
        (controls, calls)
    }

    #[test]
    fn test_traffic_round_trip_calls_surface_twice() {
        let (mut controls, calls) = recording();
        let before = controls.state().show_traffic;

        controls.toggle_traffic();
        assert_eq!(controls.state().show_traffic, !before);
        controls.toggle_traffic();

        assert_eq!(controls.state().show_traffic, before);
        assert_eq!(calls.lock().unwrap().traffic, 2);
    }

    #[test]
    fn test_mirror_updates_without_surface() {
        let mut controls = MapControls::default();
        controls.toggle_parcels();
        controls.toggle_weather_radar();
        controls.change_mode(Some(DrawingMode::Polyline));
        controls.set_imagery(Imagery::Usgs);

        let state = controls.state();
        assert!(state.show_parcels);
        assert!(state.show_weather_radar);
        assert_eq!(state.active_mode, Some(DrawingMode::Polyline));
        assert_eq!(state.imagery, Imagery::Usgs);
    }

    #[test]
    fn test_unimplemented_methods_are_skipped_but_mirrored() {
        let (mut controls, calls) = recording();
        controls.toggle_employee();
        assert!(controls.state().show_employee_tracking);
        assert_eq!(calls.lock().unwrap().traffic, 0);
    }

    #[test]
    fn test_clear_resets_mode() {
        let (mut controls, calls) = recording();
        controls.change_mode(Some(DrawingMode::Circle));
        controls.clear();
        assert_eq!(controls.state().active_mode, None);
        assert_eq!(calls.lock().unwrap().modes, vec![Some(DrawingMode::Circle)]);
    }

    #[test]
    fn test_street_view_and_save_leave_mirror_alone() {
        let (mut controls, calls) = recording();
        let before = controls.state().clone();
        controls.toggle_street_view();
        controls.save();
        controls.locate_me();
        assert_eq!(controls.state(), &before);
        assert_eq!(calls.lock().unwrap().street_view, 1);
        assert_eq!(calls.lock().unwrap().saves, 1);
    }

    #[test]
    fn test_inbound_patch_is_authoritative_for_viewport() {
        let mut controls = MapControls::default();
        controls.toggle_traffic();
        controls.apply_patch(&MapStatePatch::center(51.5, -0.12));
        controls.apply_patch(&MapStatePatch::zoom(9.0));
        controls.apply_patch(&MapStatePatch::zoom(11.0));

        let state = controls.state();
        assert_eq!((state.lat, state.lng, state.zoom), (51.5, -0.12, 11.0));
        assert!(state.show_traffic);
    }
}
