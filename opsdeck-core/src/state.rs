use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::model::{CommandModule, DrawingMode, Imagery, MapTheme, MobilePanel, ModalKey};

/// Visibility of every modal. Total by construction: one slot per key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ModalState([bool; ModalKey::COUNT]);

impl ModalState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self, key: ModalKey) -> bool {
        self.0[key.index()]
    }

    /// Returns `true` when the state changed.
    pub fn open(&mut self, key: ModalKey) -> bool {
        self.set(key, true)
    }

    /// Returns `true` when the state changed.
    pub fn close(&mut self, key: ModalKey) -> bool {
        self.set(key, false)
    }

    /// Flip `key`, or set it to `explicit` when given. Returns `true` when the
    /// resulting value differs from the previous one.
    pub fn toggle(&mut self, key: ModalKey, explicit: Option<bool>) -> bool {
        let next = explicit.unwrap_or(!self.is_open(key));
        self.set(key, next)
    }

    fn set(&mut self, key: ModalKey, value: bool) -> bool {
        let slot = &mut self.0[key.index()];
        if *slot == value {
            return false;
        }
        *slot = value;
        true
    }

    /// First open modal in enumeration order.
    pub fn first_open(&self) -> Option<ModalKey> {
        ModalKey::ALL.into_iter().find(|k| self.is_open(*k))
    }

    pub fn open_keys(&self) -> impl Iterator<Item = ModalKey> + '_ {
        ModalKey::ALL.into_iter().filter(|k| self.is_open(*k))
    }

    pub fn any_open(&self) -> bool {
        self.0.iter().any(|open| *open)
    }
}

/// Local mirror of the map surface. Used for UI reflection only; the map
/// surface itself stays the source of truth.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapUiState {
    pub show_traffic: bool,
    pub show_employee_tracking: bool,
    pub show_weather_radar: bool,
    pub show_parcels: bool,
    pub active_mode: Option<DrawingMode>,
    pub imagery: Imagery,
    pub lat: f64,
    pub lng: f64,
    pub zoom: f64,
}

pub const DEFAULT_ZOOM: f64 = 15.0;

impl Default for MapUiState {
    fn default() -> Self {
        Self {
            show_traffic: false,
            show_employee_tracking: false,
            show_weather_radar: false,
            show_parcels: false,
            active_mode: None,
            imagery: Imagery::None,
            lat: 0.0,
            lng: 0.0,
            zoom: DEFAULT_ZOOM,
        }
    }
}

impl MapUiState {
    pub fn centered(lat: f64, lng: f64, zoom: f64) -> Self {
        Self {
            lat,
            lng,
            zoom,
            ..Self::default()
        }
    }

    /// Shallow merge: only keys present in `patch` are written.
    pub fn apply(&mut self, patch: &MapStatePatch) {
        if let Some(v) = patch.show_traffic {
            self.show_traffic = v;
        }
        if let Some(v) = patch.show_employee_tracking {
            self.show_employee_tracking = v;
        }
        if let Some(v) = patch.show_weather_radar {
            self.show_weather_radar = v;
        }
        if let Some(v) = patch.show_parcels {
            self.show_parcels = v;
        }
        if let Some(v) = patch.active_mode {
            self.active_mode = v;
        }
        if let Some(v) = patch.imagery {
            self.imagery = v;
        }
        if let Some(v) = patch.lat {
            self.lat = v;
        }
        if let Some(v) = patch.lng {
            self.lng = v;
        }
        if let Some(v) = patch.zoom {
            self.zoom = v;
        }
    }
}

/// Partial update of [`MapUiState`].
///
/// `active_mode` is doubly optional: `None` leaves the mode alone while
/// `Some(None)` deselects the current tool.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapStatePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_traffic: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_employee_tracking: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_weather_radar: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_parcels: Option<bool>,
    #[serde(
        default,
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub active_mode: Option<Option<DrawingMode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imagery: Option<Imagery>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom: Option<f64>,
}

fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl MapStatePatch {
    pub fn zoom(zoom: f64) -> Self {
        Self {
            zoom: Some(zoom),
            ..Self::default()
        }
    }

    pub fn center(lat: f64, lng: f64) -> Self {
        Self {
            lat: Some(lat),
            lng: Some(lng),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Build a patch from an untyped payload. Unknown keys are dropped, and a
    /// recognized key with a value of the wrong type is dropped on its own
    /// without discarding the rest of the patch.
    pub fn from_json(value: &serde_json::Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };

        fn field<T: DeserializeOwned>(
            obj: &serde_json::Map<String, serde_json::Value>,
            key: &str,
        ) -> Option<T> {
            obj.get(key)
                .and_then(|v| serde_json::from_value(v.clone()).ok())
        }

        Self {
            show_traffic: field(obj, "showTraffic"),
            show_employee_tracking: field(obj, "showEmployeeTracking"),
            show_weather_radar: field(obj, "showWeatherRadar"),
            show_parcels: field(obj, "showParcels"),
            active_mode: field(obj, "activeMode"),
            imagery: field(obj, "imagery"),
            lat: field(obj, "lat"),
            lng: field(obj, "lng"),
            zoom: field(obj, "zoom"),
        }
    }
}

/// Everything the orchestrator owns for one mounted session.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CommandCenterState {
    pub modals: ModalState,
    pub active_module: Option<CommandModule>,
    pub mobile_panel: Option<MobilePanel>,
    pub map_theme: MapTheme,
    /// Bumped each time the host should move focus to the address search.
    pub search_focus_seq: u64,
}

impl CommandCenterState {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_open_is_idempotent() {
        for key in ModalKey::ALL {
            let mut once = ModalState::new();
            assert!(once.open(key));
            let mut twice = once;
            assert!(!twice.open(key));
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_toggle_twice_restores_only_that_key() {
        let mut start = ModalState::new();
        start.open(ModalKey::Chat);
        for key in ModalKey::ALL {
            let mut state = start;
            assert!(state.toggle(key, None));
            assert_ne!(state.is_open(key), start.is_open(key));
            assert!(state.toggle(key, None));
            assert_eq!(state, start);
        }
    }

    #[test]
    fn test_toggle_with_explicit_value_reports_no_change() {
        let mut state = ModalState::new();
        assert!(!state.toggle(ModalKey::Settings, Some(false)));
        assert!(state.toggle(ModalKey::Settings, Some(true)));
        assert!(!state.toggle(ModalKey::Settings, Some(true)));
        assert!(state.is_open(ModalKey::Settings));
    }

    #[test]
    fn test_first_open_follows_enumeration_order() {
        let mut state = ModalState::new();
        state.open(ModalKey::Export);
        state.open(ModalKey::Chat);
        assert_eq!(state.first_open(), Some(ModalKey::Chat));
        assert_eq!(
            state.open_keys().collect::<Vec<_>>(),
            vec![ModalKey::Chat, ModalKey::Export]
        );
    }

    #[test]
    fn test_zoom_only_patch_leaves_other_fields() {
        let mut map = MapUiState::centered(40.7, -74.0, 12.0);
        map.show_traffic = true;
        let before = map.clone();

        map.apply(&MapStatePatch::zoom(17.0));

        assert_eq!(map.zoom, 17.0);
        assert_eq!(map.lat, before.lat);
        assert_eq!(map.lng, before.lng);
        assert_eq!(map.show_traffic, before.show_traffic);
        assert_eq!(map.show_parcels, before.show_parcels);
        assert_eq!(map.active_mode, before.active_mode);
    }

    #[test]
    fn test_patch_from_json_drops_unknown_and_mistyped_fields() {
        let patch = MapStatePatch::from_json(&json!({
            "zoom": 17,
            "lat": "not a number",
            "showParcels": true,
            "heading": 90,
        }));
        assert_eq!(patch.zoom, Some(17.0));
        assert_eq!(patch.lat, None);
        assert_eq!(patch.show_parcels, Some(true));
        assert_eq!(patch.active_mode, None);
    }

    #[test]
    fn test_patch_distinguishes_null_mode_from_absent_mode() {
        let cleared = MapStatePatch::from_json(&json!({ "activeMode": null }));
        assert_eq!(cleared.active_mode, Some(None));

        let typed: MapStatePatch = serde_json::from_value(json!({ "activeMode": null })).unwrap();
        assert_eq!(typed.active_mode, Some(None));

        let absent: MapStatePatch = serde_json::from_value(json!({ "zoom": 3 })).unwrap();
        assert_eq!(absent.active_mode, None);

        let mut map = MapUiState::default();
        map.active_mode = Some(DrawingMode::Circle);
        map.apply(&cleared);
        assert_eq!(map.active_mode, None);
    }
}
