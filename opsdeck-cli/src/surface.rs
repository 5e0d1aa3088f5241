//! Simulated map surface for the terminal host.
//!
//! Stands in for a real map engine: it keeps its own viewport and layer
//! flags and, like a real map, announces every change on the bridge.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::SystemTime;

use tracing::debug;

use opsdeck_core::bus::{BridgeEvent, EventBus};
use opsdeck_core::map::MapSurface;
use opsdeck_core::model::{DrawingMode, Imagery};
use opsdeck_core::state::{MapStatePatch, MapUiState};

const MIN_ZOOM: f64 = 1.0;
const MAX_ZOOM: f64 = 22.0;

/// Everything the simulated engine tracks.
#[derive(Clone, Debug)]
pub struct SurfaceSnapshot {
    pub lat: f64,
    pub lng: f64,
    pub zoom: f64,
    pub traffic: bool,
    pub crew_tracking: bool,
    pub weather_radar: bool,
    pub parcels: bool,
    pub street_view: bool,
    pub mode: Option<DrawingMode>,
    pub imagery: Imagery,
    pub shapes: Vec<(DrawingMode, f64, f64)>,
    pub last_saved: Option<SystemTime>,
}

impl SurfaceSnapshot {
    fn from_state(state: &MapUiState) -> Self {
        Self {
            lat: state.lat,
            lng: state.lng,
            zoom: state.zoom,
            traffic: state.show_traffic,
            crew_tracking: state.show_employee_tracking,
            weather_radar: state.show_weather_radar,
            parcels: state.show_parcels,
            street_view: false,
            mode: state.active_mode,
            imagery: state.imagery,
            shapes: Vec::new(),
            last_saved: None,
        }
    }
}

/// Cloneable handle; every clone drives the same simulated map.
#[derive(Clone, Debug)]
pub struct SimulatedMap {
    inner: Arc<Mutex<SurfaceSnapshot>>,
    home: (f64, f64),
    bus: EventBus,
}

impl SimulatedMap {
    pub fn new(bus: EventBus, initial: &MapUiState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SurfaceSnapshot::from_state(initial))),
            home: (initial.lat, initial.lng),
            bus,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SurfaceSnapshot> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> SurfaceSnapshot {
        self.lock().clone()
    }

    /// Apply a change and broadcast the resulting patch.
    fn update(&self, f: impl FnOnce(&mut SurfaceSnapshot) -> MapStatePatch) -> bool {
        let patch = {
            let mut snap = self.lock();
            f(&mut snap)
        };
        if !patch.is_empty() {
            self.bus.publish(BridgeEvent::MapStateChanged(patch));
        }
        true
    }

    /// Move the viewport by an eighth of the visible span per step.
    pub fn pan(&self, rows: f64, cols: f64) {
        self.update(|s| {
            let span = lng_span(s.zoom);
            s.lat = (s.lat + rows * span / 16.0).clamp(-85.0, 85.0);
            s.lng = wrap_lng(s.lng + cols * span / 8.0);
            MapStatePatch::center(s.lat, s.lng)
        });
    }

    pub fn zoom_by(&self, delta: f64) {
        self.update(|s| {
            s.zoom = (s.zoom + delta).clamp(MIN_ZOOM, MAX_ZOOM);
            MapStatePatch::zoom(s.zoom)
        });
    }

    pub fn go_to(&self, lat: f64, lng: f64) {
        self.update(|s| {
            s.lat = lat.clamp(-85.0, 85.0);
            s.lng = wrap_lng(lng);
            MapStatePatch::center(s.lat, s.lng)
        });
    }

    /// Drop a shape for the active tool at the viewport center.
    pub fn place_shape(&self) -> bool {
        let mut placed = false;
        self.update(|s| {
            if let Some(mode) = s.mode {
                s.shapes.push((mode, s.lat, s.lng));
                placed = true;
            }
            MapStatePatch::default()
        });
        placed
    }
}

/// Degrees of longitude visible across the map pane at `zoom`.
pub fn lng_span(zoom: f64) -> f64 {
    360.0 / 2f64.powf(zoom / 2.0)
}

fn wrap_lng(lng: f64) -> f64 {
    (lng + 180.0).rem_euclid(360.0) - 180.0
}

impl MapSurface for SimulatedMap {
    fn name(&self) -> &'static str {
        "simulated"
    }

    fn handle_mode_change(&mut self, mode: Option<DrawingMode>) -> bool {
        self.update(|s| {
            s.mode = mode;
            MapStatePatch {
                active_mode: Some(mode),
                ..MapStatePatch::default()
            }
        })
    }

    fn handle_clear(&mut self) -> bool {
        self.update(|s| {
            s.shapes.clear();
            s.mode = None;
            MapStatePatch {
                active_mode: Some(None),
                ..MapStatePatch::default()
            }
        })
    }

    fn handle_toggle_traffic(&mut self) -> bool {
        self.update(|s| {
            s.traffic = !s.traffic;
            MapStatePatch {
                show_traffic: Some(s.traffic),
                ..MapStatePatch::default()
            }
        })
    }

    fn toggle_employee_tracking(&mut self) -> bool {
        self.update(|s| {
            s.crew_tracking = !s.crew_tracking;
            MapStatePatch {
                show_employee_tracking: Some(s.crew_tracking),
                ..MapStatePatch::default()
            }
        })
    }

    fn toggle_parcels(&mut self) -> bool {
        self.update(|s| {
            s.parcels = !s.parcels;
            MapStatePatch {
                show_parcels: Some(s.parcels),
                ..MapStatePatch::default()
            }
        })
    }

    fn handle_toggle_street_view(&mut self) -> bool {
        self.update(|s| {
            s.street_view = !s.street_view;
            MapStatePatch::default()
        })
    }

    fn toggle_weather_radar(&mut self) -> bool {
        self.update(|s| {
            s.weather_radar = !s.weather_radar;
            MapStatePatch {
                show_weather_radar: Some(s.weather_radar),
                ..MapStatePatch::default()
            }
        })
    }

    fn handle_locate_me(&mut self) -> bool {
        let (lat, lng) = self.home;
        self.go_to(lat, lng);
        true
    }

    fn handle_save(&mut self) -> bool {
        self.update(|s| {
            s.last_saved = Some(SystemTime::now());
            debug!(shapes = s.shapes.len(), "map saved");
            MapStatePatch::default()
        })
    }

    fn set_imagery(&mut self, imagery: Imagery) -> bool {
        self.update(|s| {
            s.imagery = imagery;
            MapStatePatch {
                imagery: Some(imagery),
                ..MapStatePatch::default()
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opsdeck_core::bus::Topic;

    fn patches(sub: &mut opsdeck_core::bus::Subscription) -> Vec<MapStatePatch> {
        sub.drain()
            .into_iter()
            .filter_map(|env| match env.event {
                BridgeEvent::MapStateChanged(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_toggles_broadcast_absolute_values() {
        let bus = EventBus::new(16);
        let mut sub = bus.subscribe_to(&[Topic::MapState]);
        let mut map = SimulatedMap::new(bus.clone(), &MapUiState::default());

        map.handle_toggle_traffic();
        map.handle_toggle_traffic();

        let got: Vec<_> = patches(&mut sub).iter().map(|p| p.show_traffic).collect();
        assert_eq!(got, vec![Some(true), Some(false)]);
    }

    #[test]
    fn test_zoom_is_clamped() {
        let bus = EventBus::new(16);
        let map = SimulatedMap::new(bus, &MapUiState::default());
        map.zoom_by(100.0);
        assert_eq!(map.snapshot().zoom, MAX_ZOOM);
        map.zoom_by(-100.0);
        assert_eq!(map.snapshot().zoom, MIN_ZOOM);
    }

    #[test]
    fn test_locate_returns_home() {
        let bus = EventBus::new(16);
        let mut map = SimulatedMap::new(bus, &MapUiState::centered(10.0, 20.0, 12.0));
        map.pan(1.0, 1.0);
        assert_ne!(map.snapshot().lat, 10.0);
        map.handle_locate_me();
        let snap = map.snapshot();
        assert_eq!((snap.lat, snap.lng), (10.0, 20.0));
    }

    #[test]
    fn test_shapes_need_a_tool() {
        let bus = EventBus::new(16);
        let mut map = SimulatedMap::new(bus, &MapUiState::default());
        assert!(!map.place_shape());
        map.handle_mode_change(Some(DrawingMode::Marker));
        assert!(map.place_shape());
        map.handle_clear();
        assert!(map.snapshot().shapes.is_empty());
    }

    #[test]
    fn test_longitude_wraps() {
        assert_eq!(wrap_lng(190.0), -170.0);
        assert_eq!(wrap_lng(-190.0), 170.0);
    }
}
