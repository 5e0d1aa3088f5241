pub mod config;
pub mod model;
pub mod reducer;
pub mod state;

// Orchestrator and its collaborators
pub mod controller;
pub mod map;
pub mod redirect;

// Input and overlays
pub mod keyboard;
pub mod mobile;
pub mod palette;
pub mod render;

// Cross-component event bridge
pub mod bus;

// Persisted user preferences
pub mod preferences;

pub use bus::{BridgeEvent, EventBus, Subscription, Topic};
pub use controller::{CenterOptions, CommandCenter};
pub use map::{MapControls, MapSurface};
