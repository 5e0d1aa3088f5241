//! Compact-layout dock and its bottom sheets.
//!
//! Dock buttons and sheet rows resolve to plain [`Intent`]s or map adapter
//! calls; the toggle policy for sheets lives here and not in the selector.

use crate::map::MapControls;
use crate::model::{CommandModule, MobilePanel, ModalKey};
use crate::reducer::Intent;
use crate::state::{CommandCenterState, MapUiState};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DockItem {
    Missions,
    Layers,
    Scan,
    Intel,
    Settings,
}

impl DockItem {
    pub const ALL: [DockItem; 5] = [
        DockItem::Missions,
        DockItem::Layers,
        DockItem::Scan,
        DockItem::Intel,
        DockItem::Settings,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Missions => "Missions",
            Self::Layers => "Layers",
            Self::Scan => "Scan",
            Self::Intel => "Intel",
            Self::Settings => "Settings",
        }
    }

    /// What pressing the button does in `state`.
    pub fn press(self, state: &CommandCenterState) -> Intent {
        match self {
            Self::Missions => Intent::SetActiveModule(Some(CommandModule::Dashboard)),
            Self::Layers => toggle_sheet(state, MobilePanel::Layers),
            Self::Scan => Intent::OpenModal(ModalKey::AiDetection),
            Self::Intel => toggle_sheet(state, MobilePanel::Intel),
            Self::Settings => Intent::OpenModal(ModalKey::Settings),
        }
    }

    /// Whether the button is drawn highlighted.
    pub fn is_active(self, state: &CommandCenterState) -> bool {
        match self {
            Self::Layers => state.mobile_panel == Some(MobilePanel::Layers),
            Self::Intel => state.mobile_panel == Some(MobilePanel::Intel),
            Self::Settings => state.modals.is_open(ModalKey::Settings),
            Self::Missions | Self::Scan => false,
        }
    }
}

/// Requesting the sheet that is already up closes it.
pub fn toggle_sheet(state: &CommandCenterState, panel: MobilePanel) -> Intent {
    let next = if state.mobile_panel == Some(panel) {
        None
    } else {
        Some(panel)
    };
    Intent::SetMobilePanel(next)
}

/// Shortcuts listed on the intel sheet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntelAction {
    AiAssistant,
    Analytics,
    Automation,
    BusinessHub,
}

impl IntelAction {
    pub const ALL: [IntelAction; 4] = [
        IntelAction::AiAssistant,
        IntelAction::Analytics,
        IntelAction::Automation,
        IntelAction::BusinessHub,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::AiAssistant => "AI Assistant",
            Self::Analytics => "Analytics",
            Self::Automation => "Automation",
            Self::BusinessHub => "Business Hub",
        }
    }

    pub fn modal(self) -> ModalKey {
        match self {
            Self::AiAssistant => ModalKey::AiAssistant,
            Self::Analytics => ModalKey::Analytics,
            Self::Automation => ModalKey::Automation,
            Self::BusinessHub => ModalKey::BusinessHub,
        }
    }

    /// Dismiss the sheet, then open the target modal.
    pub fn intents(self) -> [Intent; 2] {
        [
            Intent::SetMobilePanel(None),
            Intent::OpenModal(self.modal()),
        ]
    }
}

/// Switch rows on the layers sheet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayerToggle {
    Traffic,
    WeatherRadar,
    CrewTracking,
    Parcels,
}

impl LayerToggle {
    pub const ALL: [LayerToggle; 4] = [
        LayerToggle::Traffic,
        LayerToggle::WeatherRadar,
        LayerToggle::CrewTracking,
        LayerToggle::Parcels,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Traffic => "Traffic Overlay",
            Self::WeatherRadar => "Weather Radar",
            Self::CrewTracking => "Crew Tracking",
            Self::Parcels => "Parcel Boundaries",
        }
    }

    pub fn is_on(self, map: &MapUiState) -> bool {
        match self {
            Self::Traffic => map.show_traffic,
            Self::WeatherRadar => map.show_weather_radar,
            Self::CrewTracking => map.show_employee_tracking,
            Self::Parcels => map.show_parcels,
        }
    }

    pub fn flip(self, controls: &mut MapControls) {
        match self {
            Self::Traffic => controls.toggle_traffic(),
            Self::WeatherRadar => controls.toggle_weather_radar(),
            Self::CrewTracking => controls.toggle_employee(),
            Self::Parcels => controls.toggle_parcels(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reducer::reduce;

    #[test]
    fn test_sheet_button_toggles() {
        let mut state = CommandCenterState::new();
        let intent = DockItem::Layers.press(&state);
        reduce(&mut state, &intent);
        assert_eq!(state.mobile_panel, Some(MobilePanel::Layers));
        assert!(DockItem::Layers.is_active(&state));

        let intent = DockItem::Intel.press(&state);
        reduce(&mut state, &intent);
        assert_eq!(state.mobile_panel, Some(MobilePanel::Intel));

        let intent = DockItem::Intel.press(&state);
        reduce(&mut state, &intent);
        assert_eq!(state.mobile_panel, None);
    }

    #[test]
    fn test_missions_clears_sheet_through_module_change() {
        let mut state = CommandCenterState::new();
        state.mobile_panel = Some(MobilePanel::Layers);
        let intent = DockItem::Missions.press(&state);
        reduce(&mut state, &intent);
        assert_eq!(state.active_module, Some(CommandModule::Dashboard));
        assert_eq!(state.mobile_panel, None);
    }

    #[test]
    fn test_settings_button_highlights_from_modal() {
        let mut state = CommandCenterState::new();
        assert!(!DockItem::Settings.is_active(&state));
        let intent = DockItem::Settings.press(&state);
        reduce(&mut state, &intent);
        assert!(DockItem::Settings.is_active(&state));
    }

    #[test]
    fn test_intel_action_closes_sheet_then_opens_modal() {
        let mut state = CommandCenterState::new();
        state.mobile_panel = Some(MobilePanel::Intel);
        for intent in IntelAction::Automation.intents() {
            reduce(&mut state, &intent);
        }
        assert_eq!(state.mobile_panel, None);
        assert!(state.modals.is_open(ModalKey::Automation));
    }

    #[test]
    fn test_layer_rows_read_and_write_the_mirror() {
        let mut controls = MapControls::default();
        for row in LayerToggle::ALL {
            assert!(!row.is_on(controls.state()));
            row.flip(&mut controls);
            assert!(row.is_on(controls.state()));
        }
    }
}
