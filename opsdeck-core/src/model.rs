use std::fmt;

use serde::{Deserialize, Serialize};

/// Overlay that can be shown or hidden independently of the active module.
///
/// Declaration order is the enumeration order used when Escape looks for
/// the first open modal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ModalKey {
    AiAssistant,
    AiDetection,
    CommandPalette,
    Analytics,
    Chat,
    Automation,
    Screensaver,
    Documents,
    Contracts,
    Receipts,
    Settings,
    EodPlayback,
    BusinessHub,
    HrCompliance,
    HrManagement,
    WeatherRadar,
    Veteran,
    Export,
}

impl ModalKey {
    pub const COUNT: usize = 18;

    pub const ALL: [ModalKey; Self::COUNT] = [
        ModalKey::AiAssistant,
        ModalKey::AiDetection,
        ModalKey::CommandPalette,
        ModalKey::Analytics,
        ModalKey::Chat,
        ModalKey::Automation,
        ModalKey::Screensaver,
        ModalKey::Documents,
        ModalKey::Contracts,
        ModalKey::Receipts,
        ModalKey::Settings,
        ModalKey::EodPlayback,
        ModalKey::BusinessHub,
        ModalKey::HrCompliance,
        ModalKey::HrManagement,
        ModalKey::WeatherRadar,
        ModalKey::Veteran,
        ModalKey::Export,
    ];

    /// Slot of this key in [`ModalKey::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn id(self) -> &'static str {
        match self {
            Self::AiAssistant => "aiAssistant",
            Self::AiDetection => "aiDetection",
            Self::CommandPalette => "commandPalette",
            Self::Analytics => "analytics",
            Self::Chat => "chat",
            Self::Automation => "automation",
            Self::Screensaver => "screensaver",
            Self::Documents => "documents",
            Self::Contracts => "contracts",
            Self::Receipts => "receipts",
            Self::Settings => "settings",
            Self::EodPlayback => "eodPlayback",
            Self::BusinessHub => "businessHub",
            Self::HrCompliance => "hrCompliance",
            Self::HrManagement => "hrManagement",
            Self::WeatherRadar => "weatherRadar",
            Self::Veteran => "veteran",
            Self::Export => "export",
        }
    }
}

impl fmt::Display for ModalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Full-screen module occupying the main content region.
///
/// The active module is a scalar slot (`Option<CommandModule>`), never a set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CommandModule {
    #[serde(rename = "dashboard")]
    Dashboard,
    #[serde(rename = "schedule")]
    Schedule,
    #[serde(rename = "clients")]
    Clients,
    #[serde(rename = "fleet")]
    Fleet,
    #[serde(rename = "finance")]
    Finance,
    #[serde(rename = "payroll")]
    Payroll,
    #[serde(rename = "jobs")]
    Jobs,
    #[serde(rename = "time")]
    Time,
    #[serde(rename = "photos")]
    Photos,
    #[serde(rename = "equipment")]
    Equipment,
    #[serde(rename = "invoicing")]
    Invoicing,
    #[serde(rename = "field-reports")]
    FieldReports,
    #[serde(rename = "safety")]
    Safety,
    #[serde(rename = "catalog")]
    Catalog,
    #[serde(rename = "estimate")]
    Estimate,
    #[serde(rename = "route")]
    Route,
    #[serde(rename = "hr_compliance")]
    HrCompliance,
    #[serde(rename = "hr")]
    Hr,
    #[serde(rename = "documents")]
    Documents,
    #[serde(rename = "contracts")]
    Contracts,
    #[serde(rename = "receipts")]
    Receipts,
    #[serde(rename = "eod-playback")]
    EodPlayback,
    #[serde(rename = "settings")]
    Settings,
    #[serde(rename = "weather")]
    Weather,
    #[serde(rename = "screensaver")]
    Screensaver,
    #[serde(rename = "export")]
    Export,
    #[serde(rename = "veteran")]
    Veteran,
    #[serde(rename = "business_hub")]
    BusinessHub,
}

impl CommandModule {
    pub const ALL: [CommandModule; 28] = [
        CommandModule::Dashboard,
        CommandModule::Schedule,
        CommandModule::Clients,
        CommandModule::Fleet,
        CommandModule::Finance,
        CommandModule::Payroll,
        CommandModule::Jobs,
        CommandModule::Time,
        CommandModule::Photos,
        CommandModule::Equipment,
        CommandModule::Invoicing,
        CommandModule::FieldReports,
        CommandModule::Safety,
        CommandModule::Catalog,
        CommandModule::Estimate,
        CommandModule::Route,
        CommandModule::HrCompliance,
        CommandModule::Hr,
        CommandModule::Documents,
        CommandModule::Contracts,
        CommandModule::Receipts,
        CommandModule::EodPlayback,
        CommandModule::Settings,
        CommandModule::Weather,
        CommandModule::Screensaver,
        CommandModule::Export,
        CommandModule::Veteran,
        CommandModule::BusinessHub,
    ];

    /// Wire identifier, as used by navigation events and the palette.
    pub fn id(self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Schedule => "schedule",
            Self::Clients => "clients",
            Self::Fleet => "fleet",
            Self::Finance => "finance",
            Self::Payroll => "payroll",
            Self::Jobs => "jobs",
            Self::Time => "time",
            Self::Photos => "photos",
            Self::Equipment => "equipment",
            Self::Invoicing => "invoicing",
            Self::FieldReports => "field-reports",
            Self::Safety => "safety",
            Self::Catalog => "catalog",
            Self::Estimate => "estimate",
            Self::Route => "route",
            Self::HrCompliance => "hr_compliance",
            Self::Hr => "hr",
            Self::Documents => "documents",
            Self::Contracts => "contracts",
            Self::Receipts => "receipts",
            Self::EodPlayback => "eod-playback",
            Self::Settings => "settings",
            Self::Weather => "weather",
            Self::Screensaver => "screensaver",
            Self::Export => "export",
            Self::Veteran => "veteran",
            Self::BusinessHub => "business_hub",
        }
    }
}

impl fmt::Display for CommandModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Bottom-sheet panel shown only in compact layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MobilePanel {
    Layers,
    Tools,
    Missions,
    Intel,
    Themes,
}

impl MobilePanel {
    pub fn label(self) -> &'static str {
        match self {
            Self::Layers => "Map Layers",
            Self::Tools => "Tools",
            Self::Missions => "Missions",
            Self::Intel => "Mission Intel",
            Self::Themes => "Themes",
        }
    }
}

/// Drawing tool selected on the map surface. `None` means no tool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrawingMode {
    Marker,
    Polyline,
    Circle,
    Rectangle,
    Measure,
}

impl DrawingMode {
    pub const ALL: [DrawingMode; 5] = [
        DrawingMode::Marker,
        DrawingMode::Polyline,
        DrawingMode::Circle,
        DrawingMode::Rectangle,
        DrawingMode::Measure,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Marker => "marker",
            Self::Polyline => "polyline",
            Self::Circle => "circle",
            Self::Rectangle => "rectangle",
            Self::Measure => "measure",
        }
    }
}

/// Aerial imagery source layered under the map.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Imagery {
    #[default]
    None,
    Naip,
    Usgs,
}

impl Imagery {
    pub fn next(self) -> Self {
        match self {
            Self::None => Self::Naip,
            Self::Naip => Self::Usgs,
            Self::Usgs => Self::None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Naip => "naip",
            Self::Usgs => "usgs",
        }
    }
}

/// Visual theme of the map surface, read from the persisted settings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapTheme {
    #[default]
    Division,
    Animus,
}

/// Whether the host is laid out for a wide screen or a compact one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LayoutMode {
    #[default]
    Wide,
    Compact,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modal_index_matches_enumeration_order() {
        for (i, key) in ModalKey::ALL.iter().enumerate() {
            assert_eq!(key.index(), i);
        }
    }

    #[test]
    fn test_module_serde_uses_wire_ids() {
        let json = serde_json::to_string(&CommandModule::FieldReports).unwrap();
        assert_eq!(json, "\"field-reports\"");
        let parsed: CommandModule = serde_json::from_str("\"business_hub\"").unwrap();
        assert_eq!(parsed, CommandModule::BusinessHub);
        let modal: ModalKey = serde_json::from_str("\"weatherRadar\"").unwrap();
        assert_eq!(modal, ModalKey::WeatherRadar);
    }
}
