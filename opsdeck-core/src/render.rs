//! Which overlay panels are mounted for a given state.

use crate::model::{CommandModule, ModalKey};
use crate::reducer::{Intent, Transition, reduce};
use crate::state::CommandCenterState;

/// When a panel is mounted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visibility {
    Module(CommandModule),
    Modal(ModalKey),
    /// Mounted while the module is active or the modal is open.
    Either(CommandModule, ModalKey),
}

impl Visibility {
    pub fn module(self) -> Option<CommandModule> {
        match self {
            Self::Module(m) | Self::Either(m, _) => Some(m),
            Self::Modal(_) => None,
        }
    }

    pub fn modal(self) -> Option<ModalKey> {
        match self {
            Self::Modal(k) | Self::Either(_, k) => Some(k),
            Self::Module(_) => None,
        }
    }
}

/// Every surface the command center can mount on top of the map.
///
/// Declaration order is the stacking order: later panels render above
/// earlier ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Panel {
    AiAssistant,
    AiDetection,
    Dashboard,
    Schedule,
    Clients,
    Fleet,
    Finance,
    Payroll,
    Jobs,
    TimeTracking,
    Photos,
    Equipment,
    Invoicing,
    FieldReports,
    Safety,
    CostCatalog,
    EstimateCalculator,
    RouteOptimization,
    Documents,
    Contracts,
    Receipts,
    EodPlayback,
    HrCompliance,
    HrManagement,
    Analytics,
    Chat,
    Automation,
    Screensaver,
    Settings,
    BusinessHub,
    WeatherRadar,
    Veteran,
    Export,
    CommandPalette,
}

impl Panel {
    pub const ALL: [Panel; 34] = [
        Panel::AiAssistant,
        Panel::AiDetection,
        Panel::Dashboard,
        Panel::Schedule,
        Panel::Clients,
        Panel::Fleet,
        Panel::Finance,
        Panel::Payroll,
        Panel::Jobs,
        Panel::TimeTracking,
        Panel::Photos,
        Panel::Equipment,
        Panel::Invoicing,
        Panel::FieldReports,
        Panel::Safety,
        Panel::CostCatalog,
        Panel::EstimateCalculator,
        Panel::RouteOptimization,
        Panel::Documents,
        Panel::Contracts,
        Panel::Receipts,
        Panel::EodPlayback,
        Panel::HrCompliance,
        Panel::HrManagement,
        Panel::Analytics,
        Panel::Chat,
        Panel::Automation,
        Panel::Screensaver,
        Panel::Settings,
        Panel::BusinessHub,
        Panel::WeatherRadar,
        Panel::Veteran,
        Panel::Export,
        Panel::CommandPalette,
    ];

    pub fn visibility(self) -> Visibility {
        use CommandModule as M;
        use ModalKey as K;
        use Visibility::{Either, Modal, Module};

        match self {
            Self::AiAssistant => Modal(K::AiAssistant),
            Self::AiDetection => Modal(K::AiDetection),
            Self::Dashboard => Module(M::Dashboard),
            Self::Schedule => Module(M::Schedule),
            Self::Clients => Module(M::Clients),
            Self::Fleet => Module(M::Fleet),
            Self::Finance => Module(M::Finance),
            Self::Payroll => Module(M::Payroll),
            Self::Jobs => Module(M::Jobs),
            Self::TimeTracking => Module(M::Time),
            Self::Photos => Module(M::Photos),
            Self::Equipment => Module(M::Equipment),
            Self::Invoicing => Module(M::Invoicing),
            Self::FieldReports => Module(M::FieldReports),
            Self::Safety => Module(M::Safety),
            Self::CostCatalog => Module(M::Catalog),
            Self::EstimateCalculator => Module(M::Estimate),
            Self::RouteOptimization => Module(M::Route),
            Self::Documents => Either(M::Documents, K::Documents),
            Self::Contracts => Either(M::Contracts, K::Contracts),
            Self::Receipts => Either(M::Receipts, K::Receipts),
            Self::EodPlayback => Either(M::EodPlayback, K::EodPlayback),
            Self::HrCompliance => Either(M::HrCompliance, K::HrCompliance),
            Self::HrManagement => Either(M::Hr, K::HrManagement),
            Self::Analytics => Modal(K::Analytics),
            Self::Chat => Modal(K::Chat),
            Self::Automation => Modal(K::Automation),
            Self::Screensaver => Either(M::Screensaver, K::Screensaver),
            Self::Settings => Modal(K::Settings),
            Self::BusinessHub => Modal(K::BusinessHub),
            Self::WeatherRadar => Modal(K::WeatherRadar),
            Self::Veteran => Modal(K::Veteran),
            Self::Export => Modal(K::Export),
            Self::CommandPalette => Modal(K::CommandPalette),
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::AiAssistant => "AI Assistant",
            Self::AiDetection => "Asphalt Detection",
            Self::Dashboard => "Dashboard",
            Self::Schedule => "Schedule",
            Self::Clients => "Clients",
            Self::Fleet => "Fleet",
            Self::Finance => "Finance",
            Self::Payroll => "Payroll",
            Self::Jobs => "Jobs",
            Self::TimeTracking => "Time Tracking",
            Self::Photos => "Photo Documentation",
            Self::Equipment => "Equipment",
            Self::Invoicing => "Invoicing",
            Self::FieldReports => "Field Reports",
            Self::Safety => "Safety Compliance",
            Self::CostCatalog => "Cost Catalog",
            Self::EstimateCalculator => "Estimate Calculator",
            Self::RouteOptimization => "Route Optimization",
            Self::Documents => "Documents",
            Self::Contracts => "Contracts",
            Self::Receipts => "Receipts",
            Self::EodPlayback => "End-of-Day Playback",
            Self::HrCompliance => "HR Compliance",
            Self::HrManagement => "HR Management",
            Self::Analytics => "Analytics",
            Self::Chat => "Chat",
            Self::Automation => "Automation",
            Self::Screensaver => "Screensaver",
            Self::Settings => "Settings",
            Self::BusinessHub => "Business Hub",
            Self::WeatherRadar => "Weather Radar",
            Self::Veteran => "Veteran Programs",
            Self::Export => "Measurement Export",
            Self::CommandPalette => "Command Palette",
        }
    }

    pub fn is_mounted(self, state: &CommandCenterState) -> bool {
        let module_active = |m: CommandModule| state.active_module == Some(m);
        match self.visibility() {
            Visibility::Module(m) => module_active(m),
            Visibility::Modal(k) => state.modals.is_open(k),
            Visibility::Either(m, k) => module_active(m) || state.modals.is_open(k),
        }
    }
}

/// Mounted panels, bottom to top.
pub fn mount_plan(state: &CommandCenterState) -> Vec<Panel> {
    Panel::ALL
        .into_iter()
        .filter(|p| p.is_mounted(state))
        .collect()
}

/// Close request coming from a mounted panel: close its modal, and clear the
/// module slot only when it still holds this panel's module.
pub fn close_panel(state: &mut CommandCenterState, panel: Panel) -> Transition {
    let visibility = panel.visibility();
    let mut changed = false;
    if let Some(key) = visibility.modal() {
        changed |= reduce(state, &Intent::CloseModal(key)).changed;
    }
    if let Some(module) = visibility.module() {
        if state.active_module == Some(module) {
            let mut t = reduce(state, &Intent::SetActiveModule(None));
            t.changed |= changed;
            return t;
        }
    }
    Transition {
        changed,
        module_before: state.active_module,
        module_after: state.active_module,
        ..Transition::default()
    }
}
