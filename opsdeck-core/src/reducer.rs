use tracing::debug;

use crate::model::{CommandModule, MobilePanel, ModalKey};
use crate::redirect;
use crate::state::CommandCenterState;

/// State changes the orchestrator accepts for its selectors and modal store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Intent {
    OpenModal(ModalKey),
    CloseModal(ModalKey),
    ToggleModal {
        key: ModalKey,
        value: Option<bool>,
    },
    /// Replace the active module. Always clears the mobile panel, then
    /// applies the module-to-modal redirect.
    SetActiveModule(Option<CommandModule>),
    SetMobilePanel(Option<MobilePanel>),
}

/// What a single [`reduce`] call did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Transition {
    pub changed: bool,
    pub module_before: Option<CommandModule>,
    pub module_after: Option<CommandModule>,
    /// Modal opened in place of a redirected module.
    pub redirected_to: Option<ModalKey>,
    pub mobile_panel_cleared: bool,
}

impl Transition {
    fn unchanged(state: &CommandCenterState) -> Self {
        Self {
            changed: false,
            module_before: state.active_module,
            module_after: state.active_module,
            redirected_to: None,
            mobile_panel_cleared: false,
        }
    }

    fn modal(state: &CommandCenterState, changed: bool) -> Self {
        Self {
            changed,
            ..Self::unchanged(state)
        }
    }
}

pub fn reduce(state: &mut CommandCenterState, intent: &Intent) -> Transition {
    match *intent {
        Intent::OpenModal(key) => {
            let changed = state.modals.open(key);
            Transition::modal(state, changed)
        }
        Intent::CloseModal(key) => {
            let changed = state.modals.close(key);
            Transition::modal(state, changed)
        }
        Intent::ToggleModal { key, value } => {
            let changed = state.modals.toggle(key, value);
            Transition::modal(state, changed)
        }
        Intent::SetMobilePanel(panel) => {
            let changed = state.mobile_panel != panel;
            state.mobile_panel = panel;
            Transition::modal(state, changed)
        }
        Intent::SetActiveModule(module) => set_active_module(state, module),
    }
}

fn set_active_module(state: &mut CommandCenterState, module: Option<CommandModule>) -> Transition {
    let module_before = state.active_module;
    state.active_module = module;

    let mobile_panel_cleared = state.mobile_panel.take().is_some();

    let mut redirected_to = None;
    let mut modal_opened = false;
    if let Some(m) = module {
        if let Some(key) = redirect::modal_for(m) {
            modal_opened = state.modals.open(key);
            state.active_module = None;
            redirected_to = Some(key);
            debug!(module = %m, modal = %key, "module redirected to modal");
        }
    }

    let module_after = state.active_module;
    if module_before != module_after {
        debug!(
            from = ?module_before.map(CommandModule::id),
            to = ?module_after.map(CommandModule::id),
            "active module changed"
        );
    }

    Transition {
        changed: module_before != module_after || mobile_panel_cleared || modal_opened,
        module_before,
        module_after,
        redirected_to,
        mobile_panel_cleared,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(state: &mut CommandCenterState, module: Option<CommandModule>) -> Transition {
        reduce(state, &Intent::SetActiveModule(module))
    }

    #[test]
    fn test_redirected_modules_open_their_modal_and_reset_slot() {
        for module in CommandModule::ALL {
            let Some(key) = redirect::modal_for(module) else {
                continue;
            };
            let mut state = CommandCenterState::new();
            let t = set(&mut state, Some(module));
            assert_eq!(state.active_module, None);
            assert!(state.modals.is_open(key));
            assert_eq!(t.redirected_to, Some(key));
        }
    }

    #[test]
    fn test_settings_scenario() {
        let mut state = CommandCenterState::new();
        set(&mut state, Some(CommandModule::Settings));
        assert!(state.modals.is_open(ModalKey::Settings));
        assert_eq!(state.active_module, None);
    }

    #[test]
    fn test_redirect_twice_keeps_modal_open() {
        let mut state = CommandCenterState::new();
        set(&mut state, Some(CommandModule::Weather));
        let first = state.clone();
        let t = set(&mut state, Some(CommandModule::Weather));
        assert_eq!(state, first);
        assert!(!t.changed);
        assert!(state.modals.is_open(ModalKey::WeatherRadar));
    }

    #[test]
    fn test_any_module_set_clears_mobile_panel() {
        for module in CommandModule::ALL {
            let mut state = CommandCenterState::new();
            reduce(&mut state, &Intent::SetMobilePanel(Some(MobilePanel::Layers)));
            let t = set(&mut state, Some(module));
            assert_eq!(state.mobile_panel, None);
            assert!(t.mobile_panel_cleared);
        }

        let mut state = CommandCenterState::new();
        reduce(&mut state, &Intent::SetMobilePanel(Some(MobilePanel::Intel)));
        set(&mut state, None);
        assert_eq!(state.mobile_panel, None);
    }

    #[test]
    fn test_plain_module_replaces_previous_one() {
        let mut state = CommandCenterState::new();
        set(&mut state, Some(CommandModule::Dashboard));
        let t = set(&mut state, Some(CommandModule::Fleet));
        assert_eq!(state.active_module, Some(CommandModule::Fleet));
        assert_eq!(t.module_before, Some(CommandModule::Dashboard));
        assert!(t.changed);
        assert!(!state.modals.any_open());
    }

    #[test]
    fn test_mobile_panel_setter_does_not_toggle() {
        let mut state = CommandCenterState::new();
        reduce(&mut state, &Intent::SetMobilePanel(Some(MobilePanel::Tools)));
        let t = reduce(&mut state, &Intent::SetMobilePanel(Some(MobilePanel::Tools)));
        assert_eq!(state.mobile_panel, Some(MobilePanel::Tools));
        assert!(!t.changed);
    }
}
