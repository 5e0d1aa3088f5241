//! Global keyboard command router
//!
//! Routing is a pure function of the key, its modifiers and what currently
//! holds focus. The controller applies the resulting [`KeyCommand`].

use crate::model::{CommandModule, DrawingMode, ModalKey};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Escape,
    Enter,
    Other,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    /// Cmd on macOS, Super elsewhere.
    pub meta: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        meta: false,
        shift: false,
        alt: false,
    };

    pub const CTRL: Modifiers = Modifiers {
        ctrl: true,
        ..Modifiers::NONE
    };

    /// Ctrl or Cmd held.
    pub fn is_command(&self) -> bool {
        self.ctrl || self.meta
    }

    pub fn is_bare(&self) -> bool {
        !self.is_command() && !self.shift && !self.alt
    }
}

/// What holds keyboard focus when the key goes down.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FocusTarget {
    #[default]
    Document,
    TextInput,
    TextArea,
    Other,
}

impl FocusTarget {
    pub fn is_text_field(self) -> bool {
        matches!(self, Self::TextInput | Self::TextArea)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyInput {
    pub key: Key,
    pub modifiers: Modifiers,
    pub focus: FocusTarget,
}

impl KeyInput {
    pub fn new(key: Key, modifiers: Modifiers) -> Self {
        Self {
            key,
            modifiers,
            focus: FocusTarget::Document,
        }
    }

    pub fn bare(c: char) -> Self {
        Self::new(Key::Char(c), Modifiers::NONE)
    }

    pub fn ctrl(c: char) -> Self {
        Self::new(Key::Char(c), Modifiers::CTRL)
    }

    pub fn escape() -> Self {
        Self::new(Key::Escape, Modifiers::NONE)
    }

    pub fn focused(mut self, focus: FocusTarget) -> Self {
        self.focus = focus;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyCommand {
    OpenCommandPalette,
    ActivateModule(CommandModule),
    FocusSearch,
    SaveMap,
    OpenModal(ModalKey),
    /// Clear the active module, or else close the first open modal.
    Dismiss,
    ToggleModal(ModalKey),
    ChangeMode(DrawingMode),
    ToggleTraffic,
    ToggleWeatherRadar,
    ToggleEmployee,
    ManualPulse,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dispatch {
    pub command: KeyCommand,
    /// The host should swallow the key instead of passing it on.
    pub prevent_default: bool,
}

impl Dispatch {
    fn consume(command: KeyCommand) -> Self {
        Self {
            command,
            prevent_default: true,
        }
    }

    fn pass_through(command: KeyCommand) -> Self {
        Self {
            command,
            prevent_default: false,
        }
    }
}

pub fn route(input: &KeyInput) -> Option<Dispatch> {
    let in_text_field = input.focus.is_text_field();
    let mods = input.modifiers;

    // The palette chord wins everywhere, text fields included.
    if mods.is_command() && input.key == Key::Char('k') {
        return Some(Dispatch::consume(KeyCommand::OpenCommandPalette));
    }

    if mods.is_command() {
        if in_text_field {
            return None;
        }
        let command = match input.key {
            Key::Char('n') => KeyCommand::ActivateModule(CommandModule::Jobs),
            Key::Char('b') => KeyCommand::ActivateModule(CommandModule::Dashboard),
            Key::Char('/') => KeyCommand::FocusSearch,
            Key::Char('s') => KeyCommand::SaveMap,
            Key::Char('.') => KeyCommand::OpenModal(ModalKey::Settings),
            _ => return None,
        };
        return Some(Dispatch::consume(command));
    }

    if !mods.is_bare() || in_text_field {
        return None;
    }

    let command = match input.key {
        Key::Escape => return Some(Dispatch::pass_through(KeyCommand::Dismiss)),
        Key::Char('a') => KeyCommand::ToggleModal(ModalKey::AiAssistant),
        Key::Char('m') => KeyCommand::ChangeMode(DrawingMode::Measure),
        Key::Char('t') => KeyCommand::ToggleTraffic,
        Key::Char('w') => KeyCommand::ToggleWeatherRadar,
        Key::Char('e') => KeyCommand::ToggleEmployee,
        Key::Char('1') => KeyCommand::ChangeMode(DrawingMode::Marker),
        Key::Char('2') => KeyCommand::ChangeMode(DrawingMode::Polyline),
        Key::Char('3') => KeyCommand::ChangeMode(DrawingMode::Circle),
        Key::Char('4') => KeyCommand::ChangeMode(DrawingMode::Rectangle),
        Key::Char('p') => KeyCommand::ManualPulse,
        _ => return None,
    };
    Some(Dispatch::consume(command))
}

/// One row of the key map, for help screens.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Binding {
    pub keys: &'static str,
    pub action: &'static str,
    /// Still honored while a text field has focus.
    pub in_text_fields: bool,
}

pub const BINDINGS: &[Binding] = &[
    Binding { keys: "Ctrl+K", action: "Open command palette", in_text_fields: true },
    Binding { keys: "Ctrl+N", action: "Jobs", in_text_fields: false },
    Binding { keys: "Ctrl+B", action: "Dashboard", in_text_fields: false },
    Binding { keys: "Ctrl+/", action: "Focus address search", in_text_fields: false },
    Binding { keys: "Ctrl+S", action: "Save map", in_text_fields: false },
    Binding { keys: "Ctrl+.", action: "Settings", in_text_fields: false },
    Binding { keys: "Esc", action: "Close module, then first open modal", in_text_fields: false },
    Binding { keys: "a", action: "Toggle AI assistant", in_text_fields: false },
    Binding { keys: "m", action: "Measure tool", in_text_fields: false },
    Binding { keys: "t", action: "Toggle traffic", in_text_fields: false },
    Binding { keys: "w", action: "Toggle weather radar", in_text_fields: false },
    Binding { keys: "e", action: "Toggle crew tracking", in_text_fields: false },
    Binding { keys: "1-4", action: "Marker / polyline / circle / rectangle", in_text_fields: false },
    Binding { keys: "p", action: "Manual radar pulse", in_text_fields: false },
];
