//! Modules that are served by a modal instead of the main content region.

use crate::model::{CommandModule, ModalKey};

/// Modal that replaces `module` when it is activated, if any.
///
/// Exhaustive on purpose: a new module does not compile until it is placed
/// on one side of this table.
pub fn modal_for(module: CommandModule) -> Option<ModalKey> {
    match module {
        CommandModule::Settings => Some(ModalKey::Settings),
        CommandModule::Weather => Some(ModalKey::WeatherRadar),
        CommandModule::Screensaver => Some(ModalKey::Screensaver),
        CommandModule::Export => Some(ModalKey::Export),
        CommandModule::Veteran => Some(ModalKey::Veteran),
        CommandModule::BusinessHub => Some(ModalKey::BusinessHub),
        CommandModule::Dashboard
        | CommandModule::Schedule
        | CommandModule::Clients
        | CommandModule::Fleet
        | CommandModule::Finance
        | CommandModule::Payroll
        | CommandModule::Jobs
        | CommandModule::Time
        | CommandModule::Photos
        | CommandModule::Equipment
        | CommandModule::Invoicing
        | CommandModule::FieldReports
        | CommandModule::Safety
        | CommandModule::Catalog
        | CommandModule::Estimate
        | CommandModule::Route
        | CommandModule::HrCompliance
        | CommandModule::Hr
        | CommandModule::Documents
        | CommandModule::Contracts
        | CommandModule::Receipts
        | CommandModule::EodPlayback => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_table_entries() {
        let redirected: Vec<_> = CommandModule::ALL
            .into_iter()
            .filter_map(|m| modal_for(m).map(|k| (m, k)))
            .collect();
        assert_eq!(
            redirected,
            vec![
                (CommandModule::Settings, ModalKey::Settings),
                (CommandModule::Weather, ModalKey::WeatherRadar),
                (CommandModule::Screensaver, ModalKey::Screensaver),
                (CommandModule::Export, ModalKey::Export),
                (CommandModule::Veteran, ModalKey::Veteran),
                (CommandModule::BusinessHub, ModalKey::BusinessHub),
            ]
        );
    }

    #[test]
    fn test_estimate_is_not_redirected() {
        assert_eq!(modal_for(CommandModule::Estimate), None);
        assert_eq!(modal_for(CommandModule::Dashboard), None);
    }
}
