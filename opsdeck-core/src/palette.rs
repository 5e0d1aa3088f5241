//! Command palette catalogue and search.

use crate::model::CommandModule;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaletteEntry {
    pub module: CommandModule,
    pub label: &'static str,
    pub keywords: &'static [&'static str],
}

impl PaletteEntry {
    /// Case-insensitive substring match on the label or any keyword.
    /// `needle` must already be lowercase.
    fn matches(&self, needle: &str) -> bool {
        self.label.to_lowercase().contains(needle)
            || self.keywords.iter().any(|k| k.to_lowercase().contains(needle))
    }
}

pub const CATALOGUE: &[PaletteEntry] = &[
    PaletteEntry {
        module: CommandModule::Dashboard,
        label: "Dashboard",
        keywords: &["home", "overview", "stats"],
    },
    PaletteEntry {
        module: CommandModule::Schedule,
        label: "Schedule",
        keywords: &["calendar", "timeline", "events"],
    },
    PaletteEntry {
        module: CommandModule::Jobs,
        label: "Jobs",
        keywords: &["projects", "work", "tasks"],
    },
    PaletteEntry {
        module: CommandModule::Clients,
        label: "Clients",
        keywords: &["customers", "contacts"],
    },
    PaletteEntry {
        module: CommandModule::Fleet,
        label: "Fleet",
        keywords: &["vehicles", "equipment"],
    },
    PaletteEntry {
        module: CommandModule::Time,
        label: "Time Tracking",
        keywords: &["hours", "timesheet", "clock"],
    },
    PaletteEntry {
        module: CommandModule::Invoicing,
        label: "Invoicing",
        keywords: &["billing", "payments", "invoice"],
    },
    PaletteEntry {
        module: CommandModule::FieldReports,
        label: "Field Reports",
        keywords: &["reports", "documentation"],
    },
    PaletteEntry {
        module: CommandModule::Safety,
        label: "Safety & Compliance",
        keywords: &["compliance", "safety", "regulations"],
    },
    PaletteEntry {
        module: CommandModule::Estimate,
        label: "Estimate Calculator",
        keywords: &["calculator", "quote", "pricing"],
    },
    PaletteEntry {
        module: CommandModule::Settings,
        label: "Settings",
        keywords: &["preferences", "config", "options"],
    },
];

/// Entries matching `query`, in catalogue order. A blank query matches all.
pub fn filter(query: &str) -> Vec<&'static PaletteEntry> {
    let needle = query.trim().to_lowercase();
    CATALOGUE
        .iter()
        .filter(|entry| needle.is_empty() || entry.matches(&needle))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn modules(query: &str) -> Vec<CommandModule> {
        filter(query).into_iter().map(|e| e.module).collect()
    }

    #[test]
    fn test_blank_query_returns_whole_catalogue() {
        assert_eq!(filter("").len(), CATALOGUE.len());
        assert_eq!(filter("   ").len(), CATALOGUE.len());
    }

    #[test]
    fn test_matches_keywords_case_insensitively() {
        assert_eq!(modules("QUOTE"), vec![CommandModule::Estimate]);
        assert_eq!(modules("equip"), vec![CommandModule::Fleet]);
    }

    #[test]
    fn test_matches_label_substring() {
        assert_eq!(modules("report"), vec![CommandModule::FieldReports]);
        assert_eq!(modules("calc"), vec![CommandModule::Estimate]);
    }

    #[test]
    fn test_no_match_is_empty() {
        assert!(filter("zzz").is_empty());
    }
}
