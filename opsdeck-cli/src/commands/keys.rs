use opsdeck_core::keyboard::BINDINGS;

/// Keys handled by the terminal host itself, after the command router.
const HOST_KEYS: &[(&str, &str)] = &[
    ("Enter", "Act on the top panel, or place a shape"),
    ("x", "Close the top panel"),
    ("Arrows", "Pan the map"),
    ("+ / -", "Zoom"),
    ("c", "Clear shapes"),
    ("l", "Locate me"),
    ("v", "Street view"),
    ("r", "Parcel boundaries"),
    ("i", "Cycle imagery"),
    ("F1-F5", "Compact dock buttons"),
    ("q / Ctrl+C", "Quit"),
];

pub fn run_keys() {
    let width = BINDINGS
        .iter()
        .map(|b| b.keys.len())
        .chain(HOST_KEYS.iter().map(|(k, _)| k.len()))
        .max()
        .unwrap_or(0);

    println!("Command center:");
    for binding in BINDINGS {
        let note = if binding.in_text_fields {
            "  (also while typing)"
        } else {
            ""
        };
        println!("  {:<width$}  {}{}", binding.keys, binding.action, note);
    }

    println!("\nTerminal:");
    for (keys, action) in HOST_KEYS {
        println!("  {:<width$}  {}", keys, action);
    }
}
