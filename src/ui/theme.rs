//! Icon themes.
//!
//! One named set of glyphs per theme, chosen once per process from the
//! `ICON_THEME` environment variable. Unknown themes warn and fall back
//! to material so a typo in the bar config degrades instead of failing.

use std::env;
use std::sync::OnceLock;

use log::warn;

use crate::ui::colors;
use crate::ui::icons::{GradientIcon, Icon, ProgressiveIcon};

/// The glyphs a bar segment can ask for, resolved per theme.
#[derive(Debug, Clone, Copy)]
pub struct IconSet {
    pub ac: Icon,
    pub battery_levels: ProgressiveIcon,
    pub bluetooth_on: Icon,
    pub bluetooth_off: Icon,
    pub bluetooth_connected: Icon,
    pub cpu: GradientIcon,
    pub memory: GradientIcon,
    pub volume_levels: ProgressiveIcon,
    pub muted: Icon,
    pub brightness: Icon,
    pub playing: Icon,
    pub paused: Icon,
    pub stopped: Icon,
    pub clock: Icon,
    pub unknown: Icon,
}

const MATERIAL: IconSet = IconSet {
    ac: Icon::new('\u{f1e6}'),
    battery_levels: ProgressiveIcon::new("󰂎󰁺󰁻󰁼󰁽󰁾󰁿󰂀󰂁󰂂󰁹"),
    bluetooth_on: Icon::new('󰂯'),
    bluetooth_off: Icon::new('󰂲').with_fg(colors::GREY),
    bluetooth_connected: Icon::new('󰂱').with_fg(colors::CYAN),
    cpu: GradientIcon::new('\u{f85a}'),
    memory: GradientIcon::new('\u{e266}'),
    volume_levels: ProgressiveIcon::new("󰕿󰖀󰕾"),
    muted: Icon::new('󰝟').with_fg(colors::GREY),
    brightness: Icon::new('󰃟'),
    playing: Icon::new('󰐊'),
    paused: Icon::new('󰏤'),
    stopped: Icon::new('󰓛').with_fg(colors::GREY),
    clock: Icon::new('󰥔'),
    unknown: Icon::new('?'),
};

/// The process-wide icon set, picked from `ICON_THEME` on first use.
pub fn current() -> &'static IconSet {
    static CURRENT: OnceLock<IconSet> = OnceLock::new();
    CURRENT.get_or_init(select)
}

fn select() -> IconSet {
    let theme = env::var("ICON_THEME").unwrap_or_default();
    match theme.to_lowercase().as_str() {
        "" | "material" => MATERIAL,
        other => {
            warn!("unknown icon theme {other:?}, falling back to material");
            MATERIAL
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_material_battery_progression_spans_empty_to_full() {
        assert_eq!(MATERIAL.battery_levels.at(0.0).glyph(), '󰂎');
        assert_eq!(MATERIAL.battery_levels.at(100.0).glyph(), '󰁹');
    }

    #[test]
    fn test_material_bluetooth_states_are_distinct() {
        let on = MATERIAL.bluetooth_on.to_string();
        let off = MATERIAL.bluetooth_off.to_string();
        let connected = MATERIAL.bluetooth_connected.to_string();
        assert_ne!(on, off);
        assert_ne!(on, connected);
        // Off is dimmed, connected is highlighted.
        assert!(off.contains("999999"));
        assert!(connected.contains("55AAFF"));
    }

    #[test]
    fn test_current_yields_a_usable_set() {
        let set = current();
        assert_eq!(set.unknown.glyph(), MATERIAL.unknown.glyph());
    }
}
