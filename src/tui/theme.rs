use ratatui::style::Color;

use crate::model::UiConfig;

/// Navy, the move-mode highlight
const NAVY: Color = Color::Rgb(0x00, 0x00, 0x80);

/// Parsed color theme for the TUI
#[derive(Debug, Clone)]
pub struct Theme {
    pub background: Color,
    pub text: Color,
    pub dim: Color,
    pub border: Color,
    pub border_focused: Color,
    /// Cursor row in the focused lane
    pub cursor_bg: Color,
    pub cursor_fg: Color,
    /// Cursor row while a task is being moved
    pub select_bg: Color,
    pub select_fg: Color,
    pub status_bg: Color,
    pub status_fg: Color,
    pub key_hint: Color,
    pub popup_bg: Color,
    pub error: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            background: Color::Reset,
            text: Color::Reset,
            dim: Color::DarkGray,
            border: Color::Gray,
            border_focused: Color::White,
            cursor_bg: Color::LightBlue,
            cursor_fg: Color::Black,
            select_bg: NAVY,
            select_fg: Color::White,
            status_bg: Color::Blue,
            status_fg: Color::White,
            key_hint: Color::Yellow,
            popup_bg: Color::Rgb(0x20, 0x20, 0x30),
            error: Color::Red,
        }
    }
}

/// Parse a hex color string like "#FF4444" into an RGB Color
fn parse_hex_color(hex: &str) -> Option<Color> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Color::Rgb(r, g, b))
}

/// Resolve a task or lane color token (`red`, `darkcyan`, `#aabbcc`).
/// Empty and unknown tokens give None, meaning "use the default".
pub fn color_token(token: &str) -> Option<Color> {
    let token = token.trim().to_lowercase();
    if token.starts_with('#') {
        return parse_hex_color(&token);
    }
    let color = match token.as_str() {
        "black" => Color::Black,
        "red" => Color::LightRed,
        "green" => Color::LightGreen,
        "yellow" => Color::LightYellow,
        "blue" => Color::LightBlue,
        "magenta" | "fuchsia" => Color::LightMagenta,
        "cyan" | "aqua" => Color::LightCyan,
        "white" => Color::White,
        "gray" | "grey" | "silver" => Color::Gray,
        "darkgray" | "darkgrey" => Color::DarkGray,
        "darkred" | "maroon" => Color::Red,
        "darkgreen" => Color::Green,
        "darkyellow" | "olive" => Color::Yellow,
        "darkblue" => Color::Blue,
        "darkmagenta" | "purple" => Color::Magenta,
        "darkcyan" | "teal" => Color::Cyan,
        "navy" => NAVY,
        "orange" => Color::Rgb(0xFF, 0xA5, 0x00),
        _ => return None,
    };
    Some(color)
}

impl Theme {
    /// Create a theme from the `[ui.colors]` config table, falling back to defaults
    pub fn from_config(ui: &UiConfig) -> Self {
        let mut theme = Theme::default();

        for (key, value) in &ui.colors {
            let Some(color) = color_token(value) else {
                continue;
            };
            match key.as_str() {
                "background" => theme.background = color,
                "text" => theme.text = color,
                "dim" => theme.dim = color,
                "border" => theme.border = color,
                "border_focused" => theme.border_focused = color,
                "cursor_bg" => theme.cursor_bg = color,
                "cursor_fg" => theme.cursor_fg = color,
                "select_bg" => theme.select_bg = color,
                "select_fg" => theme.select_fg = color,
                "status_bg" => theme.status_bg = color,
                "status_fg" => theme.status_fg = color,
                "key_hint" => theme.key_hint = color,
                "popup_bg" => theme.popup_bg = color,
                "error" => theme.error = color,
                _ => {}
            }
        }

        theme
    }

    /// Background for a lane, from its stored color token
    pub fn lane_bg(&self, token: &str) -> Color {
        color_token(token).unwrap_or(self.background)
    }

    /// Foreground for a task title, from its color token
    pub fn task_fg(&self, token: &str) -> Color {
        color_token(token).unwrap_or(self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_tokens() {
        assert_eq!(color_token("red"), Some(Color::LightRed));
        assert_eq!(color_token("DarkCyan"), Some(Color::Cyan));
        assert_eq!(color_token("#0a0B0c"), Some(Color::Rgb(10, 11, 12)));
        assert_eq!(color_token(""), None);
        assert_eq!(color_token("#12345"), None);
        assert_eq!(color_token("plaid"), None);
    }

    #[test]
    fn test_config_overrides() {
        let mut ui = UiConfig::default();
        ui.colors.insert("cursor_bg".into(), "#102030".into());
        ui.colors.insert("status_bg".into(), "darkgreen".into());
        ui.colors.insert("error".into(), "not-a-color".into());
        let theme = Theme::from_config(&ui);
        assert_eq!(theme.cursor_bg, Color::Rgb(0x10, 0x20, 0x30));
        assert_eq!(theme.status_bg, Color::Green);
        assert_eq!(theme.error, Color::Red);
    }

    #[test]
    fn test_lane_and_task_fallbacks() {
        let theme = Theme::default();
        assert_eq!(theme.lane_bg(""), theme.background);
        assert_eq!(theme.lane_bg("blue"), Color::LightBlue);
        assert_eq!(theme.task_fg("unknown"), theme.text);
    }
}
