//! Pango markup for notification bodies and rofi message lines.

use crate::ui::colors::Color;

pub const MONOSPACE: &str = "Anonymice Nerd Font Mono";

const CLOSE_TAG: &str = "</span>";

/// Builder for a `<span ...>` tag.
///
/// When a font is set, size and weight fold into its `font_desc`;
/// otherwise they become standalone attributes.
#[derive(Debug, Clone, Default)]
pub struct Span {
    foreground: Option<Color>,
    background: Option<Color>,
    font: Option<String>,
    size: Option<String>,
    weight: Option<String>,
    underline: Option<String>,
}

impl Span {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn foreground(mut self, color: Color) -> Self {
        self.foreground = Some(color);
        self
    }

    pub fn background(mut self, color: Color) -> Self {
        self.background = Some(color);
        self
    }

    pub fn font(mut self, font: &str) -> Self {
        self.font = Some(font.to_string());
        self
    }

    /// Pango size: a point size in thousandths or a keyword like `large`.
    pub fn size(mut self, size: &str) -> Self {
        self.size = Some(size.to_string());
        self
    }

    pub fn weight(mut self, weight: &str) -> Self {
        self.weight = Some(weight.to_string());
        self
    }

    pub fn underline(mut self, style: &str) -> Self {
        self.underline = Some(style.to_string());
        self
    }

    /// The opening tag only.
    pub fn tag(&self) -> String {
        let mut parts = vec!["span".to_string()];

        if let Some(fg) = self.foreground {
            parts.push(format!("foreground='#{fg}'"));
        }
        if let Some(bg) = self.background {
            parts.push(format!("background='#{bg}'"));
        }
        if let Some(font) = &self.font {
            let mut desc = font.clone();
            if let Some(weight) = &self.weight {
                desc.push(' ');
                desc.push_str(weight);
            }
            if let Some(size) = &self.size {
                desc.push(' ');
                desc.push_str(size);
            }
            parts.push(format!("font_desc='{desc}'"));
        } else {
            if let Some(size) = &self.size {
                parts.push(format!("size='{size}'"));
            }
            if let Some(weight) = &self.weight {
                parts.push(format!("weight='{weight}'"));
            }
        }
        if let Some(underline) = &self.underline {
            parts.push(format!("underline='{underline}'"));
        }

        format!("<{}>", parts.join(" "))
    }

    /// Contents wrapped in the span.
    pub fn wrap(&self, contents: &str) -> String {
        format!("{}{}{}", self.tag(), contents, CLOSE_TAG)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::colors;

    #[test]
    fn test_empty_span_wraps_bare() {
        assert_eq!(Span::new().wrap("x"), "<span>x</span>");
    }

    #[test]
    fn test_colors_render_with_hash_prefix() {
        let span = Span::new().foreground(colors::GREEN).background(colors::DARK_GREY);
        assert_eq!(span.tag(), "<span foreground='#00FF00' background='#666666'>");
    }

    #[test]
    fn test_font_absorbs_weight_and_size() {
        let span = Span::new().font(MONOSPACE).weight("bold").size("12");
        assert_eq!(
            span.tag(),
            "<span font_desc='Anonymice Nerd Font Mono bold 12'>"
        );
    }

    #[test]
    fn test_size_and_weight_stand_alone_without_font() {
        let span = Span::new().size("large").weight("bold").underline("single");
        assert_eq!(span.tag(), "<span size='large' weight='bold' underline='single'>");
    }

    #[test]
    fn test_wrap_closes_the_tag() {
        let wrapped = Span::new().foreground(colors::WHITE).wrap("25");
        assert_eq!(wrapped, "<span foreground='#FFFFFF'>25</span>");
    }
}
