//! Polybar glyph rendering.
//!
//! Everything here produces polybar format-string markup: `%{F#..}` for
//! foreground, `%{B#..}` for background, `%{O-n}` for horizontal offsets
//! and `%{u..}` for underlines. Glyphs come from the active icon theme.

use std::fmt;

use crate::ui::colors::{self, Color, Gradient};

/// Default negative offset for icons that want tightening.
pub const DEFAULT_OFFSET: u32 = 11;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Underline {
    Plain,
    Colored(Color),
}

/// A single glyph with optional polybar decorations.
#[derive(Debug, Clone, Copy)]
pub struct Icon {
    glyph: char,
    fg: Option<Color>,
    bg: Option<Color>,
    offset: Option<u32>,
    underline: Option<Underline>,
}

impl Icon {
    pub const fn new(glyph: char) -> Self {
        Self {
            glyph,
            fg: None,
            bg: None,
            offset: None,
            underline: None,
        }
    }

    pub const fn with_fg(mut self, color: Color) -> Self {
        self.fg = Some(color);
        self
    }

    pub const fn with_bg(mut self, color: Color) -> Self {
        self.bg = Some(color);
        self
    }

    /// Pulls the glyph left by `offset` pixels on both sides.
    pub const fn with_offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    pub const fn with_underline(mut self, underline: Underline) -> Self {
        self.underline = Some(underline);
        self
    }

    pub const fn glyph(&self) -> char {
        self.glyph
    }
}

impl fmt::Display for Icon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = self.glyph.to_string();
        if let Some(offset) = self.offset {
            out = format!("  %{{O-{offset}}}{out} %{{O-{offset}}}");
        }
        if let Some(fg) = self.fg {
            out = format!("%{{F#{fg}}}{out}%{{F-}}");
        }
        if let Some(bg) = self.bg {
            out = format!("%{{B#{bg}}}{out}%{{B-}}");
        }
        match self.underline {
            Some(Underline::Plain) => out = format!("%{{+u}}{out}%{{-u}}"),
            Some(Underline::Colored(color)) => {
                out = format!("%{{u#{color}}}%{{+u}}{out}%{{-u}}%{{u-}}");
            }
            None => {}
        }

        f.write_str(&out)
    }
}

/// A run of glyphs indexed by a 0-100 level: empty jar to full jar.
#[derive(Debug, Clone, Copy)]
pub struct ProgressiveIcon {
    progression: &'static str,
}

impl ProgressiveIcon {
    pub const fn new(progression: &'static str) -> Self {
        Self { progression }
    }

    pub fn at(&self, level: f64) -> Icon {
        let glyphs: Vec<char> = self.progression.chars().collect();
        let idx = (level.max(0.0) / 100.0 * glyphs.len() as f64) as usize;
        Icon::new(glyphs[idx.min(glyphs.len() - 1)])
    }
}

/// A fixed glyph whose color follows a gradient over a 0-100 level.
#[derive(Debug, Clone, Copy)]
pub struct GradientIcon {
    glyph: char,
    gradient: Gradient,
}

impl GradientIcon {
    pub const fn new(glyph: char) -> Self {
        Self {
            glyph,
            gradient: colors::GYR,
        }
    }

    pub const fn with_gradient(glyph: char, gradient: Gradient) -> Self {
        Self { glyph, gradient }
    }

    pub fn at(&self, level: f64) -> Icon {
        Icon::new(self.glyph).with_fg(self.gradient.at(level))
    }
}

const EQ_GLYPHS: [char; 4] = ['⡀', '⠄', '⠂', '⠁'];

/// Four-dot braille meter for a 0-100 level.
///
/// Negative offsets stack the dots into one column. Dots below the level
/// render at full opacity in their bracket's color; the dot whose bracket
/// the level falls in fades from half to full opacity as the level climbs
/// through the bracket.
#[derive(Debug, Clone, Copy)]
pub struct EqDots {
    levels: [f64; 5],
    colors: [Color; 4],
    zero_color: Color,
}

impl Default for EqDots {
    fn default() -> Self {
        Self {
            levels: [0.0, 25.0, 50.0, 75.0, 100.0],
            colors: [colors::RED, colors::ORANGE, colors::YELLOW, colors::GREEN],
            zero_color: colors::DARK_GREY,
        }
    }
}

impl EqDots {
    pub fn new(levels: [f64; 5], colors: [Color; 4], zero_color: Color) -> Self {
        Self {
            levels,
            colors,
            zero_color,
        }
    }

    pub fn render(&self, value: f64) -> String {
        if value == 0.0 {
            return format!("%{{F#{}}}{}%{{F-}}", self.zero_color, EQ_GLYPHS[0]);
        }

        let mut dots = String::new();
        for (i, glyph) in EQ_GLYPHS.iter().enumerate() {
            let (min, max) = (self.levels[i], self.levels[i + 1]);
            let color = self.colors[i];

            if value > max {
                if !dots.is_empty() {
                    dots.push_str("%{O-11}");
                }
                dots.push_str(&format!("%{{F#{color}}}{glyph}%{{F-}}"));
            } else if value > min {
                if !dots.is_empty() {
                    dots.push_str("%{O-11}");
                }
                // Eight opacity steps across the bracket, starting at half.
                let bracket = ((value - min) * 8.0 / (max - min)) as u8 + 8;
                dots.push_str(&format!(
                    "%{{F#{}}}{glyph}%{{F-}}",
                    color.with_opacity(bracket)
                ));
                break;
            }
        }

        dots
    }
}
