//! Bar palette and color math.
//!
//! Colors render as `RRGGBB` hex for polybar `%{F#..}` blocks and pango
//! `foreground='#..'` attributes. Opacity is expressed in sixteenths so
//! icon fades can step through discrete alpha levels.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    r: u8,
    g: u8,
    b: u8,
}

pub const RED: Color = Color::new(0xFF, 0x00, 0x00);
pub const GREEN: Color = Color::new(0x00, 0xFF, 0x00);
pub const YELLOW: Color = Color::new(0xFF, 0xFF, 0x00);
pub const ORANGE: Color = Color::new(0xFF, 0x66, 0x00);
pub const DARK_GREY: Color = Color::new(0x66, 0x66, 0x66);
pub const GREY: Color = Color::new(0x99, 0x99, 0x99);
pub const CYAN: Color = Color::new(0x55, 0xAA, 0xFF);
pub const WHITE: Color = Color::new(0xFF, 0xFF, 0xFF);

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// `AARRGGBB` with the alpha given in sixteenths (1..=16, clamped).
    ///
    /// Sixteen is fully opaque; each step doubles one hex digit, so 8 is
    /// `77..` and 16 is `FF..`. Alphas below the midpoint are barely
    /// visible on the bar, so fades stay in the upper half.
    pub fn with_opacity(self, sixteenths: u8) -> String {
        let nibble = sixteenths.clamp(1, 16) - 1;
        format!("{nibble:X}{nibble:X}{self}")
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Three-stop gradient over a 0-100 level, interpolated per channel.
#[derive(Debug, Clone, Copy)]
pub struct Gradient {
    stops: [Color; 3],
}

/// Green at idle, red at saturation. The default for load meters.
pub const GYR: Gradient = Gradient::new([GREEN, YELLOW, RED]);

/// Red at empty, green at full. Suits charge levels.
pub const RYG: Gradient = Gradient::new([RED, YELLOW, GREEN]);

impl Gradient {
    pub const fn new(stops: [Color; 3]) -> Self {
        Self { stops }
    }

    /// Color for a 0-100 level. Out-of-range levels clamp to the ends.
    pub fn at(&self, level: f64) -> Color {
        let level = level.clamp(0.0, 100.0);
        let (lo, hi, t) = if level <= 50.0 {
            (self.stops[0], self.stops[1], level / 50.0)
        } else {
            (self.stops[1], self.stops[2], (level - 50.0) / 50.0)
        };

        Color::new(
            lerp(lo.r, hi.r, t),
            lerp(lo.g, hi.g, t),
            lerp(lo.b, hi.b, t),
        )
    }
}

fn lerp(lo: u8, hi: u8, t: f64) -> u8 {
    (f64::from(lo) + (f64::from(hi) - f64::from(lo)) * t).round() as u8
}
