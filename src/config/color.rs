use crate::config::ConfigError;
use crate::config::grid::parse_number;

/// RGBA color with every component in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_skia(self) -> tiny_skia::Color {
        tiny_skia::Color::from_rgba(self.r, self.g, self.b, self.a)
            .unwrap_or(tiny_skia::Color::TRANSPARENT)
    }
}

/// Parses `"R,G,B"` or `"R,G,B,A"`; alpha defaults to 1
pub fn parse_color(input: &str) -> Result<Rgba, ConfigError> {
    let components = input
        .split(',')
        .map(parse_number::<f32>)
        .collect::<Result<Vec<_>, _>>()?;

    if let Some(value) = components
        .iter()
        .copied()
        .find(|value| !(0.0..=1.0).contains(value))
    {
        return Err(ConfigError::ComponentOutOfRange { value });
    }

    match components.as_slice() {
        [r, g, b] => Ok(Rgba::new(*r, *g, *b, 1.0)),
        [r, g, b, a] => Ok(Rgba::new(*r, *g, *b, *a)),
        _ => Err(ConfigError::WrongComponentCount {
            input: input.to_string(),
            expected: "3 or 4 (r,g,b[,a])",
            found: components.len(),
        }),
    }
}
