use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Side of the reference the panel sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::Top => Side::Bottom,
            Side::Bottom => Side::Top,
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    pub fn is_vertical(self) -> bool {
        matches!(self, Side::Top | Side::Bottom)
    }

    fn as_str(self) -> &'static str {
        match self {
            Side::Top => "top",
            Side::Right => "right",
            Side::Bottom => "bottom",
            Side::Left => "left",
        }
    }
}

/// Alignment along the side's cross axis
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Alignment {
    Start,
    #[default]
    Center,
    End,
}

/// Side plus alignment, written like `bottom-start` or `top`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Placement {
    pub side: Side,
    pub alignment: Alignment,
}

impl Placement {
    pub const fn new(side: Side, alignment: Alignment) -> Self {
        Self { side, alignment }
    }

    pub fn flipped(self) -> Self {
        Self {
            side: self.side.opposite(),
            ..self
        }
    }
}

impl Default for Placement {
    fn default() -> Self {
        Self::new(Side::Bottom, Alignment::Start)
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.alignment {
            Alignment::Center => write!(f, "{}", self.side.as_str()),
            Alignment::Start => write!(f, "{}-start", self.side.as_str()),
            Alignment::End => write!(f, "{}-end", self.side.as_str()),
        }
    }
}

impl FromStr for Placement {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (side, alignment) = match value.split_once('-') {
            Some((side, "start")) => (side, Alignment::Start),
            Some((side, "end")) => (side, Alignment::End),
            Some(_) => return Err(format!("unknown placement '{}'", value)),
            None => (value, Alignment::Center),
        };
        let side = match side {
            "top" => Side::Top,
            "right" => Side::Right,
            "bottom" => Side::Bottom,
            "left" => Side::Left,
            _ => return Err(format!("unknown placement '{}'", value)),
        };
        Ok(Self::new(side, alignment))
    }
}

impl TryFrom<String> for Placement {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Placement> for String {
    fn from(placement: Placement) -> Self {
        placement.to_string()
    }
}

/// Positioning options for one floating panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FloatingConfig {
    /// Preferred placement before flipping
    pub placement: Placement,

    /// Gap between reference and panel along the main axis
    pub offset: f64,

    /// Minimum distance kept from the boundary edges
    pub padding: f64,

    /// Move to the opposite side when the preferred one is clipped
    pub flip: bool,

    /// Slide along the cross axis to stay inside the boundary
    pub shift: bool,

    /// Report the panel as hidden once the reference leaves the boundary
    pub hide: bool,
}

impl Default for FloatingConfig {
    fn default() -> Self {
        Self {
            placement: Placement::default(),
            offset: 4.0,
            padding: 8.0,
            flip: true,
            shift: true,
            hide: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placement_strings() {
        for name in ["top", "bottom-start", "left-end", "right"] {
            assert_eq!(name.parse::<Placement>().unwrap().to_string(), name);
        }
        assert!("middle".parse::<Placement>().is_err());
        assert!("top-left".parse::<Placement>().is_err());
    }

    #[test]
    fn test_config_json() {
        let config: FloatingConfig =
            serde_json::from_str(r#"{ "placement": "top-end", "flip": false }"#).unwrap();
        assert_eq!(config.placement, Placement::new(Side::Top, Alignment::End));
        assert!(!config.flip);
        assert!(config.shift);
        assert_eq!(config.offset, 4.0);
    }
}
