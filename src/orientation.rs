//! Output orientations and their canvas sizes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::color::HexColor;
use crate::error::{EmblemError, EmblemResult};
use crate::geometry::SizePx;

const DESKTOP: SizePx = SizePx::new(1920, 1080);
const DESKTOP_PART: SizePx = SizePx::new(1080 / 2, 1080 / 2);
const PHONE: SizePx = SizePx::new(759, 1334);
const SQUARE: SizePx = SizePx::new(1024, 1024);

// ============================================================================
// Orientation
// ============================================================================

/// The target output the emblem is rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub enum Orientation {
    Square,
    Phone,
    DesktopLeftAlign,
    DesktopCenterAlign,
    DesktopRightAlign,
}

impl Orientation {
    pub const ALL: [Orientation; 5] = [
        Self::Square,
        Self::Phone,
        Self::DesktopLeftAlign,
        Self::DesktopCenterAlign,
        Self::DesktopRightAlign,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Square => "SQUARE",
            Self::Phone => "PHONE",
            Self::DesktopLeftAlign => "DESKTOP_LEFT_ALIGN",
            Self::DesktopCenterAlign => "DESKTOP_CENTER_ALIGN",
            Self::DesktopRightAlign => "DESKTOP_RIGHT_ALIGN",
        }
    }

    /// Looks up the sizing profile for this orientation.
    pub fn profile(&self) -> OrientationProfile {
        match self {
            Self::Square => OrientationProfile {
                final_size: SQUARE,
                part_size: SQUARE,
                shift: HorizontalShift::None,
                background: None,
            },
            Self::Phone => OrientationProfile {
                final_size: PHONE,
                part_size: PHONE,
                shift: HorizontalShift::None,
                background: Some(HexColor::BLACK),
            },
            Self::DesktopLeftAlign => OrientationProfile::desktop(HorizontalShift::Left),
            Self::DesktopCenterAlign => OrientationProfile::desktop(HorizontalShift::None),
            Self::DesktopRightAlign => OrientationProfile::desktop(HorizontalShift::Right),
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Orientation {
    type Err = EmblemError;

    fn from_str(s: &str) -> EmblemResult<Self> {
        Self::ALL
            .into_iter()
            .find(|o| o.as_str() == s)
            .ok_or_else(|| EmblemError::UnknownOrientation(s.to_string()))
    }
}

// ============================================================================
// OrientationProfile
// ============================================================================

/// Which way every layer is pushed after centering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HorizontalShift {
    None,
    /// A quarter of the final width to the left.
    Left,
    /// A quarter of the final width to the right.
    Right,
}

/// Canvas sizing for one orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrientationProfile {
    /// Size of the finished image.
    pub final_size: SizePx,
    /// Unscaled size of each layer's working canvas.
    pub part_size: SizePx,
    pub shift: HorizontalShift,
    /// Opaque fill painted before any layer, if any.
    pub background: Option<HexColor>,
}

impl OrientationProfile {
    fn desktop(shift: HorizontalShift) -> Self {
        Self {
            final_size: DESKTOP,
            part_size: DESKTOP_PART,
            shift,
            background: Some(HexColor::BLACK),
        }
    }

    /// The x offset, in pixels, added to every layer placement.
    pub fn horizontal_shift_px(&self) -> i32 {
        let quarter = (self.final_size.width / 4) as i32;
        match self.shift {
            HorizontalShift::None => 0,
            HorizontalShift::Left => -quarter,
            HorizontalShift::Right => quarter,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_table_matches_targets() {
        let square = Orientation::Square.profile();
        assert_eq!(square.final_size, SizePx::new(1024, 1024));
        assert_eq!(square.part_size, SizePx::new(1024, 1024));
        assert_eq!(square.background, None);

        let phone = Orientation::Phone.profile();
        assert_eq!(phone.final_size, SizePx::new(759, 1334));
        assert_eq!(phone.part_size, SizePx::new(759, 1334));
        assert_eq!(phone.background, Some(HexColor::BLACK));

        for o in [
            Orientation::DesktopLeftAlign,
            Orientation::DesktopCenterAlign,
            Orientation::DesktopRightAlign,
        ] {
            let p = o.profile();
            assert_eq!(p.final_size, SizePx::new(1920, 1080));
            assert_eq!(p.part_size, SizePx::new(540, 540));
            assert_eq!(p.background, Some(HexColor::BLACK));
        }
    }

    #[test]
    fn desktop_shifts_are_a_quarter_width() {
        assert_eq!(Orientation::DesktopLeftAlign.profile().horizontal_shift_px(), -480);
        assert_eq!(Orientation::DesktopCenterAlign.profile().horizontal_shift_px(), 0);
        assert_eq!(Orientation::DesktopRightAlign.profile().horizontal_shift_px(), 480);
        assert_eq!(Orientation::Phone.profile().horizontal_shift_px(), 0);
    }

    #[test]
    fn names_round_trip_and_unknown_is_rejected() {
        for o in Orientation::ALL {
            assert_eq!(o.as_str().parse::<Orientation>().unwrap(), o);
            let json = serde_json::to_string(&o).unwrap();
            assert_eq!(json, format!("\"{}\"", o.as_str()));
        }
        assert!(matches!(
            "TABLET".parse::<Orientation>(),
            Err(EmblemError::UnknownOrientation(name)) if name == "TABLET"
        ));
    }
}
