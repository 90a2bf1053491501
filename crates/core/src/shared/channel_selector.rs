use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::shared::error::RecordingError;

/// Which part of a color frame to return.
///
/// Monochrome frames ignore the selector entirely.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub enum ChannelSelector {
    Red,
    Green,
    Blue,
    #[default]
    Luma,
    RawAllChannels,
}

impl ChannelSelector {
    /// Plane index for the single-plane selectors.
    pub fn plane_index(self) -> Option<usize> {
        match self {
            ChannelSelector::Red => Some(0),
            ChannelSelector::Green => Some(1),
            ChannelSelector::Blue => Some(2),
            ChannelSelector::Luma | ChannelSelector::RawAllChannels => None,
        }
    }
}

impl FromStr for ChannelSelector {
    type Err = RecordingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "R" | "RED" => Ok(ChannelSelector::Red),
            "G" | "GREEN" => Ok(ChannelSelector::Green),
            "B" | "BLUE" => Ok(ChannelSelector::Blue),
            "Y" | "LUMA" => Ok(ChannelSelector::Luma),
            "RAW" | "NONE" => Ok(ChannelSelector::RawAllChannels),
            _ => Err(RecordingError::UnsupportedChannel(s.to_string())),
        }
    }
}

impl fmt::Display for ChannelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChannelSelector::Red => "R",
            ChannelSelector::Green => "G",
            ChannelSelector::Blue => "B",
            ChannelSelector::Luma => "Y",
            ChannelSelector::RawAllChannels => "RAW",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::red("R", ChannelSelector::Red)]
    #[case::lower_green("g", ChannelSelector::Green)]
    #[case::blue_word("blue", ChannelSelector::Blue)]
    #[case::luma("Y", ChannelSelector::Luma)]
    #[case::raw("raw", ChannelSelector::RawAllChannels)]
    #[case::none("None", ChannelSelector::RawAllChannels)]
    fn test_parse_known_selectors(#[case] input: &str, #[case] expected: ChannelSelector) {
        assert_eq!(input.parse::<ChannelSelector>().unwrap(), expected);
    }

    #[rstest]
    #[case::letter("X")]
    #[case::empty("")]
    #[case::alpha("A")]
    fn test_parse_unknown_selector_fails(#[case] input: &str) {
        let err = input.parse::<ChannelSelector>().unwrap_err();
        assert!(matches!(err, RecordingError::UnsupportedChannel(ref c) if c == input));
    }

    #[test]
    fn test_default_is_luma() {
        assert_eq!(ChannelSelector::default(), ChannelSelector::Luma);
    }

    #[test]
    fn test_plane_indices() {
        assert_eq!(ChannelSelector::Red.plane_index(), Some(0));
        assert_eq!(ChannelSelector::Green.plane_index(), Some(1));
        assert_eq!(ChannelSelector::Blue.plane_index(), Some(2));
        assert_eq!(ChannelSelector::Luma.plane_index(), None);
    }

    #[test]
    fn test_display_roundtrips_through_parse() {
        for sel in [
            ChannelSelector::Red,
            ChannelSelector::Green,
            ChannelSelector::Blue,
            ChannelSelector::Luma,
            ChannelSelector::RawAllChannels,
        ] {
            assert_eq!(sel.to_string().parse::<ChannelSelector>().unwrap(), sel);
        }
    }
}
