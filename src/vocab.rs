//! Closed vocabularies shared by the reader and writer.
//!
//! Each table maps one or more spellings to an enum value. Lookups by name
//! ignore ASCII case unless noted; the first spelling listed for a value is
//! the one written back out.

/// GPS fix quality of a point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FixQuality {
    None,
    TwoD,
    ThreeD,
    Dgps,
    Pps,
    #[default]
    Unknown,
}

impl FixQuality {
    /// Exact, case-sensitive match on the GPX literals.
    pub fn from_gpx(text: &str) -> Self {
        match text {
            "none" => Self::None,
            "2d" => Self::TwoD,
            "3d" => Self::ThreeD,
            "dgps" => Self::Dgps,
            "pps" => Self::Pps,
            _ => Self::Unknown,
        }
    }

    /// GPX literal, or `None` for `Unknown`, which GPX says to omit.
    pub fn as_gpx(self) -> Option<&'static str> {
        match self {
            Self::None => Some("none"),
            Self::TwoD => Some("2d"),
            Self::ThreeD => Some("3d"),
            Self::Dgps => Some("dgps"),
            Self::Pps => Some("pps"),
            Self::Unknown => None,
        }
    }
}

/// Tri-state flag used for geocache availability and archival.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Status {
    True,
    False,
    #[default]
    Unknown,
}

impl Status {
    pub fn from_attr(text: &str) -> Self {
        if text.eq_ignore_ascii_case("true") {
            Self::True
        } else if text.eq_ignore_ascii_case("false") {
            Self::False
        } else {
            Self::Unknown
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GeocacheType {
    #[default]
    Unknown,
    Traditional,
    Multi,
    Virtual,
    Event,
    Webcam,
    Surprise,
    Earth,
    Cito,
    Letterbox,
    Locationless,
    Ape,
    Mega,
    Wherigo,
    Benchmark,
}

const GEOCACHE_TYPES: &[(GeocacheType, &str)] = &[
    (GeocacheType::Traditional, "Traditional Cache"),
    (GeocacheType::Traditional, "Traditional"),
    (GeocacheType::Multi, "Multi-cache"),
    (GeocacheType::Multi, "Multi"),
    (GeocacheType::Virtual, "Virtual Cache"),
    (GeocacheType::Virtual, "Virtual"),
    (GeocacheType::Event, "Event Cache"),
    (GeocacheType::Event, "Event"),
    (GeocacheType::Webcam, "Webcam Cache"),
    (GeocacheType::Webcam, "Webcam"),
    (GeocacheType::Surprise, "Unknown Cache"),
    (GeocacheType::Earth, "Earthcache"),
    (GeocacheType::Earth, "Earth"),
    (GeocacheType::Cito, "Cache In Trash Out Event"),
    (GeocacheType::Letterbox, "Letterbox Hybrid"),
    (GeocacheType::Locationless, "Locationless (Reverse) Cache"),
    (GeocacheType::Ape, "Project APE Cache"),
    (GeocacheType::Mega, "Mega-Event Cache"),
    (GeocacheType::Wherigo, "Wherigo Cache"),
    // Not Groundspeak; GSAK
    (GeocacheType::Benchmark, "Benchmark"),
];

impl GeocacheType {
    pub fn from_name(name: &str) -> Self {
        lookup_by_name(GEOCACHE_TYPES, name).unwrap_or_default()
    }

    pub fn name(self) -> &'static str {
        lookup_name(GEOCACHE_TYPES, self).unwrap_or("Unknown")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GeocacheContainer {
    #[default]
    Unknown,
    Other,
    Micro,
    Regular,
    Large,
    Small,
    Virtual,
}

const GEOCACHE_CONTAINERS: &[(GeocacheContainer, &str)] = &[
    (GeocacheContainer::Other, "Unknown"),
    (GeocacheContainer::Other, "Other"),
    (GeocacheContainer::Micro, "Micro"),
    (GeocacheContainer::Regular, "Regular"),
    (GeocacheContainer::Large, "Large"),
    (GeocacheContainer::Small, "Small"),
    (GeocacheContainer::Virtual, "Virtual"),
];

impl GeocacheContainer {
    pub fn from_name(name: &str) -> Self {
        lookup_by_name(GEOCACHE_CONTAINERS, name).unwrap_or_default()
    }

    pub fn name(self) -> &'static str {
        lookup_name(GEOCACHE_CONTAINERS, self).unwrap_or("Unknown")
    }
}

/// Garmin line/display colours, as used by `gpxx:DisplayColor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GarminColor {
    Black,
    DarkRed,
    DarkGreen,
    DarkYellow,
    DarkBlue,
    DarkMagenta,
    DarkCyan,
    LightGray,
    DarkGray,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    Transparent,
}

/// Colour name and its 0xBBGGRR value; transparent has none.
const GARMIN_COLORS: &[(GarminColor, &str, Option<u32>)] = &[
    (GarminColor::Black, "Black", Some(0x000000)),
    (GarminColor::DarkRed, "DarkRed", Some(0x00008B)),
    (GarminColor::DarkGreen, "DarkGreen", Some(0x006400)),
    (GarminColor::DarkYellow, "DarkYellow", Some(0x008B8B)),
    (GarminColor::DarkBlue, "DarkBlue", Some(0x8B0000)),
    (GarminColor::DarkMagenta, "DarkMagenta", Some(0x8B008B)),
    (GarminColor::DarkCyan, "DarkCyan", Some(0x8B8B00)),
    (GarminColor::LightGray, "LightGray", Some(0xD3D3D3)),
    (GarminColor::DarkGray, "DarkGray", Some(0xA9A9A9)),
    (GarminColor::Red, "Red", Some(0x0000FF)),
    (GarminColor::Green, "Green", Some(0x008000)),
    (GarminColor::Yellow, "Yellow", Some(0x00FFFF)),
    (GarminColor::Blue, "Blue", Some(0xFF0000)),
    (GarminColor::Magenta, "Magenta", Some(0xFF00FF)),
    (GarminColor::Cyan, "Cyan", Some(0xFFFF00)),
    (GarminColor::White, "White", Some(0xFFFFFF)),
    (GarminColor::Transparent, "Transparent", None),
];

impl GarminColor {
    pub fn from_name(name: &str) -> Option<Self> {
        GARMIN_COLORS
            .iter()
            .find(|(_, n, _)| n.eq_ignore_ascii_case(name.trim()))
            .map(|(c, _, _)| *c)
    }

    pub fn from_bbggrr(value: u32) -> Option<Self> {
        GARMIN_COLORS
            .iter()
            .find(|(_, _, v)| *v == Some(value))
            .map(|(c, _, _)| *c)
    }

    pub fn name(self) -> &'static str {
        GARMIN_COLORS
            .iter()
            .find(|(c, _, _)| *c == self)
            .map(|(_, n, _)| *n)
            .unwrap_or("Transparent")
    }

    pub fn bbggrr(self) -> Option<u32> {
        GARMIN_COLORS
            .iter()
            .find(|(c, _, _)| *c == self)
            .and_then(|(_, _, v)| *v)
    }
}

/// How a Garmin unit labels a waypoint on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GarminDisplayMode {
    SymbolOnly,
    SymbolAndName,
    SymbolAndComment,
}

impl GarminDisplayMode {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim() {
            n if n.eq_ignore_ascii_case("SymbolOnly") => Some(Self::SymbolOnly),
            n if n.eq_ignore_ascii_case("SymbolAndName") => Some(Self::SymbolAndName),
            n if n.eq_ignore_ascii_case("SymbolAndDescription") => Some(Self::SymbolAndComment),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::SymbolOnly => "SymbolOnly",
            Self::SymbolAndName => "SymbolAndName",
            Self::SymbolAndComment => "SymbolAndDescription",
        }
    }
}

fn lookup_by_name<T: Copy>(table: &[(T, &str)], name: &str) -> Option<T> {
    table
        .iter()
        .find(|(_, n)| n.eq_ignore_ascii_case(name.trim()))
        .map(|(v, _)| *v)
}

fn lookup_name<T: Copy + PartialEq>(table: &[(T, &'static str)], value: T) -> Option<&'static str> {
    table.iter().find(|(v, _)| *v == value).map(|(_, n)| *n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fix_literals_round_trip() {
        for literal in ["none", "2d", "3d", "dgps", "pps"] {
            let fix = FixQuality::from_gpx(literal);
            assert_ne!(fix, FixQuality::Unknown);
            assert_eq!(fix.as_gpx(), Some(literal));
        }
    }

    #[test]
    fn test_fix_unknown_is_omitted() {
        for literal in ["", "3D", "rtk", "dGPS"] {
            let fix = FixQuality::from_gpx(literal);
            assert_eq!(fix, FixQuality::Unknown);
            assert_eq!(fix.as_gpx(), None);
        }
    }

    #[test]
    fn test_cache_type_synonyms() {
        assert_eq!(GeocacheType::from_name("Traditional Cache"), GeocacheType::Traditional);
        assert_eq!(GeocacheType::from_name("traditional"), GeocacheType::Traditional);
        assert_eq!(GeocacheType::from_name("MULTI-CACHE"), GeocacheType::Multi);
        assert_eq!(GeocacheType::from_name("Earth"), GeocacheType::Earth);
        assert_eq!(GeocacheType::from_name("Something New"), GeocacheType::Unknown);
        assert_eq!(GeocacheType::Earth.name(), "Earthcache");
        assert_eq!(GeocacheType::Unknown.name(), "Unknown");
    }

    #[test]
    fn test_container_synonyms() {
        assert_eq!(GeocacheContainer::from_name("Other"), GeocacheContainer::Other);
        assert_eq!(GeocacheContainer::from_name("unknown"), GeocacheContainer::Other);
        assert_eq!(GeocacheContainer::from_name("micro"), GeocacheContainer::Micro);
        assert_eq!(GeocacheContainer::from_name("Huge"), GeocacheContainer::Unknown);
        assert_eq!(GeocacheContainer::Other.name(), "Unknown");
        assert_eq!(GeocacheContainer::Small.name(), "Small");
    }

    #[test]
    fn test_status() {
        assert_eq!(Status::from_attr("True"), Status::True);
        assert_eq!(Status::from_attr("FALSE"), Status::False);
        assert_eq!(Status::from_attr("maybe"), Status::Unknown);
    }

    #[test]
    fn test_garmin_colors() {
        assert_eq!(GarminColor::from_name("darkblue"), Some(GarminColor::DarkBlue));
        assert_eq!(GarminColor::DarkBlue.bbggrr(), Some(0x8B0000));
        assert_eq!(GarminColor::from_bbggrr(0x0000FF), Some(GarminColor::Red));
        assert_eq!(GarminColor::Red.name(), "Red");
        assert_eq!(GarminColor::Transparent.bbggrr(), None);
        assert_eq!(GarminColor::from_name("Chartreuse"), None);
    }

    #[test]
    fn test_display_mode() {
        let mode = GarminDisplayMode::from_name("SymbolAndDescription").unwrap();
        assert_eq!(mode, GarminDisplayMode::SymbolAndComment);
        assert_eq!(mode.name(), "SymbolAndDescription");
        assert_eq!(GarminDisplayMode::from_name("Bogus"), None);
    }
}
