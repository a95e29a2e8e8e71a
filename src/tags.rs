//! Mapping from full element paths to the tags the reader understands.
//!
//! GPX reuses element names (`name` is a file, point, route or geocache
//! name depending on where it sits), so elements are identified by their
//! whole path from the root, e.g. `/gpx/wpt/name`. Paths are exact keys;
//! anything not listed is [`Tag::Unknown`] and is preserved verbatim.

use std::collections::HashMap;

use once_cell::sync::Lazy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Unknown,
    Gpx,

    // File-level info
    Name,
    Desc,
    Author,
    Email,
    Url,
    UrlName,
    Keywords,
    Link,
    LinkText,
    LinkType,

    // Points
    Wpt,
    RtePt,
    TrkPt,
    PointEle,
    PointTime,
    PointGeoidHeight,
    PointName,
    PointCmt,
    PointDesc,
    PointUrl,
    PointUrlName,
    PointLink,
    PointLinkText,
    PointLinkType,
    PointSym,
    PointType,
    PointFix,
    PointSat,
    PointHdop,
    PointVdop,
    PointPdop,
    TrkPtCourse,
    TrkPtSpeed,
    TrkPtHeartRate,
    TrkPtCadence,

    // Geocaches
    Cache,
    CacheName,
    CacheContainer,
    CacheType,
    CacheDifficulty,
    CacheTerrain,
    CacheHint,
    CacheDescShort,
    CacheDescLong,
    CacheLogWpt,
    CacheLogType,
    CacheLogDate,
    CachePlacer,
    CacheFavoritePoints,
    CachePersonalNote,

    WptExtensions,

    // Garmin waypoint extension
    GarminWptExtensions,
    GarminWptProximity,
    GarminWptTemperature,
    GarminWptDepth,
    GarminWptDisplayMode,
    GarminWptCategories,
    GarminWptCategory,
    GarminWptAddr,
    GarminWptCity,
    GarminWptState,
    GarminWptCountry,
    GarminWptPostalCode,
    GarminWptPhoneNr,

    // Humminbird
    HumminbirdDepth,
    HumminbirdStatus,

    // Routes and tracks
    Rte,
    Trk,
    TrkSeg,
    HeadName,
    HeadDesc,
    HeadUrl,
    HeadUrlName,
    HeadLink,
    HeadLinkText,
    HeadLinkType,
    HeadNumber,
    GarminDisplayColor,
}

/// What the path table knows about one element path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagEntry {
    pub tag: Tag,
    /// Also keep a verbatim copy of the element.
    pub passthrough: bool,
}

impl TagEntry {
    pub const UNKNOWN: TagEntry = TagEntry {
        tag: Tag::Unknown,
        passthrough: true,
    };
}

const GARMIN_WPT_EXT: &str = "/gpx/wpt/extensions/gpxx:WaypointExtension";
const GARMIN_TRKPT_EXT: &str = "/gpx/trk/trkseg/trkpt/extensions/gpxtpx:TrackPointExtension";
const GARMIN_RTE_EXT: &str = "/gpx/rte/extensions/gpxx:RouteExtension";
const GARMIN_TRK_EXT: &str = "/gpx/trk/extensions/gpxx:TrackExtension";

const POINT_PATHS: [&str; 3] = ["/gpx/wpt", "/gpx/trk/trkseg/trkpt", "/gpx/rte/rtept"];
const HEAD_PATHS: [&str; 2] = ["/gpx/rte", "/gpx/trk"];

/// The path specifications, in the order they appear in the GPX schema.
fn path_specs() -> Vec<(Tag, bool, String)> {
    let mut specs: Vec<(Tag, bool, String)> = Vec::new();
    let mut add = |tag: Tag, passthrough: bool, path: String| specs.push((tag, passthrough, path));

    add(Tag::Gpx, false, "/gpx".into());

    // GPX 1.0 puts file info under the root, GPX 1.1 under <metadata>.
    for (tag, name) in [(Tag::Name, "name"), (Tag::Desc, "desc"), (Tag::Keywords, "keywords")] {
        add(tag, false, format!("/gpx/{name}"));
        add(tag, false, format!("/gpx/metadata/{name}"));
    }
    add(Tag::Author, false, "/gpx/author".into());
    add(Tag::Email, false, "/gpx/email".into());
    add(Tag::Url, false, "/gpx/url".into());
    add(Tag::UrlName, false, "/gpx/urlname".into());
    add(Tag::Link, false, "/gpx/metadata/link".into());
    add(Tag::LinkText, false, "/gpx/metadata/link/text".into());
    add(Tag::LinkType, false, "/gpx/metadata/link/type".into());

    add(Tag::Wpt, false, "/gpx/wpt".into());

    // Groundspeak, GPX 1.1 extension and opencaching.de spellings.
    add(Tag::Cache, true, "/gpx/wpt/groundspeak:cache".into());
    let geocache_fields = [
        (Tag::CacheName, "name"),
        (Tag::CacheContainer, "container"),
        (Tag::CacheType, "type"),
        (Tag::CacheDifficulty, "difficulty"),
        (Tag::CacheTerrain, "terrain"),
        (Tag::CacheHint, "encoded_hints"),
        (Tag::CacheHint, "hints"),
        (Tag::CacheDescShort, "short_description"),
        (Tag::CacheDescLong, "long_description"),
        (Tag::CachePlacer, "owner"),
        (Tag::CacheFavoritePoints, "favorite_points"),
        (Tag::CachePersonalNote, "personal_note"),
    ];
    for (tag, name) in geocache_fields {
        add(tag, true, format!("/gpx/wpt/groundspeak:cache/groundspeak:{name}"));
        add(tag, true, format!("/gpx/wpt/extensions/cache/{name}"));
        add(tag, true, format!("/gpx/wpt/geocache/{name}"));
    }
    for (tag, name) in [
        (Tag::CacheLogWpt, "log_wpt"),
        (Tag::CacheLogType, "type"),
        (Tag::CacheLogDate, "date"),
    ] {
        add(
            tag,
            true,
            format!("/gpx/wpt/groundspeak:cache/groundspeak:logs/groundspeak:log/groundspeak:{name}"),
        );
        add(tag, true, format!("/gpx/wpt/extensions/cache/logs/log/{name}"));
    }

    add(Tag::WptExtensions, true, "/gpx/wpt/extensions".into());

    add(Tag::GarminWptExtensions, true, GARMIN_WPT_EXT.into());
    for (tag, passthrough, rel) in [
        (Tag::GarminWptProximity, false, "gpxx:Proximity"),
        (Tag::GarminWptTemperature, false, "gpxx:Temperature"),
        (Tag::GarminWptDepth, false, "gpxx:Depth"),
        (Tag::GarminWptDisplayMode, false, "gpxx:DisplayMode"),
        (Tag::GarminWptCategories, false, "gpxx:Categories"),
        (Tag::GarminWptCategory, false, "gpxx:Categories/gpxx:Category"),
        (Tag::GarminWptAddr, false, "gpxx:Address/gpxx:StreetAddress"),
        (Tag::GarminWptCity, false, "gpxx:Address/gpxx:City"),
        (Tag::GarminWptState, false, "gpxx:Address/gpxx:State"),
        (Tag::GarminWptCountry, false, "gpxx:Address/gpxx:Country"),
        (Tag::GarminWptPostalCode, false, "gpxx:Address/gpxx:PostalCode"),
        (Tag::GarminWptPhoneNr, false, "gpxx:PhoneNumber"),
    ] {
        add(tag, passthrough, format!("{GARMIN_WPT_EXT}/{rel}"));
    }

    // Garmin namespace, but core point data.
    add(Tag::GarminWptTemperature, true, format!("{GARMIN_TRKPT_EXT}/gpxtpx:atemp"));
    add(Tag::TrkPtHeartRate, true, format!("{GARMIN_TRKPT_EXT}/gpxtpx:hr"));
    add(Tag::TrkPtCadence, true, format!("{GARMIN_TRKPT_EXT}/gpxtpx:cad"));

    // Centimetres.
    add(Tag::HumminbirdDepth, false, "/gpx/wpt/extensions/h:depth".into());
    add(Tag::HumminbirdStatus, false, "/gpx/wpt/extensions/h:status".into());
    add(Tag::HumminbirdDepth, false, "/gpx/trk/trkseg/trkpt/extensions/h:depth".into());

    add(Tag::Rte, false, "/gpx/rte".into());
    add(Tag::Trk, false, "/gpx/trk".into());
    for head in HEAD_PATHS {
        for (tag, rel) in [
            (Tag::HeadName, "name"),
            (Tag::HeadDesc, "desc"),
            (Tag::HeadUrl, "url"),
            (Tag::HeadUrlName, "urlname"),
            (Tag::HeadLink, "link"),
            (Tag::HeadLinkText, "link/text"),
            (Tag::HeadLinkType, "link/type"),
            (Tag::HeadNumber, "number"),
        ] {
            add(tag, false, format!("{head}/{rel}"));
        }
    }
    add(Tag::GarminDisplayColor, true, format!("{GARMIN_RTE_EXT}/gpxx:DisplayColor"));
    add(Tag::GarminDisplayColor, true, format!("{GARMIN_TRK_EXT}/gpxx:DisplayColor"));

    add(Tag::RtePt, false, "/gpx/rte/rtept".into());
    add(Tag::TrkSeg, false, "/gpx/trk/trkseg".into());
    add(Tag::TrkPt, false, "/gpx/trk/trkseg/trkpt".into());
    add(Tag::TrkPtCourse, false, "/gpx/trk/trkseg/trkpt/course".into());
    add(Tag::TrkPtSpeed, false, "/gpx/trk/trkseg/trkpt/speed".into());

    // Common to waypoints, track points and route points.
    for point in POINT_PATHS {
        for (tag, passthrough, rel) in [
            (Tag::PointEle, false, "ele"),
            (Tag::PointTime, false, "time"),
            (Tag::PointGeoidHeight, false, "geoidheight"),
            (Tag::PointName, false, "name"),
            (Tag::PointCmt, false, "cmt"),
            (Tag::PointDesc, false, "desc"),
            (Tag::PointUrl, false, "url"),
            (Tag::PointUrlName, false, "urlname"),
            (Tag::PointLink, false, "link"),
            (Tag::PointLinkText, false, "link/text"),
            (Tag::PointLinkType, false, "link/type"),
            (Tag::PointSym, false, "sym"),
            (Tag::PointType, true, "type"),
            (Tag::PointFix, false, "fix"),
            (Tag::PointSat, false, "sat"),
            (Tag::PointHdop, false, "hdop"),
            (Tag::PointVdop, false, "vdop"),
            (Tag::PointPdop, false, "pdop"),
        ] {
            add(tag, passthrough, format!("{point}/{rel}"));
        }
    }

    specs
}

static TAG_TABLE: Lazy<HashMap<String, TagEntry>> = Lazy::new(|| {
    path_specs()
        .into_iter()
        .map(|(tag, passthrough, path)| (path, TagEntry { tag, passthrough }))
        .collect()
});

/// Resolve a full element path. Unlisted paths are unknown and passthrough.
pub fn lookup(path: &str) -> TagEntry {
    TAG_TABLE.get(path).copied().unwrap_or(TagEntry::UNKNOWN)
}
