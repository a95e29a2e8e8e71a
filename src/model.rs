use std::fmt;

use chrono::{DateTime, Utc};

use crate::preserved::PreservedXml;
use crate::vocab::{
    FixQuality, GarminColor, GarminDisplayMode, GeocacheContainer, GeocacheType, Status,
};

/// Parsed GPX data containing all waypoints, routes, and tracks.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct GpxData {
    pub waypoints: Vec<GpxPoint>,
    pub routes: Vec<GpxRoute>,
    pub tracks: Vec<GpxRoute>,
}

impl GpxData {
    /// Every point in write order: waypoints, route points, track points.
    pub fn all_points(&self) -> impl Iterator<Item = &GpxPoint> {
        self.waypoints
            .iter()
            .chain(self.routes.iter().flat_map(|r| r.points.iter()))
            .chain(self.tracks.iter().flat_map(|t| t.points.iter()))
    }

    /// Bounding box of every point, or `None` when there are no points.
    pub fn bounds(&self) -> Option<Bounds> {
        self.all_points().fold(None, |acc, pt| {
            Some(match acc {
                None => Bounds {
                    min_lat: pt.lat,
                    min_lon: pt.lon,
                    max_lat: pt.lat,
                    max_lon: pt.lon,
                },
                Some(b) => Bounds {
                    min_lat: b.min_lat.min(pt.lat),
                    min_lon: b.min_lon.min(pt.lon),
                    max_lat: b.max_lat.max(pt.lat),
                    max_lon: b.max_lon.max(pt.lon),
                },
            })
        })
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty() && self.routes.is_empty() && self.tracks.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

/// A single GPX point (used for wpt, rtept, trkpt).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GpxPoint {
    pub lat: f64,
    pub lon: f64,
    pub ele: Option<f64>,
    pub time: Option<DateTime<Utc>>,
    pub geoid_height: Option<f64>,
    pub name: Option<String>,
    /// `<cmt>`
    pub comment: Option<String>,
    /// `<desc>`, or the geocache name
    pub description: Option<String>,
    pub sym: Option<String>,
    pub links: Vec<GpxLink>,
    pub fix: FixQuality,
    pub sat: Option<u32>,
    pub hdop: Option<f32>,
    pub vdop: Option<f32>,
    pub pdop: Option<f32>,
    /// GPX 1.0 track points only.
    pub course: Option<f64>,
    pub speed: Option<f64>,
    pub proximity: Option<f64>,
    pub temperature: Option<f64>,
    /// Metres.
    pub depth: Option<f64>,
    pub heart_rate: Option<u16>,
    pub cadence: Option<u16>,
    pub geocache: Option<Geocache>,
    pub garmin: Option<GarminWaypoint>,
    /// This track point opens a new `<trkseg>`.
    pub new_segment: bool,
    pub preserved: Option<PreservedXml>,
}

impl GpxPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat,
            lon,
            ..Self::default()
        }
    }

    pub fn geocache_mut(&mut self) -> &mut Geocache {
        self.geocache.get_or_insert_with(Geocache::default)
    }

    pub fn garmin_mut(&mut self) -> &mut GarminWaypoint {
        self.garmin.get_or_insert_with(GarminWaypoint::default)
    }

    pub fn preserved_mut(&mut self) -> &mut PreservedXml {
        self.preserved.get_or_insert_with(PreservedXml::default)
    }

    pub fn add_link(&mut self, link: GpxLink) {
        self.links.push(link);
    }
}

/// A GPX link element, or a GPX 1.0 url/urlname pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GpxLink {
    pub href: String,
    pub text: Option<String>,
    pub link_type: Option<String>,
}

impl GpxLink {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            text: None,
            link_type: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.href.is_empty()
    }
}

/// A GPX route (`<rte>`) or track (`<trk>`) head and its points.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GpxRoute {
    pub name: Option<String>,
    pub desc: Option<String>,
    pub links: Vec<GpxLink>,
    pub number: Option<u32>,
    pub line_color: Option<GarminColor>,
    pub points: Vec<GpxPoint>,
    pub preserved: Option<PreservedXml>,
}

impl GpxRoute {
    pub fn preserved_mut(&mut self) -> &mut PreservedXml {
        self.preserved.get_or_insert_with(PreservedXml::default)
    }

    /// Track points grouped by `new_segment` markers. A leading run without
    /// a marker still forms a segment.
    pub fn segments(&self) -> Vec<&[GpxPoint]> {
        let mut segments = Vec::new();
        let mut start = 0;
        for (i, pt) in self.points.iter().enumerate() {
            if pt.new_segment && i > start {
                segments.push(&self.points[start..i]);
                start = i;
            }
        }
        if start < self.points.len() {
            segments.push(&self.points[start..]);
        }
        segments
    }
}

/// Difficulty or terrain rating stored in tenths, so "3.5" is 35.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Rating(pub u8);

impl Rating {
    /// Lenient: unparsable text is a zero rating.
    pub fn parse(text: &str) -> Self {
        let value: f64 = text.trim().parse().unwrap_or(0.0);
        Rating((value * 10.0).round().clamp(0.0, f64::from(u8::MAX)) as u8)
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 % 10 {
            0 => write!(f, "{}", self.0 / 10),
            tenths => write!(f, "{}.{}", self.0 / 10, tenths),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheDescription {
    pub text: String,
    pub is_html: bool,
}

/// Geocache details attached to a waypoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Geocache {
    pub id: i64,
    pub available: Status,
    pub archived: Status,
    pub cache_type: GeocacheType,
    pub container: GeocacheContainer,
    pub difficulty: Rating,
    pub terrain: Rating,
    pub short_description: CacheDescription,
    pub long_description: CacheDescription,
    pub hint: Option<String>,
    pub placer: Option<String>,
    pub placer_id: i64,
    pub last_found: Option<DateTime<Utc>>,
    pub favorite_points: u32,
    pub personal_note: Option<String>,
    /// When the cache record was exported; written inside a preserved
    /// `groundspeak:cache` element. Never read from GPX input, callers set
    /// it before writing.
    pub exported: Option<DateTime<Utc>>,
}

/// Fields from `gpxx:WaypointExtension` that have no core point field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GarminWaypoint {
    pub display_mode: Option<GarminDisplayMode>,
    pub categories: Vec<String>,
    pub street_address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub phone_number: Option<String>,
}

impl GarminWaypoint {
    pub fn has_address(&self) -> bool {
        self.street_address.is_some()
            || self.city.is_some()
            || self.state.is_some()
            || self.country.is_some()
            || self.postal_code.is_some()
    }
}
