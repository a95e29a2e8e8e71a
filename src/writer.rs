use chrono::{DateTime, Utc};
use indexmap::IndexSet;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::error::{GpxError, Result};
use crate::model::*;
use crate::options::GpxOptions;
use crate::preserved::{NodeId, PreservedXml};
use crate::session::{GpxSession, GpxVersion};
use crate::shortname::ShortNamer;
use crate::time::format_time;
use crate::vocab::GarminColor;

const CREATOR: &str = concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION"));

const HUMMINBIRD_NS: &str = "http://humminbird.com";
const GARMIN_GPX_EXTENSIONS_NS: &str = "http://www.garmin.com/xmlschemas/GpxExtensions/v3";
const GARMIN_TRACK_POINT_NS: &str = "http://www.garmin.com/xmlschemas/TrackPointExtension/v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PointKind {
    Waypoint,
    RoutePoint,
    TrackPoint,
}

impl PointKind {
    fn element(self) -> &'static str {
        match self {
            PointKind::Waypoint => "wpt",
            PointKind::RoutePoint => "rtept",
            PointKind::TrackPoint => "trkpt",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeadKind {
    Route,
    Track,
}

/// Pick the output version: an explicit `gpxver` wins, then the highest
/// version read, then 1.0. Either vendor toggle forces 1.1.
pub(crate) fn output_version(session: &GpxSession) -> Result<GpxVersion> {
    let options = session.options();
    let version = match options.gpxver.as_deref() {
        Some(text) => {
            GpxVersion::parse(text).ok_or_else(|| GpxError::InvalidVersion(text.to_string()))?
        }
        None => session.detected_version().unwrap_or(GpxVersion::V1_0),
    };
    if options.vendor_extensions() {
        return Ok(GpxVersion::V1_1);
    }
    Ok(version)
}

/// Serialize the whole session as one GPX document.
pub(crate) fn write_gpx(session: &GpxSession, now: DateTime<Utc>) -> Result<String> {
    let version = output_version(session)?;
    log::debug!(
        "writing GPX {version}: {} waypoints, {} routes, {} tracks",
        session.data.waypoints.len(),
        session.data.routes.len(),
        session.data.tracks.len()
    );

    let mut writer = GpxWriter::new(session, version);
    writer.write_document(now)?;
    writer.finish()
}

fn coord(value: f64) -> String {
    format!("{value:.9}")
}

fn decimal(value: f64) -> String {
    format!("{value:.6}")
}

struct GpxWriter<'a> {
    xml: Writer<Vec<u8>>,
    session: &'a GpxSession,
    options: &'a GpxOptions,
    version: GpxVersion,
}

impl<'a> GpxWriter<'a> {
    fn new(session: &'a GpxSession, version: GpxVersion) -> Self {
        Self {
            xml: Writer::new_with_indent(Vec::new(), b' ', 2),
            session,
            options: session.options(),
            version,
        }
    }

    fn finish(self) -> Result<String> {
        Ok(String::from_utf8(self.xml.into_inner())?)
    }

    fn namer(&self) -> ShortNamer {
        ShortNamer::new(self.options.snlen, !self.options.suppresswhite)
    }

    // ---- low-level helpers ----

    fn start(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<()> {
        let mut elem = BytesStart::new(name);
        for &attr in attributes {
            elem.push_attribute(attr);
        }
        self.xml.write_event(Event::Start(elem))?;
        Ok(())
    }

    fn end(&mut self, name: &str) -> Result<()> {
        self.xml.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    fn text(&mut self, text: &str) -> Result<()> {
        self.xml.write_event(Event::Text(BytesText::new(text)))?;
        Ok(())
    }

    fn text_element(&mut self, name: &str, text: &str) -> Result<()> {
        self.start(name, &[])?;
        self.text(text)?;
        self.end(name)
    }

    /// Skips missing and empty values.
    fn optional_text_element(&mut self, name: &str, text: Option<&str>) -> Result<()> {
        match text {
            Some(text) if !text.is_empty() => self.text_element(name, text),
            _ => Ok(()),
        }
    }

    // ---- document ----

    fn write_document(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.xml
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let version = self.version.to_string();
        let namespace = self.version.namespace();
        let mut root = BytesStart::new("gpx");
        root.push_attribute(("version", version.as_str()));
        root.push_attribute(("creator", CREATOR));
        root.push_attribute(("xmlns", namespace.as_str()));
        if self.options.vendor_extensions() {
            if self.options.humminbirdextensions {
                root.push_attribute(("xmlns:h", HUMMINBIRD_NS));
            }
            if self.options.garminextensions {
                root.push_attribute(("xmlns:gpxx", GARMIN_GPX_EXTENSIONS_NS));
                root.push_attribute(("xmlns:gpxtpx", GARMIN_TRACK_POINT_NS));
            }
        } else {
            let session = self.session;
            for (attribute, uri) in session.namespaces() {
                root.push_attribute((attribute.as_str(), uri.as_str()));
            }
        }
        self.xml.write_event(Event::Start(root))?;

        self.write_metadata(now)?;
        self.write_waypoints()?;
        self.write_routes()?;
        self.write_tracks()?;

        self.end("gpx")
    }

    // ---- metadata ----

    fn write_metadata(&mut self, now: DateTime<Utc>) -> Result<()> {
        let session = self.session;
        let meta = &session.metadata;
        let wrapped = self.version.has_metadata_element();

        if wrapped {
            self.start("metadata", &[])?;
        }
        self.write_global(&meta.name, "name", false)?;
        self.write_global(&meta.desc, "desc", false)?;
        if wrapped {
            for link in &meta.links {
                self.write_link(link)?;
            }
        } else {
            // GPX 1.1 has a structured author and no email/url/urlname.
            self.write_global(&meta.author, "author", false)?;
            self.write_global(&meta.email, "email", true)?;
            self.write_global(&meta.url, "url", true)?;
            self.write_global(&meta.urlname, "urlname", false)?;
        }
        self.text_element("time", &format_time(&now))?;
        self.write_global(&meta.keywords, "keywords", false)?;
        self.write_bounds()?;
        if wrapped {
            self.end("metadata")?;
        }
        Ok(())
    }

    /// The schema allows each of these once, so all values gathered from
    /// every input go into a single element.
    fn write_global(&mut self, values: &IndexSet<String>, name: &str, first_only: bool) -> Result<()> {
        if values.is_empty() {
            return Ok(());
        }
        self.start(name, &[])?;
        for value in values {
            self.text(value)?;
            if first_only {
                break;
            }
        }
        self.end(name)
    }

    fn write_bounds(&mut self) -> Result<()> {
        let Some(bounds) = self.session.data.bounds() else {
            return Ok(());
        };
        let (min_lat, min_lon) = (coord(bounds.min_lat), coord(bounds.min_lon));
        let (max_lat, max_lon) = (coord(bounds.max_lat), coord(bounds.max_lon));
        let mut elem = BytesStart::new("bounds");
        elem.push_attribute(("minlat", min_lat.as_str()));
        elem.push_attribute(("minlon", min_lon.as_str()));
        elem.push_attribute(("maxlat", max_lat.as_str()));
        elem.push_attribute(("maxlon", max_lon.as_str()));
        self.xml.write_event(Event::Empty(elem))?;
        Ok(())
    }

    // ---- links ----

    fn write_link(&mut self, link: &GpxLink) -> Result<()> {
        self.start("link", &[("href", link.href.as_str())])?;
        self.optional_text_element("text", link.text.as_deref())?;
        self.optional_text_element("type", link.link_type.as_deref())?;
        self.end("link")
    }

    /// GPX 1.1 writes every link; GPX 1.0 only has room for one url.
    fn write_links(&mut self, links: &[GpxLink]) -> Result<()> {
        if self.version.has_metadata_element() {
            for link in links.iter().filter(|l| !l.is_empty()) {
                self.write_link(link)?;
            }
        } else if let Some(link) = links.first().filter(|l| !l.is_empty()) {
            let base = self.options.urlbase.as_deref().unwrap_or_default();
            self.text_element("url", &format!("{base}{}", link.href))?;
            self.optional_text_element("urlname", link.text.as_deref())?;
        }
        Ok(())
    }

    // ---- points ----

    fn write_waypoints(&mut self) -> Result<()> {
        let session = self.session;
        let mut namer = self.namer();
        for wpt in &session.data.waypoints {
            self.write_point(wpt, PointKind::Waypoint, &mut namer)?;
        }
        Ok(())
    }

    fn write_point(&mut self, pt: &GpxPoint, kind: PointKind, namer: &mut ShortNamer) -> Result<()> {
        let element = kind.element();
        let (lat, lon) = (coord(pt.lat), coord(pt.lon));
        self.start(element, &[("lat", lat.as_str()), ("lon", lon.as_str())])?;

        if let Some(ele) = pt.ele {
            let precision = self.options.elevprec;
            self.text_element("ele", &format!("{ele:.precision$}"))?;
        }
        if let Some(time) = &pt.time {
            self.text_element("time", &format_time(time))?;
        }
        // Only GPX 1.0 track points have course and speed.
        if kind == PointKind::TrackPoint && self.version == GpxVersion::V1_0 {
            if let Some(course) = pt.course {
                self.text_element("course", &decimal(course))?;
            }
            if let Some(speed) = pt.speed {
                self.text_element("speed", &decimal(speed))?;
            }
        }
        if let Some(height) = pt.geoid_height {
            self.text_element("geoidheight", &format!("{height:.1}"))?;
        }

        let name = if self.options.synthesize_shortnames {
            Some(namer.generate(pt))
        } else {
            pt.name.clone()
        };
        self.optional_text_element("name", name.as_deref())?;
        self.optional_text_element("cmt", pt.comment.as_deref())?;
        let desc = pt
            .description
            .as_deref()
            .filter(|d| !d.is_empty())
            .or(pt.comment.as_deref());
        self.optional_text_element("desc", desc)?;
        self.write_links(&pt.links)?;
        self.optional_text_element("sym", pt.sym.as_deref())?;

        if let Some(fix) = pt.fix.as_gpx() {
            self.text_element("fix", fix)?;
        }
        if let Some(sat) = pt.sat.filter(|&sat| sat > 0) {
            self.text_element("sat", &sat.to_string())?;
        }
        for (tag, dop) in [("hdop", pt.hdop), ("vdop", pt.vdop), ("pdop", pt.pdop)] {
            if let Some(dop) = dop.filter(|&d| d != 0.0) {
                self.text_element(tag, &decimal(f64::from(dop)))?;
            }
        }

        self.write_point_extensions(pt, kind)?;
        self.end(element)
    }

    fn write_point_extensions(&mut self, pt: &GpxPoint, kind: PointKind) -> Result<()> {
        if self.options.vendor_extensions() {
            return self.write_vendor_extensions(pt, kind);
        }
        // Garmin waypoint data is regenerated from the model and replaces
        // whatever was preserved. GPX 1.0 has no extensions element.
        if kind == PointKind::Waypoint && pt.garmin.is_some() {
            if self.version.has_metadata_element() {
                self.write_garmin_waypoint(pt)?;
            }
            return Ok(());
        }
        if let Some(tree) = &pt.preserved {
            let exported = pt.geocache.as_ref().and_then(|gc| gc.exported);
            self.write_preserved(tree, exported)?;
        }
        Ok(())
    }

    fn write_vendor_extensions(&mut self, pt: &GpxPoint, kind: PointKind) -> Result<()> {
        let heart_rate = pt.heart_rate.filter(|&hr| hr != 0);
        let cadence = pt.cadence.filter(|&cad| cad != 0);
        let humminbird =
            self.options.humminbirdextensions && (pt.depth.is_some() || pt.temperature.is_some());
        let garmin = self.options.garminextensions
            && match kind {
                PointKind::Waypoint => {
                    pt.proximity.is_some() || pt.temperature.is_some() || pt.depth.is_some()
                }
                PointKind::TrackPoint => {
                    pt.temperature.is_some()
                        || pt.depth.is_some()
                        || heart_rate.is_some()
                        || cadence.is_some()
                }
                PointKind::RoutePoint => false,
            };
        if !humminbird && !garmin {
            return Ok(());
        }

        self.start("extensions", &[])?;
        if self.options.humminbirdextensions {
            // Centimetres.
            if let Some(depth) = pt.depth {
                self.text_element("h:depth", &decimal(depth * 100.0))?;
            }
            if let Some(temperature) = pt.temperature {
                self.text_element("h:temperature", &decimal(temperature))?;
            }
        }
        if garmin {
            match kind {
                PointKind::Waypoint => {
                    self.start("gpxx:WaypointExtension", &[])?;
                    self.write_garmin_measurements(pt)?;
                    self.end("gpxx:WaypointExtension")?;
                }
                PointKind::TrackPoint => {
                    self.start("gpxtpx:TrackPointExtension", &[])?;
                    if let Some(temperature) = pt.temperature {
                        self.text_element("gpxtpx:atemp", &decimal(temperature))?;
                    }
                    if let Some(depth) = pt.depth {
                        self.text_element("gpxtpx:depth", &decimal(depth))?;
                    }
                    if let Some(hr) = heart_rate {
                        self.text_element("gpxtpx:hr", &hr.to_string())?;
                    }
                    if let Some(cad) = cadence {
                        self.text_element("gpxtpx:cad", &cad.to_string())?;
                    }
                    self.end("gpxtpx:TrackPointExtension")?;
                }
                PointKind::RoutePoint => {}
            }
        }
        self.end("extensions")
    }

    fn write_garmin_measurements(&mut self, pt: &GpxPoint) -> Result<()> {
        if let Some(proximity) = pt.proximity {
            self.text_element("gpxx:Proximity", &decimal(proximity))?;
        }
        if let Some(temperature) = pt.temperature {
            self.text_element("gpxx:Temperature", &decimal(temperature))?;
        }
        if let Some(depth) = pt.depth {
            self.text_element("gpxx:Depth", &decimal(depth))?;
        }
        Ok(())
    }

    fn write_garmin_waypoint(&mut self, pt: &GpxPoint) -> Result<()> {
        let Some(garmin) = &pt.garmin else {
            return Ok(());
        };
        self.start("extensions", &[])?;
        self.start("gpxx:WaypointExtension", &[("xmlns:gpxx", GARMIN_GPX_EXTENSIONS_NS)])?;
        self.write_garmin_measurements(pt)?;
        if let Some(mode) = garmin.display_mode {
            self.text_element("gpxx:DisplayMode", mode.name())?;
        }
        if !garmin.categories.is_empty() {
            self.start("gpxx:Categories", &[])?;
            for category in &garmin.categories {
                self.text_element("gpxx:Category", category)?;
            }
            self.end("gpxx:Categories")?;
        }
        if garmin.has_address() {
            self.start("gpxx:Address", &[])?;
            self.optional_text_element("gpxx:StreetAddress", garmin.street_address.as_deref())?;
            self.optional_text_element("gpxx:City", garmin.city.as_deref())?;
            self.optional_text_element("gpxx:State", garmin.state.as_deref())?;
            self.optional_text_element("gpxx:Country", garmin.country.as_deref())?;
            self.optional_text_element("gpxx:PostalCode", garmin.postal_code.as_deref())?;
            self.end("gpxx:Address")?;
        }
        self.optional_text_element("gpxx:PhoneNumber", garmin.phone_number.as_deref())?;
        self.end("gpxx:WaypointExtension")?;
        self.end("extensions")
    }

    // ---- preserved XML ----

    fn write_preserved(&mut self, tree: &PreservedXml, exported: Option<DateTime<Utc>>) -> Result<()> {
        for &id in tree.roots() {
            self.write_preserved_node(tree, id, exported)?;
        }
        Ok(())
    }

    fn write_preserved_node(
        &mut self,
        tree: &PreservedXml,
        id: NodeId,
        exported: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let node = tree.node(id);
        let mut elem = BytesStart::new(node.name.as_str());
        for (key, value) in &node.attributes {
            elem.push_attribute((key.as_str(), value.as_str()));
        }

        if node.text.is_empty() && node.children.is_empty() {
            self.xml.write_event(Event::Empty(elem))?;
        } else {
            self.xml.write_event(Event::Start(elem))?;
            if !node.text.is_empty() {
                self.text(&node.text)?;
            }
            for &child in &node.children {
                self.write_preserved_node(tree, child, exported)?;
            }
            if let Some(time) = exported.filter(|_| node.name == "groundspeak:cache") {
                self.text_element("time", &format_time(&time))?;
            }
            self.end(&node.name)?;
        }

        if !node.tail.is_empty() {
            self.text(&node.tail)?;
        }
        Ok(())
    }

    // ---- routes and tracks ----

    fn write_routes(&mut self) -> Result<()> {
        let session = self.session;
        let mut namer = self.namer();
        for rte in &session.data.routes {
            self.start("rte", &[])?;
            self.write_head(rte, HeadKind::Route)?;
            for pt in &rte.points {
                self.write_point(pt, PointKind::RoutePoint, &mut namer)?;
            }
            self.end("rte")?;
        }
        Ok(())
    }

    fn write_tracks(&mut self) -> Result<()> {
        let session = self.session;
        let mut namer = self.namer();
        for trk in &session.data.tracks {
            self.start("trk", &[])?;
            self.write_head(trk, HeadKind::Track)?;
            for segment in trk.segments() {
                self.start("trkseg", &[])?;
                for pt in segment {
                    self.write_point(pt, PointKind::TrackPoint, &mut namer)?;
                }
                self.end("trkseg")?;
            }
            self.end("trk")?;
        }
        Ok(())
    }

    fn write_head(&mut self, head: &GpxRoute, kind: HeadKind) -> Result<()> {
        self.optional_text_element("name", head.name.as_deref())?;
        self.optional_text_element("desc", head.desc.as_deref())?;
        self.write_links(&head.links)?;
        if let Some(number) = head.number.filter(|&n| n != 0) {
            self.text_element("number", &number.to_string())?;
        }

        if !self.version.has_metadata_element() {
            return Ok(());
        }
        if !self.options.vendor_extensions() {
            if let Some(tree) = &head.preserved {
                self.write_preserved(tree, None)?;
            }
            return Ok(());
        }
        if !self.options.garminextensions {
            return Ok(());
        }
        // Black sits at colour index 0 and is never written.
        let Some(color) = head
            .line_color
            .filter(|&c| c != GarminColor::Black && c.bbggrr().is_some())
        else {
            return Ok(());
        };

        self.start("extensions", &[])?;
        match kind {
            HeadKind::Route => {
                self.start("gpxx:RouteExtension", &[])?;
                let auto_named = head.name.as_deref().is_none_or(str::is_empty);
                self.text_element("gpxx:IsAutoNamed", if auto_named { "true" } else { "false" })?;
                self.text_element("gpxx:DisplayColor", color.name())?;
                self.end("gpxx:RouteExtension")?;
            }
            HeadKind::Track => {
                self.start("gpxx:TrackExtension", &[])?;
                self.text_element("gpxx:DisplayColor", color.name())?;
                self.end("gpxx:TrackExtension")?;
            }
        }
        self.end("extensions")
    }
}
