use chrono::{DateTime, Utc};
use quick_xml::events::{BytesRef, BytesStart, Event};
use quick_xml::Reader;

use crate::error::{line_column, GpxError, Result};
use crate::metadata::MetaField;
use crate::model::*;
use crate::options::GpxOptions;
use crate::preserved::{NodeId, PreservedXml};
use crate::session::{GpxSession, GpxVersion};
use crate::tags::{self, Tag};
use crate::time::parse_time;
use crate::vocab::{FixQuality, GarminColor, GarminDisplayMode, GeocacheContainer, GeocacheType, Status};

type Attributes = Vec<(String, String)>;

/// Parse a single GPX document into GpxData with default options.
pub fn parse_gpx(xml: &str) -> Result<GpxData> {
    let mut session = GpxSession::new(GpxOptions::default());
    session.read("<input>", xml)?;
    Ok(session.data)
}

/// Stream `xml` through the tag state machine, merging its contents into
/// `session`. Any tokenizer error aborts the whole document.
pub(crate) fn parse_into(session: &mut GpxSession, file: &str, xml: &str) -> Result<()> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().expand_empty_elements = true;

    let mut ctx = ParseContext::new(session);
    let mut saw_root = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                saw_root = true;
                let (name, attributes) = element_parts(&e)
                    .map_err(|err| fatal(file, xml, reader.buffer_position() as usize, err))?;
                ctx.start_element(name, attributes);
            }
            Ok(Event::End(_)) => ctx.end_element(),
            Ok(Event::Text(e)) => {
                ctx.characters(std::str::from_utf8(e.as_ref()).unwrap_or_default());
            }
            Ok(Event::CData(e)) => {
                ctx.characters(std::str::from_utf8(e.as_ref()).unwrap_or_default());
            }
            Ok(Event::GeneralRef(e)) => {
                if let Some(text) = resolve_reference(&e) {
                    ctx.characters(&text);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(fatal(file, xml, reader.error_position() as usize, e)),
            _ => {}
        }
    }

    if !saw_root || ctx.depth > 0 {
        let (line, column) = line_column(xml, xml.len());
        return Err(GpxError::UnexpectedEof {
            file: file.to_string(),
            line,
            column,
        });
    }

    Ok(())
}

fn fatal(file: &str, xml: &str, offset: usize, source: quick_xml::Error) -> GpxError {
    let (line, column) = line_column(xml, offset);
    GpxError::XmlParse {
        file: file.to_string(),
        line,
        column,
        source,
    }
}

/// Qualified name and unescaped attributes (namespace declarations
/// included) of a start tag, in document order.
fn element_parts(e: &BytesStart<'_>) -> std::result::Result<(String, Attributes), quick_xml::Error> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attr_result in e.attributes() {
        let attr = attr_result.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let raw = std::str::from_utf8(&attr.value).unwrap_or_default();
        let value = quick_xml::escape::unescape(raw)
            .map_err(quick_xml::Error::Escape)?
            .into_owned();
        attributes.push((key, value));
    }
    Ok((name, attributes))
}

/// Character and predefined entity references. Anything else is dropped.
fn resolve_reference(e: &BytesRef<'_>) -> Option<String> {
    if let Ok(Some(ch)) = e.resolve_char_ref() {
        return Some(ch.to_string());
    }
    let name = std::str::from_utf8(e.as_ref()).unwrap_or_default();
    let resolved = match name {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        _ => {
            log::debug!("skipping unknown entity reference &{name};");
            return None;
        }
    };
    Some(resolved.to_string())
}

fn attr<'a>(attributes: &'a [(String, String)], name: &str) -> Option<&'a str> {
    attributes
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}

fn lenient_f64(text: &str) -> f64 {
    text.trim().parse().unwrap_or_else(|_| {
        log::debug!("treating malformed number {text:?} as 0");
        0.0
    })
}

fn lenient_i64(text: &str) -> i64 {
    text.trim().parse().unwrap_or_else(|_| {
        log::debug!("treating malformed integer {text:?} as 0");
        0
    })
}

/// Where unknown elements go: the point being read, else the route or
/// track head being read.
fn preserved_target<'a>(
    point: &'a mut Option<GpxPoint>,
    head: &'a mut Option<GpxRoute>,
) -> Option<&'a mut PreservedXml> {
    match (point, head) {
        (Some(pt), _) => Some(pt.preserved_mut()),
        (None, Some(head)) => Some(head.preserved_mut()),
        (None, None) => None,
    }
}

/// State for one pass over one document.
struct ParseContext<'s> {
    session: &'s mut GpxSession,
    /// Qualified names from the root, e.g. "/gpx/wpt/name".
    path: String,
    depth: usize,
    /// Character data since the last start or end tag.
    text: String,
    point: Option<GpxPoint>,
    head: Option<GpxRoute>,
    /// Preserved nodes still open, with the depth they were opened at.
    open_nodes: Vec<(NodeId, usize)>,
    /// GPX 1.1 `<link>` being read.
    link: GpxLink,
    /// GPX 1.0 `<url>`/`<urlname>` of the current point and head.
    point_url: GpxLink,
    head_url: GpxLink,
    cache_desc_is_html: bool,
    log_date: Option<DateTime<Utc>>,
    logpoint_count: u32,
    next_trkpt_is_new_seg: bool,
}

impl<'s> ParseContext<'s> {
    fn new(session: &'s mut GpxSession) -> Self {
        Self {
            session,
            path: String::new(),
            depth: 0,
            text: String::new(),
            point: None,
            head: None,
            open_nodes: Vec::new(),
            link: GpxLink::default(),
            point_url: GpxLink::default(),
            head_url: GpxLink::default(),
            cache_desc_is_html: false,
            log_date: None,
            logpoint_count: 0,
            next_trkpt_is_new_seg: false,
        }
    }

    fn start_element(&mut self, name: String, attributes: Attributes) {
        self.text.clear();
        self.path.push('/');
        self.path.push_str(&name);
        self.depth += 1;

        let entry = tags::lookup(&self.path);
        log::trace!("<{}> {:?}", self.path, entry.tag);

        match entry.tag {
            Tag::Unknown => {
                self.start_preserved(name, attributes);
                return;
            }
            Tag::Gpx => self.tag_gpx(&attributes),
            Tag::Link | Tag::PointLink | Tag::HeadLink => {
                if let Some(href) = attr(&attributes, "href") {
                    self.link.href = href.to_string();
                }
            }
            Tag::Wpt | Tag::RtePt => self.tag_point(&attributes),
            Tag::TrkPt => {
                self.tag_point(&attributes);
                let new_segment = std::mem::take(&mut self.next_trkpt_is_new_seg);
                self.set_point(|pt| pt.new_segment = new_segment);
            }
            Tag::Rte | Tag::Trk => {
                self.head = Some(GpxRoute::default());
                self.head_url = GpxLink::default();
                self.next_trkpt_is_new_seg = false;
            }
            Tag::TrkSeg => self.next_trkpt_is_new_seg = true,
            Tag::Cache => self.tag_cache(&attributes),
            Tag::CacheLogWpt => {
                if self.session.options().logpoint {
                    self.tag_log_wpt(&attributes);
                }
            }
            Tag::CacheDescLong | Tag::CacheDescShort => {
                self.cache_desc_is_html = attr(&attributes, "html") == Some("True");
            }
            Tag::CachePlacer => {
                if let Some(id) = attr(&attributes, "id") {
                    let id = lenient_i64(id);
                    self.set_geocache(|gc| gc.placer_id = id);
                }
            }
            _ => {}
        }

        if entry.passthrough {
            self.start_preserved(name, attributes);
        }
    }

    fn end_element(&mut self) {
        let text = self.text.trim().to_string();
        let entry = tags::lookup(&self.path);
        log::trace!("</{}> {:?}", self.path, entry.tag);

        self.close_tag(entry.tag, text);
        if entry.passthrough {
            self.end_preserved();
        }

        if let Some(slash) = self.path.rfind('/') {
            self.path.truncate(slash);
        }
        self.depth = self.depth.saturating_sub(1);
        self.text.clear();
    }

    fn characters(&mut self, s: &str) {
        self.text.push_str(s);

        let Some(&(id, depth)) = self.open_nodes.last() else {
            return;
        };
        if depth != self.depth {
            return;
        }
        let trimmed = self.text.trim();
        if let Some(tree) = preserved_target(&mut self.point, &mut self.head) {
            tree.set_text(id, trimmed);
        }
    }

    fn start_preserved(&mut self, name: String, attributes: Attributes) {
        let parent = self.open_nodes.last().map(|&(id, _)| id);
        match preserved_target(&mut self.point, &mut self.head) {
            Some(tree) => {
                let id = tree.append(parent, name, attributes);
                self.open_nodes.push((id, self.depth));
            }
            None => log::debug!("dropping {}: no point, route or track owns it", self.path),
        }
    }

    fn end_preserved(&mut self) {
        if let Some(&(_, depth)) = self.open_nodes.last() {
            if depth == self.depth {
                self.open_nodes.pop();
            }
        }
    }

    fn tag_gpx(&mut self, attributes: &[(String, String)]) {
        if let Some(version) = attr(attributes, "version") {
            match GpxVersion::parse(version) {
                Some(v) => self.session.observe_version(v),
                None => log::debug!("ignoring unparsable GPX version {version:?}"),
            }
        }
        // Kept so that passed-through elements using these prefixes stay
        // valid on output.
        for (key, value) in attributes {
            if key.starts_with("xmlns:") {
                self.session.declare_namespace(key, value);
            }
        }
    }

    fn tag_point(&mut self, attributes: &[(String, String)]) {
        let lat = attr(attributes, "lat").map(lenient_f64).unwrap_or_default();
        let lon = attr(attributes, "lon").map(lenient_f64).unwrap_or_default();
        self.point = Some(GpxPoint::new(lat, lon));
        self.point_url = GpxLink::default();
        self.open_nodes.clear();
    }

    fn tag_cache(&mut self, attributes: &[(String, String)]) {
        let id = attr(attributes, "id").map(lenient_i64);
        let available = attr(attributes, "available").map(Status::from_attr);
        let archived = attr(attributes, "archived").map(Status::from_attr);
        self.set_geocache(|gc| {
            if let Some(id) = id {
                gc.id = id;
            }
            if let Some(available) = available {
                gc.available = available;
            }
            if let Some(archived) = archived {
                gc.archived = archived;
            }
        });
    }

    /// A geocache log position becomes its own waypoint, named after the
    /// cache: characters 3-6 of the parent name plus a per-cache counter.
    fn tag_log_wpt(&mut self, attributes: &[(String, String)]) {
        let Some(parent_name) = self.point.as_ref().and_then(|pt| pt.name.as_deref()) else {
            return;
        };
        if parent_name.chars().count() <= 2 {
            return;
        }
        let stem: String = parent_name.chars().skip(2).take(4).collect();
        let name = format!("{stem:<4}{:02}", self.logpoint_count);
        self.logpoint_count += 1;

        let lat = attr(attributes, "lat").map(lenient_f64).unwrap_or_default();
        let lon = attr(attributes, "lon").map(lenient_f64).unwrap_or_default();
        let mut log_point = GpxPoint::new(lat, lon);
        log_point.name = Some(name);
        self.session.data.waypoints.push(log_point);
    }

    /// Attach the pending GPX 1.0 url to the point and hand the point back.
    fn finish_point(&mut self) -> Option<GpxPoint> {
        self.open_nodes.clear();
        let url = std::mem::take(&mut self.point_url);
        let mut pt = self.point.take()?;
        if !url.is_empty() {
            pt.add_link(url);
        }
        Some(pt)
    }

    fn finish_head(&mut self) -> Option<GpxRoute> {
        let url = std::mem::take(&mut self.head_url);
        let mut head = self.head.take()?;
        if !url.is_empty() {
            head.links.push(url);
        }
        Some(head)
    }

    fn set_point(&mut self, f: impl FnOnce(&mut GpxPoint)) {
        if let Some(pt) = self.point.as_mut() {
            f(pt);
        }
    }

    fn set_head(&mut self, f: impl FnOnce(&mut GpxRoute)) {
        if let Some(head) = self.head.as_mut() {
            f(head);
        }
    }

    fn set_geocache(&mut self, f: impl FnOnce(&mut Geocache)) {
        self.set_point(|pt| f(pt.geocache_mut()));
    }

    fn set_garmin(&mut self, f: impl FnOnce(&mut GarminWaypoint)) {
        self.set_point(|pt| f(pt.garmin_mut()));
    }

    fn close_tag(&mut self, tag: Tag, text: String) {
        match tag {
            // File-global tags.
            Tag::Name => self.session.metadata.add(MetaField::Name, &text),
            Tag::Desc => self.session.metadata.add(MetaField::Desc, &text),
            Tag::Author => self.session.metadata.add(MetaField::Author, &text),
            Tag::Email => self.session.metadata.add(MetaField::Email, &text),
            Tag::Url => self.session.metadata.add(MetaField::Url, &text),
            Tag::UrlName => self.session.metadata.add(MetaField::UrlName, &text),
            Tag::Keywords => self.session.metadata.add(MetaField::Keywords, &text),
            Tag::Link => {
                let link = std::mem::take(&mut self.link);
                self.session.metadata.add_link(link);
            }
            Tag::LinkText | Tag::PointLinkText | Tag::HeadLinkText => self.link.text = Some(text),
            Tag::LinkType | Tag::PointLinkType | Tag::HeadLinkType => {
                self.link.link_type = Some(text)
            }

            // Points.
            Tag::Wpt => {
                if let Some(pt) = self.finish_point() {
                    self.session.data.waypoints.push(pt);
                }
                self.logpoint_count = 0;
            }
            Tag::RtePt | Tag::TrkPt => {
                if let Some(pt) = self.finish_point() {
                    self.set_head(|head| head.points.push(pt));
                }
            }
            Tag::PointEle => self.set_point(|pt| pt.ele = Some(lenient_f64(&text))),
            Tag::PointTime => self.set_point(|pt| pt.time = parse_time(&text)),
            Tag::PointGeoidHeight => self.set_point(|pt| pt.geoid_height = Some(lenient_f64(&text))),
            Tag::PointName => self.set_point(|pt| pt.name = Some(text)),
            Tag::PointCmt => self.set_point(|pt| pt.comment = Some(text)),
            Tag::PointDesc => self.set_point(|pt| pt.description = Some(text)),
            Tag::PointUrl => self.point_url.href = text,
            Tag::PointUrlName => self.point_url.text = Some(text),
            Tag::PointLink => {
                let link = std::mem::take(&mut self.link);
                self.set_point(|pt| pt.add_link(link));
            }
            Tag::PointSym => self.set_point(|pt| pt.sym = Some(text)),
            Tag::PointFix => self.set_point(|pt| pt.fix = FixQuality::from_gpx(&text)),
            Tag::PointSat => self.set_point(|pt| pt.sat = Some(lenient_f64(&text) as u32)),
            Tag::PointHdop => self.set_point(|pt| pt.hdop = Some(lenient_f64(&text) as f32)),
            Tag::PointVdop => self.set_point(|pt| pt.vdop = Some(lenient_f64(&text) as f32)),
            Tag::PointPdop => self.set_point(|pt| pt.pdop = Some(lenient_f64(&text) as f32)),
            Tag::TrkPtCourse => self.set_point(|pt| pt.course = Some(lenient_f64(&text))),
            Tag::TrkPtSpeed => self.set_point(|pt| pt.speed = Some(lenient_f64(&text))),
            Tag::TrkPtHeartRate => {
                self.set_point(|pt| pt.heart_rate = Some(lenient_f64(&text).round() as u16))
            }
            Tag::TrkPtCadence => {
                self.set_point(|pt| pt.cadence = Some(lenient_f64(&text).round() as u16))
            }

            // Geocaches.
            Tag::CacheName => self.set_point(|pt| pt.description = Some(text)),
            Tag::CacheContainer => {
                self.set_geocache(|gc| gc.container = GeocacheContainer::from_name(&text))
            }
            Tag::CacheType => self.set_geocache(|gc| gc.cache_type = GeocacheType::from_name(&text)),
            Tag::CacheDifficulty => self.set_geocache(|gc| gc.difficulty = Rating::parse(&text)),
            Tag::CacheTerrain => self.set_geocache(|gc| gc.terrain = Rating::parse(&text)),
            Tag::CacheHint => self.set_geocache(|gc| gc.hint = Some(text)),
            Tag::CacheDescLong => {
                let is_html = self.cache_desc_is_html;
                self.set_geocache(|gc| gc.long_description = CacheDescription { text, is_html });
            }
            Tag::CacheDescShort => {
                let is_html = self.cache_desc_is_html;
                self.set_geocache(|gc| gc.short_description = CacheDescription { text, is_html });
            }
            Tag::CachePlacer => self.set_geocache(|gc| gc.placer = Some(text)),
            Tag::CacheFavoritePoints => {
                self.set_geocache(|gc| gc.favorite_points = lenient_f64(&text) as u32)
            }
            Tag::CachePersonalNote => self.set_geocache(|gc| gc.personal_note = Some(text)),
            Tag::CacheLogDate => self.log_date = parse_time(&text),
            // The schema puts the date before the type, so a "Found it"
            // log's date is already known here. Only the first one counts.
            Tag::CacheLogType => {
                let log_date = self.log_date.take();
                if text == "Found it" {
                    self.set_geocache(|gc| {
                        if gc.last_found.is_none() {
                            gc.last_found = log_date;
                        }
                    });
                }
            }

            // Garmin and Humminbird extensions.
            Tag::GarminWptProximity => {
                self.set_point(|pt| pt.proximity = Some(lenient_f64(&text)));
                self.set_garmin(|_| {});
            }
            Tag::GarminWptTemperature => {
                self.set_point(|pt| pt.temperature = Some(lenient_f64(&text)));
                if self.path.starts_with("/gpx/wpt/") {
                    self.set_garmin(|_| {});
                }
            }
            Tag::GarminWptDepth => {
                self.set_point(|pt| pt.depth = Some(lenient_f64(&text)));
                self.set_garmin(|_| {});
            }
            Tag::GarminWptDisplayMode => {
                self.set_garmin(|g| g.display_mode = GarminDisplayMode::from_name(&text))
            }
            Tag::GarminWptCategory => self.set_garmin(|g| g.categories.push(text)),
            Tag::GarminWptAddr => self.set_garmin(|g| g.street_address = Some(text)),
            Tag::GarminWptCity => self.set_garmin(|g| g.city = Some(text)),
            Tag::GarminWptState => self.set_garmin(|g| g.state = Some(text)),
            Tag::GarminWptCountry => self.set_garmin(|g| g.country = Some(text)),
            Tag::GarminWptPostalCode => self.set_garmin(|g| g.postal_code = Some(text)),
            Tag::GarminWptPhoneNr => self.set_garmin(|g| g.phone_number = Some(text)),
            Tag::HumminbirdDepth => self.set_point(|pt| pt.depth = Some(lenient_f64(&text) / 100.0)),

            // Routes and tracks.
            Tag::Rte => {
                if let Some(head) = self.finish_head() {
                    self.session.data.routes.push(head);
                }
            }
            Tag::Trk => {
                if let Some(head) = self.finish_head() {
                    self.session.data.tracks.push(head);
                }
            }
            Tag::HeadName => self.set_head(|head| head.name = Some(text)),
            Tag::HeadDesc => self.set_head(|head| head.desc = Some(text)),
            Tag::HeadUrl => self.head_url.href = text,
            Tag::HeadUrlName => self.head_url.text = Some(text),
            Tag::HeadLink => {
                let link = std::mem::take(&mut self.link);
                self.set_head(|head| head.links.push(link));
            }
            Tag::HeadNumber => self.set_head(|head| head.number = text.parse().ok()),
            Tag::GarminDisplayColor => {
                self.set_head(|head| head.line_color = GarminColor::from_name(&text))
            }

            Tag::Unknown
            | Tag::Gpx
            | Tag::PointType
            | Tag::TrkSeg
            | Tag::Cache
            | Tag::CacheLogWpt
            | Tag::WptExtensions
            | Tag::GarminWptExtensions
            | Tag::GarminWptCategories
            | Tag::HumminbirdStatus => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_waypoint() {
        let xml = r#"<?xml version="1.0"?>
<gpx version="1.1">
  <wpt lat="35.6762" lon="139.6503"/>
</gpx>"#;
        let data = parse_gpx(xml).unwrap();
        assert_eq!(data.waypoints.len(), 1);
        assert!((data.waypoints[0].lat - 35.6762).abs() < 1e-10);
        assert!((data.waypoints[0].lon - 139.6503).abs() < 1e-10);
        assert!(data.waypoints[0].preserved.is_none());
    }

    #[test]
    fn test_waypoint_with_children() {
        let xml = r#"<?xml version="1.0"?>
<gpx version="1.1">
  <wpt lat="35.6762" lon="139.6503">
    <ele>40.5</ele>
    <time>2025-01-01T00:00:00Z</time>
    <name>Tokyo Tower</name>
    <desc>A famous landmark</desc>
    <cmt>Comment</cmt>
    <sym>Flag</sym>
    <fix>3d</fix>
    <sat>7</sat>
    <hdop>1.5</hdop>
  </wpt>
</gpx>"#;
        let data = parse_gpx(xml).unwrap();
        let pt = &data.waypoints[0];
        assert!((pt.ele.unwrap() - 40.5).abs() < 1e-10);
        assert_eq!(
            pt.time.map(|t| t.to_rfc3339()),
            Some("2025-01-01T00:00:00+00:00".to_string())
        );
        assert_eq!(pt.name.as_deref(), Some("Tokyo Tower"));
        assert_eq!(pt.description.as_deref(), Some("A famous landmark"));
        assert_eq!(pt.comment.as_deref(), Some("Comment"));
        assert_eq!(pt.sym.as_deref(), Some("Flag"));
        assert_eq!(pt.fix, FixQuality::ThreeD);
        assert_eq!(pt.sat, Some(7));
        assert_eq!(pt.hdop, Some(1.5));
    }

    #[test]
    fn test_simple_route() {
        let xml = r#"<?xml version="1.0"?>
<gpx version="1.1">
  <rte>
    <name>Test Route</name>
    <number>4</number>
    <rtept lat="35.0" lon="139.0"/>
    <rtept lat="36.0" lon="140.0"/>
    <rtept lat="37.0" lon="141.0"/>
  </rte>
</gpx>"#;
        let data = parse_gpx(xml).unwrap();
        assert_eq!(data.routes.len(), 1);
        assert_eq!(data.routes[0].name.as_deref(), Some("Test Route"));
        assert_eq!(data.routes[0].number, Some(4));
        assert_eq!(data.routes[0].points.len(), 3);
        assert!(data.waypoints.is_empty());
    }

    #[test]
    fn test_multi_segment_track() {
        let xml = r#"<?xml version="1.0"?>
<gpx version="1.1">
  <trk>
    <name>Morning Run</name>
    <trkseg>
      <trkpt lat="35.0" lon="139.0"/>
      <trkpt lat="35.001" lon="139.001"/>
    </trkseg>
    <trkseg>
      <trkpt lat="36.0" lon="140.0"/>
      <trkpt lat="36.001" lon="140.001"/>
    </trkseg>
  </trk>
</gpx>"#;
        let data = parse_gpx(xml).unwrap();
        let trk = &data.tracks[0];
        assert_eq!(trk.name.as_deref(), Some("Morning Run"));
        let flags: Vec<bool> = trk.points.iter().map(|p| p.new_segment).collect();
        assert_eq!(flags, vec![true, false, true, false]);
        assert_eq!(trk.segments().len(), 2);
    }

    #[test]
    fn test_empty_gpx() {
        let xml = r#"<?xml version="1.0"?><gpx version="1.1"></gpx>"#;
        let data = parse_gpx(xml).unwrap();
        assert!(data.is_empty());
    }

    #[test]
    fn test_unknown_child_preserved() {
        let xml = r#"<gpx version="1.0">
  <wpt lat="1.0" lon="2.0">
    <name>A</name>
    <foo bar="1">baz</foo>
  </wpt>
</gpx>"#;
        let data = parse_gpx(xml).unwrap();
        let tree = data.waypoints[0].preserved.as_ref().unwrap();
        assert_eq!(tree.roots().len(), 1);
        let foo = tree.node(tree.roots()[0]);
        assert_eq!(foo.name, "foo");
        assert_eq!(foo.attributes, vec![("bar".to_string(), "1".to_string())]);
        assert_eq!(foo.text, "baz");
        assert!(foo.children.is_empty());
    }

    #[test]
    fn test_nested_extensions_preserved_with_tails() {
        let xml = r#"<gpx version="1.1">
  <trk><trkseg>
    <trkpt lat="35.0" lon="139.0">
      <extensions>
        <gpxtpx:TrackPointExtension xmlns:gpxtpx="http://www.garmin.com/xmlschemas/TrackPointExtension/v1">
          <gpxtpx:hr>150</gpxtpx:hr>
          <gpxtpx:speed>3.2</gpxtpx:speed>
        </gpxtpx:TrackPointExtension>
        <x:a xmlns:x="urn:x">lead<x:b/>tail</x:a>
      </extensions>
    </trkpt>
  </trkseg></trk>
</gpx>"#;
        let data = parse_gpx(xml).unwrap();
        let pt = &data.tracks[0].points[0];
        assert_eq!(pt.heart_rate, Some(150));

        let tree = pt.preserved.as_ref().unwrap();
        let names: Vec<&str> = tree.walk().map(|n| n.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "extensions",
                "gpxtpx:TrackPointExtension",
                "gpxtpx:hr",
                "gpxtpx:speed",
                "x:a",
                "x:b"
            ]
        );
        let ext = tree.find("gpxtpx:TrackPointExtension").unwrap();
        assert_eq!(ext.attributes[0].0, "xmlns:gpxtpx");
        assert_eq!(tree.find("gpxtpx:hr").unwrap().text, "150");
        assert_eq!(tree.find("x:a").unwrap().text, "lead");
        assert_eq!(tree.find("x:b").unwrap().tail, "tail");
    }

    #[test]
    fn test_root_namespaces_and_version() {
        let xml = r#"<gpx xmlns="http://www.topografix.com/GPX/1/1" xmlns:gpxx="http://www.garmin.com/xmlschemas/GpxExtensions/v3" version="1.1">
  <wpt lat="35.0" lon="139.0"><name>Test</name></wpt>
</gpx>"#;
        let mut session = GpxSession::default();
        session.read("ns.gpx", xml).unwrap();
        assert_eq!(session.detected_version(), Some(GpxVersion::V1_1));
        assert_eq!(
            session.namespaces(),
            &[(
                "xmlns:gpxx".to_string(),
                "http://www.garmin.com/xmlschemas/GpxExtensions/v3".to_string()
            )]
        );
    }

    #[test]
    fn test_cdata() {
        let xml = r#"<?xml version="1.0"?>
<gpx version="1.1">
  <wpt lat="35.0" lon="139.0">
    <name><![CDATA[Test & Name]]></name>
  </wpt>
</gpx>"#;
        let data = parse_gpx(xml).unwrap();
        assert_eq!(data.waypoints[0].name.as_deref(), Some("Test & Name"));
    }

    #[test]
    fn test_xml_entities() {
        let xml = r#"<gpx version="1.1">
  <wpt lat="35.0" lon="139.0">
    <name>Caf&#233; &amp; Bar</name>
    <other note="a &lt; b"/>
  </wpt>
</gpx>"#;
        let data = parse_gpx(xml).unwrap();
        let pt = &data.waypoints[0];
        assert_eq!(pt.name.as_deref(), Some("Café & Bar"));
        let other = pt.preserved.as_ref().unwrap().find("other").unwrap();
        assert_eq!(other.attributes[0].1, "a < b");
    }

    #[test]
    fn test_link_elements() {
        let xml = r#"<gpx version="1.1">
  <metadata>
    <link href="https://example.com/file"><text>File</text></link>
  </metadata>
  <wpt lat="35.0" lon="139.0">
    <link href="https://example.com">
      <text>Example</text>
      <type>text/html</type>
    </link>
  </wpt>
  <trk><link href="https://example.com/trk"/></trk>
</gpx>"#;
        let mut session = GpxSession::default();
        session.read("links.gpx", xml).unwrap();

        let link = &session.data.waypoints[0].links[0];
        assert_eq!(link.href, "https://example.com");
        assert_eq!(link.text.as_deref(), Some("Example"));
        assert_eq!(link.link_type.as_deref(), Some("text/html"));

        assert_eq!(session.metadata.links[0].href, "https://example.com/file");
        assert_eq!(session.metadata.links[0].text.as_deref(), Some("File"));
        assert_eq!(session.data.tracks[0].links[0].href, "https://example.com/trk");
        assert_eq!(session.data.tracks[0].links[0].text, None);
    }

    #[test]
    fn test_gpx10_urls_and_course_speed() {
        let xml = r#"<gpx version="1.0">
  <url>http://file</url>
  <rte><url>http://route</url><urlname>Route page</urlname><rtept lat="1" lon="2"/></rte>
  <trk>
    <trkseg>
      <trkpt lat="35.0" lon="139.0">
        <url>http://point</url>
        <course>180.0</course>
        <speed>5.5</speed>
      </trkpt>
    </trkseg>
  </trk>
</gpx>"#;
        let mut session = GpxSession::default();
        session.read("v10.gpx", xml).unwrap();
        let data = &session.data;
        let pt = &data.tracks[0].points[0];
        assert_eq!(pt.course, Some(180.0));
        assert_eq!(pt.speed, Some(5.5));
        assert_eq!(pt.links[0].href, "http://point");
        assert_eq!(data.routes[0].links[0].href, "http://route");
        assert_eq!(data.routes[0].links[0].text.as_deref(), Some("Route page"));
        assert!(session.metadata.url.contains("http://file"));
    }

    #[test]
    fn test_lenient_numbers() {
        let xml = r#"<gpx version="1.1">
  <wpt lat="north" lon="139.0"><ele>high</ele><sat>x</sat><fix>4d</fix></wpt>
  <wpt><name>no coords</name></wpt>
</gpx>"#;
        let data = parse_gpx(xml).unwrap();
        assert_eq!(data.waypoints.len(), 2);
        let pt = &data.waypoints[0];
        assert_eq!(pt.lat, 0.0);
        assert_eq!(pt.ele, Some(0.0));
        assert_eq!(pt.sat, Some(0));
        assert_eq!(pt.fix, FixQuality::Unknown);
        assert_eq!(data.waypoints[1].lat, 0.0);
    }

    #[test]
    fn test_metadata_accumulates() {
        let xml = r#"<gpx version="1.1">
  <metadata><name>Trip</name><desc>Day one</desc><keywords>hike</keywords></metadata>
</gpx>"#;
        let mut session = GpxSession::default();
        session.read("a.gpx", xml).unwrap();
        session.read("b.gpx", xml).unwrap();
        assert_eq!(session.metadata.name.len(), 1);
        assert_eq!(session.metadata.desc.get_index(0).map(String::as_str), Some("Day one"));
        assert_eq!(session.metadata.keywords.len(), 1);
    }

    #[test]
    fn test_orphan_unknown_dropped() {
        let xml = r#"<gpx version="1.1">
  <metadata><extensions><x>1</x></extensions></metadata>
  <wpt lat="1" lon="2"/>
</gpx>"#;
        let data = parse_gpx(xml).unwrap();
        assert!(data.waypoints[0].preserved.is_none());
    }

    #[test]
    fn test_route_extensions_go_to_route() {
        let xml = r#"<gpx version="1.1">
  <rte>
    <extensions><gpxx:RouteExtension><gpxx:DisplayColor>Blue</gpxx:DisplayColor></gpxx:RouteExtension></extensions>
    <rtept lat="1" lon="2"><foo/></rtept>
  </rte>
</gpx>"#;
        let data = parse_gpx(xml).unwrap();
        let rte = &data.routes[0];
        assert_eq!(rte.line_color, Some(GarminColor::Blue));
        let tree = rte.preserved.as_ref().unwrap();
        let names: Vec<&str> = tree.walk().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["extensions", "gpxx:RouteExtension", "gpxx:DisplayColor"]);
        assert_eq!(tree.find("gpxx:DisplayColor").unwrap().text, "Blue");
        assert!(rte.points[0].preserved.as_ref().unwrap().find("foo").is_some());
    }

    #[test]
    fn test_malformed_document_is_fatal() {
        let xml = "<gpx version=\"1.1\">\n  <wpt lat=\"1\" lon=\"2\">\n  </trk>\n</gpx>";
        match parse_gpx(xml) {
            Err(GpxError::XmlParse { file, line, .. }) => {
                assert_eq!(file, "<input>");
                assert!(line >= 2);
            }
            other => panic!("expected XmlParse, got {other:?}"),
        }
    }

    #[test]
    fn test_truncated_document_is_fatal() {
        let xml = "<gpx version=\"1.1\">\n  <wpt lat=\"1\" lon=\"2\">";
        assert!(matches!(
            parse_gpx(xml),
            Err(GpxError::UnexpectedEof { .. }) | Err(GpxError::XmlParse { .. })
        ));
        assert!(matches!(parse_gpx(""), Err(GpxError::UnexpectedEof { .. })));
    }

    #[test]
    fn test_out_of_range_time_is_dropped() {
        let xml = r#"<gpx version="1.1">
  <wpt lat="1" lon="2"><time>2020-01-02T03:04:05+99999999999:00</time></wpt>
  <wpt lat="3" lon="4"><time>2020-01-02T03:04:05.9e300Z</time></wpt>
</gpx>"#;
        let data = parse_gpx(xml).unwrap();
        assert_eq!(data.waypoints.len(), 2);
        assert!(data.waypoints.iter().all(|pt| pt.time.is_none()));
    }
}
