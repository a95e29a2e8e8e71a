use std::fmt;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::metadata::GlobalMetadata;
use crate::model::GpxData;
use crate::options::GpxOptions;
use crate::{parser, writer};

/// A GPX schema version such as 1.0 or 1.1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct GpxVersion {
    major: u8,
    minor: u8,
}

impl GpxVersion {
    pub const V1_0: GpxVersion = GpxVersion { major: 1, minor: 0 };
    pub const V1_1: GpxVersion = GpxVersion { major: 1, minor: 1 };

    /// Parse "M.m" (or a bare "M"). Versions that compare as zero are
    /// rejected.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let (major, minor) = text.split_once('.').unwrap_or((text, "0"));
        let version = GpxVersion {
            major: major.parse().ok()?,
            minor: minor.parse().ok()?,
        };
        (version.number() > 0 && version.minor < 10).then_some(version)
    }

    /// major * 10 + minor, the form versions are compared in.
    pub fn number(self) -> u32 {
        u32::from(self.major) * 10 + u32::from(self.minor)
    }

    /// GPX 1.1 and later: `<metadata>`, `<link>`, no `<url>`.
    pub fn has_metadata_element(self) -> bool {
        self.number() > 10
    }

    pub fn namespace(self) -> String {
        format!("http://www.topografix.com/GPX/{}/{}", self.major, self.minor)
    }
}

impl fmt::Display for GpxVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// One conversion run: every document read into it is merged into a single
/// model, metadata set and detected version, which are then written out.
#[derive(Debug, Default)]
pub struct GpxSession {
    pub data: GpxData,
    pub metadata: GlobalMetadata,
    options: GpxOptions,
    version: Option<GpxVersion>,
    namespaces: Vec<(String, String)>,
}

impl GpxSession {
    pub fn new(options: GpxOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> &GpxOptions {
        &self.options
    }

    /// Parse one GPX document and merge it into the session. `file` is only
    /// used in error messages.
    pub fn read(&mut self, file: &str, xml: &str) -> Result<()> {
        parser::parse_into(self, file, xml)
    }

    /// Highest version declared by any document read so far.
    pub fn detected_version(&self) -> Option<GpxVersion> {
        self.version
    }

    pub(crate) fn observe_version(&mut self, version: GpxVersion) {
        if self.version.is_none_or(|seen| seen.number() < version.number()) {
            log::debug!("input declares GPX {version}");
            self.version = Some(version);
        }
    }

    /// Prefixed namespace declarations from the input roots, first
    /// declaration of each prefix kept.
    pub fn namespaces(&self) -> &[(String, String)] {
        &self.namespaces
    }

    pub(crate) fn declare_namespace(&mut self, attribute: &str, uri: &str) {
        if !self.namespaces.iter().any(|(a, _)| a == attribute) {
            self.namespaces.push((attribute.to_string(), uri.to_string()));
        }
    }

    /// Serialize everything read so far, stamping the metadata with the
    /// current time.
    pub fn write(&self) -> Result<String> {
        self.write_at(Utc::now())
    }

    pub fn write_at(&self, now: DateTime<Utc>) -> Result<String> {
        writer::write_gpx(self, now)
    }

    /// Forget all documents read, keeping the options.
    pub fn reset(&mut self) {
        self.data = GpxData::default();
        self.metadata.clear();
        self.version = None;
        self.namespaces.clear();
    }
}
