use serde::Deserialize;

/// Options controlling how GPX documents are read and written.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GpxOptions {
    /// Length of generated shortnames (default: 32)
    pub snlen: usize,

    /// No whitespace in generated shortnames (default: false)
    pub suppresswhite: bool,

    /// Create waypoints from geocache log entries (default: false)
    pub logpoint: bool,

    /// Base URL prepended to GPX 1.0 `<url>` output
    pub urlbase: Option<String>,

    /// Target GPX version for output, e.g. "1.0" or "1.1"
    pub gpxver: Option<String>,

    /// Add depth and temperature as Humminbird extensions (forces GPX 1.1)
    pub humminbirdextensions: bool,

    /// Add proximity, temperature, depth, heart rate, cadence and display
    /// colour as Garmin extensions (forces GPX 1.1)
    pub garminextensions: bool,

    /// Number of decimals written for elevations (default: 3)
    pub elevprec: usize,

    /// Run point names through the shortname generator on output
    pub synthesize_shortnames: bool,
}

impl Default for GpxOptions {
    fn default() -> Self {
        Self {
            snlen: 32,
            suppresswhite: false,
            logpoint: false,
            urlbase: None,
            gpxver: None,
            humminbirdextensions: false,
            garminextensions: false,
            elevprec: 3,
            synthesize_shortnames: false,
        }
    }
}

impl GpxOptions {
    /// True when either vendor extension set replaces preserved extensions.
    pub fn vendor_extensions(&self) -> bool {
        self.humminbirdextensions || self.garminextensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = GpxOptions::default();
        assert_eq!(opts.snlen, 32);
        assert_eq!(opts.elevprec, 3);
        assert!(!opts.vendor_extensions());
        assert!(opts.gpxver.is_none());
    }

    #[test]
    fn test_partial_options_keep_defaults() {
        let opts: GpxOptions =
            serde_json::from_str(r#"{"gpxver": "1.1", "garminextensions": true}"#).unwrap();
        assert_eq!(opts.gpxver.as_deref(), Some("1.1"));
        assert!(opts.garminextensions);
        assert!(opts.vendor_extensions());
        assert_eq!(opts.snlen, 32);
        assert_eq!(opts.elevprec, 3);
    }

    #[test]
    fn test_camel_case_names() {
        let opts: GpxOptions =
            serde_json::from_str(r#"{"synthesizeShortnames": true, "snlen": 6, "urlbase": "http://x/"}"#)
                .unwrap();
        assert!(opts.synthesize_shortnames);
        assert_eq!(opts.snlen, 6);
        assert_eq!(opts.urlbase.as_deref(), Some("http://x/"));
    }
}
