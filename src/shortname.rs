use std::collections::HashSet;

use crate::model::GpxPoint;

/// Generates unique, length-limited point names.
///
/// One namer is used per output section, so a waypoint and a route point may
/// end up with the same name but two waypoints never do.
#[derive(Debug)]
pub struct ShortNamer {
    length: usize,
    whitespace_ok: bool,
    issued: HashSet<String>,
}

impl ShortNamer {
    pub fn new(length: usize, whitespace_ok: bool) -> Self {
        Self {
            length: length.max(1),
            whitespace_ok,
            issued: HashSet::new(),
        }
    }

    /// Name for `point`, built from its comment, then its name, then a
    /// generic "WPT". Collisions get a numeric suffix within the length.
    pub fn generate(&mut self, point: &GpxPoint) -> String {
        let source = [point.comment.as_deref(), point.name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|s| !s.is_empty())
            .unwrap_or("WPT");

        let cleaned: String = if self.whitespace_ok {
            source.to_string()
        } else {
            source.chars().filter(|c| !c.is_whitespace()).collect()
        };
        let base: String = cleaned.chars().take(self.length).collect();

        let mut candidate = base.clone();
        let mut counter = 1u32;
        while self.issued.contains(&candidate) {
            let suffix = counter.to_string();
            let keep = self.length.saturating_sub(suffix.len());
            candidate = base.chars().take(keep).chain(suffix.chars()).collect();
            counter += 1;
        }
        self.issued.insert(candidate.clone());
        candidate
    }
}
