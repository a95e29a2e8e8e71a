use indexmap::IndexSet;

use crate::model::GpxLink;

/// File-level information gathered from every document read in a session.
///
/// All GPX 1.0 global fields allow a single occurrence, but several input
/// files may be merged, so each field keeps every distinct value in the
/// order it was first seen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlobalMetadata {
    pub name: IndexSet<String>,
    pub desc: IndexSet<String>,
    pub author: IndexSet<String>,
    pub email: IndexSet<String>,
    pub url: IndexSet<String>,
    pub urlname: IndexSet<String>,
    pub keywords: IndexSet<String>,
    pub links: Vec<GpxLink>,
}

/// Which [`GlobalMetadata`] list a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaField {
    Name,
    Desc,
    Author,
    Email,
    Url,
    UrlName,
    Keywords,
}

impl GlobalMetadata {
    /// Record `value` unless it is empty or already present.
    pub fn add(&mut self, field: MetaField, value: &str) {
        if value.is_empty() {
            return;
        }
        let list = self.field_mut(field);
        if !list.contains(value) {
            list.insert(value.to_string());
        }
    }

    pub fn add_link(&mut self, link: GpxLink) {
        self.links.push(link);
    }

    pub fn field(&self, field: MetaField) -> &IndexSet<String> {
        match field {
            MetaField::Name => &self.name,
            MetaField::Desc => &self.desc,
            MetaField::Author => &self.author,
            MetaField::Email => &self.email,
            MetaField::Url => &self.url,
            MetaField::UrlName => &self.urlname,
            MetaField::Keywords => &self.keywords,
        }
    }

    fn field_mut(&mut self, field: MetaField) -> &mut IndexSet<String> {
        match field {
            MetaField::Name => &mut self.name,
            MetaField::Desc => &mut self.desc,
            MetaField::Author => &mut self.author,
            MetaField::Email => &mut self.email,
            MetaField::Url => &mut self.url,
            MetaField::UrlName => &mut self.urlname,
            MetaField::Keywords => &mut self.keywords,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
