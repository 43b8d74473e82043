//! Repository catalog (`addons.xml`) generation.
//!
//! The catalog wraps every add-on's root element, verbatim and in submission
//! order, inside a single `<addons>` document.

use crate::metadata::{Descriptor, PackageMetadata};

/// File name of the catalog in staging and in the published repository.
pub const CATALOG_FILE_NAME: &str = "addons.xml";

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// Ordered collection of add-on descriptors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    entries: Vec<Descriptor>,
}

impl Catalog {
    /// Build a catalog from metadata, keeping iteration order.
    pub fn from_metadata<'a, I>(metadata: I) -> Self
    where
        I: IntoIterator<Item = &'a PackageMetadata>,
    {
        Self {
            entries: metadata
                .into_iter()
                .map(|m| m.descriptor.clone())
                .collect(),
        }
    }

    /// Number of descriptors in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the catalog lists no add-ons.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize the catalog as an XML document.
    ///
    /// # Examples
    ///
    /// ```
    /// use kodi_repo_common::catalog::Catalog;
    /// use kodi_repo_common::metadata::parse_descriptor;
    ///
    /// let a = parse_descriptor(r#"<addon id="a" version="1.0.0"/>"#)?;
    /// let b = parse_descriptor(r#"<addon id="b" version="2.0.0"/>"#)?;
    /// let xml = Catalog::from_metadata([&a, &b]).render();
    /// assert!(xml.find("id=\"a\"") < xml.find("id=\"b\""));
    /// assert!(xml.ends_with("</addons>\n"));
    /// # Ok::<(), kodi_repo_common::error::ValidationError>(())
    /// ```
    #[must_use]
    pub fn render(&self) -> String {
        let body = self
            .entries
            .iter()
            .map(|descriptor| format!("{}\n", descriptor.as_str()))
            .collect::<Vec<_>>()
            .join("\n");
        format!("{XML_DECLARATION}\n<addons>\n{body}</addons>\n")
    }

    /// Serialize the catalog to UTF-8 bytes.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.render().into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::parse_descriptor;

    fn metadata(id: &str) -> PackageMetadata {
        parse_descriptor(&format!(
            "<addon id=\"{id}\" version=\"1.0.0\">\n  <summary>{id}</summary>\n</addon>"
        ))
        .expect("valid descriptor")
    }

    #[test]
    fn empty_catalog_is_an_empty_addons_element() {
        let xml = Catalog::default().render();
        assert_eq!(xml, format!("{XML_DECLARATION}\n<addons>\n</addons>\n"));
    }

    #[test]
    fn render_starts_with_declaration() {
        let xml = Catalog::from_metadata([&metadata("a")]).render();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\""));
    }

    #[test]
    fn entries_keep_submission_order() {
        let (c, a, b) = (metadata("c"), metadata("a"), metadata("b"));
        let xml = Catalog::from_metadata([&c, &a, &b]).render();

        let positions: Vec<usize> = ["id=\"c\"", "id=\"a\"", "id=\"b\""]
            .iter()
            .map(|needle| xml.find(needle).expect("entry present"))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{xml}");
    }

    #[test]
    fn entries_are_separated_by_blank_lines() {
        let (a, b) = (metadata("a"), metadata("b"));
        let xml = Catalog::from_metadata([&a, &b]).render();
        assert!(xml.contains("</addon>\n\n<addon id=\"b\""));
    }

    #[test]
    fn rendered_catalog_is_well_formed() {
        let (a, b) = (metadata("a"), metadata("b"));
        let xml = Catalog::from_metadata([&a, &b]).render();
        let document = roxmltree::Document::parse(&xml).expect("catalog parses");
        let ids: Vec<&str> = document
            .root_element()
            .children()
            .filter(roxmltree::Node::is_element)
            .filter_map(|n| n.attribute("id"))
            .collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[test]
    fn len_counts_listed_add_ons() {
        let z = metadata("z");
        let catalog = Catalog::from_metadata([&z]);
        assert_eq!(catalog.len(), 1);
        assert!(!catalog.is_empty());
        assert!(Catalog::default().is_empty());
    }
}
