//! HTML entity escaping.
//!
//! Escaping covers the five characters with special meaning in markup.
//! Unescaping resolves the XML predefined entities, the full HTML5 named
//! entity table, and decimal/hex character references. An unknown entity
//! fails the whole input.

use quick_xml::escape::{escape as xml_escape, unescape as xml_unescape};

use crate::error::{ConvertError, Format};

/// Escape `&`, `<`, `>`, `"`, and `'`.
pub fn escape(input: &str) -> String {
    xml_escape(input).into_owned()
}

/// Resolve entity and character references in `input`.
pub fn unescape(input: &str) -> Result<String, ConvertError> {
    // Built with `escape-html`, so the HTML5 named entities resolve too.
    xml_unescape(input)
        .map(|s| s.into_owned())
        .map_err(|e| ConvertError::parse(Format::HtmlEntities, e))
}
