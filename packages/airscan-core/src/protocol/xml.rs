//! Namespaced element lookup shared by the eSCL parsers.

use crate::error::{EsclError, Result};
use roxmltree::Node;
use std::str::FromStr;

/// eSCL schema namespace (`scan:` / `escl:` prefix)
pub const SCAN_NS: &str = "http://schemas.hp.com/imaging/escl/2011/05/03";

/// PWG semantic model namespace (`pwg:` prefix)
pub const PWG_NS: &str = "http://www.pwg.org/schemas/2010/12/sm";

/// All descendant elements with the given qualified name, in document order.
pub(crate) fn descendants<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    ns: &'static str,
    name: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.descendants().filter(move |n| n.has_tag_name((ns, name)))
}

/// First descendant element with the given qualified name.
pub(crate) fn find<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    ns: &'static str,
    name: &'static str,
) -> Option<Node<'a, 'input>> {
    descendants(node, ns, name).next()
}

/// Direct child element with the given qualified name.
pub(crate) fn child<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    ns: &'static str,
    name: &'static str,
) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.has_tag_name((ns, name)))
}

/// Trimmed text of an element, empty when the element has no text.
pub(crate) fn text<'a>(node: Node<'a, '_>) -> &'a str {
    node.text().map(str::trim).unwrap_or("")
}

/// Parse the text of an element as a number.
pub(crate) fn number<T: FromStr>(node: Node<'_, '_>) -> Result<T> {
    parse_number(text(node), node.tag_name().name())
}

/// Parse raw element text taken from `<field>` as a number.
pub(crate) fn parse_number<T: FromStr>(raw: &str, field: &str) -> Result<T> {
    let raw = raw.trim();
    raw.parse().map_err(|_| {
        EsclError::malformed(format!("expected a number in <{}>, found {:?}", field, raw))
    })
}

/// Parse the first descendant `name` as a number, failing when it is absent.
pub(crate) fn required_number<T: FromStr>(
    node: Node<'_, '_>,
    ns: &'static str,
    name: &'static str,
) -> Result<T> {
    let element =
        find(node, ns, name).ok_or_else(|| EsclError::malformed(format!("missing <{}>", name)))?;
    number(element)
}

/// Escape text for embedding in an XML element body.
pub(crate) fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_namespace_qualified() {
        let body = format!(
            r#"<root xmlns:scan="{}" xmlns:other="urn:other">
                <other:Width>1</other:Width>
                <scan:Width> 42 </scan:Width>
            </root>"#,
            SCAN_NS
        );
        let doc = roxmltree::Document::parse(&body).unwrap();

        let width: u32 = required_number(doc.root_element(), SCAN_NS, "Width").unwrap();
        assert_eq!(width, 42);
        assert!(find(doc.root_element(), PWG_NS, "Width").is_none());
    }

    #[test]
    fn test_number_rejects_garbage() {
        let doc = roxmltree::Document::parse("<Age>soon</Age>").unwrap();
        let err = number::<u64>(doc.root_element()).unwrap_err();
        assert!(matches!(err, EsclError::MalformedResponse(_)));
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("image/jpeg"), "image/jpeg");
        assert_eq!(escape("a<b>&\"c'"), "a&lt;b&gt;&amp;&quot;c&apos;");
    }
}
