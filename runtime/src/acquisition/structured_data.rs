//! Structured data extraction: JSON-LD, microdata, and RDFa.
//!
//! Produces a [`StructuredDataBundle`] with one ordered item list per syntax.
//! Every item is a JSON object; its `@type` is a single type name or a list
//! of type names. Microdata and RDFa types are reduced to their local name
//! (`http://schema.org/Product` becomes `Product`), so items from all three
//! syntaxes look alike to the classifiers.

use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

/// One structured-data item.
pub type TypedItem = Map<String, Value>;

/// Structured data found in one page, grouped by syntax.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StructuredDataBundle {
    #[serde(rename = "json-ld")]
    pub json_ld: Vec<TypedItem>,
    pub microdata: Vec<TypedItem>,
    pub rdfa: Vec<TypedItem>,
}

impl StructuredDataBundle {
    /// Syntaxes in fixed order: json-ld, microdata, rdfa.
    pub fn syntaxes(&self) -> [(&'static str, &[TypedItem]); 3] {
        [
            ("json-ld", self.json_ld.as_slice()),
            ("microdata", self.microdata.as_slice()),
            ("rdfa", self.rdfa.as_slice()),
        ]
    }

    pub fn is_empty(&self) -> bool {
        self.json_ld.is_empty() && self.microdata.is_empty() && self.rdfa.is_empty()
    }

    /// All `@type` names in bundle-then-item order. List-valued types
    /// contribute every entry.
    pub fn type_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        for (_, items) in self.syntaxes() {
            for item in items {
                match item.get("@type") {
                    Some(Value::String(t)) => names.push(t.as_str()),
                    Some(Value::Array(list)) => {
                        names.extend(list.iter().filter_map(Value::as_str));
                    }
                    _ => {}
                }
            }
        }
        names
    }

    /// Compact JSON for prompts.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Reduce a type IRI or prefixed name to its local part.
pub fn local_type_name(name: &str) -> &str {
    name.trim()
        .rsplit(['/', '#', ':'])
        .find(|part| !part.is_empty())
        .unwrap_or("")
}

/// Extract all structured data from `html`.
pub fn parse(html: &str, base_url: &str) -> StructuredDataBundle {
    let document = Html::parse_document(html);
    let bundle = StructuredDataBundle {
        json_ld: extract_json_ld(&document),
        microdata: extract_scoped(&document, &MICRODATA),
        rdfa: extract_scoped(&document, &RDFA),
    };
    debug!(
        base_url,
        json_ld = bundle.json_ld.len(),
        microdata = bundle.microdata.len(),
        rdfa = bundle.rdfa.len(),
        "structured data extracted"
    );
    bundle
}

fn extract_json_ld(document: &Html) -> Vec<TypedItem> {
    let Ok(sel) = Selector::parse("script") else {
        return Vec::new();
    };

    let mut items = Vec::new();
    for script in document.select(&sel) {
        let is_ld = script
            .value()
            .attr("type")
            .map(|t| t.trim().eq_ignore_ascii_case("application/ld+json"))
            .unwrap_or(false);
        if !is_ld {
            continue;
        }

        let text: String = script.text().collect();
        match serde_json::from_str::<Value>(text.trim()) {
            Ok(value) => collect_json_ld(value, &mut items),
            Err(e) => debug!("skipping invalid JSON-LD block: {e}"),
        }
    }
    items
}

fn collect_json_ld(value: Value, items: &mut Vec<TypedItem>) {
    match value {
        Value::Array(list) => {
            for v in list {
                collect_json_ld(v, items);
            }
        }
        Value::Object(mut obj) => {
            let graph = obj.remove("@graph");
            items.push(obj);
            if let Some(graph) = graph {
                collect_json_ld(graph, items);
            }
        }
        _ => {}
    }
}

/// Attribute names for an HTML-embedded syntax.
struct ScopedSyntax {
    /// Attribute that opens an item (`itemscope`, `typeof`).
    scope: &'static str,
    /// Attribute holding the type list (`itemtype`, `typeof`).
    types: &'static str,
    /// Attribute naming a property (`itemprop`, `property`).
    prop: &'static str,
    /// Attribute holding the vocabulary, copied to `@context`.
    context: &'static str,
}

const MICRODATA: ScopedSyntax = ScopedSyntax {
    scope: "itemscope",
    types: "itemtype",
    prop: "itemprop",
    context: "itemtype",
};

const RDFA: ScopedSyntax = ScopedSyntax {
    scope: "typeof",
    types: "typeof",
    prop: "property",
    context: "vocab",
};

fn extract_scoped(document: &Html, syntax: &ScopedSyntax) -> Vec<TypedItem> {
    let Ok(sel) = Selector::parse(&format!("[{}]", syntax.scope)) else {
        return Vec::new();
    };

    document
        .select(&sel)
        // Items that are a property of another item are nested, not top-level.
        .filter(|el| el.value().attr(syntax.prop).is_none())
        .map(|el| build_item(el, syntax))
        .collect()
}

fn build_item(el: ElementRef<'_>, syntax: &ScopedSyntax) -> TypedItem {
    let mut item = TypedItem::new();

    if let Some(ctx) = el.value().attr(syntax.context).and_then(vocabulary_of) {
        item.insert("@context".into(), Value::String(ctx));
    }

    let types: Vec<Value> = el
        .value()
        .attr(syntax.types)
        .unwrap_or("")
        .split_whitespace()
        .map(|t| Value::String(local_type_name(t).to_string()))
        .filter(|v| v.as_str().is_some_and(|s| !s.is_empty()))
        .collect();
    match types.len() {
        0 => {}
        1 => {
            item.insert("@type".into(), types.into_iter().next().unwrap_or(Value::Null));
        }
        _ => {
            item.insert("@type".into(), Value::Array(types));
        }
    }

    collect_properties(el, syntax, &mut item);
    item
}

fn collect_properties(scope: ElementRef<'_>, syntax: &ScopedSyntax, item: &mut TypedItem) {
    for child in scope.children().filter_map(ElementRef::wrap) {
        let opens_scope = child.value().attr(syntax.scope).is_some();

        if let Some(props) = child.value().attr(syntax.prop) {
            let value = if opens_scope {
                Value::Object(build_item(child, syntax))
            } else {
                Value::String(property_value(child))
            };
            for prop in props.split_whitespace() {
                insert_property(item, local_type_name(prop), value.clone());
            }
        }

        if !opens_scope {
            collect_properties(child, syntax, item);
        }
    }
}

fn property_value(el: ElementRef<'_>) -> String {
    let attrs = el.value();
    attrs
        .attr("content")
        .or_else(|| attrs.attr("href"))
        .or_else(|| attrs.attr("src"))
        .or_else(|| attrs.attr("datetime"))
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|| collapse_whitespace(&el.text().collect::<String>()))
}

fn insert_property(item: &mut TypedItem, key: &str, value: Value) {
    if key.is_empty() {
        return;
    }
    match item.get_mut(key) {
        Some(Value::Array(list)) => list.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            item.insert(key.to_string(), value);
        }
    }
}

fn vocabulary_of(attr: &str) -> Option<String> {
    let first = attr.split_whitespace().next()?;
    if !first.contains("://") {
        return None;
    }
    let trimmed = first.trim_end_matches('/');
    // itemtype IRIs end with the type name; vocab attributes are the base itself.
    match trimmed.rfind('/') {
        Some(idx) if trimmed[..idx].contains("://") && !trimmed[..idx].ends_with('/') => {
            Some(trimmed[..idx].to_string())
        }
        _ => Some(trimmed.to_string()),
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_type_name() {
        assert_eq!(local_type_name("Product"), "Product");
        assert_eq!(local_type_name("http://schema.org/Product"), "Product");
        assert_eq!(local_type_name("https://schema.org/Recipe/"), "Recipe");
        assert_eq!(local_type_name("schema:Event"), "Event");
    }

    #[test]
    fn test_json_ld_object_array_and_graph() {
        let html = r#"<html><head>
        <script type="application/ld+json">{"@context":"https://schema.org","@type":"Product","name":"Widget"}</script>
        <script type="application/ld+json">[{"@type":["WebPage","FAQPage"]},{"@type":"Organization"}]</script>
        <script type="application/ld+json">{"@context":"https://schema.org","@graph":[{"@type":"BreadcrumbList"}]}</script>
        <script type="application/ld+json">{ not json </script>
        </head><body></body></html>"#;

        let bundle = parse(html, "https://example.com/");
        assert_eq!(bundle.json_ld.len(), 5);
        assert_eq!(
            bundle.type_names(),
            vec!["Product", "WebPage", "FAQPage", "Organization", "BreadcrumbList"]
        );
    }

    #[test]
    fn test_microdata_top_level_and_nested() {
        let html = r#"<html><body>
        <div itemscope itemtype="http://schema.org/Product">
            <span itemprop="name">Widget</span>
            <div itemprop="offers" itemscope itemtype="http://schema.org/Offer">
                <meta itemprop="price" content="9.99">
            </div>
        </div>
        </body></html>"#;

        let bundle = parse(html, "https://example.com/");
        assert_eq!(bundle.microdata.len(), 1);
        let item = &bundle.microdata[0];
        assert_eq!(item["@type"], "Product");
        assert_eq!(item["name"], "Widget");
        assert_eq!(item["offers"]["@type"], "Offer");
        assert_eq!(item["offers"]["price"], "9.99");
        assert_eq!(bundle.type_names(), vec!["Product"]);
    }

    #[test]
    fn test_rdfa_types() {
        let html = r#"<html><body vocab="https://schema.org/">
        <div typeof="schema:Event">
            <span property="schema:name">Launch</span>
        </div>
        </body></html>"#;

        let bundle = parse(html, "https://example.com/");
        assert_eq!(bundle.rdfa.len(), 1);
        assert_eq!(bundle.rdfa[0]["@type"], "Event");
        assert_eq!(bundle.rdfa[0]["name"], "Launch");
    }

    #[test]
    fn test_empty_page() {
        let bundle = parse("<html><body><p>Hi</p></body></html>", "https://example.com/");
        assert!(bundle.is_empty());
        assert!(bundle.type_names().is_empty());
        assert_eq!(
            bundle.to_json(),
            r#"{"json-ld":[],"microdata":[],"rdfa":[]}"#
        );
    }
}
