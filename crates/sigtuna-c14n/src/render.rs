#![forbid(unsafe_code)]

//! The canonical renderer shared by all modes.
//!
//! Namespace emission is the only mode-dependent part: the inclusive
//! family (1.0, 1.1, physical) emits every in-scope declaration the
//! output does not already carry, the exclusive family emits only
//! visibly utilized ones. Attribute ordering, escaping, and document
//! subset handling are identical across modes.

use crate::{escape, C14nMode};
use sigtuna_core::Error;
use sigtuna_xml::NodeSet;
use std::collections::{BTreeMap, BTreeSet};

const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

pub(crate) fn render(
    doc: &roxmltree::Document<'_>,
    mode: C14nMode,
    node_set: Option<&NodeSet>,
) -> Result<Vec<u8>, Error> {
    let mut renderer = Renderer {
        mode,
        node_set,
        out: Vec::new(),
    };
    renderer.node(doc.root(), &BTreeMap::new())?;
    Ok(renderer.out)
}

struct Renderer<'a> {
    mode: C14nMode,
    node_set: Option<&'a NodeSet>,
    /// Canonical output bytes.
    out: Vec<u8>,
}

impl Renderer<'_> {
    fn visible(&self, node: roxmltree::Node<'_, '_>) -> bool {
        self.node_set.is_none_or(|set| set.contains(node))
    }

    fn node(
        &mut self,
        node: roxmltree::Node<'_, '_>,
        env: &BTreeMap<String, String>,
    ) -> Result<(), Error> {
        match node.node_type() {
            roxmltree::NodeType::Root => {
                for child in node.children() {
                    self.node(child, env)?;
                }
            }
            roxmltree::NodeType::Element => self.element(node, env)?,
            roxmltree::NodeType::Text => {
                if self.visible(node) {
                    let text = escape::escape_text(node.text().unwrap_or(""));
                    self.out.extend_from_slice(text.as_bytes());
                }
            }
            roxmltree::NodeType::Comment => {
                if self.mode.with_comments() && self.visible(node) {
                    self.doc_level_break(node, true);
                    self.out.extend_from_slice(b"<!--");
                    self.out
                        .extend_from_slice(node.text().unwrap_or("").as_bytes());
                    self.out.extend_from_slice(b"-->");
                    self.doc_level_break(node, false);
                }
            }
            roxmltree::NodeType::PI => {
                if self.visible(node) {
                    let pi = match node.pi() {
                        Some(pi) => pi,
                        None => return Ok(()),
                    };
                    self.doc_level_break(node, true);
                    self.out.extend_from_slice(b"<?");
                    self.out.extend_from_slice(pi.target.as_bytes());
                    if let Some(value) = pi.value {
                        if !value.is_empty() {
                            self.out.push(b' ');
                            self.out
                                .extend_from_slice(escape::escape_pi(value).as_bytes());
                        }
                    }
                    self.out.extend_from_slice(b"?>");
                    self.doc_level_break(node, false);
                }
            }
        }
        Ok(())
    }

    /// Comments and PIs outside the document element are separated from
    /// it by a line feed, per the C14N spec.
    fn doc_level_break(&mut self, node: roxmltree::Node<'_, '_>, before: bool) {
        let at_doc_level = node
            .parent()
            .is_some_and(|p| p.node_type() == roxmltree::NodeType::Root);
        if !at_doc_level {
            return;
        }
        let needs_break = if before {
            node.prev_siblings().any(|s| s.is_element())
        } else {
            node.next_siblings().any(|s| s.is_element())
        };
        if needs_break {
            self.out.push(b'\n');
        }
    }

    fn element(
        &mut self,
        node: roxmltree::Node<'_, '_>,
        env: &BTreeMap<String, String>,
    ) -> Result<(), Error> {
        if !self.visible(node) {
            // Document subset: an omitted element is replaced by its
            // visible children.
            for child in node.children() {
                self.node(child, env)?;
            }
            return Ok(());
        }

        let inscope = inscope_namespaces(node);

        let local = node.tag_name().name();
        let (qname, elem_prefix) = match node.tag_name().namespace() {
            None => (local.to_owned(), None),
            Some(uri) if inscope.get("").map(String::as_str) == Some(uri) => {
                (local.to_owned(), Some(String::new()))
            }
            Some(XML_NS) => (format!("xml:{local}"), Some("xml".to_owned())),
            Some(uri) => match prefix_for(&inscope, uri) {
                Some(p) => (format!("{p}:{local}"), Some(p)),
                None => (local.to_owned(), None),
            },
        };

        let mut attrs: Vec<Attr> = Vec::new();
        let mut attr_prefixes: BTreeSet<String> = BTreeSet::new();
        for attr in node.attributes() {
            let (ns_uri, attr_qname) = match attr.namespace() {
                None => (String::new(), attr.name().to_owned()),
                Some(XML_NS) => (XML_NS.to_owned(), format!("xml:{}", attr.name())),
                Some(uri) => {
                    let prefix = prefix_for(&inscope, uri).ok_or_else(|| {
                        Error::Canonicalization(format!(
                            "no prefix in scope for attribute namespace {uri}"
                        ))
                    })?;
                    attr_prefixes.insert(prefix.clone());
                    (uri.to_owned(), format!("{prefix}:{}", attr.name()))
                }
            };
            attrs.push(Attr {
                ns_uri,
                local: attr.name().to_owned(),
                qname: attr_qname,
                value: attr.value().to_owned(),
            });
        }
        attrs.sort_by(|a, b| (&a.ns_uri, &a.local).cmp(&(&b.ns_uri, &b.local)));

        let decls = self.namespace_decls(node, env, &inscope, elem_prefix.as_deref(), &attr_prefixes);

        self.out.push(b'<');
        self.out.extend_from_slice(qname.as_bytes());
        for (prefix, uri) in &decls {
            let rendered = if prefix.is_empty() {
                format!(" xmlns=\"{}\"", escape::escape_attr(uri))
            } else {
                format!(" xmlns:{prefix}=\"{}\"", escape::escape_attr(uri))
            };
            self.out.extend_from_slice(rendered.as_bytes());
        }
        for attr in &attrs {
            let rendered = format!(" {}=\"{}\"", attr.qname, escape::escape_attr(&attr.value));
            self.out.extend_from_slice(rendered.as_bytes());
        }
        self.out.push(b'>');

        let mut child_env = env.clone();
        for (prefix, uri) in &decls {
            child_env.insert(prefix.clone(), uri.clone());
        }
        for child in node.children() {
            self.node(child, &child_env)?;
        }

        self.out.extend_from_slice(b"</");
        self.out.extend_from_slice(qname.as_bytes());
        self.out.push(b'>');
        Ok(())
    }

    /// Select the namespace declarations to emit on this element, sorted
    /// by prefix (default namespace first).
    fn namespace_decls(
        &self,
        node: roxmltree::Node<'_, '_>,
        env: &BTreeMap<String, String>,
        inscope: &BTreeMap<String, String>,
        elem_prefix: Option<&str>,
        attr_prefixes: &BTreeSet<String>,
    ) -> Vec<(String, String)> {
        let mut decls: Vec<(String, String)> = Vec::new();

        if self.mode.is_exclusive() {
            let mut utilized: BTreeSet<&str> = attr_prefixes
                .iter()
                .map(String::as_str)
                .collect();
            if let Some(p) = elem_prefix {
                utilized.insert(p);
            }
            for prefix in utilized {
                if prefix == "xml" {
                    continue;
                }
                if let Some(uri) = inscope.get(prefix) {
                    if env.get(prefix) != Some(uri) {
                        decls.push((prefix.to_owned(), uri.clone()));
                    }
                }
            }
            // Undeclare an output default namespace the element does not use.
            let default_active = env.get("").is_some_and(|u| !u.is_empty());
            if default_active && node.tag_name().namespace().is_none() {
                decls.push((String::new(), String::new()));
            }
        } else {
            for (prefix, uri) in inscope {
                if prefix == "xml" {
                    continue;
                }
                if env.get(prefix) != Some(uri) {
                    decls.push((prefix.clone(), uri.clone()));
                }
            }
            let default_active = env.get("").is_some_and(|u| !u.is_empty());
            if default_active && !inscope.contains_key("") {
                decls.push((String::new(), String::new()));
            }
        }

        decls.sort();
        decls
    }
}

struct Attr {
    ns_uri: String,
    local: String,
    qname: String,
    value: String,
}

/// Collect all in-scope namespace bindings for an element, nearest
/// declaration winning. An empty-URI binding undeclares its prefix.
fn inscope_namespaces(node: roxmltree::Node<'_, '_>) -> BTreeMap<String, String> {
    let mut chain: Vec<roxmltree::Node<'_, '_>> = Vec::new();
    let mut current = Some(node);
    while let Some(n) = current {
        if n.is_element() {
            chain.push(n);
        }
        current = n.parent();
    }

    let mut result = BTreeMap::new();
    for n in chain.into_iter().rev() {
        for ns in n.namespaces() {
            let prefix = ns.name().unwrap_or("").to_owned();
            if ns.uri().is_empty() {
                result.remove(&prefix);
            } else {
                result.insert(prefix, ns.uri().to_owned());
            }
        }
    }
    result
}

/// Find a non-empty prefix bound to `uri`, preferring the
/// lexicographically smallest when several are.
fn prefix_for(inscope: &BTreeMap<String, String>, uri: &str) -> Option<String> {
    inscope
        .iter()
        .find(|(prefix, bound)| !prefix.is_empty() && bound.as_str() == uri)
        .map(|(prefix, _)| prefix.clone())
}
