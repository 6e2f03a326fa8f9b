#![forbid(unsafe_code)]

//! Minimal XPath subset for policy filter transforms.
//!
//! Supports the location-path shapes that appear in XAdES policy filter
//! expressions:
//! - absolute and relative paths: `/Policy/Rules`, `Rules/Rule`
//! - the descendant axis: `//Secret`, `/Policy//Note`
//! - the `*` name test; name tests match on local name (prefixes are
//!   accepted and ignored)
//! - predicates: `[3]` (position), `[@name]`, `[@name='value']`
//!
//! Anything outside this subset fails with `Error::XPath` rather than
//! silently matching nothing.

use sigtuna_core::Error;

/// A parsed XPath expression.
#[derive(Debug, Clone)]
pub struct XPathExpr {
    steps: Vec<Step>,
}

#[derive(Debug, Clone)]
struct Step {
    axis: Axis,
    test: NameTest,
    predicates: Vec<Predicate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    Descendant,
}

#[derive(Debug, Clone)]
enum NameTest {
    Any,
    Local(String),
}

#[derive(Debug, Clone)]
enum Predicate {
    Position(usize),
    AttrExists(String),
    AttrEquals(String, String),
}

impl XPathExpr {
    /// Parse an expression, rejecting unsupported syntax.
    pub fn parse(expr: &str) -> Result<Self, Error> {
        let expr = expr.trim();
        if expr.is_empty() {
            return Err(Error::XPath("empty expression".into()));
        }

        let mut rest = expr;
        let mut axis = Axis::Child;
        if let Some(stripped) = rest.strip_prefix("//") {
            axis = Axis::Descendant;
            rest = stripped;
        } else if let Some(stripped) = rest.strip_prefix('/') {
            rest = stripped;
        }

        let mut steps = Vec::new();
        for (seg_axis, segment) in split_steps(rest, axis)? {
            steps.push(parse_step(segment, seg_axis)?);
        }
        if steps.is_empty() {
            return Err(Error::XPath(format!("no steps in expression: {expr}")));
        }
        Ok(Self { steps })
    }

    /// Evaluate against a document; returns matched element nodes in
    /// document order, without duplicates.
    pub fn evaluate<'a, 'input>(
        &self,
        doc: &'a roxmltree::Document<'input>,
    ) -> Vec<roxmltree::Node<'a, 'input>> {
        let mut contexts: Vec<roxmltree::Node<'a, 'input>> = vec![doc.root()];

        for step in &self.steps {
            let mut next: Vec<roxmltree::Node<'a, 'input>> = Vec::new();
            let mut seen = std::collections::HashSet::new();

            for ctx in &contexts {
                let candidates: Vec<roxmltree::Node<'a, 'input>> = match step.axis {
                    Axis::Child => ctx
                        .children()
                        .filter(|n| n.is_element() && step.test.matches(n))
                        .collect(),
                    Axis::Descendant => ctx
                        .descendants()
                        .filter(|n| {
                            n.id() != ctx.id() && n.is_element() && step.test.matches(n)
                        })
                        .collect(),
                };

                for (pos, node) in candidates.iter().enumerate() {
                    if step.predicates.iter().all(|p| p.holds(node, pos + 1))
                        && seen.insert(node.id().get_usize())
                    {
                        next.push(*node);
                    }
                }
            }

            next.sort_by_key(|n| n.id().get_usize());
            contexts = next;
        }

        contexts
    }
}

impl NameTest {
    fn matches(&self, node: &roxmltree::Node<'_, '_>) -> bool {
        match self {
            NameTest::Any => true,
            NameTest::Local(name) => node.tag_name().name() == name,
        }
    }
}

impl Predicate {
    fn holds(&self, node: &roxmltree::Node<'_, '_>, position: usize) -> bool {
        match self {
            Predicate::Position(n) => position == *n,
            Predicate::AttrExists(name) => node.attribute(name.as_str()).is_some(),
            Predicate::AttrEquals(name, value) => {
                node.attribute(name.as_str()) == Some(value.as_str())
            }
        }
    }
}

/// Split the path into (axis, step-text) pairs, honoring `//` separators
/// and ignoring `/` inside predicate brackets.
fn split_steps(path: &str, first_axis: Axis) -> Result<Vec<(Axis, &str)>, Error> {
    let mut result = Vec::new();
    let mut axis = first_axis;
    let mut start = 0;
    let mut depth = 0usize;
    let bytes = path.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'[' => depth += 1,
            b']' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| Error::XPath(format!("unbalanced ']' in: {path}")))?;
            }
            b'/' if depth == 0 => {
                result.push((axis, &path[start..i]));
                if bytes.get(i + 1) == Some(&b'/') {
                    axis = Axis::Descendant;
                    i += 1;
                } else {
                    axis = Axis::Child;
                }
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    if depth != 0 {
        return Err(Error::XPath(format!("unbalanced '[' in: {path}")));
    }
    result.push((axis, &path[start..]));
    Ok(result)
}

fn parse_step(segment: &str, axis: Axis) -> Result<Step, Error> {
    let segment = segment.trim();
    let (test_text, pred_text) = match segment.find('[') {
        Some(idx) => (&segment[..idx], &segment[idx..]),
        None => (segment, ""),
    };
    let test_text = test_text.trim();

    let test = if test_text == "*" {
        NameTest::Any
    } else if is_qname(test_text) {
        // Prefix-qualified tests match on the local part.
        let local = test_text.rsplit(':').next().unwrap_or(test_text);
        NameTest::Local(local.to_owned())
    } else {
        return Err(Error::XPath(format!("unsupported step: {segment}")));
    };

    let mut predicates = Vec::new();
    let mut rest = pred_text.trim();
    while let Some(stripped) = rest.strip_prefix('[') {
        let end = stripped
            .find(']')
            .ok_or_else(|| Error::XPath(format!("unterminated predicate in: {segment}")))?;
        predicates.push(parse_predicate(stripped[..end].trim())?);
        rest = stripped[end + 1..].trim();
    }
    if !rest.is_empty() {
        return Err(Error::XPath(format!("trailing content in step: {segment}")));
    }

    Ok(Step {
        axis,
        test,
        predicates,
    })
}

fn parse_predicate(text: &str) -> Result<Predicate, Error> {
    if text.chars().all(|c| c.is_ascii_digit()) && !text.is_empty() {
        let n: usize = text
            .parse()
            .map_err(|_| Error::XPath(format!("invalid position predicate: {text}")))?;
        if n == 0 {
            return Err(Error::XPath("position predicate must be >= 1".into()));
        }
        return Ok(Predicate::Position(n));
    }

    let attr = text
        .strip_prefix('@')
        .ok_or_else(|| Error::XPath(format!("unsupported predicate: {text}")))?;

    match attr.find('=') {
        None => {
            if is_qname(attr) {
                Ok(Predicate::AttrExists(attr.to_owned()))
            } else {
                Err(Error::XPath(format!("unsupported predicate: {text}")))
            }
        }
        Some(idx) => {
            let name = attr[..idx].trim();
            let value = attr[idx + 1..].trim();
            let value = value
                .strip_prefix('\'')
                .and_then(|v| v.strip_suffix('\''))
                .or_else(|| value.strip_prefix('"').and_then(|v| v.strip_suffix('"')))
                .ok_or_else(|| Error::XPath(format!("unquoted predicate value: {text}")))?;
            if !is_qname(name) {
                return Err(Error::XPath(format!("unsupported predicate: {text}")));
            }
            Ok(Predicate::AttrEquals(name.to_owned(), value.to_owned()))
        }
    }
}

fn is_qname(s: &str) -> bool {
    s.starts_with(|c: char| c.is_alphabetic() || c == '_')
        && s.chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(nodes: &[roxmltree::Node<'_, '_>]) -> Vec<String> {
        nodes
            .iter()
            .map(|n| n.tag_name().name().to_owned())
            .collect()
    }

    #[test]
    fn absolute_child_path() {
        let doc = roxmltree::Document::parse("<a><b><c/></b><c/></a>").unwrap();
        let expr = XPathExpr::parse("/a/b/c").unwrap();
        let hits = expr.evaluate(&doc);
        assert_eq!(names(&hits), ["c"]);
        assert_eq!(hits[0].parent().unwrap().tag_name().name(), "b");
    }

    #[test]
    fn descendant_axis_finds_all() {
        let doc = roxmltree::Document::parse("<a><b><c/></b><c/></a>").unwrap();
        let expr = XPathExpr::parse("//c").unwrap();
        assert_eq!(expr.evaluate(&doc).len(), 2);
    }

    #[test]
    fn wildcard_and_positional() {
        let doc = roxmltree::Document::parse("<a><x/><y/><z/></a>").unwrap();
        assert_eq!(XPathExpr::parse("/a/*").unwrap().evaluate(&doc).len(), 3);
        let second = XPathExpr::parse("/a/*[2]").unwrap().evaluate(&doc);
        assert_eq!(names(&second), ["y"]);
    }

    #[test]
    fn attribute_predicates() {
        let doc =
            roxmltree::Document::parse(r#"<a><r id="1"/><r id="2"/><r/></a>"#).unwrap();
        let with_id = XPathExpr::parse("//r[@id]").unwrap().evaluate(&doc);
        assert_eq!(with_id.len(), 2);
        let two = XPathExpr::parse("//r[@id='2']").unwrap().evaluate(&doc);
        assert_eq!(two.len(), 1);
        assert_eq!(two[0].attribute("id"), Some("2"));
    }

    #[test]
    fn prefixed_test_matches_local_name() {
        let doc = roxmltree::Document::parse(
            r#"<a xmlns:p="http://p"><p:b/></a>"#,
        )
        .unwrap();
        let hits = XPathExpr::parse("//p:b").unwrap().evaluate(&doc);
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn zero_matches_is_empty() {
        let doc = roxmltree::Document::parse("<a><b/></a>").unwrap();
        assert!(XPathExpr::parse("//missing").unwrap().evaluate(&doc).is_empty());
    }

    #[test]
    fn unsupported_syntax_is_rejected() {
        assert!(XPathExpr::parse("").is_err());
        assert!(XPathExpr::parse("//a[contains(text(),'x')]").is_err());
        assert!(XPathExpr::parse("..").is_err());
        assert!(XPathExpr::parse("//a[").is_err());
    }
}
