//! Tolerant HTML fragment parsing and serialization for [`super::MemoryDocument`].
//!
//! This is not an HTML5 tree builder. It understands start/end tags, quoted
//! and bare attributes, void elements, comments, raw-text elements, and
//! entity references, which is all the editing surface ever produces or
//! receives from the host.

use std::borrow::Cow;

use smol_str::SmolStr;

/// Parsed fragment node, before it is moved into the arena.
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    Element {
        tag: SmolStr,
        attrs: Vec<(SmolStr, String)>,
        children: Vec<Fragment>,
    },
    Text(String),
}

/// Elements that never have children or an end tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Block elements whose start tag implicitly closes an open `<p>`.
const CLOSES_PARAGRAPH: &[&str] = &[
    "address", "blockquote", "div", "dl", "fieldset", "form", "h1", "h2", "h3", "h4", "h5", "h6",
    "hr", "ol", "p", "pre", "table", "ul",
];

pub fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

pub fn is_raw_text(tag: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&tag)
}

/// Parse an HTML fragment into a forest.
pub fn parse_fragment(input: &str) -> Vec<Fragment> {
    let mut parser = FragmentParser {
        input,
        pos: 0,
        stack: Vec::new(),
        roots: Vec::new(),
    };
    parser.run();
    parser.finish()
}

struct OpenElement {
    tag: SmolStr,
    attrs: Vec<(SmolStr, String)>,
    children: Vec<Fragment>,
}

struct FragmentParser<'a> {
    input: &'a str,
    pos: usize,
    stack: Vec<OpenElement>,
    roots: Vec<Fragment>,
}

impl<'a> FragmentParser<'a> {
    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn run(&mut self) {
        while self.pos < self.input.len() {
            let rest = self.rest();
            if let Some(after) = rest.strip_prefix("<!--") {
                let skip = after.find("-->").map(|i| i + 3).unwrap_or(after.len());
                self.pos += 4 + skip;
            } else if rest.starts_with("</") {
                self.end_tag();
            } else if rest.starts_with("<!") || rest.starts_with("<?") {
                let skip = rest.find('>').map(|i| i + 1).unwrap_or(rest.len());
                self.pos += skip;
            } else if rest.starts_with('<')
                && rest[1..].chars().next().is_some_and(|c| c.is_ascii_alphabetic())
            {
                self.start_tag();
            } else {
                self.text();
            }
        }
    }

    fn finish(mut self) -> Vec<Fragment> {
        while !self.stack.is_empty() {
            self.close_top();
        }
        self.roots
    }

    fn push_node(&mut self, node: Fragment) {
        let siblings = match self.stack.last_mut() {
            Some(open) => &mut open.children,
            None => &mut self.roots,
        };
        // Adjacent text merges, as the DOM would normalize it.
        if let (Fragment::Text(new), Some(Fragment::Text(prev))) = (&node, siblings.last_mut()) {
            prev.push_str(new);
            return;
        }
        siblings.push(node);
    }

    fn close_top(&mut self) {
        if let Some(open) = self.stack.pop() {
            self.push_node(Fragment::Element {
                tag: open.tag,
                attrs: open.attrs,
                children: open.children,
            });
        }
    }

    fn text(&mut self) {
        let rest = self.rest();
        // Always consume at least one char so a stray '<' makes progress.
        let first = rest.chars().next().map(char::len_utf8).unwrap_or(1);
        let end = rest[first..].find('<').map(|i| i + first).unwrap_or(rest.len());
        let raw = &rest[..end];
        self.pos += end;
        self.push_node(Fragment::Text(decode_entities(raw).into_owned()));
    }

    fn end_tag(&mut self) {
        let rest = self.rest();
        let close = rest.find('>').map(|i| i + 1).unwrap_or(rest.len());
        let name = rest[2..close]
            .trim_end_matches('>')
            .trim()
            .to_ascii_lowercase();
        self.pos += close;

        if let Some(depth) = self.stack.iter().rposition(|open| open.tag == name.as_str()) {
            while self.stack.len() > depth {
                self.close_top();
            }
        }
        // Unmatched end tags are ignored.
    }

    fn start_tag(&mut self) {
        self.pos += 1;
        let name_len = self
            .rest()
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-'))
            .unwrap_or(self.rest().len());
        let tag = SmolStr::new(self.rest()[..name_len].to_ascii_lowercase());
        self.pos += name_len;

        let mut attrs: Vec<(SmolStr, String)> = Vec::new();
        let mut self_closing = false;

        loop {
            self.skip_whitespace();
            let rest = self.rest();
            if rest.is_empty() {
                break;
            }
            if rest.starts_with("/>") {
                self.pos += 2;
                self_closing = true;
                break;
            }
            if rest.starts_with('>') {
                self.pos += 1;
                break;
            }
            if rest.starts_with('/') {
                self.pos += 1;
                continue;
            }

            let name_len = rest
                .find(|c: char| c.is_whitespace() || c == '=' || c == '>' || c == '/')
                .unwrap_or(rest.len())
                .max(1);
            let name = SmolStr::new(rest[..name_len].to_ascii_lowercase());
            self.pos += name_len;
            self.skip_whitespace();

            let value = if self.rest().starts_with('=') {
                self.pos += 1;
                self.skip_whitespace();
                self.attribute_value()
            } else {
                String::new()
            };

            // First occurrence wins, as in the HTML tokenizer.
            if !attrs.iter().any(|(n, _)| *n == name) {
                attrs.push((name, value));
            }
        }

        if CLOSES_PARAGRAPH.contains(&tag.as_str())
            && self.stack.last().is_some_and(|open| open.tag == "p")
        {
            self.close_top();
        }

        if is_void(&tag) || self_closing {
            self.push_node(Fragment::Element {
                tag,
                attrs,
                children: Vec::new(),
            });
            return;
        }

        if is_raw_text(&tag) {
            let rest = self.rest();
            let closing = format!("</{}", tag);
            let end = rest.to_ascii_lowercase().find(&closing).unwrap_or(rest.len());
            let body = rest[..end].to_string();
            self.pos += end;
            let after = self.rest();
            self.pos += after.find('>').map(|i| i + 1).unwrap_or(after.len());
            let children = if body.is_empty() {
                Vec::new()
            } else {
                vec![Fragment::Text(body)]
            };
            self.push_node(Fragment::Element {
                tag,
                attrs,
                children,
            });
            return;
        }

        self.stack.push(OpenElement {
            tag,
            attrs,
            children: Vec::new(),
        });
    }

    fn attribute_value(&mut self) -> String {
        let rest = self.rest();
        match rest.chars().next() {
            Some(quote @ ('"' | '\'')) => {
                let body = &rest[1..];
                let end = body.find(quote).unwrap_or(body.len());
                let value = decode_entities(&body[..end]).into_owned();
                self.pos += 1 + end + usize::from(end < body.len());
                value
            }
            _ => {
                let end = rest
                    .find(|c: char| c.is_whitespace() || c == '>')
                    .unwrap_or(rest.len());
                let value = decode_entities(&rest[..end]).into_owned();
                self.pos += end;
                value
            }
        }
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        let trimmed = rest.trim_start();
        self.pos += rest.len() - trimmed.len();
    }
}

fn decode_entities(raw: &str) -> Cow<'_, str> {
    if raw.contains('&') {
        html_escape::decode_html_entities(raw)
    } else {
        Cow::Borrowed(raw)
    }
}

/// Escape a text node the way `innerHTML` serializes it.
pub fn escape_text(text: &str, out: &mut String) {
    let encoded = html_escape::encode_text(text);
    if encoded.contains('\u{00A0}') {
        out.push_str(&encoded.replace('\u{00A0}', "&nbsp;"));
    } else {
        out.push_str(&encoded);
    }
}

/// Escape a double-quoted attribute value.
pub fn escape_attribute(value: &str, out: &mut String) {
    let encoded = html_escape::encode_double_quoted_attribute(value);
    if encoded.contains('\u{00A0}') {
        out.push_str(&encoded.replace('\u{00A0}', "&nbsp;"));
    } else {
        out.push_str(&encoded);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn el(tag: &str, attrs: &[(&str, &str)], children: Vec<Fragment>) -> Fragment {
        Fragment::Element {
            tag: tag.into(),
            attrs: attrs
                .iter()
                .map(|(n, v)| (SmolStr::new(n), v.to_string()))
                .collect(),
            children,
        }
    }

    fn text(s: &str) -> Fragment {
        Fragment::Text(s.to_string())
    }

    #[test]
    fn test_nested_elements_and_text() {
        let parsed = parse_fragment("<p>hello <b>world</b></p>");
        assert_eq!(
            parsed,
            vec![el(
                "p",
                &[],
                vec![text("hello "), el("b", &[], vec![text("world")])]
            )]
        );
    }

    #[test]
    fn test_attribute_forms() {
        let parsed = parse_fragment(r#"<img src="a.png" alt='x y' data-width=600 hidden>"#);
        assert_eq!(
            parsed,
            vec![el(
                "img",
                &[
                    ("src", "a.png"),
                    ("alt", "x y"),
                    ("data-width", "600"),
                    ("hidden", "")
                ],
                vec![]
            )]
        );
    }

    #[test]
    fn test_void_and_self_closing() {
        let parsed = parse_fragment(r#"<input type="checkbox" name="a"/> &nbsp;<br>tail"#);
        assert_eq!(
            parsed,
            vec![
                el("input", &[("type", "checkbox"), ("name", "a")], vec![]),
                text(" \u{00A0}"),
                el("br", &[], vec![]),
                text("tail"),
            ]
        );
    }

    #[test]
    fn test_entities_decode() {
        let parsed = parse_fragment("<p>&#8203;&lt;b&gt; &amp;</p>");
        assert_eq!(parsed, vec![el("p", &[], vec![text("\u{200B}<b> &")])]);
    }

    #[test]
    fn test_unclosed_and_stray_end_tags() {
        let parsed = parse_fragment("<p>one<p>two</span>");
        assert_eq!(
            parsed,
            vec![el("p", &[], vec![text("one")]), el("p", &[], vec![text("two")])]
        );
    }

    #[test]
    fn test_comments_are_dropped() {
        let parsed = parse_fragment("a<!-- note -->b");
        assert_eq!(parsed, vec![text("ab")]);
    }

    #[test]
    fn test_text_escaping() {
        let mut out = String::new();
        escape_text("\u{200B}ÿþ<", &mut out);
        assert_eq!(out, "\u{200B}ÿþ&lt;");

        let mut out = String::new();
        escape_text("a\u{00A0}b", &mut out);
        assert_eq!(out, "a&nbsp;b");
    }
}
