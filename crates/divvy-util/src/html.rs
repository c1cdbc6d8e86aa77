//! Minimal tag scanner over raw HTML.
//!
//! This is not a DOM. It finds elements by tag name or attribute value,
//! matches their closing tag by nesting depth, and flattens an element to
//! its visible text. Enough for pulling a heading and a table out of a
//! page without holding a parsed tree.

/// Elements that never carry content or a closing tag.
const VOID: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Elements whose contents are raw text, never markup.
const RAW_TEXT: &[&str] = &["script", "style"];

/// Elements that separate words when flattened to text.
const BREAKING: &[&str] = &[
    "address", "article", "br", "dd", "div", "dl", "dt", "footer", "h1", "h2", "h3", "h4", "h5",
    "h6", "header", "hr", "li", "ol", "p", "section", "table", "tbody", "td", "tfoot", "th",
    "thead", "tr", "ul",
];

#[derive(Debug, Clone, PartialEq, Eq)]
struct Tag {
    start: usize,
    end: usize,
    resume: usize,
    name: String,
    closing: bool,
    self_closing: bool,
}

impl Tag {
    fn opens(&self) -> bool {
        !self.closing
            && !self.self_closing
            && !VOID.contains(&self.name.as_str())
            && !RAW_TEXT.contains(&self.name.as_str())
    }
}

/// An element located inside a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Element<'a> {
    open: &'a str,
    outer: &'a str,
    inner: &'a str,
}

impl<'a> Element<'a> {
    /// The full element, opening tag through closing tag.
    pub fn outer(&self) -> &'a str {
        self.outer
    }

    /// Markup between the opening and closing tag.
    pub fn inner(&self) -> &'a str {
        self.inner
    }

    /// Value of attribute `name` on the opening tag.
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        attr(self.open, name)
    }

    /// Visible text: tags dropped, entities decoded, whitespace collapsed.
    pub fn text(&self) -> String {
        text(self.inner)
    }

    /// First descendant with tag `name`.
    pub fn find(&self, name: &str) -> Option<Element<'a>> {
        find_tag(self.inner, name)
    }

    /// Every non-overlapping descendant with tag `name`, in document order.
    ///
    /// Once an element is matched its own subtree is skipped, so nested
    /// elements of the same name are not reported twice.
    pub fn find_all(&self, name: &str) -> Vec<Element<'a>> {
        let mut out = Vec::new();
        let mut pos = 0;
        while let Some(tag) = next_tag_named(self.inner, name, pos) {
            let element = block(self.inner, &tag);
            pos = tag.start + element.outer.len();
            out.push(element);
        }
        out
    }
}

/// First element named `name` in `doc`.
pub fn find_tag<'a>(doc: &'a str, name: &str) -> Option<Element<'a>> {
    let tag = next_tag_named(doc, name, 0)?;
    Some(block(doc, &tag))
}

/// First element in `doc` carrying `attr="value"`, whatever its tag.
pub fn find_attr<'a>(doc: &'a str, attr_name: &str, value: &str) -> Option<Element<'a>> {
    let mut pos = 0;
    while let Some(tag) = next_tag(doc, pos) {
        pos = tag.resume;
        if !tag.closing && attr(&doc[tag.start..tag.end], attr_name) == Some(value) {
            return Some(block(doc, &tag));
        }
    }
    None
}

/// Flatten a markup fragment to its visible text.
pub fn text(fragment: &str) -> String {
    let mut raw = String::with_capacity(fragment.len());
    let mut pos = 0;
    while let Some(tag) = next_tag(fragment, pos) {
        raw.push_str(&fragment[pos..tag.start]);
        if BREAKING.contains(&tag.name.as_str()) {
            raw.push(' ');
        }
        pos = tag.resume;
    }
    raw.push_str(&fragment[pos..]);

    decode_entities(&raw)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Decode the character references that turn up in scraped text.
///
/// Unknown named references are left verbatim.
pub fn decode_entities(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest.find(';').filter(|&semi| semi <= 10).and_then(|semi| {
            let reference = &rest[1..semi];
            let ch = match reference {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some(' '),
                _ => reference
                    .strip_prefix("#x")
                    .or_else(|| reference.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| reference.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                    .and_then(char::from_u32),
            };
            ch.map(|ch| (ch, semi))
        });
        match decoded {
            Some((ch, semi)) => {
                out.push(ch);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

// -------------------------------------------------------------------------------------------------

/// Resolve the element opened by `tag` to its full extent in `doc`.
///
/// An element whose closing tag never appears runs to the end of `doc`.
fn block<'a>(doc: &'a str, tag: &Tag) -> Element<'a> {
    let open = &doc[tag.start..tag.end];
    if !tag.opens() {
        return Element {
            open,
            outer: open,
            inner: "",
        };
    }

    let mut depth = 1usize;
    let mut pos = tag.end;
    while let Some(next) = next_tag(doc, pos) {
        pos = next.resume;
        if next.name != tag.name {
            continue;
        }
        if next.closing {
            depth -= 1;
            if depth == 0 {
                return Element {
                    open,
                    outer: &doc[tag.start..next.end],
                    inner: &doc[tag.end..next.start],
                };
            }
        } else if next.opens() {
            depth += 1;
        }
    }

    Element {
        open,
        outer: &doc[tag.start..],
        inner: &doc[tag.end..],
    }
}

fn next_tag_named(doc: &str, name: &str, from: usize) -> Option<Tag> {
    let mut pos = from;
    while let Some(tag) = next_tag(doc, pos) {
        if !tag.closing && tag.name.eq_ignore_ascii_case(name) {
            return Some(tag);
        }
        pos = tag.resume;
    }
    None
}

/// Next tag at or after byte `from`, skipping comments, declarations and
/// the bodies of raw-text elements.
fn next_tag(doc: &str, from: usize) -> Option<Tag> {
    let bytes = doc.as_bytes();
    let mut pos = from;
    loop {
        let lt = pos + doc.get(pos..)?.find('<')?;
        let after = &doc[lt + 1..];

        if after.starts_with("!--") {
            pos = lt + 4 + after[3..].find("-->")? + 3;
            continue;
        }
        if after.starts_with('!') || after.starts_with('?') {
            pos = lt + 1 + after.find('>')? + 1;
            continue;
        }

        let closing = after.starts_with('/');
        let name_start = lt + 1 + usize::from(closing);
        let name_len = doc[name_start..]
            .bytes()
            .take_while(|b| b.is_ascii_alphanumeric() || *b == b'-')
            .count();
        if name_len == 0 {
            pos = lt + 1;
            continue;
        }
        let name = doc[name_start..name_start + name_len].to_ascii_lowercase();

        let end = tag_end(bytes, name_start + name_len)?;
        let self_closing = bytes[end - 2] == b'/';

        // the body of <script> and <style> is not markup; scanning resumes
        // at its closing tag
        let resume = if !closing && RAW_TEXT.contains(&name.as_str()) {
            find_ci(doc, &format!("</{name}"), end).unwrap_or(doc.len())
        } else {
            end
        };

        return Some(Tag {
            start: lt,
            end,
            resume,
            name,
            closing,
            self_closing,
        });
    }
}

/// Index one past the `>` ending the tag body that starts at `from`,
/// honouring quoted attribute values.
fn tag_end(bytes: &[u8], from: usize) -> Option<usize> {
    let mut quote = None;
    for (i, &b) in bytes.iter().enumerate().skip(from) {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'\'' => quote = Some(b),
            None if b == b'>' => return Some(i + 1),
            None => {}
        }
    }
    None
}

/// Value of attribute `name` within the source of a single opening tag.
fn attr<'a>(tag_src: &'a str, name: &str) -> Option<&'a str> {
    let body = tag_src.strip_prefix('<')?;
    let body = body.strip_suffix('>').unwrap_or(body);
    let body = body.strip_suffix('/').unwrap_or(body);
    let bytes = body.as_bytes();

    // skip the tag name
    let mut i = bytes
        .iter()
        .position(|b| b.is_ascii_whitespace())
        .unwrap_or(bytes.len());

    while i < bytes.len() {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        let key_start = i;
        while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'=' {
            i += 1;
        }
        let key = &body[key_start..i];
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() || bytes[i] != b'=' {
            if key.eq_ignore_ascii_case(name) && !key.is_empty() {
                return Some("");
            }
            if key.is_empty() {
                i += 1;
            }
            continue;
        }
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }

        let value = match bytes.get(i) {
            Some(&q) if q == b'"' || q == b'\'' => {
                let start = i + 1;
                let len = body[start..].find(q as char).unwrap_or(body.len() - start);
                i = start + len + 1;
                &body[start..start + len]
            }
            _ => {
                let start = i;
                while i < bytes.len() && !bytes[i].is_ascii_whitespace() {
                    i += 1;
                }
                &body[start..i]
            }
        };

        if key.eq_ignore_ascii_case(name) {
            return Some(value);
        }
    }
    None
}

/// Case-insensitive (ASCII) substring search starting at byte `from`.
fn find_ci(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    let needle = needle.as_bytes();
    haystack
        .as_bytes()
        .get(from..)?
        .windows(needle.len())
        .position(|w| w.eq_ignore_ascii_case(needle))
        .map(|p| p + from)
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Tests
//
////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"<!DOCTYPE html>
<html>
  <head>
    <title>AAPL</title>
    <script>if (a < b) { document.write("<h1>fake</h1>"); }</script>
  </head>
  <body>
    <!-- <h1>commented</h1> -->
    <div id="quote-header"><H1 class='big'>AAPL - Apple&nbsp;Inc.</H1></div>
    <table class="W(100%)" data-test="historical-prices">
      <thead><tr><th>Date</th><th>Dividend</th></tr></thead>
      <tbody>
        <tr><td><span>Feb 09, 2024</span></td><td><strong>0.24</strong> <span>Dividend</span></td></tr>
        <tr><td>Aug 31, 2020</td><td>4:1 Stock Split</td></tr>
      </tbody>
    </table>
  </body>
</html>"#;

    #[test]
    fn finds_first_tag_case_insensitively() {
        let h1 = find_tag(DOC, "h1").expect("h1 present");
        assert_eq!(h1.attr("class"), Some("big"));
        assert_eq!(h1.text(), "AAPL - Apple Inc.");
    }

    #[test]
    fn ignores_markup_inside_scripts_and_comments() {
        let h1 = find_tag(DOC, "h1").expect("h1 present");
        assert!(!h1.text().contains("fake"));
        assert!(!h1.text().contains("commented"));
    }

    #[test]
    fn finds_element_by_attribute() {
        let table = find_attr(DOC, "data-test", "historical-prices").expect("table present");
        assert!(table.outer().starts_with("<table"));
        assert!(table.outer().ends_with("</table>"));
        assert_eq!(find_attr(DOC, "data-test", "missing"), None);
    }

    #[test]
    fn flattens_rows_to_text() {
        let table = find_attr(DOC, "data-test", "historical-prices").expect("table present");
        let tbody = table.find("tbody").expect("tbody present");
        let rows: Vec<String> = tbody.find_all("tr").iter().map(Element::text).collect();
        assert_eq!(rows, vec!["Feb 09, 2024 0.24 Dividend", "Aug 31, 2020 4:1 Stock Split"]);
    }

    #[test]
    fn matches_nested_elements_by_depth() {
        let doc = "<div a=1><div>inner</div>tail</div><div>next</div>";
        let outer = find_tag(doc, "div").expect("div present");
        assert_eq!(outer.inner(), "<div>inner</div>tail");
        assert_eq!(outer.text(), "inner tail");
    }

    #[test]
    fn unclosed_element_runs_to_end() {
        let doc = "<p>never closed <b>bold</b>";
        assert_eq!(find_tag(doc, "p").map(|p| p.text()), Some("never closed bold".into()));
    }

    #[test]
    fn quoted_attributes_may_contain_angle_brackets() {
        let doc = r#"<a title="x > y" href='/q'>link</a>"#;
        let a = find_tag(doc, "a").expect("anchor present");
        assert_eq!(a.attr("title"), Some("x > y"));
        assert_eq!(a.attr("href"), Some("/q"));
        assert_eq!(a.text(), "link");
    }

    #[test]
    fn decodes_common_entities() {
        assert_eq!(decode_entities("AT&amp;T &#39;Inc&#x27; &lt;x&gt;"), "AT&T 'Inc' <x>");
        assert_eq!(decode_entities("fish & chips &bogus;"), "fish & chips &bogus;");
    }
}
