//! Minimal markup scanner and selector matcher for fetched pages.
//!
//! Supports the selectors availability calendars need: type (`i`), `*`,
//! `#id`, `.class` chains, `[attr]`, `[attr=value]` with optional quotes,
//! and the descendant combinator. Other combinators are rejected at parse
//! time so a typo in the deployment file fails loudly instead of counting 0.

use std::str::FromStr;

use slotwatch_core::MonitorError;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

// ── Selectors ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrMatch {
    name: String,
    value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrMatch>,
}

impl Compound {
    fn matches(&self, el: &Element) -> bool {
        if let Some(tag) = &self.tag {
            if &el.tag != tag {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if el.attr("id") != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.is_empty() {
            let have: Vec<&str> = el.attr("class").unwrap_or("").split_whitespace().collect();
            if !self.classes.iter().all(|c| have.contains(&c.as_str())) {
                return false;
            }
        }
        self.attrs.iter().all(|a| match (&a.value, el.attr(&a.name)) {
            (_, None) => false,
            (None, Some(_)) => true,
            (Some(want), Some(got)) => want == got,
        })
    }
}

/// Parsed selector: compounds joined by descendant combinators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    parts: Vec<Compound>,
}

impl FromStr for Selector {
    type Err = MonitorError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let chars: Vec<char> = input.trim().chars().collect();
        let mut parts = Vec::new();
        let mut i = 0;
        while i < chars.len() {
            if chars[i].is_whitespace() {
                i += 1;
                continue;
            }
            let (compound, next) = parse_compound(&chars, i)
                .map_err(|e| MonitorError::Config(format!("invalid selector '{}': {}", input, e)))?;
            parts.push(compound);
            i = next;
        }
        if parts.is_empty() {
            return Err(MonitorError::Config("empty selector".to_string()));
        }
        Ok(Self { parts })
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

fn read_ident(chars: &[char], mut i: usize) -> (String, usize) {
    let start = i;
    while i < chars.len() && is_ident_char(chars[i]) {
        i += 1;
    }
    (chars[start..i].iter().collect(), i)
}

fn skip_ws(chars: &[char], mut i: usize) -> usize {
    while i < chars.len() && chars[i].is_whitespace() {
        i += 1;
    }
    i
}

fn parse_compound(chars: &[char], mut i: usize) -> Result<(Compound, usize), String> {
    let mut compound = Compound::default();
    let mut universal = false;

    if chars[i] == '*' {
        universal = true;
        i += 1;
    } else if is_ident_char(chars[i]) {
        let (name, next) = read_ident(chars, i);
        compound.tag = Some(name.to_ascii_lowercase());
        i = next;
    }

    while i < chars.len() && !chars[i].is_whitespace() {
        match chars[i] {
            '.' => {
                let (name, next) = read_ident(chars, i + 1);
                if name.is_empty() {
                    return Err("expected class name after '.'".to_string());
                }
                compound.classes.push(name);
                i = next;
            }
            '#' => {
                let (name, next) = read_ident(chars, i + 1);
                if name.is_empty() {
                    return Err("expected id after '#'".to_string());
                }
                compound.id = Some(name);
                i = next;
            }
            '[' => {
                let (attr, next) = parse_attr(chars, i + 1)?;
                compound.attrs.push(attr);
                i = next;
            }
            '>' | '+' | '~' | ',' => {
                return Err(format!("combinator '{}' is not supported", chars[i]));
            }
            other => return Err(format!("unexpected character '{}'", other)),
        }
    }

    if !universal && compound == Compound::default() {
        return Err("empty compound selector".to_string());
    }
    Ok((compound, i))
}

fn parse_attr(chars: &[char], i: usize) -> Result<(AttrMatch, usize), String> {
    let i = skip_ws(chars, i);
    let (name, i) = read_ident(chars, i);
    if name.is_empty() {
        return Err("expected attribute name after '['".to_string());
    }
    let name = name.to_ascii_lowercase();
    let mut i = skip_ws(chars, i);
    match chars.get(i) {
        Some(']') => Ok((AttrMatch { name, value: None }, i + 1)),
        Some('=') => {
            i = skip_ws(chars, i + 1);
            let value: String;
            match chars.get(i) {
                Some(&q) if q == '\'' || q == '"' => {
                    let start = i + 1;
                    let end = chars[start..]
                        .iter()
                        .position(|&c| c == q)
                        .map(|p| start + p)
                        .ok_or("unterminated attribute value")?;
                    value = chars[start..end].iter().collect();
                    i = end + 1;
                }
                Some(_) => {
                    let start = i;
                    while i < chars.len() && chars[i] != ']' && !chars[i].is_whitespace() {
                        i += 1;
                    }
                    value = chars[start..i].iter().collect();
                }
                None => return Err("expected attribute value".to_string()),
            }
            i = skip_ws(chars, i);
            if chars.get(i) != Some(&']') {
                return Err("expected ']'".to_string());
            }
            Ok((
                AttrMatch {
                    name,
                    value: Some(value),
                },
                i + 1,
            ))
        }
        _ => Err("only [attr] and [attr=value] are supported".to_string()),
    }
}

// ── Document ────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct Element {
    tag: String,
    attrs: Vec<(String, String)>,
    parent: Option<usize>,
    content_start: usize,
    content_end: usize,
}

impl Element {
    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// A scanned page: a flat element list with parent links.
#[derive(Debug, Clone)]
pub struct Document {
    source: String,
    elements: Vec<Element>,
}

impl Document {
    pub fn parse(html: &str) -> Self {
        let lower = html.to_ascii_lowercase();
        let mut elements: Vec<Element> = Vec::new();
        let mut stack: Vec<usize> = Vec::new();
        let mut pos = 0;

        while let Some(rel) = html[pos..].find('<') {
            let lt = pos + rel;
            let rest = &html[lt..];

            if rest.starts_with("<!--") {
                pos = rest.find("-->").map(|e| lt + e + 3).unwrap_or(html.len());
                continue;
            }
            if rest.starts_with("<!") || rest.starts_with("<?") {
                pos = rest.find('>').map(|e| lt + e + 1).unwrap_or(html.len());
                continue;
            }
            if let Some(after) = rest.strip_prefix("</") {
                let (name, _) = split_tag_name(after);
                let name = name.to_ascii_lowercase();
                if let Some(depth) = stack.iter().rposition(|&e| elements[e].tag == name) {
                    for e in stack.drain(depth..) {
                        elements[e].content_end = lt;
                    }
                }
                pos = rest.find('>').map(|e| lt + e + 1).unwrap_or(html.len());
                continue;
            }
            if !rest[1..].starts_with(|c: char| c.is_ascii_alphabetic()) {
                pos = lt + 1;
                continue;
            }

            let gt = find_tag_end(html, lt);
            let inner = &html[lt + 1..gt.min(html.len())];
            let self_closing = inner.trim_end().ends_with('/');
            let inner = inner.trim_end().trim_end_matches('/');
            let (name, attr_src) = split_tag_name(inner);
            let tag = name.to_ascii_lowercase();
            let content_start = (gt + 1).min(html.len());

            let idx = elements.len();
            elements.push(Element {
                tag: tag.clone(),
                attrs: parse_attrs(attr_src),
                parent: stack.last().copied(),
                content_start,
                content_end: html.len(),
            });
            pos = content_start;

            if RAW_TEXT_ELEMENTS.contains(&tag.as_str()) && !self_closing {
                let close = format!("</{}", tag);
                let end = lower[content_start..]
                    .find(&close)
                    .map(|e| content_start + e)
                    .unwrap_or(html.len());
                elements[idx].content_end = end;
                pos = html[end..].find('>').map(|e| end + e + 1).unwrap_or(html.len());
                continue;
            }
            if self_closing || VOID_ELEMENTS.contains(&tag.as_str()) {
                elements[idx].content_end = content_start;
                continue;
            }
            stack.push(idx);
        }

        Self {
            source: html.to_string(),
            elements,
        }
    }

    fn matches(&self, idx: usize, selector: &Selector) -> bool {
        let Some((last, ancestors)) = selector.parts.split_last() else {
            return false;
        };
        if !last.matches(&self.elements[idx]) {
            return false;
        }
        let mut parent = self.elements[idx].parent;
        for compound in ancestors.iter().rev() {
            loop {
                match parent {
                    None => return false,
                    Some(p) => {
                        parent = self.elements[p].parent;
                        if compound.matches(&self.elements[p]) {
                            break;
                        }
                    }
                }
            }
        }
        true
    }

    /// Number of elements matching `selector`.
    pub fn count(&self, selector: &Selector) -> usize {
        (0..self.elements.len())
            .filter(|&i| self.matches(i, selector))
            .count()
    }

    /// Text content of the first element matching `selector`, verbatim.
    ///
    /// Tags are removed and entities decoded; whitespace is left as served.
    pub fn first_text(&self, selector: &Selector) -> Option<String> {
        let idx = (0..self.elements.len()).find(|&i| self.matches(i, selector))?;
        let el = &self.elements[idx];
        let raw = &self.source[el.content_start..el.content_end.max(el.content_start)];
        Some(decode_entities(&strip_tags(raw)))
    }
}

/// Index of the `>` closing the tag opened at `lt`, honoring quoted values.
fn find_tag_end(html: &str, lt: usize) -> usize {
    let mut quote: Option<u8> = None;
    for (i, &b) in html.as_bytes().iter().enumerate().skip(lt + 1) {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'\'' => quote = Some(b),
            None if b == b'>' => return i,
            None => {}
        }
    }
    html.len()
}

fn split_tag_name(s: &str) -> (&str, &str) {
    let end = s
        .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
        .unwrap_or(s.len());
    (&s[..end], &s[end..])
}

fn parse_attrs(src: &str) -> Vec<(String, String)> {
    let chars: Vec<char> = src.chars().collect();
    let mut attrs = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        if chars[i].is_whitespace() || chars[i] == '/' {
            i += 1;
            continue;
        }
        let start = i;
        while i < chars.len() && !chars[i].is_whitespace() && chars[i] != '=' && chars[i] != '/' {
            i += 1;
        }
        let name: String = chars[start..i].iter().collect::<String>().to_ascii_lowercase();
        i = skip_ws(&chars, i);
        let mut value = String::new();
        if chars.get(i) == Some(&'=') {
            i = skip_ws(&chars, i + 1);
            match chars.get(i) {
                Some(&q) if q == '"' || q == '\'' => {
                    let vstart = i + 1;
                    let vend = chars[vstart..]
                        .iter()
                        .position(|&c| c == q)
                        .map(|p| vstart + p)
                        .unwrap_or(chars.len());
                    value = chars[vstart..vend].iter().collect();
                    i = (vend + 1).min(chars.len());
                }
                Some(_) => {
                    let vstart = i;
                    while i < chars.len() && !chars[i].is_whitespace() {
                        i += 1;
                    }
                    value = chars[vstart..i].iter().collect();
                }
                None => {}
            }
        }
        if !name.is_empty() {
            attrs.push((name, decode_entities(&value)));
        }
    }
    attrs
}

fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for ch in s.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out
}

fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail.find(';').filter(|&semi| semi <= 10).and_then(|semi| {
            let entity = &tail[1..semi];
            let ch = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some(' '),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|d| d.parse().ok()))
                    .and_then(char::from_u32),
            };
            ch.map(|c| (c, semi))
        });
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
