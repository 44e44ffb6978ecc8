//! Listing extraction from category page markup.
//!
//! A small tolerant scanner builds an element tree (tag, classes, children)
//! and ignores everything else: attributes other than `class`, comments,
//! doctype, and the bodies of `<script>`/`<style>`. Unclosed elements are
//! closed by the nearest enclosing end tag or by the implied end tags HTML
//! defines (`<li>`, `<p>`, table cells); stray end tags are dropped. Nesting
//! deeper than [`MAX_DEPTH`] is flattened, so tree walks stay shallow.
//!
//! Cards are the outermost elements carrying one of the card classes, in
//! document order. A card nested inside another card is part of the outer
//! card, not a listing of its own.

use proof_config::ExtractSettings;
use proof_schemas::ObservedEntry;

/// Where listings live on a page. Built from `fetch.extract` config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractRules {
    pub card_classes: Vec<String>,
    pub name_tag: String,
    /// Tried in order; first class present inside the card wins.
    pub badge_classes: Vec<String>,
}

impl Default for ExtractRules {
    fn default() -> Self {
        ExtractRules::from(&ExtractSettings::default())
    }
}

impl From<&ExtractSettings> for ExtractRules {
    fn from(s: &ExtractSettings) -> Self {
        Self {
            card_classes: s
                .card_classes
                .iter()
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect(),
            name_tag: s.name_tag.trim().to_ascii_lowercase(),
            badge_classes: s
                .badge_classes
                .iter()
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect(),
        }
    }
}

/// Extract `(name, badge)` listings in rendering order, numbered `1..N`.
///
/// Cards with an empty name are skipped and do not consume a position.
pub fn extract_listings(html: &str, rules: &ExtractRules) -> Vec<ObservedEntry> {
    let root = build_tree(tokenize(html));

    let mut cards = Vec::new();
    collect_cards(&root, rules, &mut cards);

    let mut out = Vec::with_capacity(cards.len());
    for card in cards {
        let name = find_first(card, &|e: &Element| e.tag == rules.name_tag)
            .map(text_of)
            .unwrap_or_default();
        if name.is_empty() {
            continue;
        }

        let badge = rules
            .badge_classes
            .iter()
            .find_map(|class| find_first(card, &|e: &Element| e.has_class(class)))
            .map(text_of)
            .unwrap_or_default();

        let position = out.len() as u32 + 1;
        out.push(ObservedEntry::new(name, badge, position));
    }
    out
}

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq)]
enum Token {
    Open {
        tag: String,
        classes: Vec<String>,
        self_closing: bool,
    },
    Close(String),
    Text(String),
}

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

const RAW_TEXT_TAGS: &[&str] = &["script", "style"];

fn tokenize(html: &str) -> Vec<Token> {
    let bytes = html.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;
    let mut text_start = 0;

    while i < bytes.len() {
        if bytes[i] != b'<' || !starts_markup(bytes.get(i + 1).copied()) {
            i += 1;
            continue;
        }

        if text_start < i {
            out.push(Token::Text(html[text_start..i].to_string()));
        }
        let rest = &html[i..];

        if rest.starts_with("<!--") {
            i = rest.find("-->").map_or(bytes.len(), |e| i + e + 3);
            text_start = i;
            continue;
        }
        if rest.starts_with("<!") || rest.starts_with("<?") {
            i = rest.find('>').map_or(bytes.len(), |e| i + e + 1);
            text_start = i;
            continue;
        }

        let Some(end) = find_tag_end(rest) else {
            // Unterminated tag: the remainder is not markup we can use.
            text_start = bytes.len();
            break;
        };
        let inner = &rest[1..end];
        i += end + 1;
        text_start = i;

        if let Some(close) = inner.strip_prefix('/') {
            out.push(Token::Close(tag_name(close)));
            continue;
        }

        let tag = tag_name(inner);
        let self_closing = inner.trim_end().ends_with('/');
        let classes = class_list(&inner[tag.len()..]);
        let raw_text = RAW_TEXT_TAGS.contains(&tag.as_str()) && !self_closing;
        out.push(Token::Open {
            tag: tag.clone(),
            classes,
            self_closing,
        });

        if raw_text {
            // Skip to the matching end tag without interpreting the body.
            let needle = format!("</{tag}");
            let lower = html[i..].to_ascii_lowercase();
            i = lower.find(&needle).map_or(bytes.len(), |e| i + e);
            text_start = i;
        }
    }

    if text_start < bytes.len() {
        out.push(Token::Text(html[text_start..].to_string()));
    }
    out
}

fn starts_markup(next: Option<u8>) -> bool {
    matches!(next, Some(c) if c.is_ascii_alphabetic() || c == b'/' || c == b'!' || c == b'?')
}

/// Byte offset of the `>` closing the tag that starts `s`, skipping quoted
/// attribute values.
fn find_tag_end(s: &str) -> Option<usize> {
    let mut quote: Option<u8> = None;
    for (idx, &b) in s.as_bytes().iter().enumerate().skip(1) {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'\'' => quote = Some(b),
            None if b == b'>' => return Some(idx),
            None => {}
        }
    }
    None
}

fn tag_name(s: &str) -> String {
    s.trim_start()
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == ':')
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Parse the attribute section of a start tag and return its class tokens.
fn class_list(attrs: &str) -> Vec<String> {
    let b = attrs.as_bytes();
    let mut i = 0;
    while i < b.len() {
        while i < b.len() && (b[i].is_ascii_whitespace() || b[i] == b'/') {
            i += 1;
        }
        let name_start = i;
        while i < b.len() && !b[i].is_ascii_whitespace() && b[i] != b'=' && b[i] != b'/' {
            i += 1;
        }
        let name = &attrs[name_start..i];
        if name.is_empty() {
            break;
        }

        while i < b.len() && b[i].is_ascii_whitespace() {
            i += 1;
        }
        let mut value = "";
        if i < b.len() && b[i] == b'=' {
            i += 1;
            while i < b.len() && b[i].is_ascii_whitespace() {
                i += 1;
            }
            if i < b.len() && (b[i] == b'"' || b[i] == b'\'') {
                let q = b[i];
                let start = i + 1;
                i = start;
                while i < b.len() && b[i] != q {
                    i += 1;
                }
                value = &attrs[start..i];
                i = (i + 1).min(b.len());
            } else {
                let start = i;
                while i < b.len() && !b[i].is_ascii_whitespace() {
                    i += 1;
                }
                value = &attrs[start..i];
            }
        }

        if name.eq_ignore_ascii_case("class") {
            return value.split_whitespace().map(str::to_string).collect();
        }
    }
    Vec::new()
}

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

/// Deepest element nesting kept. Start tags past it are dropped and their
/// content joins the element at the cap.
pub const MAX_DEPTH: usize = 512;

#[derive(Debug, Default)]
struct Element {
    tag: String,
    classes: Vec<String>,
    children: Vec<Node>,
}

#[derive(Debug)]
enum Node {
    Element(Element),
    Text(String),
}

impl Element {
    fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

fn build_tree(tokens: Vec<Token>) -> Element {
    let mut stack: Vec<Element> = vec![Element {
        tag: "#root".to_string(),
        ..Element::default()
    }];

    for tok in tokens {
        match tok {
            Token::Text(t) => {
                if let Some(top) = stack.last_mut() {
                    top.children.push(Node::Text(t));
                }
            }
            Token::Open {
                tag,
                classes,
                self_closing,
            } => {
                close_implied(&mut stack, &tag);
                let el = Element {
                    tag,
                    classes,
                    children: Vec::new(),
                };
                if self_closing || VOID_TAGS.contains(&el.tag.as_str()) {
                    if let Some(top) = stack.last_mut() {
                        top.children.push(Node::Element(el));
                    }
                } else if stack.len() <= MAX_DEPTH {
                    stack.push(el);
                }
                // Past the cap the tag is dropped; its content lands in the
                // element at the cap.
            }
            Token::Close(tag) => {
                // Index 0 is the root and never matches.
                if let Some(pos) = stack.iter().skip(1).rposition(|e| e.tag == tag) {
                    close_down_to(&mut stack, pos + 1);
                }
            }
        }
    }

    close_down_to(&mut stack, 1);
    stack.pop().unwrap_or_default()
}

/// Start tags that end an open `<p>`.
const CLOSES_P: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "details", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header",
    "hr", "li", "main", "menu", "nav", "ol", "p", "pre", "section", "table", "ul",
];

/// Apply the HTML implied end tags a start tag `tag` triggers, so
/// `<li>a<li>b` builds siblings rather than nested items.
fn close_implied(stack: &mut Vec<Element>, tag: &str) {
    if CLOSES_P.contains(&tag) {
        close_open(stack, &["p"], &["button", "table", "td", "th"]);
    }
    match tag {
        "li" => close_open(stack, &["li"], &["ul", "ol", "menu", "table"]),
        "dt" | "dd" => close_open(stack, &["dt", "dd"], &["dl", "table"]),
        "tr" => close_open(stack, &["tr"], &["table", "thead", "tbody", "tfoot"]),
        "td" | "th" => close_open(stack, &["td", "th"], &["tr", "table"]),
        "thead" | "tbody" | "tfoot" => close_open(stack, &["thead", "tbody", "tfoot"], &["table"]),
        "option" => close_open(stack, &["option"], &["select", "datalist"]),
        _ => {}
    }
}

/// Close the innermost open element named in `targets`, unless one of
/// `boundaries` is open inside it.
fn close_open(stack: &mut Vec<Element>, targets: &[&str], boundaries: &[&str]) {
    for idx in (1..stack.len()).rev() {
        let tag = stack[idx].tag.as_str();
        if targets.contains(&tag) {
            close_down_to(stack, idx);
            return;
        }
        if boundaries.contains(&tag) {
            return;
        }
    }
}

/// Pop elements until `stack.len() == depth`, attaching each to its parent.
fn close_down_to(stack: &mut Vec<Element>, depth: usize) {
    while stack.len() > depth.max(1) {
        let Some(el) = stack.pop() else { break };
        if let Some(parent) = stack.last_mut() {
            parent.children.push(Node::Element(el));
        }
    }
}

fn collect_cards<'a>(el: &'a Element, rules: &ExtractRules, out: &mut Vec<&'a Element>) {
    for child in &el.children {
        if let Node::Element(c) = child {
            if rules.card_classes.iter().any(|cls| c.has_class(cls)) {
                out.push(c);
            } else {
                collect_cards(c, rules, out);
            }
        }
    }
}

/// First descendant (pre-order, excluding `el` itself) matching `pred`.
fn find_first<'a>(el: &'a Element, pred: &dyn Fn(&Element) -> bool) -> Option<&'a Element> {
    for child in &el.children {
        if let Node::Element(c) = child {
            if pred(c) {
                return Some(c);
            }
            if let Some(found) = find_first(c, pred) {
                return Some(found);
            }
        }
    }
    None
}

fn text_of(el: &Element) -> String {
    let mut raw = String::new();
    push_text(el, &mut raw);
    normalize_ws(&decode_entities(&raw))
}

fn push_text(el: &Element, out: &mut String) {
    for child in &el.children {
        match child {
            Node::Text(t) => out.push_str(t),
            Node::Element(c) if c.tag == "br" => out.push(' '),
            Node::Element(c) => push_text(c, out),
        }
    }
}

// ---------------------------------------------------------------------------
// Text cleanup
// ---------------------------------------------------------------------------

fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Decode the named entities listing pages actually use plus numeric
/// references. Unknown entities are left as written.
fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail
            .find(';')
            .filter(|&semi| semi <= 10)
            .and_then(|semi| decode_entity(&tail[1..semi]).map(|c| (c, semi)));
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

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            let num = name.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse::<u32>().ok()?,
            };
            char::from_u32(code)
        }
    }
}
