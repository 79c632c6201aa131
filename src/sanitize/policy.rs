/// Tags kept as-is (with filtered attributes).
pub const ALLOWED_TAGS: &[&str] = &[
    // structure / text
    "div", "span", "p", "br", "hr", "blockquote", "pre", "code", "small", "sub", "sup",
    // formatting
    "b", "strong", "i", "em", "u", "s", "del", "ins", "mark", "abbr",
    // headings
    "h1", "h2", "h3", "h4", "h5", "h6",
    // lists
    "ul", "ol", "li", "dl", "dt", "dd",
    // tables
    "table", "thead", "tbody", "tfoot", "tr", "th", "td", "caption", "colgroup", "col",
    // links / media
    "a", "img",
    // semantic wrappers
    "section", "article", "header", "footer", "figure", "figcaption", "details", "summary",
];

/// Tags removed together with their entire subtree.
pub const DROP_WITH_CONTENT_TAGS: &[&str] = &["script", "style", "iframe", "object", "embed"];

/// Attributes allowed on every allowed tag.
pub const GLOBAL_ATTRIBUTES: &[&str] = &[
    "class", "id", "title", "style", "role", "dir", "lang", "aria-label", "aria-hidden",
];

/// Extra attributes allowed per tag.
pub const TAG_ATTRIBUTES: &[(&str, &[&str])] = &[
    ("a", &["href", "target", "rel"]),
    ("img", &["src", "alt", "width", "height", "loading"]),
    ("td", &["colspan", "rowspan", "align"]),
    ("th", &["colspan", "rowspan", "align", "scope"]),
    ("col", &["span"]),
    ("colgroup", &["span"]),
    ("ol", &["start", "reversed", "type"]),
    ("details", &["open"]),
    ("abbr", &["title"]),
];

/// Attributes whose values are URLs and go through the scheme check.
pub const URL_ATTRIBUTES: &[&str] = &["href", "src"];

/// URL schemes that can execute or smuggle content.
pub const BLOCKED_URL_SCHEMES: &[&str] = &["javascript:", "data:", "vbscript:"];

/// Forced onto any `a` that carries a `target`.
pub const FORCED_LINK_REL: &str = "noopener noreferrer";

/// CSS properties allowed in inline styles and style objects.
pub const ALLOWED_STYLE_PROPERTIES: &[&str] = &[
    "color",
    "background",
    "background-color",
    "opacity",
    "font-size",
    "font-weight",
    "font-style",
    "font-family",
    "font-variant",
    "text-align",
    "text-decoration",
    "text-transform",
    "text-shadow",
    "line-height",
    "letter-spacing",
    "white-space",
    "word-break",
    "vertical-align",
    "margin",
    "margin-top",
    "margin-right",
    "margin-bottom",
    "margin-left",
    "padding",
    "padding-top",
    "padding-right",
    "padding-bottom",
    "padding-left",
    "border",
    "border-top",
    "border-right",
    "border-bottom",
    "border-left",
    "border-color",
    "border-width",
    "border-style",
    "border-radius",
    "width",
    "height",
    "min-width",
    "min-height",
    "max-width",
    "max-height",
    "display",
    "flex",
    "flex-direction",
    "flex-wrap",
    "align-items",
    "justify-content",
    "gap",
    "overflow",
    "box-shadow",
];

/// Substrings that disqualify any style value, compared case-insensitively.
pub const BLOCKED_STYLE_VALUE_PATTERNS: &[&str] =
    &["url(", "expression(", "javascript:", "behavior:"];

/// Characters that end a declaration or the enclosing `style` attribute.
pub const BLOCKED_STYLE_VALUE_CHARS: &[char] = &[';', '{', '}', '<', '>', '"', '\\'];

pub fn is_allowed_tag(tag: &str) -> bool {
    ALLOWED_TAGS.contains(&tag)
}

pub fn is_drop_with_content_tag(tag: &str) -> bool {
    DROP_WITH_CONTENT_TAGS.contains(&tag)
}

pub fn is_allowed_attribute(tag: &str, attr: &str) -> bool {
    if attr.starts_with("on") {
        return false;
    }
    GLOBAL_ATTRIBUTES.contains(&attr)
        || TAG_ATTRIBUTES
            .iter()
            .any(|(t, attrs)| *t == tag && attrs.contains(&attr))
}

pub fn is_allowed_style_property(prop: &str) -> bool {
    ALLOWED_STYLE_PROPERTIES.contains(&prop)
}
