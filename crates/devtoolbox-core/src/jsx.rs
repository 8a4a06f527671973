//! HTML → JSX rewriting.
//!
//! A string-level rewrite, not a DOM parse:
//!
//! - comments become `{/* ... */}`
//! - `class` / `for` become `className` / `htmlFor`
//! - lowercase DOM attributes get their React camel-case names
//! - inline `on*` handlers become `onClick`-style names
//! - `style="a-b: c"` becomes `style={{ aB: 'c' }}`
//! - void elements are self-closed
//! - unquoted attribute values are quoted

use regex::{Captures, Regex};
use std::sync::OnceLock;

use crate::error::{ConvertError, Format};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

const ATTRIBUTE_NAMES: &[(&str, &str)] = &[
    ("class", "className"),
    ("for", "htmlFor"),
    ("accept-charset", "acceptCharset"),
    ("accesskey", "accessKey"),
    ("allowfullscreen", "allowFullScreen"),
    ("autocomplete", "autoComplete"),
    ("autofocus", "autoFocus"),
    ("autoplay", "autoPlay"),
    ("cellpadding", "cellPadding"),
    ("cellspacing", "cellSpacing"),
    ("charset", "charSet"),
    ("colspan", "colSpan"),
    ("contenteditable", "contentEditable"),
    ("crossorigin", "crossOrigin"),
    ("datetime", "dateTime"),
    ("enctype", "encType"),
    ("formaction", "formAction"),
    ("frameborder", "frameBorder"),
    ("http-equiv", "httpEquiv"),
    ("inputmode", "inputMode"),
    ("maxlength", "maxLength"),
    ("minlength", "minLength"),
    ("novalidate", "noValidate"),
    ("readonly", "readOnly"),
    ("referrerpolicy", "referrerPolicy"),
    ("rowspan", "rowSpan"),
    ("spellcheck", "spellCheck"),
    ("srcdoc", "srcDoc"),
    ("srcset", "srcSet"),
    ("tabindex", "tabIndex"),
    ("usemap", "useMap"),
    ("viewbox", "viewBox"),
    ("stroke-width", "strokeWidth"),
    ("stroke-linecap", "strokeLinecap"),
    ("stroke-linejoin", "strokeLinejoin"),
    ("fill-rule", "fillRule"),
    ("clip-rule", "clipRule"),
    ("xlink:href", "xlinkHref"),
];

const EVENT_NAMES: &[(&str, &str)] = &[
    ("ondblclick", "onDoubleClick"),
    ("onmouseover", "onMouseOver"),
    ("onmouseout", "onMouseOut"),
    ("onmousedown", "onMouseDown"),
    ("onmouseup", "onMouseUp"),
    ("onmouseenter", "onMouseEnter"),
    ("onmouseleave", "onMouseLeave"),
    ("onmousemove", "onMouseMove"),
    ("onkeydown", "onKeyDown"),
    ("onkeyup", "onKeyUp"),
    ("onkeypress", "onKeyPress"),
    ("oncontextmenu", "onContextMenu"),
    ("ontouchstart", "onTouchStart"),
    ("ontouchend", "onTouchEnd"),
];

fn comment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<!--(.*?)-->").expect("comment regex"))
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"<([a-zA-Z][a-zA-Z0-9-]*)((?:\s+[^\s"'=/>]+(?:\s*=\s*(?:"[^"]*"|'[^']*'|[^\s"'>]+))?)*)\s*(/?)>"#,
        )
        .expect("tag regex")
    })
}

fn attr_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"([^\s"'=/>]+)(?:\s*=\s*("[^"]*"|'[^']*'|[^\s"'>]+))?"#).expect("attr regex")
    })
}

/// Rewrite an HTML fragment as JSX.
///
/// With `component` set, the result is wrapped in an exported function
/// component of that name.
pub fn html_to_jsx(input: &str, component: Option<&str>) -> Result<String, ConvertError> {
    if input.trim().is_empty() {
        return Err(ConvertError::EmptyInput(Format::Html));
    }

    let without_comments = comment_re().replace_all(input, |caps: &Captures| {
        format!("{{/*{}*/}}", caps[1].replace("*/", "* /"))
    });
    let jsx = tag_re()
        .replace_all(&without_comments, |caps: &Captures| rewrite_tag(caps))
        .into_owned();

    Ok(match component {
        Some(name) => wrap_component(&jsx, name)?,
        None => jsx,
    })
}

fn rewrite_tag(caps: &Captures) -> String {
    let name = &caps[1];
    let attrs = caps.get(2).map_or("", |m| m.as_str());
    let self_closing = !caps[3].is_empty() || VOID_ELEMENTS.contains(&name.to_ascii_lowercase().as_str());

    let mut out = format!("<{}", name);
    for attr in attr_re().captures_iter(attrs) {
        out.push(' ');
        out.push_str(&rewrite_attribute(&attr[1], attr.get(2).map(|m| m.as_str())));
    }
    out.push_str(if self_closing { " />" } else { ">" });
    out
}

fn rewrite_attribute(name: &str, raw_value: Option<&str>) -> String {
    let lower = name.to_ascii_lowercase();
    let value = raw_value.map(unquote);

    if lower == "style" {
        if let Some(style) = value {
            return format!("style={{{}}}", style_object(style));
        }
    }

    let jsx_name = attribute_name(name, &lower);
    match value {
        Some(v) => format!("{}=\"{}\"", jsx_name, v.replace('"', "&quot;")),
        None => jsx_name,
    }
}

fn attribute_name(original: &str, lower: &str) -> String {
    if let Some((_, jsx)) = ATTRIBUTE_NAMES.iter().find(|(html, _)| *html == lower) {
        return jsx.to_string();
    }
    if let Some((_, jsx)) = EVENT_NAMES.iter().find(|(html, _)| *html == lower) {
        return jsx.to_string();
    }
    if lower.starts_with("data-") || lower.starts_with("aria-") {
        return original.to_string();
    }
    if let Some(event) = lower.strip_prefix("on") {
        if !event.is_empty() && event.chars().all(|c| c.is_ascii_lowercase()) {
            return format!("on{}", capitalize(event));
        }
    }
    original.to_string()
}

fn unquote(raw: &str) -> &str {
    let bytes = raw.as_bytes();
    if raw.len() >= 2 && (bytes[0] == b'"' || bytes[0] == b'\'') && bytes[raw.len() - 1] == bytes[0] {
        &raw[1..raw.len() - 1]
    } else {
        raw
    }
}

/// `"font-size: 12px; color:red"` → `{ fontSize: '12px', color: 'red' }`
fn style_object(style: &str) -> String {
    let entries: Vec<String> = style
        .split(';')
        .filter_map(|decl| {
            let (prop, value) = decl.split_once(':')?;
            let prop = prop.trim();
            let value = value.trim();
            if prop.is_empty() || value.is_empty() {
                return None;
            }
            Some(format!(
                "{}: '{}'",
                css_property(prop),
                value.replace('\\', "\\\\").replace('\'', "\\'")
            ))
        })
        .collect();

    if entries.is_empty() {
        "{}".to_string()
    } else {
        format!("{{ {} }}", entries.join(", "))
    }
}

fn css_property(prop: &str) -> String {
    if prop.starts_with("--") {
        return format!("'{}'", prop);
    }
    let mut out = String::with_capacity(prop.len());
    let mut upper = false;
    // A leading vendor prefix keeps its capital: -webkit-x → WebkitX.
    for c in prop.to_ascii_lowercase().chars() {
        if c == '-' {
            upper = true;
            continue;
        }
        if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    if prop.starts_with("-ms-") {
        // React spells the ms prefix lowercase.
        out = format!("ms{}", &out[2..]);
    }
    out
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn wrap_component(jsx: &str, name: &str) -> Result<String, ConvertError> {
    let valid = name.chars().next().is_some_and(|c| c.is_ascii_uppercase())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(ConvertError::parse(
            Format::Html,
            format!("component name '{}' must be a capitalized identifier", name),
        ));
    }

    let body: Vec<String> = jsx
        .trim()
        .lines()
        .map(|line| {
            if line.trim().is_empty() {
                String::new()
            } else {
                format!("      {}", line)
            }
        })
        .collect();

    Ok(format!(
        "export default function {}() {{\n  return (\n    <>\n{}\n    </>\n  );\n}}\n",
        name,
        body.join("\n")
    ))
}
