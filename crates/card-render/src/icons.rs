//! Icon name resolution and vector-body preparation.
//!
//! Icons are named `prefix:key`. A bare key gets the default prefix, and keys
//! are normalized to the lowercase kebab-case form icon sets are indexed by
//! (`HeartOutline`, `heart_outline` and `Heart Outline` all become
//! `heart-outline`). A name the resolver does not know falls back to a fixed
//! glyph so an icon node never renders as nothing.

use card_core::assets::{IconBody, IconResolver};
use card_core::path::parse_path_data;
use card_core::{Color, IconProps, Stroke};
use kurbo::{Affine, BezPath};

/// Name reported for the built-in fallback glyph.
pub const FALLBACK_ICON_NAME: &str = "builtin:missing";

/// Circle with a question mark, on a 24×24 view box.
const FALLBACK_BODY: &str = r#"<path d="M12 2A10 10 0 1 0 12 22A10 10 0 1 0 12 2Z M11 17h2v2h-2Z M12 6a4 4 0 0 0-4 4h2a2 2 0 1 1 2 2h-1v3h2v-1.2a4 4 0 0 0-1-7.8Z"/>"#;

pub fn fallback_icon() -> IconBody {
    IconBody {
        body: FALLBACK_BODY.to_string(),
        width: 24.0,
        height: 24.0,
    }
}

/// A parsed `prefix:key` icon name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconName {
    pub prefix: String,
    pub key: String,
}

impl IconName {
    pub fn parse(name: &str, default_prefix: &str) -> Self {
        let (prefix, key) = match name.trim().split_once(':') {
            Some((p, k)) if !p.trim().is_empty() => (p.trim(), k),
            Some((_, k)) => (default_prefix, k),
            None => (default_prefix, name.trim()),
        };
        Self {
            prefix: prefix.to_ascii_lowercase(),
            key: normalize_key(key),
        }
    }

    pub fn qualified(&self) -> String {
        format!("{}:{}", self.prefix, self.key)
    }
}

/// Lowercase kebab-case: splits on case changes, `_`, spaces and `-`.
pub fn normalize_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    let mut prev: Option<char> = None;
    for ch in key.trim().chars() {
        if ch == '_' || ch == '-' || ch.is_whitespace() {
            if !out.is_empty() && !out.ends_with('-') {
                out.push('-');
            }
            prev = None;
            continue;
        }
        if ch.is_ascii_uppercase()
            && matches!(prev, Some(p) if p.is_ascii_lowercase() || p.is_ascii_digit())
            && !out.ends_with('-')
        {
            out.push('-');
        }
        out.push(ch.to_ascii_lowercase());
        prev = Some(ch);
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

/// An icon ready to paint.
#[derive(Debug, Clone)]
pub struct ResolvedIcon {
    /// Qualified name that was looked up, or `FALLBACK_ICON_NAME`.
    pub name: String,
    pub fallback: bool,
    pub body: IconBody,
    /// Self-contained SVG with explicit paint attributes.
    pub svg: String,
}

impl ResolvedIcon {
    /// Vector geometry of the body, scaled from its view box onto
    /// `width × height`.
    pub fn paths(&self, width: f64, height: f64) -> Vec<BezPath> {
        let sx = if self.body.width > 0.0 { width / self.body.width } else { 1.0 };
        let sy = if self.body.height > 0.0 { height / self.body.height } else { 1.0 };
        let scale = Affine::scale_non_uniform(sx, sy);
        extract_path_data(&self.body.body)
            .into_iter()
            .filter_map(|d| match parse_path_data(&d) {
                Ok(mut path) => {
                    path.apply_affine(scale);
                    Some(path)
                }
                Err(e) => {
                    log::warn!("icon {}: {e}", self.name);
                    None
                }
            })
            .collect()
    }
}

/// Icon lookups over an external resolver.
pub struct IconLibrary<'a> {
    resolver: &'a dyn IconResolver,
    default_prefix: String,
}

impl<'a> IconLibrary<'a> {
    pub fn new(resolver: &'a dyn IconResolver, default_prefix: impl Into<String>) -> Self {
        Self {
            resolver,
            default_prefix: default_prefix.into(),
        }
    }

    pub fn default_prefix(&self) -> &str {
        &self.default_prefix
    }

    /// Resolve an icon node's name, falling back to the built-in glyph.
    pub fn resolve(&self, props: &IconProps) -> ResolvedIcon {
        let name = IconName::parse(&props.name, &self.default_prefix).qualified();
        let (name, body, fallback) = match self.resolver.resolve_icon(&name) {
            Some(body) => (name, body, false),
            None => {
                log::warn!("icon `{}` not found, using fallback glyph", props.name);
                (FALLBACK_ICON_NAME.to_string(), fallback_icon(), true)
            }
        };
        let svg = wrap_svg(&body, props.fill, props.stroke);
        ResolvedIcon {
            name,
            fallback,
            body,
            svg,
        }
    }

    /// Candidate icon names for a free-text query.
    pub fn search(&self, query: &str, limit: usize) -> Vec<String> {
        if query.trim().is_empty() || limit == 0 {
            return Vec::new();
        }
        self.resolver.search_icons(query, limit)
    }
}

/// Wrap an icon body in a standalone SVG whose fill, stroke and stroke width
/// are spelled out. Any `currentColor` in the body is replaced with the fill
/// so two instances never share an inherited color.
pub fn wrap_svg(icon: &IconBody, fill: Color, stroke: Option<Stroke>) -> String {
    let fill = fill.to_hex();
    let (stroke_color, stroke_width) = match stroke {
        Some(s) if s.is_visible() => (s.color.to_hex(), s.width),
        _ => ("none".to_string(), 0.0),
    };
    let body = icon.body.replace("currentColor", &fill);
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w} {h}" width="{w}" height="{h}" fill="{fill}" stroke="{stroke_color}" stroke-width="{stroke_width}">{body}</svg>"#,
        w = icon.width,
        h = icon.height,
    )
}

/// Every `d="..."` attribute value in SVG markup, in document order.
pub fn extract_path_data(markup: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut rest = markup;
    while let Some(pos) = rest.find("d=") {
        let preceded_ok = pos == 0
            || rest[..pos]
                .chars()
                .next_back()
                .is_some_and(|c| c.is_whitespace());
        let after = &rest[pos + 2..];
        let quote = after.chars().next();
        match quote {
            Some(q @ ('"' | '\'')) if preceded_ok => {
                let value = &after[1..];
                match value.find(q) {
                    Some(end) => {
                        out.push(value[..end].to_string());
                        rest = &value[end + 1..];
                    }
                    None => break,
                }
            }
            _ => rest = after,
        }
    }
    out
}
