//! Document model for card designs.
//!
//! A document is a flat, z-ordered list of drawable nodes: the sequence
//! order is the paint order and the last node is topmost. There is no
//! hierarchy; grouping is a shared tag on sibling nodes.
//!
//! Every node carries universal geometry (`Geometry`) plus a type-tagged
//! `NodeProps` record. The variant of `NodeProps` is the node's type and is
//! never changed after creation; patches only touch fields inside it.

use crate::id::NodeId;
use kurbo::{Affine, Point, Rect};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::fmt;

/// Smallest width/height a committed node may have.
pub const MIN_DIMENSION: f32 = 5.0;

// ─── Colors ──────────────────────────────────────────────────────────────

/// RGBA color. Stored as 4 × f32 [0.0, 1.0], serialized as a hex string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Helper to parse a single hex digit.
fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Color {
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#RGB`, `#RRGGBB` or `#RRGGBBAA`. The `#` is optional.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let bytes = hex.as_bytes();
        let pair = |i: usize| -> Option<f32> {
            Some((hex_val(bytes[i])? << 4 | hex_val(bytes[i + 1])?) as f32 / 255.0)
        };

        match bytes.len() {
            3 => {
                let r = hex_val(bytes[0])?;
                let g = hex_val(bytes[1])?;
                let b = hex_val(bytes[2])?;
                Some(Self::rgba(
                    (r * 17) as f32 / 255.0,
                    (g * 17) as f32 / 255.0,
                    (b * 17) as f32 / 255.0,
                    1.0,
                ))
            }
            6 => Some(Self::rgba(pair(0)?, pair(2)?, pair(4)?, 1.0)),
            8 => Some(Self::rgba(pair(0)?, pair(2)?, pair(4)?, pair(6)?)),
            _ => None,
        }
    }

    /// Emit as `#RRGGBB`, or `#RRGGBBAA` when not fully opaque.
    pub fn to_hex(&self) -> String {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        let (r, g, b, a) = (
            channel(self.r),
            channel(self.g),
            channel(self.b),
            channel(self.a),
        );
        if a == 255 {
            format!("#{r:02X}{g:02X}{b:02X}")
        } else {
            format!("#{r:02X}{g:02X}{b:02X}{a:02X}")
        }
    }

    /// Same color with alpha multiplied by `factor`.
    pub fn with_alpha_factor(self, factor: f32) -> Self {
        Self {
            a: self.a * factor.clamp(0.0, 1.0),
            ..self
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Color::from_hex(&s).ok_or_else(|| serde::de::Error::custom(format!("bad color `{s}`")))
    }
}

// ─── Stroke / Shadow ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stroke {
    pub color: Color,
    pub width: f32,
}

impl Default for Stroke {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            width: 1.0,
        }
    }
}

impl Stroke {
    /// A stroke with zero width paints nothing.
    pub fn is_visible(&self) -> bool {
        self.width > 0.0 && self.color.a > 0.0
    }
}

/// Drop shadow for text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Shadow {
    pub color: Color,
    pub blur: f32,
    pub offset_x: f32,
    pub offset_y: f32,
    pub opacity: f32,
}

impl Default for Shadow {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            blur: 4.0,
            offset_x: 2.0,
            offset_y: 2.0,
            opacity: 0.5,
        }
    }
}

// ─── Text ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

impl TextAlign {
    pub fn as_css(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
            Self::Justify => "justify",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextDecoration {
    #[default]
    None,
    Underline,
    LineThrough,
}

impl TextDecoration {
    pub fn as_css(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Underline => "underline",
            Self::LineThrough => "line-through",
        }
    }
}

/// Bold/italic combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FontStyle {
    pub bold: bool,
    pub italic: bool,
}

impl FontStyle {
    /// Canvas-style font style string: `normal`, `bold`, `italic`, `italic bold`.
    pub fn as_css(&self) -> &'static str {
        match (self.bold, self.italic) {
            (false, false) => "normal",
            (true, false) => "bold",
            (false, true) => "italic",
            (true, true) => "italic bold",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextProps {
    pub text: String,
    pub font_family: String,
    pub font_size: f32,
    pub font_style: FontStyle,
    pub align: TextAlign,
    /// Multiplier of `font_size`.
    pub line_height: f32,
    /// Extra advance per glyph, in canvas units.
    pub letter_spacing: f32,
    pub decoration: TextDecoration,
    pub fill: Color,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shadow: Option<Shadow>,
}

impl Default for TextProps {
    fn default() -> Self {
        Self {
            text: "Text".into(),
            font_family: "Inter".into(),
            font_size: 24.0,
            font_style: FontStyle::default(),
            align: TextAlign::Left,
            line_height: 1.2,
            letter_spacing: 0.0,
            decoration: TextDecoration::None,
            fill: Color::BLACK,
            shadow: None,
        }
    }
}

// ─── Image ───────────────────────────────────────────────────────────────

/// Source-space crop rectangle. The zero rect means "no crop".
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Crop {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Crop {
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Image filter values. Each filter is active only when it deviates from
/// its neutral value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageFilters {
    /// Blur radius; neutral 0.
    pub blur: f32,
    /// Percentage 0–200; neutral 100.
    pub brightness: f32,
    /// Percentage 0–200; neutral 100.
    pub contrast: f32,
    pub grayscale: bool,
    pub sepia: bool,
}

impl Default for ImageFilters {
    fn default() -> Self {
        Self {
            blur: 0.0,
            brightness: 100.0,
            contrast: 100.0,
            grayscale: false,
            sepia: false,
        }
    }
}

impl ImageFilters {
    pub fn blur_active(&self) -> bool {
        self.blur > 0.0
    }

    pub fn brightness_active(&self) -> bool {
        (self.brightness - 100.0).abs() > f32::EPSILON
    }

    pub fn contrast_active(&self) -> bool {
        (self.contrast - 100.0).abs() > f32::EPSILON
    }

    pub fn any_active(&self) -> bool {
        self.blur_active()
            || self.brightness_active()
            || self.contrast_active()
            || self.grayscale
            || self.sepia
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Flip {
    pub horizontal: bool,
    pub vertical: bool,
}

/// What an image node stands for. Generated codes and logo assets have
/// dedicated editors and cannot be cropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImageRole {
    #[default]
    Photo,
    QrCode,
    Logo,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageProps {
    pub source: String,
    pub crop: Crop,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke: Option<Stroke>,
    pub corner_radius: f32,
    pub filters: ImageFilters,
    pub flip: Flip,
    pub role: ImageRole,
}

// ─── Icon / shapes / paths ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IconProps {
    /// `prefix:key` or bare `key` (default prefix applies).
    pub name: String,
    pub fill: Color,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke: Option<Stroke>,
}

impl Default for IconProps {
    fn default() -> Self {
        Self {
            name: "star".into(),
            fill: Color::BLACK,
            stroke: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ShapeProps {
    pub fill: Option<Color>,
    pub stroke: Option<Stroke>,
    pub corner_radius: f32,
}

impl Default for ShapeProps {
    fn default() -> Self {
        Self {
            fill: Some(Color::from_hex("#D9D9D9").unwrap_or(Color::BLACK)),
            stroke: None,
            corner_radius: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StarProps {
    pub fill: Option<Color>,
    pub stroke: Option<Stroke>,
    pub num_points: u32,
    /// Inner radius as a fraction of the outer radius.
    pub inner_ratio: f32,
}

impl Default for StarProps {
    fn default() -> Self {
        Self {
            fill: ShapeProps::default().fill,
            stroke: None,
            num_points: 5,
            inner_ratio: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolygonProps {
    pub fill: Option<Color>,
    pub stroke: Option<Stroke>,
    pub sides: u32,
}

impl Default for PolygonProps {
    fn default() -> Self {
        Self {
            fill: ShapeProps::default().fill,
            stroke: None,
            sides: 6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillRule {
    #[default]
    NonZero,
    EvenOdd,
}

/// One sub-path of a path node: SVG path data plus its own fill rule.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SubPath {
    pub data: String,
    pub fill_rule: FillRule,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PathProps {
    pub subpaths: SmallVec<[SubPath; 1]>,
    pub fill: Option<Color>,
    pub stroke: Option<Stroke>,
}

/// Line or arrow: flat `[x0, y0, x1, y1, ...]` points in node-local space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LineProps {
    pub points: Vec<f32>,
    pub stroke: Stroke,
    pub pointer_length: f32,
    pub pointer_width: f32,
}

impl Default for LineProps {
    fn default() -> Self {
        Self {
            points: vec![0.0, 0.0, 100.0, 0.0],
            stroke: Stroke {
                color: Color::BLACK,
                width: 2.0,
            },
            pointer_length: 10.0,
            pointer_width: 10.0,
        }
    }
}

// ─── Node kinds ──────────────────────────────────────────────────────────

/// The closed set of drawable node types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Text,
    Image,
    Icon,
    Rect,
    Circle,
    Ellipse,
    Star,
    RegularPolygon,
    Path,
    Line,
    Arrow,
}

impl NodeKind {
    pub const ALL: [NodeKind; 11] = [
        NodeKind::Text,
        NodeKind::Image,
        NodeKind::Icon,
        NodeKind::Rect,
        NodeKind::Circle,
        NodeKind::Ellipse,
        NodeKind::Star,
        NodeKind::RegularPolygon,
        NodeKind::Path,
        NodeKind::Line,
        NodeKind::Arrow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "Text",
            Self::Image => "Image",
            Self::Icon => "Icon",
            Self::Rect => "Rect",
            Self::Circle => "Circle",
            Self::Ellipse => "Ellipse",
            Self::Star => "Star",
            Self::RegularPolygon => "RegularPolygon",
            Self::Path => "Path",
            Self::Line => "Line",
            Self::Arrow => "Arrow",
        }
    }

    /// Case-insensitive lookup by type name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(name))
    }

    /// Lowercase prefix used for generated IDs.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Icon => "icon",
            Self::Rect => "rect",
            Self::Circle => "circle",
            Self::Ellipse => "ellipse",
            Self::Star => "star",
            Self::RegularPolygon => "polygon",
            Self::Path => "path",
            Self::Line => "line",
            Self::Arrow => "arrow",
        }
    }
}

/// Type-tagged property record. The variant is the node type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "props")]
pub enum NodeProps {
    Text(TextProps),
    Image(ImageProps),
    Icon(IconProps),
    Rect(ShapeProps),
    Circle(ShapeProps),
    Ellipse(ShapeProps),
    Star(StarProps),
    RegularPolygon(PolygonProps),
    Path(PathProps),
    Line(LineProps),
    Arrow(LineProps),
}

impl NodeProps {
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Text(_) => NodeKind::Text,
            Self::Image(_) => NodeKind::Image,
            Self::Icon(_) => NodeKind::Icon,
            Self::Rect(_) => NodeKind::Rect,
            Self::Circle(_) => NodeKind::Circle,
            Self::Ellipse(_) => NodeKind::Ellipse,
            Self::Star(_) => NodeKind::Star,
            Self::RegularPolygon(_) => NodeKind::RegularPolygon,
            Self::Path(_) => NodeKind::Path,
            Self::Line(_) => NodeKind::Line,
            Self::Arrow(_) => NodeKind::Arrow,
        }
    }

    /// Default props for a kind.
    pub fn default_for(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Text => Self::Text(TextProps::default()),
            NodeKind::Image => Self::Image(ImageProps::default()),
            NodeKind::Icon => Self::Icon(IconProps::default()),
            NodeKind::Rect => Self::Rect(ShapeProps::default()),
            NodeKind::Circle => Self::Circle(ShapeProps::default()),
            NodeKind::Ellipse => Self::Ellipse(ShapeProps::default()),
            NodeKind::Star => Self::Star(StarProps::default()),
            NodeKind::RegularPolygon => Self::RegularPolygon(PolygonProps::default()),
            NodeKind::Path => Self::Path(PathProps::default()),
            NodeKind::Line => Self::Line(LineProps::default()),
            NodeKind::Arrow => Self::Arrow(LineProps::default()),
        }
    }

    pub fn as_text(&self) -> Option<&TextProps> {
        match self {
            Self::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImageProps> {
        match self {
            Self::Image(i) => Some(i),
            _ => None,
        }
    }
}

// ─── Geometry ────────────────────────────────────────────────────────────

/// Universal geometric props. `(x, y)` is the top-left of the un-rotated
/// box and also the rotation origin.
///
/// `scale_x`/`scale_y` are the live scale of an in-flight transform gesture;
/// committed nodes always carry 1.0 and express size through width/height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Geometry {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Degrees, clockwise.
    pub rotation: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    pub opacity: f32,
    pub visible: bool,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 100.0,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            opacity: 1.0,
            visible: true,
        }
    }
}

impl Geometry {
    /// Node-local → canvas transform: translate, rotate about the
    /// top-left corner, then scale.
    pub fn transform(&self) -> Affine {
        Affine::translate((self.x as f64, self.y as f64))
            * Affine::rotate((self.rotation as f64).to_radians())
            * Affine::scale_non_uniform(self.scale_x as f64, self.scale_y as f64)
    }

    /// The un-rotated box in node-local space.
    pub fn local_rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width as f64, self.height as f64)
    }

    /// The four corners in canvas space, clockwise from the origin corner.
    pub fn corners(&self) -> [Point; 4] {
        let t = self.transform();
        let (w, h) = (self.width as f64, self.height as f64);
        [
            t * Point::new(0.0, 0.0),
            t * Point::new(w, 0.0),
            t * Point::new(w, h),
            t * Point::new(0.0, h),
        ]
    }

    /// Axis-aligned bounds of the rotated box in canvas space.
    pub fn bounding_box(&self) -> Rect {
        self.transform().transform_rect_bbox(self.local_rect())
    }
}

// ─── Nodes ───────────────────────────────────────────────────────────────

fn default_true() -> bool {
    true
}

fn is_false(v: &bool) -> bool {
    !*v
}

/// One element in the design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawableNode {
    pub id: NodeId,
    #[serde(flatten)]
    pub props: NodeProps,
    #[serde(default)]
    pub geometry: Geometry,
    #[serde(default = "default_true")]
    pub editable: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub locked: bool,
    /// Shared tag for nodes grouped together. Groups never nest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<NodeId>,
}

impl DrawableNode {
    pub fn new(id: NodeId, props: NodeProps, geometry: Geometry) -> Self {
        Self {
            id,
            props,
            geometry,
            editable: true,
            locked: false,
            group: None,
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.props.kind()
    }

    /// Whether gestures and property edits may change this node.
    pub fn is_mutable(&self) -> bool {
        self.editable && !self.locked
    }
}

// ─── Document ────────────────────────────────────────────────────────────

/// Z-order moves, operating on sequence position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ZOrder {
    Forward,
    Backward,
    Front,
    Back,
}

/// The full card design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub width: f32,
    pub height: f32,
    pub background: Color,
    /// Named palette roles (`primary`, `accent`, ...).
    #[serde(default)]
    pub color_roles: BTreeMap<String, Color>,
    /// Paint order: last is topmost.
    #[serde(default)]
    pub nodes: Vec<DrawableNode>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new(1050.0, 600.0)
    }
}

impl Document {
    /// An empty document. The default size is a 3.5" × 2" card at 300 dpi.
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            background: Color::WHITE,
            color_roles: BTreeMap::new(),
            nodes: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        self.nodes.iter().position(|n| n.id == id)
    }

    pub fn get(&self, id: NodeId) -> Option<&DrawableNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut DrawableNode> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.index_of(id).is_some()
    }

    /// Append on top of the paint order.
    pub fn push(&mut self, node: DrawableNode) {
        debug_assert!(!self.contains(node.id), "duplicate node id {}", node.id);
        self.nodes.push(node);
    }

    pub fn remove(&mut self, id: NodeId) -> Option<DrawableNode> {
        let idx = self.index_of(id)?;
        Some(self.nodes.remove(idx))
    }

    /// IDs of every node sharing `group`, in paint order.
    pub fn group_members(&self, group: NodeId) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|n| n.group == Some(group))
            .map(|n| n.id)
            .collect()
    }

    /// Move a node within the paint order. Returns true if the order changed.
    pub fn reorder(&mut self, id: NodeId, to: ZOrder) -> bool {
        let Some(pos) = self.index_of(id) else {
            return false;
        };
        let last = self.nodes.len() - 1;
        let target = match to {
            ZOrder::Forward if pos < last => pos + 1,
            ZOrder::Backward if pos > 0 => pos - 1,
            ZOrder::Front if pos < last => last,
            ZOrder::Back if pos > 0 => 0,
            _ => return false,
        };
        let node = self.nodes.remove(pos);
        self.nodes.insert(target, node);
        true
    }
}
