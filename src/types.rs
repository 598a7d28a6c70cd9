use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    pub w: u32,
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    pub h: u32,
}

impl Rect {
    pub fn new(w: u32, h: u32) -> Self {
        Self { w, h }
    }

    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }

    pub fn rotated(&self) -> Self {
        Self {
            w: self.h,
            h: self.w,
        }
    }

    pub fn fits_in(&self, other: &Rect) -> bool {
        self.w <= other.w && self.h <= other.h
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.w, self.h)
    }
}

/// Which way a rectangle is laid on the sheet. `A` keeps the requested
/// width along the sheet width, `B` turns it by a quarter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    A,
    B,
}

impl Orientation {
    pub fn apply(self, rect: Rect) -> Rect {
        match self {
            Orientation::A => rect,
            Orientation::B => rect.rotated(),
        }
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Orientation::A => write!(f, "A"),
            Orientation::B => write!(f, "B"),
        }
    }
}

/// Grain of meshed sheet material (expanded metal). A row marked `A` or `B`
/// may only be cut in that orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MeshDirection {
    #[serde(alias = "tatami", alias = "a")]
    A,
    #[serde(alias = "soroban", alias = "b")]
    B,
    #[default]
    #[serde(rename = "free")]
    Free,
}

impl MeshDirection {
    pub fn permits(self, orientation: Orientation) -> bool {
        match self {
            MeshDirection::Free => true,
            MeshDirection::A => orientation == Orientation::A,
            MeshDirection::B => orientation == Orientation::B,
        }
    }
}

/// One 1D demand row: `quantity` pieces of `length` mm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Piece {
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    pub length: u32,
    #[serde(alias = "qty", deserialize_with = "deserialize_u32_from_number")]
    pub quantity: u32,
}

impl Piece {
    pub fn new(length: u32, quantity: u32) -> Self {
        Self { length, quantity }
    }
}

/// One 2D demand row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rectangle {
    #[serde(alias = "w", deserialize_with = "deserialize_u32_from_number")]
    pub width: u32,
    #[serde(alias = "h", deserialize_with = "deserialize_u32_from_number")]
    pub height: u32,
    #[serde(alias = "qty", deserialize_with = "deserialize_u32_from_number")]
    pub quantity: u32,
    #[serde(default, alias = "meshKind")]
    pub mesh_direction: MeshDirection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Rectangle {
    pub fn new(width: u32, height: u32, quantity: u32) -> Self {
        Self {
            width,
            height,
            quantity,
            mesh_direction: MeshDirection::Free,
            label: None,
        }
    }

    pub fn with_mesh(mut self, mesh_direction: MeshDirection) -> Self {
        self.mesh_direction = mesh_direction;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.width, self.height)
    }

    /// Label printed on cut sheets; falls back to the nominal size.
    pub fn display_label(&self) -> String {
        match self.label.as_deref().map(str::trim) {
            Some(label) if !label.is_empty() => label.to_string(),
            _ => self.rect().to_string(),
        }
    }
}

/// A standard length offered by the supplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLength {
    pub id: String,
    pub name: String,
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    pub length: u32,
}

impl StockLength {
    pub fn new(length: u32) -> Self {
        Self {
            id: length.to_string(),
            name: length.to_string(),
            length,
        }
    }
}

/// A standard sheet offered by the supplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockSheet {
    pub id: String,
    pub name: String,
    #[serde(alias = "w", deserialize_with = "deserialize_u32_from_number")]
    pub width: u32,
    #[serde(alias = "h", deserialize_with = "deserialize_u32_from_number")]
    pub height: u32,
}

impl StockSheet {
    pub fn new(id: impl Into<String>, width: u32, height: u32) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            width,
            height,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.width, self.height)
    }
}

/// On-hand leftover bars of one length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemnantBar {
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    pub length: u32,
    #[serde(alias = "qty", deserialize_with = "deserialize_u32_from_number")]
    pub quantity: u32,
}

impl RemnantBar {
    pub fn new(length: u32, quantity: u32) -> Self {
        Self { length, quantity }
    }
}

/// On-hand leftover sheets of one size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemnantSheet {
    #[serde(alias = "w", deserialize_with = "deserialize_u32_from_number")]
    pub width: u32,
    #[serde(alias = "h", deserialize_with = "deserialize_u32_from_number")]
    pub height: u32,
    #[serde(alias = "qty", deserialize_with = "deserialize_u32_from_number")]
    pub quantity: u32,
}

impl RemnantSheet {
    pub fn new(width: u32, height: u32, quantity: u32) -> Self {
        Self {
            width,
            height,
            quantity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Stock,
    Remnant,
}

/// One cut bar. With `repeat_count > 1` the record stands for that many
/// physically identical bars.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bar {
    pub stock_length: u32,
    pub source: SourceType,
    pub cuts: Vec<u32>,
    pub remainder: u32,
    pub kerf_total: u32,
    pub repeat_count: u32,
}

impl Bar {
    /// Material consumed by cuts and kerf on one physical bar.
    pub fn used(&self) -> u32 {
        self.stock_length - self.remainder
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SheetRef {
    pub id: Option<String>,
    pub name: String,
    pub width: u32,
    pub height: u32,
}

impl SheetRef {
    pub fn remnant(rect: Rect) -> Self {
        Self {
            id: None,
            name: "remnant".to_string(),
            width: rect.w,
            height: rect.h,
        }
    }

    pub fn stock(sheet: &StockSheet) -> Self {
        Self {
            id: Some(sheet.id.clone()),
            name: sheet.name.clone(),
            width: sheet.width,
            height: sheet.height,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.width, self.height)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PlacedRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PartCount {
    pub label: String,
    pub qty: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Layout {
    /// One rectangle type in an `nx` by `ny` grid from the sheet origin.
    Grid {
        orientation: Orientation,
        nx: u32,
        ny: u32,
        part_width: u32,
        part_height: u32,
    },
    /// Shelf-packed mix of rectangle types.
    Mixed { rects: Vec<PlacedRect> },
}

/// One cut sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub source: SourceType,
    pub sheet: SheetRef,
    pub layout: Layout,
    pub made: u32,
    pub parts_summary: Vec<PartCount>,
}

/// Accepts JSON integers, floats (rounded) and numeric strings.
pub fn deserialize_u32_from_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    struct U32Visitor;

    impl Visitor<'_> for U32Visitor {
        type Value = u32;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            f.write_str("a non-negative number")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<u32, E> {
            u32::try_from(v).map_err(|_| E::custom(format!("{v} is out of range")))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<u32, E> {
            u32::try_from(v).map_err(|_| E::custom(format!("{v} is out of range")))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<u32, E> {
            let rounded = v.round();
            if !rounded.is_finite() || rounded < 0.0 || rounded > u32::MAX as f64 {
                return Err(E::custom(format!("{v} is out of range")));
            }
            Ok(rounded as u32)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<u32, E> {
            let parsed: f64 = v
                .trim()
                .parse()
                .map_err(|_| E::custom(format!("'{v}' is not a number")))?;
            self.visit_f64(parsed)
        }
    }

    deserializer.deserialize_any(U32Visitor)
}
