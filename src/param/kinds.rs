use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64_STANDARD};
use serde_json::Value as JsonValue;

use crate::foundation::core::{Color, Region};
use crate::foundation::error::{ComposerError, ComposerResult};
use crate::param::kind::ParamKind;
use crate::param::parameter::Parameter;
use crate::param::table::ParamSlot;

macro_rules! slot_conversions {
    ($variant:ident) => {
        fn into_slot(param: Parameter<Self>) -> ParamSlot {
            ParamSlot::$variant(param)
        }

        fn from_slot(slot: &ParamSlot) -> Option<&Parameter<Self>> {
            match slot {
                ParamSlot::$variant(p) => Some(p),
                _ => None,
            }
        }

        fn from_slot_mut(slot: &mut ParamSlot) -> Option<&mut Parameter<Self>> {
            match slot {
                ParamSlot::$variant(p) => Some(p),
                _ => None,
            }
        }
    };
}

/// Single-line text entry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TextField {
    pub text: String,
}

impl TextField {
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }
}

/// Numeric entry with optional bounds.
#[derive(Clone, Debug, Default)]
pub struct NumberKind {
    /// Accept fractional values.
    pub decimal: bool,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl NumberKind {
    pub fn integer() -> Self {
        Self::default()
    }

    pub fn decimal() -> Self {
        Self {
            decimal: true,
            ..Self::default()
        }
    }

    pub fn at_least(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn at_most(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }
}

fn is_integral(v: f64) -> bool {
    v.fract() == 0.0 && v.abs() < 9.0e15
}

impl ParamKind for NumberKind {
    type Value = f64;
    type Handle = TextField;

    const TAG: &'static str = "number";

    fn create_handle(&self) -> Option<TextField> {
        Some(TextField::default())
    }

    fn read_value(&self, handle: &TextField) -> ComposerResult<f64> {
        let t = handle.text.trim();
        let v = t
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| ComposerError::invalid_input(format!("\"{t}\" is not a number")))?;
        if !self.decimal && v.fract() != 0.0 {
            return Err(ComposerError::invalid_input(format!(
                "\"{t}\" is not a whole number"
            )));
        }
        Ok(v)
    }

    fn write_value(&self, handle: &mut TextField, value: &f64) {
        handle.text = if is_integral(*value) {
            format!("{}", *value as i64)
        } else {
            format!("{value}")
        };
    }

    fn is_semantically_valid(&self, value: &f64) -> bool {
        self.min.is_none_or(|min| *value >= min) && self.max.is_none_or(|max| *value <= max)
    }

    fn to_json(&self, value: &f64) -> JsonValue {
        if is_integral(*value) {
            JsonValue::from(*value as i64)
        } else {
            serde_json::Number::from_f64(*value)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null)
        }
    }

    fn from_json(&self, json: &JsonValue) -> Result<f64, String> {
        json.as_f64().ok_or_else(|| "expected a number".to_owned())
    }

    slot_conversions!(Number);
}

/// Color picker state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColorPicker {
    pub color: Color,
}

#[derive(Clone, Debug, Default)]
pub struct ColorKind;

impl ParamKind for ColorKind {
    type Value = Color;
    type Handle = ColorPicker;

    const TAG: &'static str = "color";

    fn create_handle(&self) -> Option<ColorPicker> {
        Some(ColorPicker {
            color: Color::BLACK,
        })
    }

    fn read_value(&self, handle: &ColorPicker) -> ComposerResult<Color> {
        Ok(handle.color)
    }

    fn write_value(&self, handle: &mut ColorPicker, value: &Color) {
        handle.color = *value;
    }

    fn to_json(&self, value: &Color) -> JsonValue {
        JsonValue::String(value.to_hex())
    }

    fn from_json(&self, json: &JsonValue) -> Result<Color, String> {
        let s = json.as_str().ok_or("expected a hex color string")?;
        Color::parse_hex(s).map_err(|e| e.to_string())
    }

    slot_conversions!(Color);
}

/// Free text.
#[derive(Clone, Debug, Default)]
pub struct TextKind {
    pub allow_empty: bool,
}

impl ParamKind for TextKind {
    type Value = String;
    type Handle = TextField;

    const TAG: &'static str = "text";

    fn create_handle(&self) -> Option<TextField> {
        Some(TextField::default())
    }

    fn read_value(&self, handle: &TextField) -> ComposerResult<String> {
        Ok(handle.text.clone())
    }

    fn write_value(&self, handle: &mut TextField, value: &String) {
        handle.text.clone_from(value);
    }

    fn is_semantically_valid(&self, value: &String) -> bool {
        self.allow_empty || !value.trim().is_empty()
    }

    fn to_json(&self, value: &String) -> JsonValue {
        JsonValue::String(value.clone())
    }

    fn from_json(&self, json: &JsonValue) -> Result<String, String> {
        json.as_str()
            .map(str::to_owned)
            .ok_or_else(|| "expected a string".to_owned())
    }

    slot_conversions!(Text);
}

/// Drop-down selection over a fixed option list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChoiceBox {
    pub options: Vec<String>,
    pub selected: Option<usize>,
}

impl ChoiceBox {
    pub fn select(&mut self, option: &str) -> bool {
        self.selected = self.options.iter().position(|o| o == option);
        self.selected.is_some()
    }
}

/// Enumerated choice persisted as its string tag.
#[derive(Clone, Debug, Default)]
pub struct ChoiceKind {
    pub options: Vec<String>,
}

impl ChoiceKind {
    pub fn new<I, S>(options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            options: options.into_iter().map(Into::into).collect(),
        }
    }
}

impl ParamKind for ChoiceKind {
    type Value = String;
    type Handle = ChoiceBox;

    const TAG: &'static str = "choice";

    fn create_handle(&self) -> Option<ChoiceBox> {
        Some(ChoiceBox {
            options: self.options.clone(),
            selected: None,
        })
    }

    fn read_value(&self, handle: &ChoiceBox) -> ComposerResult<String> {
        handle
            .selected
            .and_then(|i| handle.options.get(i))
            .cloned()
            .ok_or_else(|| ComposerError::invalid_input("nothing selected"))
    }

    fn write_value(&self, handle: &mut ChoiceBox, value: &String) {
        handle.select(value);
    }

    fn is_semantically_valid(&self, value: &String) -> bool {
        self.options.iter().any(|o| o == value)
    }

    fn to_json(&self, value: &String) -> JsonValue {
        JsonValue::String(value.clone())
    }

    fn from_json(&self, json: &JsonValue) -> Result<String, String> {
        json.as_str()
            .map(str::to_owned)
            .ok_or_else(|| "expected a choice tag string".to_owned())
    }

    slot_conversions!(Choice);
}

/// Four integer fields describing a [`Region`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegionFields {
    pub x: String,
    pub y: String,
    pub width: String,
    pub height: String,
}

impl Default for RegionFields {
    fn default() -> Self {
        Self {
            x: "0".to_owned(),
            y: "0".to_owned(),
            width: "0".to_owned(),
            height: "0".to_owned(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct RegionKind;

impl ParamKind for RegionKind {
    type Value = Region;
    type Handle = RegionFields;

    const TAG: &'static str = "region";

    fn create_handle(&self) -> Option<RegionFields> {
        Some(RegionFields::default())
    }

    fn read_value(&self, handle: &RegionFields) -> ComposerResult<Region> {
        fn field(name: &str, s: &str) -> ComposerResult<i32> {
            s.trim().parse::<i32>().map_err(|_| {
                ComposerError::invalid_input(format!("{name} \"{s}\" is not an integer"))
            })
        }
        Ok(Region {
            x: field("x", &handle.x)?,
            y: field("y", &handle.y)?,
            width: field("width", &handle.width)?,
            height: field("height", &handle.height)?,
        })
    }

    fn write_value(&self, handle: &mut RegionFields, value: &Region) {
        handle.x = value.x.to_string();
        handle.y = value.y.to_string();
        handle.width = value.width.to_string();
        handle.height = value.height.to_string();
    }

    fn is_semantically_valid(&self, value: &Region) -> bool {
        value.width >= 0 && value.height >= 0
    }

    fn to_json(&self, value: &Region) -> JsonValue {
        serde_json::json!({
            "x": value.x,
            "y": value.y,
            "width": value.width,
            "height": value.height,
        })
    }

    fn from_json(&self, json: &JsonValue) -> Result<Region, String> {
        serde_json::from_value(json.clone()).map_err(|e| e.to_string())
    }

    slot_conversions!(Region);
}

/// Immutable straight-alpha RGBA8 image shared between parameter, module and worker.
#[derive(Clone)]
pub struct ImageData(Arc<image::RgbaImage>);

impl ImageData {
    pub fn new(image: image::RgbaImage) -> Self {
        Self(Arc::new(image))
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    pub fn as_image(&self) -> &image::RgbaImage {
        &self.0
    }

    /// Copy-on-write access for in-place painting.
    pub fn make_mut(&mut self) -> &mut image::RgbaImage {
        Arc::make_mut(&mut self.0)
    }

    pub fn to_premul_bytes(&self) -> Vec<u8> {
        let mut px = self.0.as_raw().clone();
        crate::foundation::math::premultiply_in_place(&mut px);
        px
    }

    pub fn from_encoded(bytes: &[u8]) -> ComposerResult<Self> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| ComposerError::invalid_input(format!("image decode failed: {e}")))?;
        Ok(Self::new(img.to_rgba8()))
    }

    pub fn to_png(&self) -> ComposerResult<Vec<u8>> {
        let mut out = std::io::Cursor::new(Vec::new());
        self.0
            .write_to(&mut out, image::ImageFormat::Png)
            .map_err(|e| ComposerError::serde(format!("png encode failed: {e}")))?;
        Ok(out.into_inner())
    }
}

impl PartialEq for ImageData {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
            || (self.0.dimensions() == other.0.dimensions() && self.0.as_raw() == other.0.as_raw())
    }
}

impl std::fmt::Debug for ImageData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ImageData({}x{})", self.width(), self.height())
    }
}

/// Image chooser state.
#[derive(Clone, Debug, Default)]
pub struct ImageSlot {
    pub image: Option<ImageData>,
}

/// Image data persisted as base64-encoded PNG.
#[derive(Clone, Debug, Default)]
pub struct ImageKind {
    /// No chooser; the owning module writes the value itself.
    pub headless: bool,
}

impl ImageKind {
    pub fn headless() -> Self {
        Self { headless: true }
    }
}

impl ParamKind for ImageKind {
    type Value = ImageData;
    type Handle = ImageSlot;

    const TAG: &'static str = "image";

    fn create_handle(&self) -> Option<ImageSlot> {
        (!self.headless).then(ImageSlot::default)
    }

    fn read_value(&self, handle: &ImageSlot) -> ComposerResult<ImageData> {
        handle
            .image
            .clone()
            .ok_or_else(|| ComposerError::invalid_input("no image selected"))
    }

    fn write_value(&self, handle: &mut ImageSlot, value: &ImageData) {
        handle.image = Some(value.clone());
    }

    fn is_semantically_valid(&self, value: &ImageData) -> bool {
        value.width() > 0 && value.height() > 0
    }

    fn to_json(&self, value: &ImageData) -> JsonValue {
        match value.to_png() {
            Ok(bytes) => JsonValue::String(BASE64_STANDARD.encode(bytes)),
            Err(e) => {
                tracing::warn!(error = %e, "dropping image value from serialized output");
                JsonValue::Null
            }
        }
    }

    fn from_json(&self, json: &JsonValue) -> Result<ImageData, String> {
        let s = json.as_str().ok_or("expected a base64 string")?;
        let bytes = BASE64_STANDARD
            .decode(s.trim())
            .map_err(|e| format!("invalid base64: {e}"))?;
        ImageData::from_encoded(&bytes).map_err(|e| e.to_string())
    }

    slot_conversions!(Image);
}

/// Opaque JSON carried without an editor.
#[derive(Clone, Debug, Default)]
pub struct HiddenKind;

impl ParamKind for HiddenKind {
    type Value = JsonValue;
    type Handle = ();

    const TAG: &'static str = "hidden";

    fn create_handle(&self) -> Option<()> {
        None
    }

    fn read_value(&self, _handle: &()) -> ComposerResult<JsonValue> {
        Err(ComposerError::invalid_input("hidden parameters have no handle"))
    }

    fn write_value(&self, _handle: &mut (), _value: &JsonValue) {}

    fn is_semantically_valid(&self, value: &JsonValue) -> bool {
        !value.is_null()
    }

    fn to_json(&self, value: &JsonValue) -> JsonValue {
        value.clone()
    }

    fn from_json(&self, json: &JsonValue) -> Result<JsonValue, String> {
        Ok(json.clone())
    }

    slot_conversions!(Hidden);
}

#[cfg(test)]
#[path = "../../tests/unit/param/kinds.rs"]
mod tests;
