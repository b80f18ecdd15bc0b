//! Typed uniform values, their std140 block encoding, and per-frame
//! parameter snapshots.

use std::fmt;

use encase::{internal::CreateFrom, internal::WriteInto, ShaderType};
use glam::{IVec2, IVec3, IVec4, Mat2, Mat3, Mat4, Vec2, Vec3, Vec4};

use crate::context::TextureHandle;

/// A value that can be written to a shader uniform.
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    /// Stored as a `0`/`1` integer.
    Bool(bool),
    /// `i32`.
    Int(i32),
    /// `u32`.
    UInt(u32),
    /// `f32`.
    Float(f32),
    /// Narrowed to `f32` on write.
    Double(f64),
    /// `vec2<i32>`.
    IVec2(IVec2),
    /// `vec3<i32>`.
    IVec3(IVec3),
    /// `vec4<i32>`.
    IVec4(IVec4),
    /// `vec2<f32>`.
    Vec2(Vec2),
    /// `vec3<f32>`.
    Vec3(Vec3),
    /// `vec4<f32>`.
    Vec4(Vec4),
    /// `mat2x2<f32>`.
    Mat2(Mat2),
    /// `mat3x3<f32>`.
    Mat3(Mat3),
    /// `mat4x4<f32>`.
    Mat4(Mat4),
    /// Array of `vec2<f32>`; may target a `vec4` array (xy written).
    Vec2Array(Vec<Vec2>),
    /// Array of `vec3<f32>`; may target a `vec4` array (xyz written).
    Vec3Array(Vec<Vec3>),
    /// Array of `vec4<f32>`.
    Vec4Array(Vec<Vec4>),
}

impl UniformValue {
    /// Short type name used in diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "i32",
            Self::UInt(_) => "u32",
            Self::Float(_) => "f32",
            Self::Double(_) => "f64",
            Self::IVec2(_) => "vec2<i32>",
            Self::IVec3(_) => "vec3<i32>",
            Self::IVec4(_) => "vec4<i32>",
            Self::Vec2(_) => "vec2<f32>",
            Self::Vec3(_) => "vec3<f32>",
            Self::Vec4(_) => "vec4<f32>",
            Self::Mat2(_) => "mat2x2<f32>",
            Self::Mat3(_) => "mat3x3<f32>",
            Self::Mat4(_) => "mat4x4<f32>",
            Self::Vec2Array(_) => "array<vec2<f32>>",
            Self::Vec3Array(_) => "array<vec3<f32>>",
            Self::Vec4Array(_) => "array<vec4<f32>>",
        }
    }
}

/// Element type of an array uniform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArrayElement {
    /// `vec2<f32>`.
    Vec2,
    /// `vec3<f32>`.
    Vec3,
    /// `vec4<f32>`.
    Vec4,
}

impl ArrayElement {
    fn size(self) -> u32 {
        match self {
            Self::Vec2 => 8,
            Self::Vec3 => 12,
            Self::Vec4 => 16,
        }
    }

    /// Whether elements of `value` type can be stored in slots of `self`.
    fn accepts(self, value: Self) -> bool {
        self == value || self == Self::Vec4
    }
}

/// Declared type of a uniform as seen by the shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformKind {
    /// `i32`.
    Int,
    /// `u32`.
    UInt,
    /// `f32`.
    Float,
    /// `vec2<i32>`.
    IVec2,
    /// `vec3<i32>`.
    IVec3,
    /// `vec4<i32>`.
    IVec4,
    /// `vec2<f32>`.
    Vec2,
    /// `vec3<f32>`.
    Vec3,
    /// `vec4<f32>`.
    Vec4,
    /// `mat2x2<f32>`.
    Mat2,
    /// `mat3x3<f32>`.
    Mat3,
    /// `mat4x4<f32>`.
    Mat4,
    /// Fixed-length array of float vectors.
    Array {
        /// Element type.
        element: ArrayElement,
        /// Number of elements.
        len: u32,
        /// Byte distance between consecutive elements.
        stride: u32,
    },
}

impl UniformKind {
    /// Array kind with the uniform address space stride (16 bytes).
    #[must_use]
    pub fn array(element: ArrayElement, len: u32) -> Self {
        Self::Array {
            element,
            len,
            stride: 16,
        }
    }

    /// Bytes occupied in the uniform block.
    #[must_use]
    pub fn size(self) -> u32 {
        match self {
            Self::Int | Self::UInt | Self::Float => 4,
            Self::IVec2 | Self::Vec2 => 8,
            Self::IVec3 | Self::Vec3 => 12,
            Self::IVec4 | Self::Vec4 | Self::Mat2 => 16,
            Self::Mat3 => 48,
            Self::Mat4 => 64,
            Self::Array { len, stride, .. } => len * stride,
        }
    }

    /// Required alignment in the uniform address space.
    #[must_use]
    pub fn align(self) -> u32 {
        match self {
            Self::Int | Self::UInt | Self::Float => 4,
            Self::IVec2 | Self::Vec2 | Self::Mat2 => 8,
            _ => 16,
        }
    }
}

impl fmt::Display for UniformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int => f.write_str("i32"),
            Self::UInt => f.write_str("u32"),
            Self::Float => f.write_str("f32"),
            Self::IVec2 => f.write_str("vec2<i32>"),
            Self::IVec3 => f.write_str("vec3<i32>"),
            Self::IVec4 => f.write_str("vec4<i32>"),
            Self::Vec2 => f.write_str("vec2<f32>"),
            Self::Vec3 => f.write_str("vec3<f32>"),
            Self::Vec4 => f.write_str("vec4<f32>"),
            Self::Mat2 => f.write_str("mat2x2<f32>"),
            Self::Mat3 => f.write_str("mat3x3<f32>"),
            Self::Mat4 => f.write_str("mat4x4<f32>"),
            Self::Array { element, len, .. } => {
                let elem = match element {
                    ArrayElement::Vec2 => "vec2<f32>",
                    ArrayElement::Vec3 => "vec3<f32>",
                    ArrayElement::Vec4 => "vec4<f32>",
                };
                write!(f, "array<{elem}, {len}>")
            }
        }
    }
}

/// A value could not be stored in a uniform slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UniformError {
    /// The value's type does not fit the declared kind.
    Mismatch {
        /// Declared kind.
        expected: UniformKind,
        /// Type name of the rejected value.
        found: &'static str,
    },
    /// Block serialization failed.
    Encoding(String),
}

impl fmt::Display for UniformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mismatch { expected, found } => {
                write!(f, "cannot store {found} in a {expected} uniform")
            }
            Self::Encoding(msg) => write!(f, "uniform encoding failed: {msg}"),
        }
    }
}

impl std::error::Error for UniformError {}

fn encode<T: ShaderType + WriteInto>(value: &T) -> Result<Vec<u8>, UniformError> {
    let mut buffer = encase::UniformBuffer::new(Vec::<u8>::new());
    buffer
        .write(value)
        .map_err(|e| UniformError::Encoding(e.to_string()))?;
    Ok(buffer.into_inner())
}

fn decode<T: ShaderType + CreateFrom>(bytes: &[u8]) -> Option<T> {
    encase::UniformBuffer::new(bytes.to_vec()).create().ok()
}

fn put(dst: &mut [u8], bytes: &[u8]) {
    let n = bytes.len().min(dst.len());
    dst[..n].copy_from_slice(&bytes[..n]);
}

fn write_elements<T: ShaderType + WriteInto>(
    dst: &mut [u8],
    items: &[T],
    len: u32,
    stride: u32,
) -> Result<usize, UniformError> {
    let count = items.len().min(len as usize);
    for (i, item) in items.iter().take(count).enumerate() {
        let start = i * stride as usize;
        put(&mut dst[start..start + stride as usize], &encode(item)?);
    }
    Ok(count)
}

/// Encode `value` into `dst`, the slot of a uniform declared as `kind`.
///
/// Returns the number of array elements written (1 for non-arrays).
/// Arrays longer than the declared length are truncated.
pub(crate) fn write_value(
    value: &UniformValue,
    kind: UniformKind,
    dst: &mut [u8],
) -> Result<usize, UniformError> {
    let mismatch = || UniformError::Mismatch {
        expected: kind,
        found: value.type_name(),
    };
    let bytes = match (value, kind) {
        (UniformValue::Bool(b), UniformKind::Int) => encode(&i32::from(*b))?,
        (UniformValue::Bool(b), UniformKind::UInt) => encode(&u32::from(*b))?,
        (UniformValue::Int(v), UniformKind::Int) => encode(v)?,
        (UniformValue::UInt(v), UniformKind::UInt) => encode(v)?,
        (UniformValue::Float(v), UniformKind::Float) => encode(v)?,
        (UniformValue::Double(v), UniformKind::Float) => encode(&(*v as f32))?,
        (UniformValue::IVec2(v), UniformKind::IVec2) => encode(v)?,
        (UniformValue::IVec3(v), UniformKind::IVec3) => encode(v)?,
        (UniformValue::IVec4(v), UniformKind::IVec4) => encode(v)?,
        (UniformValue::Vec2(v), UniformKind::Vec2) => encode(v)?,
        (UniformValue::Vec3(v), UniformKind::Vec3) => encode(v)?,
        (UniformValue::Vec4(v), UniformKind::Vec4) => encode(v)?,
        (UniformValue::Mat2(v), UniformKind::Mat2) => encode(v)?,
        (UniformValue::Mat3(v), UniformKind::Mat3) => encode(v)?,
        (UniformValue::Mat4(v), UniformKind::Mat4) => encode(v)?,
        (
            UniformValue::Vec2Array(items),
            UniformKind::Array {
                element,
                len,
                stride,
            },
        ) if element.accepts(ArrayElement::Vec2) => {
            return write_elements(dst, items, len, stride);
        }
        (
            UniformValue::Vec3Array(items),
            UniformKind::Array {
                element,
                len,
                stride,
            },
        ) if element.accepts(ArrayElement::Vec3) => {
            return write_elements(dst, items, len, stride);
        }
        (
            UniformValue::Vec4Array(items),
            UniformKind::Array {
                element: ArrayElement::Vec4,
                len,
                stride,
            },
        ) => return write_elements(dst, items, len, stride),
        _ => return Err(mismatch()),
    };
    put(dst, &bytes);
    Ok(1)
}

fn read_elements<T: ShaderType + CreateFrom>(
    src: &[u8],
    element: ArrayElement,
    len: u32,
    stride: u32,
) -> Option<Vec<T>> {
    (0..len as usize)
        .map(|i| {
            let start = i * stride as usize;
            decode(&src[start..start + element.size() as usize])
        })
        .collect()
}

/// Decode the slot of a uniform declared as `kind`.
pub(crate) fn read_value(kind: UniformKind, src: &[u8]) -> Option<UniformValue> {
    Some(match kind {
        UniformKind::Int => UniformValue::Int(decode(src)?),
        UniformKind::UInt => UniformValue::UInt(decode(src)?),
        UniformKind::Float => UniformValue::Float(decode(src)?),
        UniformKind::IVec2 => UniformValue::IVec2(decode(src)?),
        UniformKind::IVec3 => UniformValue::IVec3(decode(src)?),
        UniformKind::IVec4 => UniformValue::IVec4(decode(src)?),
        UniformKind::Vec2 => UniformValue::Vec2(decode(src)?),
        UniformKind::Vec3 => UniformValue::Vec3(decode(src)?),
        UniformKind::Vec4 => UniformValue::Vec4(decode(src)?),
        UniformKind::Mat2 => UniformValue::Mat2(decode(src)?),
        UniformKind::Mat3 => UniformValue::Mat3(decode(src)?),
        UniformKind::Mat4 => UniformValue::Mat4(decode(src)?),
        UniformKind::Array {
            element,
            len,
            stride,
        } => match element {
            ArrayElement::Vec2 => {
                UniformValue::Vec2Array(read_elements(src, element, len, stride)?)
            }
            ArrayElement::Vec3 => {
                UniformValue::Vec3Array(read_elements(src, element, len, stride)?)
            }
            ArrayElement::Vec4 => {
                UniformValue::Vec4Array(read_elements(src, element, len, stride)?)
            }
        },
    })
}

// ── Conversions ──────────────────────────────────────────────────────────

macro_rules! impl_uniform_type {
    ($ty:ty, $variant:ident) => {
        impl From<$ty> for UniformValue {
            fn from(v: $ty) -> Self {
                Self::$variant(v)
            }
        }

        impl UniformType for $ty {
            fn from_value(value: &UniformValue) -> Option<Self> {
                match value {
                    UniformValue::$variant(v) => Some(*v),
                    _ => None,
                }
            }
        }
    };
}

/// A Rust type that can be read back from a uniform slot.
pub trait UniformType: Sized {
    /// Convert a decoded value, if its type is compatible.
    fn from_value(value: &UniformValue) -> Option<Self>;
}

impl_uniform_type!(i32, Int);
impl_uniform_type!(u32, UInt);
impl_uniform_type!(f32, Float);
impl_uniform_type!(IVec2, IVec2);
impl_uniform_type!(IVec3, IVec3);
impl_uniform_type!(IVec4, IVec4);
impl_uniform_type!(Vec2, Vec2);
impl_uniform_type!(Vec3, Vec3);
impl_uniform_type!(Vec4, Vec4);
impl_uniform_type!(Mat2, Mat2);
impl_uniform_type!(Mat3, Mat3);
impl_uniform_type!(Mat4, Mat4);

impl From<bool> for UniformValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl UniformType for bool {
    fn from_value(value: &UniformValue) -> Option<Self> {
        match value {
            UniformValue::Bool(b) => Some(*b),
            UniformValue::Int(v) => Some(*v != 0),
            UniformValue::UInt(v) => Some(*v != 0),
            _ => None,
        }
    }
}

impl From<f64> for UniformValue {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl UniformType for f64 {
    fn from_value(value: &UniformValue) -> Option<Self> {
        match value {
            UniformValue::Double(v) => Some(*v),
            UniformValue::Float(v) => Some(f64::from(*v)),
            _ => None,
        }
    }
}

impl From<Vec<Vec2>> for UniformValue {
    fn from(v: Vec<Vec2>) -> Self {
        Self::Vec2Array(v)
    }
}

impl From<&[Vec2]> for UniformValue {
    fn from(v: &[Vec2]) -> Self {
        Self::Vec2Array(v.to_vec())
    }
}

impl From<&[Vec3]> for UniformValue {
    fn from(v: &[Vec3]) -> Self {
        Self::Vec3Array(v.to_vec())
    }
}

impl From<&[Vec4]> for UniformValue {
    fn from(v: &[Vec4]) -> Self {
        Self::Vec4Array(v.to_vec())
    }
}

impl From<Vec<Vec3>> for UniformValue {
    fn from(v: Vec<Vec3>) -> Self {
        Self::Vec3Array(v)
    }
}

impl From<Vec<Vec4>> for UniformValue {
    fn from(v: Vec<Vec4>) -> Self {
        Self::Vec4Array(v)
    }
}

impl UniformType for Vec<Vec3> {
    fn from_value(value: &UniformValue) -> Option<Self> {
        match value {
            UniformValue::Vec3Array(v) => Some(v.clone()),
            UniformValue::Vec4Array(v) => Some(v.iter().map(|e| e.truncate()).collect()),
            _ => None,
        }
    }
}

impl UniformType for Vec<Vec4> {
    fn from_value(value: &UniformValue) -> Option<Self> {
        match value {
            UniformValue::Vec4Array(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl UniformType for Vec<Vec2> {
    fn from_value(value: &UniformValue) -> Option<Self> {
        match value {
            UniformValue::Vec2Array(v) => Some(v.clone()),
            UniformValue::Vec4Array(v) => Some(v.iter().map(|e| e.truncate().truncate()).collect()),
            _ => None,
        }
    }
}

// ── Parameter snapshots ──────────────────────────────────────────────────

/// A snapshot of uniform values and texture bindings to apply to a
/// program before drawing.
///
/// Built fresh each frame from scene state, so nothing outlives the
/// values it was made from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters {
    uniforms: Vec<(String, UniformValue)>,
    textures: Vec<(String, TextureHandle)>,
}

impl Parameters {
    /// Empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a uniform value (builder form).
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<UniformValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Append a texture binding (builder form).
    #[must_use]
    pub fn with_texture(mut self, name: impl Into<String>, texture: TextureHandle) -> Self {
        self.set_texture(name, texture);
        self
    }

    /// Append a uniform value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<UniformValue>) {
        self.uniforms.push((name.into(), value.into()));
    }

    /// Append a texture binding.
    pub fn set_texture(&mut self, name: impl Into<String>, texture: TextureHandle) {
        self.textures.push((name.into(), texture));
    }

    /// Uniform entries in insertion order.
    #[must_use]
    pub fn uniforms(&self) -> &[(String, UniformValue)] {
        &self.uniforms
    }

    /// Texture entries in insertion order.
    #[must_use]
    pub fn textures(&self) -> &[(String, TextureHandle)] {
        &self.textures
    }

    /// Whether the snapshot holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.uniforms.is_empty() && self.textures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(kind: UniformKind) -> Vec<u8> {
        vec![0; kind.size() as usize]
    }

    #[test]
    fn mat3_occupies_padded_columns() {
        let kind = UniformKind::Mat3;
        let mut dst = slot(kind);
        let m = Mat3::from_cols_array(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
        assert_eq!(write_value(&m.into(), kind, &mut dst), Ok(1));
        let floats: Vec<f32> = bytemuck::pod_collect_to_vec(&dst);
        assert_eq!(&floats[0..3], &[1.0, 2.0, 3.0]);
        assert_eq!(&floats[4..7], &[4.0, 5.0, 6.0]);
        assert_eq!(&floats[8..11], &[7.0, 8.0, 9.0]);
        assert_eq!(read_value(kind, &dst), Some(UniformValue::Mat3(m)));
    }

    #[test]
    fn bool_and_double_are_narrowed() {
        let mut dst = slot(UniformKind::Int);
        assert!(write_value(&true.into(), UniformKind::Int, &mut dst).is_ok());
        assert_eq!(read_value(UniformKind::Int, &dst), Some(UniformValue::Int(1)));

        let mut dst = slot(UniformKind::Float);
        assert!(write_value(&0.25_f64.into(), UniformKind::Float, &mut dst).is_ok());
        let back = read_value(UniformKind::Float, &dst).unwrap();
        assert_eq!(f64::from_value(&back), Some(0.25));
    }

    #[test]
    fn mismatched_kind_is_rejected() {
        let mut dst = slot(UniformKind::Mat4);
        let err = write_value(&Vec3::ONE.into(), UniformKind::Mat4, &mut dst).unwrap_err();
        assert!(matches!(err, UniformError::Mismatch { found: "vec3<f32>", .. }));
        assert!(dst.iter().all(|&b| b == 0));
    }

    #[test]
    fn arrays_use_stride_and_truncate() {
        let kind = UniformKind::array(ArrayElement::Vec3, 2);
        let mut dst = slot(kind);
        let items = vec![Vec3::X, Vec3::Y, Vec3::Z];
        assert_eq!(write_value(&items.as_slice().into(), kind, &mut dst), Ok(2));
        let floats: Vec<f32> = bytemuck::pod_collect_to_vec(&dst);
        assert_eq!(&floats[0..4], &[1.0, 0.0, 0.0, 0.0]);
        assert_eq!(&floats[4..8], &[0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn vec2_array_fills_vec4_slots() {
        let kind = UniformKind::array(ArrayElement::Vec4, 2);
        let mut dst = slot(kind);
        let items = vec![Vec2::new(1.0, 2.0), Vec2::new(3.0, 4.0)];
        assert_eq!(write_value(&items.clone().into(), kind, &mut dst), Ok(2));
        let back = read_value(kind, &dst).unwrap();
        assert_eq!(Vec::<Vec2>::from_value(&back), Some(items));
    }

    #[test]
    fn parameters_keep_insertion_order() {
        let params = Parameters::new()
            .with("view", Mat4::IDENTITY)
            .with("uStepSize", 0.5_f32)
            .with_texture("volume_texture", TextureHandle::from_raw(3).unwrap());
        let names: Vec<&str> = params.uniforms().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["view", "uStepSize"]);
        assert_eq!(params.textures().len(), 1);
        assert!(!params.is_empty());
    }
}
