//! Fixed-topology meshes: per-attribute float buffers, an optional index
//! buffer, and a draw mode.
//!
//! Attribute locations follow one convention across every shape:
//! 0 = position, 1 = texture coordinate, 2 = normal.

/// Built-in shapes (volume box, quad, sphere, grid).
pub mod shapes;

/// Primitive assembly mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Topology {
    /// Independent triangles.
    #[default]
    Triangles,
    /// Triangle strip.
    TriangleStrip,
    /// Independent lines.
    Lines,
    /// Line strip.
    LineStrip,
    /// Points.
    Points,
}

impl Topology {
    /// The wgpu equivalent.
    #[must_use]
    pub fn to_wgpu(self) -> wgpu::PrimitiveTopology {
        match self {
            Self::Triangles => wgpu::PrimitiveTopology::TriangleList,
            Self::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
            Self::Lines => wgpu::PrimitiveTopology::LineList,
            Self::LineStrip => wgpu::PrimitiveTopology::LineStrip,
            Self::Points => wgpu::PrimitiveTopology::PointList,
        }
    }

    /// Whether primitives share vertices with their neighbours.
    #[must_use]
    pub fn is_strip(self) -> bool {
        matches!(self, Self::TriangleStrip | Self::LineStrip)
    }
}

/// One tightly packed `f32` vertex attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexAttribute {
    /// Shader `@location`.
    pub location: u32,
    /// Floats per vertex (1 to 4).
    pub components: u32,
    /// Packed data, `components` floats per vertex.
    pub data: Vec<f32>,
}

impl VertexAttribute {
    /// Number of vertices stored.
    #[must_use]
    pub fn vertex_count(&self) -> u32 {
        if self.components == 0 {
            return 0;
        }
        (self.data.len() / self.components as usize) as u32
    }

    /// Matching wgpu vertex format.
    #[must_use]
    pub fn format(&self) -> wgpu::VertexFormat {
        float_format(self.components)
    }

    /// Bytes between consecutive vertices.
    #[must_use]
    pub fn stride(&self) -> u64 {
        u64::from(self.components) * 4
    }
}

/// `f32` vertex format with `components` lanes (clamped to 1..=4).
#[must_use]
pub fn float_format(components: u32) -> wgpu::VertexFormat {
    match components {
        0 | 1 => wgpu::VertexFormat::Float32,
        2 => wgpu::VertexFormat::Float32x2,
        3 => wgpu::VertexFormat::Float32x3,
        _ => wgpu::VertexFormat::Float32x4,
    }
}

/// Vertex data with a draw mode. Immutable after construction except for
/// the draw mode.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    attributes: Vec<VertexAttribute>,
    indices: Option<Vec<u32>>,
    topology: Topology,
}

impl Mesh {
    /// Mesh from raw attributes.
    #[must_use]
    pub fn new(topology: Topology, attributes: Vec<VertexAttribute>, indices: Option<Vec<u32>>) -> Self {
        Self {
            attributes,
            indices,
            topology,
        }
    }

    /// Attributes in location order of construction.
    #[must_use]
    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }

    /// Attribute bound to `location`.
    #[must_use]
    pub fn attribute(&self, location: u32) -> Option<&VertexAttribute> {
        self.attributes.iter().find(|a| a.location == location)
    }

    /// Index buffer, if drawn indexed.
    #[must_use]
    pub fn indices(&self) -> Option<&[u32]> {
        self.indices.as_deref()
    }

    /// Current draw mode.
    #[must_use]
    pub fn topology(&self) -> Topology {
        self.topology
    }

    /// Change the draw mode.
    pub fn set_draw_mode(&mut self, topology: Topology) {
        self.topology = topology;
    }

    /// Number of vertices (of the position attribute).
    #[must_use]
    pub fn vertex_count(&self) -> u32 {
        self.attribute(0)
            .or_else(|| self.attributes.first())
            .map_or(0, VertexAttribute::vertex_count)
    }

    /// Number of indices; 0 for non-indexed meshes.
    #[must_use]
    pub fn index_count(&self) -> u32 {
        self.indices.as_ref().map_or(0, |i| i.len() as u32)
    }

    /// Number of elements a draw consumes.
    #[must_use]
    pub fn element_count(&self) -> u32 {
        if self.indices.is_some() {
            self.index_count()
        } else {
            self.vertex_count()
        }
    }
}
