//! Translation of the context's state vocabulary into wgpu descriptors.

use crate::context::{Capability, CapabilitySet, DEPTH_FORMAT};
use crate::mesh::Topology;
use crate::shader::reflect::{SampleKind, TextureDimension, TextureSlot};

const ALL_STAGES: wgpu::ShaderStages = wgpu::ShaderStages::VERTEX_FRAGMENT;

/// Uniform buffer binding visible to both stages.
pub fn uniform_buffer(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: ALL_STAGES,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// Texture binding shaped after a reflected slot. `filterable` only
/// matters for float textures.
pub fn texture(slot: &TextureSlot, filterable: bool) -> wgpu::BindGroupLayoutEntry {
    let sample_type = match slot.sample {
        SampleKind::Float => wgpu::TextureSampleType::Float { filterable },
        SampleKind::Sint => wgpu::TextureSampleType::Sint,
        SampleKind::Uint => wgpu::TextureSampleType::Uint,
        SampleKind::Depth => wgpu::TextureSampleType::Depth,
    };
    let view_dimension = match slot.dimension {
        TextureDimension::D2 => wgpu::TextureViewDimension::D2,
        TextureDimension::D3 => wgpu::TextureViewDimension::D3,
    };
    wgpu::BindGroupLayoutEntry {
        binding: slot.binding,
        visibility: ALL_STAGES,
        ty: wgpu::BindingType::Texture {
            sample_type,
            view_dimension,
            multisampled: false,
        },
        count: None,
    }
}

/// Sampler binding of the given kind.
pub fn sampler(binding: u32, kind: wgpu::SamplerBindingType) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: ALL_STAGES,
        ty: wgpu::BindingType::Sampler(kind),
        count: None,
    }
}

/// Depth state for a capability set. Like fixed-function GL, a disabled
/// depth test also disables depth writes.
pub fn depth_stencil(caps: CapabilitySet) -> wgpu::DepthStencilState {
    let test = caps.contains(Capability::DepthTest);
    wgpu::DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: test && caps.contains(Capability::DepthWrite),
        depth_compare: if test {
            wgpu::CompareFunction::Less
        } else {
            wgpu::CompareFunction::Always
        },
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

/// Blend state for one color target, `None` when blending is off or the
/// format cannot be blended.
pub fn blend(caps: CapabilitySet, format: wgpu::TextureFormat) -> Option<wgpu::BlendState> {
    if !caps.contains(Capability::Blend) {
        return None;
    }
    let blendable = format
        .guaranteed_format_features(wgpu::Features::empty())
        .flags
        .contains(wgpu::TextureFormatFeatureFlags::BLENDABLE);
    if !blendable {
        log::warn!("blending ignored for non-blendable format {format:?}");
        return None;
    }
    Some(wgpu::BlendState::ALPHA_BLENDING)
}

/// Primitive assembly for a topology and capability set.
pub fn primitive(topology: Topology, indexed: bool, caps: CapabilitySet) -> wgpu::PrimitiveState {
    wgpu::PrimitiveState {
        topology: topology.to_wgpu(),
        strip_index_format: (indexed && topology.is_strip()).then_some(wgpu::IndexFormat::Uint32),
        front_face: wgpu::FrontFace::Ccw,
        cull_mode: caps
            .contains(Capability::CullFace)
            .then_some(wgpu::Face::Back),
        ..Default::default()
    }
}

/// ClampToEdge sampler with the given filter for both magnification and
/// minification.
pub fn clamped_sampler(device: &wgpu::Device, label: &str, filter: wgpu::FilterMode) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(label),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: filter,
        min_filter: filter,
        ..Default::default()
    })
}

/// Sampler for `sampler_comparison` slots.
pub fn comparison_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("Comparison Sampler"),
        compare: Some(wgpu::CompareFunction::LessEqual),
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_depth_test_disables_writes() {
        let mut caps = CapabilitySet::default();
        let state = depth_stencil(caps);
        assert!(!state.depth_write_enabled);
        assert_eq!(state.depth_compare, wgpu::CompareFunction::Always);

        caps.set(Capability::DepthTest, true);
        let state = depth_stencil(caps);
        assert!(state.depth_write_enabled);
        assert_eq!(state.depth_compare, wgpu::CompareFunction::Less);

        caps.set(Capability::DepthWrite, false);
        assert!(!depth_stencil(caps).depth_write_enabled);
    }

    #[test]
    fn blend_only_where_supported() {
        let mut caps = CapabilitySet::default();
        assert!(blend(caps, wgpu::TextureFormat::Rgba8Unorm).is_none());
        caps.set(Capability::Blend, true);
        assert!(blend(caps, wgpu::TextureFormat::Rgba8Unorm).is_some());
        assert!(blend(caps, wgpu::TextureFormat::Rgba16Float).is_some());
        assert!(blend(caps, wgpu::TextureFormat::Rgba32Float).is_none());
    }

    #[test]
    fn strips_get_an_index_format_only_when_indexed() {
        let caps = CapabilitySet::default();
        assert!(primitive(Topology::TriangleStrip, false, caps)
            .strip_index_format
            .is_none());
        assert_eq!(
            primitive(Topology::TriangleStrip, true, caps).strip_index_format,
            Some(wgpu::IndexFormat::Uint32)
        );
        assert!(primitive(Topology::Triangles, true, caps)
            .strip_index_format
            .is_none());
    }

    #[test]
    fn texture_entries_follow_the_slot() {
        let slot = TextureSlot {
            name: "volume_texture".to_owned(),
            binding: 3,
            dimension: TextureDimension::D3,
            sample: SampleKind::Sint,
        };
        let entry = texture(&slot, true);
        assert_eq!(entry.binding, 3);
        assert!(matches!(
            entry.ty,
            wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Sint,
                view_dimension: wgpu::TextureViewDimension::D3,
                ..
            }
        ));
    }
}
