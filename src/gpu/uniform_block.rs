//! Per-frame uniform storage.
//!
//! Every draw's uniform snapshot is packed into one block at a region
//! aligned to [`UNIFORM_REGION_ALIGN`], so bind groups address it with a
//! plain offset. The block is uploaded once per frame.

use crate::shader::program::UNIFORM_REGION_ALIGN;

/// Round `len` up to the next region boundary.
pub(crate) fn region_start(len: usize) -> usize {
    let align = UNIFORM_REGION_ALIGN as usize;
    len.div_ceil(align) * align
}

/// CPU-side packing of one frame's snapshots.
#[derive(Debug, Default)]
pub(crate) struct UniformStaging {
    bytes: Vec<u8>,
}

impl UniformStaging {
    /// Offset the next pushed snapshot will land at.
    pub(crate) fn next_region(&self) -> usize {
        region_start(self.bytes.len())
    }

    /// Append a snapshot at `next_region()`.
    /// Empty snapshots take no space.
    pub(crate) fn push(&mut self, snapshot: &[u8]) -> usize {
        let start = self.next_region();
        if !snapshot.is_empty() {
            self.bytes.resize(start, 0);
            self.bytes.extend_from_slice(snapshot);
        }
        start
    }

    pub(crate) fn clear(&mut self) {
        self.bytes.clear();
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// GPU buffer holding the packed frame uniforms.
///
/// Reallocated at twice the needed size when a frame outgrows it; never
/// shrinks. Bind groups are rebuilt every frame, so a replaced buffer
/// needs no extra bookkeeping.
pub struct UniformBlock {
    staging: UniformStaging,
    buffer: wgpu::Buffer,
    capacity: u64,
}

fn allocate(device: &wgpu::Device, capacity: u64) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Frame Uniforms"),
        size: capacity,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

impl UniformBlock {
    /// Block with room for `regions` snapshots before its first growth.
    #[must_use]
    pub fn new(device: &wgpu::Device, regions: usize) -> Self {
        let capacity = (region_start(1) * regions.max(1)) as u64;
        Self {
            staging: UniformStaging::default(),
            buffer: allocate(device, capacity),
            capacity,
        }
    }

    pub(crate) fn staging(&mut self) -> &mut UniformStaging {
        &mut self.staging
    }

    /// Copy the staged snapshots to the GPU and reset the staging area.
    pub fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        let needed = self.staging.as_bytes().len() as u64;
        if needed > self.capacity {
            self.capacity = needed * 2;
            log::debug!("uniform block grown to {} bytes", self.capacity);
            self.buffer = allocate(device, self.capacity);
        }
        if needed > 0 {
            queue.write_buffer(&self.buffer, 0, self.staging.as_bytes());
        }
        self.staging.clear();
    }

    /// The buffer bind groups point into.
    #[must_use]
    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regions_are_aligned() {
        assert_eq!(region_start(0), 0);
        assert_eq!(region_start(1), 256);
        assert_eq!(region_start(256), 256);
        assert_eq!(region_start(300), 512);
    }

    #[test]
    fn snapshots_land_on_region_boundaries() {
        let mut staging = UniformStaging::default();
        assert_eq!(staging.push(&[1; 80]), 0);
        assert_eq!(staging.push(&[2; 16]), 256);
        assert_eq!(staging.as_bytes().len(), 272);
        assert_eq!(staging.as_bytes()[100], 0);
        assert_eq!(staging.as_bytes()[256], 2);
    }

    #[test]
    fn empty_snapshots_take_no_space() {
        let mut staging = UniformStaging::default();
        let _ = staging.push(&[1; 4]);
        assert_eq!(staging.push(&[]), 256);
        assert_eq!(staging.as_bytes().len(), 4);
        staging.clear();
        assert_eq!(staging.next_region(), 0);
    }
}
