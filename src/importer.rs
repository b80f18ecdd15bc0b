//! Raw volumetric data import.
//!
//! Two on-disk layouts are supported: a stack of numbered slice files
//! (`prefix.1 ..= prefix.N`, each `size_x * size_y` samples) and a single
//! raw volume file. Samples are fixed-width integers (or `f32` bit
//! patterns) in a caller-chosen byte order. Missing or short data is
//! zero-filled and reported as a warning.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use glam::Vec3;

/// Byte order of multi-byte samples on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ByteOrder {
    /// Most significant byte first (CT slice stacks).
    #[default]
    BigEndian,
    /// Least significant byte first (x86 dumps).
    LittleEndian,
}

/// A scalar type volume samples can be decoded into.
pub trait Sample: Copy + PartialOrd + Default + fmt::Debug + bytemuck::Pod {
    /// Smallest representable value.
    const MIN: Self;
    /// Largest representable value.
    const MAX: Self;

    /// Reinterpret the low bits of `bits` as `Self`.
    fn from_bits(bits: u64) -> Self;
}

macro_rules! impl_int_sample {
    ($($ty:ty),*) => {$(
        impl Sample for $ty {
            const MIN: Self = <$ty>::MIN;
            const MAX: Self = <$ty>::MAX;

            fn from_bits(bits: u64) -> Self {
                bits as $ty
            }
        }
    )*};
}

impl_int_sample!(u8, i8, u16, i16, u32, i32);

impl Sample for f32 {
    const MIN: Self = f32::MIN;
    const MAX: Self = f32::MAX;

    fn from_bits(bits: u64) -> Self {
        f32::from_bits(bits as u32)
    }
}

/// A dense 3D scalar field, x fastest, then y, then z.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeData<T> {
    /// Samples along x.
    pub size_x: u32,
    /// Samples along y.
    pub size_y: u32,
    /// Samples along z (slices).
    pub size_z: u32,
    /// `size_x * size_y * size_z` samples.
    pub data: Vec<T>,
    /// Smallest sample.
    pub min: T,
    /// Largest sample.
    pub max: T,
    /// Physical spacing between samples in millimetres, when known.
    pub real_size: Option<Vec3>,
}

fn min_max<T: Sample>(data: &[T]) -> (T, T) {
    if data.is_empty() {
        return (T::default(), T::default());
    }
    data.iter().fold((T::MAX, T::MIN), |(lo, hi), &v| {
        (if v < lo { v } else { lo }, if v > hi { v } else { hi })
    })
}

impl<T: Sample> VolumeData<T> {
    /// Wrap samples and compute their range.
    #[must_use]
    pub fn from_samples(size_x: u32, size_y: u32, size_z: u32, data: Vec<T>) -> Self {
        let (min, max) = min_max(&data);
        Self {
            size_x,
            size_y,
            size_z,
            data,
            min,
            max,
            real_size: None,
        }
    }

    /// Attach physical sample spacing.
    #[must_use]
    pub fn with_real_size(mut self, real_size: Vec3) -> Self {
        self.real_size = Some(real_size);
        self
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether there are no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Sample at `(x, y, z)`.
    #[must_use]
    pub fn get(&self, x: u32, y: u32, z: u32) -> Option<T> {
        if x >= self.size_x || y >= self.size_y || z >= self.size_z {
            return None;
        }
        let index = (z as usize * self.size_y as usize + y as usize) * self.size_x as usize
            + x as usize;
        self.data.get(index).copied()
    }

    /// Samples as raw bytes, for texture upload.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }
}

/// Decode one sample: each byte is shifted in as `val = (val << 8) + byte`
/// in the order given.
fn decode<T: Sample>(bytes: &[u8], order: ByteOrder) -> T {
    let shift = |acc: u64, b: &u8| (acc << 8) | u64::from(*b);
    let bits = match order {
        ByteOrder::BigEndian => bytes.iter().fold(0, shift),
        ByteOrder::LittleEndian => bytes.iter().rev().fold(0, shift),
    };
    T::from_bits(bits)
}

/// Decode `count` samples from `raw`, zero-filling anything past its end.
fn decode_samples<T: Sample>(
    raw: &[u8],
    count: usize,
    bytes_per_entry: usize,
    order: ByteOrder,
    out: &mut Vec<T>,
) {
    out.extend(raw.chunks_exact(bytes_per_entry).take(count).map(|b| decode::<T>(b, order)));
    let decoded = (raw.len() / bytes_per_entry).min(count);
    out.extend(std::iter::repeat_n(T::default(), count - decoded));
}

fn read_or_warn(path: &Path, expected: usize) -> Vec<u8> {
    match std::fs::read(path) {
        Ok(raw) => {
            if raw.len() < expected {
                log::warn!(
                    "{} holds {} of {expected} bytes, rest zero-filled",
                    path.display(),
                    raw.len()
                );
            }
            raw
        }
        Err(e) => {
            log::warn!("Could not read {}: {e}, zero-filled", path.display());
            Vec::new()
        }
    }
}

fn slice_path(prefix: &Path, index: u32) -> PathBuf {
    let mut name = OsString::from(prefix.as_os_str());
    name.push(format!(".{index}"));
    PathBuf::from(name)
}

/// Load `num_files` slices named `prefix.1 ..= prefix.num_files`.
///
/// Each slice holds `size_x * size_y` samples of `bytes_per_entry` bytes
/// (clamped to 1..=8). `size_z` of the result is `num_files`.
#[must_use]
pub fn load_3d_data<T: Sample>(
    prefix: &Path,
    size_x: u32,
    size_y: u32,
    num_files: u32,
    bytes_per_entry: u32,
    order: ByteOrder,
) -> VolumeData<T> {
    log::info!("Loading files with prefix: {}", prefix.display());
    log::debug!("Reading slice data...");

    let bytes_per_entry = bytes_per_entry.clamp(1, 8) as usize;
    let slice_len = size_x as usize * size_y as usize;
    let mut data = Vec::with_capacity(slice_len * num_files as usize);
    for i in 1..=num_files {
        let path = slice_path(prefix, i);
        let raw = read_or_warn(&path, slice_len * bytes_per_entry);
        decode_samples(&raw, slice_len, bytes_per_entry, order, &mut data);
    }

    let volume = VolumeData::from_samples(size_x, size_y, num_files, data);
    log::info!(
        "Loaded {}x{}x{} volume, range [{:?}, {:?}]",
        size_x,
        size_y,
        num_files,
        volume.min,
        volume.max
    );
    volume
}

/// Load a single raw volume of `size_x * size_y * size_z` samples of
/// `size_of::<T>()` bytes each.
#[must_use]
pub fn load_single_volume<T: Sample>(
    path: &Path,
    size_x: u32,
    size_y: u32,
    size_z: u32,
    order: ByteOrder,
) -> VolumeData<T> {
    log::info!("Loading file: {}", path.display());
    let bytes_per_entry = size_of::<T>();
    let count = size_x as usize * size_y as usize * size_z as usize;
    let raw = read_or_warn(path, count * bytes_per_entry);
    let mut data = Vec::with_capacity(count);
    decode_samples(&raw, count, bytes_per_entry, order, &mut data);
    VolumeData::from_samples(size_x, size_y, size_z, data)
}

/// Dimensions of the bundled MRT brain scan.
pub const BRUDER_SIZE: (u32, u32, u32) = (240, 240, 190);

/// Load the MRT scan at `resources/Bruder/psirInt16Signed.raw`
/// (240×240×190 signed 16-bit, little-endian).
#[must_use]
pub fn load_bruder(resources: &Path) -> VolumeData<i16> {
    let (x, y, z) = BRUDER_SIZE;
    load_single_volume(
        &resources.join("Bruder").join("psirInt16Signed.raw"),
        x,
        y,
        z,
        ByteOrder::LittleEndian,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("volren-{name}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_be_slices(prefix: &Path, slices: &[&[i16]]) {
        for (i, slice) in slices.iter().enumerate() {
            let bytes: Vec<u8> = slice.iter().flat_map(|v| v.to_be_bytes()).collect();
            std::fs::write(slice_path(prefix, i as u32 + 1), bytes).unwrap();
        }
    }

    #[test]
    fn big_endian_slices_with_exact_range() {
        let dir = fixture_dir("be-slices");
        let prefix = dir.join("CThead");
        write_be_slices(&prefix, &[&[0, 1, 2, 3], &[-7, 300, 4095, 5], &[9, 8, 7, 6]]);

        let volume: VolumeData<i16> = load_3d_data(&prefix, 2, 2, 3, 2, ByteOrder::BigEndian);
        assert_eq!(volume.len(), 12);
        assert_eq!(volume.size_z, 3);
        assert_eq!(volume.min, -7);
        assert_eq!(volume.max, 4095);
        assert_eq!(volume.get(1, 0, 1), Some(300));
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn byte_order_is_respected() {
        let dir = fixture_dir("byte-order");
        let path = dir.join("volume.raw");
        std::fs::write(&path, [0x01_u8, 0x02, 0xff, 0x7f]).unwrap();

        let be: VolumeData<u16> = load_single_volume(&path, 2, 1, 1, ByteOrder::BigEndian);
        let le: VolumeData<u16> = load_single_volume(&path, 2, 1, 1, ByteOrder::LittleEndian);
        assert_eq!(be.data, [0x0102, 0xff7f]);
        assert_eq!(le.data, [0x0201, 0x7fff]);
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn high_low_bytes_are_unsigned() {
        // 0x00 0x80 is 128, not 128 subtracted from zero.
        assert_eq!(decode::<i16>(&[0x00, 0x80], ByteOrder::BigEndian), 128);
        assert_eq!(decode::<i16>(&[0xff, 0xfe], ByteOrder::BigEndian), -2);
    }

    #[test]
    fn missing_and_short_slices_are_zero_filled() {
        let dir = fixture_dir("missing");
        let prefix = dir.join("slice");
        // Slice 1 is short by one sample, slice 2 does not exist.
        std::fs::write(slice_path(&prefix, 1), [0_u8, 5, 0, 6, 0, 7]).unwrap();

        let volume: VolumeData<i16> = load_3d_data(&prefix, 2, 2, 2, 2, ByteOrder::BigEndian);
        assert_eq!(volume.data, [5, 6, 7, 0, 0, 0, 0, 0]);
        assert_eq!((volume.min, volume.max), (0, 7));
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn bruder_path_and_size() {
        let volume = load_bruder(Path::new("/nonexistent-resources"));
        assert_eq!(
            (volume.size_x, volume.size_y, volume.size_z),
            BRUDER_SIZE
        );
        assert_eq!(volume.len(), 240 * 240 * 190);
        assert!(volume.data.iter().all(|&v| v == 0));
    }

    #[test]
    fn out_of_range_lookup_is_none() {
        let volume = VolumeData::from_samples(2, 2, 1, vec![1_u8, 2, 3, 4]);
        assert_eq!(volume.get(1, 1, 0), Some(4));
        assert_eq!(volume.get(2, 0, 0), None);
        assert_eq!(volume.as_bytes(), &[1, 2, 3, 4]);
    }
}
