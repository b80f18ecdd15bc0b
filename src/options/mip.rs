use std::path::PathBuf;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Which bundled data set the MIP demo loads.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Dataset {
    /// Numbered CT slice stack, big-endian 16-bit.
    #[default]
    CtHead,
    /// Single-file MRT scan, 240×240×190 signed 16-bit.
    Bruder,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "MIP", inline)]
#[serde(default)]
/// Maximum intensity projection parameters.
pub struct MipOptions {
    /// Data set to load.
    pub dataset: Dataset,
    /// Slice prefix of the CT stack, relative to the resource root.
    #[schemars(skip)]
    pub slice_prefix: PathBuf,
    /// CT stack dimensions: samples per row, rows, slices.
    #[schemars(skip)]
    pub slice_size: [u32; 3],
    /// Extents of the volume box (half sizes along x, y, z).
    #[schemars(skip)]
    pub volume_extent: [f32; 3],
    /// Lower end of the grayscale ramp. Defaults to the data minimum.
    #[schemars(skip)]
    pub window_min: Option<f32>,
    /// Upper end of the grayscale ramp. Defaults to the data maximum.
    #[schemars(skip)]
    pub window_max: Option<f32>,
    /// Color blended in at the far end of the ray.
    #[schemars(title = "Max Color")]
    pub max_dist_color: [f32; 4],
    /// Color blended in at the near end of the ray.
    #[schemars(title = "Min Color")]
    pub min_dist_color: [f32; 4],
    /// Influence of the depth color shift.
    #[schemars(title = "Color Effect", range(min = 0.0, max = 1.0), extend("step" = 0.01))]
    pub color_effect: f32,
    /// Influence of the depth contrast attenuation.
    #[schemars(title = "Contrast Effect", range(min = 0.0, max = 1.0), extend("step" = 0.01))]
    pub contrast_effect: f32,
    /// Local MIP threshold. Defaults to the data maximum (plain MIP).
    #[schemars(skip)]
    pub lmip_threshold: Option<f32>,
    /// Steps past a local maximum before it is accepted.
    #[schemars(title = "LMIP Min Steps", range(min = 0, max = 100))]
    pub lmip_min_steps: i32,
    /// Ray parameter where sampling starts.
    #[schemars(title = "Ray Start", range(min = 0.0, max = 1.0), extend("step" = 0.01))]
    pub ray_start: f32,
    /// Ray parameter where sampling ends.
    #[schemars(title = "Ray End", range(min = 0.0, max = 1.0), extend("step" = 0.01))]
    pub ray_end: f32,
    /// Lower end of the depth range considered.
    #[schemars(skip)]
    pub min_depth_range: f32,
    /// Upper end of the depth range considered.
    #[schemars(skip)]
    pub max_depth_range: f32,
    /// Samples below this value are ignored.
    #[schemars(skip)]
    pub min_value_threshold: i32,
    /// Samples above this value are ignored.
    #[schemars(skip)]
    pub max_value_threshold: i32,
}

impl Default for MipOptions {
    fn default() -> Self {
        Self {
            dataset: Dataset::CtHead,
            slice_prefix: PathBuf::from("CTHead/CThead"),
            slice_size: [256, 256, 113],
            volume_extent: [1.0, 1.0, 1.26315],
            window_min: None,
            window_max: None,
            max_dist_color: [0.75, 0.74, 0.82, 1.0],
            min_dist_color: [1.0, 0.75, 0.75, 1.0],
            color_effect: 1.0,
            contrast_effect: 1.0,
            lmip_threshold: None,
            lmip_min_steps: 3,
            ray_start: 0.0,
            ray_end: 1.0,
            min_depth_range: 0.0,
            max_depth_range: 1.0,
            min_value_threshold: i32::MIN,
            max_value_threshold: i32::MAX,
        }
    }
}
