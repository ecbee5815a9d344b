//! Vegetation code packing and per-tile catalog templates.
//!
//! `VegetationCode` is the packed per-tile value produced by the succession rule
//! engine. It indexes a `TileEntry` describing what grows on the tile: splat
//! ratios, tree and prop templates, ground-cover density and decals.

use serde::Deserialize;

/// Packed (succession, variant, subtype) index, one per tile.
///
/// - Bits 0-7: succession stage
/// - Bits 8-15: vegetation variant
/// - Bits 16-23: tile subtype
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct VegetationCode(pub u32);

impl VegetationCode {
    pub fn pack(succession: u8, variant: u8, subtype: u8) -> Self {
        Self(u32::from(succession) | u32::from(variant) << 8 | u32::from(subtype) << 16)
    }

    pub fn succession(self) -> u8 {
        (self.0 & 0xFF) as u8
    }

    pub fn variant(self) -> u8 {
        ((self.0 >> 8) & 0xFF) as u8
    }

    pub fn subtype(self) -> u8 {
        ((self.0 >> 16) & 0xFF) as u8
    }

    pub fn decode(self) -> (u8, u8, u8) {
        (self.succession(), self.variant(), self.subtype())
    }
}

/// Which finished grid a surface is positioned against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeightSource {
    #[default]
    Ground,
    Water,
}

/// Instanced tree placed on a tile.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct TreeTemplate {
    pub template_id: u32,
    /// Maximum offset from the tile center in tiles (0 = centered)
    pub jitter: f32,
    pub scale_range: [f32; 2],
    pub width_range: [f32; 2],
    /// Instance color is a random blend between these two
    pub color_a: [f32; 3],
    pub color_b: [f32; 3],
}

impl Default for TreeTemplate {
    fn default() -> Self {
        Self {
            template_id: 0,
            jitter: 0.3,
            scale_range: [0.8, 1.2],
            width_range: [0.9, 1.1],
            color_a: [1.0, 1.0, 1.0],
            color_b: [1.0, 1.0, 1.0],
        }
    }
}

/// Decorative prop batched into combined meshes by material.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct PropTemplate {
    /// Index into the catalog's prop meshes
    pub mesh: u32,
    /// Rendering material shared by everything in a batch
    pub material: u32,
    pub jitter: f32,
    pub scale_range: [f32; 2],
    pub random_rotation: bool,
    /// Grid the prop sits on; `None` leaves it at the cell base
    pub anchor: Option<HeightSource>,
}

impl Default for PropTemplate {
    fn default() -> Self {
        Self {
            mesh: 0,
            material: 0,
            jitter: 0.3,
            scale_range: [0.9, 1.1],
            random_rotation: true,
            anchor: Some(HeightSource::Ground),
        }
    }
}

/// Ground-cover count written into a density layer.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct DetailTemplate {
    pub layer: u32,
    /// Inclusive count range drawn per tile
    pub count_range: [u16; 2],
}

/// Everything the catalog says about one (succession, variant, subtype) tile.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct TileEntry {
    /// Blend ratios for channels 0-2; channel 3 takes the remainder
    pub splat: [f32; 3],
    pub trees: Vec<TreeTemplate>,
    pub props: Vec<PropTemplate>,
    pub details: Vec<DetailTemplate>,
    /// Indices into the catalog's decal templates
    pub decals: Vec<u32>,
}

impl TileEntry {
    /// Four blend channels, the last filled so all four sum to 1.
    pub fn blend_weights(&self) -> [f32; 4] {
        let [a, b, c] = self.splat;
        [a, b, c, 1.0 - (a + b + c)]
    }
}

/// Flat overlay surface generated from a sparse tile set.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct DecalTemplate {
    pub name: String,
    pub material: u32,
    pub height_source: HeightSource,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_pack_decode() {
        let code = VegetationCode::pack(3, 200, 17);
        assert_eq!(code.decode(), (3, 200, 17));
        assert_eq!(VegetationCode(0x0011_C803).decode(), (3, 200, 17));
    }

    #[test]
    fn test_blend_weights_sum_to_one() {
        let entry = TileEntry { splat: [0.1, 0.25, 0.3], ..Default::default() };
        let w = entry.blend_weights();
        assert!((w.iter().sum::<f32>() - 1.0).abs() < 1e-6);
        assert!((w[3] - 0.35).abs() < 1e-6);
    }

    #[test]
    fn test_template_json_defaults() {
        let prop: PropTemplate =
            serde_json::from_str(r#"{ "mesh": 2, "anchor": "water" }"#).unwrap();
        assert_eq!(prop.mesh, 2);
        assert_eq!(prop.anchor, Some(HeightSource::Water));
        assert!(prop.random_rotation);

        let prop: PropTemplate = serde_json::from_str(r#"{ "anchor": null }"#).unwrap();
        assert_eq!(prop.anchor, None);
    }
}
