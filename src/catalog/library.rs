//! Vegetation catalog: loaded once, resolved into direct index tables.
//!
//! `CatalogDef` is the serialized form. `VegetationCatalog::from_def` checks every
//! cross-reference up front so a build only ever walks three vector indices per
//! tile and never matches names.

use std::path::Path;

use serde::Deserialize;

use super::vegetation::{
    DecalTemplate, DetailTemplate, HeightSource, PropTemplate, TileEntry, TreeTemplate,
    VegetationCode,
};
use crate::core::{Error, Result};
use crate::mesh::PropMesh;

/// Serialized catalog.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct CatalogDef {
    pub successions: Vec<SuccessionDef>,
    pub decals: Vec<DecalTemplate>,
    pub prop_meshes: Vec<PropMesh>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct SuccessionDef {
    pub name: String,
    pub variants: Vec<VariantDef>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct VariantDef {
    pub name: String,
    /// Entries indexed by tile subtype
    pub tiles: Vec<TileEntry>,
}

/// Resolved catalog shared read-only across builds.
#[derive(Clone, Debug)]
pub struct VegetationCatalog {
    /// `tables[succession][variant][subtype]`
    tables: Vec<Vec<Vec<TileEntry>>>,
    names: Vec<String>,
    decals: Vec<DecalTemplate>,
    prop_meshes: Vec<PropMesh>,
}

impl VegetationCatalog {
    /// Validate and resolve a catalog definition.
    pub fn from_def(def: CatalogDef) -> Result<Self> {
        let decal_count = def.decals.len() as u32;
        let mesh_count = def.prop_meshes.len() as u32;

        for (mesh_id, mesh) in def.prop_meshes.iter().enumerate() {
            let vertex_count = mesh.positions.len() as u32;
            if mesh.indices.iter().any(|&i| i >= vertex_count) {
                return Err(Error::Catalog(format!(
                    "prop mesh {} ('{}') has an index past its {} vertices",
                    mesh_id, mesh.name, vertex_count
                )));
            }
        }

        let mut names = Vec::with_capacity(def.successions.len());
        let mut tables = Vec::with_capacity(def.successions.len());

        for (s, succession) in def.successions.into_iter().enumerate() {
            let mut variants = Vec::with_capacity(succession.variants.len());
            for (v, variant) in succession.variants.into_iter().enumerate() {
                for (t, entry) in variant.tiles.iter().enumerate() {
                    let at = || {
                        format!("{}/{} ({}, {}, {})", succession.name, variant.name, s, v, t)
                    };

                    let sum: f32 = entry.splat.iter().sum();
                    let negative = entry.splat.iter().any(|w| !(w.is_finite() && *w >= 0.0));
                    if negative || sum > 1.0 + 1e-4 {
                        return Err(Error::Catalog(format!(
                            "invalid splat ratios {:?} at {}",
                            entry.splat,
                            at()
                        )));
                    }
                    if let Some(d) = entry.decals.iter().find(|&&d| d >= decal_count) {
                        return Err(Error::Catalog(format!("unknown decal {} at {}", d, at())));
                    }
                    if let Some(p) = entry.props.iter().find(|p| p.mesh >= mesh_count) {
                        return Err(Error::Catalog(format!(
                            "unknown prop mesh {} at {}",
                            p.mesh,
                            at()
                        )));
                    }
                    let mut details = entry.details.iter();
                    if let Some(d) = details.find(|d| d.count_range[0] > d.count_range[1]) {
                        return Err(Error::Catalog(format!(
                            "empty count range {:?} at {}",
                            d.count_range,
                            at()
                        )));
                    }
                }
                variants.push(variant.tiles);
            }
            names.push(succession.name);
            tables.push(variants);
        }

        log::debug!(
            "Resolved vegetation catalog: {} successions, {} decals, {} prop meshes",
            tables.len(), decal_count, mesh_count
        );

        Ok(Self { tables, names, decals: def.decals, prop_meshes: def.prop_meshes })
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::from_def(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    /// Catalog entry for a packed tile code.
    pub fn entry(&self, code: VegetationCode) -> Result<&TileEntry> {
        let (s, v, t) = code.decode();
        self.tables
            .get(s as usize)
            .and_then(|variants| variants.get(v as usize))
            .and_then(|tiles| tiles.get(t as usize))
            .ok_or_else(|| {
                Error::Catalog(format!("no entry for succession {} variant {} subtype {}", s, v, t))
            })
    }

    pub fn decal(&self, id: u32) -> Result<&DecalTemplate> {
        self.decals
            .get(id as usize)
            .ok_or_else(|| Error::Catalog(format!("unknown decal {}", id)))
    }

    pub fn prop_mesh(&self, id: u32) -> Result<&PropMesh> {
        self.prop_meshes
            .get(id as usize)
            .ok_or_else(|| Error::Catalog(format!("unknown prop mesh {}", id)))
    }

    pub fn succession_name(&self, succession: u8) -> Option<&str> {
        self.names.get(succession as usize).map(String::as_str)
    }

    pub fn succession_count(&self) -> usize {
        self.tables.len()
    }

    pub fn decal_count(&self) -> usize {
        self.decals.len()
    }
}

impl Default for VegetationCatalog {
    fn default() -> Self {
        Self::from_def(CatalogDef::default_set()).unwrap_or_else(|e| {
            log::error!("Built-in vegetation catalog failed to resolve: {}", e);
            Self {
                tables: Vec::new(),
                names: Vec::new(),
                decals: Vec::new(),
                prop_meshes: Vec::new(),
            }
        })
    }
}

impl CatalogDef {
    /// Small built-in catalog: bare ground, grassland, forest and marsh.
    ///
    /// Successions are indexed by code: 0 = Bare, 1 = Grassland, 2 = Forest, 3 = Marsh.
    pub fn default_set() -> Self {
        let oak = TreeTemplate {
            template_id: 1,
            jitter: 0.35,
            scale_range: [0.8, 1.3],
            width_range: [0.85, 1.15],
            color_a: [0.25, 0.45, 0.15],
            color_b: [0.35, 0.55, 0.20],
        };
        let pine = TreeTemplate {
            template_id: 2,
            jitter: 0.25,
            scale_range: [0.9, 1.5],
            width_range: [0.7, 1.0],
            color_a: [0.12, 0.30, 0.14],
            color_b: [0.18, 0.38, 0.18],
        };
        let shrub = PropTemplate { mesh: 0, material: 10, ..Default::default() };
        let stone = PropTemplate {
            mesh: 1,
            material: 11,
            jitter: 0.4,
            scale_range: [0.4, 0.9],
            ..Default::default()
        };
        let reed = PropTemplate {
            mesh: 0,
            material: 12,
            scale_range: [0.6, 1.0],
            anchor: Some(HeightSource::Water),
            ..Default::default()
        };
        let grass = |lo, hi| DetailTemplate { layer: 0, count_range: [lo, hi] };
        let flowers = DetailTemplate { layer: 1, count_range: [0, 3] };

        let bare = SuccessionDef {
            name: "Bare".into(),
            variants: vec![VariantDef {
                name: "Soil".into(),
                tiles: vec![
                    TileEntry { splat: [0.0, 0.0, 0.0], ..Default::default() },
                    TileEntry {
                        splat: [0.0, 0.0, 0.2],
                        props: vec![stone.clone()],
                        ..Default::default()
                    },
                ],
            }],
        };
        let grassland = SuccessionDef {
            name: "Grassland".into(),
            variants: vec![VariantDef {
                name: "Meadow".into(),
                tiles: vec![
                    TileEntry {
                        splat: [0.7, 0.0, 0.1],
                        details: vec![grass(4, 12), flowers],
                        ..Default::default()
                    },
                    TileEntry {
                        splat: [0.6, 0.1, 0.1],
                        props: vec![shrub.clone()],
                        details: vec![grass(2, 8)],
                        decals: vec![1],
                        ..Default::default()
                    },
                ],
            }],
        };
        let forest = SuccessionDef {
            name: "Forest".into(),
            variants: vec![
                VariantDef {
                    name: "Deciduous".into(),
                    tiles: vec![TileEntry {
                        splat: [0.2, 0.6, 0.1],
                        trees: vec![oak.clone(), oak],
                        props: vec![shrub],
                        details: vec![grass(0, 4)],
                        ..Default::default()
                    }],
                },
                VariantDef {
                    name: "Conifer".into(),
                    tiles: vec![TileEntry {
                        splat: [0.1, 0.7, 0.0],
                        trees: vec![pine],
                        props: vec![stone],
                        ..Default::default()
                    }],
                },
            ],
        };
        let marsh = SuccessionDef {
            name: "Marsh".into(),
            variants: vec![VariantDef {
                name: "Reeds".into(),
                tiles: vec![TileEntry {
                    splat: [0.3, 0.0, 0.5],
                    props: vec![reed],
                    details: vec![grass(1, 5)],
                    decals: vec![0],
                    ..Default::default()
                }],
            }],
        };

        Self {
            successions: vec![bare, grassland, forest, marsh],
            decals: vec![
                DecalTemplate {
                    name: "Mud".into(),
                    material: 20,
                    height_source: HeightSource::Water,
                },
                DecalTemplate {
                    name: "Path".into(),
                    material: 21,
                    height_source: HeightSource::Ground,
                },
            ],
            prop_meshes: vec![
                PropMesh::crossed_quads("shrub", 0.4, 0.8),
                PropMesh::unit_box("stone", 0.3, 0.3),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_set_resolves() {
        let catalog = VegetationCatalog::from_def(CatalogDef::default_set()).unwrap();
        assert_eq!(catalog.succession_count(), 4);
        assert_eq!(catalog.succession_name(2), Some("Forest"));
        assert_eq!(catalog.entry(VegetationCode::pack(2, 0, 0)).unwrap().trees.len(), 2);
        assert_eq!(catalog.decal_count(), 2);
    }

    #[test]
    fn test_default_is_built_in_set() {
        let catalog = VegetationCatalog::default();
        assert_eq!(catalog.succession_count(), 4);
        assert_eq!(catalog.decal_count(), 2);
        assert!(catalog.prop_mesh(1).is_ok());
    }

    #[test]
    fn test_missing_entry_is_catalog_error() {
        let catalog = VegetationCatalog::default();
        assert!(matches!(catalog.entry(VegetationCode::pack(9, 0, 0)), Err(Error::Catalog(_))));
        assert!(matches!(catalog.entry(VegetationCode::pack(0, 0, 5)), Err(Error::Catalog(_))));
        assert!(matches!(catalog.decal(5), Err(Error::Catalog(_))));
    }

    #[test]
    fn test_unknown_decal_rejected_at_load() {
        let mut def = CatalogDef::default_set();
        def.successions[0].variants[0].tiles[0].decals.push(42);
        assert!(matches!(VegetationCatalog::from_def(def), Err(Error::Catalog(_))));
    }

    #[test]
    fn test_overfull_splat_rejected() {
        let mut def = CatalogDef::default_set();
        def.successions[0].variants[0].tiles[0].splat = [0.5, 0.5, 0.5];
        assert!(matches!(VegetationCatalog::from_def(def), Err(Error::Catalog(_))));
    }

    #[test]
    fn test_load_json_file() {
        let json = r#"{
            "successions": [
                { "name": "Only", "variants": [ { "name": "V", "tiles": [
                    { "splat": [0.5, 0.25, 0.0], "decals": [0] }
                ] } ] }
            ],
            "decals": [ { "name": "Water", "material": 4, "height_source": "water" } ]
        }"#;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let catalog = VegetationCatalog::load(file.path()).unwrap();
        let entry = catalog.entry(VegetationCode::pack(0, 0, 0)).unwrap();
        assert_eq!(entry.blend_weights(), [0.5, 0.25, 0.0, 0.25]);
        assert_eq!(catalog.decal(0).unwrap().height_source, HeightSource::Water);
    }
}
