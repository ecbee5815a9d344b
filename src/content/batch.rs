//! Vertex-budgeted prop batching.
//!
//! Props sharing a material are appended into one combined mesh until the next
//! prop would take the batch over the budget; the batch is then flushed and a new
//! one begins. A prop larger than the whole budget gets a mesh of its own.

use super::placement::PropPlacement;
use crate::catalog::VegetationCatalog;
use crate::core::Result;
use crate::mesh::MeshData;

/// Combine `placements` (all using `material`) into meshes of at most `budget` vertices.
pub fn batch_props(
    material: u32,
    placements: &[PropPlacement],
    catalog: &VegetationCatalog,
    budget: usize,
) -> Result<Vec<MeshData>> {
    let mut meshes = Vec::new();
    let mut current = MeshData::new(material);

    for placement in placements {
        let source = catalog.prop_mesh(placement.mesh)?;
        let vertices = source.vertex_count();

        // Flush only when strictly over, so a batch can fill the budget exactly
        // and the mesh count is ceil(total / budget) for evenly sized props
        if !current.is_empty() && current.vertex_count() + vertices > budget {
            meshes.push(std::mem::replace(&mut current, MeshData::new(material)));
        }
        if vertices > budget {
            log::warn!(
                "Prop mesh '{}' has {} vertices, over the batch budget of {}",
                source.name, vertices, budget
            );
        }
        current.append_transformed(source, placement.position, placement.rotation, placement.scale);
    }

    if !current.is_empty() {
        meshes.push(current);
    }
    Ok(meshes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogDef;
    use crate::mesh::PropMesh;
    use glam::Vec3;

    fn catalog() -> VegetationCatalog {
        let def = CatalogDef {
            prop_meshes: vec![
                PropMesh::unit_box("box", 0.5, 1.0),      // 8 vertices
                PropMesh::crossed_quads("card", 0.5, 1.0), // 8 vertices
            ],
            ..Default::default()
        };
        VegetationCatalog::from_def(def).unwrap()
    }

    fn placements(n: usize, mesh: u32) -> Vec<PropPlacement> {
        (0..n)
            .map(|i| PropPlacement {
                mesh,
                position: Vec3::new(i as f32, 0.0, 0.0),
                rotation: 0.0,
                scale: 1.0,
            })
            .collect()
    }

    #[test]
    fn test_mesh_count_is_ceil_of_vertices_over_budget() {
        let catalog = catalog();
        // 10 props * 8 vertices = 80 vertices, budget 32 -> ceil(80 / 32) = 3
        let meshes = batch_props(5, &placements(10, 0), &catalog, 32).unwrap();
        assert_eq!(meshes.len(), 3);
        assert!(meshes.iter().all(|m| m.vertex_count() <= 32));
        assert_eq!(meshes.iter().map(|m| m.vertex_count()).sum::<usize>(), 80);
        assert!(meshes.iter().all(|m| m.layer == 5));
    }

    #[test]
    fn test_exact_fit_is_single_mesh() {
        let catalog = catalog();
        let meshes = batch_props(0, &placements(4, 1), &catalog, 32).unwrap();
        assert_eq!(meshes.len(), 1);
        assert_eq!(meshes[0].vertex_count(), 32);
    }

    #[test]
    fn test_oversized_prop_stands_alone() {
        let catalog = catalog();
        let meshes = batch_props(0, &placements(3, 0), &catalog, 4).unwrap();
        assert_eq!(meshes.len(), 3);
    }

    #[test]
    fn test_empty_and_unknown_mesh() {
        let catalog = catalog();
        assert!(batch_props(0, &[], &catalog, 32).unwrap().is_empty());
        assert!(batch_props(0, &placements(1, 9), &catalog, 32).is_err());
    }
}
