//! Wavefront OBJ export.
//!
//! OBJ is a simple, widely-supported text-based 3D format. Textures are
//! referenced from the MTL by file name, so the texture itself has to be
//! copied next to the output for the material to resolve.

use super::{Artifact, ExportOptions, ExportTarget, SceneExporter};
use crate::error::{ConvertError, Result};
use crate::mesher::{build_mesh, SceneMesh};
use crate::scene::Scene;
use std::fmt::Write;

/// Text exporter producing `<name>.obj` and `<name>.mtl`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ObjExporter;

impl SceneExporter for ObjExporter {
    fn target(&self) -> ExportTarget {
        ExportTarget::Obj
    }

    fn compile(&self, scene: &Scene, _options: &ExportOptions) -> Result<Vec<Artifact>> {
        let (obj, mtl) = export_obj(scene)?;
        Ok(vec![Artifact::new("obj", obj), Artifact::new("mtl", mtl)])
    }
}

/// Export a scene to OBJ format.
/// Returns (obj_content, mtl_content) as strings.
pub fn export_obj(scene: &Scene) -> Result<(String, String)> {
    let mesh = build_mesh(scene);
    if mesh.is_empty() {
        return Err(ConvertError::Export(format!(
            "Scene {:?} has no faces to export",
            scene.name()
        )));
    }

    let materials = material_names(scene, &mesh);
    let obj = write_obj(scene.name(), &mesh, &materials)
        .map_err(|e| ConvertError::Export(format!("Failed to format OBJ: {}", e)))?;
    let mtl = write_mtl(scene, &mesh, &materials)
        .map_err(|e| ConvertError::Export(format!("Failed to format MTL: {}", e)))?;
    Ok((obj, mtl))
}

/// One material name per mesh group.
fn material_names(scene: &Scene, mesh: &SceneMesh) -> Vec<String> {
    mesh.groups
        .iter()
        .enumerate()
        .map(|(i, group)| match group.texture {
            Some(_) => format!("{}_material_{}", scene.name(), i),
            None => format!("{}_untextured_{}", scene.name(), i),
        })
        .collect()
}

fn write_obj(
    name: &str,
    mesh: &SceneMesh,
    materials: &[String],
) -> std::result::Result<String, std::fmt::Error> {
    let total_verts = mesh.total_vertices();
    let total_tris = mesh.total_triangles();

    // Pre-size: ~60 bytes per vertex line (v/vt/vn) × 3 + ~40 per face
    let mut obj = String::with_capacity(256 + total_verts * 180 + total_tris * 40);

    writeln!(obj, "# blocky-batch OBJ Export")?;
    writeln!(obj, "# Vertices: {}", total_verts)?;
    writeln!(obj, "# Triangles: {}", total_tris)?;
    writeln!(obj)?;
    writeln!(obj, "mtllib {}.mtl", name)?;
    writeln!(obj)?;
    writeln!(obj, "o {}", name)?;
    writeln!(obj)?;

    // OBJ has global pools
    for group in &mesh.groups {
        for vertex in &group.mesh.vertices {
            writeln!(
                obj,
                "v {} {} {}",
                vertex.position[0], vertex.position[1], vertex.position[2]
            )?;
        }
    }
    writeln!(obj)?;

    // OBJ texture space has v pointing up
    for group in &mesh.groups {
        for vertex in &group.mesh.vertices {
            writeln!(obj, "vt {} {}", vertex.uv[0], 1.0 - vertex.uv[1])?;
        }
    }
    writeln!(obj)?;

    for group in &mesh.groups {
        for vertex in &group.mesh.vertices {
            writeln!(
                obj,
                "vn {} {} {}",
                vertex.normal[0], vertex.normal[1], vertex.normal[2]
            )?;
        }
    }
    writeln!(obj)?;

    let mut vertex_offset: usize = 0;
    for (group, material) in mesh.groups.iter().zip(materials) {
        if group.mesh.is_empty() {
            continue;
        }
        writeln!(obj, "usemtl {}", material)?;
        for tri in group.mesh.indices.chunks_exact(3) {
            let i0 = tri[0] as usize + vertex_offset + 1;
            let i1 = tri[1] as usize + vertex_offset + 1;
            let i2 = tri[2] as usize + vertex_offset + 1;
            writeln!(
                obj,
                "f {}/{}/{} {}/{}/{} {}/{}/{}",
                i0, i0, i0, i1, i1, i1, i2, i2, i2
            )?;
        }
        vertex_offset += group.mesh.vertex_count();
    }

    Ok(obj)
}

fn write_mtl(
    scene: &Scene,
    mesh: &SceneMesh,
    materials: &[String],
) -> std::result::Result<String, std::fmt::Error> {
    let mut mtl = String::with_capacity(256 * materials.len().max(1));
    writeln!(mtl, "# blocky-batch Material")?;

    for (group, material) in mesh.groups.iter().zip(materials) {
        writeln!(mtl)?;
        writeln!(mtl, "newmtl {}", material)?;
        writeln!(mtl, "Ka 1.0 1.0 1.0")?;
        writeln!(mtl, "Kd 1.0 1.0 1.0")?;
        writeln!(mtl, "Ks 0.0 0.0 0.0")?;
        writeln!(mtl, "Ns 10.0")?;
        writeln!(mtl, "d 1.0")?;
        writeln!(mtl, "illum 1")?;
        if let Some(texture) = group.texture.and_then(|id| scene.texture(id)) {
            writeln!(mtl, "map_Kd {}", texture.asset.file_name)?;
        }
    }

    Ok(mtl)
}
