//! glTF/GLB export.

use super::{Artifact, ExportOptions, ExportTarget, SceneExporter};
use crate::error::{ConvertError, Result};
use crate::mesher::{build_mesh, Mesh};
use crate::scene::{Scene, SceneTexture};
use crate::types::BoundingBox;
use gltf_json as json;
use json::validation::Checked::Valid;
use json::validation::USize64;
use tracing::{debug, warn};

/// Binary exporter producing a single `<name>.glb`.
#[derive(Debug, Default, Clone, Copy)]
pub struct GlbExporter;

impl SceneExporter for GlbExporter {
    fn target(&self) -> ExportTarget {
        ExportTarget::Glb
    }

    fn compile(&self, scene: &Scene, options: &ExportOptions) -> Result<Vec<Artifact>> {
        if !options.binary {
            return Err(ConvertError::Export(
                "GLB exporter only produces binary containers".to_string(),
            ));
        }
        if options.include_animations {
            debug!(scene = %scene.name(), "scene carries no animations, nothing to include");
        }
        let glb = export_glb(scene, options.embed_resources)?;
        Ok(vec![Artifact::new("glb", glb)])
    }
}

/// Byte ranges of one mesh inside the BIN chunk.
struct MeshOffsets {
    pos_offset: usize,
    pos_bytes: usize,
    norm_offset: usize,
    norm_bytes: usize,
    uv_offset: usize,
    uv_bytes: usize,
    idx_offset: usize,
    idx_bytes: usize,
    vertex_count: usize,
    index_count: usize,
    bounds: BoundingBox,
}

/// Export a scene to GLB format (binary glTF).
///
/// With `embed_textures` the bound textures are stored in the BIN chunk;
/// otherwise images reference the texture file by name.
pub fn export_glb(scene: &Scene, embed_textures: bool) -> Result<Vec<u8>> {
    let mesh = build_mesh(scene);
    if mesh.is_empty() {
        return Err(ConvertError::Export(format!(
            "Cannot export empty scene {:?}",
            scene.name()
        )));
    }

    let mut buffer_data: Vec<u8> = Vec::new();

    let mesh_offsets: Vec<Option<MeshOffsets>> = mesh
        .groups
        .iter()
        .map(|group| write_mesh(&mut buffer_data, &group.mesh))
        .collect();

    let mut buffer_views = Vec::new();
    let mut accessors = Vec::new();
    let mut primitives = Vec::new();
    let mut images = Vec::new();
    let mut textures = Vec::new();
    let mut materials = Vec::new();

    let mut untextured_material: Option<u32> = None;
    let mut group_materials = Vec::with_capacity(mesh.groups.len());

    for group in &mesh.groups {
        let texture = group.texture.and_then(|id| scene.texture(id));
        let textured = texture.and_then(|texture| {
            match texture_image(texture, embed_textures, &mut buffer_data, &mut buffer_views) {
                Ok(image) => {
                    images.push(image);
                    textures.push(json::Texture {
                        sampler: Some(json::Index::new(0)),
                        source: json::Index::new((images.len() - 1) as u32),
                        extensions: Default::default(),
                        extras: Default::default(),
                    });
                    materials.push(create_material(Some((textures.len() - 1) as u32)));
                    Some((materials.len() - 1) as u32)
                }
                Err(e) => {
                    warn!(
                        scene = %scene.name(),
                        texture = %texture.asset.file_name,
                        error = %e,
                        "texture is not a recognized image, exporting untextured"
                    );
                    None
                }
            }
        });

        let material = match textured {
            Some(idx) => idx,
            None => *untextured_material.get_or_insert_with(|| {
                materials.push(create_material(None));
                (materials.len() - 1) as u32
            }),
        };
        group_materials.push(material);
    }

    for (offsets, material) in mesh_offsets.iter().zip(&group_materials) {
        if let Some(offsets) = offsets {
            add_mesh_primitive(
                offsets,
                *material,
                &mut buffer_views,
                &mut accessors,
                &mut primitives,
            );
        }
    }

    let total_buffer_size = buffer_data.len();

    let root = json::Root {
        accessors,
        buffers: vec![json::Buffer {
            byte_length: USize64(total_buffer_size as u64),
            extensions: Default::default(),
            extras: Default::default(),
            uri: None,
        }],
        buffer_views,
        images,
        samplers: vec![json::texture::Sampler {
            mag_filter: Some(Valid(json::texture::MagFilter::Nearest)),
            min_filter: Some(Valid(json::texture::MinFilter::Nearest)),
            wrap_s: Valid(json::texture::WrappingMode::ClampToEdge),
            wrap_t: Valid(json::texture::WrappingMode::ClampToEdge),
            extensions: Default::default(),
            extras: Default::default(),
        }],
        textures,
        materials,
        meshes: vec![json::Mesh {
            extensions: Default::default(),
            extras: Default::default(),
            primitives,
            weights: None,
        }],
        nodes: vec![json::Node {
            camera: None,
            children: None,
            extensions: Default::default(),
            extras: Default::default(),
            matrix: None,
            mesh: Some(json::Index::new(0)),
            rotation: None,
            scale: None,
            translation: None,
            skin: None,
            weights: None,
        }],
        scenes: vec![json::Scene {
            extensions: Default::default(),
            extras: Default::default(),
            nodes: vec![json::Index::new(0)],
        }],
        scene: Some(json::Index::new(0)),
        ..Default::default()
    };

    let json_string = json::serialize::to_string(&root)
        .map_err(|e| ConvertError::Export(format!("Failed to serialize glTF JSON: {}", e)))?;

    Ok(assemble_glb(json_string.as_bytes(), &buffer_data))
}

/// Wrap JSON and binary payloads into a GLB container.
fn assemble_glb(json_bytes: &[u8], buffer_data: &[u8]) -> Vec<u8> {
    let json_padding = padding(json_bytes.len());
    let padded_json_len = json_bytes.len() + json_padding;

    let buffer_padding = padding(buffer_data.len());
    let padded_buffer_len = buffer_data.len() + buffer_padding;

    let total_size = 12 + // GLB header
        8 + padded_json_len + // JSON chunk
        8 + padded_buffer_len; // BIN chunk

    let mut glb = Vec::with_capacity(total_size);

    // GLB Header
    glb.extend_from_slice(b"glTF"); // magic
    glb.extend_from_slice(&2u32.to_le_bytes()); // version
    glb.extend_from_slice(&(total_size as u32).to_le_bytes()); // length

    // JSON Chunk
    glb.extend_from_slice(&(padded_json_len as u32).to_le_bytes());
    glb.extend_from_slice(&0x4E4F534Au32.to_le_bytes()); // chunk type: JSON
    glb.extend_from_slice(json_bytes);
    glb.extend(std::iter::repeat(0x20u8).take(json_padding)); // spaces

    // BIN Chunk
    glb.extend_from_slice(&(padded_buffer_len as u32).to_le_bytes());
    glb.extend_from_slice(&0x004E4942u32.to_le_bytes()); // chunk type: BIN
    glb.extend_from_slice(buffer_data);
    glb.extend(std::iter::repeat(0u8).take(buffer_padding));

    glb
}

fn padding(len: usize) -> usize {
    (4 - (len % 4)) % 4
}

/// Image entry for a bound texture: embedded in the BIN chunk, or a
/// reference to the texture file by name.
fn texture_image(
    texture: &SceneTexture,
    embed: bool,
    buffer: &mut Vec<u8>,
    buffer_views: &mut Vec<json::buffer::View>,
) -> Result<json::Image> {
    if !embed {
        return Ok(json::Image {
            buffer_view: None,
            mime_type: None,
            uri: Some(texture.asset.file_name.clone()),
            extensions: Default::default(),
            extras: Default::default(),
        });
    }

    let (view, mime) = embed_image(buffer, buffer_views, &texture.asset.bytes)?;
    Ok(json::Image {
        buffer_view: Some(json::Index::new(view)),
        mime_type: Some(json::image::MimeType(mime.to_string())),
        uri: None,
        extensions: Default::default(),
        extras: Default::default(),
    })
}

/// Append image bytes (4-byte aligned) and a view over them.
/// Fails when the bytes are not an image format we can label.
fn embed_image(
    buffer: &mut Vec<u8>,
    buffer_views: &mut Vec<json::buffer::View>,
    bytes: &[u8],
) -> Result<(u32, &'static str)> {
    let format = image::guess_format(bytes)?;
    let mime = format.to_mime_type();

    buffer.extend(std::iter::repeat(0u8).take(padding(buffer.len())));
    let offset = buffer.len();
    buffer.extend_from_slice(bytes);

    buffer_views.push(create_buffer_view(offset, bytes.len(), None));
    Ok(((buffer_views.len() - 1) as u32, mime))
}

fn write_mesh(buffer: &mut Vec<u8>, mesh: &Mesh) -> Option<MeshOffsets> {
    let bounds = BoundingBox::from_points(mesh.vertices.iter().map(|v| v.position))?;

    let pos_offset = buffer.len();
    extend_f32(buffer, &mesh.positions_flat());
    let norm_offset = buffer.len();
    extend_f32(buffer, &mesh.normals_flat());
    let uv_offset = buffer.len();
    extend_f32(buffer, &mesh.uvs_flat());
    let idx_offset = buffer.len();
    for index in &mesh.indices {
        buffer.extend_from_slice(&index.to_le_bytes());
    }
    let end = buffer.len();

    Some(MeshOffsets {
        pos_offset,
        pos_bytes: norm_offset - pos_offset,
        norm_offset,
        norm_bytes: uv_offset - norm_offset,
        uv_offset,
        uv_bytes: idx_offset - uv_offset,
        idx_offset,
        idx_bytes: end - idx_offset,
        vertex_count: mesh.vertex_count(),
        index_count: mesh.indices.len(),
        bounds,
    })
}

fn extend_f32(buffer: &mut Vec<u8>, values: &[f32]) {
    for value in values {
        buffer.extend_from_slice(&value.to_le_bytes());
    }
}

/// Add buffer views, accessors, and a primitive for one mesh.
fn add_mesh_primitive(
    offsets: &MeshOffsets,
    material_idx: u32,
    buffer_views: &mut Vec<json::buffer::View>,
    accessors: &mut Vec<json::Accessor>,
    primitives: &mut Vec<json::mesh::Primitive>,
) {
    use json::accessor::{ComponentType, Type};
    use json::buffer::Target;

    let accessor_start = accessors.len() as u32;
    let views = [
        (offsets.pos_offset, offsets.pos_bytes, Target::ArrayBuffer),
        (offsets.norm_offset, offsets.norm_bytes, Target::ArrayBuffer),
        (offsets.uv_offset, offsets.uv_bytes, Target::ArrayBuffer),
        (offsets.idx_offset, offsets.idx_bytes, Target::ElementArrayBuffer),
    ]
    .map(|(offset, bytes, target)| {
        buffer_views.push(create_buffer_view(offset, bytes, Some(target)));
        (buffer_views.len() - 1) as u32
    });

    // Position accessor (with bounds)
    accessors.push(create_accessor(
        views[0],
        offsets.vertex_count,
        Type::Vec3,
        ComponentType::F32,
        Some(offsets.bounds.min),
        Some(offsets.bounds.max),
    ));
    // Normal, UV, index accessors
    accessors.push(create_accessor(
        views[1],
        offsets.vertex_count,
        Type::Vec3,
        ComponentType::F32,
        None,
        None,
    ));
    accessors.push(create_accessor(
        views[2],
        offsets.vertex_count,
        Type::Vec2,
        ComponentType::F32,
        None,
        None,
    ));
    accessors.push(create_accessor(
        views[3],
        offsets.index_count,
        Type::Scalar,
        ComponentType::U32,
        None,
        None,
    ));

    primitives.push(create_primitive(accessor_start, accessor_start + 3, material_idx));
}

/// Create a buffer view.
fn create_buffer_view(
    offset: usize,
    size: usize,
    target: Option<json::buffer::Target>,
) -> json::buffer::View {
    json::buffer::View {
        buffer: json::Index::new(0),
        byte_length: USize64(size as u64),
        byte_offset: Some(USize64(offset as u64)),
        byte_stride: None,
        extensions: Default::default(),
        extras: Default::default(),
        target: target.map(Valid),
    }
}

/// Create an accessor.
fn create_accessor(
    buffer_view: u32,
    count: usize,
    type_: json::accessor::Type,
    component_type: json::accessor::ComponentType,
    min: Option<[f32; 3]>,
    max: Option<[f32; 3]>,
) -> json::Accessor {
    json::Accessor {
        buffer_view: Some(json::Index::new(buffer_view)),
        byte_offset: Some(USize64(0)),
        count: USize64(count as u64),
        component_type: Valid(json::accessor::GenericComponentType(component_type)),
        extensions: Default::default(),
        extras: Default::default(),
        type_: Valid(type_),
        min: min.map(|m| json::Value::from(m.to_vec())),
        max: max.map(|m| json::Value::from(m.to_vec())),
        normalized: false,
        sparse: None,
    }
}

/// Create a primitive whose attributes start at `positions_accessor`.
fn create_primitive(
    positions_accessor: u32,
    indices_accessor: u32,
    material: u32,
) -> json::mesh::Primitive {
    let mut attributes = std::collections::BTreeMap::new();
    attributes.insert(
        Valid(json::mesh::Semantic::Positions),
        json::Index::new(positions_accessor),
    );
    attributes.insert(
        Valid(json::mesh::Semantic::Normals),
        json::Index::new(positions_accessor + 1),
    );
    attributes.insert(
        Valid(json::mesh::Semantic::TexCoords(0)),
        json::Index::new(positions_accessor + 2),
    );

    json::mesh::Primitive {
        attributes,
        extensions: Default::default(),
        extras: Default::default(),
        indices: Some(json::Index::new(indices_accessor)),
        material: Some(json::Index::new(material)),
        mode: Valid(json::mesh::Mode::Triangles),
        targets: None,
    }
}

/// Create an alpha-masked material, textured when `texture_idx` is given.
fn create_material(texture_idx: Option<u32>) -> json::Material {
    json::Material {
        pbr_metallic_roughness: json::material::PbrMetallicRoughness {
            base_color_texture: texture_idx.map(|idx| json::texture::Info {
                index: json::Index::new(idx),
                tex_coord: 0,
                extensions: Default::default(),
                extras: Default::default(),
            }),
            base_color_factor: json::material::PbrBaseColorFactor([1.0, 1.0, 1.0, 1.0]),
            metallic_factor: json::material::StrengthFactor(0.0),
            roughness_factor: json::material::StrengthFactor(1.0),
            metallic_roughness_texture: None,
            extensions: Default::default(),
            extras: Default::default(),
        },
        alpha_mode: Valid(json::material::AlphaMode::Mask),
        alpha_cutoff: Some(json::material::AlphaCutoff(0.5)),
        double_sided: false,
        normal_texture: None,
        occlusion_texture: None,
        emissive_texture: None,
        emissive_factor: json::material::EmissiveFactor([0.0, 0.0, 0.0]),
        extensions: Default::default(),
        extras: Default::default(),
    }
}
