//! Projects the entity arena into GPU objects.
//!
//! The scene model stays free of wgpu types; this adapter is the one place
//! the two meet. Each entity gets mesh buffers built from its kind
//! parameters, a transform uniform updated every sync, and a material bind
//! group that starts on the shared placeholder texture and is swapped in
//! place when the entity's real texture arrives.

use std::collections::HashMap;

use cgmath::{Matrix4, Rad, Vector3};
use wgpu::util::DeviceExt;

use crate::scene::{Entity, EntityId, EntityKind, SceneGraph};

use super::geometry::{generate_cube, generate_sphere, GeometryData};
use super::render_engine::{convert_matrix4_to_array, ObjectUniform, RenderEngine};
use super::texture::TextureResource;

pub struct GpuEntity {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
    pub transform_buffer: wgpu::Buffer,
    pub object_bind_group: wgpu::BindGroup,
    pub material_bind_group: wgpu::BindGroup,
    /// Kind parameters the mesh was built from; a mismatch forces a rebuild.
    kind: EntityKind,
}

pub struct SceneAdapter {
    objects: HashMap<EntityId, GpuEntity>,
    placeholder: TextureResource,
    object_layout: wgpu::BindGroupLayout,
    material_layout: wgpu::BindGroupLayout,
}

impl SceneAdapter {
    pub fn new(engine: &RenderEngine) -> Self {
        Self {
            objects: HashMap::new(),
            placeholder: TextureResource::create_placeholder(engine.device(), engine.queue()),
            object_layout: engine.object_layout().clone(),
            material_layout: engine.material_layout().clone(),
        }
    }

    pub fn objects(&self) -> impl Iterator<Item = &GpuEntity> {
        self.objects.values()
    }

    /// Brings the GPU side in line with the graph: creates objects for new
    /// entities, drops removed ones, rebuilds meshes whose parameters
    /// changed, and refreshes every transform.
    pub fn sync(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, graph: &SceneGraph) {
        self.objects.retain(|id, _| graph.get(*id).is_some());

        for (id, entity) in graph.iter() {
            let stale = self
                .objects
                .get(&id)
                .map(|gpu| gpu.kind != entity.kind)
                .unwrap_or(true);
            if stale {
                let gpu = self.build_gpu_entity(device, entity);
                self.objects.insert(id, gpu);
            }

            if let Some(gpu) = self.objects.get(&id) {
                let uniform = object_uniform(entity);
                queue.write_buffer(&gpu.transform_buffer, 0, bytemuck::bytes_of(&uniform));
            }
        }
    }

    /// Swaps the entity's material from the placeholder to its real texture.
    /// Silently ignores entities that have disappeared in the meantime.
    pub fn apply_texture(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        id: EntityId,
        data: &crate::assets::TextureData,
    ) {
        let Some(gpu) = self.objects.get_mut(&id) else {
            return;
        };

        let texture = TextureResource::create_from_rgba_data(
            device,
            queue,
            &data.rgba,
            data.width,
            data.height,
            "entity texture",
        );
        gpu.material_bind_group = material_bind_group(device, &self.material_layout, &texture);
    }

    /// Drops every GPU object; the next sync rebuilds from the (new) graph.
    /// Called when a load replaces the graph wholesale.
    pub fn invalidate(&mut self) {
        self.objects.clear();
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    fn build_gpu_entity(&self, device: &wgpu::Device, entity: &Entity) -> GpuEntity {
        let geometry = geometry_for(&entity.kind);
        let vertices = geometry.to_vertices();

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Vertex Buffer", entity.name)),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Index Buffer", entity.name)),
            contents: bytemuck::cast_slice(&geometry.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let transform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Transform Buffer", entity.name)),
            contents: bytemuck::bytes_of(&object_uniform(entity)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let object_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{} Object Bind Group", entity.name)),
            layout: &self.object_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: transform_buffer.as_entire_binding(),
            }],
        });

        let material_bind_group =
            material_bind_group(device, &self.material_layout, &self.placeholder);

        GpuEntity {
            vertex_buffer,
            index_buffer,
            index_count: geometry.indices.len() as u32,
            transform_buffer,
            object_bind_group,
            material_bind_group,
            kind: entity.kind.clone(),
        }
    }
}

fn material_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    texture: &TextureResource,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Material Bind Group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&texture.sampler),
            },
        ],
    })
}

/// Unit-sized mesh for the kind; world scale lives in the model matrix.
fn geometry_for(kind: &EntityKind) -> GeometryData {
    match kind {
        EntityKind::Planet(planet) => generate_sphere(planet.quality, planet.quality),
        EntityKind::Cuboid(_) => generate_cube(),
    }
}

fn object_uniform(entity: &Entity) -> ObjectUniform {
    let (scale, color) = match &entity.kind {
        EntityKind::Planet(planet) => (planet.radius, [1.0, 1.0, 1.0, 1.0]),
        EntityKind::Cuboid(cuboid) => (
            cuboid.size,
            [cuboid.color[0], cuboid.color[1], cuboid.color[2], 1.0],
        ),
    };

    let model = Matrix4::from_translation(Vector3::new(
        entity.position[0],
        entity.position[1],
        entity.position[2],
    )) * Matrix4::from_angle_y(Rad(entity.spin))
        * Matrix4::from_scale(scale);

    ObjectUniform {
        model: convert_matrix4_to_array(model),
        color,
    }
}
