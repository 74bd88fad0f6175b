use std::sync::Mutex;
use glam::{Vec2, Vec3};
use serial_test::serial;
use crate::graphics_device::mock_graphics_device::MockGraphicsDevice;
use crate::lumen3d::Engine;
use crate::lumen3d::log::{LogEntry, LogSeverity, Logger};
use crate::scene::{Material, MaterialSlot, Vertex};
use super::*;

fn context() -> RenderContext {
    RenderContext::new(Arc::new(MockGraphicsDevice::new())).unwrap()
}

fn quad_mesh(name: &str) -> Mesh {
    let vertices = [Vec3::ZERO, Vec3::X, Vec3::new(1.0, 1.0, 0.0), Vec3::Y]
        .into_iter()
        .map(|p| Vertex::new(p, Vec3::Z, Vec2::new(p.x, p.y)))
        .collect();
    Mesh::new(name, vertices, vec![0, 1, 2, 0, 2, 3], Material::new())
}

// ============================================================================
// Texture cache
// ============================================================================

#[test]
fn test_load_texture_caches_by_path() {
    let device = MockGraphicsDevice::new();
    let state = device.state();
    let ctx = RenderContext::new(Arc::new(device)).unwrap();
    let mut model = Model::new("crate");

    let first = model.load_texture(&ctx, "textures/crate.png", 2, 2, vec![0; 16], true).unwrap();
    let second = model.load_texture(&ctx, "textures/crate.png", 2, 2, vec![0; 16], true).unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(model.texture_count(), 1);
    let created = &state.lock().unwrap().textures_created;
    assert_eq!(created.iter().filter(|n| n.as_str() == "textures/crate.png").count(), 1);
}

#[test]
fn test_failed_texture_is_not_cached() {
    let ctx = context();
    let mut model = Model::new("crate");
    assert!(model.load_texture(&ctx, "bad.png", 2, 2, vec![0; 3], false).is_err());
    assert!(model.texture("bad.png").is_none());
}

struct MissingTextureLog {
    messages: Arc<Mutex<Vec<String>>>,
}

impl Logger for MissingTextureLog {
    fn log(&self, entry: &LogEntry) {
        if entry.severity == LogSeverity::Warn && entry.message.contains("lamp_model") {
            self.messages.lock().unwrap().push(entry.message.clone());
        }
    }
}

#[test]
#[serial]
fn test_texture_or_blank_warns_on_missing_path() {
    let messages = Arc::new(Mutex::new(Vec::new()));
    Engine::set_logger(MissingTextureLog { messages: messages.clone() });

    let ctx = context();
    let model = Model::new("lamp_model");
    let texture = model.texture_or_blank("missing.png", ctx.blank_texture());

    assert!(Arc::ptr_eq(&texture, ctx.blank_texture()));
    let logged = messages.lock().unwrap().clone();
    assert_eq!(logged.len(), 1);
    assert!(logged[0].contains("missing.png"));

    Engine::reset_logger();
}

#[test]
fn test_texture_or_blank_returns_cached() {
    let ctx = context();
    let mut model = Model::new("lamp");
    let loaded = model.load_texture(&ctx, "shade.png", 1, 1, vec![255; 4], true).unwrap();
    assert!(Arc::ptr_eq(&model.texture_or_blank("shade.png", ctx.blank_texture()), &loaded));
}

// ============================================================================
// Allocation
// ============================================================================

#[test]
fn test_allocate_and_deallocate_all_meshes() {
    let ctx = context();
    let mut model = Model::new("pair").with_mesh(quad_mesh("a")).with_mesh(quad_mesh("b"));
    assert!(!model.is_allocated());

    model.allocate(&ctx).unwrap();
    assert!(model.is_allocated());

    model.deallocate();
    assert!(model.meshes.iter().all(|m| !m.is_allocated()));
}

#[test]
fn test_mesh_material_uses_model_texture() {
    let ctx = context();
    let mut model = Model::new("textured");
    let albedo = model.load_texture(&ctx, "albedo.png", 4, 4, vec![128; 64], true).unwrap();
    let mut mesh = quad_mesh("body");
    mesh.material.set(MaterialSlot::Albedo, albedo.clone());
    model.meshes.push(mesh);
    model.allocate(&ctx).unwrap();

    let set = &model.meshes[0].gpu().unwrap().descriptor_set;
    assert!(Arc::ptr_eq(set.bound_texture(MaterialSlot::Albedo.binding()).unwrap(), &albedo));
}
