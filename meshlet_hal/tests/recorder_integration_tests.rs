//! Integration tests for the meshlet recorder through the public API
//!
//! A counting encoder stands in for a GPU backend. No GPU required.
//!
//! Run with: cargo test --test recorder_integration_tests

use meshlet_hal::meshlet::{Config, Error, Result};
use meshlet_hal::meshlet::command::{Barrier, CommandEncoder, MeshletRecorder};
use meshlet_hal::meshlet::device::{
    BindingLayout, BindingLayoutDesc, BindingSet, Buffer, BufferDesc, Color, Format, Framebuffer,
    FramebufferInfo, MeshletPipeline, MeshletPipelineDesc, MeshletState, NativeViewport,
    ResourceId, ResourceRef, ResourceStateCell, ResourceStates, ResourceUsage, ScissorRect, ShaderType, Texture,
    TextureDesc, TrackedResource, Viewport, ViewportState,
};
use meshlet_hal::meshlet::log::{set_logger, reset_logger, LogEntry, LogSeverity, Logger};
use serial_test::serial;
use std::any::Any;
use std::sync::{Arc, Mutex};

// ============================================================================
// TEST BACKEND
// ============================================================================

#[derive(Default)]
struct CountingEncoder {
    commands: Vec<&'static str>,
    barriers: usize,
    dispatched_tasks: u32,
    referenced: usize,
}

impl CommandEncoder for CountingEncoder {
    fn begin(&mut self) -> Result<()> { self.commands.push("begin"); Ok(()) }
    fn end(&mut self) -> Result<()> { self.commands.push("end"); Ok(()) }
    fn bind_meshlet_pipeline(&mut self, _: &Arc<dyn MeshletPipeline>) -> Result<()> {
        self.commands.push("bind_pipeline");
        Ok(())
    }
    fn begin_render_pass(&mut self, _: &Arc<dyn Framebuffer>) -> Result<()> {
        self.commands.push("begin_render_pass");
        Ok(())
    }
    fn end_render_pass(&mut self) -> Result<()> { self.commands.push("end_render_pass"); Ok(()) }
    fn pipeline_barriers(&mut self, barriers: &[Barrier]) -> Result<()> {
        self.commands.push("barriers");
        self.barriers += barriers.len();
        Ok(())
    }
    fn cache_pipeline_layout(&mut self, _: &Arc<dyn MeshletPipeline>) -> Result<()> { Ok(()) }
    fn bind_binding_sets(&mut self, _: &Arc<dyn MeshletPipeline>, _: &[Arc<dyn BindingSet>]) -> Result<()> {
        self.commands.push("bind_binding_sets");
        Ok(())
    }
    fn set_viewports(&mut self, _: &[NativeViewport]) -> Result<()> { self.commands.push("set_viewports"); Ok(()) }
    fn set_scissors(&mut self, _: &[ScissorRect]) -> Result<()> { self.commands.push("set_scissors"); Ok(()) }
    fn set_stencil_reference(&mut self, _: u8) -> Result<()> { self.commands.push("set_stencil_reference"); Ok(()) }
    fn set_blend_constants(&mut self, _: Color) -> Result<()> { self.commands.push("set_blend_constants"); Ok(()) }
    fn push_constants(&mut self, _: ShaderType, _: &[u8]) -> Result<()> { self.commands.push("push_constants"); Ok(()) }
    fn draw_mesh_tasks(&mut self, task_count: u32, _first_task: u32) -> Result<()> {
        self.commands.push("draw_mesh_tasks");
        self.dispatched_tasks += task_count;
        Ok(())
    }
    fn reference_resource(&mut self, _: ResourceRef) { self.referenced += 1; }
}

struct TestBuffer {
    desc: BufferDesc,
    id: ResourceId,
    state: ResourceStateCell,
}

impl Buffer for TestBuffer {
    fn desc(&self) -> &BufferDesc { &self.desc }
    fn resource_id(&self) -> ResourceId { self.id }
    fn update(&self, _offset: u64, _data: &[u8]) -> Result<()> { Ok(()) }
    fn committed_state(&self) -> &ResourceStateCell { &self.state }
    fn as_any(&self) -> &dyn Any { self }
}

struct TestTexture {
    desc: TextureDesc,
    id: ResourceId,
    state: ResourceStateCell,
}

impl Texture for TestTexture {
    fn desc(&self) -> &TextureDesc { &self.desc }
    fn resource_id(&self) -> ResourceId { self.id }
    fn committed_state(&self) -> &ResourceStateCell { &self.state }
    fn as_any(&self) -> &dyn Any { self }
}

struct TestFramebuffer {
    info: FramebufferInfo,
    colors: Vec<Arc<dyn Texture>>,
}

impl Framebuffer for TestFramebuffer {
    fn info(&self) -> &FramebufferInfo { &self.info }
    fn color_attachments(&self) -> &[Arc<dyn Texture>] { &self.colors }
    fn depth_attachment(&self) -> Option<&Arc<dyn Texture>> { None }
    fn extent(&self) -> (u32, u32) { (128, 128) }
    fn as_any(&self) -> &dyn Any { self }
}

struct TestLayout {
    desc: BindingLayoutDesc,
}

impl BindingLayout for TestLayout {
    fn desc(&self) -> &BindingLayoutDesc { &self.desc }
    fn as_any(&self) -> &dyn Any { self }
}

struct TestBindingSet {
    layout: Arc<dyn BindingLayout>,
    usages: Vec<ResourceUsage>,
}

impl BindingSet for TestBindingSet {
    fn layout(&self) -> &Arc<dyn BindingLayout> { &self.layout }
    fn resource_usages(&self) -> &[ResourceUsage] { &self.usages }
    fn as_any(&self) -> &dyn Any { self }
}

struct TestPipeline {
    desc: MeshletPipelineDesc,
    info: FramebufferInfo,
    mapping: Vec<Option<usize>>,
}

impl MeshletPipeline for TestPipeline {
    fn desc(&self) -> &MeshletPipelineDesc { &self.desc }
    fn framebuffer_info(&self) -> &FramebufferInfo { &self.info }
    fn shader_mask(&self) -> ShaderType { ShaderType::MESH }
    fn uses_blend_constants(&self) -> bool { false }
    fn descriptor_set_mapping(&self) -> &[Option<usize>] { &self.mapping }
    fn push_constant_visibility(&self) -> ShaderType { ShaderType::MESH }
    fn as_any(&self) -> &dyn Any { self }
}

struct Scene {
    state: MeshletState,
    buffer: Arc<dyn Buffer>,
}

fn scene() -> Scene {
    let target: Arc<dyn Texture> = Arc::new(TestTexture {
        desc: TextureDesc {
            width: 128,
            height: 128,
            format: Format::R8G8B8A8_UNORM,
            sample_count: 1,
            debug_name: "target".into(),
        },
        id: ResourceId::next(),
        state: ResourceStateCell::new(),
    });
    let info = FramebufferInfo::new(vec![Format::R8G8B8A8_UNORM], Format::UNKNOWN, 1);
    let framebuffer: Arc<dyn Framebuffer> = Arc::new(TestFramebuffer { info: info.clone(), colors: vec![target] });

    let buffer: Arc<dyn Buffer> = Arc::new(TestBuffer {
        desc: BufferDesc { size: 64, is_volatile: true, ..Default::default() },
        id: ResourceId::next(),
        state: ResourceStateCell::new(),
    });
    let layout: Arc<dyn BindingLayout> = Arc::new(TestLayout {
        desc: BindingLayoutDesc { visibility: ShaderType::MESH, push_constants_size: 16, ..Default::default() },
    });
    let set: Arc<dyn BindingSet> = Arc::new(TestBindingSet {
        layout: layout.clone(),
        usages: vec![ResourceUsage {
            resource: TrackedResource::Buffer(buffer.clone()),
            state: ResourceStates::CONSTANT_BUFFER,
        }],
    });
    let pipeline: Arc<dyn MeshletPipeline> = Arc::new(TestPipeline {
        desc: MeshletPipelineDesc { binding_layouts: vec![layout], ..Default::default() },
        info,
        mapping: vec![Some(0)],
    });

    let state = MeshletState::new(pipeline, framebuffer)
        .with_viewport(ViewportState::single(Viewport::from_size(128.0, 128.0)))
        .with_bindings(vec![set]);

    Scene { state, buffer }
}

// ============================================================================
// RECORDING TESTS
// ============================================================================

#[test]
fn test_integration_frame_with_repeated_state() {
    let scene = scene();
    let mut recorder = MeshletRecorder::new(CountingEncoder::default(), Config::default());

    recorder.begin().unwrap();
    recorder.set_meshlet_state(&scene.state).unwrap();
    recorder.dispatch_mesh(32, 1, 1).unwrap();
    let after_first_draw = recorder.encoder().commands.len();

    // Same state again: only the dispatch is emitted
    recorder.set_meshlet_state(&scene.state).unwrap();
    recorder.dispatch_mesh(16, 1, 1).unwrap();
    assert_eq!(recorder.encoder().commands.len(), after_first_draw + 1);

    recorder.end().unwrap();

    let encoder = recorder.into_encoder();
    assert_eq!(encoder.dispatched_tasks, 48);
    assert_eq!(encoder.barriers, 2);
    assert_eq!(encoder.commands.first(), Some(&"begin"));
    assert_eq!(&encoder.commands[encoder.commands.len() - 2..], &["end_render_pass", "end"]);
}

#[test]
fn test_integration_volatile_write_rebinds_before_dispatch() {
    let scene = scene();
    let mut recorder = MeshletRecorder::new(CountingEncoder::default(), Config::default());

    recorder.begin().unwrap();
    recorder.set_meshlet_state(&scene.state).unwrap();
    recorder.write_buffer(&scene.buffer, 0, &[0u8; 16]).unwrap();
    let before = recorder.encoder().commands.len();

    recorder.dispatch_mesh(1, 1, 1).unwrap();

    let commands = &recorder.encoder().commands[before..];
    assert_eq!(commands, &["bind_binding_sets", "draw_mesh_tasks"]);
    recorder.end().unwrap();
}

#[test]
fn test_integration_push_constants_after_state() {
    let scene = scene();
    let mut recorder = MeshletRecorder::new(CountingEncoder::default(), Config::default());

    recorder.begin().unwrap();
    assert!(matches!(recorder.set_push_constants(&[0u8; 16]), Err(Error::InvalidArgument(_))));
    recorder.set_meshlet_state(&scene.state).unwrap();
    recorder.set_push_constants(&[0u8; 16]).unwrap();
    assert_eq!(recorder.encoder().commands.last(), Some(&"push_constants"));
    recorder.end().unwrap();
}

#[test]
fn test_integration_second_list_keeps_target_state() {
    let scene = scene();

    let mut first = MeshletRecorder::new(CountingEncoder::default(), Config::default());
    first.begin().unwrap();
    first.set_meshlet_state(&scene.state).unwrap();
    first.dispatch_mesh(4, 1, 1).unwrap();
    first.end().unwrap();
    assert_eq!(first.encoder().barriers, 2);

    let mut second = MeshletRecorder::new(CountingEncoder::default(), Config::default());
    second.begin().unwrap();
    second.set_meshlet_state(&scene.state).unwrap();
    second.dispatch_mesh(4, 1, 1).unwrap();
    second.end().unwrap();

    assert_eq!(second.encoder().barriers, 0);
    assert!(!second.encoder().commands.contains(&"barriers"));
}

#[test]
fn test_integration_explicit_state_requires_recording() {
    let scene = scene();
    let mut recorder = MeshletRecorder::new(CountingEncoder::default(), Config::default());

    assert!(matches!(
        recorder.set_buffer_state(&scene.buffer, ResourceStates::COPY_SOURCE),
        Err(Error::InvalidArgument(_))
    ));

    recorder.begin().unwrap();
    recorder.set_buffer_state(&scene.buffer, ResourceStates::COPY_SOURCE).unwrap();
    recorder.end().unwrap();

    assert_eq!(recorder.encoder().barriers, 1);
    assert_eq!(scene.buffer.committed_state().load(), ResourceStates::COPY_SOURCE);
}

// ============================================================================
// LOGGING TESTS
// ============================================================================

struct CaptureLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl Logger for CaptureLogger {
    fn log(&self, entry: &LogEntry) {
        if entry.source == "meshlet::recorder" {
            if let Ok(mut entries) = self.entries.lock() {
                entries.push(entry.clone());
            }
        }
    }
}

#[test]
#[serial]
fn test_integration_unsupported_dispatch_is_logged() {
    let entries = Arc::new(Mutex::new(Vec::new()));
    set_logger(CaptureLogger { entries: entries.clone() });

    let scene = scene();
    let mut recorder = MeshletRecorder::new(CountingEncoder::default(), Config::default());
    recorder.begin().unwrap();
    recorder.set_meshlet_state(&scene.state).unwrap();
    let result = recorder.dispatch_mesh(8, 8, 1);

    reset_logger();

    assert!(matches!(result, Err(Error::UnsupportedFeature(_))));
    assert_eq!(recorder.encoder().dispatched_tasks, 0);

    let entries = entries.lock().unwrap();
    assert!(entries.iter().any(|e| e.severity == LogSeverity::Warn));
}
