/// Buffer and texture traits, resource identity and resource states

use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use bitflags::bitflags;
use crate::error::Result;
use crate::device::{Format, BindingSet, Framebuffer, MeshletPipeline};

/// Process-unique identity of a GPU resource
///
/// Used as the key of the hazard tracker's state table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(u64);

static NEXT_RESOURCE_ID: AtomicU64 = AtomicU64::new(1);

impl ResourceId {
    /// Allocate a fresh id
    pub fn next() -> Self {
        Self(NEXT_RESOURCE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

bitflags! {
    /// Access states a resource can be required in
    ///
    /// The empty set means "unknown".
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ResourceStates: u32 {
        const CONSTANT_BUFFER = 1 << 0;
        const SHADER_RESOURCE = 1 << 1;
        const UNORDERED_ACCESS = 1 << 2;
        const RENDER_TARGET = 1 << 3;
        const DEPTH_WRITE = 1 << 4;
        const DEPTH_READ = 1 << 5;
        const INDIRECT_ARGUMENT = 1 << 6;
        const COPY_DEST = 1 << 7;
        const COPY_SOURCE = 1 << 8;
    }
}

impl ResourceStates {
    pub const UNKNOWN: Self = Self::empty();
}

/// State a resource was left in by the last recording that ended
///
/// Shared by every recorder, so a new recording starts from where the
/// previous one left the resource instead of from `UNKNOWN`.
#[derive(Debug, Default)]
pub struct ResourceStateCell(AtomicU32);

impl ResourceStateCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&self) -> ResourceStates {
        ResourceStates::from_bits_truncate(self.0.load(Ordering::Acquire))
    }

    pub fn store(&self, state: ResourceStates) {
        self.0.store(state.bits(), Ordering::Release);
    }
}

// ===== BUFFER =====

/// Descriptor for creating a buffer
#[derive(Debug, Clone)]
pub struct BufferDesc {
    /// Size in bytes
    pub size: u64,
    /// Contents are rewritten frequently; writes force a rebind of binding sets
    pub is_volatile: bool,
    /// Usable as a storage (UAV) buffer
    pub can_have_uavs: bool,
    /// Usable as the indirect-arguments buffer of a dispatch
    pub is_indirect_args: bool,
    pub debug_name: String,
}

impl Default for BufferDesc {
    fn default() -> Self {
        Self {
            size: 0,
            is_volatile: false,
            can_have_uavs: false,
            is_indirect_args: false,
            debug_name: String::new(),
        }
    }
}

/// Buffer resource trait
///
/// Implemented by backend-specific buffer types (e.g., VulkanBuffer).
/// The buffer is automatically destroyed when dropped.
pub trait Buffer: Send + Sync {
    fn desc(&self) -> &BufferDesc;

    fn resource_id(&self) -> ResourceId;

    /// Update buffer data
    ///
    /// # Arguments
    ///
    /// * `offset` - Offset into the buffer in bytes
    /// * `data` - Data to write
    fn update(&self, offset: u64, data: &[u8]) -> Result<()>;

    /// Last committed access state
    fn committed_state(&self) -> &ResourceStateCell;

    fn as_any(&self) -> &dyn Any;
}

// ===== TEXTURE =====

/// Descriptor of a texture used as a render attachment or shader resource
#[derive(Debug, Clone)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    pub format: Format,
    pub sample_count: u32,
    pub debug_name: String,
}

/// Texture resource trait
pub trait Texture: Send + Sync {
    fn desc(&self) -> &TextureDesc;

    fn resource_id(&self) -> ResourceId;

    /// Last committed access state
    fn committed_state(&self) -> &ResourceStateCell;

    fn as_any(&self) -> &dyn Any;
}

// ===== TRACKING =====

/// A resource whose state the hazard tracker follows
#[derive(Clone)]
pub enum TrackedResource {
    Buffer(Arc<dyn Buffer>),
    Texture(Arc<dyn Texture>),
}

impl TrackedResource {
    pub fn resource_id(&self) -> ResourceId {
        match self {
            TrackedResource::Buffer(b) => b.resource_id(),
            TrackedResource::Texture(t) => t.resource_id(),
        }
    }

    pub fn committed_state(&self) -> &ResourceStateCell {
        match self {
            TrackedResource::Buffer(b) => b.committed_state(),
            TrackedResource::Texture(t) => t.committed_state(),
        }
    }
}

impl std::fmt::Debug for TrackedResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackedResource::Buffer(b) => write!(f, "Buffer({})", b.resource_id().raw()),
            TrackedResource::Texture(t) => write!(f, "Texture({})", t.resource_id().raw()),
        }
    }
}

/// A resource and the state a binding set requires it in
#[derive(Debug, Clone)]
pub struct ResourceUsage {
    pub resource: TrackedResource,
    pub state: ResourceStates,
}

/// Object kept alive until the command buffer referencing it has executed
#[derive(Clone)]
pub enum ResourceRef {
    Pipeline(Arc<dyn MeshletPipeline>),
    Buffer(Arc<dyn Buffer>),
    Framebuffer(Arc<dyn Framebuffer>),
    BindingSet(Arc<dyn BindingSet>),
}

impl ResourceRef {
    pub fn kind(&self) -> &'static str {
        match self {
            ResourceRef::Pipeline(_) => "pipeline",
            ResourceRef::Buffer(_) => "buffer",
            ResourceRef::Framebuffer(_) => "framebuffer",
            ResourceRef::BindingSet(_) => "binding_set",
        }
    }
}

impl std::fmt::Debug for ResourceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ResourceRef::{}", self.kind())
    }
}

/// Compare two shared objects by identity
pub fn same_object<T: ?Sized>(a: &Arc<T>, b: &Arc<T>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

/// Compare two optional shared objects by identity
pub fn same_optional_object<T: ?Sized>(a: Option<&Arc<T>>, b: Option<&Arc<T>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => same_object(a, b),
        (None, None) => true,
        _ => false,
    }
}

#[cfg(test)]
#[path = "resource_tests.rs"]
mod tests;
