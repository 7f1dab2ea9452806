//! Unit tests for resource.rs

use std::sync::Arc;
use crate::device::mock_device::{MockBuffer, MockTexture};
use crate::device::{
    same_object, same_optional_object, Buffer, Format, ResourceId, ResourceRef,
    ResourceStateCell, ResourceStates, TrackedResource,
};

#[test]
fn test_resource_ids_are_unique() {
    let a = ResourceId::next();
    let b = ResourceId::next();
    assert_ne!(a, b);
    assert!(b.raw() > a.raw());
}

#[test]
fn test_unknown_state_is_empty() {
    assert!(ResourceStates::UNKNOWN.is_empty());
    assert_eq!(ResourceStates::default(), ResourceStates::UNKNOWN);
}

#[test]
fn test_state_cell_starts_unknown_and_keeps_last_store() {
    let cell = ResourceStateCell::new();
    assert_eq!(cell.load(), ResourceStates::UNKNOWN);

    cell.store(ResourceStates::RENDER_TARGET);
    cell.store(ResourceStates::SHADER_RESOURCE | ResourceStates::COPY_SOURCE);
    assert_eq!(cell.load(), ResourceStates::SHADER_RESOURCE | ResourceStates::COPY_SOURCE);
}

#[test]
fn test_tracked_resource_forwards_id() {
    let buffer = Arc::new(MockBuffer::new(64, false));
    let id = buffer.resource_id();
    buffer.committed_state().store(ResourceStates::COPY_DEST);
    let tracked = TrackedResource::Buffer(buffer);
    assert_eq!(tracked.resource_id(), id);
    assert_eq!(tracked.committed_state().load(), ResourceStates::COPY_DEST);

    let texture = Arc::new(MockTexture::new(Format::D32_SFLOAT));
    let tracked = TrackedResource::Texture(texture);
    assert!(format!("{:?}", tracked).starts_with("Texture("));
}

#[test]
fn test_same_object_is_identity_not_equality() {
    let a: Arc<dyn Buffer> = Arc::new(MockBuffer::new(64, false));
    let b: Arc<dyn Buffer> = Arc::new(MockBuffer::new(64, false));
    let a2 = Arc::clone(&a);

    assert!(same_object(&a, &a2));
    assert!(!same_object(&a, &b));
    assert!(same_optional_object::<dyn Buffer>(None, None));
    assert!(!same_optional_object(Some(&a), None));
}

#[test]
fn test_resource_ref_kind() {
    let buffer: Arc<dyn Buffer> = Arc::new(MockBuffer::new(16, true));
    assert_eq!(ResourceRef::Buffer(buffer).kind(), "buffer");
}
