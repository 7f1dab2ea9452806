/// Binding layouts, binding sets and descriptor-set index mapping

use std::any::Any;
use std::ops::Range;
use std::sync::Arc;
use crate::error::Result;
use crate::device::{ResourceUsage, ShaderType};

/// Type of a single binding slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingType {
    ConstantBuffer,
    VolatileConstantBuffer,
    StructuredBuffer,
    StorageBuffer,
    Texture,
    StorageTexture,
    Sampler,
}

/// One slot of a binding layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindingLayoutItem {
    pub slot: u32,
    pub binding_type: BindingType,
    /// Array size (1 for non-arrays)
    pub count: u32,
}

/// Descriptor for creating a binding layout
#[derive(Debug, Clone, Default)]
pub struct BindingLayoutDesc {
    /// Stages that can see the bindings and push constants of this layout
    pub visibility: ShaderType,
    /// Explicit descriptor-set index; `None` maps the layout positionally
    pub descriptor_set_index: Option<u32>,
    pub items: Vec<BindingLayoutItem>,
    /// Push constant bytes contributed by this layout (0 = none)
    pub push_constants_size: u32,
}

/// Binding layout trait (one descriptor-set layout on the backend)
pub trait BindingLayout: Send + Sync {
    fn desc(&self) -> &BindingLayoutDesc;

    fn as_any(&self) -> &dyn Any;
}

/// Immutable set of resource bindings matching a [`BindingLayout`]
pub trait BindingSet: Send + Sync {
    fn layout(&self) -> &Arc<dyn BindingLayout>;

    /// Resources referenced by the set and the state each one requires
    fn resource_usages(&self) -> &[ResourceUsage];

    fn as_any(&self) -> &dyn Any;
}

/// Map descriptor-set index to index in the binding-layout list
///
/// Layouts without explicit set indices map positionally. When every
/// layout carries an explicit index, `mapping[set]` is the layout index
/// and unused sets are `None`. Mixing the two forms or reusing a set
/// index is rejected.
pub fn descriptor_set_mapping(layouts: &[Arc<dyn BindingLayout>]) -> Result<Vec<Option<usize>>> {
    let explicit = layouts
        .iter()
        .filter(|layout| layout.desc().descriptor_set_index.is_some())
        .count();

    if explicit == 0 {
        return Ok((0..layouts.len()).map(Some).collect());
    }

    if explicit != layouts.len() {
        return Err(crate::hal_invalid!(
            "meshlet::binding",
            "{} of {} binding layouts declare a descriptor set index; all or none must",
            explicit,
            layouts.len()
        ));
    }

    let mut mapping: Vec<Option<usize>> = Vec::new();
    for (layout_index, layout) in layouts.iter().enumerate() {
        let set = layout.desc().descriptor_set_index.unwrap_or_default() as usize;
        if set >= mapping.len() {
            mapping.resize(set + 1, None);
        }
        if mapping[set].is_some() {
            return Err(crate::hal_invalid!(
                "meshlet::binding",
                "Descriptor set index {} is used by more than one binding layout",
                set
            ));
        }
        mapping[set] = Some(layout_index);
    }

    Ok(mapping)
}

/// Split a mapping into runs of consecutive bound sets
///
/// Each run is bound with a single native call; gaps end a run.
pub fn descriptor_set_runs(mapping: &[Option<usize>]) -> Vec<Range<u32>> {
    let mut runs = Vec::new();
    let mut start: Option<u32> = None;

    for (set, entry) in mapping.iter().enumerate() {
        let set = set as u32;
        match (entry, start) {
            (Some(_), None) => start = Some(set),
            (None, Some(s)) => {
                runs.push(s..set);
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        runs.push(s..mapping.len() as u32);
    }

    runs
}

/// Stage visibility and total size of the push constants of a layout list
pub fn push_constant_range(layouts: &[Arc<dyn BindingLayout>]) -> (ShaderType, u32) {
    layouts
        .iter()
        .filter(|layout| layout.desc().push_constants_size > 0)
        .fold((ShaderType::empty(), 0), |(visibility, size), layout| {
            let desc = layout.desc();
            (visibility | desc.visibility, size.max(desc.push_constants_size))
        })
}

#[cfg(test)]
#[path = "binding_tests.rs"]
mod tests;
