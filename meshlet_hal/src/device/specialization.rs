/// Fixed-capacity specialization storage for pipeline creation
///
/// Pipeline creation happens in two passes: [`SpecializationCounts::count`]
/// walks the stages once to find exact sizes, then [`SpecializationStorage`]
/// is allocated with those sizes and filled stage by stage. The storage
/// never reallocates, so backend structures built afterwards can point into
/// it for the whole creation call. Stages refer to their slice of the
/// storage through index ranges, never through pointers.

use std::ops::Range;
use std::sync::Arc;
use crate::error::Result;
use crate::device::{Shader, SpecializationConstant};

/// Size in bytes of a single specialization constant
pub const SPECIALIZATION_WORD_SIZE: u32 = 4;

/// Aggregate sizes gathered during the counting pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpecializationCounts {
    /// Number of present shader stages
    pub stages: usize,
    /// Number of stages with at least one specialization constant
    pub stages_with_specializations: usize,
    /// Total number of constants across all stages
    pub constants: usize,
}

impl SpecializationCounts {
    /// Counting pass over the present stages
    pub fn count<'a, I>(stages: I) -> Self
    where
        I: IntoIterator<Item = &'a Arc<dyn Shader>>,
    {
        let mut counts = Self::default();
        for shader in stages {
            let num_constants = shader.desc().specialization_constants.len();
            counts.stages += 1;
            if num_constants > 0 {
                counts.stages_with_specializations += 1;
                counts.constants += num_constants;
            }
        }
        counts
    }
}

/// One map entry, with `offset` relative to the owning stage's data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecializationMapEntry {
    pub constant_id: u32,
    pub offset: u32,
    pub size: u32,
}

/// Ranges of one stage's entries and data words inside the storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSpecialization {
    pub entries: Range<usize>,
    pub data: Range<usize>,
}

/// Exact-capacity backing storage for specialization data
#[derive(Debug)]
pub struct SpecializationStorage {
    counts: SpecializationCounts,
    entries: Vec<SpecializationMapEntry>,
    data: Vec<u32>,
    stages: Vec<StageSpecialization>,
}

impl SpecializationStorage {
    /// Allocate storage sized exactly to `counts`
    pub fn with_counts(counts: SpecializationCounts) -> Self {
        Self {
            counts,
            entries: Vec::with_capacity(counts.constants),
            data: Vec::with_capacity(counts.constants),
            stages: Vec::with_capacity(counts.stages_with_specializations),
        }
    }

    /// Append one stage's constants
    ///
    /// Returns `None` for a stage without constants. Errors if the fill
    /// would exceed the counted capacity.
    pub fn push_stage(
        &mut self,
        constants: &[SpecializationConstant],
    ) -> Result<Option<usize>> {
        if constants.is_empty() {
            return Ok(None);
        }

        if self.stages.len() + 1 > self.counts.stages_with_specializations
            || self.data.len() + constants.len() > self.counts.constants
        {
            return Err(crate::hal_invalid!(
                "meshlet::pipeline",
                "Specialization storage overflow: {} stages / {} constants counted",
                self.counts.stages_with_specializations,
                self.counts.constants
            ));
        }

        let entry_start = self.entries.len();
        let data_start = self.data.len();

        for (i, constant) in constants.iter().enumerate() {
            self.entries.push(SpecializationMapEntry {
                constant_id: constant.constant_id,
                offset: i as u32 * SPECIALIZATION_WORD_SIZE,
                size: SPECIALIZATION_WORD_SIZE,
            });
            self.data.push(constant.value.to_bits());
        }

        self.stages.push(StageSpecialization {
            entries: entry_start..self.entries.len(),
            data: data_start..self.data.len(),
        });

        Ok(Some(self.stages.len() - 1))
    }

    pub fn counts(&self) -> SpecializationCounts {
        self.counts
    }

    pub fn stage(&self, index: usize) -> Option<&StageSpecialization> {
        self.stages.get(index)
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    pub fn entries(&self, stage: &StageSpecialization) -> &[SpecializationMapEntry] {
        &self.entries[stage.entries.clone()]
    }

    pub fn data(&self, stage: &StageSpecialization) -> &[u32] {
        &self.data[stage.data.clone()]
    }

    /// Capacity of the backing buffers (entries, data words)
    pub fn capacity(&self) -> (usize, usize) {
        (self.entries.capacity(), self.data.capacity())
    }

    /// Base address of the data words, stable for the storage's lifetime
    pub fn data_ptr(&self) -> *const u32 {
        self.data.as_ptr()
    }
}

#[cfg(test)]
#[path = "specialization_tests.rs"]
mod tests;
