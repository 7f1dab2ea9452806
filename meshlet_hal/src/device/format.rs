/// Attachment formats and their metadata

/// Pixel formats usable as render-target or depth/stencil attachments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[allow(non_camel_case_types)]
pub enum Format {
    /// No format (e.g. no depth attachment)
    #[default]
    UNKNOWN,
    R8G8B8A8_UNORM,
    R8G8B8A8_SRGB,
    B8G8R8A8_UNORM,
    B8G8R8A8_SRGB,
    R16G16B16A16_SFLOAT,
    R32G32B32A32_SFLOAT,
    R10G10B10A2_UNORM,
    D16_UNORM,
    D24_UNORM_S8_UINT,
    D32_SFLOAT,
    D32_SFLOAT_S8_UINT,
}

/// Static properties of a [`Format`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatInfo {
    pub format: Format,
    pub name: &'static str,
    pub bytes_per_pixel: u32,
    pub has_depth: bool,
    pub has_stencil: bool,
}

const fn color(format: Format, name: &'static str, bytes_per_pixel: u32) -> FormatInfo {
    FormatInfo { format, name, bytes_per_pixel, has_depth: false, has_stencil: false }
}

const fn depth(format: Format, name: &'static str, bytes_per_pixel: u32, has_stencil: bool) -> FormatInfo {
    FormatInfo { format, name, bytes_per_pixel, has_depth: true, has_stencil }
}

impl Format {
    /// Metadata for this format
    pub const fn info(self) -> FormatInfo {
        match self {
            Format::UNKNOWN => color(Format::UNKNOWN, "UNKNOWN", 0),
            Format::R8G8B8A8_UNORM => color(Format::R8G8B8A8_UNORM, "R8G8B8A8_UNORM", 4),
            Format::R8G8B8A8_SRGB => color(Format::R8G8B8A8_SRGB, "R8G8B8A8_SRGB", 4),
            Format::B8G8R8A8_UNORM => color(Format::B8G8R8A8_UNORM, "B8G8R8A8_UNORM", 4),
            Format::B8G8R8A8_SRGB => color(Format::B8G8R8A8_SRGB, "B8G8R8A8_SRGB", 4),
            Format::R16G16B16A16_SFLOAT => color(Format::R16G16B16A16_SFLOAT, "R16G16B16A16_SFLOAT", 8),
            Format::R32G32B32A32_SFLOAT => color(Format::R32G32B32A32_SFLOAT, "R32G32B32A32_SFLOAT", 16),
            Format::R10G10B10A2_UNORM => color(Format::R10G10B10A2_UNORM, "R10G10B10A2_UNORM", 4),
            Format::D16_UNORM => depth(Format::D16_UNORM, "D16_UNORM", 2, false),
            Format::D24_UNORM_S8_UINT => depth(Format::D24_UNORM_S8_UINT, "D24_UNORM_S8_UINT", 4, true),
            Format::D32_SFLOAT => depth(Format::D32_SFLOAT, "D32_SFLOAT", 4, false),
            Format::D32_SFLOAT_S8_UINT => depth(Format::D32_SFLOAT_S8_UINT, "D32_SFLOAT_S8_UINT", 8, true),
        }
    }

    pub const fn has_depth_component(self) -> bool {
        self.info().has_depth
    }

    pub const fn has_stencil_component(self) -> bool {
        self.info().has_stencil
    }

    pub const fn is_depth_stencil(self) -> bool {
        let info = self.info();
        info.has_depth || info.has_stencil
    }
}

#[cfg(test)]
#[path = "format_tests.rs"]
mod tests;
