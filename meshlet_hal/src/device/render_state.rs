/// Fixed-function render state for meshlet pipelines

/// Maximum number of simultaneously bound color targets
pub const MAX_RENDER_TARGETS: usize = 8;

/// Primitive topology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrimitiveTopology {
    PointList,
    LineList,
    LineStrip,
    #[default]
    TriangleList,
    TriangleStrip,
    TriangleFan,
    TriangleListWithAdjacency,
    TriangleStripWithAdjacency,
    PatchList,
}

// ===== RASTERIZATION ENUMS =====

/// Face culling mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CullMode {
    /// No culling
    None,
    /// Cull front faces
    Front,
    /// Cull back faces
    Back,
}

/// Front face winding order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontFace {
    /// Counter-clockwise vertices define front face
    CounterClockwise,
    /// Clockwise vertices define front face
    Clockwise,
}

/// Polygon fill mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolygonMode {
    /// Fill polygons
    Fill,
    /// Draw edges only (wireframe)
    Line,
    /// Draw vertices only
    Point,
}

// ===== DEPTH/STENCIL ENUMS =====

/// Comparison operator for depth and stencil tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Never,
    Less,
    Equal,
    LessOrEqual,
    Greater,
    NotEqual,
    GreaterOrEqual,
    Always,
}

/// Stencil operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StencilOp {
    Keep,
    Zero,
    Replace,
    IncrementAndClamp,
    DecrementAndClamp,
    Invert,
    IncrementAndWrap,
    DecrementAndWrap,
}

// ===== COLOR BLEND ENUMS =====

/// Blend factor for color blending equations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    DstColor,
    OneMinusDstColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
    ConstantColor,
    OneMinusConstantColor,
    SrcAlphaSaturate,
}

impl BlendFactor {
    /// True for factors that read the dynamic blend constant color
    pub fn is_constant(self) -> bool {
        matches!(self, BlendFactor::ConstantColor | BlendFactor::OneMinusConstantColor)
    }
}

/// Blend operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendOp {
    /// result = src * srcFactor + dst * dstFactor
    Add,
    /// result = src * srcFactor - dst * dstFactor
    Subtract,
    /// result = dst * dstFactor - src * srcFactor
    ReverseSubtract,
    /// result = min(src, dst)
    Min,
    /// result = max(src, dst)
    Max,
}

// ===== RASTERIZATION STATE =====

/// Depth bias parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthBias {
    /// Constant depth offset
    pub constant_factor: f32,
    /// Slope-based depth offset
    pub slope_factor: f32,
    /// Maximum depth bias clamp
    pub clamp: f32,
}

/// Rasterization fixed-function state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterState {
    pub polygon_mode: PolygonMode,
    pub cull_mode: CullMode,
    pub front_face: FrontFace,
    /// Depth bias (None = disabled)
    pub depth_bias: Option<DepthBias>,
    /// Clamp fragment depth to the viewport depth range instead of clipping
    pub depth_clamp_enable: bool,
    /// Discard all primitives before rasterization
    pub rasterizer_discard_enable: bool,
}

impl Default for RasterState {
    fn default() -> Self {
        Self {
            polygon_mode: PolygonMode::Fill,
            cull_mode: CullMode::Back,
            front_face: FrontFace::CounterClockwise,
            depth_bias: None,
            depth_clamp_enable: false,
            rasterizer_discard_enable: false,
        }
    }
}

// ===== DEPTH/STENCIL STATE =====

/// Stencil operation state (per-face)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StencilOpState {
    /// Action on stencil test fail
    pub fail_op: StencilOp,
    /// Action on stencil pass + depth pass
    pub pass_op: StencilOp,
    /// Action on stencil pass + depth fail
    pub depth_fail_op: StencilOp,
    pub compare_op: CompareOp,
}

impl Default for StencilOpState {
    fn default() -> Self {
        Self {
            fail_op: StencilOp::Keep,
            pass_op: StencilOp::Keep,
            depth_fail_op: StencilOp::Keep,
            compare_op: CompareOp::Always,
        }
    }
}

/// Depth and stencil testing state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthStencilState {
    pub depth_test_enable: bool,
    pub depth_write_enable: bool,
    pub depth_compare_op: CompareOp,
    pub stencil_test_enable: bool,
    /// Bits of the stencil buffer read for compare
    pub stencil_read_mask: u8,
    /// Bits of the stencil buffer written
    pub stencil_write_mask: u8,
    /// Reference value baked into the pipeline (ignored when `dynamic_stencil_ref`)
    pub stencil_ref_value: u8,
    /// Take the stencil reference from the recorder state at draw time
    pub dynamic_stencil_ref: bool,
    pub front_face_stencil: StencilOpState,
    pub back_face_stencil: StencilOpState,
}

impl Default for DepthStencilState {
    fn default() -> Self {
        Self {
            depth_test_enable: true,
            depth_write_enable: true,
            depth_compare_op: CompareOp::Less,
            stencil_test_enable: false,
            stencil_read_mask: 0xFF,
            stencil_write_mask: 0xFF,
            stencil_ref_value: 0,
            dynamic_stencil_ref: false,
            front_face_stencil: StencilOpState::default(),
            back_face_stencil: StencilOpState::default(),
        }
    }
}

// ===== COLOR BLEND STATE =====

/// Color write mask
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorWriteMask {
    pub r: bool,
    pub g: bool,
    pub b: bool,
    pub a: bool,
}

impl ColorWriteMask {
    /// All channels enabled
    pub const ALL: Self = Self { r: true, g: true, b: true, a: true };
    /// No channels enabled
    pub const NONE: Self = Self { r: false, g: false, b: false, a: false };
}

impl Default for ColorWriteMask {
    fn default() -> Self {
        Self::ALL
    }
}

/// Blend state of a single color target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetBlendState {
    pub blend_enable: bool,
    pub src_color_factor: BlendFactor,
    pub dst_color_factor: BlendFactor,
    pub color_blend_op: BlendOp,
    pub src_alpha_factor: BlendFactor,
    pub dst_alpha_factor: BlendFactor,
    pub alpha_blend_op: BlendOp,
    pub color_write_mask: ColorWriteMask,
}

impl TargetBlendState {
    /// True if this target's blend equation reads the blend constant color
    pub fn uses_constant_color(&self) -> bool {
        self.blend_enable
            && (self.src_color_factor.is_constant()
                || self.dst_color_factor.is_constant()
                || self.src_alpha_factor.is_constant()
                || self.dst_alpha_factor.is_constant())
    }
}

impl Default for TargetBlendState {
    fn default() -> Self {
        Self {
            blend_enable: false,
            src_color_factor: BlendFactor::One,
            dst_color_factor: BlendFactor::Zero,
            color_blend_op: BlendOp::Add,
            src_alpha_factor: BlendFactor::One,
            dst_alpha_factor: BlendFactor::Zero,
            alpha_blend_op: BlendOp::Add,
            color_write_mask: ColorWriteMask::ALL,
        }
    }
}

/// Blend state for all color targets
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BlendState {
    pub targets: [TargetBlendState; MAX_RENDER_TARGETS],
    pub alpha_to_coverage_enable: bool,
}

impl BlendState {
    /// True if any of the first `num_targets` targets reads the blend constant color
    pub fn uses_constant_color(&self, num_targets: usize) -> bool {
        self.targets
            .iter()
            .take(num_targets)
            .any(TargetBlendState::uses_constant_color)
    }
}

/// All fixed-function state blocks of a pipeline
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RenderState {
    pub raster: RasterState,
    pub depth_stencil: DepthStencilState,
    pub blend: BlendState,
}

#[cfg(test)]
#[path = "render_state_tests.rs"]
mod tests;
