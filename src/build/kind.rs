//! Shader kind classification.
//!
//! Shader sources carry their pipeline stage in a dual-part suffix such as
//! `.vert.glsl` or `.rchit.glsl`. Plain `.glsl` files are include-only
//! fragments and are never classified.

use std::path::Path;

/// Extension appended to compiled outputs.
pub const OUTPUT_EXTENSION: &str = "spv";

/// Generic extension shared by every shader suffix.
const SOURCE_EXTENSION: &str = ".glsl";

/// Pipeline stage of a shader source, derived from its file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShaderKind {
    Compute,
    Fragment,
    Geometry,
    Mesh,
    RayAnyHit,
    RayCallable,
    RayClosestHit,
    RayGeneration,
    RayIntersection,
    RayMiss,
    Task,
    TessellationControl,
    TessellationEvaluation,
    Vertex,
}

impl ShaderKind {
    /// Every kind in classification order.
    pub const ALL: [ShaderKind; 14] = [
        ShaderKind::Compute,
        ShaderKind::Fragment,
        ShaderKind::Geometry,
        ShaderKind::Mesh,
        ShaderKind::RayAnyHit,
        ShaderKind::RayCallable,
        ShaderKind::RayClosestHit,
        ShaderKind::RayGeneration,
        ShaderKind::RayIntersection,
        ShaderKind::RayMiss,
        ShaderKind::Task,
        ShaderKind::TessellationControl,
        ShaderKind::TessellationEvaluation,
        ShaderKind::Vertex,
    ];

    /// The file name suffix that identifies this kind.
    pub fn suffix(self) -> &'static str {
        match self {
            ShaderKind::Compute => ".comp.glsl",
            ShaderKind::Fragment => ".frag.glsl",
            ShaderKind::Geometry => ".geom.glsl",
            ShaderKind::Mesh => ".mesh.glsl",
            ShaderKind::RayAnyHit => ".rahit.glsl",
            ShaderKind::RayCallable => ".rcall.glsl",
            ShaderKind::RayClosestHit => ".rchit.glsl",
            ShaderKind::RayGeneration => ".rgen.glsl",
            ShaderKind::RayIntersection => ".rint.glsl",
            ShaderKind::RayMiss => ".rmiss.glsl",
            ShaderKind::Task => ".task.glsl",
            ShaderKind::TessellationControl => ".tesc.glsl",
            ShaderKind::TessellationEvaluation => ".tese.glsl",
            ShaderKind::Vertex => ".vert.glsl",
        }
    }

    /// Human-readable stage name.
    pub fn stage(self) -> &'static str {
        match self {
            ShaderKind::Compute => "compute",
            ShaderKind::Fragment => "fragment",
            ShaderKind::Geometry => "geometry",
            ShaderKind::Mesh => "mesh",
            ShaderKind::RayAnyHit => "ray any hit",
            ShaderKind::RayCallable => "ray callable",
            ShaderKind::RayClosestHit => "ray closest hit",
            ShaderKind::RayGeneration => "ray generation",
            ShaderKind::RayIntersection => "ray intersection",
            ShaderKind::RayMiss => "ray miss",
            ShaderKind::Task => "task",
            ShaderKind::TessellationControl => "tessellation control",
            ShaderKind::TessellationEvaluation => "tessellation evaluation",
            ShaderKind::Vertex => "vertex",
        }
    }

    /// Classify a file name.
    ///
    /// Returns `None` when the name matches no known suffix, which callers
    /// treat as "not a shader" rather than as an error.
    pub fn classify(file_name: &str) -> Option<ShaderKind> {
        ShaderKind::ALL.into_iter().find(|kind| {
            // A bare suffix ("`.vert.glsl`") has no stem and is not a shader
            file_name.len() > kind.suffix().len() && file_name.ends_with(kind.suffix())
        })
    }

    /// Classify a path by its final component.
    pub fn classify_path(path: &Path) -> Option<ShaderKind> {
        path.file_name().and_then(|n| n.to_str()).and_then(ShaderKind::classify)
    }

    /// Output file name for a source of this kind.
    ///
    /// Strips the generic `.glsl` extension and appends `.spv`, keeping the
    /// stage marker: `lit.frag.glsl` becomes `lit.frag.spv`.
    pub fn output_file_name(self, file_name: &str) -> String {
        let base = file_name.strip_suffix(SOURCE_EXTENSION).unwrap_or(file_name);
        format!("{}.{}", base, OUTPUT_EXTENSION)
    }
}

impl std::fmt::Display for ShaderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.stage())
    }
}
