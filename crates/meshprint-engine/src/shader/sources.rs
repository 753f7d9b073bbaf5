/// Shader text the program builder stitches together.
///
/// The sources are opaque to the engine apart from three placeholder
/// declarations, each replaced verbatim by a snippet:
///
/// - `vec4 blinnPhong(in vec3 pos, in vec3 norm, in vec4 color);` → [`lighting`](Self::lighting)
/// - `void setupClipPlane(in float dist);` → [`clip_plane_vertex`](Self::clip_plane_vertex)
/// - `void fragmentClipPlane();` → [`clip_plane_fragment`](Self::clip_plane_fragment)
///
/// Sources are written in the GLSL 1.10 dialect (`attribute`, `varying`,
/// `gl_FragColor`, `texture2D`) and rewritten for newer dialects.
#[derive(Debug, Clone)]
pub struct ShaderSources {
    pub default_vertex: String,
    pub default_fragment: String,
    /// Vertex stage of the capture program. Must write `gl_Position`, `fColor`
    /// and `fClipCoord`.
    pub print_vertex: String,
    pub print_fragment: String,
    pub clip_plane_vertex: String,
    pub clip_plane_fragment: String,
    pub lighting: String,
}

impl Default for ShaderSources {
    fn default() -> Self {
        Self {
            default_vertex: include_str!("glsl/default.vert").to_owned(),
            default_fragment: include_str!("glsl/default.frag").to_owned(),
            print_vertex: include_str!("glsl/printing.vert").to_owned(),
            print_fragment: include_str!("glsl/printing.frag").to_owned(),
            clip_plane_vertex: include_str!("glsl/clip_plane.vert").to_owned(),
            clip_plane_fragment: include_str!("glsl/clip_plane.frag").to_owned(),
            lighting: include_str!("glsl/lighting.glsl").to_owned(),
        }
    }
}
