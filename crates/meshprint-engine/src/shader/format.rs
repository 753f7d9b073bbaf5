use std::sync::LazyLock;

use regex::Regex;

use crate::device::{ContextTarget, ShaderStage};

use super::sources::ShaderSources;
use super::version::GlslVersion;

pub const LIGHTING_PLACEHOLDER: &str = "vec4 blinnPhong(in vec3 pos, in vec3 norm, in vec4 color);";
pub const CLIP_VERTEX_PLACEHOLDER: &str = "void setupClipPlane(in float dist);";
pub const CLIP_FRAGMENT_PLACEHOLDER: &str = "void fragmentClipPlane();";

fn word(pattern: &str) -> Regex {
    Regex::new(pattern).expect("[format] invalid word pattern")
}

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| word(r"\battribute\b"));
static VARYING: LazyLock<Regex> = LazyLock::new(|| word(r"\bvarying\b"));
static GL_FRAG_COLOR: LazyLock<Regex> = LazyLock::new(|| word(r"\bgl_FragColor\b"));

/// Produces compilable source for `stage` in the given dialect.
///
/// Placeholders are resolved first so the snippets go through the same
/// dialect rewrites as the body. The header (`#version N` or the web precision
/// line) is always the first line.
pub fn format_shader(
    source: &str,
    stage: ShaderStage,
    version: GlslVersion,
    target: ContextTarget,
    snippets: &ShaderSources,
) -> String {
    let mut out = source
        .replace(LIGHTING_PLACEHOLDER, &snippets.lighting)
        .replace(CLIP_FRAGMENT_PLACEHOLDER, &snippets.clip_plane_fragment)
        .replace(CLIP_VERTEX_PLACEHOLDER, &snippets.clip_plane_vertex);

    if version >= GlslVersion::IN_OUT {
        match stage {
            ShaderStage::Vertex => {
                out = ATTRIBUTE.replace_all(&out, "in").into_owned();
                out = VARYING.replace_all(&out, "out").into_owned();
            }
            ShaderStage::Fragment => {
                out = VARYING.replace_all(&out, "in").into_owned();
                if version > GlslVersion::IN_OUT {
                    let decl = if version >= GlslVersion::EXPLICIT_LOCATION {
                        "layout(location = 0) out vec4 fragColor;\n"
                    } else {
                        "out vec4 fragColor;\n"
                    };
                    out = format!("{decl}{}", GL_FRAG_COLOR.replace_all(&out, "fragColor"));
                }
            }
        }
        // Also turns `texture2DLod` into `textureLod`.
        out = out.replace("texture2D", "texture");
    }

    format!("{}{out}", version.header(target))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(src: &str, stage: ShaderStage, v: u32) -> String {
        format_shader(src, stage, GlslVersion::new(v), ContextTarget::Desktop, &ShaderSources::default())
    }

    const FRAG: &str = "varying vec4 fColor;\nvoid main() { gl_FragColor = texture2D(t, vec2(0.0)) * fColor; }\n";
    const VERT: &str = "attribute vec3 vertex;\nvarying vec4 fColor;\nvoid main() { gl_Position = vec4(vertex, 1.0); }\n";

    #[test]
    fn placeholders_are_substituted() {
        let src = format!("{LIGHTING_PLACEHOLDER}\n{CLIP_FRAGMENT_PLACEHOLDER}\nvoid main() {{}}\n");
        let out = fmt(&src, ShaderStage::Fragment, 110);
        assert!(!out.contains(LIGHTING_PLACEHOLDER));
        assert!(!out.contains(CLIP_FRAGMENT_PLACEHOLDER));
        assert!(out.contains("uniform PointLight lights[3];"));
        assert!(out.contains("discard;"));

        let out = fmt(CLIP_VERTEX_PLACEHOLDER, ShaderStage::Vertex, 110);
        assert!(out.contains("fClipCoord = useClipPlane ? dist : 0.0;"));
    }

    #[test]
    fn legacy_dialect_is_untouched() {
        let out = fmt(FRAG, ShaderStage::Fragment, 120);
        assert_eq!(out, format!("#version 120\n{FRAG}"));
    }

    #[test]
    fn glsl_130_fragment_keeps_gl_fragcolor() {
        let out = fmt(FRAG, ShaderStage::Fragment, 130);
        assert!(out.starts_with("#version 130\nin vec4 fColor;"));
        assert!(out.contains("gl_FragColor = texture(t"));
        assert!(!out.contains("fragColor;"));
    }

    #[test]
    fn glsl_150_fragment_declares_output() {
        let out = fmt(FRAG, ShaderStage::Fragment, 150);
        assert!(out.starts_with("#version 150\nout vec4 fragColor;\nin vec4 fColor;"));
        assert!(!out.contains("gl_FragColor"));
        assert!(out.contains("fragColor = texture(t"));
    }

    #[test]
    fn glsl_330_fragment_binds_location() {
        let out = fmt(FRAG, ShaderStage::Fragment, 330);
        assert!(out.starts_with("#version 330\nlayout(location = 0) out vec4 fragColor;\n"));
    }

    #[test]
    fn vertex_qualifiers_are_rewritten() {
        let out = fmt(VERT, ShaderStage::Vertex, 330);
        assert!(out.contains("in vec3 vertex;"));
        assert!(out.contains("out vec4 fColor;"));
        assert!(!out.contains("attribute"));
        assert!(!out.contains("varying"));
    }

    #[test]
    fn lod_sampling_is_rewritten() {
        let out = fmt("vec4 c = texture2DLod(t, uv, 0.0);", ShaderStage::Vertex, 410);
        assert!(out.contains("textureLod(t, uv, 0.0)"));
    }

    #[test]
    fn word_patterns_match_whole_words_only() {
        assert!(ATTRIBUTE.is_match("attribute vec3 v;"));
        assert!(!ATTRIBUTE.is_match("attributes"));
        assert!(VARYING.is_match("varying vec4 c;"));
        assert!(!VARYING.is_match("fvarying"));
        assert!(GL_FRAG_COLOR.is_match("gl_FragColor = c;"));
        assert!(!GL_FRAG_COLOR.is_match("gl_FragColorOut"));
    }

    #[test]
    fn identifiers_containing_keywords_survive() {
        let out = fmt("uniform float varyingScale;\n", ShaderStage::Vertex, 330);
        assert!(out.contains("varyingScale"));
    }

    #[test]
    fn web_uses_precision_header_and_no_rewrites() {
        let out = format_shader(
            FRAG,
            ShaderStage::Fragment,
            GlslVersion::WEB,
            ContextTarget::Web,
            &ShaderSources::default(),
        );
        assert_eq!(out, format!("precision mediump float;\n{FRAG}"));
    }

    #[test]
    fn builtin_sources_format_cleanly_for_every_dialect() {
        let s = ShaderSources::default();
        for v in [110, 120, 130, 140, 150, 330, 460] {
            for (src, stage) in [
                (&s.default_vertex, ShaderStage::Vertex),
                (&s.default_fragment, ShaderStage::Fragment),
                (&s.print_vertex, ShaderStage::Vertex),
                (&s.print_fragment, ShaderStage::Fragment),
            ] {
                let out = fmt(src, stage, v);
                assert!(!out.contains(LIGHTING_PLACEHOLDER));
                assert!(!out.contains(CLIP_VERTEX_PLACEHOLDER));
                assert!(!out.contains(CLIP_FRAGMENT_PLACEHOLDER));
                if v >= 130 {
                    assert!(!out.contains("texture2D"), "{v} {stage}");
                    assert!(!out.contains("varying"), "{v} {stage}");
                }
            }
        }
    }
}
