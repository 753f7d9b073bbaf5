use crate::device::ShaderStage;

/// Failure to pick a shader dialect from the context's version string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionError {
    #[error("unparseable GL version string {0:?}")]
    Unparseable(String),
    #[error("unsupported OpenGL version {major}.{minor}")]
    Unsupported { major: u32, minor: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShaderError {
    #[error(transparent)]
    Version(#[from] VersionError),
    #[error("failed to compile {stage} shader:\n{log}")]
    Compile { stage: ShaderStage, log: String },
    #[error("failed to link the {program} program:\n{log}")]
    Link { program: &'static str, log: String },
    #[error("the context could not allocate a {0} object")]
    Allocation(&'static str),
}
