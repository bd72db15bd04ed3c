use std::fmt;
use std::path::{Path, PathBuf};

/// Shader pipeline stage.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    fn entry_point(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vs_main",
            ShaderStage::Fragment => "fs_main",
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => write!(f, "vertex"),
            ShaderStage::Fragment => write!(f, "fragment"),
        }
    }
}

/// Failure to turn a pair of WGSL stage files into usable modules.
///
/// Carries the stage, the offending path, and either the I/O cause or the
/// full validation log reported by the compiler.
#[derive(Debug, thiserror::Error)]
pub enum ShaderError {
    #[error("failed to read {stage} shader source {path}")]
    Io {
        stage: ShaderStage,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{stage} shader {path} failed to validate:\n{log}")]
    Compile {
        stage: ShaderStage,
        path: PathBuf,
        log: String,
    },
}

/// A validated pair of shader modules.
///
/// Entry points are fixed by convention: `vs_main` in the vertex file,
/// `fs_main` in the fragment file.
pub struct ShaderProgram {
    pub(crate) vertex: wgpu::ShaderModule,
    pub(crate) fragment: wgpu::ShaderModule,
}

impl ShaderProgram {
    /// Reads and validates both stage files on the given device.
    ///
    /// Nothing is retained on failure, so a surface whose program load fails
    /// keeps whatever program it had before.
    pub fn load(
        device: &wgpu::Device,
        vs_path: &Path,
        fs_path: &Path,
    ) -> Result<Self, ShaderError> {
        let vertex = load_stage(device, ShaderStage::Vertex, vs_path)?;
        let fragment = load_stage(device, ShaderStage::Fragment, fs_path)?;
        Ok(Self { vertex, fragment })
    }

    pub(crate) fn vertex_entry(&self) -> &'static str {
        ShaderStage::Vertex.entry_point()
    }

    pub(crate) fn fragment_entry(&self) -> &'static str {
        ShaderStage::Fragment.entry_point()
    }
}

fn load_stage(
    device: &wgpu::Device,
    stage: ShaderStage,
    path: &Path,
) -> Result<wgpu::ShaderModule, ShaderError> {
    let source = std::fs::read_to_string(path).map_err(|source| ShaderError::Io {
        stage,
        path: path.to_path_buf(),
        source,
    })?;

    // Validation errors are surfaced through an error scope rather than a
    // device-loss callback, which yields the full compiler log.
    let error_scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: path.to_str(),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    if let Some(err) = pollster::block_on(error_scope.pop()) {
        return Err(ShaderError::Compile {
            stage,
            path: path.to_path_buf(),
            log: err.to_string(),
        });
    }

    Ok(module)
}
