use std::path::PathBuf;

use ash::vk;
use thiserror::Error;

/// Fatal renderer failures. Everything here terminates the program; the one
/// recoverable steady-state condition (surface out of date) is reported as a
/// [`FrameOutcome`](crate::FrameOutcome), not an error.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("instance or device setup failed during {op}: {source}")]
    Initialization {
        op: &'static str,
        source: vk::Result,
    },

    #[error("no Vulkan physical devices are available")]
    NoDevice,

    #[error("selected physical device exposes no graphics-capable queue family")]
    NoGraphicsQueue,

    #[error("swapchain setup failed during {op}: {source}")]
    Swapchain {
        op: &'static str,
        source: vk::Result,
    },

    #[error(transparent)]
    ShaderLoad(#[from] ShaderLoadError),

    #[error("graphics pipeline creation failed: {source}")]
    PipelineCreation { source: vk::Result },

    #[error("frame submission failed during {op}: {source}")]
    Frame {
        op: &'static str,
        source: vk::Result,
    },
}

/// Why a shader blob could not be turned into a shader module. Carries the
/// path so a missing `shaders/v.spv` is diagnosable from the error alone.
#[derive(Debug, Error)]
pub enum ShaderLoadError {
    #[error("could not read shader bytecode from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} does not contain valid SPIR-V: {source}")]
    InvalidSpirv {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("shader module rejected bytecode from {path}: {source}")]
    Module { path: PathBuf, source: vk::Result },
}

impl RenderError {
    pub(crate) fn init(op: &'static str) -> impl FnOnce(vk::Result) -> Self {
        move |source| Self::Initialization { op, source }
    }

    pub(crate) fn swapchain(op: &'static str) -> impl FnOnce(vk::Result) -> Self {
        move |source| Self::Swapchain { op, source }
    }

    pub(crate) fn frame(op: &'static str) -> impl FnOnce(vk::Result) -> Self {
        move |source| Self::Frame { op, source }
    }
}
