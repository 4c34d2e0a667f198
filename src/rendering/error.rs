use std::{fmt, path::PathBuf};

use itertools::Itertools;
use thiserror::Error;

/// Status reported by the graphics backend when an operation fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    OutOfMemory,
    Validation,
    Internal,
    /// The call was made with pipeline state that cannot be drawn.
    InvalidCall,
    SurfaceLost,
    SurfaceOutdated,
    SurfaceTimeout,
    Other,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCode::OutOfMemory => "OUT_OF_MEMORY",
            ErrorCode::Validation => "VALIDATION",
            ErrorCode::Internal => "INTERNAL",
            ErrorCode::InvalidCall => "INVALID_CALL",
            ErrorCode::SurfaceLost => "SURFACE_LOST",
            ErrorCode::SurfaceOutdated => "SURFACE_OUTDATED",
            ErrorCode::SurfaceTimeout => "SURFACE_TIMEOUT",
            ErrorCode::Other => "OTHER",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum GraphicsError {
    #[error("Graphics error\n[Error Code] {code}\n[Description] {description}{}", format_info(.info))]
    Resource {
        code: ErrorCode,
        description: String,
        info: Vec<String>,
    },
    #[error("Graphics error [Device Removed]\n[Reason] {reason}")]
    DeviceRemoved { reason: String },
    #[error("Failed to read shader {}", .path.display())]
    ShaderLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Static binds for {shape} were built without an index buffer")]
    MissingIndexBuffer { shape: &'static str },
}

impl GraphicsError {
    pub fn resource(code: ErrorCode, description: impl Into<String>) -> Self {
        GraphicsError::Resource {
            code,
            description: description.into(),
            info: Vec::new(),
        }
    }

    pub fn with_info(mut self, messages: impl IntoIterator<Item = String>) -> Self {
        if let GraphicsError::Resource { info, .. } = &mut self {
            info.extend(messages);
        }
        self
    }

    /// Backend status of the failure, if it came from the backend at all.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            GraphicsError::Resource { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn is_device_removed(&self) -> bool {
        matches!(self, GraphicsError::DeviceRemoved { .. })
    }
}

fn format_info(info: &[String]) -> String {
    if info.is_empty() {
        String::new()
    } else {
        format!("\n\n[Error Info]\n{}", info.iter().join("\n"))
    }
}

impl From<wgpu::Error> for GraphicsError {
    fn from(error: wgpu::Error) -> Self {
        let code = match &error {
            wgpu::Error::OutOfMemory { .. } => ErrorCode::OutOfMemory,
            wgpu::Error::Validation { .. } => ErrorCode::Validation,
            wgpu::Error::Internal { .. } => ErrorCode::Internal,
            #[allow(unreachable_patterns)]
            _ => ErrorCode::Other,
        };
        GraphicsError::resource(code, error.to_string())
    }
}

impl From<wgpu::SurfaceError> for GraphicsError {
    fn from(error: wgpu::SurfaceError) -> Self {
        let code = match error {
            wgpu::SurfaceError::Lost => ErrorCode::SurfaceLost,
            wgpu::SurfaceError::Outdated => ErrorCode::SurfaceOutdated,
            wgpu::SurfaceError::Timeout => ErrorCode::SurfaceTimeout,
            wgpu::SurfaceError::OutOfMemory => ErrorCode::OutOfMemory,
            #[allow(unreachable_patterns)]
            _ => ErrorCode::Other,
        };
        GraphicsError::resource(code, error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_error_lists_info_messages() {
        let error = GraphicsError::resource(ErrorCode::Validation, "Buffer creation failed")
            .with_info(["first".to_string(), "second".to_string()]);

        let text = error.to_string();
        assert!(text.contains("[Error Code] VALIDATION"));
        assert!(text.contains("[Description] Buffer creation failed"));
        assert!(text.ends_with("[Error Info]\nfirst\nsecond"));
        assert_eq!(error.code(), Some(ErrorCode::Validation));
    }

    #[test]
    fn info_block_is_omitted_when_empty() {
        let error = GraphicsError::resource(ErrorCode::OutOfMemory, "no memory");
        assert!(!error.to_string().contains("[Error Info]"));
    }

    #[test]
    fn device_removed_is_distinguished() {
        let error = GraphicsError::DeviceRemoved {
            reason: "driver reset".into(),
        };
        assert!(error.is_device_removed());
        assert_eq!(error.code(), None);
    }
}
