use crate::surface::PixelFormat;
use thiserror::Error;

/// Errors from palette mutation.
///
/// Geometry problems elsewhere in the crate are resolved by clamping, but a
/// bad palette index is a real caller mistake and is reported rather than
/// silently ignored.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaletteError {
    #[error("palette index {index} out of range ({len} colors)")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Errors from surface construction and cross-surface operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SurfaceError {
    #[error("pixel format mismatch: source is {src:?}, destination is {dst:?}")]
    FormatMismatch { src: PixelFormat, dst: PixelFormat },
    #[error("buffer length {len} does not match a {width}x{height} {format:?} surface")]
    BufferSize {
        width: u32,
        height: u32,
        format: PixelFormat,
        len: usize,
    },
}

/// Errors from document-level layer management.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DrawingError {
    #[error("layer index {index} out of range ({len} layers)")]
    LayerIndexOutOfRange { index: usize, len: usize },
    #[error("a drawing must keep at least one layer")]
    LastLayer,
    #[error("drawing already uses direct color")]
    AlreadyDirectColor,
}

/// Errors from tool registration.  A malformed tool set is a programming
/// error caught when the registry is built, never mid-stroke.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    #[error("duplicate tool name '{0}'")]
    DuplicateName(String),
    #[error("duplicate tool key '{0}'")]
    DuplicateKey(char),
    #[error("unknown tool '{0}'")]
    UnknownTool(String),
}
