/// Packed bit matrix
pub mod matrix;
/// Sampled module grid with per-module confidence
pub mod module_grid;
/// Decoded segments, modes and structured append
pub mod payload;
/// Luminance image input
pub mod pixel_grid;
/// 2D points
pub mod point;
/// Decoded code, version, EC level and mask types
pub mod qr_code;

pub use matrix::BitMatrix;
pub use module_grid::ModuleGrid;
pub use payload::{DecodedPayload, Mode, Segment, StructuredAppend};
pub use pixel_grid::PixelGrid;
pub use point::Point;
pub use qr_code::{ECLevel, MaskPattern, QRCode, SymbolMetadata, Version};
