pub mod dequant;
pub mod format;
pub mod metadata;
pub mod reader;

pub use format::{GgufHeader, GgufTensorInfo, GGUF_DEFAULT_ALIGNMENT, GGUF_MAGIC};
pub use metadata::{GgufMetadata, GgufMetadataValue};
pub use reader::GgufFile;
