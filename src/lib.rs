pub mod apply;
pub mod descriptor;
pub mod encoding;
pub mod extract;
pub mod provider;
pub mod scan;
pub mod translation_set;
pub mod utils;
pub mod workspace;

// 重新导出主要结构
pub use apply::apply;
pub use descriptor::{descriptor_for, FormatDescriptor, TextLocator, SUPPORTED_FILES};
pub use encoding::SourceEncoding;
pub use extract::extract;
pub use provider::{GoogleProvider, TranslationProvider};
pub use translation_set::{Anchor, ExtractedEntry, TranslationSet};
pub use utils::GameTextError;
pub use workspace::Workspace;
