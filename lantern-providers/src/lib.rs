//! Concrete [`lantern_vfs::Provider`] and [`lantern_vfs::Transformer`]
//! implementations: a native OS directory, an in-memory store, and a
//! reference archive transformer.

pub mod memory;
pub mod native;
pub mod pak;

pub use memory::MemoryProvider;
pub use native::NativeProvider;
pub use pak::{PakTransformerFactory, is_pak};
