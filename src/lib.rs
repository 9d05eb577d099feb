//! Wiki Markdown rendering: wikilinks, attachment links, and media embeds
//! resolved against a page store, then finalized to HTML.
//!
//! The entry point is [`render::Renderer`]. It is wired from four seams:
//! a [`store::PageStore`] for batched page lookup, a
//! [`store::AttachmentSource`] for attachment bytes, a
//! [`cache::GalleryCache`] for archive listings, and a
//! [`config::RenderConfig`] for extension sets and routes. The
//! [`pages`] module loads all of these from a plain directory of `.md`
//! files for CLI use.

pub mod archive;
pub mod cache;
pub mod config;
pub mod escape;
pub mod menu;
pub mod model;
pub mod notify;
pub mod pages;
pub mod render;
pub mod resolve;
pub mod scan;
pub mod slug;
pub mod store;

pub use cache::{GalleryCache, MemoryCache};
pub use config::{RenderConfig, Routes};
pub use model::{Attachment, Page, PageRef};
pub use render::Renderer;
pub use store::{AttachmentSource, MemoryFiles, MemoryStore, PageStore};
