//! Media classification and embedding: MIME → category/extension mapping,
//! filename normalization, and data-URI construction for inline images.

pub mod embed;
pub mod kind;

pub use {
    embed::{ImageMimePolicy, embed_image, to_data_uri},
    kind::{MediaKind, clean_content_type, ensure_filename, extension_for},
};
