// Resume storage: editor content model, validation, append-only versions,
// Markdown export snapshots in S3, and public share links.

pub mod content;
pub mod export;
pub mod handlers;
pub mod render;
pub mod share;
pub mod versioning;
