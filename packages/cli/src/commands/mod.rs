pub mod citations;
pub mod init;
pub mod render;

pub use citations::{citations, CitationsArgs};
pub use init::{init, InitArgs};
pub use render::{render, RenderArgs};
