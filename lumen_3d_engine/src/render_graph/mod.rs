/// Render graph module - declarative passes and resources

pub mod resource;
pub mod pass;
pub mod render_graph;

pub use resource::*;
pub use pass::*;
pub use render_graph::*;
