pub mod article;
pub mod dismissed;
pub mod reference;
pub mod shortlist;

pub use article::*;
pub use dismissed::*;
pub use reference::*;
pub use shortlist::*;
