pub mod comment;
pub mod like;
pub mod post;

pub use comment::*;
pub use like::*;
pub use post::*;
