pub mod comment;
pub mod invite;
pub mod post;
pub mod project;
pub mod resource;
pub mod task;
pub mod user;

pub use comment::*;
pub use invite::*;
pub use post::*;
pub use project::*;
pub use resource::*;
pub use task::*;
pub use user::*;
