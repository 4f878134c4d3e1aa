pub mod invite;
pub mod post;
pub mod project;
pub mod resource;
pub mod session;
pub mod task;
pub mod user;

pub use invite::InviteRepository;
pub use post::PostRepository;
pub use project::ProjectRepository;
pub use resource::ResourceRepository;
pub use task::TaskRepository;
