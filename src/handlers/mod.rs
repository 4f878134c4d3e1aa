pub mod auth;
pub mod comments;
pub mod invites;
pub mod posts;
pub mod projects;
pub mod resources;
pub mod tasks;
pub mod users;
