use sqlx::SqlitePool;
use std::sync::Arc;

use crate::comments::{CommentService, DeletePolicy, SqliteCommentStore};
use crate::models::CommentKind;
use crate::repo::{
    invite::InviteRepository, post::PostRepository, project::ProjectRepository,
    resource::ResourceRepository, session::SessionRepository, task::TaskRepository,
    user::UserRepository,
};

#[derive(Clone)]
pub struct AppState {
    pub users: UserRepository,
    pub sessions: SessionRepository,
    pub projects: ProjectRepository,
    pub invites: InviteRepository,
    pub resources: ResourceRepository,
    pub tasks: TaskRepository,
    pub posts: PostRepository,
    pub task_comments: CommentService<SqliteCommentStore>,
    pub post_comments: CommentService<SqliteCommentStore>,
    pub pool: Arc<SqlitePool>,
}

impl AppState {
    pub fn new(pool: SqlitePool) -> Self {
        Self::with_policy(pool, DeletePolicy::default())
    }

    pub fn with_policy(pool: SqlitePool, policy: DeletePolicy) -> Self {
        let pool = Arc::new(pool);
        Self {
            users: UserRepository::new(pool.clone()),
            sessions: SessionRepository::new(pool.clone()),
            projects: ProjectRepository::new(pool.clone()),
            invites: InviteRepository::new(pool.clone()),
            resources: ResourceRepository::new(pool.clone()),
            tasks: TaskRepository::new(pool.clone()),
            posts: PostRepository::new(pool.clone()),
            task_comments: CommentService::new(
                SqliteCommentStore::new(pool.clone(), CommentKind::Task),
                policy,
            ),
            post_comments: CommentService::new(
                SqliteCommentStore::new(pool.clone(), CommentKind::Post),
                policy,
            ),
            pool,
        }
    }
}
