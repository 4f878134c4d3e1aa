pub mod auth;
pub mod comments;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repo;
pub mod state;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;

use config::Config;
use state::AppState;

pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Auth routes
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/auth/me", get(handlers::auth::me))
        // Project routes
        .route("/projects", post(handlers::projects::create_project))
        .route("/projects", get(handlers::projects::list_projects))
        .route("/projects/{project_id}", get(handlers::projects::get_project))
        .route(
            "/projects/{project_id}",
            delete(handlers::projects::delete_project),
        )
        .route(
            "/projects/{project_id}/archive",
            put(handlers::projects::set_archived),
        )
        .route(
            "/projects/{project_id}/members/{user_id}",
            delete(handlers::projects::remove_member),
        )
        // Invite routes
        .route(
            "/projects/{project_id}/invites",
            post(handlers::invites::create_invite),
        )
        .route(
            "/projects/{project_id}/invites",
            get(handlers::invites::list_project_invites),
        )
        .route("/invites", get(handlers::invites::list_my_invites))
        .route(
            "/invites/{invite_id}/accept",
            post(handlers::invites::accept_invite),
        )
        .route(
            "/invites/{invite_id}",
            delete(handlers::invites::delete_invite),
        )
        // User directory
        .route("/users", get(handlers::users::list_users))
        // Resource routes
        .route(
            "/projects/{project_id}/resources",
            post(handlers::resources::create_resource),
        )
        .route(
            "/projects/{project_id}/resources",
            get(handlers::resources::list_resources),
        )
        .route(
            "/resources/{resource_id}",
            put(handlers::resources::update_resource),
        )
        .route(
            "/resources/{resource_id}",
            delete(handlers::resources::delete_resource),
        )
        // Task routes
        .route("/tasks", get(handlers::tasks::list_my_tasks))
        .route(
            "/projects/{project_id}/tasks",
            post(handlers::tasks::create_task),
        )
        .route(
            "/projects/{project_id}/tasks",
            get(handlers::tasks::list_tasks),
        )
        .route("/tasks/{task_id}", get(handlers::tasks::get_task))
        .route("/tasks/{task_id}", put(handlers::tasks::update_task))
        .route("/tasks/{task_id}", delete(handlers::tasks::delete_task))
        // Post routes
        .route(
            "/projects/{project_id}/posts",
            post(handlers::posts::create_post),
        )
        .route(
            "/projects/{project_id}/posts",
            get(handlers::posts::list_posts),
        )
        .route("/posts/{post_id}", get(handlers::posts::get_post))
        .route("/posts/{post_id}", delete(handlers::posts::delete_post))
        // Comment routes
        .route(
            "/tasks/{task_id}/comments",
            post(handlers::comments::create_task_comment),
        )
        .route(
            "/tasks/{task_id}/comments",
            get(handlers::comments::list_task_comments),
        )
        .route(
            "/tasks/{task_id}/comments/{comment_id}",
            delete(handlers::comments::delete_task_comment),
        )
        .route(
            "/posts/{post_id}/comments",
            post(handlers::comments::create_post_comment),
        )
        .route(
            "/posts/{post_id}/comments",
            get(handlers::comments::list_post_comments),
        )
        .route(
            "/posts/{post_id}/comments/tree",
            get(handlers::comments::post_comment_thread),
        )
        .route(
            "/posts/comments/{comment_id}",
            delete(handlers::comments::delete_post_comment),
        );

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Open the pool and bring the schema up to date.
pub async fn connect(config: &Config) -> anyhow::Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

pub mod test_utils {
    use crate::auth::{generate_token, hash_password};
    use crate::comments::DeletePolicy;
    use crate::state::AppState;
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::SqlitePool;
    use uuid::Uuid;

    pub async fn create_test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create test pool");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        pool
    }

    pub async fn create_test_state() -> AppState {
        let pool = create_test_pool().await;
        AppState::new(pool)
    }

    pub async fn create_test_state_with_policy(policy: DeletePolicy) -> AppState {
        let pool = create_test_pool().await;
        AppState::with_policy(pool, policy)
    }

    pub async fn create_test_user(state: &AppState, email: &str, name: &str) -> Uuid {
        let password_hash = hash_password("testpassword123").unwrap();
        state
            .users
            .create(email, &password_hash, name)
            .await
            .unwrap()
            .id
    }

    pub async fn create_test_session(state: &AppState, user_id: Uuid) -> String {
        let token = generate_token();
        state.sessions.create(user_id, &token).await.unwrap();
        token
    }
}
