use uuid::Uuid;

use crate::comments::guard::{Actor, DeletePolicy};
use crate::comments::store::CommentStore;
use crate::error::{AppError, Result};
use crate::models::{Comment, CommentKind, CommentWithAuthor, CreateComment, NewComment};

/// Create, list and delete operations over one comment store.
///
/// Container existence and membership are checked by the caller; this layer
/// owns content validation, parent linkage and the delete rules.
#[derive(Clone)]
pub struct CommentService<S> {
    store: S,
    policy: DeletePolicy,
}

impl<S: CommentStore> CommentService<S> {
    pub fn new(store: S, policy: DeletePolicy) -> Self {
        Self { store, policy }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn kind(&self) -> CommentKind {
        self.store.kind()
    }

    pub fn policy(&self) -> DeletePolicy {
        self.policy
    }

    /// Add a comment, or a reply when `parent_comment_id` is set.
    pub async fn create(
        &self,
        actor: &Actor,
        container_id: Uuid,
        input: CreateComment,
    ) -> Result<Comment> {
        if input.content.trim().is_empty() {
            return Err(AppError::Validation("Comment content is required".to_string()));
        }

        if let Some(parent_id) = input.parent_comment_id {
            if !self.kind().allows_replies() {
                return Err(AppError::Validation(format!(
                    "Replies are not supported on {} comments",
                    self.kind()
                )));
            }

            let parent = self
                .store
                .find_by_id(parent_id)
                .await?
                .ok_or_else(|| AppError::Validation("Parent comment does not exist".to_string()))?;

            if parent.container_id != container_id {
                return Err(AppError::Validation(
                    "Parent comment belongs to a different container".to_string(),
                ));
            }
        }

        let comment = self
            .store
            .create(NewComment {
                container_id,
                author_id: actor.user_id,
                parent_comment_id: input.parent_comment_id,
                content: input.content,
            })
            .await?;

        tracing::debug!(
            comment_id = %comment.id,
            kind = %self.kind(),
            parent = ?comment.parent_comment_id,
            "comment created"
        );

        Ok(comment)
    }

    pub async fn get(&self, comment_id: Uuid) -> Result<Comment> {
        self.store
            .find_by_id(comment_id)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Every comment of the container, flat, in creation order.
    pub async fn list(&self, container_id: Uuid) -> Result<Vec<CommentWithAuthor>> {
        self.store.find_all_for_container(container_id).await
    }

    /// Delete a comment and all of its replies.
    ///
    /// The subtree is read and removed in one atomic store call, replies
    /// before the comment they answer. Returns the removed ids in deletion
    /// order.
    pub async fn delete(&self, actor: &Actor, comment_id: Uuid) -> Result<Vec<Uuid>> {
        let comment = self.get(comment_id).await?;
        self.policy.authorize_delete(actor, &comment)?;

        let order = match self.store.delete_subtree(comment_id).await {
            Ok(order) => order,
            Err(e) => {
                tracing::error!(
                    comment_id = %comment_id,
                    kind = %self.kind(),
                    "subtree delete failed: {}",
                    e
                );
                return Err(e);
            }
        };

        tracing::info!(
            comment_id = %comment_id,
            kind = %self.kind(),
            actor = %actor.user_id,
            deleted = order.len(),
            "comment subtree deleted"
        );

        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comments::memory::MemoryCommentStore;
    use std::collections::HashMap;

    fn post_service() -> CommentService<MemoryCommentStore> {
        CommentService::new(
            MemoryCommentStore::new(CommentKind::Post),
            DeletePolicy::AuthorOnly,
        )
    }

    fn input(content: &str, parent: Option<Uuid>) -> CreateComment {
        CreateComment {
            content: content.to_string(),
            parent_comment_id: parent,
        }
    }

    /// post-1: A (u1) <- B (u2) <- C (u1)
    async fn seed_chain(
        service: &CommentService<MemoryCommentStore>,
        post: Uuid,
        u1: Uuid,
        u2: Uuid,
    ) -> (Comment, Comment, Comment) {
        let a = service
            .create(&Actor::new(u1), post, input("A", None))
            .await
            .unwrap();
        let b = service
            .create(&Actor::new(u2), post, input("B", Some(a.id)))
            .await
            .unwrap();
        let c = service
            .create(&Actor::new(u1), post, input("C", Some(b.id)))
            .await
            .unwrap();
        (a, b, c)
    }

    #[tokio::test]
    async fn author_deletes_whole_chain_bottom_up() {
        let service = post_service();
        let post = Uuid::new_v4();
        let (u1, u2) = (Uuid::new_v4(), Uuid::new_v4());
        let (a, b, c) = seed_chain(&service, post, u1, u2).await;

        let deleted = service.delete(&Actor::new(u1), a.id).await.unwrap();

        assert_eq!(deleted, vec![c.id, b.id, a.id]);
        assert_eq!(service.store().delete_log().await, vec![c.id, b.id, a.id]);
        assert!(service.list(post).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn non_author_is_forbidden_and_nothing_changes() {
        let service = post_service();
        let post = Uuid::new_v4();
        let (u1, u2) = (Uuid::new_v4(), Uuid::new_v4());
        let (a, b, c) = seed_chain(&service, post, u1, u2).await;

        let result = service.delete(&Actor::new(u2), a.id).await;

        assert!(matches!(result, Err(AppError::Forbidden)));
        let remaining: Vec<Uuid> = service.list(post).await.unwrap().iter().map(|c| c.id).collect();
        assert_eq!(remaining, vec![a.id, b.id, c.id]);
        assert!(service.store().delete_log().await.is_empty());
    }

    #[tokio::test]
    async fn lead_override_only_under_author_or_lead() {
        let service = CommentService::new(
            MemoryCommentStore::new(CommentKind::Post),
            DeletePolicy::AuthorOrLead,
        );
        let post = Uuid::new_v4();
        let (u1, u2) = (Uuid::new_v4(), Uuid::new_v4());
        let (a, _, _) = seed_chain(&service, post, u1, u2).await;
        let lead = Uuid::new_v4();

        assert!(matches!(
            service.delete(&Actor::new(lead), a.id).await,
            Err(AppError::Forbidden)
        ));
        let deleted = service
            .delete(&Actor::new(lead).leading(true), a.id)
            .await
            .unwrap();
        assert_eq!(deleted.len(), 3);
    }

    #[tokio::test]
    async fn deleting_a_reply_keeps_its_ancestors_and_siblings() {
        let service = post_service();
        let post = Uuid::new_v4();
        let (u1, u2) = (Uuid::new_v4(), Uuid::new_v4());
        let (a, b, c) = seed_chain(&service, post, u1, u2).await;
        let sibling = service
            .create(&Actor::new(u1), post, input("sibling", Some(a.id)))
            .await
            .unwrap();

        let deleted = service.delete(&Actor::new(u2), b.id).await.unwrap();

        assert_eq!(deleted, vec![c.id, b.id]);
        let remaining: Vec<Uuid> = service.list(post).await.unwrap().iter().map(|c| c.id).collect();
        assert_eq!(remaining, vec![a.id, sibling.id]);
    }

    #[tokio::test]
    async fn every_node_is_deleted_after_its_descendants() {
        let service = post_service();
        let post = Uuid::new_v4();
        let user = Uuid::new_v4();
        let actor = Actor::new(user);

        let root = service.create(&actor, post, input("root", None)).await.unwrap();
        let mut parents: HashMap<Uuid, Uuid> = HashMap::new();
        let mut frontier = vec![root.id];
        for depth in 0..3 {
            let mut next = Vec::new();
            for parent in &frontier {
                for i in 0..2 {
                    let reply = service
                        .create(&actor, post, input(&format!("{}-{}", depth, i), Some(*parent)))
                        .await
                        .unwrap();
                    parents.insert(reply.id, *parent);
                    next.push(reply.id);
                }
            }
            frontier = next;
        }

        let deleted = service.delete(&actor, root.id).await.unwrap();

        assert_eq!(deleted.len(), 1 + 2 + 4 + 8);
        let position: HashMap<Uuid, usize> =
            deleted.iter().enumerate().map(|(i, id)| (*id, i)).collect();
        for (child, parent) in &parents {
            assert!(position[child] < position[parent]);
        }
        assert_eq!(*deleted.last().unwrap(), root.id);
    }

    #[tokio::test]
    async fn failed_delete_leaves_store_untouched() {
        let service = post_service();
        let post = Uuid::new_v4();
        let (u1, u2) = (Uuid::new_v4(), Uuid::new_v4());
        let (a, b, _) = seed_chain(&service, post, u1, u2).await;
        service.store().fail_deletes_at(b.id).await;

        let result = service.delete(&Actor::new(u1), a.id).await;

        assert!(matches!(result, Err(AppError::Internal(_))));
        assert_eq!(service.store().len().await, 3);
        assert!(service.store().delete_log().await.is_empty());

        // the caller may retry the whole delete
        assert_eq!(service.delete(&Actor::new(u1), a.id).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn missing_comment_is_not_found() {
        let service = post_service();
        let result = service.delete(&Actor::new(Uuid::new_v4()), Uuid::new_v4()).await;
        assert!(matches!(result, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn reply_to_other_container_is_rejected() {
        let service = post_service();
        let user = Actor::new(Uuid::new_v4());
        let (post_1, post_2) = (Uuid::new_v4(), Uuid::new_v4());
        let a = service.create(&user, post_1, input("A", None)).await.unwrap();

        let result = service.create(&user, post_2, input("reply", Some(a.id))).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(service.list(post_2).await.unwrap().is_empty());
        assert_eq!(service.store().len().await, 1);
    }

    #[tokio::test]
    async fn reply_to_missing_parent_is_rejected() {
        let service = post_service();
        let user = Actor::new(Uuid::new_v4());
        let result = service
            .create(&user, Uuid::new_v4(), input("reply", Some(Uuid::new_v4())))
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(service.store().is_empty().await);
    }

    #[tokio::test]
    async fn blank_content_is_rejected() {
        let service = post_service();
        let user = Actor::new(Uuid::new_v4());
        let result = service.create(&user, Uuid::new_v4(), input("   ", None)).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn task_comments_do_not_nest() {
        let service = CommentService::new(
            MemoryCommentStore::new(CommentKind::Task),
            DeletePolicy::AuthorOnly,
        );
        let user = Actor::new(Uuid::new_v4());
        let task = Uuid::new_v4();
        let top = service.create(&user, task, input("top", None)).await.unwrap();

        let result = service.create(&user, task, input("reply", Some(top.id))).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(service.delete(&user, top.id).await.unwrap(), vec![top.id]);
    }

    #[tokio::test]
    async fn listing_is_stable_without_writes() {
        let service = post_service();
        let post = Uuid::new_v4();
        let (u1, u2) = (Uuid::new_v4(), Uuid::new_v4());
        seed_chain(&service, post, u1, u2).await;

        let first = service.list(post).await.unwrap();
        let second = service.list(post).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn ancestors_stay_in_container_and_chains_terminate() {
        let service = post_service();
        let post = Uuid::new_v4();
        let (u1, u2) = (Uuid::new_v4(), Uuid::new_v4());
        let (a, _, _) = seed_chain(&service, post, u1, u2).await;
        service
            .create(&Actor::new(u2), post, input("B2", Some(a.id)))
            .await
            .unwrap();

        let comments = service.list(post).await.unwrap();
        let by_id: HashMap<Uuid, &CommentWithAuthor> = comments.iter().map(|c| (c.id, c)).collect();
        for comment in &comments {
            let mut current: &CommentWithAuthor = comment;
            let mut hops = 0;
            while let Some(parent) = current.parent_comment_id {
                current = by_id[&parent];
                assert_eq!(current.container_id, post);
                hops += 1;
                assert!(hops <= comments.len());
            }
            assert!(current.parent_comment_id.is_none());
        }
    }
}
