use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Comment, CommentKind, CommentWithAuthor, NewComment};

/// Persistence the comment service orchestrates.
///
/// Listings return rows in creation order. `delete_subtree` must read and
/// remove the subtree as one atomic step, so a reply written concurrently is
/// either part of the deleted set or rejected by the parent check.
#[async_trait]
pub trait CommentStore: Send + Sync {
    fn kind(&self) -> CommentKind;

    async fn create(&self, new: NewComment) -> Result<Comment>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>>;

    async fn find_children(&self, parent_id: Uuid) -> Result<Vec<Comment>>;

    /// Every comment of the container with its author's display name.
    async fn find_all_for_container(&self, container_id: Uuid) -> Result<Vec<CommentWithAuthor>>;

    /// `root` and every transitive reply. Stores that can answer in one
    /// round-trip should override the level-by-level walk below.
    async fn find_subtree(&self, root: Uuid) -> Result<Vec<Comment>> {
        let Some(root) = self.find_by_id(root).await? else {
            return Ok(Vec::new());
        };

        let mut frontier = vec![root.id];
        let mut subtree = vec![root];
        while let Some(parent) = frontier.pop() {
            for child in self.find_children(parent).await? {
                frontier.push(child.id);
                subtree.push(child);
            }
        }

        Ok(subtree)
    }

    /// Remove `root` and all of its replies, each row after its descendants.
    ///
    /// Returns the removed ids in deletion order, or `NotFound` when `root`
    /// no longer exists. On any other failure nothing is removed.
    async fn delete_subtree(&self, root: Uuid) -> Result<Vec<Uuid>>;
}
