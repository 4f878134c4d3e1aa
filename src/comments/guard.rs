use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::Comment;

/// The user acting on a comment, resolved by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    /// Whether the user leads the project owning the comment's container.
    pub leads_container: bool,
}

impl Actor {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            leads_container: false,
        }
    }

    pub fn leading(mut self, leads_container: bool) -> Self {
        self.leads_container = leads_container;
        self
    }
}

/// Who may delete a comment (and with it, all of its replies).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeletePolicy {
    #[default]
    AuthorOnly,
    AuthorOrLead,
}

impl std::fmt::Display for DeletePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeletePolicy::AuthorOnly => write!(f, "author"),
            DeletePolicy::AuthorOrLead => write!(f, "author_or_lead"),
        }
    }
}

impl std::str::FromStr for DeletePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "author" | "author_only" => Ok(DeletePolicy::AuthorOnly),
            "author_or_lead" => Ok(DeletePolicy::AuthorOrLead),
            _ => Err(format!("Invalid comment delete policy: {}", s)),
        }
    }
}

impl DeletePolicy {
    pub fn permits(&self, actor: &Actor, comment: &Comment) -> bool {
        if actor.user_id == comment.author_id {
            return true;
        }
        match self {
            DeletePolicy::AuthorOnly => false,
            DeletePolicy::AuthorOrLead => actor.leads_container,
        }
    }

    pub fn authorize_delete(&self, actor: &Actor, comment: &Comment) -> Result<()> {
        if self.permits(actor, comment) {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn comment_by(author_id: Uuid) -> Comment {
        Comment {
            id: Uuid::new_v4(),
            container_id: Uuid::new_v4(),
            author_id,
            parent_comment_id: None,
            content: "hello".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn author_may_always_delete() {
        let author = Uuid::new_v4();
        let comment = comment_by(author);
        for policy in [DeletePolicy::AuthorOnly, DeletePolicy::AuthorOrLead] {
            assert!(policy.permits(&Actor::new(author), &comment));
        }
    }

    #[test]
    fn author_only_ignores_lead() {
        let comment = comment_by(Uuid::new_v4());
        let lead = Actor::new(Uuid::new_v4()).leading(true);
        assert!(matches!(
            DeletePolicy::AuthorOnly.authorize_delete(&lead, &comment),
            Err(AppError::Forbidden)
        ));
    }

    #[test]
    fn author_or_lead_admits_lead_only() {
        let comment = comment_by(Uuid::new_v4());
        let lead = Actor::new(Uuid::new_v4()).leading(true);
        let member = Actor::new(Uuid::new_v4());
        assert!(DeletePolicy::AuthorOrLead.authorize_delete(&lead, &comment).is_ok());
        assert!(!DeletePolicy::AuthorOrLead.permits(&member, &comment));
    }

    #[test]
    fn policy_parses_from_config_values() {
        assert_eq!("author".parse::<DeletePolicy>(), Ok(DeletePolicy::AuthorOnly));
        assert_eq!("AUTHOR_OR_LEAD".parse::<DeletePolicy>(), Ok(DeletePolicy::AuthorOrLead));
        assert!("anyone".parse::<DeletePolicy>().is_err());
        assert_eq!(DeletePolicy::default(), DeletePolicy::AuthorOnly);
    }
}
