use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A link pinned to a project (docs, repositories, design files).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Resource {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub url: String,
    pub icon: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateResource {
    pub name: String,
    pub description: Option<String>,
    pub url: String,
    pub icon: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateResource {
    pub name: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub icon: Option<String>,
}

/// Only http(s) links are accepted.
pub fn validate_url(url: &str) -> Result<(), String> {
    let url = url.trim();
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .ok_or_else(|| "Resource URL must start with http:// or https://".to_string())?;

    if rest.is_empty() || rest.contains(char::is_whitespace) {
        return Err("Resource URL is not valid".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_web_links_only() {
        assert!(validate_url("https://example.com/docs").is_ok());
        assert!(validate_url(" http://intranet/wiki ").is_ok());
        assert!(validate_url("ftp://example.com").is_err());
        assert!(validate_url("https://").is_err());
        assert!(validate_url("https://exa mple.com").is_err());
    }
}
