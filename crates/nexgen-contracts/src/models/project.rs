use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::timestamp::{iso, now_utc};

/// A client's project idea. Owned by at most one user through `owner_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectIdea {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_range: Option<String>,
    #[serde(with = "iso")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drive_link: Option<String>,
}

impl ProjectIdea {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: None,
            title: title.into(),
            description: description.into(),
            features: Vec::new(),
            budget_range: None,
            created_at: now_utc(),
            images: Vec::new(),
            drive_link: None,
        }
    }

    pub fn owned_by(&self, user_id: &str) -> bool {
        self.owner_id.as_deref() == Some(user_id)
    }
}

/// Projects visible in a client's own dashboard.
pub fn projects_owned_by<'a>(projects: &'a [ProjectIdea], user_id: &str) -> Vec<&'a ProjectIdea> {
    projects.iter().filter(|project| project.owned_by(user_id)).collect()
}

#[cfg(test)]
mod tests {
    use super::{projects_owned_by, ProjectIdea};

    #[test]
    fn owner_filter_ignores_unowned_projects() {
        let mut mine = ProjectIdea::new("Loja", "Loja online");
        mine.owner_id = Some("client-1".to_string());
        let orphan = ProjectIdea::new("Blog", "Blog pessoal");
        let projects = vec![mine.clone(), orphan];
        let owned = projects_owned_by(&projects, "client-1");
        assert_eq!(owned.len(), 1);
        assert_eq!(owned[0].id, mine.id);
    }

    #[test]
    fn missing_optional_collections_default_to_empty() -> anyhow::Result<()> {
        let project: ProjectIdea = serde_json::from_str(
            r#"{"id":"p","title":"T","description":"D","createdAt":"2025-01-02T03:04:05.000Z"}"#,
        )?;
        assert!(project.features.is_empty());
        assert!(project.images.is_empty());
        assert!(project.owner_id.is_none());
        Ok(())
    }
}
