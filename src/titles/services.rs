use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    error::AppError,
    titles::{repo::TitleRepo, repo_types::Title},
};

pub const MAX_TITLE_CHARS: usize = 255;

/// Trims the title text and checks its length.
pub fn validate_title(raw: &str) -> Result<&str, AppError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(AppError::Validation(vec!["Title is required.".into()]));
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(AppError::Validation(vec![format!(
            "Title must be at most {MAX_TITLE_CHARS} characters."
        )]));
    }
    Ok(title)
}

pub async fn create_title(
    titles: &dyn TitleRepo,
    owner: Uuid,
    raw: &str,
) -> Result<Title, AppError> {
    let text = validate_title(raw)?;
    let title = titles.create(owner, text).await?;
    debug!(title_id = %title.id, user_id = %owner, "title created");
    Ok(title)
}

pub async fn list_titles(titles: &dyn TitleRepo, owner: Uuid) -> Result<Vec<Title>, AppError> {
    Ok(titles.list_by_user(owner).await?)
}

/// Deletes a title owned by `owner` and returns the row as it was before
/// deletion. Titles belonging to someone else are reported as missing.
pub async fn delete_title(
    titles: &dyn TitleRepo,
    owner: Uuid,
    id: Uuid,
) -> Result<Title, AppError> {
    let existing = match titles.find_by_id(id).await? {
        Some(t) if t.user_id == owner => t,
        Some(_) => {
            warn!(title_id = %id, user_id = %owner, "delete of foreign title refused");
            return Err(AppError::NotFound("Title"));
        }
        None => return Err(AppError::NotFound("Title")),
    };

    // Lost a race with a concurrent delete.
    if !titles.delete(id).await? {
        return Err(AppError::NotFound("Title"));
    }
    debug!(title_id = %id, user_id = %owner, "title deleted");
    Ok(existing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::{repo::UserRepo, repo_types::NewUser},
        memory::MemoryStore,
    };

    async fn store_with_user() -> (MemoryStore, Uuid) {
        let store = MemoryStore::new();
        let user = UserRepo::create(
            &store,
            NewUser {
                email: "owner@example.com",
                username: "owner",
                password_hash: "hash",
            },
        )
        .await
        .unwrap()
        .unwrap();
        (store, user.id)
    }

    #[test]
    fn validate_title_trims_and_bounds_length() {
        assert_eq!(validate_title("  Song of the year ").unwrap(), "Song of the year");
        assert!(matches!(validate_title("   "), Err(AppError::Validation(_))));
        let long = "x".repeat(MAX_TITLE_CHARS + 1);
        assert!(matches!(validate_title(&long), Err(AppError::Validation(_))));
        assert!(validate_title(&"é".repeat(MAX_TITLE_CHARS)).is_ok());
    }

    #[tokio::test]
    async fn delete_returns_pre_deletion_record() {
        let (store, owner) = store_with_user().await;
        let created = create_title(&store, owner, "Keep me?").await.unwrap();

        let deleted = delete_title(&store, owner, created.id).await.unwrap();
        assert_eq!(deleted, created);
        assert!(list_titles(&store, owner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_missing_title_leaves_store_unchanged() {
        let (store, owner) = store_with_user().await;
        let kept = create_title(&store, owner, "Stay").await.unwrap();

        let err = delete_title(&store, owner, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound("Title")));
        assert_eq!(list_titles(&store, owner).await.unwrap(), vec![kept]);
    }

    #[tokio::test]
    async fn second_delete_reports_not_found() {
        let (store, owner) = store_with_user().await;
        let created = create_title(&store, owner, "Once").await.unwrap();
        delete_title(&store, owner, created.id).await.unwrap();
        let err = delete_title(&store, owner, created.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_of_other_users_title_is_not_found() {
        let (store, owner) = store_with_user().await;
        let created = create_title(&store, owner, "Mine").await.unwrap();

        let err = delete_title(&store, Uuid::new_v4(), created.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(list_titles(&store, owner).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn create_for_unknown_owner_is_internal_error() {
        let store = MemoryStore::new();
        let err = create_title(&store, Uuid::new_v4(), "orphan")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }
}
