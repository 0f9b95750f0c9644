pub mod admin;
pub mod auth;
pub mod follow;
pub mod posts;
pub mod users;

use std::iter;

use spartan_cloud::ObjectStorage;
use spartan_db::repositories::OrphanedMedia;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Run `validator` rules on a request body, reporting the first failing field
/// (in field-name order) as a 400.
pub(crate) fn validate_input<T: Validate>(input: &T) -> AppResult<()> {
    let Err(errors) = input.validate() else {
        return Ok(());
    };

    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    let message = fields
        .iter()
        .flat_map(|(field, errs)| errs.iter().map(move |e| (field, e)))
        .map(|(field, e)| match &e.message {
            Some(message) => message.to_string(),
            None => format!("Invalid value for {field}"),
        })
        .next()
        .unwrap_or_else(|| "Invalid request".to_string());

    Err(AppError::validation(message))
}

/// Trim an optional text field; blank becomes `None`.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// URLs of a post's stored objects: the media itself and its thumbnail, if any.
pub(crate) fn media_urls(media_url: &str, thumbnail_url: Option<&str>) -> Vec<String> {
    iter::once(media_url)
        .chain(thumbnail_url)
        .map(str::to_string)
        .collect()
}

/// URLs of every object left behind by a deleted account's posts.
pub(crate) fn orphaned_media_urls(media: &[OrphanedMedia]) -> Vec<String> {
    media
        .iter()
        .flat_map(|m| media_urls(&m.media_url, m.thumbnail_url.as_deref()))
        .collect()
}

/// Delete stored objects after their database rows are gone. Failures are
/// logged and otherwise ignored.
pub(crate) async fn remove_stored_media(storage: &dyn ObjectStorage, urls: Vec<String>) {
    for url in &urls {
        if let Err(e) = storage.delete_by_url(url).await {
            tracing::warn!(url, error = %e, "Failed to delete stored media");
        }
    }
}
