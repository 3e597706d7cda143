const USER_ID_KEY: &str = "relief.user_id";

/// Trimmed user id, `None` when blank.
pub fn normalize_user_id(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok().flatten()
}

pub fn current_user_id() -> Option<String> {
    let stored = local_storage()?.get_item(USER_ID_KEY).ok().flatten()?;
    normalize_user_id(&stored)
}

/// Store `user_id`, or forget the current one.
pub fn remember_user_id(user_id: Option<&str>) {
    let Some(storage) = local_storage() else {
        tracing::warn!("Local storage unavailable, sign-in will not persist");
        return;
    };
    let result = match user_id {
        Some(id) => storage.set_item(USER_ID_KEY, id),
        None => storage.remove_item(USER_ID_KEY),
    };
    if let Err(e) = result {
        tracing::warn!(error = ?e, "Failed to update stored user id");
    }
}
