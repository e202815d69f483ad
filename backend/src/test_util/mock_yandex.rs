//! Canned Yandex OAuth payloads for mock servers.

pub fn token_json(access_token: &str) -> serde_json::Value {
    serde_json::json!({
        "token_type": "bearer",
        "access_token": access_token,
        "expires_in": 31536000,
        "refresh_token": "1:refresh:token"
    })
}

pub fn token_error_json(error: &str, description: &str) -> serde_json::Value {
    serde_json::json!({
        "error": error,
        "error_description": description
    })
}

/// Profile as `login.yandex.ru/info` returns it. Email and avatar are only
/// included when given, like when the user declined those scopes.
pub fn profile_json(id: &str, email: Option<&str>, avatar_id: Option<&str>) -> serde_json::Value {
    let mut profile = serde_json::json!({
        "id": id,
        "login": format!("user{}", id),
        "client_id": "test-client",
        "display_name": format!("user{}", id),
        "real_name": "Ivan Petrov",
        "first_name": "Ivan",
        "last_name": "Petrov",
        "sex": "male",
        "psuid": "1.AAAA.bbbb"
    });

    if let Some(email) = email {
        profile["default_email"] = serde_json::json!(email);
        profile["emails"] = serde_json::json!([email]);
    }
    if let Some(avatar_id) = avatar_id {
        profile["default_avatar_id"] = serde_json::json!(avatar_id);
        profile["is_avatar_empty"] = serde_json::json!(avatar_id == "0");
    }

    profile
}
