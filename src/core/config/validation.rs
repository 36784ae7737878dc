use serde_json::{Map, Value};

use crate::core::errors::ApiError;

pub fn validate_config(config: &Value) -> Result<(), ApiError> {
    let root = config
        .as_object()
        .ok_or_else(|| config_type_error("root", "object"))?;

    if let Some(server) = expect_optional_object(root, "server")? {
        validate_optional_string_field(server, "server.host", "host")?;
        validate_u64_field(server, "server.port", "port", 0, 65535)?;
        validate_string_array_field(
            server,
            "server.cors_allowed_origins",
            "cors_allowed_origins",
        )?;
    }

    if let Some(llm) = expect_optional_object(root, "llm")? {
        validate_optional_string_field(llm, "llm.provider", "provider")?;
        if let Some(provider) = llm.get("provider").and_then(|v| v.as_str()) {
            if !matches!(provider, "anthropic" | "openai_compatible") {
                return Err(ApiError::BadRequest(format!(
                    "Invalid config at 'llm.provider': unknown provider '{}'",
                    provider
                )));
            }
        }
        validate_optional_string_field(llm, "llm.base_url", "base_url")?;
        validate_optional_string_field(llm, "llm.model", "model")?;
        validate_optional_string_field(llm, "llm.api_key", "api_key")?;
        validate_u64_field(llm, "llm.max_tokens", "max_tokens", 1, 200_000)?;
        validate_f64_field(llm, "llm.temperature", "temperature", 0.0, 2.0)?;
    }

    if let Some(chat) = expect_optional_object(root, "chat")? {
        validate_u64_field(chat, "chat.history_limit", "history_limit", 1, 1_000)?;
        validate_optional_string_field(chat, "chat.persona", "persona")?;
    }

    if let Some(rag) = expect_optional_object(root, "rag")? {
        validate_u64_field(rag, "rag.search_limit", "search_limit", 1, 100)?;
        validate_u64_field(rag, "rag.fallback_limit", "fallback_limit", 1, 100)?;
    }

    Ok(())
}

fn expect_optional_object<'a>(
    root: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a Map<String, Value>>, ApiError> {
    match root.get(key) {
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(config_type_error(key, "object")),
        None => Ok(None),
    }
}

fn validate_u64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: u64,
    max: u64,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(number) = value.as_u64() else {
        return Err(config_type_error(path, "integer"));
    };
    if number < min || number > max {
        return Err(ApiError::BadRequest(format!(
            "Invalid config at '{}': must be between {} and {}",
            path, min, max
        )));
    }
    Ok(())
}

fn validate_f64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: f64,
    max: f64,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(number) = value.as_f64() else {
        return Err(config_type_error(path, "number"));
    };
    if number < min || number > max {
        return Err(ApiError::BadRequest(format!(
            "Invalid config at '{}': must be between {} and {}",
            path, min, max
        )));
    }
    Ok(())
}

fn validate_optional_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.as_str().is_none() {
        return Err(config_type_error(path, "string"));
    }
    Ok(())
}

fn validate_string_array_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(items) = value.as_array() else {
        return Err(config_type_error(path, "array of strings"));
    };
    for (index, item) in items.iter().enumerate() {
        let Some(text) = item.as_str() else {
            return Err(config_type_error(&format!("{}[{}]", path, index), "string"));
        };
        if text.trim().is_empty() {
            return Err(ApiError::BadRequest(format!(
                "Invalid config at '{}[{}]': value cannot be empty",
                path, index
            )));
        }
    }
    Ok(())
}

fn config_type_error(path: &str, expected: &str) -> ApiError {
    ApiError::BadRequest(format!(
        "Invalid config at '{}': expected {}",
        path, expected
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_full_config() {
        let config = json!({
            "server": {"host": "0.0.0.0", "port": 4000, "cors_allowed_origins": ["*"]},
            "llm": {"provider": "anthropic", "model": "m", "max_tokens": 1024, "temperature": 0.7},
            "chat": {"history_limit": 20, "persona": "p"},
            "rag": {"search_limit": 5, "fallback_limit": 3}
        });
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn rejects_unknown_provider() {
        let config = json!({"llm": {"provider": "carrier-pigeon"}});
        assert!(matches!(
            validate_config(&config),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn rejects_zero_history_limit() {
        let config = json!({"chat": {"history_limit": 0}});
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn rejects_blank_origin_entry() {
        let config = json!({"server": {"cors_allowed_origins": ["http://localhost:3000", " "]}});
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("server.cors_allowed_origins[1]"));
    }

    #[test]
    fn rejects_non_object_section() {
        let config = json!({"rag": 5});
        assert!(validate_config(&config).is_err());
    }
}
