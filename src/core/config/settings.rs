use std::env;

use serde_json::Value;

use super::defaults::{
    default_cors_origins, DEFAULT_ANTHROPIC_BASE_URL, DEFAULT_FALLBACK_LIMIT, DEFAULT_HISTORY_LIMIT,
    DEFAULT_HOST, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_OPENAI_COMPATIBLE_BASE_URL,
    DEFAULT_PERSONA, DEFAULT_PORT, DEFAULT_SEARCH_LIMIT,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Anthropic,
    OpenAiCompatible,
}

impl ProviderKind {
    fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("openai_compatible") => ProviderKind::OpenAiCompatible,
            _ => ProviderKind::Anthropic,
        }
    }

    fn api_key_env(&self) -> &'static str {
        match self {
            ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
            ProviderKind::OpenAiCompatible => "OPENAI_API_KEY",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub provider: ProviderKind,
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub max_tokens: u32,
    pub temperature: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub history_limit: i64,
    pub persona: String,
}

#[derive(Debug, Clone)]
pub struct RagSettings {
    pub search_limit: usize,
    pub fallback_limit: usize,
}

/// Typed view over the merged YAML config.
///
/// Missing keys fall back to the defaults in [`super::defaults`]; type and
/// range errors have already been rejected by validation at load time.
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub server: ServerSettings,
    pub llm: LlmSettings,
    pub chat: ChatSettings,
    pub rag: RagSettings,
}

impl AppSettings {
    pub fn from_config(config: &Value) -> Self {
        let server = config.get("server");
        let llm = config.get("llm");
        let chat = config.get("chat");
        let rag = config.get("rag");

        let provider = ProviderKind::parse(str_at(llm, "provider"));
        let default_base_url = match provider {
            ProviderKind::Anthropic => DEFAULT_ANTHROPIC_BASE_URL,
            ProviderKind::OpenAiCompatible => DEFAULT_OPENAI_COMPATIBLE_BASE_URL,
        };

        let cors_allowed_origins = server
            .and_then(|v| v.get("cors_allowed_origins"))
            .and_then(|v| v.as_array())
            .map(|list| {
                list.iter()
                    .filter_map(|item| item.as_str())
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .filter(|list| !list.is_empty())
            .unwrap_or_else(default_cors_origins);

        Self {
            server: ServerSettings {
                host: str_at(server, "host").unwrap_or(DEFAULT_HOST).to_string(),
                port: u64_at(server, "port")
                    .map(|v| v as u16)
                    .unwrap_or(DEFAULT_PORT),
                cors_allowed_origins,
            },
            llm: LlmSettings {
                provider,
                base_url: str_at(llm, "base_url")
                    .unwrap_or(default_base_url)
                    .trim_end_matches('/')
                    .to_string(),
                model: str_at(llm, "model").unwrap_or(DEFAULT_MODEL).to_string(),
                api_key: str_at(llm, "api_key")
                    .map(str::trim)
                    .filter(|key| !key.is_empty())
                    .map(str::to_string),
                max_tokens: u64_at(llm, "max_tokens")
                    .map(|v| v as u32)
                    .unwrap_or(DEFAULT_MAX_TOKENS),
                temperature: llm
                    .and_then(|v| v.get("temperature"))
                    .and_then(|v| v.as_f64()),
            },
            chat: ChatSettings {
                history_limit: u64_at(chat, "history_limit")
                    .map(|v| v as i64)
                    .unwrap_or(DEFAULT_HISTORY_LIMIT),
                persona: str_at(chat, "persona")
                    .filter(|p| !p.trim().is_empty())
                    .unwrap_or(DEFAULT_PERSONA)
                    .to_string(),
            },
            rag: RagSettings {
                search_limit: u64_at(rag, "search_limit")
                    .map(|v| v as usize)
                    .unwrap_or(DEFAULT_SEARCH_LIMIT),
                fallback_limit: u64_at(rag, "fallback_limit")
                    .map(|v| v as usize)
                    .unwrap_or(DEFAULT_FALLBACK_LIMIT),
            },
        }
    }

    /// `PORT` and the provider's API key variable take precedence over the files.
    pub fn apply_env_overrides(mut self) -> Self {
        if let Some(port) = env::var("PORT").ok().and_then(|v| v.parse::<u16>().ok()) {
            self.server.port = port;
        }
        if let Ok(key) = env::var(self.llm.provider.api_key_env()) {
            if !key.trim().is_empty() {
                self.llm.api_key = Some(key.trim().to_string());
            }
        }
        self
    }
}

fn str_at<'a>(section: Option<&'a Value>, key: &str) -> Option<&'a str> {
    section.and_then(|v| v.get(key)).and_then(|v| v.as_str())
}

fn u64_at(section: Option<&Value>, key: &str) -> Option<u64> {
    section.and_then(|v| v.get(key)).and_then(|v| v.as_u64())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_config_uses_defaults() {
        let settings = AppSettings::from_config(&json!({}));
        assert_eq!(settings.server.port, DEFAULT_PORT);
        assert_eq!(settings.llm.provider, ProviderKind::Anthropic);
        assert_eq!(settings.llm.base_url, DEFAULT_ANTHROPIC_BASE_URL);
        assert_eq!(settings.llm.max_tokens, 1024);
        assert_eq!(settings.chat.history_limit, 20);
        assert_eq!(settings.chat.persona, DEFAULT_PERSONA);
        assert_eq!(settings.rag.search_limit, 5);
        assert_eq!(settings.rag.fallback_limit, 3);
        assert!(settings.llm.api_key.is_none());
    }

    #[test]
    fn explicit_values_override_defaults() {
        let settings = AppSettings::from_config(&json!({
            "server": {"port": 8080, "cors_allowed_origins": ["*"]},
            "llm": {
                "provider": "openai_compatible",
                "base_url": "http://localhost:11434/",
                "model": "qwen",
                "api_key": "  ",
                "temperature": 0.3
            },
            "chat": {"history_limit": 8, "persona": "You are a guide."},
            "rag": {"search_limit": 2}
        }));

        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.server.cors_allowed_origins, vec!["*".to_string()]);
        assert_eq!(settings.llm.provider, ProviderKind::OpenAiCompatible);
        assert_eq!(settings.llm.base_url, "http://localhost:11434");
        assert_eq!(settings.llm.model, "qwen");
        assert!(settings.llm.api_key.is_none());
        assert_eq!(settings.llm.temperature, Some(0.3));
        assert_eq!(settings.chat.history_limit, 8);
        assert_eq!(settings.chat.persona, "You are a guide.");
        assert_eq!(settings.rag.search_limit, 2);
        assert_eq!(settings.rag.fallback_limit, 3);
    }

    #[test]
    fn blank_persona_falls_back_to_builtin() {
        let settings = AppSettings::from_config(&json!({"chat": {"persona": "   "}}));
        assert_eq!(settings.chat.persona, DEFAULT_PERSONA);
    }
}
