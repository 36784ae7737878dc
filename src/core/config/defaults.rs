pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 4000;

pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_OPENAI_COMPATIBLE_BASE_URL: &str = "http://localhost:1234";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

pub const DEFAULT_HISTORY_LIMIT: i64 = 20;
pub const DEFAULT_SEARCH_LIMIT: usize = 5;
pub const DEFAULT_FALLBACK_LIMIT: usize = 3;

pub fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://127.0.0.1:3000".to_string(),
    ]
}

/// Built-in docent persona, used when `chat.persona` is not configured.
pub const DEFAULT_PERSONA: &str = "당신은 문화예술 AI 도슨트입니다. 오페라, 클래식 음악, 발레, 미술, 연극 등 다양한 문화예술 분야에 대해 전문적이면서도 친근하게 설명해주세요.

주요 역할:
- 공연 작품의 역사적 배경과 의미를 설명
- 예술가들의 생애와 작품 세계를 소개
- 감상 포인트와 관람 팁 제공
- 문화예술에 대한 질문에 친절히 답변

항상 한국어로 대화하고, 전문 용어는 쉽게 풀어서 설명해주세요.";
