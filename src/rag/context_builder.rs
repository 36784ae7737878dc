//! Renders retrieved articles into the reference block placed in the system
//! prompt.

use crate::articles::Article;

pub const CONTEXT_HEADER: &str = "=== 참고 자료 (우리 매거진 기사) ===";
pub const CONTEXT_FOOTER: &str = "=== 참고 자료 끝 ===";

/// Standing guidance for the model on how to use the reference block.
pub const CONTEXT_INSTRUCTIONS: &str = "중요: 위 참고 자료의 내용을 적극 활용하여 답변하세요.
- 관련 기사가 있다면 \"저희 매거진에서 다룬 바에 따르면...\", \"OO호에서 소개한 내용으로는...\" 등으로 자연스럽게 인용하세요.
- 참고 자료의 구체적인 정보(작품명, 작가명, 날짜 등)를 포함하세요.
- 참고 자료에 없는 내용은 일반 지식으로 보충하되, 추측은 피하세요.";

const NO_SUBTITLE: &str = "없음";
const EDITORIAL_STAFF: &str = "편집부";
const UNSPECIFIED_SOURCE: &str = "미지정";

fn render_entry(index: usize, article: &Article) -> String {
    let source = article
        .magazine
        .as_ref()
        .map(|m| format!("{} {}호", m.title, m.issue))
        .unwrap_or_else(|| UNSPECIFIED_SOURCE.to_string());

    format!(
        "[기사 {}] {}\n- 카테고리: {}\n- 부제: {}\n- 작성자: {}\n- 출처: {}\n- 내용: {}",
        index + 1,
        article.title,
        article.category,
        article.subtitle.as_deref().unwrap_or(NO_SUBTITLE),
        article.author.as_deref().unwrap_or(EDITORIAL_STAFF),
        source,
        article.content
    )
}

/// One numbered entry per article, in the given order, with full bodies.
/// Returns an empty string for an empty slice.
pub fn render_context(articles: &[Article]) -> String {
    if articles.is_empty() {
        return String::new();
    }

    let entries = articles
        .iter()
        .enumerate()
        .map(|(i, article)| render_entry(i, article))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "{}\n{}\n{}\n\n{}",
        CONTEXT_HEADER, entries, CONTEXT_FOOTER, CONTEXT_INSTRUCTIONS
    )
}
