//! Magazine articles: the corpus the chat core retrieves from.

mod sqlite;
mod store;
mod types;

pub use sqlite::SqliteArticleStore;
pub use store::ArticleStore;
pub use types::{Article, Category, Magazine, MagazineRef, NewArticle, NewMagazine};
