pub mod cooking_store;
pub mod db;
pub mod recipe_llm;
pub mod recipe_source;

pub use cooking_store::PgCookingStore;
pub use db::DbAdapter;
pub use recipe_llm::{OpenAiRecipeAdapter, UnconfiguredGenerator};
pub use recipe_source::{PgCatalogSource, PgGeneratedSource};
