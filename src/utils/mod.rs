pub mod json;
pub mod jwt;
pub mod query;
pub mod slug;

pub use json::document_to_json;
pub use jwt::{create_token, verify_token, Claims};
pub use query::{fetch_list, ListQuery, ListResponse, Populate};
pub use slug::slugify;
