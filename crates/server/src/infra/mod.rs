pub mod gemini;
pub mod http;
pub mod maps;
pub mod notify;
pub mod postgres_repo;
pub mod rate_limit;
pub mod retry;
pub mod sqlite_repo;
pub mod stripe;
