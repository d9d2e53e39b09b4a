//! Memory Layer - In-Memory State Management
//!
//! 实现 BookRepositoryPort 的内存版本

mod book_repo;

pub use book_repo::InMemoryBookRepository;
