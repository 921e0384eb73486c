//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod argon2_password_hasher;
mod in_memory_access_repository;
mod in_memory_target_repository;
mod postgres_access_repository;
mod postgres_audit_repository;
mod postgres_directory_repository;
mod postgres_target_audit_repository;
mod postgres_target_repository;

pub use argon2_password_hasher::Argon2PasswordHasher;
pub use in_memory_access_repository::InMemoryAccessRepository;
pub use in_memory_target_repository::InMemoryTargetRepository;
pub use postgres_access_repository::PostgresAccessRepository;
pub use postgres_audit_repository::PostgresAuditRepository;
pub use postgres_directory_repository::PostgresDirectoryRepository;
pub use postgres_target_audit_repository::PostgresTargetAuditRepository;
pub use postgres_target_repository::PostgresTargetRepository;
