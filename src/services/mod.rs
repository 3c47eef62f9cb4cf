pub mod database;
pub mod relationship;
pub mod transition;
pub mod user;

// 重新导出常用类型
pub use database::Database;
pub use relationship::RelationshipService;
pub use user::UserService;
