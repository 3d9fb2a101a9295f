pub mod db;
pub mod error;

pub use db::{create_db, insert_distribution, list_distributions, DbPool, NewDistribution};
pub use error::StorageError;
