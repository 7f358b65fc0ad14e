pub mod grouping;
pub mod manager;
pub mod models;
pub mod query_builder;
pub mod repositories;

pub use manager::{DatabaseError, DatabaseManager};
pub use repositories::{CategoryRepository, CustomerRepository, EmployeeRepository, OrderRepository, ProductRepository};
