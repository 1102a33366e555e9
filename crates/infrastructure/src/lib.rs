pub mod dynamodb;
pub mod memory;
pub mod models;
pub mod repositories;
pub mod timeout;

pub use dynamodb::*;
pub use memory::*;
pub use models::*;
pub use repositories::*;
pub use timeout::*;
