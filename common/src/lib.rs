pub mod clock;
pub mod db;
pub mod err;
pub mod schema;
pub mod types;
