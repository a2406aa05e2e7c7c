// Catalog tables
pub mod connection_type;
pub mod operator;
pub mod order_type;
pub mod product;
pub mod rate;
pub mod technician;

// Installation records
pub mod discount;
pub mod installation;

// Authentication
pub mod auth_token;
pub mod user;
