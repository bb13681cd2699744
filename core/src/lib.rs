pub mod db;
pub mod extract;
pub mod fallback;
pub mod models;
pub mod multi;
pub mod planner;
pub mod prices;
pub mod shopping;
