pub mod config;
pub mod db;
pub mod dispatch;
pub mod experiment;
pub mod results;
pub mod review;
pub mod shared;
pub mod strings;
