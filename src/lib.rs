pub mod auth;
pub mod checkin;
pub mod config;
pub mod db;
pub mod errors;
pub mod export;
pub mod feed;
pub mod handlers;
pub mod models;
pub mod offline;
pub mod qr;
pub mod storage;
pub mod templates_structs;
