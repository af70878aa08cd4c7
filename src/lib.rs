pub mod api;
pub mod captcha;
pub mod config;
pub mod entities;
pub mod middleware;
pub mod storage;
