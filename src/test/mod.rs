mod achievements;
mod db;
mod executor;
mod fallback;
mod kv;
mod service;
mod utils;
