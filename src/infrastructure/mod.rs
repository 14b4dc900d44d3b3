pub mod db;
pub mod openai;
pub mod queue;
pub mod redis;
pub mod storage;
