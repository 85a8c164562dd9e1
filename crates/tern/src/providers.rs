pub mod configs;
pub mod openai;
