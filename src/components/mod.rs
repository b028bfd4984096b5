pub mod history;
pub mod masks;
pub mod prompts;
pub mod tools;
