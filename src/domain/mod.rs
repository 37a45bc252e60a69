//! Core domain types and logic.

pub mod catalogue;
pub mod error;
pub mod executor;
pub mod indicator;
pub mod interpreter;
pub mod market_data;
pub mod query;
pub mod rules;
pub mod settings;
pub mod tokenizer;
pub mod vocabulary;
