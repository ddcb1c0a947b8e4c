//! Text analysis, audit, semantic matching and scoring

pub mod text_processor;
pub mod features;
pub mod audit;
pub mod skills;
pub mod embeddings;
pub mod embedding_manager;
pub mod similarity;
pub mod aggregator;
pub mod engine;

#[cfg(test)]
pub(crate) mod testing;
