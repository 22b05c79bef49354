//! Loads annotated GenBank genomes into a document store.
//!
//! Each record becomes one genome document, one feature document per `gene`/`CDS` span and
//! an optional chunked sequence. Genomes whose GI is already stored are skipped.

pub mod config;
pub mod counter;
pub mod domain;
pub mod error;
pub mod features;
pub mod genbank;
pub mod genome;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod qualifiers;
pub mod sequence;
pub mod store;
