//! Core data types shared by the builder, the catlas loader, and the search engine.
//!
//! - [`NodeId`], [`KmerHash`], [`Label`]: plain integer identifiers
//! - [`LabelSet`]: ordered set of contig/genome labels with a union operation
//! - [`Sketch`]: bottom-k MinHash sketch used to estimate Jaccard similarity
//!
//! [`NodeId`]: types::NodeId
//! [`KmerHash`]: types::KmerHash
//! [`Label`]: types::Label
//! [`LabelSet`]: types::LabelSet
//! [`Sketch`]: sketch::Sketch

pub mod sketch;
pub mod types;
