// src/pipeline/mod.rs

pub mod id_map;
pub mod loaders;
pub mod parse;
pub mod readers;
pub mod translate;
pub mod vocab;
