//! Model directory layout.
//!
//! A model directory holds a HuggingFace-style checkpoint:
//! `config.json`, `tokenizer.json`, and either a single `model.safetensors`,
//! a sharded set listed in `model.safetensors.index.json`, or any
//! `*.safetensors` files.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use llama_engine::{LlamaError, Result};
use serde::Deserialize;

const CONFIG_FILE: &str = "config.json";
const TOKENIZER_FILE: &str = "tokenizer.json";
const SINGLE_WEIGHTS: &str = "model.safetensors";
const SHARD_INDEX: &str = "model.safetensors.index.json";

/// Resolved paths of a checkpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelFiles {
    pub config: PathBuf,
    pub tokenizer: PathBuf,
    pub weights: Vec<PathBuf>,
}

#[derive(Deserialize)]
struct ShardIndex {
    weight_map: HashMap<String, String>,
}

impl ModelFiles {
    pub fn discover(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(LlamaError::ModelLoad(format!(
                "model directory not found: {}",
                dir.display()
            )));
        }

        let config = require(dir, CONFIG_FILE)?;
        let tokenizer = require(dir, TOKENIZER_FILE)?;
        let weights = weight_files(dir)?;

        Ok(Self {
            config,
            tokenizer,
            weights,
        })
    }
}

fn require(dir: &Path, name: &str) -> Result<PathBuf> {
    let path = dir.join(name);
    if path.is_file() {
        Ok(path)
    } else {
        Err(LlamaError::ModelLoad(format!(
            "missing {name} in {}",
            dir.display()
        )))
    }
}

fn weight_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let index_path = dir.join(SHARD_INDEX);
    if index_path.is_file() {
        let raw = std::fs::read(&index_path)
            .map_err(|e| LlamaError::ModelLoad(format!("{}: {e}", index_path.display())))?;
        let index: ShardIndex = serde_json::from_slice(&raw)
            .map_err(|e| LlamaError::ModelLoad(format!("{}: {e}", index_path.display())))?;
        let shards: BTreeSet<&String> = index.weight_map.values().collect();
        return Ok(shards.into_iter().map(|s| dir.join(s)).collect());
    }

    let single = dir.join(SINGLE_WEIGHTS);
    if single.is_file() {
        return Ok(vec![single]);
    }

    let entries = std::fs::read_dir(dir)
        .map_err(|e| LlamaError::ModelLoad(format!("{}: {e}", dir.display())))?;
    let mut found: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "safetensors"))
        .collect();
    found.sort();

    if found.is_empty() {
        return Err(LlamaError::ModelLoad(format!(
            "no .safetensors weights in {}",
            dir.display()
        )));
    }
    Ok(found)
}
