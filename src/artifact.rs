//! Compiled contract artifacts.
//!
//! Artifacts are produced by an external compiler run. Both the Hardhat
//! layout (`artifacts/contracts/X.sol/X.json` with a hex string bytecode) and
//! the Foundry layout (`out/X.sol/X.json` with a `{ "object": .. }` bytecode)
//! are understood.

use std::fmt;
use std::path::{Path, PathBuf};

use ethers::abi::token::{LenientTokenizer, Tokenizer};
use ethers::abi::{Abi, Token};
use ethers::types::Bytes;
use eyre::Context;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::error::DeployError;
use crate::serde_utils;

/// Hardhat keeps compiler inputs and outputs here, never a contract artifact
const BUILD_INFO_DIR: &str = "build-info";

#[derive(Debug, Clone)]
pub struct ContractArtifact {
    pub name: String,
    pub abi: Abi,
    pub bytecode: Bytes,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArtifact {
    #[serde(default)]
    contract_name: Option<String>,
    abi: Abi,
    bytecode: RawBytecode,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawBytecode {
    Hex(Bytes),
    Object { object: Bytes },
}

impl From<RawBytecode> for Bytes {
    fn from(value: RawBytecode) -> Self {
        match value {
            RawBytecode::Hex(bytes) => bytes,
            RawBytecode::Object { object } => object,
        }
    }
}

impl ContractArtifact {
    /// Loads an artifact file. Without a `contractName` field the file stem
    /// is used as the contract name.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, DeployError> {
        let path = path.as_ref();

        let raw: RawArtifact = serde_utils::read_deserialize(path)
            .await
            .with_context(|| {
                format!("Loading contract artifact {}", path.display())
            })?;

        let name = raw
            .contract_name
            .or_else(|| {
                path.file_stem()
                    .and_then(|stem| stem.to_str())
                    .map(ToString::to_string)
            })
            .unwrap_or_default();

        Ok(Self {
            name,
            abi: raw.abi,
            bytecode: raw.bytecode.into(),
        })
    }

    /// Bytecode followed by the ABI encoded constructor arguments.
    ///
    /// Arguments are parsed leniently against the constructor's declared
    /// inputs, so `1000`, `0xabc..` or `true` are all accepted where the
    /// types allow it.
    pub fn creation_code(&self, args: &[String]) -> Result<Bytes, DeployError> {
        if self.bytecode.is_empty() {
            return Err(DeployError::configuration(format!(
                "{} has no bytecode, it is probably abstract or an interface",
                self.name
            )));
        }

        let Some(constructor) = self.abi.constructor() else {
            if !args.is_empty() {
                return Err(DeployError::configuration(format!(
                    "{} takes no constructor arguments but {} were given",
                    self.name,
                    args.len()
                )));
            }

            return Ok(self.bytecode.clone());
        };

        if constructor.inputs.len() != args.len() {
            return Err(DeployError::configuration(format!(
                "{} expects {} constructor arguments but {} were given",
                self.name,
                constructor.inputs.len(),
                args.len()
            )));
        }

        let tokens = constructor
            .inputs
            .iter()
            .zip(args)
            .map(|(param, value)| {
                LenientTokenizer::tokenize(&param.kind, value).map_err(|err| {
                    DeployError::configuration(format!(
                        "Constructor argument {} ({}) of {}: {err}",
                        param.name, param.kind, self.name
                    ))
                })
            })
            .collect::<Result<Vec<Token>, _>>()?;

        let code = constructor
            .encode_input(self.bytecode.to_vec(), &tokens)
            .map_err(|err| {
                DeployError::configuration(format!(
                    "Encoding constructor arguments of {}: {err}",
                    self.name
                ))
            })?;

        Ok(code.into())
    }
}

impl fmt::Display for ContractArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} bytes)", self.name, self.bytecode.len())
    }
}

/// A directory of compiler output, searched by contract name.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub async fn find(&self, name: &str) -> Result<ContractArtifact, DeployError> {
        let path = self.locate(name).await?;

        debug!(path = %path.display(), "Found artifact");

        ContractArtifact::from_file(path).await
    }

    async fn locate(&self, name: &str) -> Result<PathBuf, DeployError> {
        let file_name = format!("{name}.json");

        let mut matches = Vec::new();
        let mut pending = vec![self.root.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir)
                .await
                .with_context(|| format!("Reading {}", dir.display()))?;

            while let Some(entry) = entries
                .next_entry()
                .await
                .with_context(|| format!("Reading {}", dir.display()))?
            {
                let entry_name = entry.file_name();
                let entry_name = entry_name.to_str().unwrap_or_default();

                let file_type = entry.file_type().await.with_context(|| {
                    format!("Inspecting {}", entry.path().display())
                })?;

                if file_type.is_dir() {
                    if entry_name != BUILD_INFO_DIR {
                        pending.push(entry.path());
                    }
                } else if entry_name == file_name {
                    matches.push(entry.path());
                }
            }
        }

        matches.sort();

        match matches.len() {
            0 => Err(eyre::eyre!(
                "No artifact named {name} under {}, was the contract compiled?",
                self.root.display()
            )
            .into()),
            1 => Ok(matches.remove(0)),
            _ => {
                let candidates = matches
                    .iter()
                    .map(|path| path.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ");

                Err(DeployError::configuration(format!(
                    "Several artifacts are named {name} ({candidates}), pick one with --artifact-path"
                )))
            }
        }
    }
}
