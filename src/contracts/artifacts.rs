//! Compiled contract artifacts.
//!
//! # Responsibilities
//! - Run the configured compile command before deploying
//! - Locate Hardhat (`<dir>/contracts/X.sol/X.json`) or Foundry
//!   (`<dir>/X.sol/X.json`) artifacts
//! - Encode constructor parameters against the artifact's ABI
//! - Find the build-info needed for source verification

use alloy::dyn_abi::{DynSolType, DynSolValue, Specifier};
use alloy::json_abi::JsonAbi;
use alloy::primitives::Bytes;
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::process::Command;

use crate::config::ArtifactsConfig;

/// Errors while compiling, loading or encoding against artifacts.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("compile command failed: {0}")]
    Compile(String),

    #[error("artifact for contract '{0}' not found")]
    NotFound(String),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid bytecode in artifact '{0}'")]
    Bytecode(String),

    #[error("constructor of '{contract}' takes {expected} arguments, {actual} given")]
    Arity {
        contract: String,
        expected: usize,
        actual: usize,
    },

    #[error("constructor argument '{name}': {reason}")]
    Argument { name: String, reason: String },

    #[error("build info for '{0}' not found")]
    BuildInfo(String),
}

pub type ArtifactResult<T> = Result<T, ArtifactError>;

/// Bytecode is a plain hex string in Hardhat output and `{ object }` in Foundry output.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawBytecode {
    Hex(String),
    Object { object: String },
}

impl RawBytecode {
    fn hex(&self) -> &str {
        match self {
            RawBytecode::Hex(hex) => hex,
            RawBytecode::Object { object } => object,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArtifact {
    abi: JsonAbi,
    bytecode: RawBytecode,
    #[serde(default)]
    source_name: Option<String>,
}

/// A loaded contract artifact.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub name: String,
    pub abi: JsonAbi,
    pub bytecode: Bytes,
    /// Source path used for the fully qualified name, e.g. `contracts/Ballot.sol`.
    pub source_name: String,
    path: PathBuf,
}

/// Compiler input needed by the verification service.
#[derive(Debug, Clone)]
pub struct BuildInfo {
    /// Full compiler version, e.g. `0.8.24+commit.e11b9ed9`.
    pub solc_long_version: String,
    /// Standard JSON input, serialized.
    pub input: String,
}

impl Artifact {
    /// Fully qualified contract name, e.g. `contracts/Ballot.sol:Ballot`.
    pub fn qualified_name(&self) -> String {
        format!("{}:{}", self.source_name, self.name)
    }

    /// ABI-encode constructor arguments given in order.
    pub fn encode_constructor_args(&self, params: &[Value]) -> ArtifactResult<Bytes> {
        let inputs = self
            .abi
            .constructor
            .as_ref()
            .map(|c| c.inputs.as_slice())
            .unwrap_or_default();

        if inputs.len() != params.len() {
            return Err(ArtifactError::Arity {
                contract: self.name.clone(),
                expected: inputs.len(),
                actual: params.len(),
            });
        }

        let mut values = Vec::with_capacity(params.len());
        for (input, param) in inputs.iter().zip(params) {
            let argument_error = |reason: String| ArtifactError::Argument {
                name: input.name.clone(),
                reason,
            };
            let ty: DynSolType = input.resolve().map_err(|e| argument_error(e.to_string()))?;
            let raw = match param {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            let value = ty.coerce_str(&raw).map_err(|e| argument_error(e.to_string()))?;
            values.push(value);
        }

        if values.is_empty() {
            return Ok(Bytes::new());
        }
        Ok(DynSolValue::Tuple(values).abi_encode_params().into())
    }

    /// Contract creation code: bytecode followed by encoded constructor arguments.
    pub fn init_code(&self, constructor_args: &Bytes) -> Bytes {
        let mut code = self.bytecode.to_vec();
        code.extend_from_slice(constructor_args);
        code.into()
    }

    /// Load the Hardhat build-info referenced by `<Name>.dbg.json`.
    pub fn build_info(&self) -> ArtifactResult<BuildInfo> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct DebugFile {
            build_info: String,
        }

        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct RawBuildInfo {
            solc_long_version: String,
            input: Value,
        }

        let dbg_path = self.path.with_extension("dbg.json");
        if !dbg_path.exists() {
            return Err(ArtifactError::BuildInfo(self.name.clone()));
        }
        let debug: DebugFile = read_json(&dbg_path)?;

        let dir = dbg_path.parent().unwrap_or(Path::new("."));
        let build_info: RawBuildInfo = read_json(&dir.join(debug.build_info))?;

        Ok(BuildInfo {
            solc_long_version: build_info.solc_long_version,
            input: build_info.input.to_string(),
        })
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> ArtifactResult<T> {
    let content = std::fs::read_to_string(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ArtifactError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Access to the compiled artifacts of a contracts project.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
    compile_command: Vec<String>,
}

impl ArtifactStore {
    pub fn new(config: &ArtifactsConfig) -> Self {
        Self {
            root: PathBuf::from(&config.dir),
            compile_command: config.compile_command.clone(),
        }
    }

    /// Run the compile command, if one is configured.
    pub async fn compile(&self) -> ArtifactResult<()> {
        let Some((program, args)) = self.compile_command.split_first() else {
            tracing::debug!("No compile command configured, using existing artifacts");
            return Ok(());
        };

        tracing::info!(command = %self.compile_command.join(" "), "Compiling contracts");
        let output = Command::new(program)
            .args(args)
            .output()
            .await
            .map_err(|e| ArtifactError::Compile(format!("{}: {}", program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ArtifactError::Compile(format!(
                "{} exited with {}: {}",
                program,
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }

    /// Load the artifact for `name`.
    pub fn load(&self, name: &str) -> ArtifactResult<Artifact> {
        let file = format!("{}.json", name);
        let candidates = [
            self.root.join("contracts").join(format!("{}.sol", name)).join(&file),
            self.root.join(format!("{}.sol", name)).join(&file),
        ];
        let path = candidates
            .into_iter()
            .find(|p| p.exists())
            .ok_or_else(|| ArtifactError::NotFound(name.to_string()))?;

        let raw: RawArtifact = read_json(&path)?;
        let bytecode: Bytes = raw
            .bytecode
            .hex()
            .parse()
            .map_err(|_| ArtifactError::Bytecode(name.to_string()))?;
        if bytecode.is_empty() {
            return Err(ArtifactError::Bytecode(name.to_string()));
        }

        tracing::debug!(contract = name, path = %path.display(), "Artifact loaded");
        Ok(Artifact {
            name: name.to_string(),
            abi: raw.abi,
            bytecode,
            source_name: raw
                .source_name
                .unwrap_or_else(|| format!("contracts/{}.sol", name)),
            path,
        })
    }
}
