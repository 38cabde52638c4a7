//! Contract metadata as published next to a deployment, and the solc
//! standard-JSON input derived from it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::backend::CompilerBackend;
use super::output::CompileTarget;
use crate::error::{VerifierError, VerifierResult};

/// Outputs requested from the compiler, whatever the metadata asked for.
pub const OUTPUT_SELECTION: [&str; 3] = ["abi", "evm.bytecode", "evm.deployedBytecode"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keccak256: Option<String>,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptimizerSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_optimizer_runs")]
    pub runs: u64,
    /// `details` and anything newer compiler versions add
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

fn default_optimizer_runs() -> u64 {
    200
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilerSettings {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remappings: Vec<String>,
    #[serde(default)]
    pub optimizer: OptimizerSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evm_version: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub libraries: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub compilation_target: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_selection: Option<Value>,
    /// Settings passed through untouched (`viaIR`, `debug`, ...)
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// The metadata document submitted for verification.
#[derive(Debug, Clone, Deserialize)]
pub struct ContractMetadata {
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub sources: BTreeMap<String, SourceFile>,
    #[serde(default)]
    pub settings: CompilerSettings,
    /// Present when the contract was built with the resolc wrapper. An empty
    /// string selects the default `resolc` binary.
    #[serde(default, alias = "reviveVersion", alias = "resolcVersion", alias = "resolc_version")]
    pub revive_version: Option<String>,
}

fn default_language() -> String {
    "Solidity".to_string()
}

/// Canonical compiler request written to the compiler's stdin.
#[derive(Debug, Clone, Serialize)]
pub struct StandardJsonInput {
    pub language: String,
    pub sources: BTreeMap<String, SourceFile>,
    pub settings: CompilerSettings,
}

impl ContractMetadata {
    /// Decodes and validates a metadata document.
    ///
    /// The document must carry at least one source and every source must have
    /// inline content; `compiler`, `version` and `output` are ignored.
    pub fn parse(raw: &str) -> VerifierResult<Self> {
        let metadata: ContractMetadata =
            serde_json::from_str(raw).map_err(|e| VerifierError::InvalidMetadata(e.to_string()))?;

        if metadata.sources.is_empty() {
            return Err(VerifierError::InvalidMetadata("metadata has no sources".to_string()));
        }
        if let Some((path, _)) = metadata.sources.iter().find(|(_, source)| source.content.is_empty()) {
            return Err(VerifierError::InvalidMetadata(format!("source {} has no content", path)));
        }

        Ok(metadata)
    }

    /// The declared `(source, contract)` pair, first entry in path order.
    pub fn compilation_target(&self) -> Option<CompileTarget> {
        self.settings
            .compilation_target
            .iter()
            .next()
            .map(|(source, contract)| CompileTarget { source: source.clone(), contract: contract.clone() })
    }

    pub fn backend(&self) -> CompilerBackend {
        match &self.revive_version {
            Some(tag) => CompilerBackend::Revive { tag: (!tag.is_empty()).then(|| tag.clone()) },
            None => CompilerBackend::Solc,
        }
    }

    pub fn to_standard_json(&self) -> StandardJsonInput {
        let mut settings = self.settings.clone();
        settings.compilation_target.clear();
        settings.libraries = nest_libraries(&settings.libraries);
        settings.output_selection = Some(json!({ "*": { "*": OUTPUT_SELECTION } }));

        StandardJsonInput { language: self.language.clone(), sources: self.sources.clone(), settings }
    }
}

/// Metadata lists libraries as `"path:Name": "0x.."` while standard JSON wants
/// `"path": {"Name": "0x.."}`. Entries that are already nested pass through.
fn nest_libraries(libraries: &BTreeMap<String, Value>) -> BTreeMap<String, Value> {
    let mut nested: BTreeMap<String, Value> = BTreeMap::new();
    for (key, value) in libraries {
        match (value, key.rsplit_once(':')) {
            (Value::String(address), Some((path, name))) => {
                let entry = nested.entry(path.to_string()).or_insert_with(|| json!({}));
                if let Value::Object(map) = entry {
                    map.insert(name.to_string(), Value::String(address.clone()));
                }
            }
            _ => {
                nested.insert(key.clone(), value.clone());
            }
        }
    }
    nested
}
