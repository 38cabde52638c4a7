use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::error::CompilerError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BytecodeObject {
    #[serde(default)]
    pub object: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvmArtifact {
    #[serde(default)]
    pub bytecode: BytecodeObject,
    #[serde(default)]
    pub deployed_bytecode: BytecodeObject,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContractArtifact {
    #[serde(default)]
    pub abi: Vec<Value>,
    #[serde(default)]
    pub evm: EvmArtifact,
}

impl ContractArtifact {
    pub fn creation_bytecode(&self) -> &str {
        &self.evm.bytecode.object
    }

    pub fn deployed_bytecode(&self) -> &str {
        &self.evm.deployed_bytecode.object
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub formatted_message: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl Diagnostic {
    pub fn is_error(&self) -> bool {
        self.severity.eq_ignore_ascii_case("error")
    }
}

/// Raw standard-JSON output, contracts keyed by source path then contract name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompilerOutput {
    #[serde(default)]
    pub contracts: BTreeMap<String, BTreeMap<String, ContractArtifact>>,
    #[serde(default)]
    pub errors: Vec<Diagnostic>,
    /// Reported by the resolc wrapper only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revive_version: Option<String>,
}

/// The `(source file, contract name)` pair selected as the contract of interest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileTarget {
    pub source: String,
    pub contract: String,
}

impl CompileTarget {
    fn is_empty(&self) -> bool {
        self.source.is_empty() || self.contract.is_empty()
    }
}

impl fmt::Display for CompileTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source, self.contract)
    }
}

impl CompilerOutput {
    pub fn artifact(&self, target: &CompileTarget) -> Option<&ContractArtifact> {
        self.contracts.get(&target.source).and_then(|contracts| contracts.get(&target.contract))
    }

    /// Picks the contract of interest.
    ///
    /// The declared target wins when it names an artifact present in the output.
    /// Otherwise the first contract with deployed bytecode is taken, scanning
    /// source paths then contract names in lexicographic order.
    pub fn resolve_target(&self, declared: Option<CompileTarget>) -> Result<CompileTarget, CompilerError> {
        if let Some(target) = declared.filter(|target| !target.is_empty()) {
            if self.artifact(&target).is_some() {
                return Ok(target);
            }
            warn!(target = %target, "Declared compilation target missing from compiler output, scanning contracts");
        }

        let fallback = self.contracts.iter().find_map(|(source, contracts)| {
            contracts.iter().find(|(_, artifact)| !artifact.deployed_bytecode().is_empty()).map(|(contract, _)| {
                CompileTarget { source: source.clone(), contract: contract.clone() }
            })
        });

        match fallback {
            Some(target) => {
                debug!(target = %target, "Resolved compilation target by scanning output");
                Ok(target)
            }
            None => {
                let errors: Vec<String> = self
                    .errors
                    .iter()
                    .filter(|diagnostic| diagnostic.is_error())
                    .map(|diagnostic| {
                        diagnostic.formatted_message.clone().unwrap_or_else(|| diagnostic.message.clone())
                    })
                    .collect();
                if errors.is_empty() {
                    Err(CompilerError::TargetNotFound)
                } else {
                    Err(CompilerError::Diagnostics(errors))
                }
            }
        }
    }
}

/// The artifact of the resolved target and, for the resolc wrapper, the
/// toolchain version that produced it. The version reported in the compiler
/// output takes precedence over the tag the binary was selected by.
#[derive(Debug, Clone)]
pub struct CompilationOutput {
    pub target: CompileTarget,
    pub artifact: ContractArtifact,
    pub revive_version: Option<String>,
}

impl CompilationOutput {
    pub fn new(
        mut output: CompilerOutput,
        declared: Option<CompileTarget>,
        revive_version: Option<String>,
    ) -> Result<Self, CompilerError> {
        let target = output.resolve_target(declared)?;
        let revive_version = output.revive_version.take().or(revive_version);
        let artifact = output
            .contracts
            .get_mut(&target.source)
            .and_then(|contracts| contracts.remove(&target.contract))
            .ok_or(CompilerError::TargetNotFound)?;
        Ok(Self { target, artifact, revive_version })
    }

    pub fn creation_bytecode(&self) -> &str {
        self.artifact.creation_bytecode()
    }

    pub fn deployed_bytecode(&self) -> &str {
        self.artifact.deployed_bytecode()
    }
}
