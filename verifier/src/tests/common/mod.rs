use std::path::{Path, PathBuf};

use serde_json::json;

use crate::types::verification::VerificationRequest;

pub(crate) const SOLC_VERSION: &str = "v0.8.26+commit.8a97fa7a";
pub(crate) const ADDRESS: &str = "0x32Be343B94f860124dC4fEe278FDCBD38C102D88";

/// Output of the fake compiler written by [`fake_solc`].
pub(crate) const COMPILED_CREATION: &str = "60806040";
pub(crate) const COMPILED_DEPLOYED: &str = "60016002";

/// Writes an executable `/bin/sh` script into `dir`.
#[cfg(unix)]
pub(crate) fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Installs a solc stand-in for [`SOLC_VERSION`] that ignores its input and
/// prints a fixed compilation of `a.sol:A`.
#[cfg(unix)]
pub(crate) fn fake_solc(cache_dir: &Path) -> PathBuf {
    let output = json!({
        "contracts": {
            "a.sol": {
                "A": {
                    "abi": [{"type": "function", "name": "answer", "inputs": [], "outputs": []}],
                    "evm": {
                        "bytecode": {"object": COMPILED_CREATION},
                        "deployedBytecode": {"object": COMPILED_DEPLOYED}
                    }
                }
            }
        }
    });
    write_script(cache_dir, SOLC_VERSION, &format!("cat > /dev/null\necho '{}'", output))
}

pub(crate) fn metadata() -> String {
    json!({
        "language": "Solidity",
        "sources": {"a.sol": {"content": "contract A { function answer() public {} }"}},
        "settings": {
            "compilationTarget": {"a.sol": "A"},
            "optimizer": {"enabled": false, "runs": 200}
        }
    })
    .to_string()
}

pub(crate) fn verification_request() -> VerificationRequest {
    VerificationRequest {
        address: ADDRESS.to_string(),
        metadata: metadata().into(),
        chain: 1,
        compiler_version: SOLC_VERSION.trim_start_matches('v').to_string(),
    }
}
