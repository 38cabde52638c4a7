use std::sync::Arc;

use tracing::{debug, error, info, instrument};

use crate::core::bytecode::{self, ComparisonContext};
use crate::core::compiler::ContractMetadata;
use crate::core::config::Config;
use crate::error::{VerifierError, VerifierResult};
use crate::types::verification::{
    normalize_compiler_version, VerificationOutcome, VerificationRequest, VerificationStatus, VerifiedContract,
};
use crate::utils::hex::{add_hex, is_valid_address, trim_hex};

pub struct VerificationService;

impl VerificationService {
    /// Checks that the code deployed at `request.address` was compiled from the
    /// submitted metadata.
    ///
    /// Steps run in order and the first failure ends the verification: request
    /// validation, compiler download, on-chain code fetch, metadata parsing,
    /// compilation and bytecode comparison.
    #[instrument(
        skip_all,
        fields(chain_id = request.chain, address = %request.address, metadata_len = tracing::field::Empty)
    )]
    pub async fn verify(request: VerificationRequest, config: Arc<Config>) -> VerifierResult<VerificationOutcome> {
        let metadata_text = request.metadata_text()?;
        tracing::Span::current().record("metadata_len", metadata_text.len());
        if request.address.trim().is_empty()
            || metadata_text.trim().is_empty()
            || request.compiler_version.trim().is_empty()
            || request.chain < 0
        {
            return Err(VerifierError::InvalidRequest(
                "address, metadata and compilerVersion are required and chain must not be negative".to_string(),
            ));
        }
        if !is_valid_address(&request.address) {
            return Err(VerifierError::InvalidAddress);
        }

        let address = add_hex(&request.address);
        let chain_id = u64::try_from(request.chain)
            .map_err(|_| VerifierError::InvalidRequest(format!("invalid chain id {}", request.chain)))?;
        let version = normalize_compiler_version(&request.compiler_version);

        config.compiler_cache().ensure_version(&version).await?;

        let on_chain = config.chain_client().fetch_deployed_bytecode(chain_id, &address).await?;
        if trim_hex(on_chain.trim()).is_empty() {
            return Err(VerifierError::BytecodeNotFound);
        }
        debug!(code_len = on_chain.len(), "Fetched deployed bytecode");

        let metadata = ContractMetadata::parse(&metadata_text)?;

        info!(version = %version, "Start compiling contract");
        let compiled = config.recompiler().recompile(&metadata, &version).await.inspect_err(|e| {
            error!(version = %version, error = %e, "Compiling contract failed");
        })?;

        let context = ComparisonContext { chain_id, address };
        let result = bytecode::compare(&on_chain, &compiled, &context, config.chain_client()).await?;
        info!(status = %result.status, target = %compiled.target, "Verification finished");

        if result.status == VerificationStatus::Mismatch {
            return Ok(VerificationOutcome::Mismatch);
        }

        Ok(VerificationOutcome::Verified(VerifiedContract {
            status: result.status,
            creation_bytecode_length: compiled.creation_bytecode().len(),
            abi: compiled.artifact.abi,
            revive_version: compiled.revive_version,
            constructor_args: result.constructor_args,
        }))
    }
}
