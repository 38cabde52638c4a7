//! Bytecode comparison between a compiled contract and the code deployed on chain.
//!
//! All functions work on hex strings. Offsets are hex character offsets, so a
//! 20-byte library address spans 40 characters.

use std::collections::BTreeMap;

use regex::{NoExpand, Regex};
use tracing::{debug, info};

use super::client::chain::ChainClient;
use super::compiler::CompilationOutput;
use crate::error::VerifierResult;
use crate::types::verification::VerificationStatus;
use crate::utils::hex::trim_hex;

/// Every unresolved library reference starts with this marker.
pub const PLACEHOLDER_PREFIX: &str = "__$";
/// Hex characters taken by a placeholder, the width of an address.
pub const PLACEHOLDER_LEN: usize = 40;

#[derive(Debug, thiserror::Error)]
pub enum BytecodeError {
    #[error("library placeholder {placeholder} at offset {offset} is beyond the end of the on-chain bytecode ({len} hex chars)")]
    PlaceholderOutOfRange { placeholder: String, offset: usize, len: usize },

    #[error("on-chain bytes {found} at offset {offset} are not a library address for placeholder {placeholder}")]
    InvalidLibraryAddress { placeholder: String, offset: usize, found: String },

    #[error("library placeholder at offset {offset} is truncated")]
    TruncatedPlaceholder { offset: usize },

    #[error("invalid placeholder pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Placeholder token to the 40 hex chars found at its offset in the real bytecode.
pub type LibraryPlaceholderMap = BTreeMap<String, String>;

/// Outcome of a comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub status: VerificationStatus,
    /// `0x` prefixed ABI-encoded constructor arguments, when recovered
    pub constructor_args: Option<String>,
}

impl MatchResult {
    fn new(status: VerificationStatus) -> Self {
        Self { status, constructor_args: None }
    }
}

/// Identifies the deployment being verified.
#[derive(Debug, Clone)]
pub struct ComparisonContext {
    pub chain_id: u64,
    pub address: String,
}

/// Builds the placeholder map of `template` from the bytes of `actual` at the
/// same offsets. The first occurrence of a placeholder decides its address.
pub fn collect_library_placeholders(template: &str, actual: &str) -> Result<LibraryPlaceholderMap, BytecodeError> {
    let mut placeholders = LibraryPlaceholderMap::new();
    let mut cursor = 0;

    while let Some(found) = template.get(cursor..).and_then(|rest| rest.find(PLACEHOLDER_PREFIX)) {
        let offset = cursor + found;
        let end = offset + PLACEHOLDER_LEN;
        let placeholder = template.get(offset..end).ok_or(BytecodeError::TruncatedPlaceholder { offset })?;

        if !placeholders.contains_key(placeholder) {
            let address = actual.get(offset..end).ok_or_else(|| BytecodeError::PlaceholderOutOfRange {
                placeholder: placeholder.to_string(),
                offset,
                len: actual.len(),
            })?;
            // The substitute must itself be an address, otherwise linking could reintroduce a placeholder.
            if hex::decode(address).is_err() {
                return Err(BytecodeError::InvalidLibraryAddress {
                    placeholder: placeholder.to_string(),
                    offset,
                    found: address.to_string(),
                });
            }
            debug!(placeholder = %placeholder, offset, address = %address, "Resolved library placeholder");
            placeholders.insert(placeholder.to_string(), address.to_string());
        }

        cursor = end;
    }

    Ok(placeholders)
}

/// Replaces every library placeholder of `template` with the address found at
/// the same offset in `actual`. Both strings must use the same hex prefix convention.
pub fn link_libraries(template: &str, actual: &str) -> Result<String, BytecodeError> {
    let placeholders = collect_library_placeholders(template, actual)?;

    let mut linked = template.to_string();
    for (placeholder, address) in &placeholders {
        let pattern = Regex::new(&regex::escape(placeholder))?;
        linked = pattern.replace_all(&linked, NoExpand(address)).into_owned();
    }

    Ok(linked)
}

/// Removes the compiler metadata trailer.
///
/// The last 2 bytes hold the trailer length N as a big-endian integer, the
/// trailer spans N bytes plus those 2. Input that is too short, or whose length
/// field is not hex or points before the start, is returned unchanged.
pub fn strip_metadata(code: &str) -> &str {
    if code.len() < 6 {
        return code;
    }

    let Some(length_field) = code.get(code.len() - 4..) else {
        return code;
    };
    let mut length = [0u8; 2];
    if hex::decode_to_slice(length_field, &mut length).is_err() {
        return code;
    }

    let trailer = usize::from(u16::from_be_bytes(length)) * 2 + 4;
    if trailer > code.len() {
        return code;
    }

    code.get(..code.len() - trailer).unwrap_or(code)
}

/// Everything after the first occurrence of `compiled` in `creation_input`,
/// `0x` prefixed. Empty when nothing follows or `compiled` does not occur.
pub fn extract_encoded_constructor_args(creation_input: &str, compiled: &str) -> String {
    if compiled.is_empty() {
        return String::new();
    }

    match creation_input.find(compiled) {
        Some(start) => match creation_input.get(start + compiled.len()..) {
            Some(rest) if !rest.is_empty() => format!("0x{}", rest),
            _ => String::new(),
        },
        None => String::new(),
    }
}

fn normalize(code: &str) -> String {
    trim_hex(code.trim()).to_ascii_lowercase()
}

/// Classifies the on-chain code against the compiled contract.
///
/// Tiers are tried in order: exact match of the linked deployed bytecode,
/// match once metadata trailers are stripped, and, when the stripped codes only
/// differ in content, a prefix match of the linked creation bytecode against
/// the creation transaction input, which also yields the constructor arguments.
pub async fn compare(
    on_chain: &str,
    compiled: &CompilationOutput,
    context: &ComparisonContext,
    chain_client: &dyn ChainClient,
) -> VerifierResult<MatchResult> {
    let on_chain = normalize(on_chain);
    let linked = link_libraries(&normalize(compiled.deployed_bytecode()), &on_chain)?;

    if linked == on_chain {
        info!("Deployed bytecode matches exactly");
        return Ok(MatchResult::new(VerificationStatus::Perfect));
    }

    let stripped_linked = strip_metadata(&linked);
    let stripped_on_chain = strip_metadata(&on_chain);
    if stripped_linked == stripped_on_chain {
        info!("Deployed bytecode matches without metadata");
        return Ok(MatchResult::new(VerificationStatus::Partial));
    }

    if stripped_linked.len() != stripped_on_chain.len() {
        debug!(
            compiled_len = stripped_linked.len(),
            on_chain_len = stripped_on_chain.len(),
            "Deployed bytecode length differs"
        );
        return Ok(MatchResult::new(VerificationStatus::Mismatch));
    }

    // Same length, different content: immutables or constructor-dependent code. Decide on the creation input.
    let creation_template = normalize(compiled.creation_bytecode());
    if creation_template.is_empty() {
        return Ok(MatchResult::new(VerificationStatus::Mismatch));
    }

    debug!("Deployed bytecode differs at equal length, checking creation input");
    let creation_input = normalize(&chain_client.fetch_creation_bytecode(context.chain_id, &context.address).await?);
    let linked_creation = link_libraries(&creation_template, &creation_input)?;

    if creation_input.starts_with(&linked_creation) {
        let args = extract_encoded_constructor_args(&creation_input, &linked_creation);
        info!(constructor_args_len = args.len(), "Creation bytecode matches");
        return Ok(MatchResult {
            status: VerificationStatus::Perfect,
            constructor_args: (!args.is_empty()).then_some(args),
        });
    }

    Ok(MatchResult::new(VerificationStatus::Mismatch))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use rstest::rstest;

    use super::*;
    use crate::core::client::chain::{ChainClientError, MockChainClient};
    use crate::core::compiler::output::{BytecodeObject, ContractArtifact, EvmArtifact};
    use crate::core::compiler::CompileTarget;
    use crate::error::VerifierError;

    const ADDRESS: &str = "0x32be343b94f860124dc4fee278fdcbd38c102d88";
    const ARG: &str = "000000000000000000000000000000000000000000000000000000000000002a";
    const LIBRARY: &str = "7d8b5b4e2e4b5b2d0b9a0a4d1c3b2a1908070605";

    const PLACEHOLDER: &str = "__$5e9ae8d5c1a2b3c4d5e6f7a8b9c0d1e2f3$__";

    /// `ipfs` + `solc` CBOR trailer, 51 bytes plus the length field.
    fn trailer(hash_byte: &str) -> String {
        format!("a2646970667358221220{}64736f6c63430008110033", hash_byte.repeat(32))
    }

    fn compiled(creation: &str, deployed: &str) -> CompilationOutput {
        CompilationOutput {
            target: CompileTarget { source: "a.sol".into(), contract: "A".into() },
            artifact: ContractArtifact {
                abi: vec![],
                evm: EvmArtifact {
                    bytecode: BytecodeObject { object: creation.to_string() },
                    deployed_bytecode: BytecodeObject { object: deployed.to_string() },
                },
            },
            revive_version: None,
        }
    }

    fn context() -> ComparisonContext {
        ComparisonContext { chain_id: 1, address: ADDRESS.to_string() }
    }

    fn idle_chain() -> MockChainClient {
        let mut chain = MockChainClient::new();
        chain.expect_fetch_creation_bytecode().never();
        chain
    }

    #[test]
    fn placeholder_has_address_width() {
        assert_eq!(PLACEHOLDER.len(), PLACEHOLDER_LEN);
    }

    #[rstest]
    #[case::short("ab")]
    #[case::empty("")]
    #[case::five_chars("00033")]
    #[case::trailer_longer_than_input("60800033")]
    #[case::length_field_not_hex("6080604052zz")]
    fn strip_metadata_leaves_input_unchanged(#[case] code: &str) {
        assert_eq!(strip_metadata(code), code);
    }

    #[test]
    fn strip_metadata_removes_trailer() {
        let code = format!("6080604052{}", trailer("11"));
        assert_eq!(strip_metadata(&code), "6080604052");
    }

    #[test]
    fn strip_metadata_accepts_empty_trailer() {
        assert_eq!(strip_metadata("6080600000"), "608060");
    }

    #[test]
    fn link_replaces_placeholder_with_bytes_at_same_offset() {
        let template = format!("6080{}60aa{}00", PLACEHOLDER, PLACEHOLDER);
        let actual = format!("6080{}60aa{}00", LIBRARY, LIBRARY);

        let linked = link_libraries(&template, &actual).unwrap();

        assert_eq!(&linked[4..44], &actual[4..44]);
        assert!(!linked.contains(PLACEHOLDER_PREFIX));
        assert_eq!(linked, actual);
    }

    #[test]
    fn link_resolves_each_placeholder_independently() {
        let other = "__$0123456789abcdef0123456789abcdef01$__";
        let template = format!("{}{}", PLACEHOLDER, other);
        let actual = format!("{}{}", LIBRARY, "1111111111111111111111111111111111111111");

        let placeholders = collect_library_placeholders(&template, &actual).unwrap();

        assert_eq!(placeholders.len(), 2);
        assert_eq!(placeholders[other], "1111111111111111111111111111111111111111");
        assert_eq!(link_libraries(&template, &actual).unwrap(), actual);
    }

    #[test]
    fn link_without_placeholders_is_identity() {
        assert_eq!(link_libraries("60806040", "").unwrap(), "60806040");
    }

    #[test]
    fn link_fails_when_on_chain_code_is_too_short() {
        let template = format!("6080{}", PLACEHOLDER);
        assert_matches!(
            link_libraries(&template, "6080aabb"),
            Err(BytecodeError::PlaceholderOutOfRange { offset: 4, len: 8, .. })
        );
    }

    #[test]
    fn link_rejects_non_address_replacement() {
        let template = format!("6080{}", PLACEHOLDER);
        let actual = format!("6080{}", PLACEHOLDER);
        assert_matches!(link_libraries(&template, &actual), Err(BytecodeError::InvalidLibraryAddress { .. }));
    }

    #[test]
    fn link_rejects_truncated_placeholder() {
        assert_matches!(
            link_libraries("6080__$5e9a", "6080aabbccddee"),
            Err(BytecodeError::TruncatedPlaceholder { offset: 4 })
        );
    }

    #[rstest]
    #[case("deadbeefCAFE", "deadbeef", "0xCAFE")]
    #[case("deadbeef", "deadbeef", "")]
    #[case("00deadbeef01", "deadbeef", "0x01")]
    #[case("cafe", "deadbeef", "")]
    #[case("cafe", "", "")]
    fn constructor_args_follow_compiled_code(#[case] input: &str, #[case] compiled: &str, #[case] expected: &str) {
        assert_eq!(extract_encoded_constructor_args(input, compiled), expected);
    }

    #[tokio::test]
    async fn identical_bytecode_is_perfect() {
        let deployed = format!("6080604052{}", trailer("11"));
        let result = compare(&format!("0x{}", deployed), &compiled("", &deployed), &context(), &idle_chain())
            .await
            .unwrap();

        assert_eq!(result, MatchResult { status: VerificationStatus::Perfect, constructor_args: None });
    }

    #[tokio::test]
    async fn prefix_and_case_differences_are_ignored() {
        let deployed = "6080604052ABCDEF";
        let result = compare("0x6080604052abcdef", &compiled("", &format!("0x{}", deployed)), &context(), &idle_chain())
            .await
            .unwrap();

        assert_eq!(result.status, VerificationStatus::Perfect);
    }

    #[tokio::test]
    async fn linked_libraries_are_perfect() {
        let template = format!("6080{}6000{}", PLACEHOLDER, trailer("11"));
        let on_chain = format!("6080{}6000{}", LIBRARY, trailer("11"));

        let result = compare(&on_chain, &compiled("", &template), &context(), &idle_chain()).await.unwrap();

        assert_eq!(result.status, VerificationStatus::Perfect);
    }

    #[tokio::test]
    async fn metadata_only_difference_is_partial() {
        let compiled_code = format!("6080604052{}", trailer("11"));
        let on_chain = format!("6080604052{}", trailer("22"));

        let result = compare(&on_chain, &compiled("", &compiled_code), &context(), &idle_chain()).await.unwrap();

        assert_eq!(result, MatchResult { status: VerificationStatus::Partial, constructor_args: None });
    }

    #[tokio::test]
    async fn different_length_is_mismatch_without_fetching() {
        let result = compare("60806040526000", &compiled("", "6080604052"), &context(), &idle_chain()).await.unwrap();
        assert_eq!(result.status, VerificationStatus::Mismatch);
    }

    #[tokio::test]
    async fn equal_length_difference_is_settled_by_creation_input() {
        let creation = "608060405234801561001057600080fd5b50";
        let mut chain = MockChainClient::new();
        chain
            .expect_fetch_creation_bytecode()
            .withf(|chain_id, address| *chain_id == 1 && address.eq_ignore_ascii_case(ADDRESS))
            .times(1)
            .returning(move |_, _| Ok(format!("0x{}{}", creation, ARG)));

        let output = compiled(creation, "6080604052aaaa");
        let result = compare("6080604052ffff", &output, &context(), &chain).await.unwrap();

        assert_eq!(result.status, VerificationStatus::Perfect);
        assert_eq!(
            result.constructor_args.as_deref(),
            Some(format!("0x{}", ARG).as_str())
        );
    }

    #[tokio::test]
    async fn equal_length_difference_with_foreign_creation_input_is_mismatch() {
        let mut chain = MockChainClient::new();
        chain.expect_fetch_creation_bytecode().times(1).returning(|_, _| Ok("0x6080aaaa".to_string()));

        let output = compiled("60806040", "6080604052aaaa");
        let result = compare("6080604052ffff", &output, &context(), &chain).await.unwrap();

        assert_eq!(result.status, VerificationStatus::Mismatch);
    }

    #[tokio::test]
    async fn creation_fetch_failure_is_surfaced() {
        let mut chain = MockChainClient::new();
        chain
            .expect_fetch_creation_bytecode()
            .returning(|chain_id, _| Err(ChainClientError::Indexer { chain_id, message: "Record Not Found".into() }));

        let result = compare("6080604052ffff", &compiled("60806040", "6080604052aaaa"), &context(), &chain).await;

        assert_matches!(result, Err(VerifierError::ChainClientError(ChainClientError::Indexer { .. })));
    }

    #[tokio::test]
    async fn short_on_chain_code_with_placeholder_fails() {
        let template = format!("6080{}", PLACEHOLDER);
        let result = compare("0x6080", &compiled("", &template), &context(), &idle_chain()).await;
        assert_matches!(result, Err(VerifierError::BytecodeError(BytecodeError::PlaceholderOutOfRange { .. })));
    }
}
