use ethers::types::Address;
use ethers::utils::to_checksum;

/// Parse `input` as an account address.
///
/// Accepts `0x` followed by 40 hex digits. An all-lowercase or all-uppercase
/// body is taken as-is; a mixed-case body must carry a valid EIP-55 checksum.
/// This is a format check only, nothing is asked of the chain.
pub fn parse_address(input: &str) -> Option<Address> {
    let body = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))?;
    if body.len() != 40 || !body.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let bytes = hex::decode(body).ok()?;
    let address = Address::from_slice(&bytes);

    let has_lower = body.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = body.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper && to_checksum(&address, None)[2..] != *body {
        return None;
    }

    Some(address)
}

/// EIP-55 rendering used in every reply.
pub fn checksummed(address: &Address) -> String {
    to_checksum(address, None)
}
