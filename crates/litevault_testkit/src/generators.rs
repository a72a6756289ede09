//! Property-based test generators.

use litevault_core::{EncryptionMode, UpgradeStatement};
use proptest::prelude::*;

/// Generates plausible database names: short alphanumeric identifiers.
pub fn database_name() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9_]{0,15}"
}

/// Generates schema versions in the valid range.
pub fn schema_version() -> impl Strategy<Value = u32> {
    1u32..=20
}

/// Generates any encryption mode.
pub fn encryption_mode() -> impl Strategy<Value = EncryptionMode> {
    prop_oneof![
        Just(EncryptionMode::NoEncryption),
        Just(EncryptionMode::Encryption),
        Just(EncryptionMode::Secret),
        Just(EncryptionMode::NewSecret),
        Just(EncryptionMode::WrongSecret),
    ]
}

/// Generates an upgrade plan: strictly ascending target versions starting
/// above 1, each with at least one statement.
pub fn upgrade_plan() -> impl Strategy<Value = Vec<UpgradeStatement>> {
    proptest::collection::btree_set(2u32..=12, 0..5).prop_map(|versions| {
        versions
            .into_iter()
            .map(|to_version| {
                UpgradeStatement::new(
                    to_version,
                    vec![format!("CREATE TABLE rev{to_version} (id INTEGER)")],
                )
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn generated_names_are_valid_arguments(name in database_name()) {
            prop_assert!(!name.trim().is_empty());
        }

        #[test]
        fn generated_plans_are_strictly_ascending(plan in upgrade_plan()) {
            let versions: Vec<u32> = plan.iter().map(|u| u.to_version).collect();
            let mut sorted = versions.clone();
            sorted.sort_unstable();
            sorted.dedup();
            prop_assert_eq!(versions, sorted);
        }
    }
}
