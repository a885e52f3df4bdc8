use super::*;
use crate::test_utils::arb_messy_string;
use proptest::prelude::*;

type Fields = (String, String, Option<String>, Option<String>);

/// Generates connection settings and secrets for a Config
///
/// `Config` has no `Debug`, so strategies yield the raw fields.
fn arb_fields() -> impl Strategy<Value = Fields> {
    (
        arb_messy_string(),
        arb_messy_string(),
        prop::option::of(arb_messy_string()),
        prop::option::of(arb_messy_string()),
    )
}

fn config_with((database_url, bind_address, identity_secret, stripe_secret_key): Fields) -> Config {
    Config {
        database_url,
        bind_address,
        identity_secret,
        stripe_secret_key,
        ..base_config(None)
    }
}

/// Generates a ConfigUpdate touching the same fields
fn arb_config_update() -> impl Strategy<Value = ConfigUpdate> {
    (
        prop::option::of(arb_messy_string()),
        prop::option::of(arb_messy_string()),
        prop::option::of(arb_messy_string()),
        prop::option::of(arb_messy_string()),
    )
        .prop_map(|(database_url, bind_address, identity_secret, stripe_secret_key)| ConfigUpdate {
            database_url,
            bind_address,
            identity_secret,
            stripe_secret_key,
            ..ConfigUpdate::default()
        })
}

// ============================================================================
// C1: apply_update Algebraic Properties
// ============================================================================

proptest! {
    /// C1.1: Identity: apply_update(default) leaves every field alone
    #[test]
    fn prop_c1_1_identity(fields in arb_fields()) {
        let config = config_with(fields);
        let updated = config.clone().apply_update(ConfigUpdate::default());

        prop_assert_eq!(updated.database_url, config.database_url);
        prop_assert_eq!(updated.bind_address, config.bind_address);
        prop_assert_eq!(updated.identity_secret, config.identity_secret);
        prop_assert_eq!(updated.stripe_secret_key, config.stripe_secret_key);
        prop_assert_eq!(updated.gemini_model, config.gemini_model);
    }

    /// C1.2: A secret set once is never cleared by a later layer that omits it
    #[test]
    fn prop_c1_2_secrets_survive(fields in arb_fields(), secret in arb_messy_string()) {
        let config = config_with(fields);
        let with_secret = config.apply_update(ConfigUpdate {
            identity_secret: Some(secret.clone()),
            ..ConfigUpdate::default()
        });
        let updated = with_secret.apply_update(ConfigUpdate {
            database_url: Some("other.db".to_string()),
            ..ConfigUpdate::default()
        });

        prop_assert_eq!(updated.identity_secret, Some(secret));
        prop_assert_eq!(updated.database_url, "other.db");
    }

    /// C1.3: Last-write-wins: b's Some fields override a's
    #[test]
    fn prop_c1_3_last_write_wins(
        fields in arb_fields(),
        a in arb_config_update(),
        b in arb_config_update(),
    ) {
        let config = config_with(fields);
        let after_ab = config.clone().apply_update(a.clone()).apply_update(b.clone());

        let expected_url = b.database_url.or(a.database_url).unwrap_or(config.database_url);
        let expected_bind = b.bind_address.or(a.bind_address).unwrap_or(config.bind_address);
        let expected_secret = b.identity_secret.or(a.identity_secret).or(config.identity_secret);
        let expected_stripe = b.stripe_secret_key.or(a.stripe_secret_key).or(config.stripe_secret_key);

        prop_assert_eq!(after_ab.database_url, expected_url);
        prop_assert_eq!(after_ab.bind_address, expected_bind);
        prop_assert_eq!(after_ab.identity_secret, expected_secret);
        prop_assert_eq!(after_ab.stripe_secret_key, expected_stripe);
    }
}

// ============================================================================
// C2: config_from_args Mapping
// ============================================================================

proptest! {
    /// C2.1: config_from_args carries the flags over and never sets the CLI-only server_url
    #[test]
    fn prop_c2_1_args_mapping(
        database_url in prop::option::of(arb_messy_string()),
        bind_address in prop::option::of(arb_messy_string()),
        sentry_dsn in prop::option::of(arb_messy_string()),
        debug in any::<bool>(),
    ) {
        let args = CliArgs {
            database_url: database_url.clone(),
            bind_address: bind_address.clone(),
            sentry_dsn: sentry_dsn.clone(),
            debug,
            ..CliArgs::default()
        };

        let update = config_from_args(args);

        prop_assert_eq!(update.database_url, database_url);
        prop_assert_eq!(update.bind_address, bind_address);
        prop_assert_eq!(update.sentry_dsn, sentry_dsn);
        prop_assert_eq!(update.server_url, None);
    }
}
