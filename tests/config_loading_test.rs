//! Configuration loading against the shipped config directory.

use fcm_dispatch::config::{AttributeResolver, ConfigManager};
use fcm_dispatch::messaging::{AndroidConfig, Priority};
use std::path::PathBuf;
use std::time::Duration;

fn shipped_config_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config")
}

#[test]
fn base_configuration_resolves_service_attributes() {
    let manager =
        ConfigManager::load_from_directory_with_env(Some(shipped_config_dir()), "development")
            .unwrap();
    let resolver = manager.attribute_resolver();

    assert_eq!(manager.config().service_name, "Push.Service.FcmPushService");
    assert!(manager.config().reconcile_transient_failures);
    assert_eq!(
        resolver.get_attribute("DeleteToken").unwrap(),
        "Push.Service.TokenStore"
    );
    assert!(resolver.get_attribute("OK").unwrap().starts_with("https://"));

    let platform = AndroidConfig::resolve(&resolver);
    assert_eq!(platform.priority, Priority::Normal);
    assert_eq!(platform.time_to_live, Duration::from_secs(28 * 24 * 60 * 60));
}

#[test]
fn environment_override_replaces_platform_settings() {
    let manager =
        ConfigManager::load_from_directory_with_env(Some(shipped_config_dir()), "test").unwrap();
    let platform = AndroidConfig::resolve(&manager.attribute_resolver());

    assert_eq!(manager.environment(), "test");
    assert_eq!(platform.priority, Priority::High);
    assert_eq!(platform.time_to_live, Duration::from_secs(24 * 60 * 60));
    assert_eq!(
        manager.attribute_resolver().get_attribute("DeleteToken").unwrap(),
        "Push.Service.TokenStore"
    );
}
