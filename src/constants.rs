//! # Service Constants
//!
//! Field names, attribute keys and fixed values shared by the message builder,
//! the dispatch path and token reconciliation.

use std::time::Duration;

/// Identifier this service registers under unless configuration overrides it
pub const DEFAULT_SERVICE_NAME: &str = "Push.Service.FcmPushService";

/// Field names read from each request row
pub mod fields {
    pub const TOKEN: &str = "Token";
    pub const TITLE: &str = "Title";
    pub const BODY: &str = "Body";
    pub const IMAGE_URL: &str = "ImageUrl";
    pub const DATA: &str = "Data";
}

/// Configuration attribute keys consumed by the service
pub mod attributes {
    pub const AES_DECRYPTOR_KEY: &str = "AesDecryptorKey";
    pub const AES_DECRYPTOR_KEY_IV: &str = "AesDecryptorKeyIV";
    pub const GOOGLE_CREDENTIAL: &str = "GoogleCredential";
    pub const ANDROID_PRIORITY: &str = "AndroidConfig.Priority";
    pub const ANDROID_TIME_TO_LIVE: &str = "AndroidConfig.TimeToLive";
    pub const DELETE_TOKEN: &str = "DeleteToken";
}

/// Parameters of the token deletion command
pub mod reconciliation {
    /// Command key used for the synthesized deletion command
    pub const COMMAND_KEY: &str = "1";
    pub const TOKEN_TYPE_PARAM: &str = "TOKEN_TYPE";
    pub const TOKEN_STR_PARAM: &str = "TOKEN_STR";
    /// Tag identifying tokens issued by Firebase Cloud Messaging
    pub const TOKEN_TYPE_FCM: &str = "Firebase.FCM";
}

/// Alias resolved when a row carries no image URL
pub const DEFAULT_IMAGE_ALIAS: &str = "OK";

/// IV used for credential decryption when `AesDecryptorKeyIV` is unset
pub const DEFAULT_CREDENTIAL_IV: &str = "FcmPushService";

/// Shortest key or IV accepted for credential decryption
pub const MIN_CREDENTIAL_KEY_LEN: usize = 5;

/// Message lifetime applied when `AndroidConfig.TimeToLive` is absent or invalid
pub const DEFAULT_TIME_TO_LIVE: Duration = Duration::from_secs(28 * 24 * 60 * 60);

/// Default prefix for environment variable overrides
pub const ENV_PREFIX: &str = "PUSH_SERVICE";
