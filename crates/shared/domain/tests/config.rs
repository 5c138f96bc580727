use serde_json::json;
use wed_domain::config::{
    ApiConfig, DatabaseConfig, MailConfig, MailTransportKind, ServerConfig,
};
use wed_domain::rsvp::Environment;

#[test]
fn config_defaults_are_sane() {
    let server = ServerConfig::default();
    assert_eq!(server.port, 4583);
    assert!(server.ssl.is_none());

    let db = DatabaseConfig::default();
    assert_eq!(db.url, "mem://");
    assert_eq!(db.namespace, "wedding");
    assert!(db.credentials.is_none());

    let mail = MailConfig::default();
    assert_eq!(mail.transport, MailTransportKind::Log);
    assert_eq!(mail.smtp_username, "apikey");
    assert_eq!(mail.sender_name, "Di and Siyu Wedding");
}

#[test]
fn api_config_deserializes_with_registry_seed() {
    let raw = json!({
        "server": { "address": "::", "port": 8080 },
        "database": { "url": "mem://", "namespace": "n", "database": "d", "credentials": null },
        "mail": { "transport": "smtp", "smtp_host": "relay.local" },
        "registry": {
            "enabled": true,
            "sender_email": "us@example.com",
            "environment": "prod",
            "email_api_key": "secret"
        }
    });

    let cfg: ApiConfig = serde_json::from_value(raw).expect("config deserialize");
    assert_eq!(cfg.server.port, 8080);
    assert_eq!(cfg.database.namespace, "n");
    assert_eq!(cfg.mail.transport, MailTransportKind::Smtp);
    assert_eq!(cfg.mail.smtp_port, 587);

    let registry = cfg.registry.as_ref().expect("registry seed");
    assert!(registry.enabled);
    assert_eq!(registry.environment, Environment::Prod);
}

#[test]
fn empty_config_uses_defaults() {
    let cfg: ApiConfig = serde_json::from_value(json!({})).expect("config deserialize");
    assert!(cfg.registry.is_none());
    assert_eq!(cfg.logging.level, "info");
}

#[test]
fn config_is_copy_on_write() {
    let original = ApiConfig::default();
    let mut changed = original.clone();
    changed.server.port = 9000;

    assert_eq!(original.server.port, 4583);
    assert_eq!(changed.server.port, 9000);
}
