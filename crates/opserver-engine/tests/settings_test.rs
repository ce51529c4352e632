use opserver_engine::settings::{PlayerSettings, SettingsError};
use serde_json::json;

#[test]
fn test_partial_update_keeps_other_sections() {
    let mut settings = PlayerSettings::from_value(json!({
        "crosshair": {"style": 4, "size": 2, "color": "cyan"},
        "sensitivity": 1.1,
        "launch_options": "-novid -high"
    }))
    .unwrap();

    settings
        .apply(&json!({
            "crosshair": {"size": 1.5, "color": null},
            "viewmodel": {"fov": 68}
        }))
        .unwrap();

    assert_eq!(
        settings.to_value(),
        json!({
            "crosshair": {"style": 4, "size": 1.5},
            "sensitivity": 1.1,
            "launch_options": "-novid -high",
            "viewmodel": {"fov": 68}
        })
    );
    assert_eq!(settings.section("viewmodel"), Some(&json!({"fov": 68})));
}

#[test]
fn test_null_document_starts_empty() {
    let settings = PlayerSettings::from_value(json!(null)).unwrap();
    assert_eq!(settings.to_value(), json!({}));
}

#[test]
fn test_non_object_document_rejected() {
    assert_eq!(
        PlayerSettings::from_value(json!("cfg")),
        Err(SettingsError::NotAnObject("a string"))
    );
}

#[test]
fn test_removing_last_key_leaves_empty_section() {
    let mut settings = PlayerSettings::from_value(json!({"binds": {"mouse4": "+voice"}})).unwrap();
    settings.apply(&json!({"binds": {"mouse4": null}})).unwrap();
    assert_eq!(settings.section("binds"), Some(&json!({})));
}
