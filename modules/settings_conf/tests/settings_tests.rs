//! Integration tests for settings overrides, deletion and notifications

use serde_json::json;
use settings_conf::testing::TestSuite;
use settings_conf::{
    keys, settings, ChangeKind, DeprecationPolicy, OverrideSettings, Settings, SettingsApi,
    SettingsError, SettingsMap,
};

mod common;
use common::{failing_on, fresh_settings, map, print_test_header, Recorder};

fn not_found(name: &str) -> Result<serde_json::Value, SettingsError> {
    Err(SettingsError::NotFound {
        name: name.to_string(),
    })
}

// ===== Override semantics =====

#[test]
fn test_override() {
    print_test_header(
        "test_override",
        &["An override scope shows its value and restores the old one on exit."],
    );
    let settings = fresh_settings();
    settings.set("TEST", json!("test")).unwrap();
    assert_eq!(settings.get("TEST").unwrap(), json!("test"));

    {
        let _scope = OverrideSettings::new()
            .set("TEST", json!("override"))
            .apply(&settings)
            .unwrap();
        assert_eq!(settings.get("TEST").unwrap(), json!("override"));
    }

    assert_eq!(settings.get("TEST").unwrap(), json!("test"));
    settings.delete("TEST").unwrap();
}

#[test]
fn test_override_change() {
    print_test_header(
        "test_override_change",
        &["Mutating an overridden setting inside the scope does not survive it."],
    );
    let settings = fresh_settings();
    settings.set("TEST", json!("test")).unwrap();

    {
        let _scope = OverrideSettings::new()
            .set("TEST", json!("override"))
            .apply(&settings)
            .unwrap();
        assert_eq!(settings.get("TEST").unwrap(), json!("override"));
        settings.set("TEST", json!("test2")).unwrap();
    }

    assert_eq!(settings.get("TEST").unwrap(), json!("test"));
}

#[test]
fn test_override_doesnt_leak() {
    print_test_header(
        "test_override_doesnt_leak",
        &["A setting absent before the scope is absent after it."],
    );
    let settings = fresh_settings();
    assert_eq!(settings.get("TEST"), not_found("TEST"));

    {
        let _scope = OverrideSettings::new()
            .set("TEST", json!("override"))
            .apply(&settings)
            .unwrap();
        assert_eq!(settings.get("TEST").unwrap(), json!("override"));
        settings.set("TEST", json!("test")).unwrap();
    }

    assert_eq!(settings.get("TEST"), not_found("TEST"));
}

#[test]
fn test_decorator() {
    let settings = fresh_settings();
    let value = OverrideSettings::new()
        .set("TEST", json!("override"))
        .run(&settings, || settings.get("TEST"))
        .unwrap()
        .unwrap();
    assert_eq!(value, json!("override"));
    assert_eq!(settings.get("TEST"), not_found("TEST"));
}

#[test]
fn test_context_manager() {
    print_test_header(
        "test_context_manager",
        &["Building an override does nothing until it is enabled."],
    );
    let settings = fresh_settings();
    assert_eq!(settings.get("TEST"), not_found("TEST"));

    let overrides = OverrideSettings::new().set("TEST", json!("override"));
    assert_eq!(settings.get("TEST"), not_found("TEST"));

    overrides.enable(&settings).unwrap();
    assert_eq!(settings.get("TEST").unwrap(), json!("override"));
    overrides.disable(&settings).unwrap();
    assert_eq!(settings.get("TEST"), not_found("TEST"));
}

#[test]
fn test_class_decorator() {
    print_test_header(
        "test_class_decorator",
        &["Decorating a constructor overrides settings only while it runs."],
    );
    struct SettingGetter {
        test: serde_json::Value,
    }
    let settings = fresh_settings();
    let new_getter = |_: ()| SettingGetter {
        test: settings.get_or("TEST", json!("undefined")).unwrap(),
    };

    assert_eq!(new_getter(()).test, json!("undefined"));
    let decorated = OverrideSettings::new()
        .set("TEST", json!("override"))
        .decorate(&settings, new_getter);
    assert_eq!(decorated(()).unwrap().test, json!("override"));
    assert_eq!(settings.get("TEST"), not_found("TEST"));
}

#[test]
fn test_fully_decorated_suite() {
    print_test_header(
        "test_fully_decorated_suite",
        &[
            "Suite-level overrides wrap every test case.",
            "Case-level overrides nest inside and win.",
        ],
    );
    let settings = fresh_settings();
    let suite = TestSuite::new("FullyDecoratedTestCase")
        .with_overrides(OverrideSettings::new().set("TEST", json!("override")))
        .case("test_override", |s: &dyn SettingsApi| {
            anyhow::ensure!(s.get("TEST")? == json!("override"));
            Ok(())
        })
        .case_with(
            "test_method_override",
            OverrideSettings::new().set("TEST", json!("override2")),
            |s: &dyn SettingsApi| {
                anyhow::ensure!(s.get("TEST")? == json!("override2"));
                Ok(())
            },
        );

    let report = suite.run(&settings);
    assert!(report.is_success(), "{:?}", report.failed);
    assert_eq!(report.passed.len(), 2);
    assert_eq!(settings.get("TEST"), not_found("TEST"));
}

#[test]
fn test_nested_overrides_restore_in_reverse_order() {
    let settings = fresh_settings();
    settings.set("A", json!(0)).unwrap();

    let outer = OverrideSettings::new()
        .set("A", json!(1))
        .set("B", json!("outer"))
        .apply(&settings)
        .unwrap();
    let inner = OverrideSettings::new()
        .set("A", json!(2))
        .apply(&settings)
        .unwrap();
    assert_eq!(settings.get("A").unwrap(), json!(2));
    assert_eq!(settings.get("B").unwrap(), json!("outer"));

    inner.finish().unwrap();
    assert_eq!(settings.get("A").unwrap(), json!(1));
    assert_eq!(settings.get("B").unwrap(), json!("outer"));

    outer.finish().unwrap();
    assert_eq!(settings.get("A").unwrap(), json!(0));
    assert_eq!(settings.get("B"), not_found("B"));
}

#[test]
fn test_override_restored_after_panic() {
    let settings = fresh_settings();
    settings.set("TEST", json!("test")).unwrap();

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let _scope = OverrideSettings::new()
            .set("TEST", json!("override"))
            .apply(&settings)
            .unwrap();
        settings.delete("TEST").unwrap();
        panic!("body failed");
    }));

    assert!(result.is_err());
    assert_eq!(settings.get("TEST").unwrap(), json!("test"));
    assert_eq!(settings.override_depth().unwrap(), 0);
}

// ===== Change notifications =====

#[test]
fn test_signal_callback_context_manager() {
    let settings = fresh_settings();
    let recorder = Recorder::new();
    settings.connect(Some("TEST"), recorder.listener());

    assert_eq!(settings.get("TEST"), not_found("TEST"));
    {
        let _scope = OverrideSettings::new()
            .set("TEST", json!("override"))
            .apply(&settings)
            .unwrap();
        assert_eq!(recorder.last_value(), Some(json!("override")));
    }
}

#[test]
fn test_signal_callback_decorator() {
    let settings = fresh_settings();
    let recorder = Recorder::new();
    settings.connect(Some("TEST"), recorder.listener());

    OverrideSettings::new()
        .set("TEST", json!("override"))
        .run(&settings, || {
            assert_eq!(recorder.last_value(), Some(json!("override")));
        })
        .unwrap();
}

#[test]
fn test_one_notification_per_mutation() {
    print_test_header(
        "test_one_notification_per_mutation",
        &["set, delete, enable and disable each notify exactly once."],
    );
    let settings = fresh_settings();
    let recorder = Recorder::new();
    settings.connect(Some("TEST"), recorder.listener());

    settings.set("TEST", json!("test")).unwrap();
    OverrideSettings::new()
        .set("TEST", json!("override"))
        .set("OTHER", json!(1))
        .run(&settings, || ())
        .unwrap();
    settings.delete("TEST").unwrap();

    let seen: Vec<(ChangeKind, Option<serde_json::Value>)> = recorder
        .events()
        .into_iter()
        .map(|e| {
            assert_eq!(e.setting, "TEST");
            (e.kind, e.value)
        })
        .collect();
    assert_eq!(
        seen,
        vec![
            (ChangeKind::Set, Some(json!("test"))),
            (ChangeKind::OverrideEnabled, Some(json!("override"))),
            (ChangeKind::OverrideDisabled, Some(json!("test"))),
            (ChangeKind::Deleted, None),
        ]
    );
}

#[test]
fn test_disable_notification_for_previously_absent_setting() {
    let settings = fresh_settings();
    let recorder = Recorder::new();
    settings.connect(None, recorder.listener());

    let overrides = OverrideSettings::new().set("TEST", json!("override"));
    overrides.enable(&settings).unwrap();
    overrides.disable(&settings).unwrap();

    let events = recorder.events();
    assert_eq!(events.len(), 2);
    assert!(events[0].enter());
    assert!(!events[1].enter());
    assert_eq!(events[1].value, None);
}

#[test]
fn test_listener_error_propagates_after_mutation() {
    let settings = fresh_settings();
    settings.connect(
        Some("TEST"),
        std::sync::Arc::new(|_: &settings_conf::SettingChanged| -> anyhow::Result<()> {
            anyhow::bail!("listener exploded")
        }),
    );

    let result = settings.set("TEST", json!("test"));
    assert!(matches!(result, Err(SettingsError::Listener { .. })));
    // The mutation itself happened
    assert_eq!(settings.get("TEST").unwrap(), json!("test"));

    // A failing enable leaves no frame behind
    let result = OverrideSettings::new()
        .set("TEST", json!("override"))
        .enable(&settings);
    assert!(matches!(result, Err(SettingsError::Listener { .. })));
    assert_eq!(settings.override_depth().unwrap(), 0);
    assert_eq!(settings.get("TEST").unwrap(), json!("test"));
}

#[test]
fn test_listener_error_on_delete_after_removal() {
    let settings = fresh_settings();
    settings.set("TEST", json!("test")).unwrap();
    settings.connect(Some("TEST"), failing_on(ChangeKind::Deleted));

    match settings.delete("TEST") {
        Err(SettingsError::Listener { setting, .. }) => assert_eq!(setting, "TEST"),
        other => panic!("expected listener error, got {:?}", other),
    }
    assert_eq!(settings.get("TEST"), not_found("TEST"));
    assert_eq!(
        settings.delete("TEST"),
        Err(SettingsError::NotFound {
            name: "TEST".to_string()
        })
    );
}

#[test]
fn test_listener_error_on_end_override_after_restoration() {
    print_test_header(
        "test_listener_error_on_end_override_after_restoration",
        &[
            "A listener failing on disable surfaces its error,",
            "but every key is already restored and the frame is gone.",
        ],
    );
    let settings = fresh_settings();
    settings.set("TEST", json!("test")).unwrap();
    let recorder = Recorder::new();
    settings.connect(None, failing_on(ChangeKind::OverrideDisabled));
    settings.connect(None, recorder.listener());

    settings
        .begin_override(&map(&[("TEST", json!("override")), ("NEW", json!("x"))]))
        .unwrap();
    recorder.clear();

    let result = settings.end_override();
    assert!(matches!(result, Err(SettingsError::Listener { .. })));
    assert_eq!(settings.get("TEST").unwrap(), json!("test"));
    assert_eq!(settings.get("NEW"), not_found("NEW"));
    assert_eq!(settings.override_depth().unwrap(), 0);

    // Other listeners still saw every restored key
    let mut restored: Vec<_> = recorder
        .events()
        .into_iter()
        .map(|e| (e.setting, e.value))
        .collect();
    restored.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(
        restored,
        vec![
            ("NEW".to_string(), None),
            ("TEST".to_string(), Some(json!("test"))),
        ]
    );
}

#[test]
fn test_listener_error_on_guard_exit_after_restoration() {
    let settings = fresh_settings();
    settings.set("TEST", json!("test")).unwrap();
    settings.connect(Some("TEST"), failing_on(ChangeKind::OverrideDisabled));
    let overrides = OverrideSettings::new().set("TEST", json!("override"));

    // Explicit exit reports the error
    let guard = overrides.apply(&settings).unwrap();
    assert_eq!(settings.get("TEST").unwrap(), json!("override"));
    assert!(matches!(guard.finish(), Err(SettingsError::Listener { .. })));
    assert_eq!(settings.get("TEST").unwrap(), json!("test"));
    assert_eq!(settings.override_depth().unwrap(), 0);

    // Dropping logs the error and still restores
    {
        let _guard = overrides.apply(&settings).unwrap();
        assert_eq!(settings.get("TEST").unwrap(), json!("override"));
    }
    assert_eq!(settings.get("TEST").unwrap(), json!("test"));
    assert_eq!(settings.override_depth().unwrap(), 0);

    // The function form returns the exit error instead of the body's value
    let result = overrides.run(&settings, || settings.get("TEST"));
    assert!(matches!(result, Err(SettingsError::Listener { .. })));
    assert_eq!(settings.get("TEST").unwrap(), json!("test"));
}

// ===== Regression tests: deleting settings =====

#[test]
fn test_settings_delete() {
    let settings = fresh_settings();
    settings.set("TEST", json!("test")).unwrap();
    assert_eq!(settings.get("TEST").unwrap(), json!("test"));
    settings.delete("TEST").unwrap();
    assert_eq!(settings.get("TEST"), not_found("TEST"));
}

#[test]
fn test_settings_delete_wrapped() {
    let settings = fresh_settings();
    let before = settings.snapshot();
    assert_eq!(
        settings.delete("_wrapped"),
        Err(SettingsError::Protected {
            name: "_wrapped".to_string()
        })
    );
    assert_eq!(settings.snapshot(), before);
}

// ===== Typed access =====

#[test]
fn test_typed_keys() {
    let settings = fresh_settings();
    assert!(!settings.get_typed(keys::DEBUG).unwrap());
    assert_eq!(settings.get_typed(keys::MEDIA_URL).unwrap(), "");
    assert_eq!(settings.get_typed(keys::STATIC_URL).unwrap(), None);

    settings.set("DEBUG", json!("not a bool")).unwrap();
    assert!(matches!(
        settings.get_typed(keys::DEBUG),
        Err(SettingsError::Validation { .. })
    ));
}

// ===== Global proxy =====

#[test]
fn test_global_settings_proxy() {
    print_test_header(
        "test_global_settings_proxy",
        &["The process-wide proxy supports the same override protocol."],
    );
    // Only this test touches the global proxy in this binary
    match settings().configure(None, SettingsMap::new()) {
        Ok(_) | Err(SettingsError::AlreadyConfigured) => {}
        Err(e) => panic!("unexpected configure error: {}", e),
    }

    let recorder = Recorder::new();
    settings().connect(Some("GLOBAL_TEST"), recorder.listener());

    assert!(!settings().contains("GLOBAL_TEST").unwrap());
    OverrideSettings::new()
        .set("GLOBAL_TEST", json!("override"))
        .run(settings(), || {
            assert_eq!(settings().get("GLOBAL_TEST").unwrap(), json!("override"));
        })
        .unwrap();
    assert!(!settings().contains("GLOBAL_TEST").unwrap());
    assert_eq!(recorder.events().len(), 2);

    assert!(matches!(
        settings().delete("_wrapped"),
        Err(SettingsError::Protected { .. })
    ));
}

// ===== Trailing slash URL checks =====

fn strict_settings() -> Settings {
    Settings::builder()
        .values(settings_conf::domain::global_settings::defaults())
        .deprecation(DeprecationPolicy::Error)
        .build()
        .unwrap()
}

#[test]
fn test_media_url_blank() {
    // If blank, no deprecation is raised even though it doesn't end in a slash
    let settings = strict_settings();
    settings.set("MEDIA_URL", json!("")).unwrap();
    assert_eq!(settings.get("MEDIA_URL").unwrap(), json!(""));
}

#[test]
fn test_media_url_end_slash() {
    let settings = strict_settings();
    settings.set("MEDIA_URL", json!("/foo/")).unwrap();
    assert_eq!(settings.get("MEDIA_URL").unwrap(), json!("/foo/"));

    settings.set("MEDIA_URL", json!("http://media.foo.com/")).unwrap();
    assert_eq!(settings.get("MEDIA_URL").unwrap(), json!("http://media.foo.com/"));
}

#[test]
fn test_media_url_no_end_slash() {
    let settings = strict_settings();
    let original = settings.get("MEDIA_URL").unwrap();

    for url in ["/foo", "http://media.foo.com"] {
        assert_eq!(
            settings.set("MEDIA_URL", json!(url)),
            Err(SettingsError::Deprecation {
                setting: "MEDIA_URL".to_string(),
                message: "If set, MEDIA_URL must end with a slash".to_string(),
            })
        );
        assert_eq!(settings.get("MEDIA_URL").unwrap(), original);
    }
}

#[test]
fn test_media_url_no_end_slash_only_warns_by_default() {
    let settings = fresh_settings();
    settings.set("MEDIA_URL", json!("/foo")).unwrap();
    assert_eq!(settings.get("MEDIA_URL").unwrap(), json!("/foo"));
}

#[test]
fn test_media_url_double_slash() {
    // More than one trailing slash is kept as given
    let settings = strict_settings();
    settings.set("MEDIA_URL", json!("/stupid//")).unwrap();
    assert_eq!(settings.get("MEDIA_URL").unwrap(), json!("/stupid//"));

    settings
        .set("MEDIA_URL", json!("http://media.foo.com/stupid//"))
        .unwrap();
    assert_eq!(
        settings.get("MEDIA_URL").unwrap(),
        json!("http://media.foo.com/stupid//")
    );
}

#[test]
fn test_media_url_checked_in_overrides() {
    let settings = strict_settings();
    let result = settings.begin_override(&map(&[("MEDIA_URL", json!("/foo"))]));
    assert!(matches!(result, Err(SettingsError::Deprecation { .. })));
    assert_eq!(settings.override_depth().unwrap(), 0);
}
