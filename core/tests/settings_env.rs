//! Layered settings loading from a config directory plus the environment.
//!
//! Lives in its own test binary: it sets process environment variables, and
//! no other test may observe them.

use std::fs;

use fakerest_core::Settings;

#[test]
fn environment_overrides_profile_and_base_files() {
    let dir = std::env::temp_dir().join(format!("fakerest-settings-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join("base.toml"),
        "[api]\nbase_url = \"http://from-file\"\n\n[budgets]\ndefault_ms = 3000\n",
    )
    .unwrap();
    fs::write(dir.join("staging.toml"), "[budgets]\ndefault_ms = 1234\n").unwrap();

    std::env::set_var("FAKEREST_CONFIG_DIR", &dir);
    std::env::set_var("FAKEREST_API__BASE_URL", "http://from-env");
    std::env::set_var("FAKEREST_RETRIES__RUN_MODE", "3");

    let settings = Settings::load_profile("staging").unwrap();
    fs::remove_dir_all(&dir).ok();

    assert_eq!(settings.api.base_url, "http://from-env");
    assert_eq!(settings.budgets.default_ms, 1234);
    assert_eq!(settings.retries.run_mode, 3);
    // Keys no layer sets keep their defaults.
    assert_eq!(settings.budgets.large_dataset_ms, 5000);
}
