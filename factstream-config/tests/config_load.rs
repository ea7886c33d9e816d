use factstream_common::LlmConfig;
use factstream_config::FactsConfigLoader;
use serial_test::serial;
use std::{fs, path::PathBuf};
use tempfile::TempDir;

/// Helper to write a YAML file in a temp dir and return its path.
fn write_yaml(tmp: &TempDir, name: &str, yaml: &str) -> PathBuf {
    let p = tmp.path().join(name);
    fs::write(&p, yaml).expect("write yaml");
    p
}

#[test]
#[serial]
fn file_values_expand_env_placeholders() {
    let tmp = TempDir::new().unwrap();
    let file_yaml = r#"
version: "1"
provider:
  api_key: "${FS_TEST_PROVIDER_KEY}"
  base_url: "https://api.perplexity.ai"
  model: "sonar-pro"
  retries: 1
search:
  tavily_api_key: "tvly-from-file"
logging:
  format: json
  emit_stderr: true
"#;
    let p = write_yaml(&tmp, "factstream.yaml", file_yaml);

    let config = temp_env::with_var("FS_TEST_PROVIDER_KEY", Some("pplx-file"), || {
        FactsConfigLoader::new().with_file(&p).load()
    })
    .expect("load config");

    assert_eq!(config.version.as_deref(), Some("1"));
    assert_eq!(config.provider.api_key.as_deref(), Some("pplx-file"));
    assert_eq!(config.provider.retries, 1);
    assert!(config.search.any_configured());
    assert!(config.logging.emit_stderr);

    match config.llm_config() {
        LlmConfig::ChatCompletions { api_key, model, .. } => {
            assert_eq!(api_key.as_deref(), Some("pplx-file"));
            assert_eq!(model, "sonar-pro");
        }
        LlmConfig::None => panic!("expected chat completions config"),
    }
}

#[test]
#[serial]
fn environment_overrides_file() {
    let tmp = TempDir::new().unwrap();
    let p = write_yaml(
        &tmp,
        "factstream.yaml",
        "provider:\n  model: \"from-file\"\n  request_timeout_secs: 10\n",
    );

    let config = temp_env::with_vars(
        [
            ("FACTSTREAM__PROVIDER__MODEL", Some("from-env")),
            ("FACTSTREAM__PROVIDER__RETRIES", Some("3")),
        ],
        || FactsConfigLoader::new().with_file(&p).load(),
    )
    .expect("load config");

    assert_eq!(config.provider.model, "from-env");
    assert_eq!(config.provider.retries, 3);
    assert_eq!(config.provider.request_timeout_secs, Some(10));
}

#[test]
#[serial]
fn optional_file_may_be_missing() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("absent.yaml");

    let config = FactsConfigLoader::new()
        .with_optional_file(&missing)
        .load()
        .expect("missing optional file is fine");

    assert_eq!(config.provider.base_url, "https://api.perplexity.ai");
    assert!(config.provider.request_timeout().is_none());
}

#[test]
#[serial]
fn required_file_must_exist() {
    let tmp = TempDir::new().unwrap();
    let result = FactsConfigLoader::new()
        .with_file(tmp.path().join("absent.yaml"))
        .load();
    assert!(result.is_err());
}
