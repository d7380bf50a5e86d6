use pf_config::{ConfigMap, load, save_yaml};

#[test]
fn load_by_extension() {
    let temp_dir = std::env::temp_dir().join("pf_config_test_load");
    let _ = std::fs::remove_dir_all(&temp_dir);
    std::fs::create_dir_all(&temp_dir).unwrap();

    let cfg_path = temp_dir.join("battery.cfg");
    std::fs::write(&cfg_path, "type:ModelBasedPrognoser\nmodel:Battery\n").unwrap();
    let from_cfg = load(&cfg_path).unwrap();
    assert_eq!(from_cfg.first("model").unwrap(), "Battery");

    let json_path = temp_dir.join("battery.json");
    std::fs::write(&json_path, r#"{"model": "Battery", "Predictor.numSamples": 10}"#).unwrap();
    let from_json = load(&json_path).unwrap();
    assert_eq!(from_json.get_usize("Predictor.numSamples").unwrap(), 10);
}

#[test]
fn yaml_save_and_reload() {
    let temp_dir = std::env::temp_dir().join("pf_config_test_yaml");
    let _ = std::fs::remove_dir_all(&temp_dir);
    std::fs::create_dir_all(&temp_dir).unwrap();

    let mut config = ConfigMap::new();
    config.set("type", "Empty");
    config.set_list("inTags", ["power:p1", "voltage:v1"]);

    let path = temp_dir.join("prognoser.yaml");
    save_yaml(&path, &config).unwrap();
    let loaded = load(&path).unwrap();
    assert_eq!(loaded, config);
}
