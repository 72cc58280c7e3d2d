use serde_json::json;
use sitedeck_core::Plan;
use sitedeck_engine::{EngineConfig, ErrorKind, SaveRequest, config::ENV_PUBLIC_URL};
use sitedeck_harness::{TestDeployment, key};

#[test]
fn sites_keep_separate_documents() -> Result<(), Box<dyn std::error::Error>> {
    let mut deployment = TestDeployment::new()?;
    let a = deployment.add_site(Plan::Basic)?;
    let b = deployment.add_site(Plan::Pro)?;
    let hero = key("home", "hero");

    deployment.site_mut(a).save_json(&hero, json!({"title": "Bakery A"}))?;
    deployment.site_mut(b).save_json(&hero, json!({"title": "Bakery B"}))?;

    assert_eq!(deployment.site(a).content(&hero)?, Some(json!({"title": "Bakery A"})));
    assert_eq!(deployment.site(b).content(&hero)?, Some(json!({"title": "Bakery B"})));

    Ok(())
}

#[test]
fn token_for_other_site_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let mut deployment = TestDeployment::new()?;
    let a = deployment.add_site(Plan::Basic)?;
    let b = deployment.add_site(Plan::Basic)?;
    let hero = key("home", "hero");
    let token_a = deployment.site(a).token.clone();

    let request = SaveRequest::new(hero.clone()).with_patch(json!({"title": "Intruder"}));
    let err = deployment.site_mut(b).engine.save(&token_a, request).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Auth);
    assert!(deployment.site(b).content(&hero)?.is_none());

    Ok(())
}

#[test]
fn reopen_binds_last_selected_site() -> Result<(), Box<dyn std::error::Error>> {
    let mut deployment = TestDeployment::new()?;
    deployment.add_site(Plan::Basic)?;
    let b = deployment.add_site(Plan::Pro)?;
    let hero = key("home", "hero");
    deployment.site_mut(b).save_json(&hero, json!({"title": "Selected"}))?;

    let engine = deployment.reopen()?;
    assert_eq!(engine.site(), deployment.site(b).engine.site());
    assert_eq!(engine.site().item_limit(), 10);
    let record = engine.load(&hero)?.expect("document of selected site");
    assert_eq!(record.content, json!({"title": "Selected"}));

    // Shared secret: the selected site's token still verifies
    let claims = engine.authorize(&deployment.site(b).token)?;
    assert_eq!(claims.site_id, engine.site().site_id);

    Ok(())
}

#[test]
fn open_without_selection_is_not_found() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let config = EngineConfig {
        database_path: Some(dir.path().join("empty.db")),
        ..EngineConfig::default()
    };
    let err = sitedeck_engine::Engine::open(config).err().expect("no site selected");
    assert_eq!(err.kind(), ErrorKind::NotFound);

    Ok(())
}

#[test]
fn config_file_and_env_overrides() -> Result<(), Box<dyn std::error::Error>> {
    let deployment = TestDeployment::new()?;
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("sitedeck.toml");
    let on_disk = EngineConfig {
        public_base_url: "https://file.example.com".into(),
        ..deployment.config().clone()
    };
    on_disk.write(&path)?;

    let mut loaded = EngineConfig::from_toml_str(&std::fs::read_to_string(&path)?)?;
    assert_eq!(loaded, on_disk);
    loaded.apply_overrides(|name| (name == ENV_PUBLIC_URL).then(|| "https://cdn.example.com/".to_string()))?;
    assert_eq!(loaded.public_base_url, "https://cdn.example.com/");
    assert_eq!(loaded.database_path, on_disk.database_path);

    Ok(())
}

#[test]
fn public_url_comes_from_config() -> Result<(), Box<dyn std::error::Error>> {
    let mut deployment = TestDeployment::new()?;
    let a = deployment.add_site(Plan::Basic)?;
    let record = deployment.site_mut(a).save_with_uploads(
        &key("home", "hero"),
        None,
        vec![("img", "image/avif", vec![1, 2, 3])],
    )?;
    let url = record.content["img"].as_str().unwrap_or_default();
    assert!(url.starts_with("http://localhost:8080/blobs/"));
    assert!(url.ends_with(".avif"));

    Ok(())
}
