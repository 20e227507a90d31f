use rx_order_engine::{
    db_types::{DrugInfo, Shop},
    test_utils::prepare_env::{fresh_database, seed_shop},
    traits::{DrugCatalog, OrderStoreError, ShopManagement},
};

#[tokio::test]
async fn logged_in_flag_controls_polling_set() {
    let db = fresh_database().await;
    seed_shop(&db, "S1", 1, true).await;
    seed_shop(&db, "S2", 1, false).await;
    seed_shop(&db, "S3", 2, true).await;

    let ids = |shops: Vec<Shop>| shops.into_iter().map(|s| s.id).collect::<Vec<_>>();
    assert_eq!(ids(db.fetch_logged_in_shops().await.unwrap()), vec!["S1", "S3"]);

    db.set_logged_in("S2", true).await.unwrap();
    db.set_logged_in("S3", false).await.unwrap();
    assert_eq!(ids(db.fetch_logged_in_shops().await.unwrap()), vec!["S1", "S2"]);

    let err = db.set_logged_in("nope", true).await.unwrap_err();
    assert!(matches!(err, OrderStoreError::ShopNotFound(s) if s == "nope"));
}

#[tokio::test]
async fn shops_and_credentials() {
    let db = fresh_database().await;
    seed_shop(&db, "S1", 4, true).await;
    let shop = db.fetch_shop("S1").await.unwrap().unwrap();
    assert_eq!(shop.corporation_id, 4);
    assert_eq!(shop.ext_id, "ext-S1");
    assert!(db.fetch_shop("S2").await.unwrap().is_none());

    let creds = db.fetch_corporation_credentials(4).await.unwrap().unwrap();
    assert_eq!(creds.login, "corp-4");
    assert_eq!(creds.secret.reveal(), "secret-4");
    assert!(db.fetch_corporation_credentials(5).await.unwrap().is_none());

    let orphan = Shop { id: "S9".into(), ext_id: "ext-S9".into(), corporation_id: 99, logged_in: true };
    let err = db.upsert_shop(orphan).await.unwrap_err();
    assert!(matches!(err, OrderStoreError::CorporationNotFound(99)));
}

#[tokio::test]
async fn drug_catalogue() {
    let db = fresh_database().await;
    assert!(db.drug_info("D1").await.unwrap().is_none());
    db.upsert_drug("D1", DrugInfo { name: "Aspirin".into(), link: None }).await.unwrap();
    db.upsert_drug("D1", DrugInfo { name: "Aspirin 500".into(), link: Some("https://drugs.example/D1".into()) })
        .await
        .unwrap();
    let info = db.drug_info("D1").await.unwrap().unwrap();
    assert_eq!(info.name, "Aspirin 500");
    assert_eq!(info.link.as_deref(), Some("https://drugs.example/D1"));
}
