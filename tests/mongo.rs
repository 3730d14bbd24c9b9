//! Runs against a live server when `APPINSPECT_TEST_MONGO_URI` is set; passes
//! trivially otherwise. The URI needs a user allowed to create users and
//! drop databases.

use anyhow::{ensure, Context};
use mongodb::bson::{doc, DateTime, Document};
use mongodb::{Client, Database};
use uuid::Uuid;

use appinspect_db::{provision, verify, MongoBackend, ProvisionError, ResourceKind, StepStatus};
use appinspect_kernel::{ConflictPolicy, Secret, Settings};
use appinspect_provision::bootstrap::build_plan;

const URI_VAR: &str = "APPINSPECT_TEST_MONGO_URI";

fn server_uri() -> Option<String> {
    match std::env::var(URI_VAR) {
        Ok(uri) if !uri.trim().is_empty() => Some(uri),
        _ => {
            eprintln!("{URI_VAR} is not set; skipping live server test");
            None
        }
    }
}

#[tokio::test]
async fn provisions_verifies_and_reruns_against_live_server() -> anyhow::Result<()> {
    let Some(uri) = server_uri() else {
        return Ok(());
    };

    let mut settings = Settings::default();
    settings.database.uri = uri.clone();
    settings.database.name = format!("appinspect_it_{}", Uuid::now_v7().simple());
    settings.app_user.password = Some(Secret::new(Uuid::now_v7().to_string()));

    let client = Client::with_uri_str(&uri)
        .await
        .context("failed to open cleanup client")?;
    let db = client.database(&settings.database.name);

    let outcome = exercise(&settings, &db).await;

    // Users live in admin.system.users and outlive dropDatabase.
    let _ = db
        .run_command(doc! { "dropUser": settings.app_user.name.as_str() })
        .await;
    db.drop().await.context("failed to drop throwaway database")?;
    client.shutdown().await;

    outcome
}

async fn exercise(settings: &Settings, db: &Database) -> anyhow::Result<()> {
    let plan = build_plan(settings)?;
    let backend = MongoBackend::connect(&settings.database).await?;

    let first = provision(&backend, &plan, ConflictPolicy::Fail).await?;
    ensure!(
        first.count(StepStatus::Created) == 9,
        "expected nine creations, got {:?}",
        first.outcomes
    );

    let report = verify(&backend, &plan).await?;
    ensure!(report.is_clean(), "findings: {:?}", report.findings);

    // None of the indexes is unique, so identical documents are accepted.
    let now = DateTime::now();
    let duplicates = [
        ("AppInspectAppEntry", doc! { "Id": "com.example.app" }),
        ("AppInspectTask", doc! { "Created": now, "Action": "query_googleplay" }),
        ("AppInspectFileRecord", doc! { "AppId": "com.example.app", "Created": now }),
        ("AppInspectStoreRecord", doc! { "AppId": "com.example.app", "Retrieved": now }),
    ];
    for (name, document) in duplicates {
        let collection = db.collection::<Document>(name);
        collection.insert_one(&document).await?;
        collection.insert_one(&document).await?;
        let count = collection.count_documents(document).await?;
        ensure!(count == 2, "{name} holds {count} copies, expected 2");
    }

    let rerun = provision(&backend, &plan, ConflictPolicy::Skip).await?;
    ensure!(rerun.is_no_op(), "skip rerun changed the server: {:?}", rerun.outcomes);
    ensure!(rerun.count(StepStatus::Skipped) == 9);

    let err = provision(&backend, &plan, ConflictPolicy::Fail)
        .await
        .err()
        .context("fail rerun unexpectedly succeeded")?;
    ensure!(err.ordinal() == Some(2), "failed at {:?}: {err}", err.ordinal());
    ensure!(
        matches!(
            err.root(),
            ProvisionError::AlreadyExists {
                kind: ResourceKind::User,
                ..
            }
        ),
        "unexpected failure: {err}"
    );

    backend.shutdown().await;
    Ok(())
}
