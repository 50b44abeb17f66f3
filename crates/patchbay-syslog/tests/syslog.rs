use std::time::Duration;

use patchbay_data::store::Store;
use patchbay_data::syslog;
use patchbay_syslog::activate;
use patchbay_telemetry::Metrics;
use patchbay_test_support::postgres::start_postgres;

#[tokio::test]
async fn active_server_record_ingests_datagrams() -> anyhow::Result<()> {
    let postgres = match start_postgres() {
        Ok(db) => db,
        Err(err) => {
            eprintln!("skipping active_server_record_ingests_datagrams: {err}");
            return Ok(());
        }
    };

    let store = Store::connect(postgres.connection_string()).await?;
    let telemetry = Metrics::new()?;
    syslog::insert_syslog_server(store.pool(), "127.0.0.1", 0).await?;

    let handle = activate(store.clone(), telemetry.clone())
        .await
        .expect("listener should activate");
    assert!(!handle.is_finished());

    let sender = tokio::net::UdpSocket::bind("127.0.0.1:0").await?;
    sender
        .send_to(b"<34>su: authentication failure", handle.local_addr())
        .await?;
    sender.send_to(b"plain message", handle.local_addr()).await?;

    let mut stored = 0;
    for _ in 0..40 {
        tokio::time::sleep(Duration::from_millis(50)).await;
        stored = syslog::count_syslog_messages(store.pool()).await?;
        if stored >= 2 {
            break;
        }
    }
    handle.shutdown().await;
    assert_eq!(stored, 2, "both datagrams should be stored");

    let messages = syslog::list_syslog_messages(store.pool()).await?;
    let tagged = messages
        .iter()
        .find(|row| row.content == "su: authentication failure")
        .expect("tagged message");
    assert_eq!(tagged.facility, Some(4));
    assert_eq!(tagged.severity, Some(2));
    assert_eq!(tagged.source, "127.0.0.1");

    let plain = messages
        .iter()
        .find(|row| row.content == "plain message")
        .expect("plain message");
    assert_eq!(plain.facility, None);
    assert_eq!(plain.severity, None);

    assert!(telemetry.snapshot().syslog_messages_ingested >= 2);
    Ok(())
}

#[tokio::test]
async fn activation_without_a_record_is_declined() -> anyhow::Result<()> {
    let postgres = match start_postgres() {
        Ok(db) => db,
        Err(err) => {
            eprintln!("skipping activation_without_a_record_is_declined: {err}");
            return Ok(());
        }
    };

    let store = Store::connect(postgres.connection_string()).await?;
    let telemetry = Metrics::new()?;
    assert!(activate(store, telemetry).await.is_none());
    Ok(())
}

#[tokio::test]
async fn unusable_server_records_never_block_startup() -> anyhow::Result<()> {
    let postgres = match start_postgres() {
        Ok(db) => db,
        Err(err) => {
            eprintln!("skipping unusable_server_records_never_block_startup: {err}");
            return Ok(());
        }
    };

    let store = Store::connect(postgres.connection_string()).await?;
    let telemetry = Metrics::new()?;
    // Ports are stored as i32; anything beyond u16 cannot be bound.
    syslog::insert_syslog_server(store.pool(), "127.0.0.1", 70_000).await?;
    assert!(activate(store, telemetry).await.is_none());
    Ok(())
}
