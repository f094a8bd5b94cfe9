//! Message routing: public fan-out and private messages.

mod common;

use common::client::room_id_of;
use common::{TestClient, TestServer};
use std::time::Duration;

async fn room_with_three(
    server: &TestServer,
) -> anyhow::Result<(TestClient, TestClient, TestClient, String)> {
    let mut alice = TestClient::connect_named(server.addr(), "Alice").await?;
    alice.send("/CREATE PUBLIC").await?;
    let room_id = room_id_of(&alice.expect("ROOM_CREATED:").await?)?;

    let mut bob = TestClient::connect_named(server.addr(), "Bob").await?;
    bob.send(&format!("/JOIN {room_id}")).await?;
    bob.expect(&format!("ROOM_JOINED:{room_id}")).await?;
    bob.expect_history_block().await?;

    let mut carol = TestClient::connect_named(server.addr(), "Carol").await?;
    carol.send(&format!("/JOIN {room_id}")).await?;
    carol.expect(&format!("ROOM_JOINED:{room_id}")).await?;
    carol.expect_history_block().await?;

    Ok((alice, bob, carol, room_id))
}

#[tokio::test]
async fn private_message_routes_to_exactly_one_member() -> anyhow::Result<()> {
    let server = TestServer::spawn().await?;
    let (mut alice, mut bob, mut carol, _room_id) = room_with_three(&server).await?;

    // Let the join notices settle so silence below means silence.
    alice.drain().await;
    bob.drain().await;
    carol.drain().await;

    alice.send("@Bob yo").await?;

    let from = bob.expect("PM_FROM:").await?;
    assert_eq!(from, "PM_FROM:Alice:yo");

    let sent = alice.expect("PM_SENT:").await?;
    assert_eq!(sent, "PM_SENT:Bob:yo");

    carol.assert_silent(Duration::from_millis(300)).await?;

    Ok(())
}

#[tokio::test]
async fn private_message_to_absent_user_errors() -> anyhow::Result<()> {
    let server = TestServer::spawn().await?;
    let (mut alice, _bob, _carol, _room_id) = room_with_three(&server).await?;

    alice.send("@Ghost hello?").await?;
    let err = alice.expect("ERROR:").await?;
    assert!(err.contains("Ghost"), "unexpected error: {err}");

    Ok(())
}

#[tokio::test]
async fn public_fanout_skips_the_sender() -> anyhow::Result<()> {
    let server = TestServer::spawn().await?;
    let (mut alice, mut bob, mut carol, _room_id) = room_with_three(&server).await?;

    alice.drain().await;
    bob.drain().await;
    carol.drain().await;

    alice.send("good morning").await?;

    bob.expect_containing("Alice: good morning").await?;
    carol.expect_containing("Alice: good morning").await?;
    alice.assert_silent(Duration::from_millis(300)).await?;

    Ok(())
}

#[tokio::test]
async fn per_sender_ordering_is_fifo() -> anyhow::Result<()> {
    let server = TestServer::spawn().await?;
    let (mut alice, mut bob, _carol, _room_id) = room_with_three(&server).await?;

    for i in 0..5 {
        alice.send(&format!("msg {i}")).await?;
    }

    for i in 0..5 {
        bob.expect_containing(&format!("Alice: msg {i}")).await?;
    }

    Ok(())
}

#[tokio::test]
async fn malformed_private_messages_are_rejected() -> anyhow::Result<()> {
    let server = TestServer::spawn().await?;
    let (mut alice, _bob, _carol, _room_id) = room_with_three(&server).await?;

    alice.send("@Bob").await?;
    let err = alice.expect("ERROR:").await?;
    assert!(err.contains("Malformed"), "unexpected error: {err}");

    Ok(())
}
