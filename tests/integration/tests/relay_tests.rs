//! Relay Integration Tests
//!
//! Run the gateway on an ephemeral port and drive it with real WebSocket
//! subscribers. No external services are needed.
//!
//! Run with: cargo test -p integration-tests --test relay_tests

use integration_tests::{
    assert_json, next_event, next_text, send_text, test_config, FakeIrcServer, TestGateway,
};
use relay_core::{ChatEvent, Emote, EventKind};
use relay_upstream::{IncomingMessage, TwitchConnector, UpstreamEvent};
use reqwest::StatusCode;
use std::sync::Arc;

fn incoming(id: &str, text: &str) -> UpstreamEvent {
    UpstreamEvent::Message(IncomingMessage {
        id: id.to_string(),
        display_name: "Foo".to_string(),
        color: "#FF4500".to_string(),
        channel: "kewliomzx".to_string(),
        text: text.to_string(),
        action: false,
        timestamp: 1_700_000_000,
        emotes: vec![Emote::new("Kappa", "25")],
    })
}

// ============================================================================
// Health and Stats
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let (gateway, _events) = TestGateway::start().await.unwrap();

    let response = gateway.get("/health").await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "OK");

    gateway.stop().await.unwrap();
}

#[tokio::test]
async fn test_stats_tracks_subscribers() {
    let (gateway, _events) = TestGateway::start().await.unwrap();

    let stats: serde_json::Value =
        assert_json(gateway.get("/stats").await.unwrap(), StatusCode::OK)
            .await
            .unwrap();
    assert_eq!(stats, serde_json::json!({ "connections": 0 }));

    let mut first = gateway.subscribe().await.unwrap();
    let _second = gateway.subscribe().await.unwrap();
    assert_eq!(gateway.connections().await.unwrap(), 2);

    first.close(None).await.unwrap();
    gateway.wait_for_connections(1).await.unwrap();

    gateway.stop().await.unwrap();
}

// ============================================================================
// Fan-out
// ============================================================================

#[tokio::test]
async fn test_every_subscriber_receives_message() {
    let (gateway, events) = TestGateway::start().await.unwrap();
    let mut subscribers = vec![
        gateway.subscribe().await.unwrap(),
        gateway.subscribe().await.unwrap(),
        gateway.subscribe().await.unwrap(),
    ];

    events.send(incoming("abc", "hello Kappa")).await.unwrap();

    for subscriber in &mut subscribers {
        let json = next_text(subscriber).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "msgType": 1,
                "id": "abc",
                "displayName": "Foo",
                "displayCol": "#FF4500",
                "channel": "kewliomzx",
                "msg": "hello Kappa",
                "time": 1_700_000_000,
                "emotes": [{ "name": "Kappa", "id": "25" }]
            })
        );
    }

    gateway.stop().await.unwrap();
}

#[tokio::test]
async fn test_events_arrive_in_order() {
    let (gateway, events) = TestGateway::start().await.unwrap();
    let mut subscriber = gateway.subscribe().await.unwrap();

    for i in 0..20 {
        events.send(incoming(&i.to_string(), "hi")).await.unwrap();
    }

    for i in 0..20 {
        assert_eq!(next_event(&mut subscriber).await.unwrap().id, i.to_string());
    }

    gateway.stop().await.unwrap();
}

#[tokio::test]
async fn test_delete_follows_message() {
    let (gateway, events) = TestGateway::start().await.unwrap();
    let mut subscriber = gateway.subscribe().await.unwrap();

    events.send(incoming("abc", "oops")).await.unwrap();
    events
        .send(UpstreamEvent::Deleted {
            channel: "kewliomzx".to_string(),
            target_id: "abc".to_string(),
        })
        .await
        .unwrap();

    let message = next_event(&mut subscriber).await.unwrap();
    assert_eq!(message.kind, EventKind::Message);
    assert_eq!(message.id, "abc");

    let delete = next_event(&mut subscriber).await.unwrap();
    assert_eq!(delete, ChatEvent::delete("abc"));

    gateway.stop().await.unwrap();
}

#[tokio::test]
async fn test_disconnected_subscriber_does_not_block_others() {
    let (gateway, events) = TestGateway::start().await.unwrap();
    let mut leaving = gateway.subscribe().await.unwrap();
    let mut staying = gateway.subscribe().await.unwrap();

    leaving.close(None).await.unwrap();
    gateway.wait_for_connections(1).await.unwrap();

    events.send(incoming("xyz", "still here")).await.unwrap();
    assert_eq!(next_event(&mut staying).await.unwrap().id, "xyz");

    gateway.stop().await.unwrap();
}

#[tokio::test]
async fn test_inbound_text_is_echoed() {
    let (gateway, _events) = TestGateway::start().await.unwrap();
    let mut subscriber = gateway.subscribe().await.unwrap();

    send_text(&mut subscriber, "are you there?").await.unwrap();
    assert_eq!(next_text(&mut subscriber).await.unwrap(), "are you there?");

    gateway.stop().await.unwrap();
}

// ============================================================================
// End to end with the Twitch connector
// ============================================================================

#[tokio::test]
async fn test_twitch_chat_relayed_to_subscribers() {
    let irc = FakeIrcServer::start().await.unwrap();
    let mut config = test_config();
    config.upstream.url = irc.url();
    config.upstream.channels = vec!["kewliomzx".to_string()];

    let source = Arc::new(TwitchConnector::new(irc.url()));
    let gateway = TestGateway::start_with_source(config, source).await.unwrap();
    let mut subscriber = gateway.subscribe().await.unwrap();

    irc.wait_for_line("JOIN #kewliomzx").await.unwrap();
    let received = irc.received().await;
    assert!(received.iter().any(|line| line == "PASS SCHMOOPIIE"));
    assert!(received.iter().any(|line| line.starts_with("NICK justinfan")));

    irc.send_line("PING :tmi.twitch.tv").await.unwrap();
    irc.wait_for_line("PONG :tmi.twitch.tv").await.unwrap();

    irc.send_line(
        "@color=#1E90FF;display-name=Bar;emotes=25:0-4;id=m1;tmi-sent-ts=1700000000999 \
         :bar!bar@bar.tmi.twitch.tv PRIVMSG #kewliomzx :Kappa hi",
    )
    .await
    .unwrap();
    irc.send_line(
        "@display-name=Bar;id=m2;tmi-sent-ts=1700000001000 \
         :bar!bar@bar.tmi.twitch.tv PRIVMSG #kewliomzx :\u{1}ACTION dances\u{1}",
    )
    .await
    .unwrap();
    irc.send_line("@login=bar;target-msg-id=m1 :tmi.twitch.tv CLEARMSG #kewliomzx :Kappa hi")
        .await
        .unwrap();

    let message = next_event(&mut subscriber).await.unwrap();
    assert_eq!(message.kind, EventKind::Message);
    assert_eq!(message.id, "m1");
    assert_eq!(message.display_name, "Bar");
    assert_eq!(message.display_color, "#1E90FF");
    assert_eq!(message.text, "Kappa hi");
    assert_eq!(message.timestamp, 1_700_000_000);
    assert_eq!(message.emotes, vec![Emote::new("Kappa", "25")]);

    let action = next_event(&mut subscriber).await.unwrap();
    assert_eq!(action.kind, EventKind::Action);
    assert_eq!(action.text, "dances");

    let delete = next_event(&mut subscriber).await.unwrap();
    assert_eq!(delete, ChatEvent::delete("m1"));

    gateway.stop().await.unwrap();
}
