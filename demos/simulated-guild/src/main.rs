//! A scripted guild driven through the autorooms service.
//!
//! ```text
//! cargo run -p simulated-guild [config.json]
//! ```
//!
//! Three members hop between a template room and the lobby: one of them
//! spams the template, then everyone leaves and the empty rooms are reaped.

use std::sync::Arc;
use std::time::Duration;

use autorooms::prelude::*;
use tokio::sync::mpsc;

const BOT: ActorId = ActorId(9000);
const GUILD: GuildId = GuildId(1);
const APPLICATION_ID: u64 = 9000;

fn voice(name: &str, user_limit: u32) -> NewVoiceChannel {
    NewVoiceChannel {
        name: name.to_string(),
        category_id: None,
        bitrate: 64_000,
        user_limit,
        overwrites: Overwrites::new(),
    }
}

fn load_config() -> Result<ServiceConfig, Box<dyn std::error::Error>> {
    match std::env::args().nth(1) {
        Some(path) => {
            let raw = std::fs::read_to_string(&path)?;
            Ok(ServiceConfig::from_json(&raw)?)
        }
        None => Ok(ServiceConfig::default()),
    }
}

/// Lets the service catch up with the events sent so far.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(100)).await;
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    init_tracing(&config.log)?;
    tracing::info!(link = %invite_link(APPLICATION_ID), "add the bot to a guild");

    let directory = MemoryDirectory::new();
    directory
        .add_guild(GUILD, PermissionSet::AUTOROOM_CAPABILITY)
        .await;
    let general = directory.add_voice_channel(GUILD, voice("\u{231B} General", 0)).await;
    let squad = directory.add_voice_channel(GUILD, voice("\u{231B} Squad", 4)).await;
    let lobby = directory.add_voice_channel(GUILD, voice("Lobby", 0)).await;

    let service = Arc::new(
        AutoroomsServiceBuilder::new()
            .config(config)
            .build(directory, BOT),
    );
    let (events, rx) = mpsc::channel(64);
    let runner = tokio::spawn({
        let service = Arc::clone(&service);
        async move { service.run(rx).await }
    });
    let dir = service.directory();

    let alice = ActorRef::new(ActorId(1), "alice");
    let bob = ActorRef::new(ActorId(2), "bob");
    let mallory = ActorRef::new(ActorId(3), "mallory");

    // Alice and Bob each get a room of their own.
    events.send(dir.join(&alice, general.id).await?).await?;
    events.send(dir.join(&bob, squad.id).await?).await?;
    settle().await;

    // Mallory keeps re-entering the template.
    for _ in 0..4 {
        events.send(dir.join(&mallory, general.id).await?).await?;
        settle().await;
    }

    // Everyone drifts off; the rooms they left are past their grace period
    // by the time the next event arrives.
    events.send(dir.join(&alice, lobby.id).await?).await?;
    if let Some(event) = dir.leave(&bob).await {
        events.send(event).await?;
    }
    if let Some(event) = dir.leave(&mallory).await {
        events.send(event).await?;
    }
    let grace = service.controller().config().reap_grace();
    tokio::time::sleep(grace + Duration::from_millis(500)).await;
    if let Some(event) = dir.leave(&alice).await {
        events.send(event).await?;
    }

    drop(events);
    runner.await?;

    for channel in dir.channels(GUILD).await {
        tracing::info!(
            channel_id = %channel.id,
            name = %channel.name,
            members = channel.member_count,
            "remaining channel"
        );
    }
    Ok(())
}
