//! Console front end: speak (or type) a question, hear the answer.
//!
//! ```text
//! voice                 # microphone loop, Ctrl-C to stop
//! voice question.wav    # answer one recording
//! voice --text          # read questions from stdin
//! ```

use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use voice_agent::application::{AgentReply, VoiceAgent};
use voice_agent::domain::{
    ports::{AudioSink, AudioSource},
    AudioInput, DomainError,
};
use voice_agent::infrastructure::{AgentRuntime, AppConfig, CommandMicrophone, CommandPlayer};

enum Mode {
    Microphone,
    File(PathBuf),
    Text,
}

fn parse_mode() -> anyhow::Result<Mode> {
    let mut args = std::env::args().skip(1);
    let mode = match args.next().as_deref() {
        None => Mode::Microphone,
        Some("--text") => Mode::Text,
        Some(flag) if flag.starts_with('-') => {
            anyhow::bail!("unknown flag {flag}; usage: voice [--text | <audio file>]")
        }
        Some(path) => Mode::File(PathBuf::from(path)),
    };
    Ok(mode)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let json = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "voice=debug,voice_agent=info".into()),
        )
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();

    let mode = parse_mode()?;
    let config = AppConfig::load()?;
    let speech = config.config.speech.clone();

    let runtime = AgentRuntime::build(config).await?;
    let agent = runtime.agent;
    let player = CommandPlayer::from_config(&speech);

    match mode {
        Mode::File(path) => {
            let reply = agent.answer_audio(AudioInput::File(path)).await?;
            present(&reply, &player).await;
        }
        Mode::Text => {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Some(line) = lines.next_line().await? {
                if line.trim().is_empty() {
                    continue;
                }
                match agent.answer(&line).await {
                    Ok(reply) => present(&reply, &player).await,
                    Err(e) => error!(error = %e, "failed to answer"),
                }
            }
        }
        Mode::Microphone => {
            let microphone = CommandMicrophone::from_config(&speech);
            tokio::select! {
                result = listen(&agent, &microphone, &player) => result?,
                _ = tokio::signal::ctrl_c() => info!("Stopping"),
            }
        }
    }

    Ok(())
}

/// Records, answers and plays back until interrupted. A clip nobody could
/// understand just starts the next round.
async fn listen(
    agent: &VoiceAgent,
    microphone: &dyn AudioSource,
    player: &dyn AudioSink,
) -> anyhow::Result<()> {
    loop {
        println!("Listening...");
        let clip = microphone.capture().await?;

        match agent.answer_audio(AudioInput::Clip(clip)).await {
            Ok(reply) => present(&reply, player).await,
            Err(DomainError::Transcription(_)) => {
                println!("Sorry, I didn't catch that.");
            }
            Err(e) => error!(error = %e, "failed to answer"),
        }
    }
}

async fn present(reply: &AgentReply, player: &dyn AudioSink) {
    println!("User: {}", reply.query);
    println!("Agent: {}", reply.answer);

    if let Some(audio) = &reply.audio {
        if let Err(e) = player.play(audio).await {
            warn!(error = %e, "playback failed");
        }
    }
}
