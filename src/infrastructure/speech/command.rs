use async_trait::async_trait;
use std::io::Write;
use std::path::Path;
use tokio::process::Command;
use tracing::debug;

use crate::domain::{
    ports::{AudioSink, AudioSource},
    AudioClip, DomainError, SpeechAudio,
};
use crate::infrastructure::config::SpeechConfig;

/// Replaces `{key}` placeholders in each argument.
fn render(args: &[String], vars: &[(&str, &str)]) -> Vec<String> {
    args.iter()
        .map(|arg| {
            vars.iter().fold(arg.clone(), |acc, (key, value)| {
                acc.replace(&format!("{{{key}}}"), value)
            })
        })
        .collect()
}

async fn run(command: &[String]) -> Result<(), DomainError> {
    let (program, args) = command
        .split_first()
        .ok_or_else(|| DomainError::validation("audio command is empty"))?;

    debug!(program, ?args, "running audio command");
    let output = Command::new(program)
        .args(args)
        .output()
        .await
        .map_err(|e| DomainError::external(format!("failed to start {program}: {e}")))?;

    if !output.status.success() {
        return Err(DomainError::external(format!(
            "{program} exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(())
}

fn path_str(path: &Path) -> Result<&str, DomainError> {
    path.to_str()
        .ok_or_else(|| DomainError::internal("temporary path is not valid UTF-8"))
}

/// Records a fixed-length WAV clip by running an external recorder
/// (`arecord` by default).
pub struct CommandMicrophone {
    command: Vec<String>,
    seconds: u64,
}

impl CommandMicrophone {
    pub fn new(command: Vec<String>, seconds: u64) -> Self {
        Self { command, seconds }
    }

    pub fn from_config(config: &SpeechConfig) -> Self {
        Self::new(config.recorder_command.clone(), config.record_seconds)
    }
}

#[async_trait]
impl AudioSource for CommandMicrophone {
    async fn capture(&self) -> Result<AudioClip, DomainError> {
        let file = tempfile::Builder::new()
            .prefix("mic-")
            .suffix(".wav")
            .tempfile()
            .map_err(|e| DomainError::internal(e.to_string()))?;
        let output = path_str(file.path())?;
        let seconds = self.seconds.to_string();

        run(&render(
            &self.command,
            &[("output", output), ("seconds", seconds.as_str())],
        ))
        .await?;

        let bytes = tokio::fs::read(file.path())
            .await
            .map_err(|e| DomainError::internal(e.to_string()))?;
        Ok(AudioClip::wav(bytes))
    }
}

/// Plays speech through an external player. The audio is written to a
/// temporary file that is removed once playback returns.
pub struct CommandPlayer {
    command: Vec<String>,
}

impl CommandPlayer {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }

    pub fn from_config(config: &SpeechConfig) -> Self {
        Self::new(config.player_command.clone())
    }
}

#[async_trait]
impl AudioSink for CommandPlayer {
    async fn play(&self, audio: &SpeechAudio) -> Result<(), DomainError> {
        let mut file = tempfile::Builder::new()
            .prefix("response-")
            .suffix(&format!(".{}", audio.format.extension()))
            .tempfile()
            .map_err(|e| DomainError::internal(e.to_string()))?;
        file.write_all(&audio.bytes)
            .map_err(|e| DomainError::internal(e.to_string()))?;
        file.flush()
            .map_err(|e| DomainError::internal(e.to_string()))?;

        let input = path_str(file.path())?;
        run(&render(&self.command, &[("input", input)])).await
    }
}
