mod command;
mod openai_tts;
mod whisper;

pub use command::{CommandMicrophone, CommandPlayer};
pub use openai_tts::OpenAiSpeech;
pub use whisper::WhisperTranscriber;
