use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::sync::mpsc;

use modemchat_rs::audio::{AlsaPort, AudioEvent};
use modemchat_rs::codec::ModemCodec;
use modemchat_rs::controller::{Controller, EVENT_QUEUE_DEPTH};
use modemchat_rs::message::{ChatMessage, MessageSink};
use modemchat_rs::settings::Settings;

/// Renders the conversation to the terminal, one line per message.
struct ConsoleSink;

impl MessageSink for ConsoleSink {
    fn deliver(&mut self, message: ChatMessage) {
        println!(
            "[{}] <{}> {}",
            message.timestamp.format("%H:%M"),
            message.callsign,
            message.text,
        );
    }
}

#[cfg(feature = "native-codec")]
fn make_codec() -> Result<Box<dyn ModemCodec>> {
    Ok(Box::new(modemchat_rs::codec::NativeModem))
}

#[cfg(not(feature = "native-codec"))]
fn make_codec() -> Result<Box<dyn ModemCodec>> {
    anyhow::bail!(
        "this build has no modem backend; rebuild with --features native-codec"
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let settings_path = Settings::default_path();
    let settings = match &settings_path {
        Some(path) => Settings::load(path),
        None => Settings::default(),
    };

    let codec = make_codec()?;

    let (events_tx, mut events_rx) = mpsc::channel::<AudioEvent>(EVENT_QUEUE_DEPTH);
    let mut controller = Controller::new(
        settings,
        codec,
        Box::new(ConsoleSink),
        Box::new(AlsaPort::new(events_tx)),
        settings_path,
    );

    controller.start_audio();
    println!("modemchat ready — /help for commands, /quit to exit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                log::info!("Received Ctrl+C, shutting down");
                break;
            }

            Some(event) = events_rx.recv() => {
                controller.handle_audio_event(event);
            }

            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    if line.trim() == "/quit" {
                        break;
                    }
                    controller.handle_line(&line);
                }
                Ok(None) => break,
                Err(e) => {
                    log::error!("stdin error: {}", e);
                    break;
                }
            },
        }
    }

    controller.shutdown();
    Ok(())
}
