use anyhow::Result;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "voxboard=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting voxboard");
    run()
}

#[cfg(all(feature = "audio-io", feature = "global-keys"))]
fn run() -> Result<()> {
    use std::sync::Arc;
    use voxboard::audio::{CpalBackend, PlaybackEvent};
    use voxboard::engine::{Engine, EnginePaths};
    use voxboard::hotkey::KeyPoller;
    use voxboard::synth::{NeuralTtsClient, NeuralTtsConfig, VOICES};

    let provider = Arc::new(NeuralTtsClient::new(NeuralTtsConfig::from_env()?)?);
    let mut engine = Engine::new(
        EnginePaths::default(),
        provider,
        Arc::new(CpalBackend::new()),
        Arc::new(KeyPoller::new()),
    )?;

    let text: String = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    if text.trim().is_empty() {
        println!("usage: voxboard <text to speak>\n");
        println!("Voices:");
        for (i, voice) in VOICES.iter().enumerate() {
            println!("  {:2}  {}", i, voice.display_name);
        }
        println!("\nOutput devices:");
        for device in engine.devices()? {
            println!(
                "  {:2}  {} ({} ch)",
                device.index, device.name, device.max_output_channels
            );
        }
        return Ok(());
    }

    engine.start_hotkeys()?;

    let events = engine.events();
    engine.speak(&text);

    // Block until the play action resolves one way or the other
    for event in &events {
        match event {
            PlaybackEvent::Started { duration_secs } => {
                info!("Playing ({:.1}s)", duration_secs);
            }
            PlaybackEvent::DeviceSkipped { index, reason } => {
                eprintln!("Device {} skipped: {}", index, reason);
            }
            PlaybackEvent::Finished | PlaybackEvent::Stopped => break,
            PlaybackEvent::Error(message) => {
                eprintln!("{}", message);
                break;
            }
            PlaybackEvent::Progress(_) => {}
        }
    }

    engine.shutdown();
    Ok(())
}

#[cfg(not(all(feature = "audio-io", feature = "global-keys")))]
fn run() -> Result<()> {
    anyhow::bail!("voxboard was built without the audio-io/global-keys features")
}
