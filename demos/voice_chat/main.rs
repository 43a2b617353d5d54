//! Minimal terminal chat over the realtime conversation engine: lines typed
//! on stdin become user text turns, assistant text and audio-transcript
//! deltas print to stderr as they arrive. Type `quit` to exit.

use realtime_conversation::types::realtime::ContentPart;
use realtime_conversation::{ClientEvent, DirectConfig, RealtimeClient};
use tokio::io::AsyncReadExt;

#[tokio::main]
async fn main() {
    let api_key = std::env::var("OPENAI_API_KEY").expect("Please provide OPENAI_API_KEY env var");
    let client = RealtimeClient::new(DirectConfig::new().with_api_key(api_key), 24_000);

    client.on("conversation.updated", |event| async move {
        if let ClientEvent::ConversationUpdated { delta: Some(delta), .. } = event {
            if let Some(text) = delta.text {
                eprint!("{text}");
            }
            if let Some(transcript) = delta.transcript {
                eprint!("{transcript}");
            }
        }
    });
    client.on("conversation.item.completed", |_event| async move {
        eprintln!();
    });

    client.connect().await.expect("failed to connect");
    eprintln!("connected, type a message and press enter (type quit to exit)");

    read_stdin(client).await;
}

async fn read_stdin(client: std::sync::Arc<RealtimeClient<DirectConfig>>) {
    let mut stdin = tokio::io::stdin();
    loop {
        let mut buf = vec![0; 4096];
        let n = match stdin.read(&mut buf).await {
            Err(_) | Ok(0) => break,
            Ok(n) => n,
        };
        buf.truncate(n);
        let text = String::from_utf8_lossy(&buf).trim().to_string();
        if text.is_empty() {
            continue;
        }
        if text == "quit" {
            client.disconnect().await.ok();
            return;
        }
        client
            .send_user_message_content(vec![ContentPart::input_text(text)])
            .await
            .expect("failed to send message");
    }
}
