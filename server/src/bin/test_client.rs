//! Manual smoke-test client: joins a session as host, registers a player,
//! draws a few numbers, resets and disconnects, printing all traffic.

use futures::{SinkExt, StreamExt};
use shared::{ClientEvent, ServerEvent};
use tokio::time::{sleep, Duration};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

fn encode(event: &ClientEvent) -> Result<Message, serde_json::Error> {
    Ok(Message::text(serde_json::to_string(event)?))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "ws://127.0.0.1:3000/ws".to_string());

    println!("Connecting to {}", url);
    let (ws, _) = connect_async(&url).await?;
    let (mut sink, mut stream) = ws.split();

    // Join as host and wait for the session snapshot.
    sink.send(encode(&ClientEvent::JoinSession {
        session_id: "default".to_string(),
        is_host: true,
    })?)
    .await?;

    if let Some(Ok(Message::Text(text))) = stream.next().await {
        let event: ServerEvent = serde_json::from_str(&text)?;
        println!("<- {:?}", event);
    }

    // Register a player on the same connection.
    sink.send(encode(&ClientEvent::PlayerJoin {
        session_id: "default".to_string(),
        name: "SmokeTester".to_string(),
    })?)
    .await?;

    // Draw a few numbers.
    for _ in 0..5 {
        sink.send(encode(&ClientEvent::PickNumber)?).await?;
        sleep(Duration::from_millis(200)).await;
    }

    // Drain whatever arrived so far.
    while let Ok(Some(Ok(message))) =
        tokio::time::timeout(Duration::from_millis(500), stream.next()).await
    {
        if let Message::Text(text) = message {
            match serde_json::from_str::<ServerEvent>(&text) {
                Ok(event) => println!("<- {:?}", event),
                Err(e) => println!("<- unparseable frame: {}", e),
            }
        }
    }

    // Put the session back the way we found it.
    sink.send(encode(&ClientEvent::ResetGame)?).await?;
    sink.send(Message::Close(None)).await?;

    println!("Test client finished");
    Ok(())
}
