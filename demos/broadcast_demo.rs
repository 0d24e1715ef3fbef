//! Demo HTTP server broadcasting a tick event every second over SSE.
//!
//! Run with `cargo run --example broadcast_demo --features server`, then
//! `curl -N http://127.0.0.1:3000/events`.

use std::time::Duration;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::sse::Sse;
use axum::routing::get;
use axum::Router;
use eventline::{Broker, Event};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let broker = Broker::new();

    let publisher = broker.clone();
    tokio::spawn(async move {
        let mut tick: u64 = 0;
        loop {
            tokio::time::sleep(Duration::from_secs(1)).await;
            tick += 1;
            let event = Event::builder()
                .event_type("tick")
                .unwrap()
                .data(tick.to_string())
                .build();
            if publisher.publish(event, vec!["default".to_owned()]).await.is_err() {
                break;
            }
        }
    });

    let app = Router::new()
        .route("/events", get(events_handler))
        .with_state(broker);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
    println!("listening on http://127.0.0.1:3000/events");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn events_handler(
    State(broker): State<Broker>,
    headers: HeaderMap,
) -> Sse<impl futures_util::Stream<Item = Result<axum::response::sse::Event, std::convert::Infallible>>> {
    eventline::http::subscribe_route(broker, vec!["default".to_owned()], &headers)
}
