//! Console gateway for local testing
//!
//! Publishes each stdin line as a conversation event and prints the
//! worker's replies, standing in for a chat platform.

use async_trait::async_trait;
use order_relay::broker::AmqpBroker;
use order_relay::config::RelayConfig;
use order_relay::envelope::Envelope;
use order_relay::error::DispatchError;
use order_relay::gateway::{command_of, ReplyRouter, ReplySink};
use order_relay::publisher::OutboundPublisher;
use order_relay::shutdown;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

const BOT_TYPE: &str = "console";
const CHAT_ENV: &str = "RELAY_CONSOLE_CHAT";

/// How long to keep printing replies after stdin closes
const EOF_GRACE: Duration = Duration::from_secs(2);

struct StdoutSink;

#[async_trait]
impl ReplySink for StdoutSink {
    async fn deliver(&self, reply: &Envelope) -> Result<(), DispatchError> {
        let line = format!("[{}] {}\n", reply.conversation_id, reply.text);
        let mut stdout = tokio::io::stdout();
        stdout
            .write_all(line.as_bytes())
            .await
            .map_err(|e| DispatchError::new(BOT_TYPE, e.to_string()))?;
        stdout
            .flush()
            .await
            .map_err(|e| DispatchError::new(BOT_TYPE, e.to_string()))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    order_relay::init_tracing("order_relay=warn");

    let config = RelayConfig::from_env(BOT_TYPE)?;
    let chat_id = std::env::var(CHAT_ENV).unwrap_or_else(|_| "local".to_string());

    let broker = AmqpBroker::connect(&config.amqp_dsn).await?;
    if config.declare_queues {
        broker.declare_queue(&config.inbound_queue).await?;
        broker.declare_queue(&config.outbound_queue).await?;
    }

    // Reverse of the worker: consume replies, publish events
    let subscription = broker
        .subscribe(&config.outbound_queue, &config.consumer_tag)
        .await?;
    let publisher = OutboundPublisher::new(broker.sink(), config.inbound_queue.clone());

    let mut router = ReplyRouter::new();
    router.register(BOT_TYPE, Arc::new(StdoutSink));

    let stop = shutdown::install()?;

    let input = async {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let line = tokio::select! {
                () = stop.cancelled() => break,
                line = lines.next_line() => line,
            };
            match line {
                Ok(Some(line)) => {
                    let event = Envelope::new(BOT_TYPE, chat_id.as_str(), line.as_str(), command_of(&line));
                    if let Err(e) = publisher.publish(&event).await {
                        tracing::error!(error = %e, "Failed to publish event");
                    }
                }
                Ok(None) => {
                    tokio::select! {
                        () = stop.cancelled() => {}
                        () = tokio::time::sleep(EOF_GRACE) => {}
                    }
                    break;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to read stdin");
                    break;
                }
            }
        }
        stop.cancel();
    };

    let ((), stats) = tokio::join!(input, router.run(subscription, stop.clone()));
    tracing::info!(delivered = stats.delivered, rejected = stats.rejected, "Console stopped");

    broker.close().await?;
    Ok(())
}
