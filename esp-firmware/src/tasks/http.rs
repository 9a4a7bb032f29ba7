// HTTP Server Task - Serviert Status-Seite und WebSocket-Kommandokanal
use core::future::pending;
use defmt::{info, warn};
use embassy_futures::select::{Either3, select3};
use embassy_net::Stack;
use embassy_time::{Duration, Instant};
use esp_core::{Command, LineAssembler};
use picoserve::{io::embedded_io_async, response::IntoResponse, response::ws, routing::get};

use crate::config::*;
use crate::web::{INDEX_HTML, protocol::WsServerMessage};
use crate::{
    CommandEnvelope, CommandSender, ReplyChannel, ReplySubscriber, StatusChannel,
    StatusSubscriber,
};

/// Response-Enum für WebSocket-Endpoint
/// Ermöglicht Rückgabe von entweder WebSocket-Upgrade oder HTTP-Fehler
enum WebSocketResponse {
    Upgrade(
        ws::UpgradedWebSocket<ws::UnspecifiedProtocol, ws::CallbackNotUsingState<WebSocketHandler>>,
    ),
    ServiceUnavailable,
}

impl IntoResponse for WebSocketResponse {
    async fn write_to<
        R: embedded_io_async::Read,
        W: picoserve::response::ResponseWriter<Error = R::Error>,
    >(
        self,
        connection: picoserve::response::Connection<'_, R>,
        response_writer: W,
    ) -> Result<picoserve::ResponseSent, W::Error> {
        match self {
            WebSocketResponse::Upgrade(ws) => ws.write_to(connection, response_writer).await,
            WebSocketResponse::ServiceUnavailable => {
                picoserve::response::Response::new(
                    picoserve::response::StatusCode::new(503),
                    "Service Unavailable: Too many WebSocket connections",
                )
                .with_header("Retry-After", "5")
                .write_to(connection, response_writer)
                .await
            }
        }
    }
}

/// HTTP Server Task - läuft parallel zu anderen Tasks
///
/// - Serviert die Status-Seite auf GET /
/// - WebSocket-Endpoint auf /ws: Textzeilen sind Kommandos
///   (`FASE`, `TRANSICION`, `CONFIG_FASE`, `PLAY`, `STOP`),
///   zurück kommen Status-Updates, Bestätigungen und Fehlerhinweise
///
/// **Task Pool:** Diese Task wird 4x gespawnt. Die `task_id` ist
/// gleichzeitig die Absender-Kennung der Kommandos, da jede Instanz
/// genau eine Verbindung bedient.
///
/// # Parameter
/// - `task_id`: Eindeutige ID für diese Server-Instanz (0..3)
/// - `stack`: embassy-net Stack für Netzwerk-Zugriff
/// - `status_channel`: PubSub Channel für Status-Broadcasts
/// - `reply_channel`: PubSub Channel für Antworten des Controllers
/// - `command_sender`: Channel Sender für Kommandos an den Controller
#[embassy_executor::task(pool_size = 4)]
pub async fn http_server_task(
    task_id: usize,
    stack: &'static Stack<'static>,
    status_channel: &'static StatusChannel,
    reply_channel: &'static ReplyChannel,
    command_sender: CommandSender,
) {
    info!("HTTP: Server task {} starting on port 80...", task_id);
    let origin = task_id as u8;

    let app = picoserve::Router::new().route("/", get(serve_html)).route(
        "/ws",
        get(
            move |upgrade: picoserve::response::WebSocketUpgrade| async move {
                info!("HTTP: WebSocket upgrade requested (client {})", origin);

                // Ohne freie Subscriber-Slots HTTP 503 statt Panic
                match (status_channel.subscriber(), reply_channel.subscriber()) {
                    (Ok(status_subscriber), Ok(reply_subscriber)) => {
                        let handler = WebSocketHandler {
                            origin,
                            command_sender,
                            status_subscriber,
                            reply_subscriber,
                        };
                        WebSocketResponse::Upgrade(upgrade.on_upgrade(handler))
                    }
                    _ => {
                        warn!("HTTP: No subscriber slots available, sending HTTP 503");
                        WebSocketResponse::ServiceUnavailable
                    }
                }
            },
        ),
    );

    // Server-Konfiguration
    let config = picoserve::Config::new(picoserve::Timeouts {
        start_read_request: Some(Duration::from_secs(5)),
        read_request: Some(Duration::from_secs(1)),
        write: Some(Duration::from_secs(1)),
        persistent_start_read_request: Some(Duration::from_secs(5)),
    })
    .keep_connection_alive();

    let mut http_buffer = [0u8; HTTP_BUFFER_SIZE];
    let mut rx_buffer = [0u8; TCP_RX_BUFFER_SIZE];
    let mut tx_buffer = [0u8; TCP_TX_BUFFER_SIZE];

    let server = picoserve::Server::new(&app, &config, &mut http_buffer);

    let _ = server
        .listen_and_serve(task_id, *stack, 80, &mut rx_buffer, &mut tx_buffer)
        .await;

    info!("HTTP: Server task {} ended", task_id);
}

/// Serviert die HTML-Hauptseite
async fn serve_html() -> impl IntoResponse {
    picoserve::response::Response::new(picoserve::response::StatusCode::OK, INDEX_HTML)
        .with_header("Content-Type", "text/html; charset=utf-8")
}

/// WebSocket-Handler State einer Verbindung
struct WebSocketHandler {
    origin: u8,
    command_sender: CommandSender,
    status_subscriber: StatusSubscriber,
    reply_subscriber: ReplySubscriber,
}

impl ws::WebSocketCallback for WebSocketHandler {
    async fn run<R: embedded_io_async::Read, W: embedded_io_async::Write<Error = R::Error>>(
        mut self,
        mut rx: ws::SocketRx<R>,
        mut tx: ws::SocketTx<W>,
    ) -> Result<(), W::Error> {
        info!("HTTP: WebSocket connection established (client {})", self.origin);

        let mut buffer = [0u8; WEBSOCKET_BUFFER_SIZE];
        let mut assembler = LineAssembler::new();

        let close_reason = loop {
            // Gleichzeitig auf Browser-Nachrichten, Status-Broadcasts
            // und Antworten des Controllers warten
            match select3(
                rx.next_message(&mut buffer, pending()),
                self.status_subscriber.next_message_pure(),
                self.reply_subscriber.next_message_pure(),
            )
            .await
            {
                Either3::First(ws_result) => {
                    let ws_result = ws_result?.ignore_never_b();

                    match ws_result {
                        Ok(ws::Message::Text(data)) => {
                            info!("HTTP: Received text message: {} bytes", data.len());

                            // Ende der Nachricht beendet auch die Zeile
                            for byte in data.bytes().chain(core::iter::once(b'\n')) {
                                if let Some(line) = assembler.push(byte) {
                                    self.dispatch_line(&line, &mut tx).await?;
                                }
                            }
                        }
                        Ok(ws::Message::Binary(data)) => {
                            info!(
                                "HTTP: Received binary message: {} bytes (ignored)",
                                data.len()
                            );
                        }
                        Ok(ws::Message::Ping(data)) => {
                            tx.send_pong(data).await?;
                        }
                        Ok(ws::Message::Pong(_)) => {}
                        Ok(ws::Message::Close(_reason)) => {
                            info!("HTTP: WebSocket close received");
                            break None;
                        }
                        Err(error) => {
                            info!("HTTP: WebSocket error");
                            break Some((error.code(), "WebSocket Error"));
                        }
                    }
                }
                Either3::Second(status) => {
                    let message = WsServerMessage::Status {
                        status: &status,
                        timestamp_ms: Instant::now().as_millis(),
                    };
                    send_json(&mut tx, &message).await?;
                }
                Either3::Third(reply) => {
                    // Bestätigungen nur an den Absender
                    if reply.origin == self.origin {
                        send_json(&mut tx, &WsServerMessage::from_reply(&reply.text)).await?;
                    }
                }
            }
        };

        info!("HTTP: WebSocket connection closed (client {})", self.origin);
        tx.close(close_reason).await
    }
}

impl WebSocketHandler {
    /// Parst eine Zeile und reicht das Kommando an den Controller weiter
    ///
    /// Fehler mit Hinweistext gehen direkt an diesen Client zurück,
    /// alle anderen werden still verworfen.
    async fn dispatch_line<W: embedded_io_async::Write>(
        &self,
        line: &str,
        tx: &mut ws::SocketTx<W>,
    ) -> Result<(), W::Error> {
        match Command::parse(line) {
            Ok(command) => {
                info!("HTTP: Forwarding command: {}", command);
                self.command_sender
                    .send(CommandEnvelope {
                        origin: self.origin,
                        command,
                    })
                    .await;
            }
            Err(error) => {
                info!("HTTP: Rejected line '{}': {}", line, error);
                if let Some(notice) = error.notice() {
                    send_json(tx, &WsServerMessage::Error { message: notice }).await?;
                }
            }
        }

        Ok(())
    }
}

/// Serialisiert eine Nachricht und sendet sie als Text-Frame
async fn send_json<W: embedded_io_async::Write>(
    tx: &mut ws::SocketTx<W>,
    message: &WsServerMessage<'_>,
) -> Result<(), W::Error> {
    let mut json_buffer = [0u8; JSON_BUFFER_SIZE];
    match message.to_json(&mut json_buffer) {
        Some(json) => tx.send_text(json).await,
        None => {
            warn!("HTTP: JSON buffer too small, message dropped");
            Ok(())
        }
    }
}
