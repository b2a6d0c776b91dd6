//! The WebSocket bridge: one pump task per client, relaying frames between
//! the transport and the player's table via the session and registry layers.
use actix_web::HttpRequest;
use actix_web::HttpResponse;
use actix_web::Responder;
use actix_web::web;
use futures::StreamExt;
use rvb_core::ID;
use rvb_core::PlayerId;
use rvb_core::Table;
use rvb_gameplay::Action;
use rvb_gameplay::protocol::ClientMessage;
use rvb_gameplay::protocol::ErrorCode;
use rvb_gameplay::protocol::ServerMessage;
use rvb_ledger::Ledger;
use rvb_registry::Registry;
use rvb_session::AuthError;
use rvb_session::SessionError;
use rvb_session::SessionManager;
use rvb_table::Command;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::mpsc::unbounded_channel;

/// Shared handles the bridge needs for every connection.
pub struct Gateway {
    pub registry: Arc<Registry>,
    pub sessions: Arc<SessionManager>,
    pub ledger: Arc<Ledger>,
}

enum Flow {
    Continue,
    Close,
}

/// `GET /ws`: upgrade and spawn the pump.
pub async fn connect(
    req: HttpRequest,
    body: web::Payload,
    gateway: web::Data<Gateway>,
) -> impl Responder {
    match actix_ws::handle(&req, body) {
        Ok((response, session, stream)) => {
            actix_web::rt::spawn(pump(gateway.into_inner(), session, stream));
            response
        }
        Err(e) => HttpResponse::InternalServerError().body(e.to_string()),
    }
}

async fn pump(
    gateway: Arc<Gateway>,
    mut session: actix_ws::Session,
    mut stream: actix_ws::MessageStream,
) {
    let (outbox, mut inbox) = unbounded_channel::<ServerMessage>();
    let mut player: Option<PlayerId> = None;
    log::debug!("[bridge] connected");
    'sesh: loop {
        tokio::select! {
            biased;
            message = inbox.recv() => match message {
                Some(message) => {
                    if let Some(player) = player {
                        note_delivery(&gateway, player, &message).await;
                    }
                    if session.text(message.to_json()).await.is_err() {
                        break 'sesh;
                    }
                }
                None => break 'sesh,
            },
            frame = stream.next() => match frame {
                Some(Ok(actix_ws::Message::Text(text))) => {
                    match serde_json::from_str::<ClientMessage>(&text) {
                        Ok(message) => {
                            if let Flow::Close =
                                handle(&gateway, &mut player, &outbox, message).await
                            {
                                break 'sesh;
                            }
                        }
                        Err(e) => {
                            let _ = outbox.send(ServerMessage::error(
                                ErrorCode::InvalidAction,
                                format!("unparseable message: {}", e),
                            ));
                        }
                    }
                }
                Some(Ok(actix_ws::Message::Close(_))) => break 'sesh,
                Some(Ok(_)) => continue 'sesh,
                Some(Err(_)) | None => break 'sesh,
            },
        }
    }
    if let Some(player) = player {
        // the seat survives the transport for the grace window
        gateway.registry.disconnect(player).await;
        gateway.sessions.close(player).await;
    }
    log::debug!("[bridge] disconnected");
}

/// Record what sequence number this recipient has now seen, so a later
/// REQ_RECONNECT can tell us where they left off.
async fn note_delivery(gateway: &Gateway, player: PlayerId, message: &ServerMessage) {
    let seq = match message {
        ServerMessage::GameSnapshot(snapshot) => Some(snapshot.sequence_id),
        ServerMessage::StatePatch(patch) => Some(patch.sequence_id),
        _ => None,
    };
    if let Some(seq) = seq {
        gateway.sessions.record_delivery(player, seq).await;
    }
}

async fn handle(
    gateway: &Gateway,
    player: &mut Option<PlayerId>,
    outbox: &UnboundedSender<ServerMessage>,
    message: ClientMessage,
) -> Flow {
    match message {
        ClientMessage::ReqJoin {
            auth_ticket,
            table_id,
        } => authenticate(gateway, player, outbox, &auth_ticket, table_id, None).await,
        ClientMessage::ReqReconnect {
            auth_ticket,
            table_id,
            last_sequence_id,
        } => {
            authenticate(
                gateway,
                player,
                outbox,
                &auth_ticket,
                table_id,
                Some(last_sequence_id),
            )
            .await
        }
        ClientMessage::ReqSit { seat_index, buy_in } => {
            let Some(player) = *player else {
                return deny(outbox, ErrorCode::AuthFailed, "join first");
            };
            // advisory check: the balance is not reserved, the ledger
            // re-validates every delta at settlement
            match gateway.ledger.balance(player).await {
                Ok(Some(chips)) if chips >= buy_in => {
                    route(
                        gateway,
                        outbox,
                        player,
                        Command::Sit {
                            player,
                            seat: seat_index,
                            buy_in,
                        },
                    )
                    .await
                }
                Ok(_) => deny(outbox, ErrorCode::InsufficientChips, "buy-in exceeds balance"),
                Err(e) => {
                    log::error!("[bridge] balance lookup failed: {}", e);
                    deny(outbox, ErrorCode::InsufficientChips, "ledger unavailable")
                }
            }
        }
        ClientMessage::ReqReady {} => match *player {
            Some(player) => route(gateway, outbox, player, Command::Ready { player }).await,
            None => deny(outbox, ErrorCode::AuthFailed, "join first"),
        },
        ClientMessage::ReqAction { r#type, amount } => {
            let Some(player) = *player else {
                return deny(outbox, ErrorCode::AuthFailed, "join first");
            };
            match Action::try_from((r#type, amount)) {
                Ok(action) => {
                    route(gateway, outbox, player, Command::Act { player, action }).await
                }
                Err(code) => deny(outbox, code, "malformed action"),
            }
        }
        ClientMessage::ReqSocial(gesture) => match *player {
            Some(player) => route(gateway, outbox, player, Command::Social { player, gesture }).await,
            None => deny(outbox, ErrorCode::AuthFailed, "join first"),
        },
        ClientMessage::ReqLeave {} => {
            if let Some(player) = player.take() {
                gateway.registry.leave(player).await;
                gateway.sessions.destroy(player).await;
            }
            Flow::Close
        }
    }
}

async fn authenticate(
    gateway: &Gateway,
    player: &mut Option<PlayerId>,
    outbox: &UnboundedSender<ServerMessage>,
    ticket: &str,
    table: ID<Table>,
    last_seq: Option<rvb_core::Seq>,
) -> Flow {
    let opened = match last_seq {
        None => gateway.sessions.open(ticket, outbox.clone()).await,
        Some(seq) => gateway.sessions.rebind(ticket, outbox.clone(), seq).await,
    };
    let (profile, token) = match opened {
        Ok(ok) => ok,
        Err(e) => {
            let code = match e {
                SessionError::Auth(AuthError::InvalidTicket) => ErrorCode::InvalidTicket,
                SessionError::Auth(AuthError::Unavailable) => ErrorCode::AuthFailed,
                SessionError::Expired => ErrorCode::AuthFailed,
            };
            let _ = outbox.send(ServerMessage::AuthFailure {
                code,
                message: Some(e.to_string()),
            });
            return Flow::Continue;
        }
    };
    if let Err(e) = gateway
        .ledger
        .find_or_create(profile.id, &profile.name)
        .await
    {
        log::error!("[bridge] user upsert failed for {}: {}", profile.id, e);
        let _ = outbox.send(ServerMessage::AuthFailure {
            code: ErrorCode::AuthFailed,
            message: Some("account unavailable".to_string()),
        });
        return Flow::Continue;
    }
    let _ = outbox.send(ServerMessage::AuthSuccess {
        steam_id: profile.id,
        display_name: profile.name.clone(),
        session_token: token,
    });
    match gateway
        .registry
        .join(profile.id, profile.name, table, outbox.clone())
        .await
    {
        Ok(()) => {
            *player = Some(profile.id);
            Flow::Continue
        }
        Err(code) => deny(outbox, code, "cannot join table"),
    }
}

async fn route(
    gateway: &Gateway,
    outbox: &UnboundedSender<ServerMessage>,
    player: PlayerId,
    command: Command,
) -> Flow {
    match gateway.registry.route(player, command).await {
        Ok(()) => Flow::Continue,
        Err(code) => deny(outbox, code, "not bound to a table"),
    }
}

fn deny(outbox: &UnboundedSender<ServerMessage>, code: ErrorCode, message: &str) -> Flow {
    let _ = outbox.send(ServerMessage::error(code, message));
    Flow::Continue
}
