//! Chat transport — the IRC channel relays gossip over.
//!
//! One long-lived connection: register, OPER once the MOTD is done (if
//! credentials are configured), join the channel, then pump lines both ways.
//! Channel messages go to [`GossipRelay::receive`]; the relay's outbound
//! queue is written out as PRIVMSGs at a paced rate. The connection is
//! re-established after a drop. Whatever was queued while the connection was
//! down is discarded: the next publish tick re-sends current data.

pub mod message;

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc};
use tokio::time::MissedTickBehavior;

use dsrelay_core::config::IrcConfig;
use dsrelay_services::{GossipRelay, OutboundReport};

use message::{sanitize, IrcMessage};

const RPL_ENDOFMOTD: &str = "376";
const ERR_NOMOTD: &str = "422";
const ERR_NICKNAMEINUSE: &str = "433";

pub struct IrcClient {
    config: IrcConfig,
    relay: GossipRelay,
    outbound: mpsc::Receiver<OutboundReport>,
    shutdown: broadcast::Receiver<()>,
}

impl IrcClient {
    pub fn new(
        config: IrcConfig,
        relay: GossipRelay,
        outbound: mpsc::Receiver<OutboundReport>,
        shutdown: broadcast::Receiver<()>,
    ) -> Self {
        Self {
            config,
            relay,
            outbound,
            shutdown,
        }
    }

    /// Connect and serve until shutdown, reconnecting after each drop.
    pub async fn run(self) {
        let IrcClient {
            config,
            relay,
            mut outbound,
            mut shutdown,
        } = self;

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("irc client shutting down");
                    return;
                }
                result = session(&config, &relay, &mut outbound) => match result {
                    Ok(()) => tracing::warn!(host = %config.host, "irc connection closed by server"),
                    Err(e) => tracing::warn!(host = %config.host, error = %e, "irc connection failed"),
                }
            }

            tracing::info!(delay_secs = config.reconnect_secs, "irc reconnecting");
            tokio::select! {
                _ = shutdown.recv() => return,
                _ = tokio::time::sleep(config.reconnect_delay()) => {}
            }

            let stale = discard_backlog(&mut outbound);
            if stale > 0 {
                tracing::info!(stale, "dropped gossip queued while disconnected");
            }
        }
    }
}

/// Per-connection registration state.
struct Registration {
    nick: String,
    joined: bool,
}

async fn session(
    config: &IrcConfig,
    relay: &GossipRelay,
    outbound: &mut mpsc::Receiver<OutboundReport>,
) -> Result<()> {
    let stream = TcpStream::connect((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("failed to connect to {}:{}", config.host, config.port))?;
    tracing::info!(host = %config.host, port = config.port, "irc connected");

    let (read, mut write) = stream.into_split();
    let mut lines = BufReader::new(read).lines();

    let mut reg = Registration {
        nick: config.nick.clone(),
        joined: false,
    };
    let mut pace = tokio::time::interval(config.send_interval().max(Duration::from_millis(1)));
    pace.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut may_send = false;
    send_line(&mut write, &format!("NICK {}", reg.nick)).await?;
    send_line(&mut write, &format!("USER {} 0 * :{}", reg.nick, reg.nick)).await?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("irc read failed")? else {
                    return Ok(());
                };
                handle_line(config, relay, &mut write, &mut reg, &line).await?;
            }

            _ = pace.tick(), if reg.joined && !may_send => {
                may_send = true;
            }

            Some(report) = outbound.recv(), if may_send => {
                send_line(&mut write, &format!("PRIVMSG {} :{}", config.channel, report.line)).await?;
                relay.mark_published(report.steamid, Instant::now());
                may_send = false;
            }
        }
    }
}

async fn handle_line(
    config: &IrcConfig,
    relay: &GossipRelay,
    write: &mut OwnedWriteHalf,
    reg: &mut Registration,
    line: &str,
) -> Result<()> {
    let Some(msg) = IrcMessage::parse(line) else {
        return Ok(());
    };

    match msg.command {
        "PING" => {
            let token = msg.params.first().copied().unwrap_or("");
            send_line(write, &format!("PONG :{}", token)).await?;
        }
        RPL_ENDOFMOTD | ERR_NOMOTD if !reg.joined => {
            if let Some((user, pass)) = config.oper_credentials() {
                send_line(write, &format!("OPER {} {}", user, pass)).await?;
            }
            send_line(write, &format!("JOIN {}", config.channel)).await?;
            reg.joined = true;
            tracing::info!(channel = %config.channel, nick = %reg.nick, "irc joined");
        }
        ERR_NICKNAMEINUSE => {
            reg.nick.push('_');
            tracing::warn!(nick = %reg.nick, "nick in use, retrying");
            send_line(write, &format!("NICK {}", reg.nick)).await?;
        }
        "PRIVMSG" => {
            if let [target, text] = msg.params.as_slice() {
                if target.eq_ignore_ascii_case(&config.channel) {
                    let report = relay.receive(text, Instant::now());
                    tracing::trace!(from = msg.nick().unwrap_or("?"), report, "channel message");
                }
            }
        }
        _ => {}
    }
    Ok(())
}

/// Drop every queued report without sending it. Returns how many.
fn discard_backlog(outbound: &mut mpsc::Receiver<OutboundReport>) -> usize {
    let mut dropped = 0;
    while outbound.try_recv().is_ok() {
        dropped += 1;
    }
    dropped
}

async fn send_line(write: &mut OwnedWriteHalf, line: &str) -> Result<()> {
    let mut out = sanitize(line);
    out.push_str("\r\n");
    write
        .write_all(out.as_bytes())
        .await
        .context("irc write failed")
}
