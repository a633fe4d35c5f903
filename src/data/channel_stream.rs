use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::oneshot;
use tokio_tungstenite::{connect_async, tungstenite::Message};

#[cfg(debug_assertions)]
use crate::config::DF;
use crate::engine::{ChannelConnector, ChannelEvent, ChannelHandle, ChannelKind, ChannelSignal};

/// WebSocket transport for both channels. One tokio task per open channel;
/// must be used from inside a tokio runtime.
#[derive(Debug, Default, Clone, Copy)]
pub struct WsConnector;

impl WsConnector {
    pub fn new() -> Self {
        Self
    }
}

impl ChannelConnector for WsConnector {
    fn open(
        &self,
        kind: ChannelKind,
        url: String,
        generation: u64,
        events: UnboundedSender<ChannelEvent>,
    ) -> ChannelHandle {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        tokio::spawn(run_channel(kind, url, generation, events, shutdown_rx));
        ChannelHandle::new(shutdown_tx)
    }
}

/// Pump one websocket into the event queue until it closes, fails, or the
/// handle is dropped. A dropped handle ends the task without a `Closed` event:
/// the manager already moved on.
async fn run_channel(
    kind: ChannelKind,
    url: String,
    generation: u64,
    events: UnboundedSender<ChannelEvent>,
    mut shutdown: oneshot::Receiver<()>,
) {
    // If the engine is gone there is nobody left to tell.
    let emit = |signal: ChannelSignal| {
        let _ = events.send(ChannelEvent::new(generation, kind, signal));
    };

    let connected = tokio::select! {
        result = connect_async(url.as_str()) => result,
        _ = &mut shutdown => {
            log::debug!("{}: closed while connecting to {}", kind, url);
            return;
        }
    };

    let ws_stream = match connected {
        Ok((ws_stream, _)) => ws_stream,
        Err(e) => {
            log::error!("{}: connection to {} failed: {}", kind, url, e);
            emit(ChannelSignal::Error(e.to_string()));
            emit(ChannelSignal::Closed);
            return;
        }
    };

    emit(ChannelSignal::Opened);
    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                let _ = write.send(Message::Close(None)).await;
                break;
            }
            msg = read.next() => match msg {
                Some(Ok(Message::Text(text))) => emit(ChannelSignal::Text(text.as_str().to_owned())),
                Some(Ok(Message::Binary(data))) => {
                    #[cfg(debug_assertions)]
                    if DF.log_frames {
                        log::debug!("{}: {} byte frame", kind, data.len());
                    }
                    emit(ChannelSignal::Binary(data.to_vec()));
                }
                Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) | Some(Ok(Message::Frame(_))) => {}
                Some(Ok(Message::Close(_))) | None => {
                    emit(ChannelSignal::Closed);
                    break;
                }
                Some(Err(e)) => {
                    log::error!("{}: websocket error: {}", kind, e);
                    emit(ChannelSignal::Error(e.to_string()));
                    emit(ChannelSignal::Closed);
                    break;
                }
            }
        }
    }
}
