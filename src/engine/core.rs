use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::time::{Instant, MissedTickBehavior, interval, sleep, sleep_until};

use crate::analysis::Classifier;
use crate::config::{EndpointSettings, Lexicon, STREAM};
#[cfg(debug_assertions)]
use crate::config::DF;
use crate::domain::{Alert, AlertPayload, IncomingAlert};
use crate::error::{EngineError, Result};
use crate::sink::PresentationSink;

use super::aggregator::{Acceptance, Aggregator};
use super::channels::{ChannelConnector, ChannelManager, Transition};
use super::messages::{ChannelEvent, ChannelSignal, EngineCommand, Frame};
use super::state::{ChannelKind, CombinedStatus};

/// The console engine: both channels, the aggregator, and the sink they feed.
///
/// Single consumer. Every event runs to completion in `handle_event` before
/// the next one is taken, so aggregator state needs no locking.
pub struct AlertEngine<S: PresentationSink> {
    channels: ChannelManager,
    aggregator: Aggregator,
    sink: S,
    events_rx: UnboundedReceiver<ChannelEvent>,
}

impl<S: PresentationSink> AlertEngine<S> {
    pub fn new(
        endpoints: EndpointSettings,
        lexicon: &Lexicon,
        connector: Box<dyn ChannelConnector>,
        sink: S,
    ) -> Self {
        let (events_tx, events_rx) = unbounded_channel();
        Self {
            channels: ChannelManager::new(connector, endpoints, events_tx),
            aggregator: Aggregator::new(Classifier::new(lexicon)),
            sink,
            events_rx,
        }
    }

    pub fn channels(&self) -> &ChannelManager {
        &self.channels
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn status(&self) -> CombinedStatus {
        self.channels.status()
    }

    pub fn alert_at(&self, index: usize) -> Result<&Alert> {
        self.aggregator.alert_at(index)
    }

    pub fn connect(&mut self) {
        let transition = self.channels.connect();
        self.apply(transition);
    }

    /// Tear down both channels. History and counters are kept.
    pub fn disconnect(&mut self) {
        let transition = self.channels.disconnect();
        self.apply(transition);
    }

    /// Disconnect, give the backend a moment, connect again. Holds the caller
    /// for the whole pause; `run` schedules the connect half instead.
    pub async fn reconnect(&mut self) {
        self.disconnect();
        sleep(STREAM.schedule.reconnect_pause).await;
        self.connect();
    }

    /// Push the detail view for one history entry.
    pub fn show_detail(&mut self, index: usize) -> Result<()> {
        let alert = self.aggregator.alert_at(index)?;
        self.sink.on_detail_requested(index, alert);
        Ok(())
    }

    /// Wait for the next transport event.
    pub async fn next_event(&mut self) -> Option<ChannelEvent> {
        self.events_rx.recv().await
    }

    /// Handle every event already queued. Returns how many were taken.
    pub fn process_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event);
            handled += 1;
        }
        handled
    }

    pub fn handle_event(&mut self, event: ChannelEvent) {
        if !self.channels.is_current(&event) {
            #[cfg(debug_assertions)]
            if DF.log_stale_events {
                log::debug!(
                    "Dropping stale {:?} from {} (generation {} < {})",
                    event.signal,
                    event.kind,
                    event.generation,
                    self.channels.generation()
                );
            }
            return;
        }

        let kind = event.kind;
        match event.signal {
            ChannelSignal::Opened => {
                log::info!("{} connected", kind);
                let transition = self.channels.on_open(kind);
                self.apply(transition);
            }
            ChannelSignal::Text(text) => match kind {
                ChannelKind::Alert => self.on_alert_text(&text),
                ChannelKind::Video => log::debug!("Ignoring text frame on {}", kind),
            },
            ChannelSignal::Binary(bytes) => match kind {
                ChannelKind::Video => {
                    #[cfg(debug_assertions)]
                    if DF.log_frames {
                        log::debug!("Frame: {} bytes", bytes.len());
                    }
                    self.sink.on_frame(Frame::new(bytes));
                }
                ChannelKind::Alert => {
                    log::warn!("Binary payload on {} dropped ({} bytes)", kind, bytes.len());
                    self.sink
                        .on_channel_error(kind, "Malformed message: unexpected binary payload");
                }
            },
            ChannelSignal::Error(message) => {
                log::error!("{} error: {}", kind, message);
                self.sink.on_channel_error(kind, &message);
                let transition = self.channels.on_error(kind);
                self.apply(transition);
            }
            ChannelSignal::Closed => {
                log::info!("{} closed", kind);
                let transition = self.channels.on_closed(kind);
                self.apply(transition);
            }
        }
    }

    /// Monitor-duration tick. Silent while offline.
    pub fn tick(&mut self) {
        if let Some(elapsed) = self.channels.session_elapsed() {
            self.sink.on_monitor_tick(elapsed);
        }
    }

    /// Event loop: transport events, operator commands and the 1-second monitor
    /// tick, one at a time. Returns after `Shutdown` or when the command side hangs up.
    ///
    /// The connect half of a `Reconnect` is a deadline inside the loop, so
    /// commands (`Shutdown` included) are still served during the pause.
    pub async fn run(&mut self, mut commands: UnboundedReceiver<EngineCommand>) {
        let mut ticker = interval(STREAM.schedule.monitor_tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut reconnect_at: Option<Instant> = None;

        loop {
            let was_online = self.status().is_online();
            let reconnect_deadline = reconnect_at.unwrap_or_else(Instant::now);
            tokio::select! {
                Some(event) = self.events_rx.recv() => self.handle_event(event),
                command = commands.recv() => match command {
                    Some(EngineCommand::Connect) => {
                        reconnect_at = None;
                        self.connect();
                    }
                    Some(EngineCommand::Disconnect) => {
                        reconnect_at = None;
                        self.disconnect();
                    }
                    Some(EngineCommand::Reconnect) => {
                        self.disconnect();
                        reconnect_at = Some(Instant::now() + STREAM.schedule.reconnect_pause);
                    }
                    Some(EngineCommand::ShowDetail(index)) => {
                        if let Err(e) = self.show_detail(index) {
                            log::warn!("Detail request failed: {}", e);
                            self.sink.on_notification_requested(&e.to_string());
                        }
                    }
                    Some(EngineCommand::Shutdown) | None => {
                        self.disconnect();
                        break;
                    }
                },
                _ = sleep_until(reconnect_deadline), if reconnect_at.is_some() => {
                    reconnect_at = None;
                    self.connect();
                }
                _ = ticker.tick(), if was_online => self.tick(),
            }

            if !was_online && self.status().is_online() {
                // first tick one period after going online
                ticker.reset();
            }
        }
    }

    fn on_alert_text(&mut self, text: &str) {
        #[cfg(debug_assertions)]
        if DF.log_alert_payloads {
            log::debug!("Alert payload: {}", text);
        }

        let payload = match AlertPayload::decode(text) {
            Ok(payload) => payload,
            Err(e) => return self.drop_malformed(e),
        };

        // Heartbeat and empty checks look only at `alert`; the timestamp is
        // validated for messages that survive them.
        if let Some(reason) = self.aggregator.screen(payload.alert.as_deref()) {
            log::debug!("Alert message rejected: {:?}", reason);
            return;
        }

        let incoming = match IncomingAlert::try_from(payload) {
            Ok(incoming) => incoming,
            Err(e) => return self.drop_malformed(e),
        };

        match self.aggregator.accept(incoming) {
            Acceptance::Accepted(accepted) => {
                self.sink
                    .on_alert_accepted(&accepted.alert, accepted.sequence_number);
                self.sink.on_stats_changed(
                    &accepted.counts,
                    accepted.today_count,
                    accepted.total_count,
                );
                if accepted.show_detail {
                    self.sink.on_detail_requested(0, &accepted.alert);
                }
                self.sink.on_notification_requested(&accepted.preview);
            }
            Acceptance::Rejected(reason) => {
                log::debug!("Alert message rejected: {:?}", reason);
            }
        }
    }

    fn drop_malformed(&mut self, e: EngineError) {
        log::warn!("Dropping alert message: {}", e);
        self.sink.on_channel_error(ChannelKind::Alert, &e.to_string());
    }

    fn apply(&mut self, transition: Transition) {
        for (kind, state) in transition.channels {
            self.sink.on_channel_state(kind, state);
        }

        if let Some(status) = transition.status {
            match (status, self.channels.session_started_at()) {
                (CombinedStatus::Online, Some(started_at)) => self.aggregator.start(started_at),
                _ => self.aggregator.stop(),
            }
            self.sink.on_status_changed(status);
        }
    }
}

/// Sender half handed to whatever drives the engine (CLI, UI, signal handler).
pub fn command_channel() -> (UnboundedSender<EngineCommand>, UnboundedReceiver<EngineCommand>) {
    unbounded_channel()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Category;
    use crate::engine::{ChannelHandle, ChannelState};
    use crate::sink::{RecordingSink, SinkCall};
    use std::cell::RefCell;
    use std::rc::Rc;
    use ChannelKind::{Alert, Video};

    /// Hands the event sender back to the test instead of opening sockets.
    #[derive(Clone, Default)]
    struct LoopbackConnector {
        senders: Rc<RefCell<Vec<(ChannelKind, u64, UnboundedSender<ChannelEvent>)>>>,
    }

    impl ChannelConnector for LoopbackConnector {
        fn open(
            &self,
            kind: ChannelKind,
            _url: String,
            generation: u64,
            events: UnboundedSender<ChannelEvent>,
        ) -> ChannelHandle {
            self.senders.borrow_mut().push((kind, generation, events));
            ChannelHandle::detached()
        }
    }

    fn engine() -> (AlertEngine<RecordingSink>, LoopbackConnector) {
        let connector = LoopbackConnector::default();
        let engine = AlertEngine::new(
            EndpointSettings::default(),
            &Lexicon::default(),
            Box::new(connector.clone()),
            RecordingSink::new(),
        );
        (engine, connector)
    }

    fn signal(engine: &mut AlertEngine<RecordingSink>, kind: ChannelKind, signal: ChannelSignal) {
        let generation = engine.channels().generation();
        engine.handle_event(ChannelEvent::new(generation, kind, signal));
    }

    fn alert_json(text: &str) -> ChannelSignal {
        ChannelSignal::Text(
            serde_json::json!({
                "alert": text,
                "timestamp": chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
                "picture_file_name": "p.jpg",
            })
            .to_string(),
        )
    }

    fn online(engine: &mut AlertEngine<RecordingSink>) {
        engine.connect();
        signal(engine, Alert, ChannelSignal::Opened);
        assert_eq!(engine.status(), CombinedStatus::Online);
    }

    #[test]
    fn video_error_and_close_keep_session_online() {
        let (mut engine, _) = engine();
        engine.connect();
        assert!(engine.sink().statuses().is_empty());

        signal(&mut engine, Alert, ChannelSignal::Opened);
        signal(&mut engine, Video, ChannelSignal::Error("connection reset".into()));
        signal(&mut engine, Video, ChannelSignal::Closed);

        assert_eq!(engine.status(), CombinedStatus::Online);
        assert_eq!(engine.sink().statuses(), vec![CombinedStatus::Online]);
        assert_eq!(engine.channels().state(Video), ChannelState::ClosedWithError);
        assert!(engine.sink().calls.contains(&SinkCall::ChannelError(
            Video,
            "connection reset".to_string()
        )));
        assert!(engine.aggregator().session_start().is_some());
    }

    #[test]
    fn both_channels_down_goes_offline_and_stops_ticks() {
        let (mut engine, _) = engine();
        online(&mut engine);
        signal(&mut engine, Video, ChannelSignal::Opened);

        engine.tick();
        assert_eq!(engine.sink().count(|c| matches!(c, SinkCall::MonitorTick(_))), 1);

        signal(&mut engine, Video, ChannelSignal::Closed);
        assert_eq!(engine.status(), CombinedStatus::Online);
        signal(&mut engine, Alert, ChannelSignal::Error("eof".into()));
        assert_eq!(engine.status(), CombinedStatus::Online);
        signal(&mut engine, Alert, ChannelSignal::Closed);
        assert_eq!(engine.status(), CombinedStatus::Offline);
        assert_eq!(
            engine.sink().statuses(),
            vec![CombinedStatus::Online, CombinedStatus::Offline]
        );
        assert_eq!(engine.aggregator().status(), CombinedStatus::Offline);

        engine.tick();
        assert_eq!(engine.sink().count(|c| matches!(c, SinkCall::MonitorTick(_))), 1);
    }

    #[test]
    fn accepted_alert_reaches_sink_in_order() {
        let (mut engine, _) = engine();
        online(&mut engine);
        engine.sink_mut().clear();

        signal(&mut engine, Alert, alert_json("检测到车辆违规行驶"));

        let calls = &engine.sink().calls;
        assert_eq!(calls.len(), 4);
        assert_eq!(
            calls[0],
            SinkCall::AlertAccepted {
                sequence_number: 1,
                category: Category::TrafficViolation,
                text: "检测到车辆违规行驶".to_string(),
            }
        );
        let SinkCall::StatsChanged { counts, today_count, total_count } = &calls[1] else {
            panic!("expected stats, got {:?}", calls[1]);
        };
        assert_eq!(counts.get(Category::TrafficViolation), 1);
        assert_eq!((*today_count, *total_count), (1, 1));
        assert_eq!(calls[2], SinkCall::DetailRequested(0));
        assert_eq!(calls[3], SinkCall::Notification("检测到车辆违规行驶".to_string()));

        signal(&mut engine, Alert, alert_json("有人跌倒"));
        // only the first alert of a session selects itself
        assert_eq!(engine.sink().count(|c| matches!(c, SinkCall::DetailRequested(_))), 1);
        assert_eq!(engine.alert_at(0).unwrap().category(), Category::PersonFall);
        assert_eq!(engine.alert_at(1).unwrap().image_url().as_deref(), Some("/video_warning/p.jpg"));
    }

    #[test]
    fn heartbeats_produce_no_sink_calls() {
        let (mut engine, _) = engine();
        online(&mut engine);
        signal(&mut engine, Alert, alert_json("检测到车辆违规行驶"));
        engine.sink_mut().clear();

        signal(&mut engine, Alert, alert_json("无异常"));
        signal(&mut engine, Alert, alert_json("<p>画面无异常</p>"));
        signal(&mut engine, Alert, alert_json(""));

        assert!(engine.sink().calls.is_empty());
        assert_eq!(engine.aggregator().total_count(), 1);
    }

    #[test]
    fn heartbeats_with_broken_timestamps_stay_silent() {
        let (mut engine, _) = engine();
        online(&mut engine);
        engine.sink_mut().clear();

        for text in [
            r#"{"alert":"无异常"}"#,
            r#"{"alert":"无异常","timestamp":"2024-05-01-10-00-00"}"#,
            r#"{"alert":"<b>画面无异常</b>","timestamp":null}"#,
            r#"{"alert":null}"#,
            r#"{"alert":"","timestamp":"later"}"#,
        ] {
            signal(&mut engine, Alert, ChannelSignal::Text(text.into()));
        }

        assert!(engine.sink().calls.is_empty(), "{:?}", engine.sink().calls);
        assert_eq!(engine.aggregator().total_count(), 0);

        // a real alert with the same broken timestamp is still malformed
        signal(
            &mut engine,
            Alert,
            ChannelSignal::Text(r#"{"alert":"车辆逆行","timestamp":"2024-05-01-10-00-00"}"#.into()),
        );
        assert_eq!(engine.sink().count(|c| matches!(c, SinkCall::ChannelError(Alert, _))), 1);
    }

    #[test]
    fn malformed_payload_is_reported_and_channel_survives() {
        let (mut engine, _) = engine();
        online(&mut engine);
        engine.sink_mut().clear();

        signal(&mut engine, Alert, ChannelSignal::Text("{not json".into()));
        signal(&mut engine, Alert, ChannelSignal::Text(r#"{"alert":"车辆"}"#.into()));
        signal(&mut engine, Alert, ChannelSignal::Binary(vec![1, 2, 3]));

        assert_eq!(engine.sink().count(|c| matches!(c, SinkCall::ChannelError(Alert, _))), 3);
        assert_eq!(engine.aggregator().total_count(), 0);
        assert_eq!(engine.channels().state(Alert), ChannelState::Open);
        assert_eq!(engine.status(), CombinedStatus::Online);
    }

    #[test]
    fn frames_go_straight_to_sink() {
        let (mut engine, _) = engine();
        engine.connect();
        signal(&mut engine, Video, ChannelSignal::Opened);
        signal(&mut engine, Video, ChannelSignal::Binary(vec![0xFF; 1024]));
        signal(&mut engine, Video, ChannelSignal::Text("ignored".into()));

        assert_eq!(engine.sink().count(|c| matches!(c, SinkCall::Frame(1024))), 1);
        assert_eq!(engine.status(), CombinedStatus::Online);
        assert_eq!(engine.aggregator().total_count(), 0);
    }

    #[test]
    fn late_events_after_disconnect_are_ignored() {
        let (mut engine, connector) = engine();
        online(&mut engine);
        let stale_generation = engine.channels().generation();

        engine.disconnect();
        engine.sink_mut().clear();

        for signal in [
            ChannelSignal::Opened,
            alert_json("车辆逆行"),
            ChannelSignal::Error("late".into()),
            ChannelSignal::Closed,
        ] {
            engine.handle_event(ChannelEvent::new(stale_generation, Alert, signal));
        }

        assert!(engine.sink().calls.is_empty());
        assert_eq!(engine.status(), CombinedStatus::Offline);
        assert_eq!(engine.aggregator().total_count(), 0);
        assert_eq!(connector.senders.borrow().len(), 2);
    }

    #[test]
    fn disconnect_then_connect_keeps_history() {
        let (mut engine, _) = engine();
        online(&mut engine);
        signal(&mut engine, Alert, alert_json("车辆逆行"));
        signal(&mut engine, Alert, alert_json("人群聚集"));

        engine.disconnect();
        assert_eq!(engine.status(), CombinedStatus::Offline);
        assert_eq!(engine.aggregator().session_start(), None);
        assert_eq!(engine.sink().statuses().last(), Some(&CombinedStatus::Offline));

        online(&mut engine);
        assert_eq!(engine.aggregator().total_count(), 2);
        assert_eq!(engine.aggregator().counts().get(Category::Crowding), 1);
        assert_eq!(engine.alert_at(1).unwrap().category(), Category::TrafficViolation);
    }

    #[test]
    fn show_detail_out_of_range() {
        let (mut engine, _) = engine();
        assert!(engine.show_detail(0).is_err());
        online(&mut engine);
        signal(&mut engine, Alert, alert_json("可疑物品"));
        engine.sink_mut().clear();
        engine.show_detail(0).unwrap();
        assert_eq!(engine.sink().calls, vec![SinkCall::DetailRequested(0)]);
        assert!(matches!(
            engine.show_detail(1),
            Err(crate::error::EngineError::IndexOutOfRange { index: 1, len: 1 })
        ));
    }

    #[test]
    fn queued_events_are_drained_fifo() {
        let (mut engine, connector) = engine();
        engine.connect();
        {
            let senders = connector.senders.borrow();
            let (_, generation, alert_tx) = &senders[0];
            alert_tx
                .send(ChannelEvent::new(*generation, Alert, ChannelSignal::Opened))
                .unwrap();
            for text in ["车辆逆行", "无异常", "人员摔倒"] {
                alert_tx
                    .send(ChannelEvent::new(*generation, Alert, alert_json(text)))
                    .unwrap();
            }
        }

        assert_eq!(engine.process_pending(), 4);
        assert_eq!(engine.aggregator().total_count(), 2);
        assert_eq!(engine.alert_at(0).unwrap().category(), Category::PersonFall);
        assert_eq!(engine.process_pending(), 0);
    }

    #[tokio::test]
    async fn run_loop_handles_commands_and_shutdown() {
        let (mut engine, connector) = engine();
        let (commands_tx, commands_rx) = command_channel();

        commands_tx.send(EngineCommand::Connect).unwrap();
        commands_tx.send(EngineCommand::ShowDetail(5)).unwrap();
        commands_tx.send(EngineCommand::Shutdown).unwrap();
        engine.run(commands_rx).await;

        assert_eq!(connector.senders.borrow().len(), 2);
        assert_eq!(engine.status(), CombinedStatus::Offline);
        assert_eq!(engine.channels().state(Alert), ChannelState::Disconnected);
        assert!(
            engine
                .sink()
                .count(|c| matches!(c, SinkCall::Notification(text) if text.contains("Index out of range")))
                == 1
        );
    }

    #[tokio::test]
    async fn shutdown_is_served_during_reconnect_pause() {
        let (mut engine, connector) = engine();
        let (commands_tx, commands_rx) = command_channel();

        commands_tx.send(EngineCommand::Connect).unwrap();
        commands_tx.send(EngineCommand::Reconnect).unwrap();
        commands_tx.send(EngineCommand::Shutdown).unwrap();

        let pause = STREAM.schedule.reconnect_pause;
        tokio::time::timeout(pause / 2, engine.run(commands_rx))
            .await
            .expect("shutdown waited for the reconnect pause");

        // the pending connect half never ran
        assert_eq!(connector.senders.borrow().len(), 2);
        assert_eq!(engine.channels().state(Alert), ChannelState::Disconnected);
    }

    #[tokio::test]
    async fn reconnect_opens_a_new_generation_after_the_pause() {
        let (mut engine, connector) = engine();
        let (commands_tx, commands_rx) = command_channel();

        commands_tx.send(EngineCommand::Connect).unwrap();
        commands_tx.send(EngineCommand::Reconnect).unwrap();
        let later = commands_tx.clone();
        tokio::spawn(async move {
            sleep(STREAM.schedule.reconnect_pause + std::time::Duration::from_millis(300)).await;
            let _ = later.send(EngineCommand::Shutdown);
        });
        engine.run(commands_rx).await;

        let generations: Vec<u64> = connector.senders.borrow().iter().map(|(_, g, _)| *g).collect();
        assert_eq!(generations, vec![1, 1, 3, 3]);
    }
}
