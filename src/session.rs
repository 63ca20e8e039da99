//! Gesture typing session
//!
//! The [`Session`] is the single owner of all cross-frame state: the cursor
//! accumulator, the click edge state, the key layout and the text buffer.
//! Frames, UI commands and finished text-service requests are all delivered
//! to it as messages and handled one at a time, so nothing here needs a lock.

use crate::click::ClickEdgeDetector;
use crate::config::HandTypeConfig;
use crate::cursor::CursorFilter;
use crate::dispatch::{ActionDispatcher, TextRequest, TextRequestKind, TextUpdate};
use crate::gesture::{self, GestureParams};
use crate::layout::{KeyGeometry, KeyLayout, QwertyGeometry};
use crate::llm::TextConnector;
use crate::types::{
    FrameSnapshot, GestureMode, KeyEvent, KeyRect, LandmarkFrame, Point2D, ScreenSize,
    SessionStatus,
};
use crate::vision::LandmarkSource;
use crossbeam_channel::Sender;
use std::time::Duration;
use tokio::sync::mpsc;

/// Requests from the UI, serialized onto the session loop
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    /// Keyboard was mounted: measure now and again after the settle delay
    Mount,
    Resize(ScreenSize),
    /// Externally measured key geometry; `None` means no container yet
    Layout(Option<Vec<KeyRect>>),
    /// A key activated outside the gesture path (mouse, touch)
    Key(String),
    /// Explicit autocomplete trigger
    Complete,
    Tune {
        pinch_threshold: Option<f32>,
        extension_threshold: Option<f32>,
        cursor_smoothing: Option<f32>,
    },
    /// Forget the cursor accumulator and click state
    Restart,
    Shutdown,
}

#[derive(Debug)]
enum SessionMsg {
    Command(SessionCommand),
    Text(TextUpdate),
    Settle,
}

/// Cloneable handle for posting commands into a running session.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::UnboundedSender<SessionMsg>,
}

impl SessionHandle {
    /// Returns `false` once the session is gone.
    pub fn send(&self, command: SessionCommand) -> bool {
        self.tx.send(SessionMsg::Command(command)).is_ok()
    }
}

pub struct Session {
    config: HandTypeConfig,
    params: GestureParams,
    screen: ScreenSize,
    cursor: CursorFilter,
    click: ClickEdgeDetector,
    layout: KeyLayout,
    geometry: Box<dyn KeyGeometry>,
    dispatcher: ActionDispatcher,
    text: TextConnector,
    mode: GestureMode,
    display_cursor: Option<Point2D>,
    hovered: Option<String>,
    status: SessionStatus,
    outbox: Vec<TextRequest>,
    msg_tx: mpsc::UnboundedSender<SessionMsg>,
    msg_rx: Option<mpsc::UnboundedReceiver<SessionMsg>>,
    output_tx: Option<Sender<FrameSnapshot>>,
}

impl Session {
    pub fn new(config: HandTypeConfig, text: TextConnector) -> Self {
        Self::with_geometry(config, text, Box::new(QwertyGeometry::default()))
    }

    pub fn with_geometry(
        config: HandTypeConfig,
        text: TextConnector,
        geometry: Box<dyn KeyGeometry>,
    ) -> Self {
        let (msg_tx, msg_rx) = mpsc::unbounded_channel();
        Self {
            params: config.gesture,
            screen: config.screen,
            cursor: CursorFilter::new(config.cursor_smoothing),
            config,
            click: ClickEdgeDetector::new(),
            layout: KeyLayout::new(),
            geometry,
            dispatcher: ActionDispatcher::new(),
            text,
            mode: GestureMode::Idle,
            display_cursor: None,
            hovered: None,
            status: SessionStatus::Starting,
            outbox: Vec::new(),
            msg_tx,
            msg_rx: Some(msg_rx),
            output_tx: None,
        }
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle { tx: self.msg_tx.clone() }
    }

    /// Publish a snapshot after every frame and state change.
    pub fn connect_output(&mut self, tx: Sender<FrameSnapshot>) {
        log::info!("Connecting session output");
        self.output_tx = Some(tx);
    }

    pub fn status(&self) -> &SessionStatus {
        &self.status
    }

    pub fn text(&self) -> &str {
        self.dispatcher.text()
    }

    pub fn layout(&self) -> &KeyLayout {
        &self.layout
    }

    pub fn snapshot(&self) -> FrameSnapshot {
        FrameSnapshot {
            text: self.dispatcher.text().to_string(),
            cursor: self.display_cursor,
            mode: self.mode,
            hovered_key: self.hovered.clone(),
            active_key: self.click.active_key().map(str::to_owned),
            status: self.status.clone(),
            fixing: self.dispatcher.in_flight(TextRequestKind::Correct),
            completing: self.dispatcher.in_flight(TextRequestKind::Complete),
        }
    }

    /// Run the whole pipeline for one frame.
    pub fn process_frame(&mut self, frame: &LandmarkFrame) -> Option<KeyEvent> {
        if matches!(self.status, SessionStatus::Error(_)) {
            return None;
        }

        let signal = gesture::classify(frame.hand.as_ref(), &self.params, self.screen);
        let smoothed = self.cursor.update(signal.mode, signal.raw_cursor);

        // No hand: hide the cursor but keep the accumulator for when it returns.
        self.display_cursor = if frame.hand.is_some() { smoothed } else { None };
        self.mode = signal.mode;
        self.hovered = self.layout.hit_test(self.display_cursor).map(str::to_owned);

        let event = self.click.update(signal.clicking, self.hovered.as_deref());
        match &event {
            Some(KeyEvent::Press { key_id }) => {
                log::debug!("Press '{key_id}'");
                self.press(key_id);
            }
            Some(KeyEvent::Release { key_id }) => log::debug!("Release {:?}", key_id),
            None => {}
        }

        log::trace!(
            "frame {}: {:?} cursor={:?} hover={:?}",
            frame.timestamp,
            self.mode,
            self.display_cursor,
            self.hovered
        );
        self.publish();
        event
    }

    /// Apply a UI command. Returns `false` on shutdown.
    pub fn apply_command(&mut self, command: SessionCommand) -> bool {
        match command {
            SessionCommand::Mount => {
                self.rebuild_layout();
                self.schedule_settle();
            }
            SessionCommand::Resize(screen) => {
                log::debug!("Resize to {}x{}", screen.width, screen.height);
                self.screen = screen;
                self.rebuild_layout();
            }
            SessionCommand::Layout(rects) => {
                self.layout.rebuild(rects);
            }
            SessionCommand::Key(key_id) => self.press(&key_id),
            SessionCommand::Complete => {
                if let Some(request) = self.dispatcher.begin(TextRequestKind::Complete) {
                    self.outbox.push(request);
                }
            }
            SessionCommand::Tune { pinch_threshold, extension_threshold, cursor_smoothing } => {
                let tuned = GestureParams {
                    pinch_threshold: pinch_threshold.unwrap_or(self.params.pinch_threshold),
                    extension_threshold: extension_threshold
                        .unwrap_or(self.params.extension_threshold),
                };
                match tuned.validate() {
                    Ok(()) => self.params = tuned,
                    Err(e) => log::warn!("Ignoring gesture tuning: {e}"),
                }
                match cursor_smoothing {
                    Some(v) if v.is_finite() => self.cursor.set_smoothing(v),
                    Some(v) => log::warn!("Ignoring cursor smoothing {v}"),
                    None => {}
                }
                log::debug!("Tuned: {:?}, smoothing {}", self.params, self.cursor.smoothing());
            }
            SessionCommand::Restart => {
                log::info!("Restarting pointer state");
                self.cursor.reset();
                self.click.reset();
                self.display_cursor = None;
                self.hovered = None;
            }
            SessionCommand::Shutdown => return false,
        }
        self.publish();
        true
    }

    /// Apply a finished text-service request.
    pub fn apply_text_update(&mut self, update: TextUpdate) {
        log::debug!("Text update: {:?}", update);
        self.dispatcher.finish(update);
        self.publish();
    }

    /// Requests produced since the last call, oldest first.
    pub fn take_requests(&mut self) -> Vec<TextRequest> {
        std::mem::take(&mut self.outbox)
    }

    fn press(&mut self, key_id: &str) {
        if let Some(request) = self.dispatcher.press(key_id) {
            self.outbox.push(request);
        }
    }

    fn rebuild_layout(&mut self) {
        let measured = self.geometry.measure(self.screen);
        self.layout.rebuild(measured);
    }

    fn schedule_settle(&self) {
        // Only meaningful inside the runtime; sync callers get the immediate
        // rebuild alone.
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let tx = self.msg_tx.clone();
        let delay = Duration::from_millis(self.config.layout_settle_ms);
        runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(SessionMsg::Settle);
        });
    }

    /// Hand queued requests to the text service. Each result comes back as a
    /// message for this session to apply.
    fn dispatch_requests(&mut self) {
        for request in self.take_requests() {
            log::debug!("Starting {:?} request ({} chars)", request.kind, request.text.len());
            let connector = self.text.clone();
            let tx = self.msg_tx.clone();
            tokio::spawn(async move {
                let update = match request.kind {
                    TextRequestKind::Correct => {
                        let corrected = connector.correct(&request.text).await;
                        TextUpdate::Corrected { original: request.text, corrected }
                    }
                    TextRequestKind::Complete => TextUpdate::Completed {
                        continuation: connector.complete(&request.text).await,
                    },
                };
                let _ = tx.send(SessionMsg::Text(update));
            });
        }
    }

    fn handle_message(&mut self, msg: SessionMsg) -> bool {
        match msg {
            SessionMsg::Command(command) => self.apply_command(command),
            SessionMsg::Text(update) => {
                self.apply_text_update(update);
                true
            }
            SessionMsg::Settle => {
                log::debug!("Re-measuring layout after settle delay");
                self.rebuild_layout();
                true
            }
        }
    }

    fn publish(&mut self) {
        let Some(tx) = &self.output_tx else {
            return;
        };
        if tx.send(self.snapshot()).is_err() {
            log::debug!("Output receiver dropped, disconnecting");
            self.output_tx = None;
        }
    }

    fn any_in_flight(&self) -> bool {
        self.dispatcher.in_flight(TextRequestKind::Correct)
            || self.dispatcher.in_flight(TextRequestKind::Complete)
    }

    /// Drive the session until the source ends or a shutdown command arrives.
    ///
    /// A source that fails to start puts the session into the terminal error
    /// state; no frames are processed after that.
    pub async fn run(&mut self, source: &mut dyn LandmarkSource) -> anyhow::Result<()> {
        if let SessionStatus::Error(reason) = &self.status {
            anyhow::bail!("session is in a terminal error state: {reason}");
        }
        log::info!("Starting HandType session...");
        let Some(mut msg_rx) = self.msg_rx.take() else {
            anyhow::bail!("session is already running");
        };

        let (frame_tx, mut frame_rx) = mpsc::channel(self.config.frame_queue);
        if let Err(e) = source.start(frame_tx).await {
            log::error!("Failed to start landmark source: {e}");
            self.status = SessionStatus::Error(e.to_string());
            self.publish();
            self.msg_rx = Some(msg_rx);
            return Err(e.into());
        }

        self.status = SessionStatus::Running;
        self.apply_command(SessionCommand::Mount);

        loop {
            tokio::select! {
                frame = frame_rx.recv() => match frame {
                    Some(frame) => {
                        self.process_frame(&frame);
                    }
                    None => {
                        log::info!("Landmark source finished");
                        break;
                    }
                },
                Some(msg) = msg_rx.recv() => {
                    if !self.handle_message(msg) {
                        log::info!("Shutdown requested");
                        break;
                    }
                }
            }
            self.dispatch_requests();
        }

        source.stop().await;

        // Let in-flight text requests land before reporting the final text.
        while self.any_in_flight() {
            match msg_rx.recv().await {
                Some(SessionMsg::Text(update)) => self.apply_text_update(update),
                Some(_) => {}
                None => break,
            }
        }

        self.status = SessionStatus::Stopped;
        self.publish();
        self.msg_rx = Some(msg_rx);
        log::info!("Session stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HandTypeError;
    use crate::types::HandLandmarks;
    use crate::vision::{synthetic, ScriptedSource};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const SCREEN: ScreenSize = ScreenSize { width: 1000.0, height: 1000.0 };

    struct FixedGeometry(Option<Vec<KeyRect>>);

    impl KeyGeometry for FixedGeometry {
        fn measure(&self, _screen: ScreenSize) -> Option<Vec<KeyRect>> {
            self.0.clone()
        }
    }

    struct BrokenCamera;

    #[async_trait]
    impl LandmarkSource for BrokenCamera {
        async fn start(
            &mut self,
            _frames: mpsc::Sender<LandmarkFrame>,
        ) -> Result<(), HandTypeError> {
            Err(HandTypeError::DeviceUnavailable("no camera".into()))
        }
        async fn stop(&mut self) {}
    }

    /// Two keys: "a" covers screen x 0..500, "b" covers 500..1000.
    fn session() -> Session {
        let config = HandTypeConfig { screen: SCREEN, ..HandTypeConfig::default() };
        let rects = vec![
            KeyRect::new("a", 0.0, 0.0, 499.0, 1000.0),
            KeyRect::new("b", 0.0, 500.0, 500.0, 1000.0),
        ];
        let mut s = Session::with_geometry(
            config,
            TextConnector::heuristic(Duration::from_secs(1)),
            Box::new(FixedGeometry(Some(rects))),
        );
        s.apply_command(SessionCommand::Mount);
        s
    }

    /// Fails its first start, succeeds afterwards.
    struct FlakyCamera {
        starts: usize,
    }

    #[async_trait]
    impl LandmarkSource for FlakyCamera {
        async fn start(
            &mut self,
            _frames: mpsc::Sender<LandmarkFrame>,
        ) -> Result<(), HandTypeError> {
            self.starts += 1;
            if self.starts == 1 {
                return Err(HandTypeError::DeviceUnavailable("camera busy".into()));
            }
            Ok(())
        }
        async fn stop(&mut self) {}
    }

    /// First measurement has only "a"; later ones move "a" and add "b".
    struct LateSettlingGeometry {
        calls: AtomicUsize,
    }

    impl KeyGeometry for LateSettlingGeometry {
        fn measure(&self, _screen: ScreenSize) -> Option<Vec<KeyRect>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call == 0 {
                Some(vec![KeyRect::new("a", 0.0, 0.0, 100.0, 100.0)])
            } else {
                Some(vec![
                    KeyRect::new("a", 0.0, 0.0, 499.0, 1000.0),
                    KeyRect::new("b", 0.0, 500.0, 500.0, 1000.0),
                ])
            }
        }
    }

    /// Wide screens get "a" and "b"; narrow ones a smaller "a" only.
    struct ResponsiveGeometry;

    impl KeyGeometry for ResponsiveGeometry {
        fn measure(&self, screen: ScreenSize) -> Option<Vec<KeyRect>> {
            if screen.width >= 1000.0 {
                Some(vec![
                    KeyRect::new("a", 0.0, 0.0, 499.0, 1000.0),
                    KeyRect::new("b", 0.0, 500.0, 500.0, 1000.0),
                ])
            } else {
                Some(vec![KeyRect::new("a", 0.0, 0.0, 200.0, 200.0)])
            }
        }
    }

    fn frame(hand: HandLandmarks) -> LandmarkFrame {
        LandmarkFrame::with_hand(hand)
    }

    // Camera x is mirrored: camera 0.75 -> screen x 250 (key "a").
    const OVER_A: f32 = 0.75;
    const OVER_B: f32 = 0.25;

    #[test]
    fn open_hand_hovers_and_pinch_types() {
        let mut s = session();
        s.process_frame(&frame(synthetic::open_hand(OVER_A, 0.5)));
        assert_eq!(s.snapshot().hovered_key.as_deref(), Some("a"));
        assert_eq!(s.snapshot().mode, GestureMode::Move);

        let event = s.process_frame(&frame(synthetic::pinch(OVER_A, 0.5)));
        assert_eq!(event, Some(KeyEvent::Press { key_id: "a".into() }));
        assert_eq!(s.snapshot().active_key.as_deref(), Some("a"));
        assert_eq!(s.text(), "a");

        // Held pinch does not repeat.
        for _ in 0..10 {
            assert_eq!(s.process_frame(&frame(synthetic::pinch(OVER_A, 0.5))), None);
        }
        let event = s.process_frame(&frame(synthetic::open_hand(OVER_A, 0.5)));
        assert_eq!(event, Some(KeyEvent::Release { key_id: Some("a".into()) }));
        assert_eq!(s.text(), "a");
        assert_eq!(s.snapshot().active_key, None);
    }

    #[test]
    fn cursor_parks_during_click() {
        let mut s = session();
        s.process_frame(&frame(synthetic::open_hand(OVER_A, 0.5)));
        let parked = s.snapshot().cursor;

        // The index tip moves over "b" while pinching; the cursor stays on "a".
        s.process_frame(&frame(synthetic::pinch(OVER_B, 0.5)));
        assert_eq!(s.snapshot().cursor, parked);
        assert_eq!(s.text(), "a");
    }

    #[test]
    fn lost_hand_clears_hover_and_click() {
        let mut s = session();
        s.process_frame(&frame(synthetic::open_hand(OVER_A, 0.5)));
        s.process_frame(&frame(synthetic::pinch(OVER_A, 0.5)));

        let event = s.process_frame(&LandmarkFrame::empty());
        let snap = s.snapshot();
        assert_eq!(snap.mode, GestureMode::Idle);
        assert_eq!(snap.hovered_key, None);
        assert_eq!(snap.cursor, None);
        assert_eq!(event, Some(KeyEvent::Release { key_id: Some("a".into()) }));
    }

    #[test]
    fn accumulator_survives_lost_hand() {
        let mut s = session();
        s.apply_command(SessionCommand::Tune {
            pinch_threshold: None,
            extension_threshold: None,
            cursor_smoothing: Some(0.5),
        });
        s.process_frame(&frame(synthetic::open_hand(OVER_A, 0.5)));
        let before = s.snapshot().cursor.unwrap();
        s.process_frame(&LandmarkFrame::empty());

        // Resuming smooths from the old position instead of snapping.
        s.process_frame(&frame(synthetic::open_hand(OVER_B, 0.5)));
        let after = s.snapshot().cursor.unwrap();
        assert!((after.x - (before.x + (750.0 - before.x) * 0.5)).abs() < 1.0);
    }

    #[test]
    fn non_finite_landmark_does_not_poison_cursor() {
        let mut s = session();
        s.process_frame(&frame(synthetic::open_hand(OVER_A, 0.5)));
        let mut bad = synthetic::open_hand(OVER_A, 0.5);
        bad.points[crate::gesture::INDEX_TIP].x = f32::NAN;
        s.process_frame(&frame(bad));

        for _ in 0..50 {
            s.process_frame(&frame(synthetic::open_hand(OVER_B, 0.5)));
        }
        let cursor = s.snapshot().cursor.unwrap();
        assert!(cursor.x.is_finite() && (cursor.x - 750.0).abs() < 1.0);
        assert_eq!(s.snapshot().hovered_key.as_deref(), Some("b"));
    }

    #[test]
    fn invalid_tuning_is_ignored() {
        let mut s = session();
        let invalid = [
            (Some(f32::NAN), None),
            (Some(-0.1), None),
            (None, Some(f32::INFINITY)),
        ];
        for (pinch, extension) in invalid {
            s.apply_command(SessionCommand::Tune {
                pinch_threshold: pinch,
                extension_threshold: extension,
                cursor_smoothing: Some(f32::NAN),
            });
        }
        assert_eq!(s.params, GestureParams::default());
        assert_eq!(s.cursor.smoothing(), crate::cursor::DEFAULT_SMOOTHING);

        // Pinch still types with the retained thresholds.
        s.process_frame(&frame(synthetic::open_hand(OVER_A, 0.5)));
        s.process_frame(&frame(synthetic::pinch(OVER_A, 0.5)));
        assert_eq!(s.text(), "a");

        s.apply_command(SessionCommand::Tune {
            pinch_threshold: Some(0.02),
            extension_threshold: None,
            cursor_smoothing: Some(0.8),
        });
        assert_eq!(s.params.pinch_threshold, 0.02);
        assert_eq!(s.cursor.smoothing(), 0.8);
    }

    #[test]
    fn resize_overwrites_remeasured_keys_and_keeps_stale_ones() {
        let config = HandTypeConfig { screen: SCREEN, ..HandTypeConfig::default() };
        let mut s = Session::with_geometry(
            config,
            TextConnector::heuristic(Duration::from_secs(1)),
            Box::new(ResponsiveGeometry),
        );
        s.apply_command(SessionCommand::Mount);
        assert_eq!(s.layout().len(), 2);

        s.apply_command(SessionCommand::Resize(ScreenSize { width: 500.0, height: 500.0 }));
        assert_eq!(s.layout().get("a").unwrap().width, 200.0);
        assert_eq!(s.layout().get("b").unwrap().left, 500.0);
        assert_eq!(s.layout().len(), 2);

        // The new screen size drives hit testing: camera 0.75 -> screen x 125.
        s.process_frame(&frame(synthetic::open_hand(OVER_A, 0.2)));
        assert_eq!(s.snapshot().hovered_key.as_deref(), Some("a"));
    }

    #[test]
    fn restart_snaps_cursor() {
        let mut s = session();
        s.process_frame(&frame(synthetic::open_hand(OVER_A, 0.5)));
        s.apply_command(SessionCommand::Restart);
        assert_eq!(s.snapshot().cursor, None);
        s.process_frame(&frame(synthetic::open_hand(OVER_B, 0.5)));
        let cursor = s.snapshot().cursor.unwrap();
        assert!((cursor.x - 750.0).abs() < 1.0);
    }

    #[test]
    fn pinch_without_hover_types_nothing() {
        let mut s = session();
        // Cursor never initialized, so the first pinch has nothing under it.
        assert_eq!(s.process_frame(&frame(synthetic::pinch(OVER_A, 0.5))), None);
        assert_eq!(s.text(), "");
    }

    #[test]
    fn missing_geometry_means_no_hover() {
        let config = HandTypeConfig { screen: SCREEN, ..HandTypeConfig::default() };
        let mut s = Session::with_geometry(
            config,
            TextConnector::heuristic(Duration::from_secs(1)),
            Box::new(FixedGeometry(None)),
        );
        s.apply_command(SessionCommand::Mount);
        assert!(s.layout().is_empty());
        s.process_frame(&frame(synthetic::open_hand(OVER_A, 0.5)));
        assert_eq!(s.snapshot().hovered_key, None);

        let full = KeyRect::new("z", 0.0, 0.0, 1000.0, 1000.0);
        s.apply_command(SessionCommand::Layout(Some(vec![full])));
        s.process_frame(&frame(synthetic::open_hand(OVER_A, 0.5)));
        assert_eq!(s.snapshot().hovered_key.as_deref(), Some("z"));
    }

    #[test]
    fn ui_keys_and_requests() {
        let mut s = session();
        for key in ["h", "i"] {
            s.apply_command(SessionCommand::Key(key.into()));
        }
        s.apply_command(SessionCommand::Key("ai-fix".into()));
        s.apply_command(SessionCommand::Key("ai-fix".into()));
        s.apply_command(SessionCommand::Complete);
        let requests = s.take_requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].kind, TextRequestKind::Correct);
        assert_eq!(requests[1].kind, TextRequestKind::Complete);
        assert!(s.snapshot().fixing && s.snapshot().completing);

        s.apply_text_update(TextUpdate::Corrected {
            original: "hi".into(),
            corrected: "Hi.".into(),
        });
        assert_eq!(s.text(), "Hi.");
        assert!(!s.snapshot().fixing);
    }

    #[test]
    fn snapshots_are_published() {
        let mut s = session();
        let (tx, rx) = crossbeam_channel::unbounded();
        s.connect_output(tx);
        s.process_frame(&frame(synthetic::open_hand(OVER_B, 0.5)));
        let snap = rx.try_recv().expect("snapshot");
        assert_eq!(snap.hovered_key.as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn broken_camera_is_terminal() {
        let mut s = session();
        let err = s.run(&mut BrokenCamera).await.unwrap_err();
        assert!(err.to_string().contains("no camera"));
        assert!(matches!(s.status(), SessionStatus::Error(_)));

        assert_eq!(s.process_frame(&frame(synthetic::pinch(OVER_A, 0.5))), None);
        assert_eq!(s.text(), "");
    }

    #[tokio::test]
    async fn device_error_is_not_retried() {
        let mut s = session();
        let mut camera = FlakyCamera { starts: 0 };
        assert!(s.run(&mut camera).await.is_err());
        assert!(matches!(s.status(), SessionStatus::Error(_)));

        let err = s.run(&mut camera).await.unwrap_err();
        assert!(err.to_string().contains("terminal"));
        assert_eq!(camera.starts, 1);
        assert_eq!(
            s.status(),
            &SessionStatus::Error("landmark source unavailable: camera busy".into())
        );
    }

    #[tokio::test]
    async fn layout_is_remeasured_after_settle_delay() {
        let config = HandTypeConfig {
            screen: SCREEN,
            layout_settle_ms: 20,
            ..HandTypeConfig::default()
        };
        let mut s = Session::with_geometry(
            config,
            TextConnector::heuristic(Duration::from_secs(1)),
            Box::new(LateSettlingGeometry { calls: AtomicUsize::new(0) }),
        );
        let mut source = ScriptedSource::new(vec![None], Duration::from_millis(5)).repeating();
        let handle = s.handle();
        let stopper = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            handle.send(SessionCommand::Shutdown);
        });

        s.run(&mut source).await.unwrap();
        stopper.await.unwrap();
        assert_eq!(s.layout().len(), 2);
        assert_eq!(s.layout().get("a").unwrap().width, 499.0);
        assert!(s.layout().get("b").is_some());
    }

    #[tokio::test]
    async fn run_types_and_fixes() {
        let config = HandTypeConfig { screen: SCREEN, ..HandTypeConfig::default() };
        let rects = vec![
            KeyRect::new("a", 0.0, 0.0, 499.0, 1000.0),
            KeyRect::new("ai-fix", 0.0, 500.0, 500.0, 1000.0),
        ];
        let mut s = Session::with_geometry(
            config,
            TextConnector::heuristic(Duration::from_secs(1)),
            Box::new(FixedGeometry(Some(rects))),
        );

        let mut script = vec![
            Some(synthetic::open_hand(OVER_A, 0.5)),
            Some(synthetic::pinch(OVER_A, 0.5)),
            Some(synthetic::open_hand(OVER_A, 0.5)),
        ];
        script.extend((0..15).map(|_| Some(synthetic::open_hand(OVER_B, 0.5))));
        script.push(Some(synthetic::pinch(OVER_B, 0.5)));
        script.push(Some(synthetic::open_hand(OVER_B, 0.5)));
        let mut source = ScriptedSource::new(script, Duration::ZERO);

        s.run(&mut source).await.unwrap();
        assert_eq!(s.status(), &SessionStatus::Stopped);
        assert_eq!(s.text(), "A.");
        assert!(!s.snapshot().fixing);
    }

    #[tokio::test]
    async fn shutdown_command_stops_run() {
        let mut s = session();
        let mut source = ScriptedSource::new(vec![None], Duration::from_millis(5)).repeating();
        let handle = s.handle();
        let stopper = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            handle.send(SessionCommand::Shutdown);
        });
        s.run(&mut source).await.unwrap();
        stopper.await.unwrap();
        assert_eq!(s.status(), &SessionStatus::Stopped);
    }
}
