//! Test doubles for driving a `PeerSession` without a real WebRTC engine
//!
//! All doubles push into one shared [`EventLog`] so tests can assert the
//! relative order of engine and signaling calls.

#![allow(dead_code)]

pub mod media;

use async_trait::async_trait;
use rtpbridge_webrtc::channels::ControlChannel;
use rtpbridge_webrtc::peer::{ConnectivityHandler, GatheringComplete};
use rtpbridge_webrtc::signaling::{codec, SdpType};
use rtpbridge_webrtc::{
    ConnectivityState, Error, PeerConnection, Result, SessionDescription, SignalingChannel,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;

pub use media::{rtp_packet, truncated_packet, RecordingSink, SinkBehavior};

/// SDP body a browser would send
pub const OFFER_SDP: &str = "v=0\r\n\
o=- 4611731400430051336 2 IN IP4 127.0.0.1\r\n\
s=-\r\n\
t=0 0\r\n\
a=group:BUNDLE 0\r\n\
m=video 9 UDP/TLS/RTP/SAVPF 96\r\n\
c=IN IP4 0.0.0.0\r\n\
a=mid:0\r\n\
a=recvonly\r\n\
a=rtpmap:96 VP8/90000\r\n";

/// SDP body the recording engine answers with
pub const ANSWER_SDP: &str = "v=0\r\n\
o=- 1 1 IN IP4 0.0.0.0\r\n\
s=-\r\n\
t=0 0\r\n\
m=video 9 UDP/TLS/RTP/SAVPF 96\r\n\
a=sendonly\r\n";

/// Candidate line appended once gathering completes
pub const GATHERED_CANDIDATE: &str =
    "a=candidate:1 1 udp 2130706431 192.0.2.10 50000 typ host\r\n";

/// Calls observed by the doubles
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    ReceiveOffer,
    SetRemote(SdpType),
    CreateAnswer,
    SubscribeGathering,
    SetLocal(SdpType),
    GatheringFired,
    SendAnswer,
    Close,
}

/// Shared, ordered record of calls
#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<Event>>>);

impl EventLog {
    pub fn push(&self, event: Event) {
        self.0.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, event: &Event) -> usize {
        self.events().iter().filter(|e| *e == event).count()
    }

    pub fn position(&self, event: &Event) -> Option<usize> {
        self.events().iter().position(|e| e == event)
    }
}

/// How the recording engine finishes gathering
#[derive(Debug, Clone, Copy)]
pub enum Gathering {
    /// Fire after this delay once the local description is set
    After(Duration),
    /// Never fire
    Never,
}

/// Engine double that records every call
pub struct RecordingPeer {
    log: EventLog,
    gathering: Gathering,
    reject_remote: bool,
    gathering_tx: Mutex<Option<oneshot::Sender<()>>>,
    local: Arc<Mutex<Option<SessionDescription>>>,
    handler: Mutex<Option<Arc<ConnectivityHandler>>>,
    close_count: AtomicUsize,
    sink_on_close: Mutex<Option<Arc<RecordingSink>>>,
}

impl RecordingPeer {
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            gathering: Gathering::After(Duration::from_millis(10)),
            reject_remote: false,
            gathering_tx: Mutex::new(None),
            local: Arc::new(Mutex::new(None)),
            handler: Mutex::new(None),
            close_count: AtomicUsize::new(0),
            sink_on_close: Mutex::new(None),
        }
    }

    pub fn with_gathering(mut self, gathering: Gathering) -> Self {
        self.gathering = gathering;
        self
    }

    /// Fail `set_remote_description` like an engine given an unusable offer
    pub fn rejecting_remote(mut self) -> Self {
        self.reject_remote = true;
        self
    }

    /// Close `sink` when the connection is closed, like a real outbound track
    pub fn closing_sink(self, sink: Arc<RecordingSink>) -> Self {
        *self.sink_on_close.lock().unwrap() = Some(sink);
        self
    }

    pub fn close_count(&self) -> usize {
        self.close_count.load(Ordering::SeqCst)
    }

    pub fn has_handler(&self) -> bool {
        self.handler.lock().unwrap().is_some()
    }

    /// Deliver a connectivity change to the registered handler
    pub async fn emit(&self, state: ConnectivityState) {
        let handler = self.handler.lock().unwrap().clone();
        if let Some(handler) = handler {
            handler(state).await;
        }
    }
}

#[async_trait]
impl PeerConnection for RecordingPeer {
    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()> {
        self.log.push(Event::SetRemote(desc.sdp_type));
        if self.reject_remote {
            return Err(Error::Negotiation(
                "Failed to set remote description: incompatible codecs".into(),
            ));
        }
        Ok(())
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        self.log.push(Event::CreateAnswer);
        Ok(SessionDescription::answer(ANSWER_SDP))
    }

    async fn gathering_complete(&self) -> GatheringComplete {
        self.log.push(Event::SubscribeGathering);
        let (tx, rx) = oneshot::channel();
        *self.gathering_tx.lock().unwrap() = Some(tx);
        rx
    }

    async fn set_local_description(&self, desc: SessionDescription) -> Result<()> {
        self.log.push(Event::SetLocal(desc.sdp_type));
        *self.local.lock().unwrap() = Some(desc);

        let tx = self.gathering_tx.lock().unwrap().take();
        match (self.gathering, tx) {
            (Gathering::After(delay), Some(tx)) => {
                let log = self.log.clone();
                let local = Arc::clone(&self.local);
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    if let Some(desc) = local.lock().unwrap().as_mut() {
                        desc.sdp.push_str(GATHERED_CANDIDATE);
                    }
                    log.push(Event::GatheringFired);
                    let _ = tx.send(());
                });
            }
            (Gathering::Never, Some(tx)) => {
                // Parked sender: the receiver never resolves
                *self.gathering_tx.lock().unwrap() = Some(tx);
            }
            (_, None) => {}
        }
        Ok(())
    }

    async fn local_description(&self) -> Option<SessionDescription> {
        self.local.lock().unwrap().clone()
    }

    fn on_connectivity_state_change(&self, handler: ConnectivityHandler) {
        *self.handler.lock().unwrap() = Some(Arc::new(handler));
    }

    async fn close(&self) -> Result<()> {
        self.close_count.fetch_add(1, Ordering::SeqCst);
        self.log.push(Event::Close);
        if let Some(sink) = self.sink_on_close.lock().unwrap().as_ref() {
            sink.close();
        }
        Ok(())
    }
}

/// Signaling double that yields one scripted line and records the answer
pub struct ScriptedSignaling {
    log: EventLog,
    offer: Option<String>,
    answers: Vec<String>,
}

impl ScriptedSignaling {
    pub fn new(log: EventLog, offer: impl Into<String>) -> Self {
        Self {
            log,
            offer: Some(offer.into()),
            answers: Vec::new(),
        }
    }

    /// A channel whose offer never arrives
    pub fn silent(log: EventLog) -> Self {
        Self {
            log,
            offer: None,
            answers: Vec::new(),
        }
    }

    pub fn answers(&self) -> &[String] {
        &self.answers
    }
}

#[async_trait]
impl SignalingChannel for ScriptedSignaling {
    async fn receive_offer(&mut self) -> Result<String> {
        self.log.push(Event::ReceiveOffer);
        match self.offer.take() {
            Some(line) => Ok(line),
            None => futures::future::pending().await,
        }
    }

    async fn send_answer(&mut self, answer: &str) -> Result<()> {
        self.log.push(Event::SendAnswer);
        self.answers.push(answer.to_string());
        Ok(())
    }
}

/// Control channel that is already finished
pub struct ClosedControl;

#[async_trait]
impl ControlChannel for ClosedControl {
    async fn read(&self, _buf: &mut [u8]) -> Result<usize> {
        Err(Error::ControlClosed)
    }
}

/// Encoded browser offer line
pub fn offer_line() -> String {
    codec::encode(&SessionDescription::offer(OFFER_SDP)).unwrap()
}

/// Initialize tracing for tests (safe to call repeatedly)
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug,webrtc=warn")
        .with_test_writer()
        .try_init();
}

/// Poll `condition` until it holds or `timeout` elapses
pub async fn wait_until<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
