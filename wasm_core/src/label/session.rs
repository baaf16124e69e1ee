//! Owns the preview currently on screen and keeps late responses from replacing it.
//!
//! Every run is tagged with an increasing id. Only the most recent run may
//! advance the visible stage or install its outcome; anything older is handed
//! back to the caller as stale so its resources can be released.

use std::cell::RefCell;

use super::preview::{run_pipeline, PreviewOutcome, RunStage};
use super::service::LabelService;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunTicket(u64);

impl RunTicket {
    pub fn id(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// The run was current; `displaced` is whatever was shown before it.
    Applied {
        outcome: PreviewOutcome,
        displaced: Option<PreviewOutcome>,
    },
    /// A newer run started meanwhile; nothing on screen changed.
    Stale { outcome: PreviewOutcome },
}

#[derive(Debug)]
struct SessionState {
    latest: u64,
    pending: bool,
    stage: RunStage,
    current: Option<PreviewOutcome>,
}

#[derive(Debug)]
pub struct PreviewSession {
    state: RefCell<SessionState>,
}

impl Default for PreviewSession {
    fn default() -> Self {
        Self::new()
    }
}

impl PreviewSession {
    pub fn new() -> Self {
        Self {
            state: RefCell::new(SessionState {
                latest: 0,
                pending: false,
                stage: RunStage::Idle,
                current: None,
            }),
        }
    }

    /// Starts a run; any run still in flight becomes stale.
    pub fn begin(&self) -> RunTicket {
        let mut state = self.state.borrow_mut();
        state.latest += 1;
        state.pending = true;
        state.stage = RunStage::Idle;
        RunTicket(state.latest)
    }

    pub fn is_current(&self, ticket: RunTicket) -> bool {
        self.state.borrow().latest == ticket.0
    }

    /// True while the latest run has not settled; the page disables submission meanwhile.
    pub fn is_pending(&self) -> bool {
        self.state.borrow().pending
    }

    pub fn stage(&self) -> RunStage {
        self.state.borrow().stage
    }

    pub fn current(&self) -> Option<PreviewOutcome> {
        self.state.borrow().current.clone()
    }

    pub fn advance(&self, ticket: RunTicket, stage: RunStage) {
        let mut state = self.state.borrow_mut();
        if state.latest == ticket.0 {
            state.stage = stage;
        }
    }

    pub fn finish(&self, ticket: RunTicket, outcome: PreviewOutcome) -> Completion {
        let mut state = self.state.borrow_mut();
        if state.latest != ticket.0 {
            log::warn!(
                "discarding preview run {} superseded by run {}",
                ticket.0,
                state.latest
            );
            return Completion::Stale { outcome };
        }
        state.pending = false;
        state.stage = RunStage::Done;
        let displaced = state.current.replace(outcome.clone());
        Completion::Applied { outcome, displaced }
    }

    /// Drops the visible preview and invalidates any run still in flight.
    pub fn clear(&self) -> Option<PreviewOutcome> {
        let mut state = self.state.borrow_mut();
        state.latest += 1;
        state.pending = false;
        state.stage = RunStage::Idle;
        state.current.take()
    }

    /// Runs the whole pipeline for `raw` under a fresh ticket.
    pub async fn run<S: LabelService>(&self, service: &S, raw: &str) -> Completion {
        let ticket = self.begin();
        log::debug!("preview run {} started", ticket.0);
        let outcome = run_pipeline(service, raw, |stage| self.advance(ticket, stage)).await;
        self.finish(ticket, outcome)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use futures::channel::oneshot;
    use futures::executor::block_on;

    use super::*;
    use crate::error::{ToolkitError, ToolkitResult};
    use crate::label::preview::RenderPath;
    use crate::label::service::RemoteImage;

    /// First call waits for the test to release it; later calls answer at once.
    struct GatedService {
        calls: Cell<usize>,
        gate: RefCell<Option<oneshot::Receiver<ToolkitResult<RemoteImage>>>>,
    }

    impl LabelService for GatedService {
        async fn render_zpl(&self, _zpl: &str) -> ToolkitResult<RemoteImage> {
            let call = self.calls.get() + 1;
            self.calls.set(call);
            let gate = self.gate.borrow_mut().take();
            match gate {
                Some(rx) => rx
                    .await
                    .unwrap_or_else(|_| Err(ToolkitError::RemoteRender("gate dropped".into()))),
                None => Ok(image(&format!("blob:run-{call}"))),
            }
        }
    }

    fn image(url: &str) -> RemoteImage {
        RemoteImage {
            url: url.to_string(),
            mime: "image/png".to_string(),
            byte_len: 10,
        }
    }

    fn shown_url(session: &PreviewSession) -> Option<String> {
        session
            .current()
            .and_then(|outcome| outcome.artifact().map(|a| a.image_url.clone()))
    }

    #[test]
    fn stale_response_never_overwrites_newer_run() {
        let (tx, rx) = oneshot::channel();
        let service = GatedService {
            calls: Cell::new(0),
            gate: RefCell::new(Some(rx)),
        };
        let session = PreviewSession::new();
        let input_a = STANDARD.encode("^XA^FDrun A^FS^XZ");
        let input_b = STANDARD.encode("^XA^FDrun B^FS^XZ");

        let (first, second) = block_on(async {
            futures::join!(session.run(&service, &input_a), async {
                let completion = session.run(&service, &input_b).await;
                assert_eq!(shown_url(&session).as_deref(), Some("blob:run-2"));
                tx.send(Ok(image("blob:run-1-late"))).expect("run A still waiting");
                completion
            })
        });

        assert!(matches!(first, Completion::Stale { .. }));
        assert!(matches!(second, Completion::Applied { displaced: None, .. }));
        assert_eq!(shown_url(&session).as_deref(), Some("blob:run-2"));
        assert!(!session.is_pending());
        assert_eq!(session.stage(), RunStage::Done);
    }

    #[test]
    fn pending_until_latest_run_finishes() {
        let session = PreviewSession::new();
        let first = session.begin();
        let second = session.begin();
        assert!(session.is_pending());
        assert!(!session.is_current(first));

        let failed = PreviewOutcome::Failed {
            message: "old".into(),
        };
        assert!(matches!(
            session.finish(first, failed),
            Completion::Stale { .. }
        ));
        assert!(session.is_pending());

        session.advance(first, RunStage::Classifying);
        assert_eq!(session.stage(), RunStage::Idle);
        session.advance(second, RunStage::Rendering(RenderPath::Service));
        assert_eq!(session.stage(), RunStage::Rendering(RenderPath::Service));

        let ok = PreviewOutcome::Failed {
            message: "new".into(),
        };
        assert!(matches!(
            session.finish(second, ok.clone()),
            Completion::Applied { .. }
        ));
        assert!(!session.is_pending());
        assert_eq!(session.current(), Some(ok));
    }

    #[test]
    fn applying_a_run_hands_back_the_previous_outcome() {
        let service = GatedService {
            calls: Cell::new(0),
            gate: RefCell::new(None),
        };
        let session = PreviewSession::new();
        let zpl = STANDARD.encode("^XA^FDone^FS^XZ");
        block_on(session.run(&service, &zpl));
        match block_on(session.run(&service, &zpl)) {
            Completion::Applied {
                displaced: Some(previous),
                ..
            } => assert_eq!(
                previous.artifact().map(|a| a.image_url.as_str()),
                Some("blob:run-1")
            ),
            other => panic!("unexpected completion: {other:?}"),
        }
    }

    #[test]
    fn clear_invalidates_in_flight_run() {
        let session = PreviewSession::new();
        let ticket = session.begin();
        assert_eq!(session.clear(), None);
        let outcome = PreviewOutcome::Failed {
            message: "late".into(),
        };
        assert!(matches!(
            session.finish(ticket, outcome),
            Completion::Stale { .. }
        ));
        assert_eq!(session.current(), None);
        assert!(!session.is_pending());
    }
}
