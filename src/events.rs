//! Results of async requests, delivered back to the UI thread
//!
//! Background tasks never touch UI state. They send an [`AppEvent`] and the
//! shell applies it on the next frame, so every state change happens on one
//! thread in arrival order.

use crate::camera::{LifetimeToken, PanTo};
use crate::core::geo::LatLng;
use crate::services::places::{PlacesError, Suggestion};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Recenter the camera at street zoom
    PanTo(LatLng),
    /// A locate request finished, successfully or not
    LocateFinished,
    /// Suggestions for query `seq`
    Suggestions {
        seq: u64,
        result: Result<Vec<Suggestion>, PlacesError>,
    },
    /// A geocode request finished, successfully or not
    ResolveFinished,
}

type Waker = Arc<dyn Fn() + Send + Sync>;

/// Sending half of the event channel. Sends are dropped once the view that
/// owns the receiving side is gone.
#[derive(Clone)]
pub struct EventSender {
    tx: Sender<AppEvent>,
    token: LifetimeToken,
    waker: Option<Waker>,
}

impl EventSender {
    /// Called after every delivered event, typically to request a repaint
    pub fn with_waker(mut self, waker: impl Fn() + Send + Sync + 'static) -> Self {
        self.waker = Some(Arc::new(waker));
        self
    }

    /// Returns `false` if the event was discarded
    pub fn send(&self, event: AppEvent) -> bool {
        if self.token.is_cancelled() {
            log::debug!("view is gone, discarding {:?}", event);
            return false;
        }
        if self.tx.send(event).is_err() {
            return false;
        }
        if let Some(waker) = &self.waker {
            waker();
        }
        true
    }
}

impl PanTo for EventSender {
    /// Defers the pan to the UI thread
    fn pan_to(&self, target: LatLng) {
        self.send(AppEvent::PanTo(target));
    }
}

pub fn channel(token: LifetimeToken) -> (EventSender, Receiver<AppEvent>) {
    let (tx, rx) = unbounded();
    (
        EventSender {
            tx,
            token,
            waker: None,
        },
        rx,
    )
}
