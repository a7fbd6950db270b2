//! In-process fan-out of lifecycle events.
//!
//! Every event goes through one `tokio::sync::broadcast` ring tagged with
//! the topics it belongs to; each subscription filters on its own topic.
//! Delivery is best-effort: observers that connect late miss earlier
//! events, observers that fall more than the ring capacity behind skip
//! ahead, and nothing is persisted. Send order is preserved per
//! subscription within this process only; a multi-process deployment gives
//! no ordering guarantee.
//!
//! Topic choice is not authorized. Any observer may listen on `all`.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, warn};

use crate::models::event::{LifecycleEvent, StatusUpdate, Topic};
use crate::models::parcel::Parcel;

#[derive(Debug, Clone)]
pub struct Envelope {
    pub topics: Vec<Topic>,
    pub event: LifecycleEvent,
}

#[derive(Clone)]
pub struct Broadcaster {
    tx: broadcast::Sender<Arc<Envelope>>,
}

impl Broadcaster {
    pub fn new(capacity: usize) -> Self {
        let (tx, _unused_rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Returns how many observers were connected when the event was sent.
    pub fn publish(&self, event: LifecycleEvent, topics: Vec<Topic>) -> usize {
        let kind = event.kind();
        let parcel_id = event.parcel_id();

        match self.tx.send(Arc::new(Envelope { topics, event })) {
            Ok(observers) => {
                debug!(event = kind, parcel_id = %parcel_id, observers, "event published");
                observers
            }
            Err(_) => {
                debug!(event = kind, parcel_id = %parcel_id, "event dropped: no observers");
                0
            }
        }
    }

    pub fn new_booking(&self, parcel: &Parcel) -> usize {
        let topics = vec![Topic::All, Topic::Admins, Topic::Customer(parcel.customer)];
        self.publish(LifecycleEvent::NewBooking(parcel.clone()), topics)
    }

    pub fn status_update(&self, parcel: &Parcel, location: Option<String>) -> usize {
        let mut topics = vec![
            Topic::All,
            Topic::Admins,
            Topic::Parcel(parcel.id),
            Topic::Customer(parcel.customer),
        ];
        if let Some(agent) = parcel.delivery_agent {
            topics.push(Topic::Agent(agent));
        }

        let update = StatusUpdate {
            parcel_id: parcel.id,
            status: parcel.status,
            location,
        };
        self.publish(LifecycleEvent::StatusUpdate(update), topics)
    }

    pub fn subscribe(&self, topic: Topic) -> Subscription {
        Subscription {
            topic,
            rx: self.tx.subscribe(),
        }
    }

    pub fn observer_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

pub struct Subscription {
    topic: Topic,
    rx: broadcast::Receiver<Arc<Envelope>>,
}

impl Subscription {
    pub fn topic(&self) -> Topic {
        self.topic
    }

    /// Events on this topic in send order. Ends once the broadcaster is
    /// gone; a lagging observer skips what it missed and keeps going.
    pub fn into_stream(self) -> impl Stream<Item = LifecycleEvent> + Send + 'static {
        let topic = self.topic;
        BroadcastStream::new(self.rx).filter_map(move |result| match result {
            Ok(envelope) if envelope.topics.contains(&topic) => Some(envelope.event.clone()),
            Ok(_) => None,
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                warn!(topic = %topic, skipped, "observer lagged; events dropped");
                None
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use futures::FutureExt;
    use uuid::Uuid;

    use super::*;
    use crate::models::parcel::{
        ParcelDetails, ParcelSize, ParcelStatus, PaymentType, TrackingEntry,
    };

    fn parcel(agent: Option<Uuid>) -> Parcel {
        let now = Utc::now();
        Parcel {
            id: Uuid::new_v4(),
            customer: Uuid::from_u128(1),
            pickup_address: "A".to_string(),
            delivery_address: "B".to_string(),
            parcel_details: ParcelDetails {
                kind: "Document".to_string(),
                size: ParcelSize::Small,
            },
            payment_type: PaymentType::Cod,
            cod_amount: 50.0,
            status: ParcelStatus::Booked,
            delivery_agent: agent,
            tracking_history: vec![TrackingEntry {
                status: ParcelStatus::Booked,
                location: Some("A".to_string()),
                timestamp: now,
            }],
            created_at: now,
            updated_at: now,
            version: 1,
        }
    }

    fn events(subscription: Subscription) -> impl Stream<Item = LifecycleEvent> + Unpin {
        Box::pin(subscription.into_stream())
    }

    /// Everything already queued, without waiting for more.
    fn drain(stream: &mut (impl Stream<Item = LifecycleEvent> + Unpin)) -> Vec<LifecycleEvent> {
        let mut received = Vec::new();
        while let Some(Some(event)) = stream.next().now_or_never() {
            received.push(event);
        }
        received
    }

    #[test]
    fn publishing_without_observers_is_not_an_error() {
        let broadcaster = Broadcaster::new(16);
        assert_eq!(broadcaster.new_booking(&parcel(None)), 0);
        assert_eq!(broadcaster.observer_count(), 0);
    }

    #[test]
    fn late_subscribers_miss_earlier_events() {
        let broadcaster = Broadcaster::new(16);
        broadcaster.new_booking(&parcel(None));

        let mut late = events(broadcaster.subscribe(Topic::All));
        assert!(drain(&mut late).is_empty());
    }

    #[test]
    fn default_topic_sees_every_event() {
        let broadcaster = Broadcaster::new(16);
        let mut all = events(broadcaster.subscribe(Topic::All));

        let booked = parcel(None);
        broadcaster.new_booking(&booked);
        broadcaster.status_update(&booked, None);

        let kinds: Vec<_> = drain(&mut all).iter().map(LifecycleEvent::kind).collect();
        assert_eq!(kinds, ["new_booking", "status_update"]);
    }

    #[test]
    fn parcel_topic_only_sees_its_own_status_updates() {
        let broadcaster = Broadcaster::new(16);
        let watched = parcel(None);
        let other = parcel(None);
        let mut sub = events(broadcaster.subscribe(Topic::Parcel(watched.id)));

        broadcaster.new_booking(&watched);
        broadcaster.status_update(&other, Some("Depot".to_string()));
        broadcaster.status_update(&watched, Some("Warehouse 1".to_string()));

        match drain(&mut sub).as_slice() {
            [LifecycleEvent::StatusUpdate(update)] => {
                assert_eq!(update.parcel_id, watched.id);
                assert_eq!(update.location.as_deref(), Some("Warehouse 1"));
            }
            other => panic!("unexpected events: {other:?}"),
        }
    }

    #[test]
    fn agent_topic_receives_updates_for_assigned_parcels() {
        let broadcaster = Broadcaster::new(16);
        let agent = Uuid::from_u128(42);
        let mut sub = events(broadcaster.subscribe(Topic::Agent(agent)));

        broadcaster.status_update(&parcel(None), None);
        broadcaster.status_update(&parcel(Some(agent)), None);

        assert_eq!(drain(&mut sub).len(), 1);
    }

    #[test]
    fn lagging_observer_skips_ahead() {
        let broadcaster = Broadcaster::new(2);
        let mut sub = events(broadcaster.subscribe(Topic::All));
        let p = parcel(None);
        for _ in 0..5 {
            broadcaster.new_booking(&p);
        }

        assert_eq!(drain(&mut sub).len(), 2);

        broadcaster.new_booking(&p);
        assert_eq!(drain(&mut sub).len(), 1);
    }

    #[tokio::test]
    async fn stream_yields_matching_events_in_send_order() {
        let broadcaster = Broadcaster::new(16);
        let p = parcel(None);
        let mut stream = events(broadcaster.subscribe(Topic::Customer(p.customer)));

        broadcaster.new_booking(&p);
        broadcaster.status_update(&p, Some("Hub".to_string()));
        drop(broadcaster);

        assert_eq!(stream.next().await.map(|e| e.kind()), Some("new_booking"));
        assert_eq!(stream.next().await.map(|e| e.kind()), Some("status_update"));
        assert!(stream.next().await.is_none());
    }
}
