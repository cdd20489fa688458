use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tokio::sync::broadcast;

use crate::core::Object;

/// Structured topic path.
///
/// Topics address a stream of typed objects on the bus, for example
/// `servo/base/motion` or `joint/base/state`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Topic(Vec<String>);

impl Topic {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Command topic of an actuator.
    pub fn command(servo: &str) -> Self {
        Self::new(["servo", servo, "command"])
    }

    /// Motion announcement topic of an actuator.
    pub fn motion(servo: &str) -> Self {
        Self::new(["servo", servo, "motion"])
    }

    /// Joint state topic of an estimator.
    pub fn joint_state(joint: &str) -> Self {
        Self::new(["joint", joint, "state"])
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

/// In-process typed event bus.
///
/// Every topic fans out to all current subscribers over a broadcast
/// channel. A publish without subscribers is dropped; a slow subscriber
/// loses the oldest objects first.
#[derive(Clone, Default)]
pub struct EventBus {
    topics: Arc<RwLock<HashMap<Topic, broadcast::Sender<Object>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn sender(&self, topic: &Topic) -> broadcast::Sender<Object> {
        if let Some(sender) = self.topics.read().unwrap().get(topic) {
            return sender.clone();
        }

        self.topics
            .write()
            .unwrap()
            .entry(topic.clone())
            .or_insert_with(|| broadcast::channel(crate::consts::QUEUE_SIZE_SIGNAL).0)
            .clone()
    }

    /// Publish an object on a topic.
    pub fn publish(&self, topic: &Topic, object: Object) {
        // Without subscribers the object is dropped.
        let _ = self.sender(topic).send(object);
    }

    /// Subscribe to a topic.
    pub fn subscribe(&self, topic: &Topic) -> broadcast::Receiver<Object> {
        self.sender(topic).subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::core::PositionCommand;

    #[tokio::test]
    async fn fan_out_to_subscribers() {
        let bus = EventBus::new();
        let topic = Topic::command("base");

        let mut first = bus.subscribe(&topic);
        let mut second = bus.subscribe(&topic);

        bus.publish(
            &topic,
            Object::Command(PositionCommand {
                position: 0.5,
                correlation_id: None,
            }),
        );

        for receiver in [&mut first, &mut second] {
            match receiver.recv().await.unwrap() {
                Object::Command(command) => assert_eq!(command.position, 0.5),
                object => panic!("unexpected object: {:?}", object),
            }
        }
    }

    #[tokio::test]
    async fn publish_without_subscribers() {
        let bus = EventBus::new();

        bus.publish(
            &Topic::motion("base"),
            Object::Command(PositionCommand {
                position: 0.0,
                correlation_id: None,
            }),
        );
    }

    #[test]
    fn topic_display() {
        assert_eq!(Topic::joint_state("base").to_string(), "joint/base/state");
    }
}
