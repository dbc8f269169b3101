use std::{
    fmt,
    sync::{Arc, Mutex},
};

use carryover::prelude::*;
use tracing::{
    Event, Level, Subscriber,
    field::{Field, Visit},
};
use tracing_subscriber::{
    layer::{Context, SubscriberExt},
    Layer,
};

type Events = Arc<Mutex<Vec<(Level, String)>>>;

/// Records the level and message of every event.
struct CaptureLayer {
    events: Events,
}

impl<S: Subscriber> Layer<S> for CaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor(String::new());
        event.record(&mut visitor);
        self.events
            .lock()
            .unwrap()
            .push((*event.metadata().level(), visitor.0));
    }
}

struct MessageVisitor(String);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }
}

fn capture<R>(f: impl FnOnce() -> R) -> (R, Vec<(Level, String)>) {
    let events = Events::default();
    let subscriber = tracing_subscriber::registry().with(CaptureLayer {
        events: events.clone(),
    });
    let result = tracing::subscriber::with_default(subscriber, f);
    let events = events.lock().unwrap().clone();
    (result, events)
}

fn u32_codec() -> FnCodec<u32> {
    FnCodec::new(
        |value: &u32| Ok(value.to_le_bytes().to_vec()),
        |bytes: &[u8]| Ok(u32::from_le_bytes(bytes.try_into()?)),
    )
}

#[test]
fn installs_and_summary_are_logged_at_debug() {
    let copied: AttachmentType<u32> = AttachmentType::builder("log:copied")
        .codec(u32_codec())
        .build();
    let local: AttachmentType<u32> = AttachmentType::builder("log:local").build();

    let mut source = AttachmentMap::new();
    source.set_data(&copied, 1);
    source.set_data(&local, 2);
    let mut destination = AttachmentMap::new();

    let (result, events) =
        capture(|| copy_on_promotion(&CopyContext::empty(), &source, &mut destination));
    result.unwrap();

    assert!(events.contains(&(Level::DEBUG, String::from("installed attachment copy"))));
    assert!(events.contains(&(Level::DEBUG, String::from("propagation finished"))));
    assert!(events.contains(&(
        Level::TRACE,
        String::from("skipping attachment without codec")
    )));
    assert!(events.iter().all(|(level, _)| *level != Level::WARN));
}

#[test]
fn failing_handler_is_logged_at_warn() {
    let failing: AttachmentType<u32> = AttachmentType::builder("log:failing")
        .codec(u32_codec())
        .copy_handler(|_: &u32, _, _| Err(report!("lookup failed")))
        .build();

    let mut source = AttachmentMap::new();
    source.set_data(&failing, 1);
    let mut destination = AttachmentMap::new();

    let (result, events) =
        capture(|| copy_on_promotion(&CopyContext::empty(), &source, &mut destination));
    assert!(result.is_err());

    assert!(events.contains(&(
        Level::WARN,
        String::from("copy handler failed, aborting propagation")
    )));
    assert!(
        !events
            .iter()
            .any(|(_, message)| message == "propagation finished")
    );
}
