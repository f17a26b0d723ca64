use super::session::ViewSample;
use crate::api::{DeviceType, ViewEvent, ViewEventSink};

/// Turns watch samples into view events and hands them to the sink.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewAnalyticsReporter {
    user_id: Option<String>,
    device_type: DeviceType,
}

impl ViewAnalyticsReporter {
    pub fn new(user_id: Option<String>, device_type: DeviceType) -> Self {
        Self {
            user_id: user_id.filter(|id| !id.trim().is_empty()),
            device_type,
        }
    }

    pub fn for_current_device(user_id: Option<String>) -> Self {
        Self::new(user_id, DeviceType::current())
    }

    pub fn build_event(&self, clip_id: &str, sample: ViewSample) -> ViewEvent {
        ViewEvent::new(
            clip_id,
            self.user_id.clone(),
            sample.watch_duration_seconds,
            sample.watch_percentage,
            self.device_type,
        )
    }

    /// Delivers one event. Failures are logged and dropped; views are never retried.
    pub async fn deliver<S: ViewEventSink + ?Sized>(sink: &S, event: ViewEvent) -> bool {
        let clip_id = event.clip_id.clone();
        match sink.record_view(event).await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(clip_id = %clip_id, error = %err, "dropping view event");
                false
            }
        }
    }

    pub async fn report<S: ViewEventSink + ?Sized>(
        &self,
        sink: &S,
        clip_id: &str,
        sample: ViewSample,
    ) -> bool {
        Self::deliver(sink, self.build_event(clip_id, sample)).await
    }
}
