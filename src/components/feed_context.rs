//! Shared state handed from the feed to its cards and players.

use crate::api::SupabaseClient;
use crate::db::FeedSettings;
use crate::player::ViewAnalyticsReporter;
use dioxus::prelude::*;
use std::collections::HashSet;
use std::rc::Rc;

/// Backend handles and settings snapshot for one mounted feed.
#[derive(Clone)]
pub struct FeedServices {
    pub backend: Rc<SupabaseClient>,
    pub reporter: ViewAnalyticsReporter,
    pub user_id: Option<String>,
    pub loop_clips: bool,
    pub show_accountability: bool,
    pub preload_margin: f64,
}

impl FeedServices {
    pub fn from_settings(settings: &FeedSettings) -> Self {
        let user_id = settings.signed_in_user();
        Self {
            backend: Rc::new(SupabaseClient::new(settings.backend())),
            reporter: ViewAnalyticsReporter::for_current_device(user_id.clone()),
            user_id,
            loop_clips: settings.loop_clips,
            show_accountability: settings.show_accountability,
            preload_margin: settings.preload_margin,
        }
    }
}

impl PartialEq for FeedServices {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.backend, &other.backend)
    }
}

#[derive(Clone, Copy)]
pub struct ActiveClipSignal(pub Signal<Option<String>>);

#[derive(Clone, Copy)]
pub struct PageVisibleSignal(pub Signal<bool>);

/// Clips whose cards have entered the preload margin at least once.
#[derive(Clone, Copy)]
pub struct PreloadedClips(pub Signal<HashSet<String>>);
