//! Fixtures shared by the unit tests.

use crate::entities::travel_post::{Requirements, TravelPostInsert};
use crate::entities::traveler::{BudgetRange, TravelPreferences, Traveler};
use crate::entities::{Gender, GenderPreference};
use crate::events::{Notification, Notifier};
use rust_decimal::dec;
use std::sync::Mutex;
use uuid::Uuid;

/// Paris, 2026-06-01..10, budget 1500, ages 25..=40, any gender.
pub fn paris_post(creator_id: Uuid) -> TravelPostInsert {
    TravelPostInsert {
        creator_id,
        destination: "Paris".to_string(),
        start_date: time::macros::date!(2026 - 06 - 01),
        end_date: time::macros::date!(2026 - 06 - 10),
        description: None,
        budget: dec!(1500),
        travel_style: None,
        requirements: Some(Requirements {
            min_age: 25,
            max_age: 40,
            gender_preference: GenderPreference::Any,
        }),
    }
}

/// A woman who wants to go to Paris on a 1000..=2000 budget.
pub fn traveler_in_paris(age: i32) -> Traveler {
    Traveler {
        id: Uuid::new_v4(),
        age: Some(age),
        gender: Some(Gender::Female),
        travel_preferences: Some(TravelPreferences {
            destinations: vec!["Paris".to_string()],
            budget_range: Some(BudgetRange {
                min: dec!(1000),
                max: dec!(2000),
            }),
            travel_styles: vec!["culture".to_string()],
        }),
    }
}

/// Keeps every emitted notification.
#[derive(Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn recorded(&self) -> Vec<Notification> {
        self.seen.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn emit(&self, notification: Notification) {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(notification);
        }
    }
}
