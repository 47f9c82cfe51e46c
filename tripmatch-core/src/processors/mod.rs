//! Matching processors.
//!
//! - `PostPublisher`: publishes a post and its creator seat, runs `MatchFinder`
//! - `MatchFinder`: scores candidates for a post and creates pending matches
//! - `MatchLifecycle`: join requests, creator responses, match listings
//! - `TripPromotion`: turns a mutually accepted pair into a trip
//! - `PromotionSweeper`: retries promotions left behind by failures
//! - `NotificationDispatcher`: fans notifications out to online users

pub mod match_finder;
pub mod match_lifecycle;
pub mod notification_dispatcher;
pub mod post_publisher;
pub mod promotion_sweeper;
pub mod trip_promotion;

pub use match_finder::{
    FindPotentialMatches, FinderOutcome, MatchFinder, PotentialMatch, RerunMatching,
};
pub use match_lifecycle::{
    ListMatchedUsers, ListUserMatches, MatchDecision, MatchLifecycle, MatchResolution,
    RequestMatch, RespondToMatch,
};
pub use notification_dispatcher::{NotificationDispatcher, OnlineUsers};
pub use post_publisher::{
    GetPostSummary, PostPublisher, PostSummary, PublishTravelPost, PublishedPost,
};
pub use promotion_sweeper::{PromotionSweeper, SweepReport};
pub use trip_promotion::{GetTripForParticipant, PromoteToTrip, TripPromotion};
