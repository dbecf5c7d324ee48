pub mod engine;
pub mod gesture;
pub mod queue;
pub mod submitter;

pub use engine::{DiscoveryEngine, DiscoveryError, FeedView, LoadOutcome};
pub use gesture::{CardPose, GestureTracker, Offset, Point, Release, SwipeDirection};
pub use queue::CandidateQueue;
pub use submitter::{IntentSink, IntentSubmitter};
