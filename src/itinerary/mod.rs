//! Derived itinerary views: day buckets, smart checkout and ride drafts.
//! Everything here reads a trip snapshot and returns new values.

pub mod buckets;
pub mod checkout;
pub mod clock;
pub mod rides;

pub use buckets::{build, DayBucket, EventKind, Itinerary, ItineraryEvent};
pub use checkout::CheckoutAdvisory;
pub use rides::{Anchor, RideDraft};
