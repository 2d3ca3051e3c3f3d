/// The analysis uses a simple discrete time model.
pub type Time = u64;

/// Syntactic sugar to give a hint that a time value indicates a
/// point in time or an offset into a busy window.
pub type Instant = Time;

/// Syntactic sugar to give a hint that a time value denotes an
/// interval length.
pub type Duration = Time;

/// Syntactic sugar to give a hint that a time value represents some
/// amount of processor service.
pub type Service = Time;

// common helper function
pub(crate) fn divide_with_ceil(a: Time, b: Time) -> Time {
    a / b + (a % b > 0) as Time
}
