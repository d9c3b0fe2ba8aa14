// sb-core/src/units.rs

use uom::si::f64::Time as UomTime;

pub type Time = UomTime;

/// Seconds per day, the host/engine clock ratio.
pub const SECONDS_PER_DAY: f64 = 86_400.0;

#[inline]
pub fn s(v: f64) -> Time {
    use uom::si::time::second;
    Time::new::<second>(v)
}

#[inline]
pub fn days(v: f64) -> Time {
    use uom::si::time::day;
    Time::new::<day>(v)
}

#[inline]
pub fn as_days(t: Time) -> f64 {
    use uom::si::time::day;
    t.get::<day>()
}

#[inline]
pub fn as_minutes(t: Time) -> f64 {
    use uom::si::time::minute;
    t.get::<minute>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_day_of_seconds() {
        let t = s(SECONDS_PER_DAY);
        assert!((as_days(t) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn day_fraction_to_minutes() {
        let t = days(1.0 / 1440.0);
        assert!((as_minutes(t) - 1.0).abs() < 1e-9);
    }
}
