/// An unsigned angle split into whole degrees, whole minutes and fractional seconds.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Dms {
    pub degrees: u32,
    pub minutes: u32,
    pub seconds: f64,
}

/// Convert decimal degrees to degrees/minutes/seconds.
///
/// Only the magnitude is converted; the sign is dropped and must be carried
/// separately as a hemisphere reference (see [`latitude_ref`] and
/// [`longitude_ref`]).
pub fn decimal_to_dms(deg: f64) -> Dms {
    let magnitude = deg.abs();
    let degrees = magnitude.floor();
    let minutes_f = (magnitude - degrees) * 60.0;
    let minutes = minutes_f.floor();
    let seconds = (minutes_f - minutes) * 60.0;

    Dms {
        degrees: degrees as u32,
        minutes: minutes as u32,
        seconds,
    }
}

/// `S` for southern latitudes, `N` otherwise.
pub fn latitude_ref(lat: f64) -> u8 {
    if lat < 0.0 { b'S' } else { b'N' }
}

/// `W` for western longitudes, `E` otherwise.
pub fn longitude_ref(lon: f64) -> u8 {
    if lon < 0.0 { b'W' } else { b'E' }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_all_zero() {
        let dms = decimal_to_dms(0.0);
        assert_eq!(dms, Dms { degrees: 0, minutes: 0, seconds: 0.0 });
    }

    #[test]
    fn negative_input_converts_magnitude() {
        let dms = decimal_to_dms(-6.2088);
        assert_eq!(dms.degrees, 6);
        assert_eq!(dms.minutes, 12);
        assert!((dms.seconds - 31.68).abs() < 1e-6, "seconds = {}", dms.seconds);
        assert_eq!(decimal_to_dms(6.2088), dms);
    }

    #[test]
    fn longitude_with_large_degrees() {
        let dms = decimal_to_dms(106.8456);
        assert_eq!(dms.degrees, 106);
        assert_eq!(dms.minutes, 50);
        assert!((dms.seconds - 44.16).abs() < 1e-6, "seconds = {}", dms.seconds);
    }

    #[test]
    fn whole_degrees_have_no_minutes() {
        let dms = decimal_to_dms(-45.0);
        assert_eq!(dms, Dms { degrees: 45, minutes: 0, seconds: 0.0 });
    }

    #[test]
    fn hemisphere_refs_follow_sign() {
        assert_eq!(latitude_ref(-0.1), b'S');
        assert_eq!(latitude_ref(0.0), b'N');
        assert_eq!(latitude_ref(51.5), b'N');
        assert_eq!(longitude_ref(-122.4), b'W');
        assert_eq!(longitude_ref(0.0), b'E');
        assert_eq!(longitude_ref(106.8), b'E');
    }
}
