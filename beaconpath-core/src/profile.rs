//! Beacon Metadata: Profiles, Layout, and Identity Parsing
//!
//! ## Overview
//!
//! A [`BeaconProfile`] carries everything the core needs to turn one
//! beacon's raw RSSI stream into a distance: its fixed world position,
//! the calibrated path-loss model, and the scalar Kalman parameters.
//! Profiles are created at configuration time, validated eagerly, and
//! never mutated afterwards.
//!
//! ## Identity Convention
//!
//! Physical beacons broadcast a name ending in an underscore-separated
//! numeric suffix (`hall_beacon_1`, `hall_beacon_2`, ...). That suffix
//! is the only link between a radio sample stream and its profile, so
//! it is a boundary contract this module validates rather than assumes:
//! a name without a parseable suffix is rejected at configuration time.
//!
//! Index 1 is the bearing anchor (it carries the boresight offset toward
//! the target); index 2 defines the baseline direction from the anchor.
//! See [`crate::bearing`] for how the two are consumed.
//!
//! ## Calibration Payload
//!
//! Reference beacons push their own calibration over a characteristic as
//! a `DEVICEINFO:` payload. [`parse_device_info`] reconstructs a profile
//! from that wire string so the boundary stays testable end to end:
//!
//! ```text
//! DEVICEINFO:<x>,<y>,<z>,<angle>,<rssi_ref>,<A>,<H>,<N>,<P>,<Q>,<R>,<name>
//! ```

use heapless::Vec;

use crate::{
    constants::MAX_BEACONS,
    errors::{PositioningError, PositioningResult},
    geometry::Vec3,
};

/// Scalar Kalman filter parameters for one beacon's RSSI stream
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KalmanParams {
    /// State-transition scalar (A)
    pub a: f64,
    /// Measurement scalar (H)
    pub h: f64,
    /// Process noise covariance (Q)
    pub q: f64,
    /// Measurement noise covariance (R)
    pub r: f64,
    /// Initial estimate error covariance (P₀)
    pub p0: f64,
}

impl Default for KalmanParams {
    fn default() -> Self {
        Self {
            // Static beacons: identity process and measurement models
            a: 1.0,
            h: 1.0,
            // RSSI is noisy relative to the (constant) true level
            q: 0.008,
            r: 1.0,
            p0: 1.0,
        }
    }
}

/// Immutable per-beacon configuration
///
/// Built once at configuration time and shared for the app session.
/// Constructors reject invalid calibration eagerly so estimation code
/// never has to re-check it per cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BeaconProfile {
    /// Beacon index parsed from the broadcast-name suffix (1-based)
    pub index: u8,
    /// Fixed position in the shared world frame (meters)
    pub position: Vec3,
    /// Reference signal strength at 1 m (dBm)
    pub rssi_ref: f64,
    /// Path-loss exponent (N), environment dependent, strictly positive
    pub path_loss_exponent: f64,
    /// Scalar Kalman filter parameters
    pub kalman: KalmanParams,
    /// Boresight angle toward the target, degrees. Only meaningful on
    /// the anchor beacon (index 1); zero elsewhere.
    pub boresight_offset_deg: f64,
}

impl BeaconProfile {
    /// Creates a profile, validating the path-loss model
    ///
    /// A non-positive or non-finite exponent would divide by zero (or
    /// produce nonsense distances) at estimation time, so it is rejected
    /// here instead.
    pub fn new(
        index: u8,
        position: Vec3,
        rssi_ref: f64,
        path_loss_exponent: f64,
    ) -> PositioningResult<Self> {
        if !path_loss_exponent.is_finite() || path_loss_exponent <= 0.0 {
            return Err(PositioningError::InvalidConfiguration {
                reason: "path-loss exponent must be positive and finite",
            });
        }
        if !rssi_ref.is_finite() {
            return Err(PositioningError::InvalidConfiguration {
                reason: "reference RSSI must be finite",
            });
        }
        if index == 0 {
            return Err(PositioningError::InvalidConfiguration {
                reason: "beacon indices are 1-based",
            });
        }

        Ok(Self {
            index,
            position,
            rssi_ref,
            path_loss_exponent,
            kalman: KalmanParams::default(),
            boresight_offset_deg: 0.0,
        })
    }

    /// Replace the default Kalman parameters
    pub fn with_kalman(mut self, kalman: KalmanParams) -> Self {
        self.kalman = kalman;
        self
    }

    /// Set the boresight angle toward the target (anchor beacon only)
    pub fn with_boresight_offset(mut self, degrees: f64) -> Self {
        self.boresight_offset_deg = degrees;
        self
    }
}

/// Extracts the beacon index from a broadcast name
///
/// The name must end in `_<digits>`; anything else violates the naming
/// contract and is an `InvalidConfiguration` error.
pub fn beacon_index_from_name(name: &str) -> PositioningResult<u8> {
    let suffix = name.rsplit('_').next().filter(|s| !s.is_empty() && *s != name);

    let digits = suffix.ok_or(PositioningError::InvalidConfiguration {
        reason: "beacon name missing underscore-separated numeric suffix",
    })?;

    digits
        .parse::<u8>()
        .map_err(|_| PositioningError::InvalidConfiguration {
            reason: "beacon name suffix is not a number",
        })
        .and_then(|index| {
            if index == 0 {
                Err(PositioningError::InvalidConfiguration {
                    reason: "beacon indices are 1-based",
                })
            } else {
                Ok(index)
            }
        })
}

/// Field count of a `DEVICEINFO:` calibration payload
const DEVICE_INFO_FIELDS: usize = 12;

/// Reconstructs a [`BeaconProfile`] from a `DEVICEINFO:` payload
///
/// See the module docs for the field layout. Validates the field count,
/// every numeric field, and the trailing name's index suffix.
pub fn parse_device_info(payload: &str) -> PositioningResult<BeaconProfile> {
    let body = payload
        .strip_prefix("DEVICEINFO:")
        .ok_or(PositioningError::InvalidConfiguration {
            reason: "calibration payload missing DEVICEINFO prefix",
        })?;

    let mut fields: Vec<&str, DEVICE_INFO_FIELDS> = Vec::new();
    for field in body.split(',') {
        fields
            .push(field.trim())
            .map_err(|_| PositioningError::InvalidConfiguration {
                reason: "calibration payload has too many fields",
            })?;
    }
    if fields.len() != DEVICE_INFO_FIELDS {
        return Err(PositioningError::InvalidConfiguration {
            reason: "calibration payload has too few fields",
        });
    }

    let number = |field: &str| -> PositioningResult<f64> {
        field
            .parse::<f64>()
            .map_err(|_| PositioningError::InvalidConfiguration {
                reason: "calibration payload field is not a number",
            })
    };

    let position = [number(fields[0])?, number(fields[1])?, number(fields[2])?];
    let angle = number(fields[3])?;
    let rssi_ref = number(fields[4])?;
    let kalman = KalmanParams {
        a: number(fields[5])?,
        h: number(fields[6])?,
        p0: number(fields[8])?,
        q: number(fields[9])?,
        r: number(fields[10])?,
    };
    let path_loss_exponent = number(fields[7])?;
    let index = beacon_index_from_name(fields[11])?;

    Ok(BeaconProfile::new(index, position, rssi_ref, path_loss_exponent)?
        .with_kalman(kalman)
        .with_boresight_offset(angle))
}

/// Ordered, bounded set of beacon profiles for one deployment
#[derive(Debug, Clone, Default)]
pub struct BeaconLayout {
    profiles: Vec<BeaconProfile, MAX_BEACONS>,
}

/// Broadcast-name suffix of the bearing anchor beacon
const ANCHOR_INDEX: u8 = 1;
/// Broadcast-name suffix of the baseline beacon
const BASELINE_INDEX: u8 = 2;

impl BeaconLayout {
    /// Creates an empty layout
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a profile, rejecting duplicate indices and overflow
    pub fn push(&mut self, profile: BeaconProfile) -> PositioningResult<()> {
        if self.get(profile.index).is_some() {
            return Err(PositioningError::InvalidConfiguration {
                reason: "duplicate beacon index in layout",
            });
        }
        self.profiles
            .push(profile)
            .map_err(|_| PositioningError::InvalidConfiguration {
                reason: "too many beacons in layout",
            })
    }

    /// Number of configured beacons
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// True if no beacons are configured
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Looks up a profile by its name-suffix index
    pub fn get(&self, index: u8) -> Option<&BeaconProfile> {
        self.profiles.iter().find(|p| p.index == index)
    }

    /// Iterate over the configured profiles
    pub fn iter(&self) -> impl Iterator<Item = &BeaconProfile> {
        self.profiles.iter()
    }

    /// The bearing anchor beacon (index 1), if configured
    pub fn anchor(&self) -> Option<&BeaconProfile> {
        self.get(ANCHOR_INDEX)
    }

    /// The baseline beacon (index 2), if configured
    pub fn baseline(&self) -> Option<&BeaconProfile> {
        self.get(BASELINE_INDEX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_rejects_zero_exponent() {
        let err = BeaconProfile::new(1, [0.0; 3], -59.0, 0.0).unwrap_err();
        assert!(matches!(err, PositioningError::InvalidConfiguration { .. }));
    }

    #[test]
    fn profile_rejects_negative_exponent() {
        assert!(BeaconProfile::new(1, [0.0; 3], -59.0, -2.0).is_err());
        assert!(BeaconProfile::new(1, [0.0; 3], -59.0, f64::NAN).is_err());
    }

    #[test]
    fn name_suffix_parsing() {
        assert_eq!(beacon_index_from_name("hall_beacon_1").unwrap(), 1);
        assert_eq!(beacon_index_from_name("b_12").unwrap(), 12);

        assert!(beacon_index_from_name("beacon").is_err());
        assert!(beacon_index_from_name("beacon_").is_err());
        assert!(beacon_index_from_name("beacon_x").is_err());
        assert!(beacon_index_from_name("beacon_0").is_err());
    }

    #[test]
    fn device_info_round_trip() {
        let payload = "DEVICEINFO:1.5,0,2.2,30,-59,1,1,2,1,0.008,1,hall_beacon_1";
        let profile = parse_device_info(payload).unwrap();

        assert_eq!(profile.index, 1);
        assert_eq!(profile.position, [1.5, 0.0, 2.2]);
        assert_eq!(profile.boresight_offset_deg, 30.0);
        assert_eq!(profile.rssi_ref, -59.0);
        assert_eq!(profile.path_loss_exponent, 2.0);
        assert_eq!(profile.kalman.q, 0.008);
    }

    #[test]
    fn device_info_rejects_malformed() {
        assert!(parse_device_info("GARBAGE").is_err());
        assert!(parse_device_info("DEVICEINFO:1,2,3").is_err());
        assert!(parse_device_info(
            "DEVICEINFO:a,0,0,0,-59,1,1,2,1,0.008,1,hall_beacon_1"
        )
        .is_err());
        // Bad name suffix fails the identity contract
        assert!(parse_device_info("DEVICEINFO:0,0,0,0,-59,1,1,2,1,0.008,1,hall").is_err());
    }

    #[test]
    fn layout_lookup_and_roles() {
        let mut layout = BeaconLayout::new();
        layout
            .push(
                BeaconProfile::new(1, [0.0; 3], -59.0, 2.0)
                    .unwrap()
                    .with_boresight_offset(45.0),
            )
            .unwrap();
        layout
            .push(BeaconProfile::new(2, [5.0, 0.0, 0.0], -59.0, 2.0).unwrap())
            .unwrap();

        assert_eq!(layout.anchor().unwrap().boresight_offset_deg, 45.0);
        assert_eq!(layout.baseline().unwrap().position, [5.0, 0.0, 0.0]);
        assert!(layout.get(3).is_none());
    }

    #[test]
    fn layout_rejects_duplicates() {
        let mut layout = BeaconLayout::new();
        let profile = BeaconProfile::new(1, [0.0; 3], -59.0, 2.0).unwrap();
        layout.push(profile).unwrap();
        assert!(layout.push(profile).is_err());
    }
}
