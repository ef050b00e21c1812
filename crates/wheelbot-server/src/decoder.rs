//! Turns query parameters into a [`MotionCommand`].
//!
//! Every default and every rejection rule lives here.  A request either
//! decodes completely or not at all.

use std::num::NonZeroU32;

use wheelbot_types::{CommandError, DEFAULT_DISTANCE, Direction, DistanceUnit, MotionCommand};

use crate::request::CommandRequest;

pub const DIRECTION_PARAM: &str = "dir";
pub const DISTANCE_PARAM: &str = "distance";
pub const UNIT_PARAM: &str = "unit";

/// Validate `request` and build the command it describes.
///
/// * `dir` is required and must be one of `up`, `down`, `left`, `right`.
/// * `distance` defaults to [`DEFAULT_DISTANCE`]; when sent it must be a
///   positive integer, otherwise the whole command is rejected.
/// * `unit` is passed through untouched and defaults to centimetres.
///
/// # Errors
///
/// [`CommandError::MissingOrInvalidDirection`] or
/// [`CommandError::InvalidDistance`].
pub fn decode(request: &CommandRequest) -> Result<MotionCommand, CommandError> {
    let direction = request
        .param(DIRECTION_PARAM)
        .ok_or(CommandError::MissingOrInvalidDirection)?
        .parse::<Direction>()?;

    let distance = match request.param(DISTANCE_PARAM) {
        Some(raw) => raw
            .parse::<NonZeroU32>()
            .map_err(|_| CommandError::InvalidDistance)?,
        None => DEFAULT_DISTANCE,
    };

    let unit = request
        .param(UNIT_PARAM)
        .map(DistanceUnit::new)
        .unwrap_or_default();

    Ok(MotionCommand::new(direction, distance, unit))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(query: &str) -> CommandRequest {
        CommandRequest::parse(&format!("GET /command?{query} HTTP/1.1\r\n\r\n"))
    }

    fn nz(n: u32) -> NonZeroU32 {
        NonZeroU32::new(n).unwrap()
    }

    #[test]
    fn decodes_every_direction_and_distance() {
        for dir in Direction::ALL {
            for distance in [1, 5, 20, 250] {
                let cmd = decode(&request(&format!("dir={dir}&distance={distance}"))).unwrap();
                assert_eq!(cmd.direction, dir);
                assert_eq!(cmd.distance.get(), distance);
            }
        }
    }

    #[test]
    fn missing_distance_defaults_to_five_cm() {
        let cmd = decode(&request("dir=up")).unwrap();
        assert_eq!(
            cmd,
            MotionCommand::new(Direction::Up, nz(5), DistanceUnit::centimeters())
        );
    }

    #[test]
    fn missing_direction_is_rejected() {
        assert_eq!(
            decode(&request("distance=5")),
            Err(CommandError::MissingOrInvalidDirection)
        );
    }

    #[test]
    fn unknown_or_miscased_direction_is_rejected() {
        for query in ["dir=forward", "dir=UP", "dir=", "dir=up%20"] {
            assert_eq!(
                decode(&request(query)),
                Err(CommandError::MissingOrInvalidDirection),
                "query {query}"
            );
        }
    }

    #[test]
    fn bad_distance_is_rejected_not_defaulted() {
        for query in [
            "dir=up&distance=abc",
            "dir=up&distance=",
            "dir=up&distance=0",
            "dir=up&distance=-4",
            "dir=up&distance=2.5",
            "dir=up&distance=99999999999",
        ] {
            assert_eq!(
                decode(&request(query)),
                Err(CommandError::InvalidDistance),
                "query {query}"
            );
        }
    }

    #[test]
    fn direction_is_checked_before_distance() {
        assert_eq!(
            decode(&request("dir=sideways&distance=abc")),
            Err(CommandError::MissingOrInvalidDirection)
        );
    }

    #[test]
    fn unit_is_passed_through() {
        let cmd = decode(&request("dir=right&distance=20&unit=deg")).unwrap();
        assert_eq!(cmd.unit, DistanceUnit::new("deg"));
    }

    #[test]
    fn reserialized_query_decodes_to_same_command() {
        let original = request("dir=up&distance=10&unit=cm");
        let mut pairs: Vec<String> = original
            .query
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        pairs.sort();
        let reparsed = request(&pairs.join("&"));

        let expected = MotionCommand::new(Direction::Up, nz(10), DistanceUnit::new("cm"));
        assert_eq!(decode(&original).unwrap(), expected);
        assert_eq!(decode(&reparsed).unwrap(), expected);
    }
}
