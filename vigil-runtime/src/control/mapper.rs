use super::Corrections;
use crate::core::Command;

/// Maps axis corrections onto the vehicle remote control channels.
///
/// The horizontal correction drives yaw as is. The vertical and depth
/// corrections are negated onto up/down and forward/back. Lateral motion is
/// never commanded. Corrections are truncated towards zero and each channel
/// is clamped to the accepted velocity range.
#[derive(Clone, Copy, Debug, Default)]
pub struct ActuationMapper;

impl ActuationMapper {
    pub fn map(&self, x: f32, y: f32, z: f32) -> Command {
        use crate::math::truncate;

        Command::new(
            0,
            truncate(z).saturating_neg(),
            truncate(y).saturating_neg(),
            truncate(x),
        )
    }

    #[inline]
    pub fn map_corrections(&self, corrections: &Corrections) -> Command {
        self.map(corrections.x, corrections.y, corrections.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_convention() {
        let command = ActuationMapper.map(10.0, 5.0, -3.0);

        assert_eq!(command.as_tuple(), (0, 3, -5, 10));
        assert_eq!(command.left_right, 0);
        assert_eq!(command.forward_back, 3);
        assert_eq!(command.up_down, -5);
        assert_eq!(command.yaw, 10);
    }

    #[test]
    fn test_clamped() {
        let command = ActuationMapper.map(-250.0, -101.0, 180.5);

        assert_eq!(command.as_tuple(), (0, -100, 100, -100));
    }

    #[test]
    fn test_truncated() {
        let command = ActuationMapper.map(-22.9, 0.99, 14.5);

        assert_eq!(command.as_tuple(), (0, -14, 0, -22));
    }

    #[test]
    fn test_neutral() {
        assert!(ActuationMapper
            .map_corrections(&Corrections::NEUTRAL)
            .is_neutral());
    }

    #[test]
    fn test_non_finite_is_neutral() {
        let command = ActuationMapper.map(f32::NAN, f32::INFINITY, f32::NEG_INFINITY);

        assert!(command.is_neutral());
    }
}
