/// Remote control command.
///
/// Four bounded velocities in the order the actuator expects them. Whether a
/// positive value moves left or right, forward or backward is left to the
/// actuator. A command is produced once per cycle and consumed once by the
/// command channel.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Command {
    pub left_right: i8,
    pub forward_back: i8,
    pub up_down: i8,
    pub yaw: i8,
}

impl Command {
    /// Lowest velocity accepted on any channel.
    pub const VELOCITY_MIN: i8 = -100;
    /// Highest velocity accepted on any channel.
    pub const VELOCITY_MAX: i8 = 100;

    /// Hold position.
    pub const NEUTRAL: Command = Command {
        left_right: 0,
        forward_back: 0,
        up_down: 0,
        yaw: 0,
    };

    /// Construct a command, clamping each channel to the accepted range.
    pub fn new(left_right: i32, forward_back: i32, up_down: i32, yaw: i32) -> Self {
        Self {
            left_right: Self::bound(left_right),
            forward_back: Self::bound(forward_back),
            up_down: Self::bound(up_down),
            yaw: Self::bound(yaw),
        }
    }

    #[inline]
    fn bound(value: i32) -> i8 {
        value.clamp(Self::VELOCITY_MIN as i32, Self::VELOCITY_MAX as i32) as i8
    }

    #[inline]
    pub fn is_neutral(&self) -> bool {
        *self == Self::NEUTRAL
    }

    /// Channels as `(left_right, forward_back, up_down, yaw)`.
    pub fn as_tuple(&self) -> (i8, i8, i8, i8) {
        (self.left_right, self.forward_back, self.up_down, self.yaw)
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "LR: {}; FB: {}; UD: {}; Yaw: {}",
            self.left_right, self.forward_back, self.up_down, self.yaw
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_bounds() {
        let command = Command::new(0, 250, -101, 100);

        assert_eq!(command.as_tuple(), (0, 100, -100, 100));
    }

    #[test]
    fn test_command_neutral() {
        assert!(Command::default().is_neutral());
        assert!(!Command::new(0, 0, 0, 1).is_neutral());
    }
}
