/// Controlled axis.
///
/// Each axis is driven by its own controller. The order of the variants is
/// the order in which corrections are produced each cycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Axis {
    /// Horizontal image position, drives yaw.
    X = 0,
    /// Vertical image position, drives altitude.
    Y = 1,
    /// Apparent target area, drives distance.
    Z = 2,
}

impl Axis {
    /// All axes in correction order.
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn name(&self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        }
    }
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
